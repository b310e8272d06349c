use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;

/// Installs the global subscriber.
///
/// Human-readable logs go to stdout (`RUST_LOG`, default
/// `info,oracle_node=debug`). `EVENT:` lines on the `consensus` target are
/// kept out of stdout and, when `log_dir` is set, written to
/// `<log_dir>/events-<node>.log`. Keep the returned guard alive for as long
/// as the file should be flushed.
pub fn init_tracing(node_name: &str, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let (event_writer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::never(dir, format!("events-{}.log", node_name));
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (Some(writer), Some(guard))
        }
        None => (None, None),
    };

    let event_layer = event_writer.map(|writer| {
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
                metadata.target() == "consensus"
            }))
    });

    let stdout_layer = tracing_subscriber::fmt::layer()
        .with_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,oracle_node=debug".into()),
        )
        .with_filter(tracing_subscriber::filter::filter_fn(|metadata| {
            metadata.target() != "consensus"
        }));

    // A second init (tests, embedding) keeps the subscriber already installed.
    let _ = tracing_subscriber::registry()
        .with(event_layer)
        .with(stdout_layer)
        .try_init();

    guard
}

/// Reports panics on stderr before the default unwinding output.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let msg = match info.payload().downcast_ref::<&'static str>() {
            Some(s) => *s,
            None => match info.payload().downcast_ref::<String>() {
                Some(s) => &s[..],
                None => "Box<Any>",
            },
        };
        let location = match info.location() {
            Some(l) => format!("at {}:{}:{}", l.file(), l.line(), l.column()),
            None => "unknown location".to_string(),
        };
        eprintln!("CRASH: {} {}", msg, location);
        tracing::error!("💥 Panic: {} {}", msg, location);
    }));
}
