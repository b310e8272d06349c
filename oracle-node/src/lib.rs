pub mod api;
pub mod cli;
pub mod config;
pub mod logging;
pub mod node;
pub mod runtime;

pub use config::NodeConfig;
pub use node::OracleNode;
pub use runtime::builder::build_runtime;
