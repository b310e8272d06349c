//! Local value sources.
//!
//! The round coordinator only ever sees [`PriceSource::local_estimate`]; how
//! the number is produced is up to the implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::warn;

use oracle_common::OracleError;

#[async_trait]
pub trait PriceSource: Send + Sync {
    async fn local_estimate(&self) -> Result<f64, OracleError>;

    fn name(&self) -> &str;
}

/// Mean of `samples` independent uniform draws in `[center - spread, center + spread)`.
#[derive(Debug, Clone)]
pub struct SyntheticPriceSource {
    pub center: f64,
    pub spread: f64,
    pub samples: usize,
}

impl Default for SyntheticPriceSource {
    fn default() -> Self {
        Self { center: 1000.0, spread: 1.0, samples: 3 }
    }
}

#[async_trait]
impl PriceSource for SyntheticPriceSource {
    async fn local_estimate(&self) -> Result<f64, OracleError> {
        if self.samples == 0 {
            return Err(OracleError::PriceSource("synthetic source configured with zero samples".into()));
        }

        let mut rng = rand::thread_rng();
        let total: f64 = (0..self.samples)
            .map(|_| self.center - self.spread + rng.gen::<f64>() * 2.0 * self.spread)
            .sum();

        Ok(total / self.samples as f64)
    }

    fn name(&self) -> &str {
        "synthetic"
    }
}

/// Returns a value set by the caller. Used in tests and local demos.
#[derive(Debug)]
pub struct FixedPriceSource {
    bits: AtomicU64,
}

impl FixedPriceSource {
    pub fn new(value: f64) -> Self {
        Self { bits: AtomicU64::new(value.to_bits()) }
    }

    pub fn set(&self, value: f64) {
        self.bits.store(value.to_bits(), Ordering::SeqCst);
    }

    pub fn get(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::SeqCst))
    }
}

#[async_trait]
impl PriceSource for FixedPriceSource {
    async fn local_estimate(&self) -> Result<f64, OracleError> {
        Ok(self.get())
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

/// Averages several providers. A failing provider is skipped; the call
/// only fails when none of them answered.
pub struct AveragedPriceSource {
    providers: Vec<Arc<dyn PriceSource>>,
}

impl AveragedPriceSource {
    pub fn new(providers: Vec<Arc<dyn PriceSource>>) -> Self {
        Self { providers }
    }
}

#[async_trait]
impl PriceSource for AveragedPriceSource {
    async fn local_estimate(&self) -> Result<f64, OracleError> {
        let mut quotes = Vec::with_capacity(self.providers.len());

        for provider in &self.providers {
            match provider.local_estimate().await {
                Ok(quote) if quote.is_finite() => quotes.push(quote),
                Ok(quote) => warn!("⚠️ Provider {} returned non-finite quote {}", provider.name(), quote),
                Err(e) => warn!("⚠️ Provider {} failed: {}", provider.name(), e),
            }
        }

        if quotes.is_empty() {
            return Err(OracleError::PriceSource("no provider returned a quote".into()));
        }

        Ok(quotes.iter().sum::<f64>() / quotes.len() as f64)
    }

    fn name(&self) -> &str {
        "averaged"
    }
}
