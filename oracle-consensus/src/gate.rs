use serde::{Deserialize, Serialize};

/// Suppresses publication of values too close to the last published one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChangeGate {
    pub threshold: f64,
}

impl Default for ChangeGate {
    fn default() -> Self {
        Self { threshold: 0.01 }
    }
}

impl ChangeGate {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    /// `|candidate - last| / |last|`, or `None` when there is no usable
    /// reference (nothing published yet, or a zero last value).
    pub fn relative_change(last: Option<f64>, candidate: f64) -> Option<f64> {
        match last {
            Some(last) if last != 0.0 => Some(((candidate - last) / last).abs()),
            _ => None,
        }
    }

    /// An unset (or zero) last value always passes.
    pub fn should_publish(&self, last: Option<f64>, candidate: f64) -> bool {
        match Self::relative_change(last, candidate) {
            Some(change) => change > self.threshold,
            None => true,
        }
    }
}
