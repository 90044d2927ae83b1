//! Reconciliation mechanics: bound resolution, rounding and the clamp/pass/reject policies.

mod bounds;
mod reconcile;

pub use bounds::*;
pub use reconcile::*;

use serde::{Deserialize, Serialize};

/// Policy for a value that would land outside its bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconciliationMode {
    /// Truncate to the violated bound.
    #[default]
    Clamp,
    /// Ignore bounds entirely.
    Pass,
    /// Fail the operation and apply nothing.
    Reject,
}

impl ReconciliationMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReconciliationMode::Clamp => "clamp",
            ReconciliationMode::Pass => "pass",
            ReconciliationMode::Reject => "reject",
        }
    }
}

impl std::fmt::Display for ReconciliationMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rounding applied to fractional percent deltas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundingMode {
    /// Away from zero.
    Up,
    /// Toward zero.
    Down,
    /// Half away from zero.
    #[default]
    Nearest,
}

/// Products closer than this to an integer are treated as that integer.
const INTEGER_EPSILON: f64 = 1e-9;

impl RoundingMode {
    /// Round a fractional value to an integer.
    pub fn apply(&self, value: f64) -> i64 {
        if let Some(exact) = as_integer(value) {
            return exact;
        }
        let rounded = match self {
            RoundingMode::Up if value >= 0.0 => value.ceil(),
            RoundingMode::Up => value.floor(),
            RoundingMode::Down if value >= 0.0 => value.floor(),
            RoundingMode::Down => value.ceil(),
            RoundingMode::Nearest => value.round(),
        };
        rounded as i64
    }
}

/// Return the integer a float represents, tolerating float noise.
pub fn as_integer(value: f64) -> Option<i64> {
    if !value.is_finite() {
        return None;
    }
    let nearest = value.round();
    // `i64::MAX as f64` rounds up to 2^63, which is already out of range.
    if nearest < i64::MIN as f64 || nearest >= i64::MAX as f64 {
        return None;
    }
    if (value - nearest).abs() < INTEGER_EPSILON {
        Some(nearest as i64)
    } else {
        None
    }
}

/// Which side of a resource's range a bound constrains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundSide {
    Lower,
    Upper,
}

impl BoundSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            BoundSide::Lower => "lower",
            BoundSide::Upper => "upper",
        }
    }
}

impl std::fmt::Display for BoundSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
