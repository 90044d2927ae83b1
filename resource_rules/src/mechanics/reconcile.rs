//! The reconciliation engine: requested delta in, applied delta out.
//!
//! Everything here is pure. Callers commit the returned [`ReconciliationResult`]
//! to state only when reconciliation succeeds, so a `reject` failure leaves
//! nothing behind.

use serde::{Deserialize, Serialize};

use super::{BoundSide, ReconciliationMode, ResolvedBounds, RoundingMode};
use crate::error::{ResourceError, ResourceResult};

/// A requested change to a resource value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceChange {
    /// Fixed signed delta.
    Amount(i64),
    /// Delta as a fraction of the current (or scope base) value.
    Percent {
        /// Summed before applying, e.g. `[0.25, -0.1]` = +15%.
        modifiers: Vec<f64>,
        /// `None` falls back to the caller's default (nearest).
        #[serde(default)]
        rounding: Option<RoundingMode>,
    },
}

impl ResourceChange {
    pub fn amount(amount: i64) -> Self {
        ResourceChange::Amount(amount)
    }

    pub fn percent(modifier: f64) -> Self {
        ResourceChange::Percent {
            modifiers: vec![modifier],
            rounding: None,
        }
    }

    pub fn percent_rounded(modifiers: Vec<f64>, rounding: RoundingMode) -> Self {
        ResourceChange::Percent {
            modifiers,
            rounding: Some(rounding),
        }
    }

    /// Total percent modifier, or `None` for amount changes.
    pub fn percent_total(&self) -> Option<f64> {
        match self {
            ResourceChange::Amount(_) => None,
            ResourceChange::Percent { modifiers, .. } => Some(modifiers.iter().sum()),
        }
    }
}

/// Outcome of every mutating resource operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ReconciliationResult {
    pub requested_delta: i64,
    pub applied_delta: i64,
    pub final_value: i64,
    /// The unclamped target was strictly below the lower bound.
    pub clamped_to_lower_bound: bool,
    /// The unclamped target was strictly above the upper bound.
    pub clamped_to_upper_bound: bool,
}

impl ReconciliationResult {
    /// A result that leaves `value` untouched.
    pub fn unchanged(value: i64) -> Self {
        Self {
            final_value: value,
            ..Self::default()
        }
    }

    pub fn was_clamped(&self) -> bool {
        self.clamped_to_lower_bound || self.clamped_to_upper_bound
    }
}

/// Compute the delta a change requests against the current value.
pub fn requested_delta(
    current: i64,
    change: &ResourceChange,
    default_rounding: RoundingMode,
) -> i64 {
    match change {
        ResourceChange::Amount(amount) => *amount,
        ResourceChange::Percent {
            modifiers,
            rounding,
        } => {
            let total: f64 = modifiers.iter().sum();
            rounding
                .unwrap_or(default_rounding)
                .apply(current as f64 * total)
        }
    }
}

/// Reconcile a change against resolved bounds under the given mode.
pub fn reconcile(
    current: i64,
    change: &ResourceChange,
    bounds: ResolvedBounds,
    mode: ReconciliationMode,
) -> ResourceResult<ReconciliationResult> {
    let delta = requested_delta(current, change, RoundingMode::default());
    reconcile_delta(current, delta, bounds, mode)
}

/// Reconcile an already computed delta against resolved bounds.
pub fn reconcile_delta(
    current: i64,
    requested_delta: i64,
    bounds: ResolvedBounds,
    mode: ReconciliationMode,
) -> ResourceResult<ReconciliationResult> {
    let target = current.saturating_add(requested_delta);

    let (final_value, clamped_to_lower_bound, clamped_to_upper_bound) = match mode {
        ReconciliationMode::Pass => (target, false, false),
        ReconciliationMode::Clamp => (
            bounds.clamp(target),
            bounds.exceeds(BoundSide::Lower, target),
            bounds.exceeds(BoundSide::Upper, target),
        ),
        ReconciliationMode::Reject => {
            if let Some((bound_type, bound_value)) = bounds.violation(target) {
                tracing::debug!(
                    bound = %bound_type,
                    target,
                    bound_value,
                    requested_delta,
                    "reconcile_rejected"
                );
                return Err(ResourceError::ResourceBoundExceeded {
                    resource_id: None,
                    bound_type,
                    target_value: target,
                    bound_value,
                    requested_delta,
                });
            }
            (target, false, false)
        }
    };

    Ok(ReconciliationResult {
        requested_delta,
        applied_delta: final_value.saturating_sub(current),
        final_value,
        clamped_to_lower_bound,
        clamped_to_upper_bound,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bounds_0_100() -> ResolvedBounds {
        ResolvedBounds::new(Some(0), Some(100))
    }

    #[test]
    fn test_clamp_to_upper_bound() {
        let result = reconcile(
            90,
            &ResourceChange::amount(20),
            bounds_0_100(),
            ReconciliationMode::Clamp,
        )
        .unwrap();

        assert_eq!(result.final_value, 100);
        assert_eq!(result.applied_delta, 10);
        assert_eq!(result.requested_delta, 20);
        assert!(result.clamped_to_upper_bound);
        assert!(!result.clamped_to_lower_bound);
    }

    #[test]
    fn test_landing_on_bound_is_not_clamped() {
        let result = reconcile(
            90,
            &ResourceChange::amount(10),
            bounds_0_100(),
            ReconciliationMode::Clamp,
        )
        .unwrap();

        assert_eq!(result.final_value, 100);
        assert!(!result.was_clamped());
    }

    #[test]
    fn test_clamp_to_lower_bound() {
        let result = reconcile(
            5,
            &ResourceChange::amount(-8),
            bounds_0_100(),
            ReconciliationMode::Clamp,
        )
        .unwrap();

        assert_eq!(result.final_value, 0);
        assert_eq!(result.applied_delta, -5);
        assert!(result.clamped_to_lower_bound);
    }

    #[test]
    fn test_reject_reports_bound() {
        let error = reconcile(
            90,
            &ResourceChange::amount(20),
            bounds_0_100(),
            ReconciliationMode::Reject,
        )
        .unwrap_err();

        assert_eq!(
            error,
            ResourceError::ResourceBoundExceeded {
                resource_id: None,
                bound_type: BoundSide::Upper,
                target_value: 110,
                bound_value: 100,
                requested_delta: 20,
            }
        );
    }

    #[test]
    fn test_reject_within_bounds_applies() {
        let result = reconcile(
            90,
            &ResourceChange::amount(-90),
            bounds_0_100(),
            ReconciliationMode::Reject,
        )
        .unwrap();
        assert_eq!(result.final_value, 0);
    }

    #[test]
    fn test_pass_ignores_bounds() {
        let result = reconcile(
            90,
            &ResourceChange::amount(20),
            bounds_0_100(),
            ReconciliationMode::Pass,
        )
        .unwrap();

        assert_eq!(result.final_value, 110);
        assert_eq!(result.applied_delta, 20);
        assert!(!result.was_clamped());
    }

    #[test]
    fn test_unbounded_sides() {
        let result = reconcile(
            0,
            &ResourceChange::amount(-50),
            ResolvedBounds::new(None, Some(10)),
            ReconciliationMode::Reject,
        )
        .unwrap();
        assert_eq!(result.final_value, -50);
    }

    #[test]
    fn test_percent_change_rounding() {
        let change = ResourceChange::percent_rounded(vec![0.25], RoundingMode::Up);
        assert_eq!(requested_delta(10, &change, RoundingMode::Nearest), 3);

        let change = ResourceChange::percent_rounded(vec![0.25], RoundingMode::Down);
        assert_eq!(requested_delta(10, &change, RoundingMode::Nearest), 2);

        let change = ResourceChange::Percent {
            modifiers: vec![0.5, -0.25],
            rounding: None,
        };
        assert_eq!(requested_delta(10, &change, RoundingMode::Nearest), 3);
        assert_eq!(requested_delta(10, &change, RoundingMode::Down), 2);
    }

    #[test]
    fn test_percent_reconcile_uses_nearest() {
        let result = reconcile(
            50,
            &ResourceChange::percent(-0.5),
            ResolvedBounds::unbounded(),
            ReconciliationMode::Clamp,
        )
        .unwrap();
        assert_eq!(result.final_value, 25);
        assert_eq!(result.requested_delta, -25);
    }
}
