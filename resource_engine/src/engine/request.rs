//! Request and result types of the engine's operations.

use resource_rules::{
    BoundSide, BoundSpec, ReconciliationMode, ReconciliationResult, ResourceChange, ResourceId,
};
use serde::{Deserialize, Serialize};

use crate::state::PercentScope;

/// A requested change to one resource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeRequest {
    pub resource_id: ResourceId,
    pub change: ResourceChange,
    #[serde(default)]
    pub reconciliation: ReconciliationMode,
    /// Scales an amount, or the summed percent modifier.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,
    #[serde(default)]
    pub suppress_touched: bool,
    #[serde(default)]
    pub suppress_log: bool,
    /// Enables additive percent accumulation within this step.
    #[serde(default)]
    pub percent_scope: Option<PercentScope>,
}

fn default_multiplier() -> f64 {
    1.0
}

impl ChangeRequest {
    pub fn new(resource_id: impl Into<ResourceId>, change: ResourceChange) -> Self {
        Self {
            resource_id: resource_id.into(),
            change,
            reconciliation: ReconciliationMode::Clamp,
            multiplier: default_multiplier(),
            suppress_touched: false,
            suppress_log: false,
            percent_scope: None,
        }
    }

    /// Shorthand for a fixed amount.
    pub fn amount(resource_id: impl Into<ResourceId>, amount: i64) -> Self {
        Self::new(resource_id, ResourceChange::Amount(amount))
    }

    pub fn with_reconciliation(mut self, mode: ReconciliationMode) -> Self {
        self.reconciliation = mode;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_suppress_touched(mut self, suppress: bool) -> Self {
        self.suppress_touched = suppress;
        self
    }

    pub fn with_suppress_log(mut self, suppress: bool) -> Self {
        self.suppress_log = suppress;
        self
    }

    pub fn with_percent_scope(mut self, scope: PercentScope) -> Self {
        self.percent_scope = Some(scope);
        self
    }
}

/// How a bound is adjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundChange {
    /// Replace the bound; `None` = unbounded.
    Set(Option<BoundSpec>),
    /// Move the resolved bound by a signed amount, storing a literal.
    Shift(i64),
}

/// A request to change one side of a resource's bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundAdjustment {
    pub resource_id: ResourceId,
    pub side: BoundSide,
    pub change: BoundChange,
    #[serde(default)]
    pub reconciliation: ReconciliationMode,
}

impl BoundAdjustment {
    pub fn set(
        resource_id: impl Into<ResourceId>,
        side: BoundSide,
        bound: Option<BoundSpec>,
    ) -> Self {
        Self {
            resource_id: resource_id.into(),
            side,
            change: BoundChange::Set(bound),
            reconciliation: ReconciliationMode::Clamp,
        }
    }

    pub fn shift(resource_id: impl Into<ResourceId>, side: BoundSide, amount: i64) -> Self {
        Self {
            resource_id: resource_id.into(),
            side,
            change: BoundChange::Shift(amount),
            reconciliation: ReconciliationMode::Clamp,
        }
    }

    pub fn with_reconciliation(mut self, mode: ReconciliationMode) -> Self {
        self.reconciliation = mode;
        self
    }
}

/// Outcome of a bound adjustment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustBoundsResult {
    pub resource_id: ResourceId,
    pub side: BoundSide,
    pub previous_bound: Option<i64>,
    pub next_bound: Option<i64>,
    /// How the resource's value was reconciled against the new bound.
    pub value: ReconciliationResult,
}

/// Outcome of moving value between two resources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub donor: ReconciliationResult,
    pub recipient: ReconciliationResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_change_request_builder() {
        let request = ChangeRequest::amount("gold", 5)
            .with_reconciliation(ReconciliationMode::Reject)
            .with_multiplier(2.0)
            .with_suppress_log(true)
            .with_percent_scope(PercentScope::new("t1"));

        assert_eq!(request.resource_id, ResourceId::from("gold"));
        assert_eq!(request.change, ResourceChange::Amount(5));
        assert_eq!(request.reconciliation, ReconciliationMode::Reject);
        assert_eq!(request.multiplier, 2.0);
        assert!(request.suppress_log);
        assert!(!request.suppress_touched);
        assert_eq!(request.percent_scope, Some(PercentScope::new("t1")));
    }

    #[test]
    fn test_change_request_deserialize_defaults() {
        let request: ChangeRequest = serde_json::from_str(
            r#"{ "resource_id": "gold", "change": { "amount": 3 } }"#,
        )
        .unwrap();

        assert_eq!(request.multiplier, 1.0);
        assert_eq!(request.reconciliation, ReconciliationMode::Clamp);
        assert!(request.percent_scope.is_none());
    }
}
