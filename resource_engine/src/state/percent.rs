//! Additive percent accumulation within one logical step.
//!
//! Within a scope, every percent change against a resource is computed from
//! the value captured at first access, and the running modifier total is
//! rounded as a whole. Two `+50%` changes therefore land exactly where one
//! `+100%` change would.

use resource_rules::{ResourceId, RoundingMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Caller-supplied key of a logical step, e.g. turn + phase + step.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PercentScope(pub String);

impl PercentScope {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Scope key for a turn/phase/step triple.
    pub fn step(turn: u32, phase: &str, step: &str) -> Self {
        Self(format!("{turn}:{phase}:{step}"))
    }
}

impl std::fmt::Display for PercentScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
struct PercentEntry {
    base: i64,
    total: f64,
}

/// A computed, not yet committed, percent step.
#[derive(Debug, Clone, PartialEq)]
pub struct PercentPlan {
    pub scope: PercentScope,
    pub resource_id: ResourceId,
    pub base: i64,
    /// Modifier total after this change.
    pub total: f64,
    pub delta: i64,
}

/// Base values and running modifier totals for the current scope.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PercentLedger {
    scope: Option<PercentScope>,
    entries: HashMap<ResourceId, PercentEntry>,
}

impl PercentLedger {
    pub fn new() -> Self {
        Self::default()
    }

    fn entry(&self, scope: &PercentScope, resource_id: &ResourceId) -> Option<PercentEntry> {
        if self.scope.as_ref() == Some(scope) {
            self.entries.get(resource_id).copied()
        } else {
            None
        }
    }

    /// Compute the delta of one more percent change without touching the ledger.
    pub fn plan(
        &self,
        scope: &PercentScope,
        resource_id: &ResourceId,
        current: i64,
        modifier: f64,
        rounding: RoundingMode,
    ) -> PercentPlan {
        let (base, before) = self
            .entry(scope, resource_id)
            .map_or((current, 0.0), |entry| (entry.base, entry.total));
        let total = before + modifier;
        let delta = rounding
            .apply(base as f64 * total)
            .saturating_sub(rounding.apply(base as f64 * before));

        PercentPlan {
            scope: scope.clone(),
            resource_id: resource_id.clone(),
            base,
            total,
            delta,
        }
    }

    /// Record a plan once its change has been applied. A new scope clears the ledger.
    pub fn commit(&mut self, plan: PercentPlan) {
        if self.scope.as_ref() != Some(&plan.scope) {
            self.entries.clear();
            self.scope = Some(plan.scope);
        }
        self.entries.insert(
            plan.resource_id,
            PercentEntry {
                base: plan.base,
                total: plan.total,
            },
        );
    }

    /// Base captured for a resource in the given scope.
    pub fn base_of(&self, scope: &PercentScope, resource_id: &ResourceId) -> Option<i64> {
        self.entry(scope, resource_id).map(|entry| entry.base)
    }

    pub fn scope(&self) -> Option<&PercentScope> {
        self.scope.as_ref()
    }

    pub fn clear(&mut self) {
        self.scope = None;
        self.entries.clear();
    }
}
