//! Bound specs and the dynamic bound resolver.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{BoundSide, ReconciliationMode};
use crate::definitions::ResourceId;

/// A bound that tracks another resource's live value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoundReference {
    pub resource_id: ResourceId,
    /// How the owning resource reacts when the referenced value moves.
    #[serde(default)]
    pub reconciliation: ReconciliationMode,
}

/// A declared bound: a literal or a reference to another resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundSpec {
    Literal(i64),
    Reference(BoundReference),
}

impl BoundSpec {
    /// Reference bound with the default (clamp) reconciliation.
    pub fn reference(resource_id: impl Into<ResourceId>) -> Self {
        BoundSpec::Reference(BoundReference {
            resource_id: resource_id.into(),
            reconciliation: ReconciliationMode::Clamp,
        })
    }

    /// Reference bound with an explicit reconciliation.
    pub fn reference_with(resource_id: impl Into<ResourceId>, mode: ReconciliationMode) -> Self {
        BoundSpec::Reference(BoundReference {
            resource_id: resource_id.into(),
            reconciliation: mode,
        })
    }

    /// The referenced resource, if this is a reference bound.
    pub fn referenced_resource(&self) -> Option<&ResourceId> {
        match self {
            BoundSpec::Literal(_) => None,
            BoundSpec::Reference(reference) => Some(&reference.resource_id),
        }
    }

    /// Check if this bound follows the given resource.
    pub fn references(&self, resource_id: &ResourceId) -> bool {
        self.referenced_resource() == Some(resource_id)
    }
}

/// Resolve a bound against current values.
///
/// A missing bound, or a reference to a resource without a value, resolves
/// to `None` (unbounded).
pub fn resolve_bound(spec: Option<&BoundSpec>, values: &HashMap<ResourceId, i64>) -> Option<i64> {
    match spec? {
        BoundSpec::Literal(value) => Some(*value),
        BoundSpec::Reference(reference) => {
            let resolved = values.get(&reference.resource_id).copied();
            if resolved.is_none() {
                tracing::trace!(
                    resource = %reference.resource_id,
                    "bound_reference_unresolved"
                );
            }
            resolved
        }
    }
}

/// Literal snapshot of both bounds of a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ResolvedBounds {
    pub lower: Option<i64>,
    pub upper: Option<i64>,
}

impl ResolvedBounds {
    pub fn new(lower: Option<i64>, upper: Option<i64>) -> Self {
        Self { lower, upper }
    }

    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn get(&self, side: BoundSide) -> Option<i64> {
        match side {
            BoundSide::Lower => self.lower,
            BoundSide::Upper => self.upper,
        }
    }

    /// Clamp a value into the bounds. When the bounds cross, the lower bound wins.
    pub fn clamp(&self, value: i64) -> i64 {
        let capped = self.upper.map_or(value, |upper| value.min(upper));
        self.lower.map_or(capped, |lower| capped.max(lower))
    }

    pub fn exceeds(&self, side: BoundSide, value: i64) -> bool {
        match (side, self.get(side)) {
            (BoundSide::Lower, Some(lower)) => value < lower,
            (BoundSide::Upper, Some(upper)) => value > upper,
            (_, None) => false,
        }
    }

    /// The first violated side (upper checked first) and its bound value.
    pub fn violation(&self, value: i64) -> Option<(BoundSide, i64)> {
        [BoundSide::Upper, BoundSide::Lower]
            .into_iter()
            .find(|side| self.exceeds(*side, value))
            .and_then(|side| self.get(side).map(|bound| (side, bound)))
    }

    pub fn contains(&self, value: i64) -> bool {
        self.violation(value).is_none()
    }
}
