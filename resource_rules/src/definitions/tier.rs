//! Tier tracks - threshold bands a resource value falls into.

use serde::{Deserialize, Serialize};

use super::TierId;

/// Inclusive value range of a tier. `None` on either side = unbounded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TierThreshold {
    pub min: Option<i64>,
    pub max: Option<i64>,
}

impl TierThreshold {
    pub fn new(min: Option<i64>, max: Option<i64>) -> Self {
        Self { min, max }
    }

    /// Check if a value falls inside the band (inclusive on both ends).
    pub fn contains(&self, value: i64) -> bool {
        self.min.map_or(true, |min| value >= min) && self.max.map_or(true, |max| value <= max)
    }
}

/// A single tier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierDefinition {
    pub id: TierId,
    pub label: String,
    pub threshold: TierThreshold,
    pub order: Option<i64>,
    pub resolved_order: usize,
    /// Opaque payloads consumed by the passive-effect system on entry.
    #[serde(default)]
    pub enter_effects: Vec<serde_json::Value>,
    /// Opaque payloads consumed by the passive-effect system on exit.
    #[serde(default)]
    pub exit_effects: Vec<serde_json::Value>,
}

impl TierDefinition {
    pub fn new(id: impl Into<String>, threshold: TierThreshold) -> Self {
        let id = id.into();
        Self {
            label: id.clone(),
            id: TierId(id),
            threshold,
            order: None,
            resolved_order: 0,
            enter_effects: Vec::new(),
            exit_effects: Vec::new(),
        }
    }
}

/// Ordered tiers of one resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TierTrack {
    /// Sorted by `resolved_order`.
    tiers: Vec<TierDefinition>,
}

impl TierTrack {
    /// Build a track, resolving tier order by `(order, insertion index)`.
    pub fn new(tiers: Vec<TierDefinition>) -> Self {
        let mut indexed: Vec<(usize, TierDefinition)> = tiers.into_iter().enumerate().collect();
        indexed.sort_by_key(|(index, tier)| (tier.order.unwrap_or(*index as i64), *index));

        let tiers = indexed
            .into_iter()
            .enumerate()
            .map(|(resolved, (_, mut tier))| {
                tier.resolved_order = resolved;
                tier
            })
            .collect();

        Self { tiers }
    }

    /// Tiers in resolved order.
    pub fn tiers(&self) -> &[TierDefinition] {
        &self.tiers
    }

    pub fn tier(&self, id: &TierId) -> Option<&TierDefinition> {
        self.tiers.iter().find(|tier| &tier.id == id)
    }

    /// First tier (in resolved order) whose threshold contains the value.
    pub fn resolve(&self, value: i64) -> Option<&TierDefinition> {
        self.tiers.iter().find(|tier| tier.threshold.contains(value))
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

/// Map a value to the id of the tier it currently falls into.
pub fn resolve_tier(track: &TierTrack, value: i64) -> Option<TierId> {
    track.resolve(value).map(|tier| tier.id.clone())
}
