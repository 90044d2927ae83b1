//! Player resource state - the mutable record of one player's resources.

mod gain_log;
mod percent;
mod store;

pub use gain_log::*;
pub use percent::*;
pub use store::*;

use resource_rules::{resolve_bound, BoundSpec, Catalog, ResolvedBounds, ResourceId, TierId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::events::TierTransition;

/// Unique identifier for players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerId(pub Uuid);

impl PlayerId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Whether a write has ever been clamped against each side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundTouched {
    pub lower: bool,
    pub upper: bool,
}

/// Per-player replacement of a catalog bound.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundOverride {
    /// Use the catalog definition.
    #[default]
    Inherit,
    /// Use this spec instead; `None` = unbounded.
    Set(Option<BoundSpec>),
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BoundOverrides {
    pub lower: BoundOverride,
    pub upper: BoundOverride,
}

/// All resource data for one player.
///
/// Every resource and group parent in the catalog has an entry in each map
/// once the state is initialised.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlayerResourceState {
    player_id: PlayerId,

    values: HashMap<ResourceId, i64>,

    /// Resolved literal snapshots, refreshed on every write.
    lower_bounds: HashMap<ResourceId, Option<i64>>,
    upper_bounds: HashMap<ResourceId, Option<i64>>,

    /// Set once a non-suppressed write changes the value.
    touched: HashMap<ResourceId, bool>,
    tier_ids: HashMap<ResourceId, Option<TierId>>,
    bound_touched: HashMap<ResourceId, BoundTouched>,

    #[serde(default)]
    bound_overrides: HashMap<ResourceId, BoundOverrides>,
    #[serde(default)]
    percent_ledger: PercentLedger,
    #[serde(default)]
    tier_transitions: Vec<TierTransition>,
}

/// Reset a player's resources to their catalog defaults.
pub fn initialise_player_resource_state(state: &mut PlayerResourceState, catalog: &Catalog) {
    state.initialise(catalog);
}

impl PlayerResourceState {
    /// Create an empty state. Call [`initialise`](Self::initialise) before use.
    pub fn new(player_id: PlayerId) -> Self {
        Self {
            player_id,
            ..Default::default()
        }
    }

    /// Create a state seeded from the catalog.
    pub fn from_catalog(player_id: PlayerId, catalog: &Catalog) -> Self {
        let mut state = Self::new(player_id);
        state.initialise(catalog);
        state
    }

    pub fn player_id(&self) -> PlayerId {
        self.player_id
    }

    /// Reset every resource to its seed value and clear all flags.
    ///
    /// Seeds are the explicit initial value, else the lower bound, else 0.
    /// Group parents start at zero and are then aggregated from their children.
    /// Calling this again yields the same state.
    pub fn initialise(&mut self, catalog: &Catalog) {
        *self = Self::new(self.player_id);

        let (parents, children): (Vec<_>, Vec<_>) = catalog
            .resources()
            .iter()
            .partition(|definition| definition.is_group_parent());

        for definition in &children {
            let seed = definition
                .initial_value
                .or(match definition.lower_bound {
                    Some(BoundSpec::Literal(lower)) => Some(lower),
                    _ => None,
                })
                .unwrap_or(0);
            self.values.insert(definition.id.clone(), seed);
        }

        // Lower bounds that follow other resources resolve once every seed exists.
        for definition in &children {
            if definition.initial_value.is_some() {
                continue;
            }
            if let Some(BoundSpec::Reference(_)) = &definition.lower_bound {
                if let Some(lower) = resolve_bound(definition.lower_bound.as_ref(), &self.values) {
                    self.values.insert(definition.id.clone(), lower);
                }
            }
        }

        for parent in &parents {
            self.values.insert(parent.id.clone(), 0);
        }
        for parent in &parents {
            let sum: i64 = parent
                .parent_of
                .as_ref()
                .map(|group| {
                    catalog
                        .children_of(group)
                        .iter()
                        .filter_map(|child| self.values.get(child))
                        .sum()
                })
                .unwrap_or(0);
            let bounds = self.resolve_bounds(parent);
            self.values.insert(parent.id.clone(), bounds.clamp(sum));
        }

        for definition in catalog.resources() {
            self.refresh_bounds(definition);
            let value = self.values.get(&definition.id).copied().unwrap_or(0);
            let tier = definition
                .tier_track
                .as_ref()
                .and_then(|track| track.resolve(value))
                .map(|tier| tier.id.clone());
            self.tier_ids.insert(definition.id.clone(), tier);
            self.touched.insert(definition.id.clone(), false);
            self.bound_touched
                .insert(definition.id.clone(), BoundTouched::default());
        }

        tracing::debug!(
            player = %self.player_id,
            resources = self.values.len(),
            "player_resources_initialised"
        );
    }

    /// Current value, or `None` for ids the state does not track.
    pub fn value(&self, id: &ResourceId) -> Option<i64> {
        self.values.get(id).copied()
    }

    pub fn values(&self) -> &HashMap<ResourceId, i64> {
        &self.values
    }

    /// Last resolved lower bound snapshot.
    pub fn lower_bound(&self, id: &ResourceId) -> Option<i64> {
        self.lower_bounds.get(id).copied().flatten()
    }

    /// Last resolved upper bound snapshot.
    pub fn upper_bound(&self, id: &ResourceId) -> Option<i64> {
        self.upper_bounds.get(id).copied().flatten()
    }

    pub fn bounds(&self, id: &ResourceId) -> ResolvedBounds {
        ResolvedBounds::new(self.lower_bound(id), self.upper_bound(id))
    }

    pub fn is_touched(&self, id: &ResourceId) -> bool {
        self.touched.get(id).copied().unwrap_or(false)
    }

    pub fn tier_id(&self, id: &ResourceId) -> Option<&TierId> {
        self.tier_ids.get(id).and_then(|tier| tier.as_ref())
    }

    pub fn bound_touched(&self, id: &ResourceId) -> BoundTouched {
        self.bound_touched.get(id).copied().unwrap_or_default()
    }

    pub fn percent_ledger(&self) -> &PercentLedger {
        &self.percent_ledger
    }

    pub(crate) fn percent_ledger_mut(&mut self) -> &mut PercentLedger {
        &mut self.percent_ledger
    }

    /// Tier transitions not yet consumed.
    pub fn tier_transitions(&self) -> &[TierTransition] {
        &self.tier_transitions
    }

    /// Drain pending tier transitions.
    pub fn take_tier_transitions(&mut self) -> Vec<TierTransition> {
        std::mem::take(&mut self.tier_transitions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
        [[groups]]
        id = "citizens"
        parent = { id = "total_citizens", lower_bound = 0, upper_bound = 4 }

        [[resources]]
        id = "gold"
        lower_bound = 0
        initial_value = 10

        [[resources]]
        id = "floor"
        initial_value = 3

        [[resources]]
        id = "happiness"
        lower_bound = -10
        upper_bound = 10

        [[resources.tiers]]
        id = "unrest"
        threshold = { max = -1 }

        [[resources.tiers]]
        id = "calm"
        threshold = { min = 0 }

        [[resources]]
        id = "stability"
        lower_bound = { resource = "floor" }

        [[resources]]
        id = "council"
        group = "citizens"
        initial_value = 2

        [[resources]]
        id = "legion"
        group = "citizens"
        initial_value = 3
    "#;

    fn id(id: &str) -> ResourceId {
        ResourceId::from(id)
    }

    #[test]
    fn test_initialise_seeds_values() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let state = PlayerResourceState::from_catalog(PlayerId::nil(), &catalog);

        assert_eq!(state.value(&id("gold")), Some(10));
        assert_eq!(state.value(&id("happiness")), Some(-10));
        assert_eq!(state.value(&id("stability")), Some(3));
        assert_eq!(state.value(&id("missing")), None);
    }

    #[test]
    fn test_initialise_aggregates_parents() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let state = PlayerResourceState::from_catalog(PlayerId::nil(), &catalog);

        // 2 + 3 clamped to the parent's upper bound
        assert_eq!(state.value(&id("total_citizens")), Some(4));
        assert_eq!(state.upper_bound(&id("total_citizens")), Some(4));
    }

    #[test]
    fn test_initialise_resets_flags_and_tiers() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let state = PlayerResourceState::from_catalog(PlayerId::nil(), &catalog);

        assert!(!state.is_touched(&id("gold")));
        assert_eq!(state.bound_touched(&id("gold")), BoundTouched::default());
        assert_eq!(state.tier_id(&id("happiness")), Some(&TierId::from("unrest")));
        assert_eq!(state.tier_id(&id("gold")), None);
        assert_eq!(state.lower_bound(&id("stability")), Some(3));
        assert_eq!(state.bounds(&id("happiness")), ResolvedBounds::new(Some(-10), Some(10)));
        assert!(state.tier_transitions().is_empty());
    }

    #[test]
    fn test_initialise_is_idempotent() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let mut state = PlayerResourceState::from_catalog(PlayerId::nil(), &catalog);
        let first = state.values().clone();

        initialise_player_resource_state(&mut state, &catalog);
        assert_eq!(state.values(), &first);
        assert_eq!(state.player_id(), PlayerId::nil());
    }

    #[test]
    fn test_state_snapshot_serializes() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let state = PlayerResourceState::from_catalog(PlayerId::nil(), &catalog);

        let json = serde_json::to_string(&state).unwrap();
        let restored: PlayerResourceState = serde_json::from_str(&json).unwrap();
        assert_eq!(restored.values(), state.values());
        assert_eq!(restored.tier_id(&id("happiness")), state.tier_id(&id("happiness")));
    }
}
