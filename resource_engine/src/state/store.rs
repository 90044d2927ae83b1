//! Reads and writes against the player store.

use resource_rules::{
    resolve_bound, BoundDependent, BoundSide, BoundSpec, Catalog, ResolvedBounds,
    ResourceDefinition, ResourceError, ResourceId, ResourceResult,
};

use super::{BoundOverride, GainEntry, GainLog, PlayerResourceState};
use crate::events::TierTransition;

/// Which path a write comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOrigin {
    /// A caller-requested change.
    Request,
    /// A forced clamp after a referenced bound moved.
    Cascade,
    /// A clamp after the resource's own bound was adjusted.
    BoundAdjustment,
    /// Group parent re-aggregation; the only origin allowed to write parents.
    Aggregation,
}

/// Flags carried by a single write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteOptions {
    pub origin: WriteOrigin,
    pub suppress_touched: bool,
    pub suppress_log: bool,
    pub clamped_to_lower_bound: bool,
    pub clamped_to_upper_bound: bool,
    /// `false` for writes made in pass mode; clamp flags are then not recorded.
    pub mark_bounds: bool,
}

impl WriteOptions {
    pub fn new(origin: WriteOrigin) -> Self {
        Self {
            origin,
            suppress_touched: false,
            suppress_log: false,
            clamped_to_lower_bound: false,
            clamped_to_upper_bound: false,
            mark_bounds: true,
        }
    }

    pub fn clamped(mut self, lower: bool, upper: bool) -> Self {
        self.clamped_to_lower_bound = lower;
        self.clamped_to_upper_bound = upper;
        self
    }
}

impl PlayerResourceState {
    /// Read a value; fails for ids the catalog does not declare.
    pub fn read(&self, catalog: &Catalog, id: &ResourceId) -> ResourceResult<i64> {
        if !catalog.contains(id) {
            return Err(ResourceError::UnknownResource(id.clone()));
        }
        self.value(id)
            .ok_or_else(|| ResourceError::UnknownResource(id.clone()))
    }

    /// The bound spec in effect for one side: the player's override, else the catalog's.
    pub fn bound_spec<'s>(
        &'s self,
        definition: &'s ResourceDefinition,
        side: BoundSide,
    ) -> Option<&'s BoundSpec> {
        let overridden = self.bound_overrides.get(&definition.id).map(|overrides| match side {
            BoundSide::Lower => &overrides.lower,
            BoundSide::Upper => &overrides.upper,
        });
        match overridden {
            Some(BoundOverride::Set(spec)) => spec.as_ref(),
            Some(BoundOverride::Inherit) | None => definition.bound(side),
        }
    }

    pub(crate) fn set_bound_override(
        &mut self,
        id: &ResourceId,
        side: BoundSide,
        spec: Option<BoundSpec>,
    ) {
        let overrides = self.bound_overrides.entry(id.clone()).or_default();
        let slot = match side {
            BoundSide::Lower => &mut overrides.lower,
            BoundSide::Upper => &mut overrides.upper,
        };
        *slot = BoundOverride::Set(spec);
    }

    /// Resolve both bounds against live values without storing them.
    pub fn resolve_bounds(&self, definition: &ResourceDefinition) -> ResolvedBounds {
        ResolvedBounds::new(
            resolve_bound(self.bound_spec(definition, BoundSide::Lower), &self.values),
            resolve_bound(self.bound_spec(definition, BoundSide::Upper), &self.values),
        )
    }

    /// Resolve both bounds and store the snapshot.
    pub fn refresh_bounds(&mut self, definition: &ResourceDefinition) -> ResolvedBounds {
        let bounds = self.resolve_bounds(definition);
        self.lower_bounds.insert(definition.id.clone(), bounds.lower);
        self.upper_bounds.insert(definition.id.clone(), bounds.upper);
        bounds
    }

    /// Resources whose effective bound currently follows `source`.
    ///
    /// Starts from the catalog index, then adds player overrides that newly
    /// reference `source`. Each entry carries the reconciliation of the bound
    /// in effect for this player, so an override can change how it cascades.
    pub fn dependents_of(&self, catalog: &Catalog, source: &ResourceId) -> Vec<BoundDependent> {
        let mut candidates: Vec<(&ResourceId, BoundSide)> = catalog
            .dependents_of(source)
            .iter()
            .map(|dependent| (&dependent.resource_id, dependent.side))
            .collect();

        let mut overridden: Vec<(&ResourceId, BoundSide)> = self
            .bound_overrides
            .iter()
            .flat_map(|(id, overrides)| {
                [
                    (id, BoundSide::Lower, &overrides.lower),
                    (id, BoundSide::Upper, &overrides.upper),
                ]
            })
            .filter_map(|(id, side, slot)| match slot {
                BoundOverride::Set(Some(spec)) if spec.references(source) => Some((id, side)),
                _ => None,
            })
            .collect();
        // Map iteration order is arbitrary; cascade order must not be.
        overridden.sort_by(|a, b| (a.0, a.1.as_str()).cmp(&(b.0, b.1.as_str())));
        for candidate in overridden {
            if !candidates.contains(&candidate) {
                candidates.push(candidate);
            }
        }

        candidates
            .into_iter()
            .filter_map(|(id, side)| {
                let definition = catalog.resource(id)?;
                match self.bound_spec(definition, side)? {
                    BoundSpec::Reference(reference) if &reference.resource_id == source => {
                        Some(BoundDependent {
                            resource_id: id.clone(),
                            side,
                            reconciliation: reference.reconciliation,
                        })
                    }
                    _ => None,
                }
            })
            .collect()
    }

    /// Commit a final value. Returns the delta actually written.
    ///
    /// Flips `touched`, records clamp flags, refreshes the bound snapshot and
    /// tier, and appends to the gain log unless suppressed. Group parents can
    /// only be written by aggregation.
    pub(crate) fn write(
        &mut self,
        catalog: &Catalog,
        id: &ResourceId,
        value: i64,
        options: WriteOptions,
        log: &mut dyn GainLog,
    ) -> ResourceResult<i64> {
        let definition = catalog
            .resource(id)
            .ok_or_else(|| ResourceError::UnknownResource(id.clone()))?;
        if definition.is_group_parent() && options.origin != WriteOrigin::Aggregation {
            return Err(ResourceError::ParentIsDerived(id.clone()));
        }
        let previous = self
            .value(id)
            .ok_or_else(|| ResourceError::UnknownResource(id.clone()))?;

        let delta = value.saturating_sub(previous);
        self.values.insert(id.clone(), value);

        if delta != 0 && !options.suppress_touched {
            self.touched.insert(id.clone(), true);
        }
        if options.mark_bounds
            && (options.clamped_to_lower_bound || options.clamped_to_upper_bound)
        {
            let touched = self.bound_touched.entry(id.clone()).or_default();
            touched.lower |= options.clamped_to_lower_bound;
            touched.upper |= options.clamped_to_upper_bound;
        }

        self.refresh_bounds(definition);
        self.refresh_tier(definition, value);

        if delta != 0 && !options.suppress_log {
            log.record(GainEntry {
                resource_id: id.clone(),
                amount: delta,
            });
        }

        tracing::debug!(
            player = %self.player_id,
            resource = %id,
            previous,
            value,
            origin = ?options.origin,
            "resource_written"
        );
        Ok(delta)
    }

    fn refresh_tier(&mut self, definition: &ResourceDefinition, value: i64) {
        let next = definition
            .tier_track
            .as_ref()
            .and_then(|track| track.resolve(value))
            .map(|tier| tier.id.clone());
        let previous = self
            .tier_ids
            .insert(definition.id.clone(), next.clone())
            .flatten();

        if previous != next {
            tracing::debug!(
                resource = %definition.id,
                previous = ?previous,
                next = ?next,
                "tier_changed"
            );
            self.tier_transitions.push(TierTransition {
                resource_id: definition.id.clone(),
                previous,
                next,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{BoundTouched, DiscardGainLog, GainEntry, PlayerId};
    use resource_rules::{ReconciliationMode, TierId};

    const CATALOG: &str = r#"
        [[groups]]
        id = "citizens"
        parent = { id = "total_citizens" }

        [[resources]]
        id = "gold"
        lower_bound = 0
        upper_bound = 100

        [[resources]]
        id = "max_population"
        initial_value = 20

        [[resources]]
        id = "population"
        upper_bound = { resource = "max_population" }

        [[resources]]
        id = "council"
        group = "citizens"

        [[resources]]
        id = "happiness"

        [[resources.tiers]]
        id = "calm"
        threshold = { min = 0, max = 4 }

        [[resources.tiers]]
        id = "joyful"
        threshold = { min = 5 }
    "#;

    fn id(id: &str) -> ResourceId {
        ResourceId::from(id)
    }

    fn setup() -> (Catalog, PlayerResourceState) {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let state = PlayerResourceState::from_catalog(PlayerId::nil(), &catalog);
        (catalog, state)
    }

    #[test]
    fn test_read_unknown_resource() {
        let (catalog, state) = setup();
        assert_eq!(state.read(&catalog, &id("gold")), Ok(0));
        assert_eq!(
            state.read(&catalog, &id("mana")),
            Err(ResourceError::UnknownResource(id("mana")))
        );
    }

    #[test]
    fn test_write_logs_and_touches() {
        let (catalog, mut state) = setup();
        let mut log: Vec<GainEntry> = Vec::new();

        let delta = state
            .write(&catalog, &id("gold"), 7, WriteOptions::new(WriteOrigin::Request), &mut log)
            .unwrap();

        assert_eq!(delta, 7);
        assert!(state.is_touched(&id("gold")));
        assert_eq!(
            log,
            vec![GainEntry {
                resource_id: id("gold"),
                amount: 7
            }]
        );
    }

    #[test]
    fn test_write_same_value_is_silent() {
        let (catalog, mut state) = setup();
        let mut log: Vec<GainEntry> = Vec::new();

        let delta = state
            .write(&catalog, &id("gold"), 0, WriteOptions::new(WriteOrigin::Request), &mut log)
            .unwrap();

        assert_eq!(delta, 0);
        assert!(!state.is_touched(&id("gold")));
        assert!(log.is_empty());
    }

    #[test]
    fn test_write_suppression() {
        let (catalog, mut state) = setup();
        let mut log: Vec<GainEntry> = Vec::new();
        let mut options = WriteOptions::new(WriteOrigin::Request);
        options.suppress_touched = true;
        options.suppress_log = true;

        state.write(&catalog, &id("gold"), 5, options, &mut log).unwrap();

        assert_eq!(state.value(&id("gold")), Some(5));
        assert!(!state.is_touched(&id("gold")));
        assert!(log.is_empty());
    }

    #[test]
    fn test_write_records_bound_touched() {
        let (catalog, mut state) = setup();
        let options = WriteOptions::new(WriteOrigin::Request).clamped(false, true);

        state
            .write(&catalog, &id("gold"), 100, options, &mut DiscardGainLog)
            .unwrap();
        assert_eq!(
            state.bound_touched(&id("gold")),
            BoundTouched {
                lower: false,
                upper: true
            }
        );

        let mut pass = WriteOptions::new(WriteOrigin::Request).clamped(true, false);
        pass.mark_bounds = false;
        state.write(&catalog, &id("gold"), 0, pass, &mut DiscardGainLog).unwrap();
        assert!(!state.bound_touched(&id("gold")).lower);
    }

    #[test]
    fn test_parent_write_is_derived() {
        let (catalog, mut state) = setup();

        let error = state
            .write(
                &catalog,
                &id("total_citizens"),
                3,
                WriteOptions::new(WriteOrigin::Request),
                &mut DiscardGainLog,
            )
            .unwrap_err();
        assert_eq!(error, ResourceError::ParentIsDerived(id("total_citizens")));

        state
            .write(
                &catalog,
                &id("total_citizens"),
                3,
                WriteOptions::new(WriteOrigin::Aggregation),
                &mut DiscardGainLog,
            )
            .unwrap();
        assert_eq!(state.value(&id("total_citizens")), Some(3));
    }

    #[test]
    fn test_write_recomputes_tier() {
        let (catalog, mut state) = setup();
        assert_eq!(state.tier_id(&id("happiness")), Some(&TierId::from("calm")));

        state
            .write(
                &catalog,
                &id("happiness"),
                6,
                WriteOptions::new(WriteOrigin::Request),
                &mut DiscardGainLog,
            )
            .unwrap();

        assert_eq!(state.tier_id(&id("happiness")), Some(&TierId::from("joyful")));
        let transitions = state.take_tier_transitions();
        assert_eq!(transitions.len(), 1);
        assert_eq!(transitions[0].previous, Some(TierId::from("calm")));
        assert_eq!(transitions[0].next, Some(TierId::from("joyful")));
        assert!(state.tier_transitions().is_empty());
    }

    #[test]
    fn test_bound_override_changes_dependents() {
        let (catalog, mut state) = setup();
        assert_eq!(state.dependents_of(&catalog, &id("max_population")).len(), 1);

        state.set_bound_override(
            &id("population"),
            BoundSide::Upper,
            Some(BoundSpec::Literal(5)),
        );
        assert!(state.dependents_of(&catalog, &id("max_population")).is_empty());
        assert_eq!(
            state.resolve_bounds(catalog.resource(&id("population")).unwrap()),
            ResolvedBounds::new(None, Some(5))
        );

        state.set_bound_override(
            &id("gold"),
            BoundSide::Lower,
            Some(BoundSpec::reference("max_population")),
        );
        let dependents = state.dependents_of(&catalog, &id("max_population"));
        assert_eq!(dependents.len(), 1);
        assert_eq!(dependents[0].resource_id, id("gold"));
        assert_eq!(dependents[0].side, BoundSide::Lower);
    }

    #[test]
    fn test_override_reconciliation_replaces_catalog() {
        let (catalog, mut state) = setup();
        assert_eq!(
            state.dependents_of(&catalog, &id("max_population"))[0].reconciliation,
            ReconciliationMode::Clamp
        );

        state.set_bound_override(
            &id("population"),
            BoundSide::Upper,
            Some(BoundSpec::reference_with("max_population", ReconciliationMode::Reject)),
        );
        let dependents = state.dependents_of(&catalog, &id("max_population"));
        assert_eq!(
            dependents,
            vec![BoundDependent {
                resource_id: id("population"),
                side: BoundSide::Upper,
                reconciliation: ReconciliationMode::Reject,
            }]
        );
    }
}
