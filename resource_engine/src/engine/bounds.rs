//! Per-player bound adjustment.

use resource_rules::{
    reconcile_delta, BoundSpec, ReconciliationMode, ReconciliationResult, ResourceError,
    ResourceResult,
};

use super::cascade::Cascade;
use super::{AdjustBoundsResult, BoundAdjustment, BoundChange, ResourceEngine};
use crate::state::{GainLog, PlayerResourceState, WriteOptions, WriteOrigin};

impl<'c> ResourceEngine<'c> {
    /// Override one side of a resource's bounds for this player, then clamp
    /// the value into the new bounds and cascade.
    pub fn adjust_bound(
        &self,
        state: &mut PlayerResourceState,
        adjustment: &BoundAdjustment,
        log: &mut dyn GainLog,
    ) -> ResourceResult<AdjustBoundsResult> {
        if adjustment.reconciliation != ReconciliationMode::Clamp {
            return Err(ResourceError::UnsupportedReconciliationMode {
                operation: "adjust_bound",
                mode: adjustment.reconciliation,
            });
        }
        let id = &adjustment.resource_id;
        let side = adjustment.side;
        let definition = self.definition(id)?;
        let previous_bound = state.resolve_bounds(definition).get(side);

        let spec = match &adjustment.change {
            BoundChange::Set(spec) => spec.clone(),
            BoundChange::Shift(amount) => {
                previous_bound.map(|bound| BoundSpec::Literal(bound.saturating_add(*amount)))
            }
        };
        state.set_bound_override(id, side, spec);
        let next_bound = state.refresh_bounds(definition).get(side);

        tracing::debug!(
            player = %state.player_id(),
            resource = %id,
            bound = %side,
            previous_bound = ?previous_bound,
            next_bound = ?next_bound,
            "bound_adjusted"
        );

        if let Some(group) = &definition.parent_of {
            let before = state.read(self.catalog, id)?;
            self.aggregate(state, group, &mut Cascade::new(), log)?;
            let after = state.read(self.catalog, id)?;
            return Ok(AdjustBoundsResult {
                resource_id: id.clone(),
                side,
                previous_bound,
                next_bound,
                value: ReconciliationResult {
                    requested_delta: 0,
                    applied_delta: after.saturating_sub(before),
                    final_value: after,
                    ..ReconciliationResult::default()
                },
            });
        }

        let current = state.read(self.catalog, id)?;
        let bounds = state.resolve_bounds(definition);
        let value = reconcile_delta(current, 0, bounds, ReconciliationMode::Clamp)?;

        let options = WriteOptions::new(WriteOrigin::BoundAdjustment)
            .clamped(value.clamped_to_lower_bound, value.clamped_to_upper_bound);
        let mut cascade = Cascade::inheriting(&options);
        cascade.enter(id);
        self.commit(state, id, value.final_value, options, &mut cascade, log)?;

        Ok(AdjustBoundsResult {
            resource_id: id.clone(),
            side,
            previous_bound,
            next_bound,
            value,
        })
    }
}
