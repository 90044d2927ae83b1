//! Group parent aggregation.

use resource_rules::{BoundSide, GroupId, ResourceError, ResourceResult};

use super::cascade::Cascade;
use super::ResourceEngine;
use crate::state::{GainLog, PlayerResourceState, WriteOrigin};

impl<'c> ResourceEngine<'c> {
    /// Recompute a group's parent from its children.
    ///
    /// Returns the parent's new value, or `None` if the group has no parent.
    pub fn recompute_parent(
        &self,
        state: &mut PlayerResourceState,
        group_id: &GroupId,
        log: &mut dyn GainLog,
    ) -> ResourceResult<Option<i64>> {
        let group = self
            .catalog
            .group(group_id)
            .ok_or_else(|| ResourceError::UnknownGroup(group_id.clone()))?;
        let Some(parent) = &group.parent_id else {
            return Ok(None);
        };
        self.aggregate(state, group_id, &mut Cascade::new(), log)?;
        state.read(self.catalog, parent).map(Some)
    }

    /// Write `clamp(sum(children))` to the group's parent and cascade from it.
    pub(crate) fn aggregate(
        &self,
        state: &mut PlayerResourceState,
        group_id: &GroupId,
        cascade: &mut Cascade,
        log: &mut dyn GainLog,
    ) -> ResourceResult<()> {
        let Some(parent_id) = self
            .catalog
            .group(group_id)
            .and_then(|group| group.parent_id.as_ref())
        else {
            return Ok(());
        };
        let parent = self.definition(parent_id)?;

        let sum = self
            .catalog
            .children_of(group_id)
            .iter()
            .filter_map(|child| state.value(child))
            .fold(0i64, i64::saturating_add);
        let bounds = state.refresh_bounds(parent);
        let value = bounds.clamp(sum);

        let mut options = cascade.write_options(WriteOrigin::Aggregation).clamped(
            bounds.exceeds(BoundSide::Lower, sum),
            bounds.exceeds(BoundSide::Upper, sum),
        );
        options.suppress_log = cascade.suppress_log || !self.config.log_aggregate_changes;
        let delta = state.write(self.catalog, parent_id, value, options, log)?;

        tracing::debug!(
            group = %group_id,
            parent = %parent_id,
            sum,
            value,
            "group_reaggregated"
        );

        if delta != 0 && cascade.enter(parent_id) {
            let outcome = self.propagate(state, parent_id, cascade, log);
            cascade.exit(parent_id);
            outcome?;
        }
        Ok(())
    }
}
