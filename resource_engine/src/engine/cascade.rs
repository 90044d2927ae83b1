//! Cascading bound reconciliation.
//!
//! When a resource's value changes, every resource whose bound follows it is
//! re-resolved and, if now out of bounds, handled per the reconciliation
//! declared on that bound reference. Clamps are written through the normal
//! write path and cascade further.
//!
//! Cycles (A bounds B bounds A) are cut by a re-entry guard holding every
//! resource currently being reconciled on the call stack. This is a single
//! best-effort pass, not a fixed-point solver: in a cycle, the value is
//! whatever the first pass computed.
//!
//! Cascades are eager. A `reject` deep in the chain aborts the rest of the
//! pass, but writes already made to other dependents stay committed.

use resource_rules::{BoundSide, ReconciliationMode, ResourceError, ResourceId, ResourceResult};
use std::collections::HashSet;

use super::ResourceEngine;
use crate::state::{GainLog, PlayerResourceState, WriteOptions, WriteOrigin};

/// Per-call cascade context: the re-entry guard plus flags inherited by
/// every write made on behalf of the outer operation.
#[derive(Debug, Clone, Default)]
pub(crate) struct Cascade {
    reconciling: HashSet<ResourceId>,
    pub(crate) suppress_touched: bool,
    pub(crate) suppress_log: bool,
    /// Cleared for pass-mode writes so downstream clamps do not set bound flags.
    pub(crate) mark_bounds: bool,
}

impl Cascade {
    pub(crate) fn new() -> Self {
        Self {
            mark_bounds: true,
            ..Self::default()
        }
    }

    pub(crate) fn inheriting(options: &WriteOptions) -> Self {
        Self {
            reconciling: HashSet::new(),
            suppress_touched: options.suppress_touched,
            suppress_log: options.suppress_log,
            mark_bounds: options.mark_bounds,
        }
    }

    /// Mark a resource as being reconciled. Returns `false` if it already was.
    pub(crate) fn enter(&mut self, id: &ResourceId) -> bool {
        self.reconciling.insert(id.clone())
    }

    pub(crate) fn exit(&mut self, id: &ResourceId) {
        self.reconciling.remove(id);
    }

    pub(crate) fn is_reconciling(&self, id: &ResourceId) -> bool {
        self.reconciling.contains(id)
    }

    pub(crate) fn write_options(&self, origin: WriteOrigin) -> WriteOptions {
        let mut options = WriteOptions::new(origin);
        options.suppress_touched = self.suppress_touched;
        options.suppress_log = self.suppress_log;
        options.mark_bounds = self.mark_bounds;
        options
    }
}

impl<'c> ResourceEngine<'c> {
    /// Re-validate every resource whose bound follows `source`.
    pub(crate) fn propagate(
        &self,
        state: &mut PlayerResourceState,
        source: &ResourceId,
        cascade: &mut Cascade,
        log: &mut dyn GainLog,
    ) -> ResourceResult<()> {
        for dependent in state.dependents_of(self.catalog, source) {
            let id = &dependent.resource_id;
            let Some(definition) = self.catalog.resource(id) else {
                continue;
            };

            // Parents are always derived: re-aggregate instead of clamping.
            if let Some(group) = &definition.parent_of {
                self.aggregate(state, group, cascade, log)?;
                continue;
            }

            // The snapshot follows the source even when the value is left alone.
            let bounds = state.refresh_bounds(definition);
            if dependent.reconciliation == ReconciliationMode::Pass {
                continue;
            }
            if cascade.is_reconciling(id) {
                tracing::trace!(source = %source, resource = %id, "cascade_reentry_skipped");
                continue;
            }
            let Some(value) = state.value(id) else {
                continue;
            };
            let side = dependent.side;
            let Some(bound_value) = bounds.get(side).filter(|_| bounds.exceeds(side, value)) else {
                continue;
            };

            match dependent.reconciliation {
                ReconciliationMode::Pass => {}
                ReconciliationMode::Reject => {
                    tracing::debug!(
                        source = %source,
                        resource = %id,
                        bound = %side,
                        value,
                        bound_value,
                        "cascade_rejected"
                    );
                    return Err(ResourceError::ResourceBoundExceeded {
                        resource_id: Some(id.clone()),
                        bound_type: side,
                        target_value: value,
                        bound_value,
                        requested_delta: 0,
                    });
                }
                ReconciliationMode::Clamp => {
                    let target = bounds.clamp(value);
                    tracing::debug!(
                        source = %source,
                        resource = %id,
                        bound = %side,
                        value,
                        target,
                        "cascade_clamp"
                    );
                    let options = cascade
                        .write_options(WriteOrigin::Cascade)
                        .clamped(side == BoundSide::Lower, side == BoundSide::Upper);

                    cascade.enter(id);
                    let outcome = self.commit(state, id, target, options, cascade, log);
                    cascade.exit(id);
                    outcome?;
                }
            }
        }
        Ok(())
    }
}
