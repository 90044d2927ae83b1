//! Resource Engine - applies changes to a player's resources.
//!
//! Every mutating operation follows the same path:
//! 1. **Resolve**: resolve the resource's bounds against live values
//! 2. **Reconcile**: turn the requested delta into an applied delta (clamp/pass/reject)
//! 3. **Commit**: write the store, flags, tier and gain log
//! 4. **Aggregate**: re-sum the resource's group parent
//! 5. **Cascade**: re-validate every resource whose bound follows the changed value

mod aggregate;
mod bounds;
mod cascade;
mod config;
mod request;

pub use config::*;
pub use request::*;

use resource_rules::{
    as_integer, reconcile_delta, Catalog, ReconciliationMode, ReconciliationResult,
    ResourceChange, ResourceDefinition, ResourceError, ResourceId, ResourceResult,
};

use crate::state::{GainLog, PercentPlan, PlayerResourceState, WriteOptions, WriteOrigin};
use cascade::Cascade;

/// Applies changes against one catalog. Stateless apart from configuration;
/// the player state is passed into every call.
pub struct ResourceEngine<'c> {
    catalog: &'c Catalog,
    config: EngineConfig,
}

impl<'c> ResourceEngine<'c> {
    /// Create a new engine with the given configuration.
    pub fn new(catalog: &'c Catalog, config: EngineConfig) -> Self {
        Self { catalog, config }
    }

    /// Create an engine with default configuration.
    pub fn with_defaults(catalog: &'c Catalog) -> Self {
        Self::new(catalog, EngineConfig::default())
    }

    pub fn catalog(&self) -> &'c Catalog {
        self.catalog
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Reset a player's resources to their catalog defaults.
    pub fn initialise(&self, state: &mut PlayerResourceState) {
        state.initialise(self.catalog);
    }

    pub fn read(&self, state: &PlayerResourceState, id: &ResourceId) -> ResourceResult<i64> {
        state.read(self.catalog, id)
    }

    fn definition(&self, id: &ResourceId) -> ResourceResult<&'c ResourceDefinition> {
        self.catalog
            .resource(id)
            .ok_or_else(|| ResourceError::UnknownResource(id.clone()))
    }

    /// Definition of a resource callers may write directly.
    fn writable_definition(&self, id: &ResourceId) -> ResourceResult<&'c ResourceDefinition> {
        let definition = self.definition(id)?;
        if definition.is_group_parent() {
            return Err(ResourceError::ParentIsDerived(id.clone()));
        }
        Ok(definition)
    }

    /// Apply a requested change.
    ///
    /// On `reject` failure nothing is written and the percent ledger is left
    /// untouched. Failures raised later by the cascade leave the write and any
    /// earlier cascaded writes committed.
    pub fn apply_change(
        &self,
        state: &mut PlayerResourceState,
        request: &ChangeRequest,
        log: &mut dyn GainLog,
    ) -> ResourceResult<ReconciliationResult> {
        let id = &request.resource_id;
        let definition = self.writable_definition(id)?;
        let current = state.read(self.catalog, id)?;
        let bounds = state.resolve_bounds(definition);

        let (requested_delta, plan) = self.plan_delta(state, request, current)?;
        let result = reconcile_delta(current, requested_delta, bounds, request.reconciliation)
            .map_err(|error| error.for_resource(id))?;

        if let Some(plan) = plan {
            state.percent_ledger_mut().commit(plan);
        }

        let options = request_options(request, &result);
        let mut cascade = Cascade::inheriting(&options);
        cascade.enter(id);
        self.commit(state, id, result.final_value, options, &mut cascade, log)?;
        Ok(result)
    }

    /// Move value from one resource to another.
    ///
    /// The change is computed on the donor (an amount, or a percent of the
    /// donor's value). The recipient gains exactly what the donor loses, both
    /// clamped; only `clamp` reconciliation is supported.
    pub fn transfer(
        &self,
        state: &mut PlayerResourceState,
        request: &ChangeRequest,
        recipient: &ResourceId,
        log: &mut dyn GainLog,
    ) -> ResourceResult<TransferResult> {
        if request.reconciliation != ReconciliationMode::Clamp {
            return Err(ResourceError::UnsupportedReconciliationMode {
                operation: "transfer",
                mode: request.reconciliation,
            });
        }
        let donor_id = &request.resource_id;
        let donor = self.writable_definition(donor_id)?;
        let receiver = self.writable_definition(recipient)?;
        let donor_current = state.read(self.catalog, donor_id)?;
        let recipient_current = state.read(self.catalog, recipient)?;

        let (requested, plan) = self.plan_delta(state, request, donor_current)?;
        let donor_bounds = state.resolve_bounds(donor);
        let available = reconcile_delta(
            donor_current,
            requested.saturating_neg(),
            donor_bounds,
            ReconciliationMode::Clamp,
        )?;
        let accepted = reconcile_delta(
            recipient_current,
            available.applied_delta.saturating_neg(),
            state.resolve_bounds(receiver),
            ReconciliationMode::Clamp,
        )?;
        let moved = accepted.applied_delta;
        // The donor only counts as clamped when its own bound limited the move.
        let donor_limited = moved == available.applied_delta.saturating_neg();
        let donor_result = ReconciliationResult {
            requested_delta: requested.saturating_neg(),
            applied_delta: moved.saturating_neg(),
            final_value: donor_current.saturating_sub(moved),
            clamped_to_lower_bound: donor_limited && available.clamped_to_lower_bound,
            clamped_to_upper_bound: donor_limited && available.clamped_to_upper_bound,
        };

        if let Some(plan) = plan {
            state.percent_ledger_mut().commit(plan);
        }

        let options = request_options(request, &donor_result);
        let mut cascade = Cascade::inheriting(&options);
        cascade.enter(donor_id);
        let donor_value = donor_result.final_value;
        self.commit(state, donor_id, donor_value, options, &mut cascade, log)?;

        // The donor's cascade may have moved the recipient's bounds.
        let recipient_now = state.read(self.catalog, recipient)?;
        let recipient_result = reconcile_delta(
            recipient_now,
            moved,
            state.resolve_bounds(receiver),
            ReconciliationMode::Clamp,
        )?;
        let options = request_options(request, &recipient_result);
        let mut cascade = Cascade::inheriting(&options);
        cascade.enter(recipient);
        let recipient_value = recipient_result.final_value;
        self.commit(state, recipient, recipient_value, options, &mut cascade, log)?;

        tracing::debug!(
            donor = %donor_id,
            recipient = %recipient,
            requested,
            moved,
            "resources_transferred"
        );
        Ok(TransferResult {
            donor: donor_result,
            recipient: recipient_result,
        })
    }

    /// Compute the requested delta, and the percent ledger entry to commit if any.
    fn plan_delta(
        &self,
        state: &PlayerResourceState,
        request: &ChangeRequest,
        current: i64,
    ) -> ResourceResult<(i64, Option<PercentPlan>)> {
        match &request.change {
            ResourceChange::Amount(amount) => {
                let field = || format!("`{}` amount", request.resource_id);
                let overflow = || ResourceError::IntegerOverflow { field: field() };
                let factor = request.multiplier;
                let delta = if factor.fract() == 0.0 {
                    let factor = as_integer(factor).ok_or_else(overflow)?;
                    amount.checked_mul(factor).ok_or_else(overflow)?
                } else {
                    let scaled = *amount as f64 * factor;
                    as_integer(scaled).ok_or_else(|| ResourceError::NonIntegerValue {
                        field: field(),
                        value: scaled,
                    })?
                };
                Ok((delta, None))
            }
            ResourceChange::Percent {
                modifiers,
                rounding,
            } => {
                let rounding = rounding.unwrap_or(self.config.default_rounding);
                let modifier = modifiers.iter().sum::<f64>() * request.multiplier;
                match &request.percent_scope {
                    Some(scope) => {
                        let plan = state.percent_ledger().plan(
                            scope,
                            &request.resource_id,
                            current,
                            modifier,
                            rounding,
                        );
                        Ok((plan.delta, Some(plan)))
                    }
                    None => Ok((rounding.apply(current as f64 * modifier), None)),
                }
            }
        }
    }

    /// Write a value, then aggregate its group parent and cascade to dependents.
    pub(crate) fn commit(
        &self,
        state: &mut PlayerResourceState,
        id: &ResourceId,
        value: i64,
        options: WriteOptions,
        cascade: &mut Cascade,
        log: &mut dyn GainLog,
    ) -> ResourceResult<()> {
        let delta = state.write(self.catalog, id, value, options, log)?;
        if delta == 0 {
            return Ok(());
        }
        let definition = self.definition(id)?;
        if let Some(group) = &definition.group_id {
            self.aggregate(state, group, cascade, log)?;
        }
        self.propagate(state, id, cascade, log)
    }
}

fn request_options(request: &ChangeRequest, result: &ReconciliationResult) -> WriteOptions {
    let mut options = WriteOptions::new(WriteOrigin::Request)
        .clamped(result.clamped_to_lower_bound, result.clamped_to_upper_bound);
    options.suppress_touched = request.suppress_touched;
    options.suppress_log = request.suppress_log;
    options.mark_bounds = request.reconciliation != ReconciliationMode::Pass;
    options
}
