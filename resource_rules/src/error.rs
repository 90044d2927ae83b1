//! Error taxonomy for catalog construction and resource operations.

use thiserror::Error;

use crate::definitions::{GroupId, ResourceId};
use crate::mechanics::{BoundSide, ReconciliationMode};

/// Errors raised by resource reads, writes and reconciliation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResourceError {
    #[error("unknown resource `{0}`")]
    UnknownResource(ResourceId),

    #[error("unknown resource group `{0}`")]
    UnknownGroup(GroupId),

    #[error("resource `{0}` is a group parent; its value is derived from its children")]
    ParentIsDerived(ResourceId),

    #[error(
        "{bound_type} bound of {} exceeded: target {target_value}, bound {bound_value}, requested delta {requested_delta}",
        describe_resource(.resource_id)
    )]
    ResourceBoundExceeded {
        /// Filled in once the failing resource is known.
        resource_id: Option<ResourceId>,
        bound_type: BoundSide,
        target_value: i64,
        bound_value: i64,
        requested_delta: i64,
    },

    #[error("{field} must be an integer, got {value}")]
    NonIntegerValue { field: String, value: f64 },

    #[error("{field} is outside the integer range")]
    IntegerOverflow { field: String },

    #[error("{operation} does not support `{mode}` reconciliation")]
    UnsupportedReconciliationMode {
        operation: &'static str,
        mode: ReconciliationMode,
    },
}

fn describe_resource(id: &Option<ResourceId>) -> String {
    id.as_ref()
        .map_or_else(|| "resource".to_owned(), |id| format!("`{id}`"))
}

impl ResourceError {
    /// Attach the failing resource to a bound error raised by a pure check.
    pub fn for_resource(self, id: &ResourceId) -> Self {
        match self {
            ResourceError::ResourceBoundExceeded {
                resource_id: None,
                bound_type,
                target_value,
                bound_value,
                requested_delta,
            } => ResourceError::ResourceBoundExceeded {
                resource_id: Some(id.clone()),
                bound_type,
                target_value,
                bound_value,
                requested_delta,
            },
            other => other,
        }
    }
}

pub type ResourceResult<T> = Result<T, ResourceError>;

/// Errors raised while building a catalog from content.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("duplicate id `{0}` (resource and group ids share one namespace)")]
    DuplicateId(String),

    #[error("resource `{resource}` references undeclared group `{group}`")]
    UnknownGroup { resource: ResourceId, group: GroupId },

    #[error("global cost declared by both `{first}` and `{second}`")]
    DuplicateGlobalCost { first: ResourceId, second: ResourceId },

    #[error("{field} must be an integer, got {value}")]
    NonIntegerValue { field: String, value: f64 },

    #[error("failed to parse TOML content: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("failed to parse JSON content: {0}")]
    Json(#[from] serde_json::Error),
}
