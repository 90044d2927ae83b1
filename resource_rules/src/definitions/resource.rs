//! Resource and group definitions.

use serde::{Deserialize, Serialize};

use super::{GroupId, ResourceId, TierTrack};
use crate::mechanics::{BoundSide, BoundSpec};

/// Marks the resource that prices every action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalCost {
    pub amount: i64,
}

/// A validated, immutable resource definition.
///
/// Group parents share this shape; they are recognised by `parent_of`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    pub id: ResourceId,
    pub label: String,
    pub icon: Option<String>,
    pub description: Option<String>,

    /// Declared display order, if any.
    pub order: Option<i64>,
    /// Position after sorting by `(order, insertion index)`.
    pub resolved_order: usize,

    /// `None` = unbounded below.
    pub lower_bound: Option<BoundSpec>,
    /// `None` = unbounded above.
    pub upper_bound: Option<BoundSpec>,
    pub initial_value: Option<i64>,

    /// Group this resource is a child of.
    pub group_id: Option<GroupId>,
    /// Group whose aggregate this resource is.
    pub parent_of: Option<GroupId>,

    pub tier_track: Option<TierTrack>,
    pub global_cost: Option<GlobalCost>,
}

impl ResourceDefinition {
    /// Create a bare, unbounded definition.
    pub fn new(id: impl Into<ResourceId>) -> Self {
        let id = id.into();
        Self {
            label: id.to_string(),
            id,
            icon: None,
            description: None,
            order: None,
            resolved_order: 0,
            lower_bound: None,
            upper_bound: None,
            initial_value: None,
            group_id: None,
            parent_of: None,
            tier_track: None,
            global_cost: None,
        }
    }

    /// Get the bound spec declared for one side.
    pub fn bound(&self, side: BoundSide) -> Option<&BoundSpec> {
        match side {
            BoundSide::Lower => self.lower_bound.as_ref(),
            BoundSide::Upper => self.upper_bound.as_ref(),
        }
    }

    /// Check if this resource is a derived group aggregate.
    pub fn is_group_parent(&self) -> bool {
        self.parent_of.is_some()
    }
}

/// A group of sibling resources with an optional derived parent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDefinition {
    pub id: GroupId,
    pub label: String,
    pub icon: Option<String>,
    pub order: Option<i64>,
    pub resolved_order: usize,
    pub parent_id: Option<ResourceId>,
    /// Children in resolved order.
    pub child_ids: Vec<ResourceId>,
}
