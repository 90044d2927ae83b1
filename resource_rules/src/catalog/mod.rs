//! The resource catalog - validated, immutable schema built once from content.

mod content;

pub use content::*;

use content::integer;

use serde::Serialize;
use std::collections::{HashMap, HashSet};

use crate::definitions::{GroupDefinition, GroupId, ResourceDefinition, ResourceId};
use crate::error::CatalogError;
use crate::mechanics::{BoundSide, BoundSpec, ReconciliationMode};

/// A resource whose bound follows another resource's value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundDependent {
    pub resource_id: ResourceId,
    pub side: BoundSide,
    pub reconciliation: ReconciliationMode,
}

/// The catalog of all resources and groups.
///
/// Provides O(1) lookups by id, by group, and by bound-reference target.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    /// All resources (group parents included) in resolved order.
    resources: Vec<ResourceDefinition>,
    resource_index: HashMap<ResourceId, usize>,

    /// Groups in resolved order.
    groups: Vec<GroupDefinition>,
    group_index: HashMap<GroupId, usize>,

    /// Index: bound-reference target -> resources whose bound follows it.
    dependents: HashMap<ResourceId, Vec<BoundDependent>>,

    global_cost: Option<ResourceId>,
}

/// Validate content and build the catalog.
pub fn build_catalog(
    resources: Vec<ResourceContent>,
    groups: Vec<GroupContent>,
) -> Result<Catalog, CatalogError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut claim = |id: &str| {
        if seen.insert(id.to_owned()) {
            Ok(())
        } else {
            Err(CatalogError::DuplicateId(id.to_owned()))
        }
    };

    let mut definitions = Vec::with_capacity(resources.len() + groups.len());
    for content in resources {
        claim(&content.id)?;
        definitions.push(content.into_definition()?);
    }

    let mut group_definitions = Vec::with_capacity(groups.len());
    for content in groups {
        claim(&content.id)?;
        let id = GroupId::from(content.id.as_str());
        let parent = match content.parent {
            Some(parent) => {
                claim(&parent.id)?;
                let definition = parent.into_definition(&id)?;
                let parent_id = definition.id.clone();
                definitions.push(definition);
                Some(parent_id)
            }
            None => None,
        };
        group_definitions.push(GroupDefinition {
            label: content.label.unwrap_or_else(|| content.id.clone()),
            order: content
                .order
                .map(|order| integer(|| format!("group `{}` order", content.id), order))
                .transpose()?,
            id,
            icon: content.icon,
            resolved_order: 0,
            parent_id: parent,
            child_ids: Vec::new(),
        });
    }

    let resources = resolve_order(definitions, |definition| definition.order)
        .into_iter()
        .map(|(resolved, mut definition)| {
            definition.resolved_order = resolved;
            definition
        })
        .collect::<Vec<_>>();
    let groups = resolve_order(group_definitions, |group| group.order)
        .into_iter()
        .map(|(resolved, mut group)| {
            group.resolved_order = resolved;
            group
        })
        .collect::<Vec<_>>();

    Catalog::index(resources, groups)
}

/// Sort by `(order, insertion index)`; a missing order sorts as its index.
fn resolve_order<T>(items: Vec<T>, order: impl Fn(&T) -> Option<i64>) -> Vec<(usize, T)> {
    let mut indexed: Vec<(usize, T)> = items.into_iter().enumerate().collect();
    indexed.sort_by_key(|(index, item)| (order(item).unwrap_or(*index as i64), *index));
    indexed
        .into_iter()
        .enumerate()
        .map(|(resolved, (_, item))| (resolved, item))
        .collect()
}

impl Catalog {
    /// Parse TOML content and build the catalog.
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        Self::from_content(CatalogContent::from_toml_str(content)?)
    }

    /// Parse JSON content and build the catalog.
    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        Self::from_content(CatalogContent::from_json_str(content)?)
    }

    pub fn from_content(content: CatalogContent) -> Result<Self, CatalogError> {
        build_catalog(content.resources, content.groups)
    }

    fn index(
        resources: Vec<ResourceDefinition>,
        mut groups: Vec<GroupDefinition>,
    ) -> Result<Self, CatalogError> {
        let resource_index: HashMap<ResourceId, usize> = resources
            .iter()
            .enumerate()
            .map(|(index, definition)| (definition.id.clone(), index))
            .collect();
        let group_index: HashMap<GroupId, usize> = groups
            .iter()
            .enumerate()
            .map(|(index, group)| (group.id.clone(), index))
            .collect();

        let mut global_cost: Option<ResourceId> = None;
        let mut dependents: HashMap<ResourceId, Vec<BoundDependent>> = HashMap::new();

        for definition in &resources {
            if let Some(group_id) = &definition.group_id {
                let group = group_index
                    .get(group_id)
                    .ok_or_else(|| CatalogError::UnknownGroup {
                        resource: definition.id.clone(),
                        group: group_id.clone(),
                    })?;
                groups[*group].child_ids.push(definition.id.clone());
            }

            if definition.global_cost.is_some() {
                if let Some(first) = &global_cost {
                    return Err(CatalogError::DuplicateGlobalCost {
                        first: first.clone(),
                        second: definition.id.clone(),
                    });
                }
                global_cost = Some(definition.id.clone());
            }

            for side in [BoundSide::Lower, BoundSide::Upper] {
                if let Some(BoundSpec::Reference(reference)) = definition.bound(side) {
                    if !resource_index.contains_key(&reference.resource_id) {
                        tracing::warn!(
                            resource = %definition.id,
                            bound = %side,
                            target = %reference.resource_id,
                            "bound_references_undeclared_resource"
                        );
                    }
                    dependents
                        .entry(reference.resource_id.clone())
                        .or_default()
                        .push(BoundDependent {
                            resource_id: definition.id.clone(),
                            side,
                            reconciliation: reference.reconciliation,
                        });
                }
            }
        }

        tracing::debug!(
            resources = resources.len(),
            groups = groups.len(),
            bound_targets = dependents.len(),
            "catalog_built"
        );

        Ok(Self {
            resources,
            resource_index,
            groups,
            group_index,
            dependents,
            global_cost,
        })
    }

    /// Get a resource (or group parent) definition by id.
    pub fn resource(&self, id: &ResourceId) -> Option<&ResourceDefinition> {
        self.resource_index.get(id).map(|index| &self.resources[*index])
    }

    pub fn contains(&self, id: &ResourceId) -> bool {
        self.resource_index.contains_key(id)
    }

    /// All resources, group parents included, in resolved order.
    pub fn resources(&self) -> &[ResourceDefinition] {
        &self.resources
    }

    pub fn group(&self, id: &GroupId) -> Option<&GroupDefinition> {
        self.group_index.get(id).map(|index| &self.groups[*index])
    }

    /// All groups in resolved order.
    pub fn groups(&self) -> &[GroupDefinition] {
        &self.groups
    }

    /// Children of a group in resolved order.
    pub fn children_of(&self, group: &GroupId) -> &[ResourceId] {
        self.group(group)
            .map(|group| group.child_ids.as_slice())
            .unwrap_or(&[])
    }

    /// Resources whose declared bound references `id`.
    pub fn dependents_of(&self, id: &ResourceId) -> &[BoundDependent] {
        self.dependents.get(id).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// The group a parent resource aggregates.
    pub fn parent_group_of(&self, id: &ResourceId) -> Option<&GroupId> {
        self.resource(id)?.parent_of.as_ref()
    }

    pub fn is_group_parent(&self, id: &ResourceId) -> bool {
        self.parent_group_of(id).is_some()
    }

    /// The resource marked as the global action cost, if any.
    pub fn global_cost_resource(&self) -> Option<&ResourceDefinition> {
        self.global_cost.as_ref().and_then(|id| self.resource(id))
    }
}
