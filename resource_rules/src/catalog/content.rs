//! Raw content definitions as read from TOML or JSON.
//!
//! Numeric fields are read as floats so fractional content surfaces as
//! [`CatalogError::NonIntegerValue`] during validation.

use serde::Deserialize;

use crate::definitions::{
    GlobalCost, GroupId, ResourceDefinition, ResourceId, TierDefinition, TierId, TierThreshold,
    TierTrack,
};
use crate::error::CatalogError;
use crate::mechanics::{as_integer, BoundReference, BoundSpec, ReconciliationMode};

/// A bound as written in content: `100` or `{ resource = "max_population" }`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum BoundContent {
    Literal(f64),
    Reference {
        resource: String,
        #[serde(default)]
        reconciliation: ReconciliationMode,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ThresholdContent {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TierContent {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub threshold: ThresholdContent,
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default)]
    pub enter_effects: Vec<serde_json::Value>,
    #[serde(default)]
    pub exit_effects: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GlobalCostContent {
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ResourceContent {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default)]
    pub lower_bound: Option<BoundContent>,
    #[serde(default)]
    pub upper_bound: Option<BoundContent>,
    #[serde(default)]
    pub initial_value: Option<f64>,
    #[serde(default)]
    pub group: Option<String>,
    #[serde(default)]
    pub tiers: Vec<TierContent>,
    #[serde(default)]
    pub global_cost: Option<GlobalCostContent>,
}

impl ResourceContent {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            icon: None,
            description: None,
            order: None,
            lower_bound: None,
            upper_bound: None,
            initial_value: None,
            group: None,
            tiers: Vec::new(),
            global_cost: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupParentContent {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub lower_bound: Option<BoundContent>,
    #[serde(default)]
    pub upper_bound: Option<BoundContent>,
    #[serde(default)]
    pub tiers: Vec<TierContent>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GroupContent {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub order: Option<f64>,
    #[serde(default)]
    pub parent: Option<GroupParentContent>,
}

/// A full content file: `[[resources]]` and `[[groups]]` tables.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct CatalogContent {
    #[serde(default)]
    pub resources: Vec<ResourceContent>,
    #[serde(default)]
    pub groups: Vec<GroupContent>,
}

impl CatalogContent {
    pub fn from_toml_str(content: &str) -> Result<Self, CatalogError> {
        Ok(toml::from_str(content)?)
    }

    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(content)?)
    }
}

pub(crate) fn integer(field: impl FnOnce() -> String, value: f64) -> Result<i64, CatalogError> {
    as_integer(value).ok_or_else(|| CatalogError::NonIntegerValue {
        field: field(),
        value,
    })
}

fn optional_integer(
    field: impl FnOnce() -> String,
    value: Option<f64>,
) -> Result<Option<i64>, CatalogError> {
    value.map(|value| integer(field, value)).transpose()
}

fn bound_spec(
    owner: &str,
    side: &str,
    bound: Option<&BoundContent>,
) -> Result<Option<BoundSpec>, CatalogError> {
    let Some(bound) = bound else {
        return Ok(None);
    };
    let spec = match bound {
        BoundContent::Literal(value) => {
            BoundSpec::Literal(integer(|| format!("`{owner}` {side}_bound"), *value)?)
        }
        BoundContent::Reference {
            resource,
            reconciliation,
        } => BoundSpec::Reference(BoundReference {
            resource_id: ResourceId::from(resource.as_str()),
            reconciliation: *reconciliation,
        }),
    };
    Ok(Some(spec))
}

fn tier_track(owner: &str, tiers: &[TierContent]) -> Result<Option<TierTrack>, CatalogError> {
    if tiers.is_empty() {
        return Ok(None);
    }
    let definitions = tiers
        .iter()
        .map(|tier| -> Result<TierDefinition, CatalogError> {
            let field = |name: &str| format!("`{owner}` tier `{}` {name}", tier.id);
            Ok(TierDefinition {
                id: TierId::from(tier.id.as_str()),
                label: tier.label.clone().unwrap_or_else(|| tier.id.clone()),
                threshold: TierThreshold::new(
                    optional_integer(|| field("min"), tier.threshold.min)?,
                    optional_integer(|| field("max"), tier.threshold.max)?,
                ),
                order: optional_integer(|| field("order"), tier.order)?,
                resolved_order: 0,
                enter_effects: tier.enter_effects.clone(),
                exit_effects: tier.exit_effects.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(Some(TierTrack::new(definitions)))
}

impl ResourceContent {
    /// Validate into a definition. `resolved_order` is assigned by the catalog.
    pub fn into_definition(self) -> Result<ResourceDefinition, CatalogError> {
        let id = self.id.as_str();
        Ok(ResourceDefinition {
            id: ResourceId::from(id),
            label: self.label.clone().unwrap_or_else(|| self.id.clone()),
            icon: self.icon.clone(),
            description: self.description.clone(),
            order: optional_integer(|| format!("`{id}` order"), self.order)?,
            resolved_order: 0,
            lower_bound: bound_spec(id, "lower", self.lower_bound.as_ref())?,
            upper_bound: bound_spec(id, "upper", self.upper_bound.as_ref())?,
            initial_value: optional_integer(
                || format!("`{id}` initial_value"),
                self.initial_value,
            )?,
            group_id: self.group.as_deref().map(GroupId::from),
            parent_of: None,
            tier_track: tier_track(id, &self.tiers)?,
            global_cost: self
                .global_cost
                .as_ref()
                .map(|cost| {
                    integer(|| format!("`{id}` global_cost"), cost.amount)
                        .map(|amount| GlobalCost { amount })
                })
                .transpose()?,
        })
    }
}

impl GroupParentContent {
    pub fn into_definition(self, group: &GroupId) -> Result<ResourceDefinition, CatalogError> {
        let id = self.id.as_str();
        Ok(ResourceDefinition {
            id: ResourceId::from(id),
            label: self.label.clone().unwrap_or_else(|| self.id.clone()),
            icon: self.icon.clone(),
            description: self.description.clone(),
            order: None,
            resolved_order: 0,
            lower_bound: bound_spec(id, "lower", self.lower_bound.as_ref())?,
            upper_bound: bound_spec(id, "upper", self.upper_bound.as_ref())?,
            initial_value: None,
            group_id: None,
            parent_of: Some(group.clone()),
            tier_track: tier_track(id, &self.tiers)?,
            global_cost: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_bounds() {
        let content = CatalogContent::from_toml_str(
            r#"
            [[resources]]
            id = "population"
            lower_bound = 0
            upper_bound = { resource = "max_population", reconciliation = "reject" }
            "#,
        )
        .unwrap();

        let resource = &content.resources[0];
        assert_eq!(resource.lower_bound, Some(BoundContent::Literal(0.0)));
        assert_eq!(
            resource.upper_bound,
            Some(BoundContent::Reference {
                resource: "max_population".to_owned(),
                reconciliation: ReconciliationMode::Reject,
            })
        );
    }

    #[test]
    fn test_reference_defaults_to_clamp() {
        let content = CatalogContent::from_json_str(
            r#"{ "resources": [ { "id": "a", "upper_bound": { "resource": "b" } } ] }"#,
        )
        .unwrap();

        let definition = content.resources[0].clone().into_definition().unwrap();
        assert_eq!(definition.upper_bound, Some(BoundSpec::reference("b")));
        assert_eq!(definition.label, "a");
    }

    #[test]
    fn test_fractional_bound_is_rejected() {
        let mut content = ResourceContent::new("gold");
        content.upper_bound = Some(BoundContent::Literal(10.5));

        let error = content.into_definition().unwrap_err();
        let CatalogError::NonIntegerValue { field, value } = &error else {
            panic!("expected NonIntegerValue, got {error:?}");
        };
        assert_eq!(field, "`gold` upper_bound");
        assert_eq!(*value, 10.5);
    }

    #[test]
    fn test_tiers_are_converted() {
        let content = CatalogContent::from_toml_str(
            r#"
            [[resources]]
            id = "happiness"

            [[resources.tiers]]
            id = "unrest"
            threshold = { max = -1 }
            enter_effects = [{ kind = "passive", id = "riots" }]

            [[resources.tiers]]
            id = "calm"
            threshold = { min = 0 }
            "#,
        )
        .unwrap();

        let definition = content.resources[0].clone().into_definition().unwrap();
        let track = definition.tier_track.unwrap();
        assert_eq!(track.tiers().len(), 2);
        assert_eq!(track.tiers()[0].enter_effects.len(), 1);
        assert_eq!(track.resolve(-3).map(|t| t.id.as_str()), Some("unrest"));
    }

    #[test]
    fn test_invalid_toml_is_reported() {
        let error = CatalogContent::from_toml_str("[[resources]\nid =").unwrap_err();
        assert!(matches!(error, CatalogError::Toml(_)));
    }
}
