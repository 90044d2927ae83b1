//! Events emitted by the resource engine for outside systems.

use resource_rules::{Catalog, ResourceId, TierDefinition, TierId};
use serde::{Deserialize, Serialize};

/// A resource moved from one tier to another.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierTransition {
    pub resource_id: ResourceId,
    pub previous: Option<TierId>,
    pub next: Option<TierId>,
}

impl TierTransition {
    /// Tier being left, looked up in the catalog.
    pub fn exited<'c>(&self, catalog: &'c Catalog) -> Option<&'c TierDefinition> {
        self.lookup(catalog, self.previous.as_ref())
    }

    /// Tier being entered, looked up in the catalog.
    pub fn entered<'c>(&self, catalog: &'c Catalog) -> Option<&'c TierDefinition> {
        self.lookup(catalog, self.next.as_ref())
    }

    /// Opaque effect payloads the passive system should run: exits, then entries.
    pub fn effects<'c>(&self, catalog: &'c Catalog) -> TierEffects<'c> {
        TierEffects {
            exit: self
                .exited(catalog)
                .map(|tier| tier.exit_effects.as_slice())
                .unwrap_or(&[]),
            enter: self
                .entered(catalog)
                .map(|tier| tier.enter_effects.as_slice())
                .unwrap_or(&[]),
        }
    }

    fn lookup<'c>(
        &self,
        catalog: &'c Catalog,
        tier: Option<&TierId>,
    ) -> Option<&'c TierDefinition> {
        catalog
            .resource(&self.resource_id)?
            .tier_track
            .as_ref()?
            .tier(tier?)
    }
}

/// Effect payloads attached to a tier transition.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TierEffects<'c> {
    pub exit: &'c [serde_json::Value],
    pub enter: &'c [serde_json::Value],
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"
        [[resources]]
        id = "happiness"

        [[resources.tiers]]
        id = "unrest"
        threshold = { max = -1 }
        enter_effects = ["riots"]
        exit_effects = ["calm_streets"]

        [[resources.tiers]]
        id = "calm"
        threshold = { min = 0 }
        enter_effects = ["festival"]
    "#;

    #[test]
    fn test_transition_effects() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let transition = TierTransition {
            resource_id: ResourceId::from("happiness"),
            previous: Some(TierId::from("unrest")),
            next: Some(TierId::from("calm")),
        };

        let effects = transition.effects(&catalog);
        assert_eq!(effects.exit, &[serde_json::json!("calm_streets")]);
        assert_eq!(effects.enter, &[serde_json::json!("festival")]);
    }

    #[test]
    fn test_transition_into_no_tier() {
        let catalog = Catalog::from_toml_str(CATALOG).unwrap();
        let transition = TierTransition {
            resource_id: ResourceId::from("happiness"),
            previous: None,
            next: Some(TierId::from("unrest")),
        };

        let effects = transition.effects(&catalog);
        assert!(effects.exit.is_empty());
        assert_eq!(effects.enter.len(), 1);
        assert!(transition.exited(&catalog).is_none());
    }
}
