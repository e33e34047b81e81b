//! Lore growth: factions codify law, heroes unearth relics. These populate
//! the rules and abilities kinds.

use std::collections::BTreeSet;

use contracts::{
    AbilitySchool, EntityClass, EntityKind, GrowthBatch, LinkEnd, LinkSpec, LoreStatus,
    NewEntity, NpcRole, Prominence, RelationKind, RulesScope, TemplateId, TuningConfig,
};

use super::{living_with_role, names, GrowthTemplate};
use crate::graph::{Direction, WorldGraph};
use crate::rolls::Dice;

/// An active faction that has never codified its law declares a charter.
pub struct CharterDeclaration;

impl GrowthTemplate for CharterDeclaration {
    fn id(&self) -> TemplateId {
        TemplateId::CharterDeclaration
    }

    fn base_weight(&self) -> f64 {
        0.6
    }

    fn primary_kind(&self) -> EntityKind {
        EntityKind::Rules
    }

    fn can_apply(&self, graph: &WorldGraph, _tuning: &TuningConfig) -> bool {
        !self.find_targets(graph).is_empty()
    }

    fn find_targets(&self, graph: &WorldGraph) -> Vec<String> {
        graph
            .active_factions()
            .into_iter()
            .filter(|f| {
                graph
                    .related_ids(&f.id, RelationKind::Upholds, Direction::Outgoing)
                    .is_empty()
            })
            .map(|f| f.id.clone())
            .collect()
    }

    fn expand(&self, graph: &WorldGraph, target: &str, dice: &mut Dice) -> Option<GrowthBatch> {
        let faction = graph.entity(target)?;
        let scope = *dice
            .pick(&[RulesScope::Charter, RulesScope::Edict])
            .unwrap_or(&RulesScope::Charter);
        let charter_name = names::charter(dice);
        Some(GrowthBatch {
            entities: vec![NewEntity {
                name: charter_name.clone(),
                description: format!("The written law of {}", faction.name),
                class: EntityClass::Rules {
                    scope,
                    status: LoreStatus::Practiced,
                },
                prominence: Prominence::Marginal,
                tags: BTreeSet::new(),
            }],
            relationships: vec![LinkSpec {
                kind: RelationKind::Upholds,
                src: LinkEnd::Existing(target.to_string()),
                dst: LinkEnd::New(0),
            }],
            description: format!("{} declares {}", faction.name, charter_name),
        })
    }
}

/// A hero without a relic finds one.
pub struct RelicDiscovery;

impl GrowthTemplate for RelicDiscovery {
    fn id(&self) -> TemplateId {
        TemplateId::RelicDiscovery
    }

    fn base_weight(&self) -> f64 {
        0.5
    }

    fn primary_kind(&self) -> EntityKind {
        EntityKind::Abilities
    }

    fn can_apply(&self, graph: &WorldGraph, _tuning: &TuningConfig) -> bool {
        !living_with_role(graph, NpcRole::Hero).is_empty()
    }

    fn find_targets(&self, graph: &WorldGraph) -> Vec<String> {
        living_with_role(graph, NpcRole::Hero)
            .into_iter()
            .filter(|hero| {
                graph
                    .related_ids(hero, RelationKind::Wields, Direction::Outgoing)
                    .is_empty()
            })
            .collect()
    }

    fn expand(&self, graph: &WorldGraph, target: &str, dice: &mut Dice) -> Option<GrowthBatch> {
        let hero = graph.entity(target)?;
        let relic_name = names::relic(dice);
        Some(GrowthBatch {
            entities: vec![NewEntity {
                name: relic_name.clone(),
                description: format!("A relic borne by {}", hero.name),
                class: EntityClass::Abilities {
                    school: AbilitySchool::Relic,
                    status: LoreStatus::Practiced,
                },
                prominence: Prominence::Recognized,
                tags: BTreeSet::from(["relic".to_string()]),
            }],
            relationships: vec![LinkSpec {
                kind: RelationKind::Wields,
                src: LinkEnd::Existing(target.to_string()),
                dst: LinkEnd::New(0),
            }],
            description: format!("{} unearths {}", hero.name, relic_name),
        })
    }
}
