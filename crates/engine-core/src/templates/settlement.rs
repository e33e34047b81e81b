//! Settlement growth: founding new colonies and settling migrants into
//! existing ones.

use std::collections::BTreeSet;

use contracts::{
    EntityClass, EntityKind, GrowthBatch, LinkEnd, LinkSpec, LocationStatus, LocationTerrain,
    NewEntity, NpcRole, NpcStatus, Prominence, RelationKind, TemplateId, TuningConfig,
};

use super::{names, open_colonies, GrowthTemplate};
use crate::graph::WorldGraph;
use crate::rolls::Dice;

/// An established colony sponsors an expedition that raises a new colony,
/// led by a founding mayor.
pub struct ColonyFounding;

impl GrowthTemplate for ColonyFounding {
    fn id(&self) -> TemplateId {
        TemplateId::ColonyFounding
    }

    fn primary_kind(&self) -> EntityKind {
        EntityKind::Location
    }

    fn can_apply(&self, graph: &WorldGraph, tuning: &TuningConfig) -> bool {
        graph.colonies().len() < tuning.max_colonies
    }

    fn find_targets(&self, graph: &WorldGraph) -> Vec<String> {
        open_colonies(graph)
    }

    fn expand(&self, graph: &WorldGraph, target: &str, dice: &mut Dice) -> Option<GrowthBatch> {
        let origin = graph.entity(target)?;
        let colony_name = names::settlement(dice);
        let mayor_name = names::person(dice);
        let description = format!(
            "Settlers out of {} raise {} on the frontier; {} takes the founder's seat",
            origin.name, colony_name, mayor_name
        );
        Some(GrowthBatch {
            entities: vec![
                NewEntity {
                    name: colony_name,
                    description: format!("A young colony founded from {}", origin.name),
                    class: EntityClass::Location {
                        terrain: LocationTerrain::Colony,
                        status: LocationStatus::Stable,
                    },
                    prominence: Prominence::Marginal,
                    tags: BTreeSet::from(["frontier".to_string()]),
                },
                NewEntity {
                    name: mayor_name,
                    description: "Founding mayor of a frontier colony".to_string(),
                    class: EntityClass::Npc {
                        role: NpcRole::Mayor,
                        status: NpcStatus::Alive,
                    },
                    prominence: Prominence::Recognized,
                    tags: BTreeSet::new(),
                },
            ],
            relationships: vec![
                LinkSpec {
                    kind: RelationKind::ConnectedTo,
                    src: LinkEnd::Existing(target.to_string()),
                    dst: LinkEnd::New(0),
                },
                LinkSpec {
                    kind: RelationKind::ResidentOf,
                    src: LinkEnd::New(1),
                    dst: LinkEnd::New(0),
                },
                LinkSpec {
                    kind: RelationKind::LeaderOf,
                    src: LinkEnd::New(1),
                    dst: LinkEnd::New(0),
                },
            ],
            description,
        })
    }
}

/// One or two newcomers settle in a healthy colony, sometimes joining a
/// faction already present there.
pub struct MigrantArrival;

impl GrowthTemplate for MigrantArrival {
    fn id(&self) -> TemplateId {
        TemplateId::MigrantArrival
    }

    fn base_weight(&self) -> f64 {
        1.2
    }

    fn primary_kind(&self) -> EntityKind {
        EntityKind::Npc
    }

    fn can_apply(&self, graph: &WorldGraph, _tuning: &TuningConfig) -> bool {
        !open_colonies(graph).is_empty()
    }

    fn find_targets(&self, graph: &WorldGraph) -> Vec<String> {
        open_colonies(graph)
    }

    fn expand(&self, graph: &WorldGraph, target: &str, dice: &mut Dice) -> Option<GrowthBatch> {
        let colony = graph.entity(target)?;
        let count = if dice.chance_bps(4_000) { 2 } else { 1 };

        // Factions with at least one member already resident in the colony.
        let local_factions = {
            let mut out = BTreeSet::new();
            for resident in graph.residents_of(target) {
                for faction in graph.factions_of(&resident.id) {
                    out.insert(faction);
                }
            }
            out.into_iter().collect::<Vec<_>>()
        };

        let mut entities = Vec::new();
        let mut relationships = Vec::new();
        let mut arrivals = Vec::new();
        for idx in 0..count {
            let name = names::person(dice);
            arrivals.push(name.clone());
            entities.push(NewEntity {
                name,
                description: format!("A trader newly settled in {}", colony.name),
                class: EntityClass::Npc {
                    role: NpcRole::Merchant,
                    status: NpcStatus::Alive,
                },
                prominence: Prominence::Marginal,
                tags: BTreeSet::new(),
            });
            relationships.push(LinkSpec {
                kind: RelationKind::ResidentOf,
                src: LinkEnd::New(idx),
                dst: LinkEnd::Existing(target.to_string()),
            });
            if !local_factions.is_empty() && dice.chance_bps(5_000) {
                if let Some(faction) = dice.pick(&local_factions) {
                    relationships.push(LinkSpec {
                        kind: RelationKind::MemberOf,
                        src: LinkEnd::New(idx),
                        dst: LinkEnd::Existing(faction.clone()),
                    });
                }
            }
        }

        let description = format!("{} settle in {}", arrivals.join(" and "), colony.name);
        Some(GrowthBatch {
            entities,
            relationships,
            description,
        })
    }
}
