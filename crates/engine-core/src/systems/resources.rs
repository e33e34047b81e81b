//! Resource flow: colonies prosper or decline with their access to
//! resource sites, and merchant factions profit from thriving holdings.

use std::collections::BTreeMap;

use contracts::{
    EntityChange, EntityClass, EntityPatch, FactionCharter, LocationStatus, LocationTerrain,
    NpcRole, NpcStatus, PressureKind, RelationKind, SystemBatch, SystemId, TuningConfig,
};

use crate::graph::{Direction, WorldGraph};
use crate::rolls::{scaled_bps, Dice};

use super::SimulationSystem;

/// For each colony, the ratio of connected resource-tagged locations to
/// resident count pushes its status one step toward declining or thriving.
/// Merchant-affiliated factions controlling a thriving colony gain one
/// prominence step. Emits a scarcity delta signed by whether any colony is
/// declining.
pub struct ResourceFlow;

impl SimulationSystem for ResourceFlow {
    fn id(&self) -> SystemId {
        SystemId::ResourceFlow
    }

    fn apply(
        &self,
        graph: &WorldGraph,
        modifier: f64,
        tuning: &TuningConfig,
        dice: &mut Dice,
    ) -> SystemBatch {
        let mut batch = SystemBatch::default();
        if modifier <= 0.0 {
            return batch;
        }

        let mut any_declining = false;
        for colony in graph.colonies() {
            let EntityClass::Location {
                terrain: LocationTerrain::Colony,
                status,
            } = colony.class
            else {
                continue;
            };
            let residents = graph.residents_of(&colony.id).len();
            let resource_sites = graph
                .connected_locations(&colony.id)
                .into_iter()
                .filter(|loc| {
                    graph
                        .entity(loc)
                        .map(|e| e.has_tag("resource"))
                        .unwrap_or(false)
                })
                .count();
            let ratio_bps = (resource_sites * 10_000 / residents.max(1)) as u32;

            let flip_bps = scaled_bps(tuning.status_flip_chance_bps, modifier);
            let next = if ratio_bps < tuning.scarcity_low_ratio_bps {
                match status {
                    LocationStatus::Thriving => Some(LocationStatus::Stable),
                    LocationStatus::Stable => Some(LocationStatus::Declining),
                    LocationStatus::Declining | LocationStatus::Abandoned => None,
                }
            } else if ratio_bps > tuning.scarcity_high_ratio_bps {
                match status {
                    LocationStatus::Declining => Some(LocationStatus::Stable),
                    LocationStatus::Stable => Some(LocationStatus::Thriving),
                    LocationStatus::Thriving | LocationStatus::Abandoned => None,
                }
            } else {
                None
            };

            let mut effective = status;
            if let Some(next) = next {
                if dice.chance_bps(flip_bps) {
                    batch.notes.push(format!(
                        "{} turns {}",
                        colony.name,
                        match next {
                            LocationStatus::Thriving => "prosperous",
                            LocationStatus::Stable => "steady",
                            LocationStatus::Declining => "lean",
                            LocationStatus::Abandoned => "empty",
                        }
                    ));
                    batch.changes.push(EntityChange {
                        entity_id: colony.id.clone(),
                        patch: EntityPatch::SetLocationStatus(next),
                    });
                    effective = next;
                }
            }
            any_declining |= effective == LocationStatus::Declining;
        }

        // Merchant factions skim the surplus of their thriving holdings.
        for faction in graph.active_factions() {
            if !merchant_affiliated(graph, &faction.id) {
                continue;
            }
            let holds_thriving = graph
                .related_ids(&faction.id, RelationKind::Controls, Direction::Outgoing)
                .into_iter()
                .any(|loc| {
                    matches!(
                        graph.entity(&loc).map(|e| e.class),
                        Some(EntityClass::Location {
                            status: LocationStatus::Thriving,
                            ..
                        })
                    )
                });
            if holds_thriving {
                batch.notes.push(format!(
                    "{} grows rich off its thriving holdings",
                    faction.name
                ));
                batch.changes.push(EntityChange {
                    entity_id: faction.id.clone(),
                    patch: EntityPatch::RaiseProminence,
                });
            }
        }

        batch.pressure_deltas = BTreeMap::from([(
            PressureKind::ResourceScarcity,
            if any_declining { 3.0 } else { -2.0 },
        )]);
        batch
    }
}

/// Guild-chartered, or counting at least one living merchant among its
/// members.
fn merchant_affiliated(graph: &WorldGraph, faction_id: &str) -> bool {
    if matches!(
        graph.entity(faction_id).map(|e| e.class),
        Some(EntityClass::Faction {
            charter: FactionCharter::Guild,
            ..
        })
    ) {
        return true;
    }
    graph
        .related_ids(faction_id, RelationKind::MemberOf, Direction::Incoming)
        .into_iter()
        .any(|member| {
            matches!(
                graph.entity(&member).map(|e| e.class),
                Some(EntityClass::Npc {
                    role: NpcRole::Merchant,
                    status: NpcStatus::Alive,
                })
            )
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Entity, Prominence};
    use std::collections::BTreeSet;

    #[test]
    fn zero_modifier_suppresses_all_effects() {
        let mut graph = WorldGraph::new();
        let id = graph.allocate_id(contracts::EntityKind::Location);
        graph
            .insert_entity(Entity {
                id: id.clone(),
                name: "Thornwick".to_string(),
                description: String::new(),
                class: EntityClass::Location {
                    terrain: LocationTerrain::Colony,
                    status: LocationStatus::Declining,
                },
                prominence: Prominence::Marginal,
                tags: BTreeSet::new(),
                created_at_tick: 0,
                updated_at_tick: 0,
            })
            .expect("insert");
        graph.set_pressure(PressureKind::ResourceScarcity, 70.0);

        let tuning = TuningConfig {
            status_flip_chance_bps: 10_000,
            ..TuningConfig::default()
        };
        let mut dice = Dice::for_stream(11, 1, "test:resource_flow");
        let batch = ResourceFlow.apply(&graph, 0.0, &tuning, &mut dice);
        assert!(batch.changes.is_empty());
        assert!(batch.pressure_deltas.is_empty());
    }

    #[test]
    fn starved_colony_steps_toward_decline() {
        let mut graph = WorldGraph::new();
        let colony = graph.allocate_id(contracts::EntityKind::Location);
        graph
            .insert_entity(Entity {
                id: colony.clone(),
                name: "Thornwick".to_string(),
                description: String::new(),
                class: EntityClass::Location {
                    terrain: LocationTerrain::Colony,
                    status: LocationStatus::Stable,
                },
                prominence: Prominence::Marginal,
                tags: BTreeSet::new(),
                created_at_tick: 0,
                updated_at_tick: 0,
            })
            .expect("insert");

        let tuning = TuningConfig {
            status_flip_chance_bps: 10_000,
            ..TuningConfig::default()
        };
        let mut dice = Dice::for_stream(11, 1, "test:resource_flow_decline");
        let batch = ResourceFlow.apply(&graph, 1.0, &tuning, &mut dice);
        assert!(batch.changes.iter().any(|c| c.entity_id == colony
            && c.patch == EntityPatch::SetLocationStatus(LocationStatus::Declining)));
        assert_eq!(
            batch.pressure_deltas.get(&PressureKind::ResourceScarcity),
            Some(&3.0)
        );
    }
}
