//! Alliance formation: factions sharing an adversary close ranks.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use contracts::{
    PressureKind, RelationKind, RelationProposal, SystemBatch, SystemId, TuningConfig,
};

use crate::graph::{Direction, WorldGraph};
use crate::rolls::{scaled_bps, Dice};

use super::{throttled, SimulationSystem};

/// Any two active factions with a common adversary may form an alliance,
/// provided none exists and neither is cooling down. Each new alliance
/// nudges the stability pressure upward.
pub struct AllianceFormation;

fn adversaries_of(graph: &WorldGraph, faction_id: &str) -> BTreeSet<String> {
    let mut foes = BTreeSet::new();
    foes.extend(graph.related_ids(faction_id, RelationKind::EnemyOf, Direction::Outgoing));
    foes.extend(graph.related_ids(faction_id, RelationKind::EnemyOf, Direction::Incoming));
    foes
}

impl SimulationSystem for AllianceFormation {
    fn id(&self) -> SystemId {
        SystemId::AllianceFormation
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

        let factions = graph.active_factions();
        let mut new_alliances = 0_u32;
        for i in 0..factions.len() {
            for j in (i + 1)..factions.len() {
                let a = factions[i];
                let b = factions[j];
                if graph.has_edge_between(&a.id, &b.id, RelationKind::AlliedWith)
                    || graph.has_edge_between(&a.id, &b.id, RelationKind::EnemyOf)
                {
                    continue;
                }
                let shared_foe = adversaries_of(graph, &a.id)
                    .intersection(&adversaries_of(graph, &b.id))
                    .next()
                    .cloned();
                let Some(foe) = shared_foe else {
                    continue;
                };
                if throttled(graph, &a.id, &b.id, RelationKind::AlliedWith, tuning) {
                    continue;
                }
                if dice.chance_bps(scaled_bps(tuning.alliance_chance_bps, modifier)) {
                    let foe_name = graph
                        .entity(&foe)
                        .map(|e| e.name.clone())
                        .unwrap_or(foe);
                    batch.notes.push(format!(
                        "{} and {} ally against {}",
                        a.name, b.name, foe_name
                    ));
                    batch.relationships.push(RelationProposal {
                        kind: RelationKind::AlliedWith,
                        src: a.id.clone(),
                        dst: b.id.clone(),
                    });
                    new_alliances += 1;
                }
            }
        }

        if new_alliances > 0 {
            batch.pressure_deltas = BTreeMap::from([(
                PressureKind::Stability,
                2.0 * f64::from(new_alliances),
            )]);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        Entity, EntityClass, EntityKind, FactionCharter, FactionStatus, Prominence, Relationship,
    };

    fn faction(graph: &mut WorldGraph, name: &str) -> String {
        let id = graph.allocate_id(EntityKind::Faction);
        graph
            .insert_entity(Entity {
                id: id.clone(),
                name: name.to_string(),
                description: String::new(),
                class: EntityClass::Faction {
                    charter: FactionCharter::Order,
                    status: FactionStatus::Active,
                },
                prominence: Prominence::Marginal,
                tags: BTreeSet::new(),
                created_at_tick: 0,
                updated_at_tick: 0,
            })
            .expect("insert");
        id
    }

    #[test]
    fn shared_adversary_forces_an_alliance() {
        let mut graph = WorldGraph::new();
        let a = faction(&mut graph, "Wardens");
        let b = faction(&mut graph, "Compact");
        let foe = faction(&mut graph, "Ashen Host");
        for side in [&a, &b] {
            graph.push_relationship(Relationship {
                kind: RelationKind::EnemyOf,
                src: side.clone(),
                dst: foe.clone(),
                formed_at_tick: 0,
            });
        }
        let tuning = TuningConfig {
            alliance_chance_bps: 10_000,
            ..TuningConfig::default()
        };
        let mut dice = Dice::for_stream(31, 1, "test:alliance");
        let batch = AllianceFormation.apply(&graph, 1.0, &tuning, &mut dice);
        assert_eq!(batch.relationships.len(), 1);
        let proposal = &batch.relationships[0];
        assert_eq!(proposal.kind, RelationKind::AlliedWith);
        assert_eq!(
            batch.pressure_deltas.get(&PressureKind::Stability),
            Some(&2.0)
        );
    }

    #[test]
    fn no_common_foe_means_no_alliance() {
        let mut graph = WorldGraph::new();
        faction(&mut graph, "Wardens");
        faction(&mut graph, "Compact");
        let tuning = TuningConfig {
            alliance_chance_bps: 10_000,
            ..TuningConfig::default()
        };
        let mut dice = Dice::for_stream(31, 1, "test:alliance_none");
        let batch = AllianceFormation.apply(&graph, 1.0, &tuning, &mut dice);
        assert!(batch.is_empty());
    }
}
