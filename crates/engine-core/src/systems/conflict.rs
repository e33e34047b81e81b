//! Conflict contagion: hostility spreads along allegiance edges.

use std::collections::BTreeMap;
use std::collections::BTreeSet;

use contracts::{
    EntityKind, PressureKind, RelationKind, RelationProposal, SystemBatch, SystemId, TuningConfig,
};

use crate::graph::WorldGraph;
use crate::rolls::{scaled_bps, Dice};

use super::{display_name, pair_key, throttled, SimulationSystem};

/// For every existing hostile edge, each ally of either endpoint may inherit
/// hostility toward the opposite endpoint. The pressure contribution scales
/// with the count of new hostile edges this tick, capped beyond a threshold.
pub struct ConflictContagion;

/// Direction-sensitive legality of a hostile edge, matching the default
/// matrix. The commit path remains the authority if the host supplies a
/// stricter matrix.
fn hostility_expressible(src: EntityKind, dst: EntityKind) -> bool {
    matches!(
        (src, dst),
        (EntityKind::Npc, EntityKind::Npc)
            | (EntityKind::Npc, EntityKind::Faction)
            | (EntityKind::Faction, EntityKind::Faction)
    )
}

impl SimulationSystem for ConflictContagion {
    fn id(&self) -> SystemId {
        SystemId::ConflictContagion
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

        let hostile_edges = graph
            .relationships()
            .iter()
            .filter(|r| r.kind.is_hostile())
            .map(|r| (r.src.clone(), r.dst.clone()))
            .collect::<Vec<_>>();

        let mut proposed = BTreeSet::new();
        let mut new_edges = 0_u32;
        for (src, dst) in &hostile_edges {
            for (side, foe) in [(src, dst), (dst, src)] {
                for ally in graph.allies_of(side) {
                    if ally == *foe || ally == *side {
                        continue;
                    }
                    let (Some(ally_kind), Some(foe_kind)) = (
                        graph.entity(&ally).map(|e| e.kind()),
                        graph.entity(foe).map(|e| e.kind()),
                    ) else {
                        continue;
                    };
                    if !hostility_expressible(ally_kind, foe_kind) {
                        continue;
                    }
                    if graph.has_edge_between(&ally, foe, RelationKind::EnemyOf) {
                        continue;
                    }
                    if throttled(graph, &ally, foe, RelationKind::EnemyOf, tuning) {
                        continue;
                    }
                    if !proposed.insert(pair_key(&ally, foe, RelationKind::EnemyOf)) {
                        continue;
                    }
                    if dice.chance_bps(scaled_bps(tuning.contagion_chance_bps, modifier)) {
                        batch.notes.push(format!(
                            "{} inherits the feud of {} against {}",
                            display_name(graph, &ally),
                            display_name(graph, side),
                            display_name(graph, foe)
                        ));
                        batch.relationships.push(RelationProposal {
                            kind: RelationKind::EnemyOf,
                            src: ally,
                            dst: foe.clone(),
                        });
                        new_edges += 1;
                    }
                }
            }
        }

        if new_edges > 0 {
            let capped = new_edges.min(tuning.contagion_pressure_cap);
            batch.pressure_deltas = BTreeMap::from([(
                PressureKind::WarTension,
                1.5 * f64::from(capped),
            )]);
        }
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Entity, EntityClass, NpcRole, NpcStatus, Prominence, Relationship};

    fn world_with_feud() -> (WorldGraph, String, String, String) {
        let mut graph = WorldGraph::new();
        let npc = |graph: &mut WorldGraph, name: &str| {
            let id = graph.allocate_id(EntityKind::Npc);
            graph
                .insert_entity(Entity {
                    id: id.clone(),
                    name: name.to_string(),
                    description: String::new(),
                    class: EntityClass::Npc {
                        role: NpcRole::Merchant,
                        status: NpcStatus::Alive,
                    },
                    prominence: Prominence::Marginal,
                    tags: BTreeSet::new(),
                    created_at_tick: 0,
                    updated_at_tick: 0,
                })
                .expect("insert");
            id
        };
        let a = npc(&mut graph, "a");
        let b = npc(&mut graph, "b");
        let follower = npc(&mut graph, "follower");
        graph.push_relationship(Relationship {
            kind: RelationKind::EnemyOf,
            src: a.clone(),
            dst: b.clone(),
            formed_at_tick: 0,
        });
        graph.push_relationship(Relationship {
            kind: RelationKind::FollowerOf,
            src: follower.clone(),
            dst: a.clone(),
            formed_at_tick: 0,
        });
        (graph, a, b, follower)
    }

    #[test]
    fn followers_inherit_hostility_when_forced() {
        let (graph, _a, b, follower) = world_with_feud();
        let tuning = TuningConfig {
            contagion_chance_bps: 10_000,
            ..TuningConfig::default()
        };
        let mut dice = Dice::for_stream(5, 1, "test:contagion");
        let batch = ConflictContagion.apply(&graph, 1.0, &tuning, &mut dice);
        assert!(batch
            .relationships
            .iter()
            .any(|r| r.kind == RelationKind::EnemyOf && r.src == follower && r.dst == b));
        assert!(batch.pressure_deltas.contains_key(&PressureKind::WarTension));
    }

    #[test]
    fn existing_hostility_is_not_duplicated() {
        let (mut graph, _a, b, follower) = world_with_feud();
        graph.push_relationship(Relationship {
            kind: RelationKind::EnemyOf,
            src: follower.clone(),
            dst: b.clone(),
            formed_at_tick: 0,
        });
        let tuning = TuningConfig {
            contagion_chance_bps: 10_000,
            ..TuningConfig::default()
        };
        let mut dice = Dice::for_stream(5, 1, "test:contagion_dup");
        let batch = ConflictContagion.apply(&graph, 1.0, &tuning, &mut dice);
        assert!(batch
            .relationships
            .iter()
            .all(|r| !(r.src == follower && r.dst == b)));
    }

    #[test]
    fn faction_cannot_be_hostile_toward_npc() {
        assert!(!hostility_expressible(EntityKind::Faction, EntityKind::Npc));
        assert!(hostility_expressible(EntityKind::Npc, EntityKind::Faction));
    }
}
