//! Relationship formation between co-located NPCs.

use std::collections::BTreeSet;

use contracts::{RelationKind, RelationProposal, SystemBatch, SystemId, TuningConfig};

use crate::graph::WorldGraph;
use crate::rolls::{scaled_bps, Dice};

use super::{display_name, pair_key, throttled, SimulationSystem};

/// For every pair of living NPCs sharing a colony: shared faction membership
/// can produce a follower or rival bond, split affiliation can produce
/// enmity, and an independent low roll can produce romance. Every kind is
/// throttled per entity by its own cooldown window and never duplicates an
/// existing edge between the pair.
pub struct RelationshipFormation;

impl SimulationSystem for RelationshipFormation {
    fn id(&self) -> SystemId {
        SystemId::RelationshipFormation
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
        let mut proposed = BTreeSet::new();

        for colony in graph.colonies() {
            let mut residents = graph
                .residents_of(&colony.id)
                .into_iter()
                .map(|e| e.id.clone())
                .collect::<Vec<_>>();
            residents.sort();
            residents.dedup();

            for i in 0..residents.len() {
                for j in (i + 1)..residents.len() {
                    let a = &residents[i];
                    let b = &residents[j];
                    let factions_a = graph.factions_of(a);
                    let factions_b = graph.factions_of(b);
                    let shared_faction =
                        factions_a.iter().any(|f| factions_b.contains(f));

                    if shared_faction {
                        if dice.chance_bps(scaled_bps(tuning.bond_chance_bps, modifier)) {
                            let kind = if dice.chance_bps(5_000) {
                                RelationKind::FollowerOf
                            } else {
                                RelationKind::RivalOf
                            };
                            let (src, dst) = if kind == RelationKind::FollowerOf
                                && dice.chance_bps(5_000)
                            {
                                (b.clone(), a.clone())
                            } else {
                                (a.clone(), b.clone())
                            };
                            self.propose(
                                graph, tuning, &mut batch, &mut proposed, kind, src, dst,
                                &colony.name,
                            );
                        }
                    } else if !factions_a.is_empty() && !factions_b.is_empty() {
                        if dice.chance_bps(scaled_bps(tuning.enmity_chance_bps, modifier)) {
                            self.propose(
                                graph,
                                tuning,
                                &mut batch,
                                &mut proposed,
                                RelationKind::EnemyOf,
                                a.clone(),
                                b.clone(),
                                &colony.name,
                            );
                        }
                    }

                    // Romance rolls independently of faction alignment.
                    if dice.chance_bps(scaled_bps(tuning.romance_chance_bps, modifier)) {
                        self.propose(
                            graph,
                            tuning,
                            &mut batch,
                            &mut proposed,
                            RelationKind::LoverOf,
                            a.clone(),
                            b.clone(),
                            &colony.name,
                        );
                    }
                }
            }
        }
        batch
    }
}

impl RelationshipFormation {
    #[allow(clippy::too_many_arguments)]
    fn propose(
        &self,
        graph: &WorldGraph,
        tuning: &TuningConfig,
        batch: &mut SystemBatch,
        proposed: &mut BTreeSet<(String, String, RelationKind)>,
        kind: RelationKind,
        src: String,
        dst: String,
        colony_name: &str,
    ) {
        if throttled(graph, &src, &dst, kind, tuning) {
            return;
        }
        if graph.has_edge_between(&src, &dst, kind) {
            return;
        }
        if !proposed.insert(pair_key(&src, &dst, kind)) {
            return;
        }
        let verb = match kind {
            RelationKind::FollowerOf => "falls in behind",
            RelationKind::RivalOf => "becomes the rival of",
            RelationKind::EnemyOf => "turns against",
            RelationKind::LoverOf => "takes up with",
            _ => "binds to",
        };
        batch.notes.push(format!(
            "{} {} {} in {}",
            display_name(graph, &src),
            verb,
            display_name(graph, &dst),
            colony_name
        ));
        batch.relationships.push(RelationProposal { kind, src, dst });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{
        Entity, EntityClass, EntityKind, FactionCharter, FactionStatus, LocationStatus,
        LocationTerrain, NpcRole, NpcStatus, Prominence, Relationship,
    };

    fn insert(graph: &mut WorldGraph, kind: EntityKind, name: &str, class: EntityClass) -> String {
        let id = graph.allocate_id(kind);
        graph
            .insert_entity(Entity {
                id: id.clone(),
                name: name.to_string(),
                description: String::new(),
                class,
                prominence: Prominence::Marginal,
                tags: BTreeSet::new(),
                created_at_tick: 0,
                updated_at_tick: 0,
            })
            .expect("insert");
        id
    }

    fn link(graph: &mut WorldGraph, kind: RelationKind, src: &str, dst: &str) {
        graph.push_relationship(Relationship {
            kind,
            src: src.to_string(),
            dst: dst.to_string(),
            formed_at_tick: 0,
        });
    }

    /// Two colonies, two NPCs each, each pair sharing a faction. With the
    /// bond probability forced certain, exactly one bond forms per
    /// co-located pair and nothing crosses colonies.
    #[test]
    fn forced_bonds_stay_within_colonies() {
        let mut graph = WorldGraph::new();
        let colony_a = insert(
            &mut graph,
            EntityKind::Location,
            "Thornwick",
            EntityClass::Location {
                terrain: LocationTerrain::Colony,
                status: LocationStatus::Stable,
            },
        );
        let colony_b = insert(
            &mut graph,
            EntityKind::Location,
            "Gullhaven",
            EntityClass::Location {
                terrain: LocationTerrain::Colony,
                status: LocationStatus::Stable,
            },
        );
        let faction_a = insert(
            &mut graph,
            EntityKind::Faction,
            "Guild A",
            EntityClass::Faction {
                charter: FactionCharter::Guild,
                status: FactionStatus::Active,
            },
        );
        let faction_b = insert(
            &mut graph,
            EntityKind::Faction,
            "Guild B",
            EntityClass::Faction {
                charter: FactionCharter::Guild,
                status: FactionStatus::Active,
            },
        );
        let npc = |graph: &mut WorldGraph, name: &str| {
            insert(
                graph,
                EntityKind::Npc,
                name,
                EntityClass::Npc {
                    role: NpcRole::Merchant,
                    status: NpcStatus::Alive,
                },
            )
        };
        let a1 = npc(&mut graph, "a1");
        let a2 = npc(&mut graph, "a2");
        let b1 = npc(&mut graph, "b1");
        let b2 = npc(&mut graph, "b2");
        for (person, colony, faction) in [
            (&a1, &colony_a, &faction_a),
            (&a2, &colony_a, &faction_a),
            (&b1, &colony_b, &faction_b),
            (&b2, &colony_b, &faction_b),
        ] {
            link(&mut graph, RelationKind::ResidentOf, person, colony);
            link(&mut graph, RelationKind::MemberOf, person, faction);
        }

        let tuning = TuningConfig {
            bond_chance_bps: 10_000,
            romance_chance_bps: 0,
            ..TuningConfig::default()
        };
        let mut dice = Dice::for_stream(42, 1, "test:relationship_formation");
        let batch = RelationshipFormation.apply(&graph, 1.0, &tuning, &mut dice);

        let bonds = batch
            .relationships
            .iter()
            .filter(|r| {
                matches!(r.kind, RelationKind::FollowerOf | RelationKind::RivalOf)
            })
            .collect::<Vec<_>>();
        assert_eq!(bonds.len(), 2);
        let colony_of = |id: &str| if id == a1 || id == a2 { "a" } else { "b" };
        for bond in &bonds {
            assert_eq!(
                colony_of(&bond.src),
                colony_of(&bond.dst),
                "bond crossed colonies"
            );
        }
    }

    #[test]
    fn zero_modifier_is_a_hard_disable() {
        let graph = WorldGraph::new();
        let tuning = TuningConfig {
            bond_chance_bps: 10_000,
            romance_chance_bps: 10_000,
            ..TuningConfig::default()
        };
        let mut dice = Dice::for_stream(42, 1, "test:disabled");
        let batch = RelationshipFormation.apply(&graph, 0.0, &tuning, &mut dice);
        assert!(batch.is_empty());
    }
}
