//! Cultural drift: connected colonies converge on shared ways, isolated
//! colonies grow their own.

use std::collections::BTreeMap;

use contracts::{
    EntityChange, EntityPatch, PressureKind, RelationKind, SystemBatch, SystemId, TuningConfig,
    MAX_ENTITY_TAGS,
};

use crate::graph::WorldGraph;
use crate::rolls::{scaled_bps, Dice};

use super::SimulationSystem;

const SHARED_WAYS: [&str; 6] = [
    "river_trade",
    "ember_rites",
    "salt_oaths",
    "loom_guilds",
    "horn_calls",
    "stone_law",
];

/// Divergence tags carry this prefix so the cultural-tension pressure can
/// count divergent centers.
const FOLKWAY_PREFIX: &str = "folkway:";

/// For each colony pair: connected and trait-deficient pairs may gain a
/// shared tag (chance shrinking as the era modifier grows); disconnected
/// pairs may gain a divergence tag. Both respect the tag cap.
pub struct CulturalDrift;

impl SimulationSystem for CulturalDrift {
    fn id(&self) -> SystemId {
        SystemId::CulturalDrift
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

        let colonies = graph.colonies();
        for i in 0..colonies.len() {
            for j in (i + 1)..colonies.len() {
                let a = colonies[i];
                let b = colonies[j];
                let connected = graph.has_edge_between(&a.id, &b.id, RelationKind::ConnectedTo);

                if connected {
                    let shared = a.tags.intersection(&b.tags).count();
                    if shared < 2
                        && dice.chance_bps(scaled_bps(
                            tuning.convergence_chance_bps,
                            1.0 / modifier,
                        ))
                    {
                        if let Some(way) = dice.pick(&SHARED_WAYS) {
                            let tag = (*way).to_string();
                            for colony in [a, b] {
                                if colony.tags.len() < MAX_ENTITY_TAGS
                                    && !colony.has_tag(&tag)
                                {
                                    batch.changes.push(EntityChange {
                                        entity_id: colony.id.clone(),
                                        patch: EntityPatch::AddTag(tag.clone()),
                                    });
                                }
                            }
                            batch.notes.push(format!(
                                "{} and {} come to share the way of {}",
                                a.name, b.name, way
                            ));
                        }
                    }
                } else if dice.chance_bps(scaled_bps(tuning.divergence_chance_bps, modifier)) {
                    let colony = if dice.chance_bps(5_000) { a } else { b };
                    if let Some(way) = dice.pick(&SHARED_WAYS) {
                        let tag = format!("{FOLKWAY_PREFIX}{way}");
                        if colony.tags.len() < MAX_ENTITY_TAGS && !colony.has_tag(&tag) {
                            batch.notes.push(format!(
                                "Cut off from its neighbors, {} keeps its own {}",
                                colony.name, way
                            ));
                            batch.changes.push(EntityChange {
                                entity_id: colony.id.clone(),
                                patch: EntityPatch::AddTag(tag),
                            });
                        }
                    }
                }
            }
        }

        let divergent = graph
            .colonies()
            .into_iter()
            .filter(|c| c.tags.iter().any(|t| t.starts_with(FOLKWAY_PREFIX)))
            .count();
        if divergent >= 2 {
            batch.pressure_deltas = BTreeMap::from([(
                PressureKind::CulturalTension,
                1.0 * divergent as f64,
            )]);
        }
        batch
    }
}
