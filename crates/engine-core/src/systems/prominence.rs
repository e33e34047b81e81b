//! Prominence evolution: fame follows connectedness.

use contracts::{
    EntityChange, EntityClass, EntityPatch, NpcRole, RelationKind, SystemBatch, SystemId,
    TuningConfig,
};

use crate::graph::{Direction, WorldGraph};
use crate::rolls::{scaled_bps, Dice};

use super::SimulationSystem;

/// An entity rises one step when its connection count (plus a role bonus)
/// exceeds three times its prominence rank, and may fall one step when its
/// connections drop below its rank. Factions additionally rise when their
/// members' aggregate prominence outweighs the member-count-weighted rank.
/// Every move is a single ordinal step.
pub struct ProminenceEvolution;

fn role_bonus(class: &EntityClass) -> u32 {
    match class {
        EntityClass::Npc { role, .. } => match role {
            NpcRole::Mayor | NpcRole::Hero => 2,
            NpcRole::Merchant | NpcRole::Outlaw => 1,
        },
        _ => 0,
    }
}

impl SimulationSystem for ProminenceEvolution {
    fn id(&self) -> SystemId {
        SystemId::ProminenceEvolution
    }

    fn apply(
        &self,
        graph: &WorldGraph,
        modifier: f64,
        tuning: &TuningConfig,
        dice: &mut Dice,
    ) -> SystemBatch {
        let mut batch = SystemBatch::default();

        for entity in graph.entities() {
            if entity.class.is_terminal() {
                continue;
            }
            let rank = entity.prominence.rank();
            let degree = graph.relationship_count(&entity.id) as u32 + role_bonus(&entity.class);

            let group_rise = if let EntityClass::Faction { .. } = entity.class {
                let members =
                    graph.related_ids(&entity.id, RelationKind::MemberOf, Direction::Incoming);
                if members.is_empty() {
                    false
                } else {
                    let aggregate: u32 = members
                        .iter()
                        .filter_map(|m| graph.entity(m))
                        .map(|m| m.prominence.rank())
                        .sum();
                    aggregate > members.len() as u32 * rank
                }
            } else {
                false
            };

            if degree > rank * tuning.prominence_rise_multiplier || group_rise {
                if entity.prominence.raised() != entity.prominence {
                    batch.notes.push(format!("{} grows in renown", entity.name));
                    batch.changes.push(EntityChange {
                        entity_id: entity.id.clone(),
                        patch: EntityPatch::RaiseProminence,
                    });
                }
            } else if degree < rank
                && dice.chance_bps(scaled_bps(tuning.prominence_drop_chance_bps, modifier))
                && entity.prominence.lowered() != entity.prominence
            {
                batch.notes.push(format!("{} slips from memory", entity.name));
                batch.changes.push(EntityChange {
                    entity_id: entity.id.clone(),
                    patch: EntityPatch::LowerProminence,
                });
            }
        }
        batch
    }
}
