//! Character growth: succession after a mayor's death, outlawry under
//! scarcity, and heroes rising to meet trouble.

use std::collections::BTreeSet;

use contracts::{
    EntityClass, EntityKind, GrowthBatch, LinkEnd, LinkSpec, LocationStatus, LocationTerrain,
    NewEntity, NpcRole, NpcStatus, PressureKind, Prominence, RelationKind, TemplateId,
    TuningConfig,
};

use super::{living_with_role, names, open_colonies, GrowthTemplate};
use crate::graph::{Direction, WorldGraph};
use crate::rolls::Dice;

/// A dead mayor's seat draws a successor. If the seat itself cannot be found
/// the claimant still appears, without a leadership link.
pub struct SuccessionCrisis;

impl SuccessionCrisis {
    /// Dead mayors whose seat (if any) currently has no living leader.
    fn unresolved_successions(graph: &WorldGraph) -> Vec<String> {
        graph
            .entities()
            .filter(|e| {
                matches!(
                    e.class,
                    EntityClass::Npc {
                        role: NpcRole::Mayor,
                        status: NpcStatus::Dead,
                    }
                )
            })
            .filter(|e| {
                let seats = graph.related_ids(&e.id, RelationKind::LeaderOf, Direction::Outgoing);
                seats
                    .iter()
                    .all(|seat| graph.leader_of_location(seat).is_none())
            })
            .map(|e| e.id.clone())
            .collect()
    }
}

impl GrowthTemplate for SuccessionCrisis {
    fn id(&self) -> TemplateId {
        TemplateId::SuccessionCrisis
    }

    fn primary_kind(&self) -> EntityKind {
        EntityKind::Npc
    }

    fn can_apply(&self, graph: &WorldGraph, _tuning: &TuningConfig) -> bool {
        !Self::unresolved_successions(graph).is_empty()
    }

    fn find_targets(&self, graph: &WorldGraph) -> Vec<String> {
        Self::unresolved_successions(graph)
    }

    fn expand(&self, graph: &WorldGraph, target: &str, dice: &mut Dice) -> Option<GrowthBatch> {
        let predecessor = graph.entity(target)?;
        // The governed location may be gone from under the old mayor; the
        // succession still happens, minus the leadership link.
        let seat = graph
            .related_ids(target, RelationKind::LeaderOf, Direction::Outgoing)
            .into_iter()
            .find(|loc| graph.entity(loc).is_some());

        let successor_name = names::person(dice);
        let mut relationships = Vec::new();
        let description = match &seat {
            Some(seat_id) => {
                let seat_name = graph
                    .entity(seat_id)
                    .map(|e| e.name.clone())
                    .unwrap_or_else(|| seat_id.clone());
                relationships.push(LinkSpec {
                    kind: RelationKind::LeaderOf,
                    src: LinkEnd::New(0),
                    dst: LinkEnd::Existing(seat_id.clone()),
                });
                relationships.push(LinkSpec {
                    kind: RelationKind::ResidentOf,
                    src: LinkEnd::New(0),
                    dst: LinkEnd::Existing(seat_id.clone()),
                });
                format!(
                    "{} succeeds the late {} as mayor of {}",
                    successor_name, predecessor.name, seat_name
                )
            }
            None => format!(
                "{} claims the late {}'s title, though the seat itself is lost",
                successor_name, predecessor.name
            ),
        };

        Some(GrowthBatch {
            entities: vec![NewEntity {
                name: successor_name,
                description: format!("Successor to {}", predecessor.name),
                class: EntityClass::Npc {
                    role: NpcRole::Mayor,
                    status: NpcStatus::Alive,
                },
                prominence: Prominence::Recognized,
                tags: BTreeSet::new(),
            }],
            relationships,
            description,
        })
    }
}

/// Scarcity breeds outlaws in declining colonies. Gated on the
/// resource-scarcity pressure.
pub struct OutlawEmergence;

impl GrowthTemplate for OutlawEmergence {
    fn id(&self) -> TemplateId {
        TemplateId::OutlawEmergence
    }

    fn base_weight(&self) -> f64 {
        0.8
    }

    fn primary_kind(&self) -> EntityKind {
        EntityKind::Npc
    }

    fn can_apply(&self, graph: &WorldGraph, tuning: &TuningConfig) -> bool {
        graph.pressure(PressureKind::ResourceScarcity) >= tuning.outlaw_scarcity_threshold
    }

    fn find_targets(&self, graph: &WorldGraph) -> Vec<String> {
        graph
            .entities()
            .filter(|e| {
                matches!(
                    e.class,
                    EntityClass::Location {
                        terrain: LocationTerrain::Colony,
                        status: LocationStatus::Declining,
                    }
                )
            })
            .map(|e| e.id.clone())
            .collect()
    }

    fn expand(&self, graph: &WorldGraph, target: &str, dice: &mut Dice) -> Option<GrowthBatch> {
        let colony = graph.entity(target)?;
        let outlaw_name = names::person(dice);
        let mut relationships = vec![LinkSpec {
            kind: RelationKind::ResidentOf,
            src: LinkEnd::New(0),
            dst: LinkEnd::Existing(target.to_string()),
        }];
        if let Some(leader) = graph.leader_of_location(target) {
            relationships.push(LinkSpec {
                kind: RelationKind::EnemyOf,
                src: LinkEnd::New(0),
                dst: LinkEnd::Existing(leader),
            });
        }
        Some(GrowthBatch {
            entities: vec![NewEntity {
                name: outlaw_name.clone(),
                description: format!("An outlaw preying on the roads around {}", colony.name),
                class: EntityClass::Npc {
                    role: NpcRole::Outlaw,
                    status: NpcStatus::Alive,
                },
                prominence: Prominence::Marginal,
                tags: BTreeSet::from(["wanted".to_string()]),
            }],
            relationships,
            description: format!("Hard years in {} turn {} to outlawry", colony.name, outlaw_name),
        })
    }
}

/// Trouble calls up heroes; a hero arriving where an outlaw operates starts
/// as that outlaw's rival.
pub struct HeroEmergence;

impl GrowthTemplate for HeroEmergence {
    fn id(&self) -> TemplateId {
        TemplateId::HeroEmergence
    }

    fn base_weight(&self) -> f64 {
        0.7
    }

    fn primary_kind(&self) -> EntityKind {
        EntityKind::Npc
    }

    fn can_apply(&self, graph: &WorldGraph, _tuning: &TuningConfig) -> bool {
        !living_with_role(graph, NpcRole::Outlaw).is_empty()
            || graph.pressure(PressureKind::WarTension) >= 30.0
    }

    fn find_targets(&self, graph: &WorldGraph) -> Vec<String> {
        open_colonies(graph)
    }

    fn expand(&self, graph: &WorldGraph, target: &str, dice: &mut Dice) -> Option<GrowthBatch> {
        let colony = graph.entity(target)?;
        let hero_name = names::person(dice);
        let mut relationships = vec![LinkSpec {
            kind: RelationKind::ResidentOf,
            src: LinkEnd::New(0),
            dst: LinkEnd::Existing(target.to_string()),
        }];

        let local_outlaws = graph
            .residents_of(target)
            .into_iter()
            .filter(|e| {
                matches!(
                    e.class,
                    EntityClass::Npc {
                        role: NpcRole::Outlaw,
                        status: NpcStatus::Alive,
                    }
                )
            })
            .map(|e| e.id.clone())
            .collect::<Vec<_>>();
        if let Some(outlaw) = dice.pick(&local_outlaws) {
            relationships.push(LinkSpec {
                kind: RelationKind::RivalOf,
                src: LinkEnd::New(0),
                dst: LinkEnd::Existing(outlaw.clone()),
            });
        }

        Some(GrowthBatch {
            entities: vec![NewEntity {
                name: hero_name.clone(),
                description: format!("A champion sworn to the defense of {}", colony.name),
                class: EntityClass::Npc {
                    role: NpcRole::Hero,
                    status: NpcStatus::Alive,
                },
                prominence: Prominence::Recognized,
                tags: BTreeSet::new(),
            }],
            relationships,
            description: format!("{} takes up arms in {}", hero_name, colony.name),
        })
    }
}
