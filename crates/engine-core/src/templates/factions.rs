//! Faction growth: unaffiliated residents of a colony band together.

use std::collections::BTreeSet;

use contracts::{
    EntityClass, EntityKind, FactionCharter, FactionStatus, GrowthBatch, LinkEnd, LinkSpec,
    NewEntity, Prominence, RelationKind, TemplateId, TuningConfig,
};

use super::{names, GrowthTemplate};
use crate::graph::{Direction, WorldGraph};
use crate::rolls::Dice;

const FOUNDER_COUNT: usize = 2;

pub struct FactionFounding;

impl FactionFounding {
    /// Living residents of the colony who belong to no faction yet.
    fn unaffiliated_residents(graph: &WorldGraph, colony: &str) -> Vec<String> {
        graph
            .residents_of(colony)
            .into_iter()
            .filter(|e| graph.factions_of(&e.id).is_empty())
            .map(|e| e.id.clone())
            .collect()
    }
}

impl GrowthTemplate for FactionFounding {
    fn id(&self) -> TemplateId {
        TemplateId::FactionFounding
    }

    fn base_weight(&self) -> f64 {
        0.9
    }

    fn primary_kind(&self) -> EntityKind {
        EntityKind::Faction
    }

    fn can_apply(&self, graph: &WorldGraph, _tuning: &TuningConfig) -> bool {
        !self.find_targets(graph).is_empty()
    }

    fn find_targets(&self, graph: &WorldGraph) -> Vec<String> {
        graph
            .colonies()
            .into_iter()
            .filter(|c| Self::unaffiliated_residents(graph, &c.id).len() >= FOUNDER_COUNT)
            .map(|c| c.id.clone())
            .collect()
    }

    fn expand(&self, graph: &WorldGraph, target: &str, dice: &mut Dice) -> Option<GrowthBatch> {
        let colony = graph.entity(target)?;
        let mut founders = Self::unaffiliated_residents(graph, target);
        if founders.len() < FOUNDER_COUNT {
            return None;
        }
        dice.shuffle(&mut founders);
        founders.truncate(FOUNDER_COUNT);

        let charter = *dice
            .pick(&[
                FactionCharter::Guild,
                FactionCharter::Order,
                FactionCharter::Syndicate,
            ])
            .unwrap_or(&FactionCharter::Guild);
        let faction_name = names::faction(dice);

        let mut relationships = founders
            .iter()
            .map(|founder| LinkSpec {
                kind: RelationKind::MemberOf,
                src: LinkEnd::Existing(founder.clone()),
                dst: LinkEnd::New(0),
            })
            .collect::<Vec<_>>();

        // A new faction may seize the colony outright, but never contests an
        // established controller.
        let uncontested = graph
            .related_ids(target, RelationKind::Controls, Direction::Incoming)
            .is_empty();
        if uncontested && dice.chance_bps(5_000) {
            relationships.push(LinkSpec {
                kind: RelationKind::Controls,
                src: LinkEnd::New(0),
                dst: LinkEnd::Existing(target.to_string()),
            });
        }

        Some(GrowthBatch {
            entities: vec![NewEntity {
                name: faction_name.clone(),
                description: format!("A fellowship founded in {}", colony.name),
                class: EntityClass::Faction {
                    charter,
                    status: FactionStatus::Active,
                },
                prominence: Prominence::Marginal,
                tags: BTreeSet::new(),
            }],
            relationships,
            description: format!("{} is founded in {}", faction_name, colony.name),
        })
    }
}
