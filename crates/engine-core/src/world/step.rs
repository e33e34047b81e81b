//! The epoch loop: era selection, growth, simulation ticks, pressures,
//! consolidation, integrity validation.

use std::collections::BTreeSet;

use serde_json::json;

use contracts::{
    EntityClass, EntityKind, EventType, FactionCharter, FactionStatus, LocationStatus,
    LocationTerrain, PressureKind, Prominence, RelationKind, Relationship, RunMode, Snapshot,
};

use crate::era::EraRule;
use crate::graph::IntegrityError;
use crate::pressure;
use crate::rolls::Dice;

use super::{mix_state_hash, HistoryWorld};

impl HistoryWorld {
    pub fn start(&mut self) {
        if !self.status.is_complete() {
            self.status.mode = RunMode::Running;
        }
    }

    pub fn pause(&mut self) {
        self.status.mode = RunMode::Paused;
    }

    /// Run one full epoch: growth phase plus the configured simulation
    /// ticks. Returns `Ok(false)` once the run is complete. The only error
    /// is post-commit structural corruption.
    pub fn step_epoch(&mut self) -> Result<bool, IntegrityError> {
        if self.status.is_complete() {
            self.status.mode = RunMode::Paused;
            return Ok(false);
        }
        self.status.mode = RunMode::Running;
        let epoch = self.status.current_epoch;
        let era = self.eras.era_for_epoch(epoch).clone();

        // Growth tick.
        let mut tick = self.graph.advance_tick();
        self.status.current_tick = tick;
        let mut sequence_in_tick = 0_u64;
        self.push_event(
            tick,
            &mut sequence_in_tick,
            EventType::EraOpened,
            Vec::new(),
            format!("Epoch {epoch}: {} begins", era.name),
            Some(json!({ "era": era.id })),
        );
        if let Some(rule) = era.special_rule {
            self.apply_era_rule(rule, tick, &mut sequence_in_tick);
        }
        self.growth_phase(&era, tick, &mut sequence_in_tick);
        self.close_tick(tick, &mut sequence_in_tick);

        // Simulation ticks.
        for _ in 0..self.config.ticks_per_epoch {
            if self.graph.tick() >= self.config.max_ticks {
                break;
            }
            tick = self.graph.advance_tick();
            self.status.current_tick = tick;
            sequence_in_tick = 0;
            for idx in 0..self.systems.len() {
                let (system_id, batch) = {
                    let system = &self.systems[idx];
                    let modifier = era.system_modifier(system.id());
                    let mut dice = Dice::for_stream(
                        self.config.seed,
                        tick,
                        &format!("system:{:?}", system.id()),
                    );
                    (
                        system.id(),
                        system.apply(&self.graph, modifier, &self.config.tuning, &mut dice),
                    )
                };
                self.commit_system_batch(system_id, batch, tick, &mut sequence_in_tick);
            }
            self.close_tick(tick, &mut sequence_in_tick);
        }

        self.consolidate(tick, &mut sequence_in_tick);
        self.status.current_epoch += 1;
        self.graph.validate(&self.matrix)?;

        if self.status.is_complete() {
            self.push_event(
                tick,
                &mut sequence_in_tick,
                EventType::RunCompleted,
                Vec::new(),
                format!(
                    "The chronicle closes after {} epochs and {} ticks",
                    self.status.current_epoch, tick
                ),
                Some(json!({
                    "entities": self.graph.entity_count(),
                    "relationships": self.graph.relationships().len(),
                })),
            );
            self.status.mode = RunMode::Paused;
        }
        Ok(true)
    }

    /// Run every remaining epoch and return the final snapshot.
    pub fn run(&mut self) -> Result<Snapshot, IntegrityError> {
        self.start();
        while self.step_epoch()? {}
        Ok(self.snapshot_for_current_tick())
    }

    /// Per-tick close-out: pressures update and the state hash absorbs the
    /// tick.
    fn close_tick(&mut self, tick: u64, sequence_in_tick: &mut u64) {
        pressure::update_all(&mut self.graph, &self.pressure_catalog);
        self.push_event(
            tick,
            sequence_in_tick,
            EventType::PressureUpdated,
            Vec::new(),
            format!("Pressures recomputed at tick {tick}"),
            Some(json!(self.graph.pressures())),
        );
        self.state_hash = mix_state_hash(self.state_hash, tick, *sequence_in_tick);
    }

    /// Era special rules mutate the graph directly, once, at epoch open.
    fn apply_era_rule(&mut self, rule: EraRule, tick: u64, sequence_in_tick: &mut u64) {
        match rule {
            EraRule::BorderInvasion => {
                let invader = self
                    .graph
                    .entities()
                    .find(|e| e.kind() == EntityKind::Faction && e.has_tag("invader"))
                    .map(|e| e.id.clone());
                let invader = match invader {
                    Some(id) => id,
                    None => {
                        let id = self.graph.allocate_id(EntityKind::Faction);
                        // The allocator minted this id; insertion cannot
                        // collide.
                        let _ = self.graph.insert_entity(contracts::Entity {
                            id: id.clone(),
                            name: "The Ashen Host".to_string(),
                            description: "A horde out of the burned lands beyond the border"
                                .to_string(),
                            class: EntityClass::Faction {
                                charter: FactionCharter::Syndicate,
                                status: FactionStatus::Active,
                            },
                            prominence: Prominence::Renowned,
                            tags: BTreeSet::from(["invader".to_string()]),
                            created_at_tick: tick,
                            updated_at_tick: tick,
                        });
                        id
                    }
                };
                let defenders = self
                    .graph
                    .active_factions()
                    .into_iter()
                    .map(|f| f.id.clone())
                    .filter(|id| *id != invader)
                    .filter(|id| !self.graph.has_edge_between(id, &invader, RelationKind::EnemyOf))
                    .collect::<Vec<_>>();
                for defender in &defenders {
                    self.graph.push_relationship(Relationship {
                        kind: RelationKind::EnemyOf,
                        src: defender.clone(),
                        dst: invader.clone(),
                        formed_at_tick: tick,
                    });
                }
                self.graph.nudge_pressure(PressureKind::WarTension, 15.0);
                self.push_event(
                    tick,
                    sequence_in_tick,
                    EventType::EraRuleApplied,
                    vec![invader],
                    "The Ashen Host crosses the border and the factions close ranks against it"
                        .to_string(),
                    Some(json!({ "defenders": defenders.len() })),
                );
            }
            EraRule::Rebuilding => {
                let recovering = self
                    .graph
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
                    .collect::<Vec<_>>();
                for id in &recovering {
                    if let Some(entry) = self.graph.entity_mut(id) {
                        if let EntityClass::Location { terrain, .. } = entry.class {
                            entry.class = EntityClass::Location {
                                terrain,
                                status: LocationStatus::Stable,
                            };
                            entry.updated_at_tick = tick;
                        }
                    }
                }
                self.graph.nudge_pressure(PressureKind::ResourceScarcity, -10.0);
                self.push_event(
                    tick,
                    sequence_in_tick,
                    EventType::EraRuleApplied,
                    recovering.clone(),
                    format!("{} colonies steady themselves in the rebuilding", recovering.len()),
                    None,
                );
            }
        }
    }

    /// Step 5 of the epoch: entities with no relationships for longer than
    /// the grace window lose prominence, and at the bottom of the scale they
    /// pass into their kind's terminal status. Nothing is ever deleted.
    fn consolidate(&mut self, tick: u64, sequence_in_tick: &mut u64) {
        let grace = self.config.tuning.isolation_grace_ticks;
        if grace == 0 {
            return;
        }
        let idle = self
            .graph
            .entities()
            .filter(|e| !e.class.is_terminal())
            .filter(|e| tick.saturating_sub(e.updated_at_tick) >= grace)
            .filter(|e| self.graph.relationship_count(&e.id) == 0)
            .map(|e| (e.id.clone(), e.name.clone(), e.prominence, e.class))
            .collect::<Vec<_>>();

        for (id, name, prominence, class) in idle {
            if prominence != Prominence::Forgotten {
                let next = prominence.lowered();
                if let Some(entry) = self.graph.entity_mut(&id) {
                    entry.prominence = next;
                    entry.updated_at_tick = tick;
                }
                self.push_event(
                    tick,
                    sequence_in_tick,
                    EventType::ProminenceChanged,
                    vec![id],
                    format!("{name}, long unremarked, slips toward obscurity"),
                    None,
                );
            } else {
                let retired = class.retired();
                if let Some(entry) = self.graph.entity_mut(&id) {
                    entry.class = retired;
                    entry.updated_at_tick = tick;
                }
                self.push_event(
                    tick,
                    sequence_in_tick,
                    EventType::EntityRetired,
                    vec![id],
                    format!("{name} passes out of the chronicle, {}", retired.status_label()),
                    None,
                );
            }
        }
    }
}
