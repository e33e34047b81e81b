//! The graph store: single source of truth for entities, relationships,
//! pressures, the tick counter, and the cooldown ledger.
//!
//! Templates and systems only ever hold `&WorldGraph` and answer queries
//! against it; every write goes through the orchestrator's commit path.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use contracts::{
    CompatibilityMatrix, Entity, EntityClass, EntityKind, FactionStatus, LocationStatus,
    LocationTerrain, NpcStatus, PressureKind, RelationKind, Relationship, RelationProposal,
    MAX_ENTITY_TAGS,
};

/// Structural corruption. Any of these surviving a commit aborts the run;
/// everything milder degrades into a diagnostic instead.
#[derive(Debug, Clone, PartialEq)]
pub enum IntegrityError {
    DuplicateEntityId(String),
    OrphanRelationship {
        kind: RelationKind,
        src: String,
        dst: String,
    },
    IllegalRelationship {
        kind: RelationKind,
        src: String,
        dst: String,
    },
    TagOverflow(String),
    PressureOutOfRange {
        kind: PressureKind,
        value: f64,
    },
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateEntityId(id) => write!(f, "duplicate entity id {id}"),
            Self::OrphanRelationship { kind, src, dst } => {
                write!(f, "relationship {kind} {src} -> {dst} references a missing entity")
            }
            Self::IllegalRelationship { kind, src, dst } => {
                write!(f, "relationship {kind} {src} -> {dst} is illegal for its kind pair")
            }
            Self::TagOverflow(id) => write!(f, "entity {id} exceeds the tag cap"),
            Self::PressureOutOfRange { kind, value } => {
                write!(f, "pressure {kind:?} out of range at {value}")
            }
        }
    }
}

/// Edge direction relative to a queried entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// The mutable world state.
#[derive(Debug, Clone, Default)]
pub struct WorldGraph {
    entities: BTreeMap<String, Entity>,
    relationships: Vec<Relationship>,
    pressures: BTreeMap<PressureKind, f64>,
    tick: u64,
    /// `(entity id, relationship kind)` -> last tick that entity formed an
    /// edge of that kind. Read by the throttling guards.
    cooldowns: BTreeMap<(String, RelationKind), u64>,
    next_serial: BTreeMap<EntityKind, u64>,
}

impl WorldGraph {
    pub fn new() -> Self {
        Self::default()
    }

    // -- identity and writes (orchestrator / seed construction only) --------

    /// Mint a fresh id for `kind`. Serials only ever increase, so ids are
    /// never reused even after an entity reaches a terminal status.
    pub(crate) fn allocate_id(&mut self, kind: EntityKind) -> String {
        let serial = self.next_serial.entry(kind).or_insert(0);
        *serial += 1;
        format!("{}_{:03}", kind.id_prefix(), serial)
    }

    pub fn insert_entity(&mut self, entity: Entity) -> Result<(), IntegrityError> {
        if entity.tags.len() > MAX_ENTITY_TAGS {
            return Err(IntegrityError::TagOverflow(entity.id));
        }
        if self.entities.contains_key(&entity.id) {
            return Err(IntegrityError::DuplicateEntityId(entity.id));
        }
        self.entities.insert(entity.id.clone(), entity);
        Ok(())
    }

    pub fn push_relationship(&mut self, relationship: Relationship) {
        self.relationships.push(relationship);
    }

    pub(crate) fn entity_mut(&mut self, id: &str) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    pub(crate) fn advance_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    pub(crate) fn set_pressure(&mut self, kind: PressureKind, value: f64) {
        self.pressures.insert(kind, value.clamp(0.0, 100.0));
    }

    pub(crate) fn nudge_pressure(&mut self, kind: PressureKind, delta: f64) {
        let current = self.pressure(kind);
        self.set_pressure(kind, current + delta);
    }

    pub(crate) fn record_cooldown(&mut self, id: &str, kind: RelationKind, tick: u64) {
        self.cooldowns.insert((id.to_string(), kind), tick);
    }

    // -- scalar state -------------------------------------------------------

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn pressure(&self, kind: PressureKind) -> f64 {
        self.pressures.get(&kind).copied().unwrap_or(0.0)
    }

    pub fn pressures(&self) -> &BTreeMap<PressureKind, f64> {
        &self.pressures
    }

    /// Whether `id` formed an edge of `kind` within the last `window` ticks.
    pub fn cooldown_active(&self, id: &str, kind: RelationKind, now: u64, window: u64) -> bool {
        if window == 0 {
            return false;
        }
        match self.cooldowns.get(&(id.to_string(), kind)) {
            Some(last) => now.saturating_sub(*last) < window,
            None => false,
        }
    }

    // -- entity queries -----------------------------------------------------

    pub fn entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    pub fn count_of_kind(&self, kind: EntityKind) -> usize {
        self.entities.values().filter(|e| e.kind() == kind).count()
    }

    pub fn of_kind(&self, kind: EntityKind) -> Vec<&Entity> {
        self.entities.values().filter(|e| e.kind() == kind).collect()
    }

    pub fn living_npcs(&self) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| {
                matches!(
                    e.class,
                    EntityClass::Npc {
                        status: NpcStatus::Alive,
                        ..
                    }
                )
            })
            .collect()
    }

    /// Colony locations that have not been abandoned.
    pub fn colonies(&self) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| {
                matches!(
                    e.class,
                    EntityClass::Location {
                        terrain: LocationTerrain::Colony,
                        status,
                    } if status != LocationStatus::Abandoned
                )
            })
            .collect()
    }

    pub fn active_factions(&self) -> Vec<&Entity> {
        self.entities
            .values()
            .filter(|e| {
                matches!(
                    e.class,
                    EntityClass::Faction {
                        status: FactionStatus::Active,
                        ..
                    }
                )
            })
            .collect()
    }

    // -- relationship queries -----------------------------------------------

    pub fn relationships(&self) -> &[Relationship] {
        &self.relationships
    }

    pub fn relationship_count(&self, id: &str) -> usize {
        self.relationships.iter().filter(|r| r.touches(id)).count()
    }

    /// Directed existence check, optionally filtered by kind.
    pub fn has_relationship(&self, src: &str, dst: &str, kind: Option<RelationKind>) -> bool {
        self.relationships.iter().any(|r| {
            r.src == src && r.dst == dst && kind.map(|k| r.kind == k).unwrap_or(true)
        })
    }

    /// Undirected existence check for one kind.
    pub fn has_edge_between(&self, a: &str, b: &str, kind: RelationKind) -> bool {
        self.has_relationship(a, b, Some(kind)) || self.has_relationship(b, a, Some(kind))
    }

    /// Whether committing `proposal` would duplicate an existing edge, with
    /// symmetric kinds checked in both orientations.
    pub fn duplicate_exists(&self, proposal: &RelationProposal) -> bool {
        if proposal.kind.is_symmetric() {
            self.has_edge_between(&proposal.src, &proposal.dst, proposal.kind)
        } else {
            self.has_relationship(&proposal.src, &proposal.dst, Some(proposal.kind))
        }
    }

    /// Ids related to `id` through edges of `kind` in the given direction.
    pub fn related_ids(&self, id: &str, kind: RelationKind, direction: Direction) -> Vec<String> {
        self.relationships
            .iter()
            .filter(|r| r.kind == kind)
            .filter_map(|r| match direction {
                Direction::Outgoing if r.src == id => Some(r.dst.clone()),
                Direction::Incoming if r.dst == id => Some(r.src.clone()),
                _ => None,
            })
            .collect()
    }

    /// Living NPCs resident at a location.
    pub fn residents_of(&self, location_id: &str) -> Vec<&Entity> {
        self.related_ids(location_id, RelationKind::ResidentOf, Direction::Incoming)
            .into_iter()
            .filter_map(|id| self.entities.get(&id))
            .filter(|e| {
                matches!(
                    e.class,
                    EntityClass::Npc {
                        status: NpcStatus::Alive,
                        ..
                    }
                )
            })
            .collect()
    }

    /// Where an NPC lives, if anywhere.
    pub fn home_of(&self, npc_id: &str) -> Option<String> {
        self.related_ids(npc_id, RelationKind::ResidentOf, Direction::Outgoing)
            .into_iter()
            .next()
    }

    /// Factions an NPC belongs to.
    pub fn factions_of(&self, npc_id: &str) -> Vec<String> {
        self.related_ids(npc_id, RelationKind::MemberOf, Direction::Outgoing)
    }

    /// The living leader of a location, if one exists.
    pub fn leader_of_location(&self, location_id: &str) -> Option<String> {
        self.related_ids(location_id, RelationKind::LeaderOf, Direction::Incoming)
            .into_iter()
            .find(|id| {
                matches!(
                    self.entities.get(id).map(|e| &e.class),
                    Some(EntityClass::Npc {
                        status: NpcStatus::Alive,
                        ..
                    })
                )
            })
    }

    /// Locations reachable from `location_id` by a single connection, in
    /// either orientation.
    pub fn connected_locations(&self, location_id: &str) -> Vec<String> {
        let mut out = self.related_ids(location_id, RelationKind::ConnectedTo, Direction::Outgoing);
        out.extend(self.related_ids(
            location_id,
            RelationKind::ConnectedTo,
            Direction::Incoming,
        ));
        out.sort();
        out.dedup();
        out
    }

    /// Allegiance neighborhood of an entity: followers, fellow and allied
    /// factions, and members. Used by conflict contagion.
    pub fn allies_of(&self, id: &str) -> Vec<String> {
        let mut allies = BTreeSet::new();
        for follower in self.related_ids(id, RelationKind::FollowerOf, Direction::Incoming) {
            allies.insert(follower);
        }
        for member in self.related_ids(id, RelationKind::MemberOf, Direction::Incoming) {
            allies.insert(member);
        }
        for faction in self.related_ids(id, RelationKind::MemberOf, Direction::Outgoing) {
            allies.insert(faction);
        }
        for ally in self.related_ids(id, RelationKind::AlliedWith, Direction::Outgoing) {
            allies.insert(ally);
        }
        for ally in self.related_ids(id, RelationKind::AlliedWith, Direction::Incoming) {
            allies.insert(ally);
        }
        allies.remove(id);
        allies.into_iter().collect()
    }

    // -- integrity ----------------------------------------------------------

    /// Full structural check. Run after every committed epoch; any failure
    /// here means the commit path let corruption through and the run must
    /// abort.
    pub fn validate(&self, matrix: &CompatibilityMatrix) -> Result<(), IntegrityError> {
        for relationship in &self.relationships {
            let src = self.entities.get(&relationship.src).ok_or_else(|| {
                IntegrityError::OrphanRelationship {
                    kind: relationship.kind,
                    src: relationship.src.clone(),
                    dst: relationship.dst.clone(),
                }
            })?;
            let dst = self.entities.get(&relationship.dst).ok_or_else(|| {
                IntegrityError::OrphanRelationship {
                    kind: relationship.kind,
                    src: relationship.src.clone(),
                    dst: relationship.dst.clone(),
                }
            })?;
            if !matrix.allows(src.kind(), dst.kind(), relationship.kind) {
                return Err(IntegrityError::IllegalRelationship {
                    kind: relationship.kind,
                    src: relationship.src.clone(),
                    dst: relationship.dst.clone(),
                });
            }
        }
        for entity in self.entities.values() {
            if entity.tags.len() > MAX_ENTITY_TAGS {
                return Err(IntegrityError::TagOverflow(entity.id.clone()));
            }
        }
        for (kind, value) in &self.pressures {
            if !(0.0..=100.0).contains(value) {
                return Err(IntegrityError::PressureOutOfRange {
                    kind: *kind,
                    value: *value,
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{NpcRole, Prominence};
    use std::collections::BTreeSet;

    fn npc(graph: &mut WorldGraph, name: &str) -> String {
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
    }

    #[test]
    fn allocated_ids_are_unique_and_monotone() {
        let mut graph = WorldGraph::new();
        let first = npc(&mut graph, "a");
        let second = npc(&mut graph, "b");
        assert_ne!(first, second);
        assert_eq!(first, "npc_001");
        assert_eq!(second, "npc_002");
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut graph = WorldGraph::new();
        let id = npc(&mut graph, "a");
        let copy = graph.entity(&id).cloned().expect("entity");
        assert_eq!(
            graph.insert_entity(copy),
            Err(IntegrityError::DuplicateEntityId(id))
        );
    }

    #[test]
    fn symmetric_duplicate_detection_ignores_orientation() {
        let mut graph = WorldGraph::new();
        let a = npc(&mut graph, "a");
        let b = npc(&mut graph, "b");
        graph.push_relationship(Relationship {
            kind: RelationKind::RivalOf,
            src: a.clone(),
            dst: b.clone(),
            formed_at_tick: 1,
        });
        assert!(graph.duplicate_exists(&RelationProposal {
            kind: RelationKind::RivalOf,
            src: b.clone(),
            dst: a.clone(),
        }));
        assert!(!graph.duplicate_exists(&RelationProposal {
            kind: RelationKind::FollowerOf,
            src: b,
            dst: a,
        }));
    }

    #[test]
    fn cooldown_window_arithmetic() {
        let mut graph = WorldGraph::new();
        let id = npc(&mut graph, "a");
        graph.record_cooldown(&id, RelationKind::LoverOf, 10);
        assert!(graph.cooldown_active(&id, RelationKind::LoverOf, 24, 15));
        assert!(!graph.cooldown_active(&id, RelationKind::LoverOf, 25, 15));
        assert!(!graph.cooldown_active(&id, RelationKind::LoverOf, 24, 0));
    }

    #[test]
    fn validate_catches_orphans() {
        let mut graph = WorldGraph::new();
        let a = npc(&mut graph, "a");
        graph.push_relationship(Relationship {
            kind: RelationKind::FollowerOf,
            src: a,
            dst: "npc_999".to_string(),
            formed_at_tick: 0,
        });
        let matrix = crate::schema::default_matrix();
        assert!(matches!(
            graph.validate(&matrix),
            Err(IntegrityError::OrphanRelationship { .. })
        ));
    }
}
