//! World-graph data model: entities, relationships, the compatibility matrix,
//! and the mutation batches that growth templates and simulation systems
//! propose to the orchestrator.
//!
//! Subtypes and statuses are closed, kind-scoped enums so every branch that
//! inspects them matches exhaustively; a new variant fails to compile until
//! every call site handles it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Hard cap on the number of tags any entity may carry.
pub const MAX_ENTITY_TAGS: usize = 5;

// ---------------------------------------------------------------------------
// Entity kinds, subtypes, statuses
// ---------------------------------------------------------------------------

/// The closed set of entity kinds the engine knows about.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Npc,
    Location,
    Faction,
    Rules,
    Abilities,
}

impl EntityKind {
    /// Prefix used when allocating entity ids of this kind.
    pub fn id_prefix(&self) -> &'static str {
        match self {
            Self::Npc => "npc",
            Self::Location => "loc",
            Self::Faction => "fac",
            Self::Rules => "rul",
            Self::Abilities => "abl",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NpcRole {
    Merchant,
    Hero,
    Mayor,
    Outlaw,
}

/// NPC life state. `Missing` and `Dead` are terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum NpcStatus {
    Alive,
    Missing,
    Dead,
}

impl NpcStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Missing | Self::Dead)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LocationTerrain {
    Colony,
    Landmark,
    Wilds,
}

/// Location prosperity. `Abandoned` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LocationStatus {
    Thriving,
    Stable,
    Declining,
    Abandoned,
}

impl LocationStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Abandoned)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FactionCharter {
    Guild,
    Order,
    Syndicate,
}

/// Faction vitality. `Disbanded` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum FactionStatus {
    Active,
    Waning,
    Disbanded,
}

impl FactionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Disbanded)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RulesScope {
    Charter,
    Edict,
    Custom,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AbilitySchool {
    Craft,
    Rite,
    Relic,
}

/// Shared status scale for rules and abilities. `Forgotten` is terminal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum LoreStatus {
    Practiced,
    Fading,
    Forgotten,
}

impl LoreStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Forgotten)
    }
}

/// Kind, subtype, and status bound together so a subtype can never be paired
/// with another kind's status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityClass {
    Npc { role: NpcRole, status: NpcStatus },
    Location { terrain: LocationTerrain, status: LocationStatus },
    Faction { charter: FactionCharter, status: FactionStatus },
    Rules { scope: RulesScope, status: LoreStatus },
    Abilities { school: AbilitySchool, status: LoreStatus },
}

impl EntityClass {
    pub fn kind(&self) -> EntityKind {
        match self {
            Self::Npc { .. } => EntityKind::Npc,
            Self::Location { .. } => EntityKind::Location,
            Self::Faction { .. } => EntityKind::Faction,
            Self::Rules { .. } => EntityKind::Rules,
            Self::Abilities { .. } => EntityKind::Abilities,
        }
    }

    /// Whether the entity has reached a terminal status for its kind.
    pub fn is_terminal(&self) -> bool {
        match self {
            Self::Npc { status, .. } => status.is_terminal(),
            Self::Location { status, .. } => status.is_terminal(),
            Self::Faction { status, .. } => status.is_terminal(),
            Self::Rules { status, .. } => status.is_terminal(),
            Self::Abilities { status, .. } => status.is_terminal(),
        }
    }

    /// The same class moved to its kind's terminal status. Entities are never
    /// hard-deleted; consolidation retires them through this transition.
    pub fn retired(&self) -> Self {
        match *self {
            Self::Npc { role, .. } => Self::Npc {
                role,
                status: NpcStatus::Missing,
            },
            Self::Location { terrain, .. } => Self::Location {
                terrain,
                status: LocationStatus::Abandoned,
            },
            Self::Faction { charter, .. } => Self::Faction {
                charter,
                status: FactionStatus::Disbanded,
            },
            Self::Rules { scope, .. } => Self::Rules {
                scope,
                status: LoreStatus::Forgotten,
            },
            Self::Abilities { school, .. } => Self::Abilities {
                school,
                status: LoreStatus::Forgotten,
            },
        }
    }

    /// Human-readable status label for event descriptions.
    pub fn status_label(&self) -> &'static str {
        match self {
            Self::Npc { status, .. } => match status {
                NpcStatus::Alive => "alive",
                NpcStatus::Missing => "missing",
                NpcStatus::Dead => "dead",
            },
            Self::Location { status, .. } => match status {
                LocationStatus::Thriving => "thriving",
                LocationStatus::Stable => "stable",
                LocationStatus::Declining => "declining",
                LocationStatus::Abandoned => "abandoned",
            },
            Self::Faction { status, .. } => match status {
                FactionStatus::Active => "active",
                FactionStatus::Waning => "waning",
                FactionStatus::Disbanded => "disbanded",
            },
            Self::Rules { status, .. } | Self::Abilities { status, .. } => match status {
                LoreStatus::Practiced => "practiced",
                LoreStatus::Fading => "fading",
                LoreStatus::Forgotten => "forgotten",
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Prominence
// ---------------------------------------------------------------------------

/// Ordinal fame scale. Declaration order gives the ordering
/// `Forgotten < Marginal < Recognized < Renowned < Mythic`.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum Prominence {
    Forgotten,
    Marginal,
    Recognized,
    Renowned,
    Mythic,
}

impl Prominence {
    pub fn rank(&self) -> u32 {
        match self {
            Self::Forgotten => 0,
            Self::Marginal => 1,
            Self::Recognized => 2,
            Self::Renowned => 3,
            Self::Mythic => 4,
        }
    }

    /// One step up, saturating at `Mythic`.
    pub fn raised(&self) -> Self {
        match self {
            Self::Forgotten => Self::Marginal,
            Self::Marginal => Self::Recognized,
            Self::Recognized => Self::Renowned,
            Self::Renowned | Self::Mythic => Self::Mythic,
        }
    }

    /// One step down, saturating at `Forgotten`.
    pub fn lowered(&self) -> Self {
        match self {
            Self::Mythic => Self::Renowned,
            Self::Renowned => Self::Recognized,
            Self::Recognized => Self::Marginal,
            Self::Marginal | Self::Forgotten => Self::Forgotten,
        }
    }
}

// ---------------------------------------------------------------------------
// Entity & Relationship
// ---------------------------------------------------------------------------

/// A world object: character, place, faction, rule, or capability.
///
/// Relationships are not mirrored here; the graph's relationship list is the
/// single source of truth and per-entity links are denormalized into the
/// snapshot only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Entity {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub class: EntityClass,
    pub prominence: Prominence,
    pub tags: BTreeSet<String>,
    pub created_at_tick: u64,
    pub updated_at_tick: u64,
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        self.class.kind()
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }
}

/// The closed set of relationship kinds the compatibility matrix may legalize.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    FollowerOf,
    RivalOf,
    EnemyOf,
    LoverOf,
    MemberOf,
    ResidentOf,
    LeaderOf,
    AlliedWith,
    Controls,
    ConnectedTo,
    Upholds,
    Wields,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FollowerOf => "follower_of",
            Self::RivalOf => "rival_of",
            Self::EnemyOf => "enemy_of",
            Self::LoverOf => "lover_of",
            Self::MemberOf => "member_of",
            Self::ResidentOf => "resident_of",
            Self::LeaderOf => "leader_of",
            Self::AlliedWith => "allied_with",
            Self::Controls => "controls",
            Self::ConnectedTo => "connected_to",
            Self::Upholds => "upholds",
            Self::Wields => "wields",
        }
    }

    /// Kinds whose meaning does not depend on edge direction; duplicate
    /// detection treats them as undirected.
    pub fn is_symmetric(&self) -> bool {
        matches!(
            self,
            Self::RivalOf | Self::EnemyOf | Self::LoverOf | Self::AlliedWith | Self::ConnectedTo
        )
    }

    pub fn is_hostile(&self) -> bool {
        matches!(self, Self::EnemyOf)
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge between two entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Relationship {
    pub kind: RelationKind,
    pub src: String,
    pub dst: String,
    pub formed_at_tick: u64,
}

impl Relationship {
    pub fn touches(&self, id: &str) -> bool {
        self.src == id || self.dst == id
    }
}

// ---------------------------------------------------------------------------
// Compatibility matrix
// ---------------------------------------------------------------------------

/// One legality row: the relationship kinds permitted from `src_kind`
/// entities to `dst_kind` entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationRule {
    pub src_kind: EntityKind,
    pub dst_kind: EntityKind,
    pub kinds: Vec<RelationKind>,
}

/// External, read-only schema declaring which relationship kinds may connect
/// which entity-kind pairs. Relationships outside this set must never be
/// committed.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CompatibilityMatrix {
    pub rules: Vec<RelationRule>,
}

impl CompatibilityMatrix {
    pub fn new(rules: Vec<RelationRule>) -> Self {
        Self { rules }
    }

    pub fn allows(&self, src: EntityKind, dst: EntityKind, kind: RelationKind) -> bool {
        self.rules
            .iter()
            .filter(|rule| rule.src_kind == src && rule.dst_kind == dst)
            .any(|rule| rule.kinds.contains(&kind))
    }

    pub fn legal_kinds(&self, src: EntityKind, dst: EntityKind) -> Vec<RelationKind> {
        let mut kinds = Vec::new();
        for rule in &self.rules {
            if rule.src_kind == src && rule.dst_kind == dst {
                for kind in &rule.kinds {
                    if !kinds.contains(kind) {
                        kinds.push(*kind);
                    }
                }
            }
        }
        kinds
    }
}

// ---------------------------------------------------------------------------
// Pressures
// ---------------------------------------------------------------------------

/// Named background scalars accumulated from graph state, clamped to [0,100].
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum PressureKind {
    ResourceScarcity,
    CulturalTension,
    WarTension,
    Stability,
}

// ---------------------------------------------------------------------------
// Mutation batches
// ---------------------------------------------------------------------------

/// Template-local reference to a relationship endpoint: either an entity that
/// already exists in the graph, or the Nth entity in the template's own
/// output list. The orchestrator resolves `New` indices in one explicit pass
/// once real ids are assigned.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LinkEnd {
    Existing(String),
    New(usize),
}

/// A relationship proposed by a growth template, possibly referencing
/// entities the same batch is about to create.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LinkSpec {
    pub kind: RelationKind,
    pub src: LinkEnd,
    pub dst: LinkEnd,
}

/// An entity a growth template wants created. Ids and tick stamps are
/// assigned by the orchestrator at commit time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewEntity {
    pub name: String,
    pub description: String,
    #[serde(flatten)]
    pub class: EntityClass,
    pub prominence: Prominence,
    pub tags: BTreeSet<String>,
}

/// Everything one template application wants to add, committed all-or-nothing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GrowthBatch {
    pub entities: Vec<NewEntity>,
    pub relationships: Vec<LinkSpec>,
    pub description: String,
}

/// A relationship proposed by a simulation system between existing entities.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RelationProposal {
    pub kind: RelationKind,
    pub src: String,
    pub dst: String,
}

/// A single attribute mutation. Prominence moves are structurally one step,
/// which is how the one-step-per-tick invariant is enforced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub enum EntityPatch {
    SetNpcStatus(NpcStatus),
    SetLocationStatus(LocationStatus),
    SetFactionStatus(FactionStatus),
    SetLoreStatus(LoreStatus),
    RaiseProminence,
    LowerProminence,
    AddTag(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityChange {
    pub entity_id: String,
    pub patch: EntityPatch,
}

/// One simulation system's proposed mutations for one tick. Systems never
/// write to the graph; the orchestrator commits the batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SystemBatch {
    pub relationships: Vec<RelationProposal>,
    pub changes: Vec<EntityChange>,
    pub pressure_deltas: BTreeMap<PressureKind, f64>,
    pub notes: Vec<String>,
}

impl SystemBatch {
    pub fn is_empty(&self) -> bool {
        self.relationships.is_empty() && self.changes.is_empty() && self.pressure_deltas.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Duplicate-edge policy
// ---------------------------------------------------------------------------

/// Whether a second edge of the same kind between the same pair is dropped
/// (`Idempotent`) or appended (`Cumulative`). Configured per relationship
/// kind; the default for every kind is idempotent.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    Idempotent,
    Cumulative,
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self::Idempotent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prominence_steps_saturate() {
        assert_eq!(Prominence::Mythic.raised(), Prominence::Mythic);
        assert_eq!(Prominence::Forgotten.lowered(), Prominence::Forgotten);
        assert_eq!(Prominence::Marginal.raised(), Prominence::Recognized);
        assert!(Prominence::Forgotten < Prominence::Mythic);
    }

    #[test]
    fn retired_class_is_terminal() {
        let class = EntityClass::Npc {
            role: NpcRole::Mayor,
            status: NpcStatus::Alive,
        };
        assert!(!class.is_terminal());
        assert!(class.retired().is_terminal());
        assert_eq!(class.retired().kind(), EntityKind::Npc);
    }

    #[test]
    fn matrix_rejects_unlisted_pairs() {
        let matrix = CompatibilityMatrix::new(vec![RelationRule {
            src_kind: EntityKind::Npc,
            dst_kind: EntityKind::Location,
            kinds: vec![RelationKind::ResidentOf],
        }]);
        assert!(matrix.allows(EntityKind::Npc, EntityKind::Location, RelationKind::ResidentOf));
        assert!(!matrix.allows(EntityKind::Npc, EntityKind::Location, RelationKind::LeaderOf));
        assert!(!matrix.allows(EntityKind::Location, EntityKind::Npc, RelationKind::ResidentOf));
    }

    #[test]
    fn entity_class_serializes_with_kind_tag() {
        let class = EntityClass::Location {
            terrain: LocationTerrain::Colony,
            status: LocationStatus::Stable,
        };
        let value = serde_json::to_value(class).expect("serialize");
        assert_eq!(value["kind"], "location");
        assert_eq!(value["terrain"], "colony");
        assert_eq!(value["status"], "stable");
    }
}
