//! v1 cross-boundary contracts for the history engine, its host drivers, and
//! the downstream authoring/enrichment consumers that read snapshots.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub mod graph;
pub mod serde_u64_string;

pub use graph::*;

pub const SCHEMA_VERSION_V1: &str = "1.0";

// ---------------------------------------------------------------------------
// Catalog identifiers
// ---------------------------------------------------------------------------

/// Growth templates in the default registry.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    ColonyFounding,
    MigrantArrival,
    FactionFounding,
    SuccessionCrisis,
    OutlawEmergence,
    HeroEmergence,
    CharterDeclaration,
    RelicDiscovery,
}

/// Simulation systems, in their fixed per-tick execution order.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum SystemId {
    RelationshipFormation,
    ConflictContagion,
    ResourceFlow,
    CulturalDrift,
    ProminenceEvolution,
    AllianceFormation,
}

/// The five temporal phases of the default era catalog.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum EraId {
    Expansion,
    Conflict,
    Innovation,
    Invasion,
    Reconstruction,
}

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Tuning constants for templates and systems. Each value mirrors an inline
/// literal of the source design; whether they are load-bearing is unresolved,
/// so all of them are overridable here rather than hardcoded. Probabilities
/// are basis points (10_000 = certain).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TuningConfig {
    /// Bond (follower/rival) chance for co-located, same-faction NPCs.
    pub bond_chance_bps: u32,
    /// Enmity chance for co-located NPCs of different factions.
    pub enmity_chance_bps: u32,
    /// Romance chance for co-located NPCs.
    pub romance_chance_bps: u32,
    /// Chance an ally inherits an existing hostility.
    pub contagion_chance_bps: u32,
    /// Chance two factions with a common adversary ally.
    pub alliance_chance_bps: u32,
    /// Chance a disconnected colony pair drifts apart culturally.
    pub divergence_chance_bps: u32,
    /// Chance a connected, trait-deficient colony pair converges.
    pub convergence_chance_bps: u32,
    /// Chance a colony status flips when a resource-ratio threshold is hit.
    pub status_flip_chance_bps: u32,
    /// Residual chance an under-connected entity loses prominence.
    pub prominence_drop_chance_bps: u32,
    /// Cooldown windows, in ticks, per throttled relationship kind.
    pub bond_cooldown_ticks: u64,
    pub enmity_cooldown_ticks: u64,
    pub romance_cooldown_ticks: u64,
    /// Resource-to-resident ratio thresholds, in basis points.
    pub scarcity_low_ratio_bps: u32,
    pub scarcity_high_ratio_bps: u32,
    /// Prominence rises when connections exceed rank times this multiplier.
    pub prominence_rise_multiplier: u32,
    /// Conflict-contagion pressure contribution is capped at this many new
    /// hostile edges per tick.
    pub contagion_pressure_cap: u32,
    /// Resource-scarcity pressure gating the outlaw-emergence template.
    pub outlaw_scarcity_threshold: f64,
    /// Ticks an entity may stay relationship-less before consolidation
    /// demotes it.
    pub isolation_grace_ticks: u64,
    /// Colony-founding refuses to apply at or beyond this many live colonies.
    pub max_colonies: usize,
}

impl Default for TuningConfig {
    fn default() -> Self {
        Self {
            bond_chance_bps: 3_000,
            enmity_chance_bps: 4_000,
            romance_chance_bps: 1_000,
            contagion_chance_bps: 3_000,
            alliance_chance_bps: 5_000,
            divergence_chance_bps: 3_000,
            convergence_chance_bps: 3_000,
            status_flip_chance_bps: 5_000,
            prominence_drop_chance_bps: 5_000,
            bond_cooldown_ticks: 5,
            enmity_cooldown_ticks: 8,
            romance_cooldown_ticks: 15,
            scarcity_low_ratio_bps: 3_000,
            scarcity_high_ratio_bps: 7_000,
            prominence_rise_multiplier: 3,
            contagion_pressure_cap: 3,
            outlaw_scarcity_threshold: 40.0,
            isolation_grace_ticks: 24,
            max_colonies: 5,
        }
    }
}

/// Full configuration for one generation run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunConfig {
    pub schema_version: String,
    pub run_id: String,
    #[serde(with = "serde_u64_string")]
    pub seed: u64,
    /// Epochs to simulate; each epoch is one growth phase plus
    /// `ticks_per_epoch` simulation ticks under a single era.
    pub epochs: u32,
    /// Successful template applications budgeted per growth phase.
    pub templates_per_epoch: u32,
    pub ticks_per_epoch: u32,
    /// Hard safety limit; the run stops here even if epochs remain.
    pub max_ticks: u64,
    /// Growth stops adding entities of a kind once its population reaches the
    /// target. Kinds without an entry are unbounded.
    #[serde(default)]
    pub target_entity_count: BTreeMap<EntityKind, usize>,
    /// Per-kind duplicate-edge policy; kinds without an entry are idempotent.
    #[serde(default)]
    pub duplicate_policy: BTreeMap<RelationKind, DuplicatePolicy>,
    #[serde(default)]
    pub tuning: TuningConfig,
    pub notes: Option<String>,
}

impl RunConfig {
    /// Population target for a kind; `None` means unbounded.
    pub fn target_for(&self, kind: EntityKind) -> Option<usize> {
        self.target_entity_count.get(&kind).copied()
    }

    pub fn policy_for(&self, kind: RelationKind) -> DuplicatePolicy {
        self.duplicate_policy.get(&kind).copied().unwrap_or_default()
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        let mut target_entity_count = BTreeMap::new();
        target_entity_count.insert(EntityKind::Npc, 96);
        target_entity_count.insert(EntityKind::Location, 28);
        target_entity_count.insert(EntityKind::Faction, 22);
        target_entity_count.insert(EntityKind::Rules, 14);
        target_entity_count.insert(EntityKind::Abilities, 14);
        Self {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: "run_local_001".to_string(),
            seed: 1337,
            epochs: 20,
            templates_per_epoch: 4,
            ticks_per_epoch: 6,
            max_ticks: 400,
            target_entity_count,
            duplicate_policy: BTreeMap::new(),
            tuning: TuningConfig::default(),
            notes: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Run status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    Running,
    Paused,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunStatus {
    pub schema_version: String,
    pub run_id: String,
    pub current_tick: u64,
    pub current_epoch: u32,
    pub epochs: u32,
    pub max_ticks: u64,
    pub mode: RunMode,
}

impl RunStatus {
    pub fn is_complete(&self) -> bool {
        self.current_epoch >= self.epochs || self.current_tick >= self.max_ticks
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "run_id={} epoch={}/{} tick={}/{} mode={:?}",
            self.run_id, self.current_epoch, self.epochs, self.current_tick, self.max_ticks,
            self.mode
        )
    }
}

// ---------------------------------------------------------------------------
// Event log
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    EraOpened,
    EraRuleApplied,
    TemplateApplied,
    TemplateAborted,
    SystemApplied,
    RelationshipFormed,
    StatusChanged,
    ProminenceChanged,
    TagAdded,
    PressureUpdated,
    EntityRetired,
    RunCompleted,
}

/// One entry of the run's human-readable history, totally ordered by
/// `(tick, sequence_in_tick)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EngineEvent {
    pub event_id: String,
    pub tick: u64,
    pub epoch: u32,
    pub sequence_in_tick: u64,
    pub event_type: EventType,
    pub subject_ids: Vec<String>,
    pub description: String,
    pub payload: Option<Value>,
}

// ---------------------------------------------------------------------------
// Diagnostics
// ---------------------------------------------------------------------------

/// Why a proposed mutation was rejected before commit.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    SchemaViolation,
    UnknownEndpoint,
    UnresolvedPlaceholder,
    TagCapReached,
}

/// Non-fatal rejection record for the run report. Rejections degrade
/// gracefully; only post-commit structural corruption aborts a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Diagnostic {
    pub tick: u64,
    pub source: String,
    pub reason: RejectReason,
    pub detail: String,
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// An entity as exposed to consumers, with its touching relationships
/// denormalized in.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityView {
    #[serde(flatten)]
    pub entity: Entity,
    pub links: Vec<Relationship>,
}

/// The engine's sole output contract: the final graph plus bookkeeping.
/// The authoring UI renders and edits it; the enrichment pipeline reads
/// entities from it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    pub schema_version: String,
    pub run_id: String,
    pub tick: u64,
    pub epoch: u32,
    pub entities: Vec<EntityView>,
    pub relationships: Vec<Relationship>,
    pub pressures: BTreeMap<PressureKind, f64>,
    #[serde(with = "serde_u64_string")]
    pub state_hash: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_schema_v1() {
        let config = RunConfig::default();
        assert_eq!(config.schema_version, SCHEMA_VERSION_V1);
        assert_eq!(config.tuning.max_colonies, 5);
        assert_eq!(config.policy_for(RelationKind::EnemyOf), DuplicatePolicy::Idempotent);
    }

    #[test]
    fn config_round_trips_through_json() {
        let config = RunConfig::default();
        let encoded = serde_json::to_string(&config).expect("encode");
        let decoded: RunConfig = serde_json::from_str(&encoded).expect("decode");
        assert_eq!(config, decoded);
    }

    #[test]
    fn status_reports_completion() {
        let status = RunStatus {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: "run_test".to_string(),
            current_tick: 10,
            current_epoch: 3,
            epochs: 3,
            max_ticks: 100,
            mode: RunMode::Paused,
        };
        assert!(status.is_complete());
    }
}
