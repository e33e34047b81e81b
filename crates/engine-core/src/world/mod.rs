//! The orchestrator.
//!
//! [`HistoryWorld`] owns the single mutable [`WorldGraph`] plus every
//! catalog, and is the only writer. Templates and systems propose mutation
//! batches against a read-only snapshot; the commit path in this module
//! applies them, records diagnostics for whatever it rejects, and keeps the
//! event log and state hash current.

mod commit;
mod events;
mod growth;
mod init;
mod snapshot;
mod step;
#[cfg(test)]
mod tests;

pub use init::default_seed_graph;

use contracts::{CompatibilityMatrix, Diagnostic, EngineEvent, RunConfig, RunStatus};

use crate::era::EraCatalog;
use crate::graph::WorldGraph;
use crate::pressure::PressureDef;
use crate::systems::SimulationSystem;
use crate::templates::GrowthTemplate;

pub struct HistoryWorld {
    pub(crate) config: RunConfig,
    pub(crate) status: RunStatus,
    pub(crate) graph: WorldGraph,
    pub(crate) matrix: CompatibilityMatrix,
    pub(crate) eras: EraCatalog,
    pub(crate) pressure_catalog: Vec<PressureDef>,
    pub(crate) templates: Vec<Box<dyn GrowthTemplate>>,
    pub(crate) systems: Vec<Box<dyn SimulationSystem>>,
    pub(crate) event_log: Vec<EngineEvent>,
    pub(crate) diagnostics: Vec<Diagnostic>,
    pub(crate) state_hash: u64,
}

impl HistoryWorld {
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn status(&self) -> &RunStatus {
        &self.status
    }

    pub fn run_id(&self) -> &str {
        &self.status.run_id
    }

    pub fn graph(&self) -> &WorldGraph {
        &self.graph
    }

    pub fn events(&self) -> &[EngineEvent] {
        &self.event_log
    }

    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Rolling hash over everything committed so far. Two runs with equal
    /// inputs end with equal hashes; a single diverging event breaks it.
    pub fn state_hash(&self) -> u64 {
        self.state_hash
    }
}

pub(super) fn mix_state_hash(state_hash: u64, tick: u64, sequence_in_tick: u64) -> u64 {
    let mut hash = state_hash ^ tick.wrapping_mul(0x9E37_79B9_7F4A_7C15);
    hash ^= sequence_in_tick.wrapping_mul(0x517C_C1B7_2722_0A95);
    hash.rotate_left(17)
}

pub(super) fn mix_event_hash(current: u64, event_id: &str, description: &str) -> u64 {
    let mut hash = current ^ 0xA24B_1C62_5B93_2D47;
    for byte in event_id.as_bytes().iter().chain(description.as_bytes()) {
        hash = hash.rotate_left(7) ^ u64::from(*byte);
        hash = hash.wrapping_mul(0x517C_C1B7_2722_0A95);
    }
    hash
}
