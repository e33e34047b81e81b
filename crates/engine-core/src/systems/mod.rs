//! Simulation systems: per-tick functions that propose relationship
//! additions, attribute patches, and pressure deltas from current graph
//! state.
//!
//! Systems are pure with respect to the graph. Each returns a
//! [`SystemBatch`]; the orchestrator commits one system's batch before
//! invoking the next, so later systems in the same tick observe earlier
//! systems' effects (sequential, not parallel, consistency).

mod alliances;
mod conflict;
mod culture;
mod prominence;
mod resources;
mod social;

pub use alliances::AllianceFormation;
pub use conflict::ConflictContagion;
pub use culture::CulturalDrift;
pub use prominence::ProminenceEvolution;
pub use resources::ResourceFlow;
pub use social::RelationshipFormation;

use contracts::{RelationKind, SystemBatch, SystemId, TuningConfig};

use crate::graph::WorldGraph;
use crate::rolls::Dice;

pub trait SimulationSystem {
    fn id(&self) -> SystemId;

    /// Propose one tick's mutations. `modifier` is the era's multiplier for
    /// this system; 0 disables every probabilistic effect and every
    /// effect-threshold branch.
    fn apply(
        &self,
        graph: &WorldGraph,
        modifier: f64,
        tuning: &TuningConfig,
        dice: &mut Dice,
    ) -> SystemBatch;
}

/// The fixed per-tick execution order.
pub fn default_registry() -> Vec<Box<dyn SimulationSystem>> {
    vec![
        Box::new(RelationshipFormation),
        Box::new(ConflictContagion),
        Box::new(ResourceFlow),
        Box::new(CulturalDrift),
        Box::new(ProminenceEvolution),
        Box::new(AllianceFormation),
    ]
}

/// Cooldown window for a throttled relationship kind; 0 means unthrottled.
pub(crate) fn cooldown_window(kind: RelationKind, tuning: &TuningConfig) -> u64 {
    match kind {
        RelationKind::FollowerOf | RelationKind::RivalOf | RelationKind::AlliedWith => {
            tuning.bond_cooldown_ticks
        }
        RelationKind::EnemyOf => tuning.enmity_cooldown_ticks,
        RelationKind::LoverOf => tuning.romance_cooldown_ticks,
        _ => 0,
    }
}

/// Whether either endpoint is still cooling down for `kind`.
pub(crate) fn throttled(
    graph: &WorldGraph,
    a: &str,
    b: &str,
    kind: RelationKind,
    tuning: &TuningConfig,
) -> bool {
    let window = cooldown_window(kind, tuning);
    let now = graph.tick();
    graph.cooldown_active(a, kind, now, window) || graph.cooldown_active(b, kind, now, window)
}

/// Canonical ordering for a pair, used to deduplicate symmetric proposals
/// within one batch.
pub(crate) fn pair_key(a: &str, b: &str, kind: RelationKind) -> (String, String, RelationKind) {
    if a <= b {
        (a.to_string(), b.to_string(), kind)
    } else {
        (b.to_string(), a.to_string(), kind)
    }
}

pub(crate) fn display_name(graph: &WorldGraph, id: &str) -> String {
    graph
        .entity(id)
        .map(|e| e.name.clone())
        .unwrap_or_else(|| id.to_string())
}
