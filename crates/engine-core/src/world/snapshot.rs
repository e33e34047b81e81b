//! Snapshot assembly: the engine's sole output contract.

use contracts::{EntityView, Snapshot, SCHEMA_VERSION_V1};

use super::HistoryWorld;

impl HistoryWorld {
    /// Materialize the current graph for external consumers. Per-entity
    /// `links` are denormalized here, and only here; the graph itself keeps
    /// a single relationship list.
    pub fn snapshot_for_current_tick(&self) -> Snapshot {
        let entities = self
            .graph
            .entities()
            .map(|entity| EntityView {
                entity: entity.clone(),
                links: self
                    .graph
                    .relationships()
                    .iter()
                    .filter(|r| r.touches(&entity.id))
                    .cloned()
                    .collect(),
            })
            .collect();
        Snapshot {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: self.status.run_id.clone(),
            tick: self.graph.tick(),
            epoch: self.status.current_epoch,
            entities,
            relationships: self.graph.relationships().to_vec(),
            pressures: self.graph.pressures().clone(),
            state_hash: self.state_hash,
        }
    }
}
