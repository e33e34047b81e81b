//! Deterministic procedural world-history generation.
//!
//! The engine grows a small seed knowledge graph into a dense,
//! internally-consistent fictional history: growth templates synthesize
//! connected entity clusters, simulation systems evolve relationships and
//! attributes tick by tick, pressures accumulate as bounded background
//! scalars, and eras reweight all of it across epochs.
//!
//! Everything runs single-threaded and synchronously; the only interface is
//! an in-memory snapshot plus an ordered event log. Templates and systems
//! propose mutation batches against a read-only graph, and the orchestrator
//! in [`world`] is the single writer.

pub mod era;
pub mod graph;
pub mod pressure;
pub mod rolls;
pub mod schema;
pub mod systems;
pub mod templates;
pub mod world;

pub use graph::{Direction, IntegrityError, WorldGraph};
pub use world::HistoryWorld;
