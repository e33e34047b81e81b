//! Pressure ledger: bounded background scalars accumulated from graph state.
//!
//! Each pressure updates once per tick as
//! `value = clamp(value + growth(graph) - decay, 0, 100)`. Growth rules are
//! pure functions of the current graph; system-proposed deltas are folded in
//! separately at batch commit, through the same clamped setter.

use contracts::{EntityClass, EntityKind, LocationStatus, LocationTerrain, PressureKind};

use crate::graph::WorldGraph;

/// One catalog entry: a pressure and its per-tick decay constant.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PressureDef {
    pub kind: PressureKind,
    pub decay: f64,
}

pub fn default_catalog() -> Vec<PressureDef> {
    vec![
        PressureDef {
            kind: PressureKind::ResourceScarcity,
            decay: 1.0,
        },
        PressureDef {
            kind: PressureKind::CulturalTension,
            decay: 0.75,
        },
        PressureDef {
            kind: PressureKind::WarTension,
            decay: 1.25,
        },
        PressureDef {
            kind: PressureKind::Stability,
            decay: 0.5,
        },
    ]
}

/// Pure per-tick growth contribution of one pressure.
pub fn growth(kind: PressureKind, graph: &WorldGraph) -> f64 {
    match kind {
        PressureKind::ResourceScarcity => 4.0 * declining_colony_count(graph) as f64,
        PressureKind::CulturalTension => {
            let divergent = divergent_colony_count(graph);
            if divergent >= 2 {
                2.0 * divergent as f64
            } else {
                0.0
            }
        }
        PressureKind::WarTension => {
            let hostile = graph
                .relationships()
                .iter()
                .filter(|r| r.kind.is_hostile())
                .filter(|r| {
                    is_faction(graph, &r.src) && is_faction(graph, &r.dst)
                })
                .count();
            (1.5 * hostile as f64).min(12.0)
        }
        PressureKind::Stability => {
            let alliances = graph
                .relationships()
                .iter()
                .filter(|r| r.kind == contracts::RelationKind::AlliedWith)
                .count();
            (1.0 * alliances as f64).min(10.0)
        }
    }
}

/// Advance every catalogued pressure by one tick.
pub(crate) fn update_all(graph: &mut WorldGraph, catalog: &[PressureDef]) {
    for def in catalog {
        let next = graph.pressure(def.kind) + growth(def.kind, graph) - def.decay;
        graph.set_pressure(def.kind, next);
    }
}

fn declining_colony_count(graph: &WorldGraph) -> usize {
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
        .count()
}

/// Colonies carrying at least one divergence tag.
fn divergent_colony_count(graph: &WorldGraph) -> usize {
    graph
        .colonies()
        .into_iter()
        .filter(|e| e.tags.iter().any(|tag| tag.starts_with("folkway:")))
        .count()
}

fn is_faction(graph: &WorldGraph, id: &str) -> bool {
    graph
        .entity(id)
        .map(|e| e.kind() == EntityKind::Faction)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{Entity, Prominence};
    use std::collections::BTreeSet;

    fn colony(graph: &mut WorldGraph, status: LocationStatus, tags: &[&str]) -> String {
        let id = graph.allocate_id(EntityKind::Location);
        graph
            .insert_entity(Entity {
                id: id.clone(),
                name: "colony".to_string(),
                description: String::new(),
                class: EntityClass::Location {
                    terrain: LocationTerrain::Colony,
                    status,
                },
                prominence: Prominence::Marginal,
                tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
                created_at_tick: 0,
                updated_at_tick: 0,
            })
            .expect("insert");
        id
    }

    #[test]
    fn scarcity_grows_with_declining_colonies() {
        let mut graph = WorldGraph::new();
        colony(&mut graph, LocationStatus::Stable, &[]);
        assert_eq!(growth(PressureKind::ResourceScarcity, &graph), 0.0);
        colony(&mut graph, LocationStatus::Declining, &[]);
        colony(&mut graph, LocationStatus::Declining, &[]);
        assert_eq!(growth(PressureKind::ResourceScarcity, &graph), 8.0);
    }

    #[test]
    fn cultural_tension_needs_multiple_divergent_centers() {
        let mut graph = WorldGraph::new();
        colony(&mut graph, LocationStatus::Stable, &["folkway:ember_rites"]);
        assert_eq!(growth(PressureKind::CulturalTension, &graph), 0.0);
        colony(&mut graph, LocationStatus::Stable, &["folkway:salt_oaths"]);
        assert_eq!(growth(PressureKind::CulturalTension, &graph), 4.0);
    }

    #[test]
    fn update_clamps_into_range() {
        let mut graph = WorldGraph::new();
        graph.set_pressure(PressureKind::WarTension, 0.5);
        update_all(&mut graph, &default_catalog());
        assert_eq!(graph.pressure(PressureKind::WarTension), 0.0);
        for _ in 0..200 {
            graph.nudge_pressure(PressureKind::Stability, 3.0);
        }
        assert!(graph.pressure(PressureKind::Stability) <= 100.0);
    }
}
