//! Structural invariants that must hold after every committed epoch, checked
//! against full runs.

use std::collections::BTreeMap;

use contracts::{RelationKind, RunConfig, Snapshot, MAX_ENTITY_TAGS};
use engine_core::schema::default_matrix;
use engine_core::HistoryWorld;

fn run_to_completion(seed: u64, epochs: u32) -> (HistoryWorld, Snapshot) {
    let config = RunConfig {
        run_id: format!("hardening_{seed}"),
        seed,
        epochs,
        templates_per_epoch: 3,
        ticks_per_epoch: 4,
        ..RunConfig::default()
    };
    let mut world = HistoryWorld::new(config);
    let snapshot = world.run().expect("run to completion");
    (world, snapshot)
}

#[test]
fn committed_relationships_resolve_and_are_schema_legal() {
    let (world, snapshot) = run_to_completion(1337, 10);
    let matrix = default_matrix();
    let by_id = snapshot
        .entities
        .iter()
        .map(|view| (view.entity.id.as_str(), &view.entity))
        .collect::<BTreeMap<_, _>>();

    for relationship in &snapshot.relationships {
        let src = by_id
            .get(relationship.src.as_str())
            .unwrap_or_else(|| panic!("orphan src {}", relationship.src));
        let dst = by_id
            .get(relationship.dst.as_str())
            .unwrap_or_else(|| panic!("orphan dst {}", relationship.dst));
        assert!(
            matrix.allows(src.kind(), dst.kind(), relationship.kind),
            "illegal committed edge {} {} -> {}",
            relationship.kind,
            relationship.src,
            relationship.dst
        );
    }
    assert!(world.graph().validate(&matrix).is_ok());
}

#[test]
fn tag_cap_and_pressure_bounds_hold() {
    let (_, snapshot) = run_to_completion(2026, 10);
    for view in &snapshot.entities {
        assert!(
            view.entity.tags.len() <= MAX_ENTITY_TAGS,
            "{} exceeds the tag cap",
            view.entity.id
        );
    }
    for (kind, value) in &snapshot.pressures {
        assert!(
            (0.0..=100.0).contains(value),
            "pressure {kind:?} escaped its bounds at {value}"
        );
    }
}

#[test]
fn throttled_kinds_respect_their_cooldown_windows() {
    let (world, snapshot) = run_to_completion(4242, 12);
    let tuning = &world.config().tuning;
    let window_for = |kind: RelationKind| match kind {
        RelationKind::FollowerOf | RelationKind::RivalOf | RelationKind::AlliedWith => {
            tuning.bond_cooldown_ticks
        }
        RelationKind::EnemyOf => tuning.enmity_cooldown_ticks,
        RelationKind::LoverOf => tuning.romance_cooldown_ticks,
        _ => 0,
    };

    // Era special rules mutate the graph directly and bypass the throttle
    // ledger; the invasion hook turns every faction against the invader at
    // once.
    let invader = snapshot
        .entities
        .iter()
        .find(|view| view.entity.has_tag("invader"))
        .map(|view| view.entity.id.clone());

    let mut formed: BTreeMap<(String, RelationKind), Vec<u64>> = BTreeMap::new();
    for relationship in &snapshot.relationships {
        if window_for(relationship.kind) == 0 {
            continue;
        }
        if invader
            .as_ref()
            .map(|id| relationship.touches(id))
            .unwrap_or(false)
        {
            continue;
        }
        for endpoint in [&relationship.src, &relationship.dst] {
            formed
                .entry((endpoint.clone(), relationship.kind))
                .or_default()
                .push(relationship.formed_at_tick);
        }
    }

    for ((entity, kind), mut ticks) in formed {
        // Seed relationships predate the throttle ledger.
        ticks.retain(|tick| *tick > 0);
        ticks.sort_unstable();
        let window = window_for(kind);
        for pair in ticks.windows(2) {
            assert!(
                pair[1] - pair[0] >= window,
                "{entity} formed two {kind} edges {} ticks apart (window {window})",
                pair[1] - pair[0]
            );
        }
    }
}

#[test]
fn idempotent_policy_prevents_duplicate_edges() {
    let (_, snapshot) = run_to_completion(7777, 12);
    let mut seen = BTreeMap::new();
    for relationship in &snapshot.relationships {
        let key = if relationship.kind.is_symmetric() {
            let (a, b) = if relationship.src <= relationship.dst {
                (relationship.src.clone(), relationship.dst.clone())
            } else {
                (relationship.dst.clone(), relationship.src.clone())
            };
            (a, b, relationship.kind)
        } else {
            (
                relationship.src.clone(),
                relationship.dst.clone(),
                relationship.kind,
            )
        };
        let count = seen.entry(key.clone()).or_insert(0_u32);
        *count += 1;
        assert_eq!(
            *count, 1,
            "duplicate {} edge between {} and {}",
            key.2, key.0, key.1
        );
    }
}

#[test]
fn rejections_degrade_gracefully() {
    let (world, _) = run_to_completion(31337, 10);
    // Whatever was rejected along the way became a diagnostic, never an
    // abort: the run completed and the final graph is structurally sound.
    assert!(world.status().is_complete());
    for diagnostic in world.diagnostics() {
        assert!(!diagnostic.detail.is_empty());
    }
}
