use super::*;

use std::collections::BTreeSet;

use contracts::{
    Entity, EntityClass, EntityKind, EventType, GrowthBatch, LinkEnd, LinkSpec, LocationStatus,
    LocationTerrain, NewEntity, Prominence, RejectReason, RelationKind, RelationProposal,
    RunConfig, SystemBatch, SystemId, TemplateId,
};

use crate::templates::{ColonyFounding, GrowthTemplate};

fn small_config(epochs: u32) -> RunConfig {
    RunConfig {
        run_id: format!("run_test_{epochs}"),
        epochs,
        templates_per_epoch: 3,
        ticks_per_epoch: 4,
        ..RunConfig::default()
    }
}

#[test]
fn default_world_starts_valid() {
    let world = HistoryWorld::new(RunConfig::default());
    assert!(world.graph().validate(&world.matrix).is_ok());
    assert_eq!(world.graph().tick(), 0);
    let snapshot = world.snapshot_for_current_tick();
    assert_eq!(snapshot.entities.len(), world.graph().entity_count());
    assert!(snapshot.entities.len() >= 10);
}

#[test]
fn zero_epoch_run_changes_nothing() {
    let mut world = HistoryWorld::new(small_config(0));
    let before_entities = world.graph().entity_count();
    let before_relationships = world.graph().relationships().len();
    let snapshot = world.run().expect("run");
    assert_eq!(snapshot.tick, 0);
    assert_eq!(snapshot.entities.len(), before_entities);
    assert_eq!(snapshot.relationships.len(), before_relationships);
    assert!(world.events().is_empty());
}

#[test]
fn multi_epoch_run_grows_and_stays_within_bounds() {
    let mut world = HistoryWorld::new(small_config(6));
    let seed_count = world.graph().entity_count();
    let snapshot = world.run().expect("run");
    assert!(snapshot.entities.len() > seed_count);
    assert!(snapshot.tick > 0);
    assert!(!world.events().is_empty());
    for (_, value) in &snapshot.pressures {
        assert!((0.0..=100.0).contains(value));
    }
    // Growth respects the per-kind population targets.
    for (kind, target) in &world.config().target_entity_count {
        // Templates stop at the target; the invasion hook may add one
        // faction past it.
        let slack = usize::from(*kind == EntityKind::Faction);
        assert!(world.graph().count_of_kind(*kind) <= *target + slack);
    }
}

#[test]
fn entity_count_never_decreases_across_epochs() {
    let mut world = HistoryWorld::new(small_config(5));
    world.start();
    let mut previous = world.graph().entity_count();
    while world.step_epoch().expect("epoch") {
        let current = world.graph().entity_count();
        assert!(current >= previous);
        previous = current;
    }
}

#[test]
fn colony_cap_gates_the_founding_template() {
    let mut world = HistoryWorld::new(RunConfig::default());
    while world.graph.colonies().len() < world.config.tuning.max_colonies {
        let id = world.graph.allocate_id(EntityKind::Location);
        world
            .graph
            .insert_entity(Entity {
                id,
                name: "Fillstead".to_string(),
                description: String::new(),
                class: EntityClass::Location {
                    terrain: LocationTerrain::Colony,
                    status: LocationStatus::Stable,
                },
                prominence: Prominence::Marginal,
                tags: BTreeSet::new(),
                created_at_tick: 0,
                updated_at_tick: 0,
            })
            .expect("insert");
    }
    assert!(!ColonyFounding.can_apply(&world.graph, &world.config.tuning));
}

#[test]
fn invasion_epoch_raises_the_invader() {
    let mut world = HistoryWorld::new(small_config(4));
    world.start();
    for _ in 0..4 {
        world.step_epoch().expect("epoch");
    }
    let invader = world
        .graph()
        .entities()
        .find(|e| e.kind() == EntityKind::Faction && e.has_tag("invader"))
        .expect("invader faction");
    // Every pre-invasion active faction stands against it.
    assert!(world
        .graph()
        .relationships()
        .iter()
        .any(|r| r.kind == RelationKind::EnemyOf && r.dst == invader.id));
}

#[test]
fn illegal_system_proposal_becomes_a_diagnostic() {
    let mut world = HistoryWorld::new(RunConfig::default());
    let colony = world.graph().colonies()[0].id.clone();
    let npc = world.graph().living_npcs()[0].id.clone();
    let before = world.graph().relationships().len();

    let mut sequence = 0_u64;
    world.commit_system_batch(
        SystemId::RelationshipFormation,
        SystemBatch {
            relationships: vec![RelationProposal {
                kind: RelationKind::ResidentOf,
                src: colony,
                dst: npc,
            }],
            ..SystemBatch::default()
        },
        1,
        &mut sequence,
    );

    assert_eq!(world.graph().relationships().len(), before);
    assert!(world
        .diagnostics()
        .iter()
        .any(|d| d.reason == RejectReason::SchemaViolation));
    assert!(world.graph().validate(&world.matrix).is_ok());
}

#[test]
fn unresolved_local_reference_discards_the_whole_batch() {
    let mut world = HistoryWorld::new(RunConfig::default());
    let before = world.graph().entity_count();
    let mut sequence = 0_u64;
    let committed = world.commit_growth_batch(
        TemplateId::MigrantArrival,
        GrowthBatch {
            entities: vec![NewEntity {
                name: "Lost Soul".to_string(),
                description: String::new(),
                class: EntityClass::Npc {
                    role: contracts::NpcRole::Merchant,
                    status: contracts::NpcStatus::Alive,
                },
                prominence: Prominence::Marginal,
                tags: BTreeSet::new(),
            }],
            relationships: vec![LinkSpec {
                kind: RelationKind::FollowerOf,
                src: LinkEnd::New(0),
                dst: LinkEnd::New(7),
            }],
            description: "a doomed arrival".to_string(),
        },
        1,
        &mut sequence,
    );

    assert!(!committed);
    assert_eq!(world.graph().entity_count(), before);
    assert!(world
        .diagnostics()
        .iter()
        .any(|d| d.reason == RejectReason::UnresolvedPlaceholder));
    assert!(world
        .events()
        .iter()
        .any(|e| e.event_type == EventType::TemplateAborted));
}

#[test]
fn cooldown_blocks_same_kind_edges_in_the_window() {
    let mut world = HistoryWorld::new(RunConfig::default());
    let npcs = world
        .graph()
        .living_npcs()
        .iter()
        .map(|e| e.id.clone())
        .collect::<Vec<_>>();
    let (a, b, c) = (npcs[0].clone(), npcs[1].clone(), npcs[2].clone());

    let mut sequence = 0_u64;
    let first = world.commit_relationship(
        RelationProposal {
            kind: RelationKind::LoverOf,
            src: a.clone(),
            dst: b,
        },
        1,
        &mut sequence,
        "test",
    );
    let second = world.commit_relationship(
        RelationProposal {
            kind: RelationKind::LoverOf,
            src: a,
            dst: c,
        },
        1,
        &mut sequence,
        "test",
    );
    assert!(first);
    assert!(!second);
}

#[test]
fn identical_configs_replay_identically() {
    let mut first = HistoryWorld::new(small_config(3));
    let mut second = HistoryWorld::new(small_config(3));
    let snap_a = first.run().expect("first run");
    let snap_b = second.run().expect("second run");
    assert_eq!(snap_a, snap_b);
    assert_eq!(first.state_hash(), second.state_hash());
}
