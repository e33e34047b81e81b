//! Default compatibility matrix.
//!
//! The matrix is an external input; this is the catalog the default world
//! ships with. Anything absent here is illegal and will be rejected by the
//! commit path and flagged by [`crate::graph::WorldGraph::validate`].

use contracts::{CompatibilityMatrix, EntityKind, RelationKind, RelationRule};

pub fn default_matrix() -> CompatibilityMatrix {
    use EntityKind::*;
    use RelationKind::*;

    CompatibilityMatrix::new(vec![
        RelationRule {
            src_kind: Npc,
            dst_kind: Npc,
            kinds: vec![FollowerOf, RivalOf, EnemyOf, LoverOf],
        },
        RelationRule {
            src_kind: Npc,
            dst_kind: Location,
            kinds: vec![ResidentOf, LeaderOf],
        },
        RelationRule {
            src_kind: Npc,
            dst_kind: Faction,
            kinds: vec![MemberOf, EnemyOf],
        },
        RelationRule {
            src_kind: Npc,
            dst_kind: Abilities,
            kinds: vec![Wields],
        },
        RelationRule {
            src_kind: Faction,
            dst_kind: Faction,
            kinds: vec![AlliedWith, RivalOf, EnemyOf],
        },
        RelationRule {
            src_kind: Faction,
            dst_kind: Location,
            kinds: vec![Controls],
        },
        RelationRule {
            src_kind: Faction,
            dst_kind: Rules,
            kinds: vec![Upholds],
        },
        RelationRule {
            src_kind: Location,
            dst_kind: Location,
            kinds: vec![ConnectedTo],
        },
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn social_edges_are_npc_to_npc_only() {
        let matrix = default_matrix();
        assert!(matrix.allows(EntityKind::Npc, EntityKind::Npc, RelationKind::LoverOf));
        assert!(!matrix.allows(EntityKind::Faction, EntityKind::Npc, RelationKind::LoverOf));
        assert!(!matrix.allows(EntityKind::Location, EntityKind::Npc, RelationKind::ResidentOf));
    }

    #[test]
    fn hostility_spans_npc_and_faction_pairs() {
        let matrix = default_matrix();
        assert!(matrix.allows(EntityKind::Npc, EntityKind::Faction, RelationKind::EnemyOf));
        assert!(matrix.allows(EntityKind::Faction, EntityKind::Faction, RelationKind::EnemyOf));
        assert!(!matrix.allows(EntityKind::Faction, EntityKind::Npc, RelationKind::EnemyOf));
    }
}
