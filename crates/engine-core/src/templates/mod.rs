//! Growth templates: factories that synthesize new, pre-connected entity
//! clusters during an epoch's growth phase.
//!
//! A template is a pure descriptor. It never writes to the graph; it returns
//! a [`GrowthBatch`] whose relationships may reference its own not-yet-created
//! entities through [`contracts::LinkEnd::New`] indices. The orchestrator
//! assigns real ids and resolves those references in one pass, committing the
//! whole batch or none of it.

mod factions;
mod lore;
mod people;
mod settlement;

pub use factions::FactionFounding;
pub use lore::{CharterDeclaration, RelicDiscovery};
pub use people::{HeroEmergence, OutlawEmergence, SuccessionCrisis};
pub use settlement::{ColonyFounding, MigrantArrival};

use contracts::{EntityClass, EntityKind, GrowthBatch, LocationStatus, LocationTerrain, NpcRole,
    NpcStatus, TemplateId, TuningConfig};

use crate::graph::WorldGraph;
use crate::rolls::Dice;

pub trait GrowthTemplate {
    fn id(&self) -> TemplateId;

    fn base_weight(&self) -> f64 {
        1.0
    }

    /// The kind this template primarily grows; the orchestrator stops
    /// applying it once that kind's population target is reached.
    fn primary_kind(&self) -> EntityKind;

    fn can_apply(&self, graph: &WorldGraph, tuning: &TuningConfig) -> bool;

    fn find_targets(&self, graph: &WorldGraph) -> Vec<String>;

    /// Expand against one chosen target. `None` means the target turned out
    /// to be invalid on closer inspection; the orchestrator skips the
    /// template for this cycle.
    fn expand(&self, graph: &WorldGraph, target: &str, dice: &mut Dice) -> Option<GrowthBatch>;
}

/// The default template catalog, in registry order. The growth phase
/// shuffles this per epoch for variety.
pub fn default_registry() -> Vec<Box<dyn GrowthTemplate>> {
    vec![
        Box::new(ColonyFounding),
        Box::new(MigrantArrival),
        Box::new(FactionFounding),
        Box::new(SuccessionCrisis),
        Box::new(OutlawEmergence),
        Box::new(HeroEmergence),
        Box::new(CharterDeclaration),
        Box::new(RelicDiscovery),
    ]
}

/// Colonies healthy enough to sponsor or absorb growth.
pub(crate) fn open_colonies(graph: &WorldGraph) -> Vec<String> {
    graph
        .entities()
        .filter(|e| {
            matches!(
                e.class,
                EntityClass::Location {
                    terrain: LocationTerrain::Colony,
                    status: LocationStatus::Thriving | LocationStatus::Stable,
                }
            )
        })
        .map(|e| e.id.clone())
        .collect()
}

pub(crate) fn living_with_role(graph: &WorldGraph, role: NpcRole) -> Vec<String> {
    graph
        .entities()
        .filter(|e| {
            matches!(
                e.class,
                EntityClass::Npc {
                    role: r,
                    status: NpcStatus::Alive,
                } if r == role
            )
        })
        .map(|e| e.id.clone())
        .collect()
}

/// Deterministic name pools. Collisions are harmless; identity lives in ids.
pub(crate) mod names {
    use super::Dice;

    const SETTLEMENT_ROOTS: [&str; 10] = [
        "Thorn", "Ember", "Gale", "Moss", "Briar", "Fen", "Harrow", "Dun", "Wick", "Ash",
    ];
    const SETTLEMENT_ENDS: [&str; 10] = [
        "hollow", "stead", "reach", "ford", "moor", "haven", "barrow", "fell", "march", "gate",
    ];
    const GIVEN_NAMES: [&str; 16] = [
        "Aldric", "Berthe", "Corwin", "Dela", "Edmun", "Fay", "Garrick", "Hesper", "Ivo", "Joss",
        "Kerra", "Maren", "Oswin", "Petra", "Rosalind", "Sten",
    ];
    const FAMILY_NAMES: [&str; 12] = [
        "Ashdown", "Crowe", "Dunmore", "Fernsby", "Grange", "Hale", "Larkspur", "Marsh",
        "Nettle", "Oakhart", "Reed", "Thistlewood",
    ];
    const FACTION_EPITHETS: [&str; 6] = ["Gilded", "Silent", "Crimson", "Wandering", "Iron", "Pale"];
    const FACTION_BODIES: [&str; 6] = [
        "Compact", "Brotherhood", "Circle", "Wardens", "Covenant", "League",
    ];
    const CHARTER_SUBJECTS: [&str; 6] = ["Salt", "Harvest", "Ledger", "Boundary", "Tithe", "Market"];
    const CHARTER_FORMS: [&str; 4] = ["Accord", "Charter", "Edict", "Covenant"];
    const RELIC_MATERIALS: [&str; 5] = [
        "Emberglass", "Coldiron", "Whalebone", "Starfall", "Riverjade",
    ];
    const RELIC_SHAPES: [&str; 5] = ["Crown", "Blade", "Loom", "Chalice", "Horn"];

    fn pair(dice: &mut Dice, left: &[&str], right: &[&str], sep: &str) -> String {
        let a = dice.pick(left).copied().unwrap_or_default();
        let b = dice.pick(right).copied().unwrap_or_default();
        format!("{a}{sep}{b}")
    }

    pub fn settlement(dice: &mut Dice) -> String {
        pair(dice, &SETTLEMENT_ROOTS, &SETTLEMENT_ENDS, "")
    }

    pub fn person(dice: &mut Dice) -> String {
        pair(dice, &GIVEN_NAMES, &FAMILY_NAMES, " ")
    }

    pub fn faction(dice: &mut Dice) -> String {
        format!("The {}", pair(dice, &FACTION_EPITHETS, &FACTION_BODIES, " "))
    }

    pub fn charter(dice: &mut Dice) -> String {
        format!("The {}", pair(dice, &CHARTER_SUBJECTS, &CHARTER_FORMS, " "))
    }

    pub fn relic(dice: &mut Dice) -> String {
        format!("The {}", pair(dice, &RELIC_MATERIALS, &RELIC_SHAPES, " "))
    }
}
