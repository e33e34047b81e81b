//! Construction: assemble a world from parts, or from the default seed.

use std::collections::BTreeSet;

use contracts::{
    AbilitySchool, CompatibilityMatrix, Entity, EntityClass, EntityKind, FactionCharter,
    FactionStatus, LocationStatus, LocationTerrain, LoreStatus, NpcRole, NpcStatus, Prominence,
    RelationKind, Relationship, RulesScope, RunConfig, RunMode, RunStatus, SCHEMA_VERSION_V1,
};

use crate::era::EraCatalog;
use crate::graph::WorldGraph;
use crate::pressure::{self, PressureDef};
use crate::rolls::mix_seed;
use crate::schema::default_matrix;
use crate::systems::{self, SimulationSystem};
use crate::templates::{self, GrowthTemplate};

use super::HistoryWorld;

impl HistoryWorld {
    /// Default world: seed graph, default matrix, and the default era,
    /// pressure, template, and system catalogs.
    pub fn new(config: RunConfig) -> Self {
        Self::from_parts(
            config,
            default_seed_graph(),
            default_matrix(),
            EraCatalog::default_catalog(),
            pressure::default_catalog(),
            templates::default_registry(),
            systems::default_registry(),
        )
    }

    pub fn from_parts(
        config: RunConfig,
        mut graph: WorldGraph,
        matrix: CompatibilityMatrix,
        eras: EraCatalog,
        pressure_catalog: Vec<PressureDef>,
        templates: Vec<Box<dyn GrowthTemplate>>,
        systems: Vec<Box<dyn SimulationSystem>>,
    ) -> Self {
        // Clamp any seed pressure the host handed us and make sure every
        // catalogued pressure has an entry.
        for def in &pressure_catalog {
            let value = graph.pressure(def.kind);
            graph.set_pressure(def.kind, value);
        }
        let status = RunStatus {
            schema_version: SCHEMA_VERSION_V1.to_string(),
            run_id: config.run_id.clone(),
            current_tick: graph.tick(),
            current_epoch: 0,
            epochs: config.epochs,
            max_ticks: config.max_ticks,
            mode: RunMode::Paused,
        };
        let state_hash = mix_seed(config.seed, graph.entity_count() as u64);
        Self {
            config,
            status,
            graph,
            matrix,
            eras,
            pressure_catalog,
            templates,
            systems,
            event_log: Vec::new(),
            diagnostics: Vec::new(),
            state_hash,
        }
    }
}

/// The default seed world: two connected colonies on a modest frontier,
/// their mayors and merchants, a hero, an outlaw, two factions, a charter,
/// and a relic. Around fifteen entities, enough for every template and
/// system to find a foothold.
pub fn default_seed_graph() -> WorldGraph {
    let mut graph = WorldGraph::new();

    let add = |graph: &mut WorldGraph,
                   kind: EntityKind,
                   name: &str,
                   description: &str,
                   class: EntityClass,
                   prominence: Prominence,
                   tags: &[&str]| {
        let id = graph.allocate_id(kind);
        let entity = Entity {
            id: id.clone(),
            name: name.to_string(),
            description: description.to_string(),
            class,
            prominence,
            tags: tags.iter().map(|t| t.to_string()).collect::<BTreeSet<_>>(),
            created_at_tick: 0,
            updated_at_tick: 0,
        };
        // Seed ids come from the allocator, so insertion cannot collide.
        let _ = graph.insert_entity(entity);
        id
    };

    let thornwick = add(
        &mut graph,
        EntityKind::Location,
        "Thornwick",
        "An inland colony of charcoal burners and drovers",
        EntityClass::Location {
            terrain: LocationTerrain::Colony,
            status: LocationStatus::Stable,
        },
        Prominence::Recognized,
        &[],
    );
    let gullhaven = add(
        &mut graph,
        EntityKind::Location,
        "Gullhaven",
        "A harbor colony grown fat on the coastal trade",
        EntityClass::Location {
            terrain: LocationTerrain::Colony,
            status: LocationStatus::Thriving,
        },
        Prominence::Recognized,
        &[],
    );
    let quarry = add(
        &mut graph,
        EntityKind::Location,
        "Ironvein Quarry",
        "Terraced stoneworks above Thornwick",
        EntityClass::Location {
            terrain: LocationTerrain::Landmark,
            status: LocationStatus::Stable,
        },
        Prominence::Marginal,
        &["resource"],
    );
    let shoals = add(
        &mut graph,
        EntityKind::Location,
        "Kelpwater Shoals",
        "Rich fishing grounds off Gullhaven",
        EntityClass::Location {
            terrain: LocationTerrain::Landmark,
            status: LocationStatus::Stable,
        },
        Prominence::Marginal,
        &["resource"],
    );
    let bracken = add(
        &mut graph,
        EntityKind::Location,
        "The Bracken",
        "Trackless fern country between the colonies",
        EntityClass::Location {
            terrain: LocationTerrain::Wilds,
            status: LocationStatus::Stable,
        },
        Prominence::Marginal,
        &[],
    );

    let edlyn = add(
        &mut graph,
        EntityKind::Npc,
        "Edlyn Marsh",
        "Mayor of Thornwick",
        EntityClass::Npc {
            role: NpcRole::Mayor,
            status: NpcStatus::Alive,
        },
        Prominence::Recognized,
        &[],
    );
    let corvin = add(
        &mut graph,
        EntityKind::Npc,
        "Corvin Hale",
        "Mayor of Gullhaven",
        EntityClass::Npc {
            role: NpcRole::Mayor,
            status: NpcStatus::Alive,
        },
        Prominence::Recognized,
        &[],
    );
    let tamsin = add(
        &mut graph,
        EntityKind::Npc,
        "Tamsin Reed",
        "A charcoal trader of Thornwick",
        EntityClass::Npc {
            role: NpcRole::Merchant,
            status: NpcStatus::Alive,
        },
        Prominence::Marginal,
        &[],
    );
    let orrin = add(
        &mut graph,
        EntityKind::Npc,
        "Orrin Veck",
        "A fish broker of Gullhaven",
        EntityClass::Npc {
            role: NpcRole::Merchant,
            status: NpcStatus::Alive,
        },
        Prominence::Marginal,
        &[],
    );
    let sera = add(
        &mut graph,
        EntityKind::Npc,
        "Sera Blackbriar",
        "A warden-errant of some renown",
        EntityClass::Npc {
            role: NpcRole::Hero,
            status: NpcStatus::Alive,
        },
        Prominence::Renowned,
        &[],
    );
    let jeb = add(
        &mut graph,
        EntityKind::Npc,
        "Jeb Crowe",
        "A highwayman working the Thornwick road",
        EntityClass::Npc {
            role: NpcRole::Outlaw,
            status: NpcStatus::Alive,
        },
        Prominence::Marginal,
        &["wanted"],
    );

    let compact = add(
        &mut graph,
        EntityKind::Faction,
        "The Gilded Compact",
        "A merchant combine spanning both colonies",
        EntityClass::Faction {
            charter: FactionCharter::Guild,
            status: FactionStatus::Active,
        },
        Prominence::Recognized,
        &[],
    );
    let wardens = add(
        &mut graph,
        EntityKind::Faction,
        "The Vale Wardens",
        "An order sworn to keep the roads",
        EntityClass::Faction {
            charter: FactionCharter::Order,
            status: FactionStatus::Active,
        },
        Prominence::Recognized,
        &[],
    );

    let accord = add(
        &mut graph,
        EntityKind::Rules,
        "The Boundary Accord",
        "The wardens' written law of road and march",
        EntityClass::Rules {
            scope: RulesScope::Charter,
            status: LoreStatus::Practiced,
        },
        Prominence::Marginal,
        &[],
    );
    let blade = add(
        &mut graph,
        EntityKind::Abilities,
        "The Emberglass Blade",
        "A relic sword carried out of the old country",
        EntityClass::Abilities {
            school: AbilitySchool::Relic,
            status: LoreStatus::Practiced,
        },
        Prominence::Recognized,
        &["relic"],
    );

    let link = |graph: &mut WorldGraph, kind: RelationKind, src: &str, dst: &str| {
        graph.push_relationship(Relationship {
            kind,
            src: src.to_string(),
            dst: dst.to_string(),
            formed_at_tick: 0,
        });
    };

    link(&mut graph, RelationKind::ConnectedTo, &thornwick, &gullhaven);
    link(&mut graph, RelationKind::ConnectedTo, &quarry, &thornwick);
    link(&mut graph, RelationKind::ConnectedTo, &shoals, &gullhaven);
    link(&mut graph, RelationKind::ConnectedTo, &bracken, &thornwick);

    link(&mut graph, RelationKind::ResidentOf, &edlyn, &thornwick);
    link(&mut graph, RelationKind::LeaderOf, &edlyn, &thornwick);
    link(&mut graph, RelationKind::ResidentOf, &corvin, &gullhaven);
    link(&mut graph, RelationKind::LeaderOf, &corvin, &gullhaven);
    link(&mut graph, RelationKind::ResidentOf, &tamsin, &thornwick);
    link(&mut graph, RelationKind::ResidentOf, &orrin, &gullhaven);
    link(&mut graph, RelationKind::ResidentOf, &sera, &gullhaven);
    link(&mut graph, RelationKind::ResidentOf, &jeb, &thornwick);

    link(&mut graph, RelationKind::MemberOf, &tamsin, &compact);
    link(&mut graph, RelationKind::MemberOf, &orrin, &compact);
    link(&mut graph, RelationKind::MemberOf, &sera, &wardens);
    link(&mut graph, RelationKind::MemberOf, &corvin, &wardens);

    link(&mut graph, RelationKind::Controls, &compact, &gullhaven);
    link(&mut graph, RelationKind::Upholds, &wardens, &accord);
    link(&mut graph, RelationKind::Wields, &sera, &blade);
    link(&mut graph, RelationKind::EnemyOf, &jeb, &edlyn);
    link(&mut graph, RelationKind::RivalOf, &sera, &jeb);

    graph
}
