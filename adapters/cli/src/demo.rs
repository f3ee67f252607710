//! Built-in skirmish used when no scenario or preferences are supplied.

use std::collections::BTreeMap;

use warbound_core::{BuildingKind, PlayerColor, PlayerKind, UnitKind};
use warbound_world::setup::{
    PlayerPreference, Preferences, Scenario, ScenarioBuilding, ScenarioUnit,
};

/// A 10x10 two-castle skirmish with a contested river crossing.
pub(crate) fn scenario() -> Scenario {
    let mut terrain = BTreeMap::new();
    for x in 0..10 {
        for y in 0..10 {
            let name = match (x, y) {
                // A river splits the map, bridged in the middle.
                (4, 5) | (5, 4) => "bridge-1",
                (x, y) if x + y == 9 => "water-1",
                (2, 2) | (7, 7) => "hill-1",
                (3, 6) | (6, 3) => "forest-1",
                _ => "terra-1",
            };
            let _ = terrain.insert(format!("{x},{y}"), name.to_owned());
        }
    }
    Scenario {
        width: 10,
        height: 10,
        terrain,
        buildings: vec![
            ScenarioBuilding {
                x: 0,
                y: 0,
                kind: BuildingKind::Castle,
                owner: Some(1),
            },
            ScenarioBuilding {
                x: 9,
                y: 9,
                kind: BuildingKind::Castle,
                owner: Some(2),
            },
            ScenarioBuilding {
                x: 2,
                y: 5,
                kind: BuildingKind::Farm,
                owner: None,
            },
            ScenarioBuilding {
                x: 7,
                y: 4,
                kind: BuildingKind::Farm,
                owner: None,
            },
        ],
        units: vec![
            ScenarioUnit {
                x: 1,
                y: 0,
                kind: UnitKind::Galamar,
                owner: 1,
            },
            ScenarioUnit {
                x: 0,
                y: 1,
                kind: UnitKind::Soldier,
                owner: 1,
            },
            ScenarioUnit {
                x: 1,
                y: 1,
                kind: UnitKind::Archer,
                owner: 1,
            },
            ScenarioUnit {
                x: 8,
                y: 9,
                kind: UnitKind::Saeth,
                owner: 2,
            },
            ScenarioUnit {
                x: 9,
                y: 8,
                kind: UnitKind::Soldier,
                owner: 2,
            },
            ScenarioUnit {
                x: 8,
                y: 8,
                kind: UnitKind::Archer,
                owner: 2,
            },
        ],
    }
}

/// Blue human against the red cpu, default treasury and limits.
pub(crate) fn preferences() -> Preferences {
    Preferences {
        players: vec![
            PlayerPreference {
                color: PlayerColor::Blue,
                team: 1,
                kind: PlayerKind::Human,
                character: UnitKind::Galamar,
            },
            PlayerPreference {
                color: PlayerColor::Red,
                team: 2,
                kind: PlayerKind::Cpu,
                character: UnitKind::Saeth,
            },
        ],
        money: 500,
        unit_limit: 12,
        seed: 2024,
    }
}
