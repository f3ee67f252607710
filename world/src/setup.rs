//! Scenario loading and initial battle construction.
//!
//! A [`Scenario`] is the static map description (terrain, starting buildings
//! and units); [`Preferences`] carry the per-match choices (player slots,
//! shared treasury, unit limit, RNG seed). [`Battle::start`] combines the two
//! into a fresh aggregate plus the snapshot events a client needs to render
//! it.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use warbound_core::catalog::{TerrainKind, DEFAULT_HEALTH};
use warbound_core::{
    BuildingId, BuildingKind, BuildingSnapshot, BuildingState, Cell, EngineError, Event,
    MapBuilding, PlayerColor, PlayerId, PlayerKind, UnitKind, UnitSnapshot,
};

use crate::{Battle, Building, Commander, Player, Tile, Unit};

/// Static description of one battle map.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Map width in cells.
    pub width: i32,
    /// Map height in cells.
    pub height: i32,
    /// Terrain tile names keyed by `"x,y"`.
    pub terrain: BTreeMap<String, String>,
    /// Buildings present at the start.
    pub buildings: Vec<ScenarioBuilding>,
    /// Units fielded at the start.
    pub units: Vec<ScenarioUnit>,
}

/// One building of a scenario.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ScenarioBuilding {
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Prototype of the building.
    #[serde(rename = "type")]
    pub kind: BuildingKind,
    /// One-based player slot owning the building; absent means neutral.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub owner: Option<u32>,
}

/// One unit of a scenario.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ScenarioUnit {
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Prototype of the unit.
    #[serde(rename = "type")]
    pub kind: UnitKind,
    /// One-based player slot owning the unit.
    pub owner: u32,
}

/// Per-match choices made before the battle starts.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    /// Player slots in turn order.
    pub players: Vec<PlayerPreference>,
    /// Starting treasury of every player.
    pub money: u32,
    /// Maximum number of units a player may own at once.
    pub unit_limit: u32,
    /// Seed of the combat RNG.
    pub seed: u64,
}

/// Choices of one player slot.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerPreference {
    /// Palette colour.
    pub color: PlayerColor,
    /// Team number; teammates share victory and inheritances.
    pub team: u32,
    /// Controller behind the slot.
    pub kind: PlayerKind,
    /// Commander character of the slot.
    pub character: UnitKind,
}

impl Battle {
    /// Builds a battle from a scenario and preferences, returning the
    /// aggregate together with the snapshot events describing it.
    pub fn start(
        scenario: &Scenario,
        preferences: &Preferences,
    ) -> Result<(Battle, Vec<Event>), EngineError> {
        if preferences.players.is_empty() {
            return Err(EngineError::InvalidAction("no player slots"));
        }

        let mut players = Vec::with_capacity(preferences.players.len());
        for (index, pref) in preferences.players.iter().enumerate() {
            if !pref.character.is_commander_character() {
                return Err(EngineError::InvalidAction(
                    "preference names a non-commander character",
                ));
            }
            players.push(Player {
                id: PlayerId::new(index as u32 + 1),
                team: pref.team,
                color: pref.color,
                money: preferences.money,
                unit_limit: preferences.unit_limit,
                kind: pref.kind,
                // Empty slots never receive the turn.
                defeated: pref.kind == PlayerKind::None,
                commander: Commander {
                    character: pref.character,
                    unit: None,
                    death_count: 0,
                    xp: 0,
                    level: 0,
                },
            });
        }
        let active_player = players
            .iter()
            .find(|player| player.kind != PlayerKind::None)
            .map(|player| player.id)
            .ok_or(EngineError::InvalidAction("no playable player slot"))?;

        let mut terrain = BTreeMap::new();
        for (key, name) in &scenario.terrain {
            let cell =
                parse_cell(key).ok_or(EngineError::InvalidAction("malformed terrain key"))?;
            let kind = TerrainKind::parse(name)
                .ok_or(EngineError::InvalidAction("unknown terrain type"))?;
            let _ = terrain.insert(
                cell,
                Tile {
                    name: name.clone(),
                    kind,
                },
            );
        }

        let slot_count = players.len() as u32;
        let mut battle = Battle {
            width: scenario.width,
            height: scenario.height,
            terrain,
            players,
            units: Vec::new(),
            buildings: Vec::new(),
            graves: Vec::new(),
            turn_count: 0,
            circle_count: 0,
            active_player,
            selected_unit: None,
            winner_team: None,
            rng: ChaCha8Rng::seed_from_u64(preferences.seed),
            next_unit_id: 1,
            next_grave_id: 1,
        };

        for (index, entry) in scenario.buildings.iter().enumerate() {
            let cell = Cell::new(entry.x, entry.y);
            if !battle.in_bounds(cell) {
                return Err(EngineError::InvalidAction("building outside the map"));
            }
            let owner = match entry.owner {
                Some(slot) if slot == 0 || slot > slot_count => {
                    return Err(EngineError::InvalidAction("building owner out of range"));
                }
                Some(slot) => Some(PlayerId::new(slot)),
                None => None,
            };
            battle.buildings.push(Building {
                id: BuildingId::new(index as u32 + 1),
                cell,
                kind: entry.kind,
                state: BuildingState::Normal,
                owner,
            });
        }

        for entry in &scenario.units {
            let cell = Cell::new(entry.x, entry.y);
            if !battle.in_bounds(cell) {
                return Err(EngineError::InvalidAction("unit outside the map"));
            }
            if entry.owner == 0 || entry.owner > slot_count {
                return Err(EngineError::InvalidAction("unit owner out of range"));
            }
            let owner = PlayerId::new(entry.owner);
            let id = battle.fresh_unit_id();
            battle.units.push(Unit {
                id,
                owner: Some(owner),
                kind: entry.kind,
                cell,
                health: DEFAULT_HEALTH,
                xp: 0,
                level: 0,
                poison_count: 0,
                did_move: false,
                did_attack: false,
                did_fix: false,
                did_occupy: false,
            });
            let player = battle
                .player_mut(owner)
                .ok_or(EngineError::Invariant("unit owner is gone"))?;
            if player.commander.character == entry.kind && player.commander.unit.is_none() {
                player.commander.unit = Some(id);
            }
        }
        tracing::info!(
            width = battle.width,
            height = battle.height,
            players = battle.players.len(),
            units = battle.units.len(),
            "battle started"
        );

        let events = crate::query::snapshot(&battle);
        Ok((battle, events))
    }
}

pub(crate) fn building_snapshot(battle: &Battle, building: &Building) -> BuildingSnapshot {
    BuildingSnapshot {
        id: building.id,
        x: building.cell.x(),
        y: building.cell.y(),
        kind: building.kind,
        state: building.state,
        color: building
            .owner
            .and_then(|owner| battle.player(owner))
            .map(|player| player.color),
    }
}

pub(crate) fn unit_snapshot(battle: &Battle, unit: &Unit) -> UnitSnapshot {
    UnitSnapshot {
        id: unit.id,
        x: unit.cell.x(),
        y: unit.cell.y(),
        kind: unit.kind,
        color: unit
            .owner
            .and_then(|owner| battle.player(owner))
            .map(|player| player.color),
        level: unit.level,
        health: unit.health,
        state: "waiting".to_owned(),
        active: Some(unit.owner == Some(battle.active_player)),
    }
}

pub(crate) fn map_building(building: &Building) -> MapBuilding {
    MapBuilding {
        x: building.cell.x(),
        y: building.cell.y(),
        kind: building.kind,
    }
}

fn parse_cell(key: &str) -> Option<Cell> {
    let (x, y) = key.split_once(',')?;
    Some(Cell::new(
        x.trim().parse().ok()?,
        y.trim().parse().ok()?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn demo_scenario() -> Scenario {
        let mut terrain = BTreeMap::new();
        for x in 0..6 {
            for y in 0..6 {
                let _ = terrain.insert(format!("{x},{y}"), "terra-1".to_owned());
            }
        }
        Scenario {
            width: 6,
            height: 6,
            terrain,
            buildings: vec![
                ScenarioBuilding {
                    x: 0,
                    y: 0,
                    kind: BuildingKind::Castle,
                    owner: Some(1),
                },
                ScenarioBuilding {
                    x: 5,
                    y: 5,
                    kind: BuildingKind::Castle,
                    owner: Some(2),
                },
                ScenarioBuilding {
                    x: 3,
                    y: 3,
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
                    x: 4,
                    y: 5,
                    kind: UnitKind::Saeth,
                    owner: 2,
                },
            ],
        }
    }

    pub(crate) fn demo_preferences() -> Preferences {
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
                    kind: PlayerKind::Human,
                    character: UnitKind::Saeth,
                },
            ],
            money: 500,
            unit_limit: 10,
            seed: 42,
        }
    }

    #[test]
    fn start_links_commanders_and_snapshots_the_board() {
        let (battle, events) =
            Battle::start(&demo_scenario(), &demo_preferences()).expect("start");

        assert_eq!(battle.active_player, PlayerId::new(1));
        assert_eq!(battle.players.len(), 2);
        for player in &battle.players {
            assert!(player.commander.unit.is_some(), "commander linked");
            assert_eq!(player.money, 500);
        }
        assert_eq!(battle.units.len(), 2);
        assert_eq!(battle.buildings.len(), 3);

        assert!(matches!(events[0], Event::UpdateMap { width: 6, height: 6, .. }));
        assert!(matches!(&events[1], Event::AddBuildings { buildings } if buildings.len() == 3));
        match &events[2] {
            Event::AddUnits { units } => {
                assert_eq!(units.len(), 2);
                assert_eq!(units[0].active, Some(true));
                assert_eq!(units[1].active, Some(false));
            }
            other => panic!("expected add-units, got {other:?}"),
        }
        assert!(matches!(
            events[3],
            Event::UpdateStatus { money: 500, unit_count: 1, .. }
        ));
    }

    #[test]
    fn empty_slots_never_receive_the_turn() {
        let mut preferences = demo_preferences();
        preferences.players.insert(
            0,
            PlayerPreference {
                color: PlayerColor::Gray,
                team: 3,
                kind: PlayerKind::None,
                character: UnitKind::Valadorn,
            },
        );
        let mut scenario = demo_scenario();
        for building in &mut scenario.buildings {
            if let Some(owner) = &mut building.owner {
                *owner += 1;
            }
        }
        for unit in &mut scenario.units {
            unit.owner += 1;
        }

        let (battle, _) = Battle::start(&scenario, &preferences).expect("start");
        assert_eq!(battle.active_player, PlayerId::new(2));
        assert!(battle.players[0].defeated, "empty slot sits out");
    }

    #[test]
    fn malformed_scenarios_are_rejected() {
        let mut scenario = demo_scenario();
        let _ = scenario
            .terrain
            .insert("2,2".to_owned(), "swamp-1".to_owned());
        assert_eq!(
            Battle::start(&scenario, &demo_preferences()).unwrap_err(),
            EngineError::InvalidAction("unknown terrain type")
        );

        let mut scenario = demo_scenario();
        let _ = scenario.terrain.insert("oops".to_owned(), "terra-1".to_owned());
        assert_eq!(
            Battle::start(&scenario, &demo_preferences()).unwrap_err(),
            EngineError::InvalidAction("malformed terrain key")
        );

        let mut scenario = demo_scenario();
        scenario.units[0].owner = 9;
        assert_eq!(
            Battle::start(&scenario, &demo_preferences()).unwrap_err(),
            EngineError::InvalidAction("unit owner out of range")
        );

        let mut scenario = demo_scenario();
        scenario.buildings[0].x = 6;
        assert_eq!(
            Battle::start(&scenario, &demo_preferences()).unwrap_err(),
            EngineError::InvalidAction("building outside the map")
        );

        let mut scenario = demo_scenario();
        scenario.units[0].y = -1;
        assert_eq!(
            Battle::start(&scenario, &demo_preferences()).unwrap_err(),
            EngineError::InvalidAction("unit outside the map")
        );

        let mut preferences = demo_preferences();
        preferences.players[0].character = UnitKind::Soldier;
        assert_eq!(
            Battle::start(&demo_scenario(), &preferences).unwrap_err(),
            EngineError::InvalidAction("preference names a non-commander character")
        );
    }

    #[test]
    fn scenario_json_uses_the_wire_field_names() {
        let json = serde_json::json!({
            "width": 2,
            "height": 1,
            "terrain": {"0,0": "terra-1", "1,0": "water-2"},
            "buildings": [{"x": 0, "y": 0, "type": "castle", "owner": 1}],
            "units": [{"x": 1, "y": 0, "type": "galamar", "owner": 1}]
        });
        let scenario: Scenario = serde_json::from_value(json).expect("deserialize");
        assert_eq!(scenario.buildings[0].kind, BuildingKind::Castle);
        assert_eq!(scenario.units[0].kind, UnitKind::Galamar);

        let json = serde_json::json!({
            "players": [
                {"color": "blue", "team": 1, "kind": "player", "character": "galamar"},
                {"color": "red", "team": 2, "kind": "cpu", "character": "saeth"}
            ],
            "money": 400,
            "unitLimit": 12,
            "seed": 7
        });
        let preferences: Preferences = serde_json::from_value(json).expect("deserialize");
        assert_eq!(preferences.players[1].kind, PlayerKind::Cpu);
        assert_eq!(preferences.unit_limit, 12);
    }

    #[test]
    fn identical_seeds_build_identical_battles() {
        let (left, _) = Battle::start(&demo_scenario(), &demo_preferences()).expect("start");
        let (right, _) = Battle::start(&demo_scenario(), &demo_preferences()).expect("start");
        let left = bincode::serialize(&left).expect("serialize");
        let right = bincode::serialize(&right).expect("serialize");
        assert_eq!(left, right);
    }
}
