#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Warbound rules engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative battle aggregate, and pure systems. Adapters submit
//! [`Command`] values describing player intents, the world executes those
//! commands via its `apply` entry point, and returns an ordered list of
//! [`Event`] values for the caller to broadcast. The crate also carries the
//! immutable balance catalog (unit, terrain, and building stat tables) that
//! every component consults; see [`catalog`].

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub mod catalog;

/// Integer grid coordinate used for every positioned entity.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct Cell {
    x: i32,
    y: i32,
}

impl Cell {
    /// Creates a new cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Horizontal component of the coordinate.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Vertical component of the coordinate.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Computes the Manhattan distance between two cells.
    #[must_use]
    pub fn manhattan_distance(self, other: Cell) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// The four orthogonal neighbours of the cell, without bounds checks.
    #[must_use]
    pub fn neighbours(self) -> [Cell; 4] {
        [
            Cell::new(self.x - 1, self.y),
            Cell::new(self.x + 1, self.y),
            Cell::new(self.x, self.y - 1),
            Cell::new(self.x, self.y + 1),
        ]
    }
}

/// Unique identifier assigned to a unit.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a player.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PlayerId(u32);

impl PlayerId {
    /// Creates a new player identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a building.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct BuildingId(u32);

impl BuildingId {
    /// Creates a new building identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a grave.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GraveId(u32);

impl GraveId {
    /// Creates a new grave identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Palette colour assigned to a player and mirrored onto its entities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    /// Blue army.
    Blue,
    /// Red army.
    Red,
    /// Green army.
    Green,
    /// Black army.
    Black,
    /// Gray army, reserved for neutral forces.
    Gray,
}

/// Controller behind a player slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerKind {
    /// A human issuing intents through an adapter.
    #[serde(rename = "player")]
    Human,
    /// The built-in computer opponent.
    #[serde(rename = "cpu")]
    Cpu,
    /// An empty slot that never acts.
    #[serde(rename = "none")]
    None,
}

/// Movement class determining how terrain resistance applies to a unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoveClass {
    /// Walks the terrain and pays its base path resistance.
    Ground,
    /// Ignores terrain entirely; every step costs one point.
    Fly,
    /// Swims: pays the cheaper flow resistance on water tiles.
    Flow,
}

/// Catalog key identifying a unit prototype.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum UnitKind {
    /// Commander character of the northern alliance.
    Galamar,
    /// Commander character of the southern alliance.
    Valadorn,
    /// Commander character of the demon horde.
    DemonLord,
    /// Commander character of the fallen empire.
    Saeth,
    /// Saeth's unplayable siege avatar.
    SaethHeavensFury,
    /// Cheap infantry that can repair and occupy farms.
    Soldier,
    /// Ranged infantry with a bonus against flying units.
    Archer,
    /// Water-borne attacker with the flow movement class.
    Elemental,
    /// Support caster able to raise skeletons from graves.
    Sorceress,
    /// Fragile spirit with a bonus against skeletons.
    Wisp,
    /// Fast melee beast whose bite poisons survivors.
    DireWolf,
    /// Slow, heavily armoured melee unit.
    Golem,
    /// Siege engine with a banded attack range; destroys buildings.
    Catapult,
    /// Flying heavy hitter.
    Dragon,
    /// Raised undead; leaves no grave behind.
    Skeleton,
    /// Immobile objective marker.
    Crystal,
}

/// Catalog key identifying a building prototype.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum BuildingKind {
    /// Primary stronghold: earns income, heals, and sells units. Losing
    /// every castle is one half of the defeat condition.
    Castle,
    /// Income building that heals units even while neutral.
    Farm,
}

/// Visible state of a building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildingState {
    /// Fully functional.
    Normal,
    /// Wrecked by a siege unit; must be fixed before use.
    Destroyed,
}

/// Action a selected unit may perform on a specific cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ActionKind {
    /// Walk to the cell.
    Move,
    /// Repair the destroyed building under the unit.
    FixBuilding,
    /// Capture the building under the unit.
    OccupyBuilding,
    /// Attack the enemy unit on the cell.
    AttackUnit,
    /// Demolish the enemy building on the cell.
    AttackBuilding,
    /// Raise a skeleton from the grave on the cell.
    RaiseSkeleton,
}

/// Player intents accepted by the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "intent")]
pub enum Command {
    /// A click on a map cell, interpreted against the current selection.
    #[serde(rename_all = "camelCase")]
    ClickCell {
        /// Clicked cell.
        cell: Cell,
    },
    /// Purchase of a unit from the store building on `store_cell`.
    #[serde(rename_all = "camelCase")]
    BuyUnit {
        /// Prototype to purchase.
        kind: UnitKind,
        /// Cell hosting the selling building.
        store_cell: Cell,
    },
    /// Ends the active player's turn.
    EndTurn,
}

/// Errors surfaced by the engine to its caller.
///
/// `NotFound` rejects the intent without touching state. `InvalidAction`
/// reports a request the rules do not currently offer; inside click handling
/// the same situation is not an error at all but a fall-through to selection.
/// `Invariant` signals aggregate corruption: the caller must discard the
/// aggregate instead of persisting it.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    /// An entity looked up by id or position does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),
    /// The requested action is not available under the current rules.
    #[error("action not available: {0}")]
    InvalidAction(&'static str),
    /// The aggregate violated an internal invariant.
    #[error("battle invariant violated: {0}")]
    Invariant(&'static str),
}

/// Ordered state-change records returned by the engine per intent.
///
/// Serialized as `{"type": <kebab-case>, "payload": {..camelCase..}}` so the
/// list can be fanned out to spectators or reduced into a client snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum Event {
    /// Full static map description.
    #[serde(rename_all = "camelCase")]
    UpdateMap {
        /// Map width in cells.
        width: i32,
        /// Map height in cells.
        height: i32,
        /// Terrain tiles keyed by `"x,y"`.
        terrain: BTreeMap<String, String>,
        /// Building positions baked into the map layer.
        buildings: Vec<MapBuilding>,
    },
    /// Status panel of the active player.
    #[serde(rename_all = "camelCase")]
    UpdateStatus {
        /// Colour of the active player.
        color: PlayerColor,
        /// Number of units the active player owns.
        unit_count: u32,
        /// Maximum number of units the active player may own.
        unit_limit: u32,
        /// Current treasury.
        money: u32,
        /// Winning team once a single team remains.
        winner_team: Option<u32>,
        /// Income granted when the status change came from a turn start.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        income: Option<u32>,
    },
    /// Buildings added to the board.
    #[serde(rename_all = "camelCase")]
    AddBuildings {
        /// Added buildings.
        buildings: Vec<BuildingSnapshot>,
    },
    /// Graves added to the board.
    #[serde(rename_all = "camelCase")]
    AddGraves {
        /// Added graves.
        graves: Vec<GraveSnapshot>,
    },
    /// Units added to the board.
    #[serde(rename_all = "camelCase")]
    AddUnits {
        /// Added units.
        units: Vec<UnitSnapshot>,
    },
    /// A unit gained UI focus together with its available actions.
    #[serde(rename_all = "camelCase")]
    UpdateSelectedUnit {
        /// Cells the unit may act on, with the action each permits.
        actions: Vec<ActionSpot>,
        /// Stat summary shown next to the selection.
        brief_info: BriefInfo,
        /// Horizontal position of the selected unit.
        x: i32,
        /// Vertical position of the selected unit.
        y: i32,
    },
    /// UI focus was dropped.
    ClearSelectedUnit,
    /// Partial update of a single unit.
    #[serde(rename_all = "camelCase")]
    UpdateUnit {
        /// Unit the changes apply to.
        id: UnitId,
        /// Changed fields.
        changes: UnitChanges,
    },
    /// Partial updates of several units at once.
    #[serde(rename_all = "camelCase")]
    UpdateUnits {
        /// Per-unit change sets.
        units: Vec<UnitDelta>,
    },
    /// A unit left the board.
    #[serde(rename_all = "camelCase")]
    DeleteUnit {
        /// Removed unit.
        id: UnitId,
    },
    /// A single unit entered the board.
    #[serde(rename_all = "camelCase")]
    AddUnit {
        /// Added unit.
        unit: UnitSnapshot,
    },
    /// Partial update of a single building.
    #[serde(rename_all = "camelCase")]
    UpdateBuilding {
        /// Building the changes apply to.
        id: BuildingId,
        /// Changed fields.
        changes: BuildingChanges,
    },
    /// A grave expired or was consumed.
    #[serde(rename_all = "camelCase")]
    DeleteGrave {
        /// Removed grave.
        id: GraveId,
    },
    /// The store of a selling building was opened.
    #[serde(rename_all = "camelCase")]
    OpenStore {
        /// Cell hosting the selling building.
        store_cell: Cell,
        /// Purchasable items sorted ascending by cost.
        items: Vec<StoreItem>,
    },
}

/// Building entry embedded in the map snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapBuilding {
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Prototype of the building.
    #[serde(rename = "type")]
    pub kind: BuildingKind,
}

/// Full wire description of a building.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildingSnapshot {
    /// Building identifier.
    pub id: BuildingId,
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Prototype of the building.
    #[serde(rename = "type")]
    pub kind: BuildingKind,
    /// Current state.
    pub state: BuildingState,
    /// Colour of the owning player, if any.
    pub color: Option<PlayerColor>,
}

/// Full wire description of a grave.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraveSnapshot {
    /// Grave identifier.
    pub id: GraveId,
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
}

/// Full wire description of a unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSnapshot {
    /// Unit identifier.
    pub id: UnitId,
    /// Horizontal position.
    pub x: i32,
    /// Vertical position.
    pub y: i32,
    /// Prototype of the unit.
    #[serde(rename = "type")]
    pub kind: UnitKind,
    /// Colour of the owning player, if any.
    pub color: Option<PlayerColor>,
    /// Current level.
    pub level: u32,
    /// Current health.
    pub health: u32,
    /// Presentation state; always `"waiting"` in snapshots.
    pub state: String,
    /// Whether the unit belongs to the active player. Only present in the
    /// bulk `add-units` snapshot.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub active: Option<bool>,
}

/// One cell of a selected unit's action set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSpot {
    /// Horizontal position of the target cell.
    pub x: i32,
    /// Vertical position of the target cell.
    pub y: i32,
    /// Action the cell permits.
    #[serde(rename = "type")]
    pub action: ActionKind,
}

/// Stat summary attached to a selection.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BriefInfo {
    /// Lower bound of the attack roll.
    pub atk_min: u32,
    /// Upper bound of the attack roll.
    pub atk_max: u32,
    /// Base defence of the prototype.
    pub def: i32,
    /// Defence bonus granted by the occupied cell.
    pub extra_def: i32,
    /// Current level.
    pub level: u32,
}

/// Partial field map for a unit; absent fields are unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitChanges {
    /// New horizontal position.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x: Option<i32>,
    /// New vertical position.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub y: Option<i32>,
    /// New health value.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub health: Option<u32>,
    /// New experience total.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub xp: Option<u32>,
    /// New level.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub level: Option<u32>,
    /// New poison counter.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub poison_count: Option<u32>,
}

/// Pairs a unit id with its change set inside `update-units`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDelta {
    /// Unit the changes apply to.
    pub id: UnitId,
    /// Changed fields.
    pub changes: UnitChanges,
}

/// Partial field map for a building; absent fields are unchanged.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildingChanges {
    /// New building state.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub state: Option<BuildingState>,
    /// Colour of the new owner.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub color: Option<PlayerColor>,
}

/// One row of an opened store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreItem {
    /// Prototype offered for sale.
    #[serde(rename = "type")]
    pub kind: UnitKind,
    /// Display name.
    pub name: String,
    /// Flavour line shown in the store.
    pub description: String,
    /// Colour the unit would be painted with.
    pub color: PlayerColor,
    /// Lower bound of the attack roll.
    pub atk_min: u32,
    /// Upper bound of the attack roll.
    pub atk_max: u32,
    /// Base defence.
    pub def: i32,
    /// Movement points.
    pub mov: u32,
    /// Price in gold, including any commander surcharge.
    pub cost: u32,
    /// Whether the active player can afford and field the unit right now.
    pub available: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;

    fn assert_round_trip<T>(value: &T)
    where
        T: Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = Cell::new(1, 1);
        let destination = Cell::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn commands_serialize_to_the_wire_shape() {
        let json = serde_json::to_value(Command::ClickCell {
            cell: Cell::new(3, 7),
        })
        .expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({"intent": "click-cell", "cell": {"x": 3, "y": 7}})
        );

        let command: Command = serde_json::from_value(serde_json::json!({
            "intent": "buy-unit",
            "kind": "soldier",
            "storeCell": {"x": 0, "y": 0}
        }))
        .expect("deserialize");
        assert_eq!(
            command,
            Command::BuyUnit {
                kind: UnitKind::Soldier,
                store_cell: Cell::new(0, 0),
            }
        );

        assert_eq!(
            serde_json::to_value(Command::EndTurn).expect("serialize"),
            serde_json::json!({"intent": "end-turn"})
        );
    }

    #[test]
    fn update_unit_serializes_to_the_wire_shape() {
        let event = Event::UpdateUnit {
            id: UnitId::new(3),
            changes: UnitChanges {
                health: Some(55),
                ..UnitChanges::default()
            },
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(
            json,
            serde_json::json!({
                "type": "update-unit",
                "payload": {"id": 3, "changes": {"health": 55}}
            })
        );
    }

    #[test]
    fn clear_selected_unit_carries_no_payload() {
        let json = serde_json::to_value(Event::ClearSelectedUnit).expect("serialize");
        assert_eq!(json, serde_json::json!({"type": "clear-selected-unit"}));
    }

    #[test]
    fn open_store_uses_camel_case_payload_keys() {
        let event = Event::OpenStore {
            store_cell: Cell::new(2, 5),
            items: vec![StoreItem {
                kind: UnitKind::DireWolf,
                name: "Dire Wolf".to_owned(),
                description: "Poisons whatever survives its bite.".to_owned(),
                color: PlayerColor::Red,
                atk_min: 60,
                atk_max: 65,
                def: 15,
                mov: 5,
                cost: 600,
                available: true,
            }],
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "open-store");
        assert_eq!(json["payload"]["storeCell"], serde_json::json!({"x": 2, "y": 5}));
        let item = &json["payload"]["items"][0];
        assert_eq!(item["type"], "dire-wolf");
        assert_eq!(item["atkMin"], 60);
        assert_eq!(item["available"], true);
    }

    #[test]
    fn update_status_omits_absent_income() {
        let event = Event::UpdateStatus {
            color: PlayerColor::Blue,
            unit_count: 4,
            unit_limit: 10,
            money: 500,
            winner_team: None,
            income: None,
        };
        let json = serde_json::to_value(&event).expect("serialize");
        assert!(json["payload"].get("income").is_none());
        assert_eq!(json["payload"]["winnerTeam"], serde_json::Value::Null);
    }

    #[test]
    fn events_round_trip_through_json() {
        let event = Event::AddGraves {
            graves: vec![GraveSnapshot {
                id: GraveId::new(1),
                x: 4,
                y: 2,
            }],
        };
        let json = serde_json::to_string(&event).expect("serialize");
        let restored: Event = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, event);
    }

    #[test]
    fn snapshot_payloads_round_trip_through_bincode() {
        assert_round_trip(&Cell::new(-3, 9));
        assert_round_trip(&GraveSnapshot {
            id: GraveId::new(1),
            x: 4,
            y: 2,
        });
        assert_round_trip(&BriefInfo {
            atk_min: 50,
            atk_max: 55,
            def: 5,
            extra_def: 15,
            level: 2,
        });
    }

    #[test]
    fn unit_kind_names_follow_the_catalog_keys() {
        let json = serde_json::to_value(UnitKind::SaethHeavensFury).expect("serialize");
        assert_eq!(json, serde_json::json!("saeth-heavens-fury"));
        let json = serde_json::to_value(UnitKind::DemonLord).expect("serialize");
        assert_eq!(json, serde_json::json!("demon-lord"));
    }

    #[test]
    fn player_kind_uses_the_legacy_wire_names() {
        assert_eq!(
            serde_json::to_value(PlayerKind::Human).expect("serialize"),
            serde_json::json!("player")
        );
        assert_eq!(
            serde_json::to_value(PlayerKind::Cpu).expect("serialize"),
            serde_json::json!("cpu")
        );
    }
}
