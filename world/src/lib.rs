#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative battle state management for Warbound.
//!
//! The [`Battle`] aggregate owns every entity of one match. Callers submit
//! [`Command`] intents through [`apply`], which mutates the aggregate and
//! emits an ordered event list; the engine itself never performs I/O. Two
//! intents against the same battle must be serialized by the caller — the
//! engine assumes exclusive access for the duration of a call. Distinct
//! battles are independent values and may be processed in parallel.

use std::collections::BTreeMap;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use warbound_core::catalog::{TerrainKind, UnitStats};
use warbound_core::{
    ActionKind, ActionSpot, BriefInfo, BuildingId, BuildingKind, BuildingState, Cell, Command,
    EngineError, Event, GraveId, MoveClass, PlayerColor, PlayerId, PlayerKind, UnitId, UnitKind,
};

mod actions;
mod combat;
mod defeat;
mod path;
pub mod query;
pub mod setup;
mod store;
mod turn;

/// One terrain tile: the raw map name plus its parsed base kind.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Tile {
    pub(crate) name: String,
    pub(crate) kind: TerrainKind,
}

/// A unit on the board.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Unit {
    pub(crate) id: UnitId,
    /// Unowned only transiently during setup.
    pub(crate) owner: Option<PlayerId>,
    pub(crate) kind: UnitKind,
    pub(crate) cell: Cell,
    pub(crate) health: u32,
    pub(crate) xp: u32,
    pub(crate) level: u32,
    /// Turns of poison left; penalties apply while non-zero.
    pub(crate) poison_count: u32,
    pub(crate) did_move: bool,
    pub(crate) did_attack: bool,
    pub(crate) did_fix: bool,
    pub(crate) did_occupy: bool,
}

impl Unit {
    pub(crate) fn stats(&self) -> &'static UnitStats {
        self.kind.stats()
    }

    pub(crate) fn acted_this_turn(&self) -> bool {
        self.did_move || self.did_attack || self.did_fix || self.did_occupy
    }
}

/// A player's commander record; survives the death of its linked unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Commander {
    pub(crate) character: UnitKind,
    pub(crate) unit: Option<UnitId>,
    pub(crate) death_count: u32,
    pub(crate) xp: u32,
    pub(crate) level: u32,
}

/// A player slot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Player {
    pub(crate) id: PlayerId,
    pub(crate) team: u32,
    pub(crate) color: PlayerColor,
    pub(crate) money: u32,
    pub(crate) unit_limit: u32,
    pub(crate) kind: PlayerKind,
    pub(crate) defeated: bool,
    pub(crate) commander: Commander,
}

/// A building on the board. Buildings change owner and state but are never
/// removed from the aggregate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Building {
    pub(crate) id: BuildingId,
    pub(crate) cell: Cell,
    pub(crate) kind: BuildingKind,
    pub(crate) state: BuildingState,
    pub(crate) owner: Option<PlayerId>,
}

/// A grave left by a fallen non-commander unit.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Grave {
    pub(crate) id: GraveId,
    pub(crate) cell: Cell,
    pub(crate) ttl: u32,
}

/// Represents the authoritative state of one Warbound battle.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Battle {
    pub(crate) width: i32,
    pub(crate) height: i32,
    pub(crate) terrain: BTreeMap<Cell, Tile>,
    pub(crate) players: Vec<Player>,
    pub(crate) units: Vec<Unit>,
    pub(crate) buildings: Vec<Building>,
    pub(crate) graves: Vec<Grave>,
    pub(crate) turn_count: u32,
    pub(crate) circle_count: u32,
    pub(crate) active_player: PlayerId,
    /// Transient UI focus; engine state, not gameplay state.
    pub(crate) selected_unit: Option<UnitId>,
    pub(crate) winner_team: Option<u32>,
    pub(crate) rng: ChaCha8Rng,
    pub(crate) next_unit_id: u32,
    pub(crate) next_grave_id: u32,
}

impl Battle {
    pub(crate) fn in_bounds(&self, cell: Cell) -> bool {
        cell.x() >= 0 && cell.x() < self.width && cell.y() >= 0 && cell.y() < self.height
    }

    pub(crate) fn terrain_kind(&self, cell: Cell) -> Option<TerrainKind> {
        self.terrain.get(&cell).map(|tile| tile.kind)
    }

    /// Movement-point cost to enter `cell` for the given movement class.
    /// Cells without a terrain tile cost one point.
    pub(crate) fn resistance(&self, cell: Cell, class: MoveClass) -> i32 {
        let Some(kind) = self.terrain_kind(cell) else {
            return 1;
        };
        let stats = kind.stats();
        match class {
            MoveClass::Fly => 1,
            MoveClass::Flow => stats.flow_path_resistance.unwrap_or(stats.path_resistance),
            MoveClass::Ground => stats.path_resistance,
        }
    }

    pub(crate) fn unit(&self, id: UnitId) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.id == id)
    }

    pub(crate) fn unit_mut(&mut self, id: UnitId) -> Option<&mut Unit> {
        self.units.iter_mut().find(|unit| unit.id == id)
    }

    pub(crate) fn unit_at(&self, cell: Cell) -> Option<&Unit> {
        self.units.iter().find(|unit| unit.cell == cell)
    }

    pub(crate) fn building_at(&self, cell: Cell) -> Option<&Building> {
        self.buildings.iter().find(|building| building.cell == cell)
    }

    pub(crate) fn building_at_mut(&mut self, cell: Cell) -> Option<&mut Building> {
        self.buildings
            .iter_mut()
            .find(|building| building.cell == cell)
    }

    pub(crate) fn grave_at(&self, cell: Cell) -> Option<&Grave> {
        self.graves.iter().find(|grave| grave.cell == cell)
    }

    pub(crate) fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|player| player.id == id)
    }

    pub(crate) fn player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|player| player.id == id)
    }

    pub(crate) fn active(&self) -> Result<&Player, EngineError> {
        self.player(self.active_player)
            .ok_or(EngineError::Invariant("active player is gone"))
    }

    pub(crate) fn team_of(&self, id: PlayerId) -> Option<u32> {
        self.player(id).map(|player| player.team)
    }

    pub(crate) fn unit_count(&self, owner: PlayerId) -> u32 {
        self.units
            .iter()
            .filter(|unit| unit.owner == Some(owner))
            .count() as u32
    }

    pub(crate) fn roll(&mut self, min: u32, max: u32) -> u32 {
        if min >= max {
            return min;
        }
        self.rng.gen_range(min..=max)
    }

    pub(crate) fn fresh_unit_id(&mut self) -> UnitId {
        let id = UnitId::new(self.next_unit_id);
        self.next_unit_id += 1;
        id
    }

    pub(crate) fn fresh_grave_id(&mut self) -> GraveId {
        let id = GraveId::new(self.next_grave_id);
        self.next_grave_id += 1;
        id
    }
}

/// Applies the provided intent to the battle, mutating state deterministically.
///
/// Events are staged in a local buffer and appended to `out_events` only on
/// success, so a failed intent never leaks a partial emission. On `Err` the
/// caller must discard the aggregate instead of persisting it.
pub fn apply(
    battle: &mut Battle,
    command: Command,
    out_events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    tracing::debug!(?command, turn = battle.turn_count, "applying intent");
    let mut staged = Vec::new();
    let outcome = match command {
        Command::ClickCell { cell } => handle_click(battle, cell, &mut staged),
        Command::BuyUnit { kind, store_cell } => {
            store::buy_unit(battle, kind, store_cell, &mut staged)
        }
        Command::EndTurn => turn::end_turn(battle, &mut staged),
    };
    match outcome {
        Ok(()) => {
            out_events.append(&mut staged);
            Ok(())
        }
        Err(error) => {
            tracing::debug!(%error, "intent rejected");
            Err(error)
        }
    }
}

/// Interprets a click against the current selection. An unmatched click is
/// never an error: it falls through to selecting the clicked unit, opening a
/// store, or dropping the selection.
fn handle_click(battle: &mut Battle, cell: Cell, events: &mut Vec<Event>) -> Result<(), EngineError> {
    if let Some(selected) = battle.selected_unit {
        let unit = battle
            .unit(selected)
            .ok_or(EngineError::Invariant("selected unit is gone"))?
            .clone();
        if unit.owner == Some(battle.active_player) {
            let available = actions::available_actions(battle, &unit);
            if let Some(action) = available.get(&cell).copied() {
                return execute_action(battle, selected, cell, action, events);
            }
        }
    }

    if let Some(unit) = battle.unit_at(cell) {
        let id = unit.id;
        battle.selected_unit = Some(id);
        return sync_selected_unit(battle, events);
    }

    if let Some(items) = store::store_listing_at(battle, cell) {
        if battle.selected_unit.take().is_some() {
            events.push(Event::ClearSelectedUnit);
        }
        events.push(Event::OpenStore {
            store_cell: cell,
            items,
        });
        return Ok(());
    }

    battle.selected_unit = None;
    events.push(Event::ClearSelectedUnit);
    Ok(())
}

fn execute_action(
    battle: &mut Battle,
    unit_id: UnitId,
    cell: Cell,
    action: ActionKind,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    tracing::debug!(unit = unit_id.get(), ?action, ?cell, "executing action");
    match action {
        ActionKind::Move => {
            let unit = battle
                .unit_mut(unit_id)
                .ok_or(EngineError::Invariant("acting unit is gone"))?;
            unit.cell = cell;
            unit.did_move = true;
            events.push(Event::UpdateUnit {
                id: unit_id,
                changes: warbound_core::UnitChanges {
                    x: Some(cell.x()),
                    y: Some(cell.y()),
                    ..Default::default()
                },
            });
        }
        ActionKind::FixBuilding => fix_building(battle, unit_id, events)?,
        ActionKind::OccupyBuilding => occupy_building(battle, unit_id, events)?,
        ActionKind::AttackUnit => {
            let defender = battle
                .unit_at(cell)
                .ok_or(EngineError::Invariant("attack target is gone"))?
                .id;
            combat::attack_unit(battle, unit_id, defender, events)?;
        }
        ActionKind::AttackBuilding => combat::attack_building(battle, unit_id, cell, events)?,
        ActionKind::RaiseSkeleton => combat::raise_skeleton(battle, unit_id, cell, events)?,
    }

    // Refresh the selection panel unless the acting unit fell to a
    // strike-back or the selection moved elsewhere.
    if battle.selected_unit == Some(unit_id) && battle.unit(unit_id).is_some() {
        sync_selected_unit(battle, events)?;
    }
    Ok(())
}

fn fix_building(
    battle: &mut Battle,
    unit_id: UnitId,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    let (owner, cell) = {
        let unit = battle
            .unit_mut(unit_id)
            .ok_or(EngineError::Invariant("acting unit is gone"))?;
        unit.did_fix = true;
        (unit.owner, unit.cell)
    };
    let color = owner.and_then(|id| battle.player(id)).map(|p| p.color);
    let building = battle
        .building_at_mut(cell)
        .ok_or(EngineError::Invariant("no building under fixing unit"))?;
    building.state = BuildingState::Normal;
    building.owner = owner;
    events.push(Event::UpdateBuilding {
        id: building.id,
        changes: warbound_core::BuildingChanges {
            state: Some(BuildingState::Normal),
            color,
        },
    });
    Ok(())
}

fn occupy_building(
    battle: &mut Battle,
    unit_id: UnitId,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    let (owner, cell) = {
        let unit = battle
            .unit_mut(unit_id)
            .ok_or(EngineError::Invariant("acting unit is gone"))?;
        unit.did_occupy = true;
        (unit.owner, unit.cell)
    };
    let color = owner.and_then(|id| battle.player(id)).map(|p| p.color);
    let (building_id, previous_owner) = {
        let building = battle
            .building_at_mut(cell)
            .ok_or(EngineError::Invariant("no building under occupying unit"))?;
        let previous = building.owner;
        building.owner = owner;
        (building.id, previous)
    };
    events.push(Event::UpdateBuilding {
        id: building_id,
        changes: warbound_core::BuildingChanges {
            state: None,
            color,
        },
    });
    if let Some(previous) = previous_owner {
        defeat::check_defeat(battle, previous, events)?;
    }
    Ok(())
}

/// Re-emits the selection panel for the currently selected unit.
pub(crate) fn sync_selected_unit(
    battle: &Battle,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    let Some(selected) = battle.selected_unit else {
        return Ok(());
    };
    let unit = battle
        .unit(selected)
        .ok_or(EngineError::Invariant("selected unit is gone"))?;
    events.push(selection_panel(battle, unit));
    Ok(())
}

/// Builds the selection panel event for one unit.
pub(crate) fn selection_panel(battle: &Battle, unit: &Unit) -> Event {
    let available = actions::available_actions(battle, unit);
    let action_spots = available
        .iter()
        .map(|(cell, action)| ActionSpot {
            x: cell.x(),
            y: cell.y(),
            action: *action,
        })
        .collect();
    let stats = unit.stats();
    Event::UpdateSelectedUnit {
        actions: action_spots,
        brief_info: BriefInfo {
            atk_min: stats.atk_min,
            atk_max: stats.atk_max,
            def: stats.def,
            extra_def: combat::cell_defence_bonus(battle, unit),
            level: unit.level,
        },
        x: unit.cell.x(),
        y: unit.cell.y(),
    }
}
