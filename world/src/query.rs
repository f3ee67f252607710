//! Read-only views over a battle for adapters and the computer opponent.

use std::collections::BTreeMap;

use warbound_core::{
    ActionKind, BuildingId, BuildingKind, BuildingState, Cell, Event, PlayerColor, PlayerId,
    PlayerKind, StoreItem, UnitId, UnitKind,
};

use crate::{actions, setup, store, Battle};

/// Summary of the player whose turn it is.
#[derive(Clone, Copy, Debug)]
pub struct ActivePlayer {
    /// Player identifier.
    pub id: PlayerId,
    /// Controller behind the slot.
    pub kind: PlayerKind,
    /// Palette colour.
    pub color: PlayerColor,
    /// Team number.
    pub team: u32,
    /// Current treasury.
    pub money: u32,
    /// Maximum number of units the player may own.
    pub unit_limit: u32,
    /// Number of units the player owns right now.
    pub unit_count: u32,
}

/// Summary of one unit on the board.
#[derive(Clone, Copy, Debug)]
pub struct UnitOverview {
    /// Unit identifier.
    pub id: UnitId,
    /// Owning player, if any.
    pub owner: Option<PlayerId>,
    /// Prototype of the unit.
    pub kind: UnitKind,
    /// Position on the board.
    pub cell: Cell,
    /// Current health.
    pub health: u32,
    /// Current level.
    pub level: u32,
    /// Whether the unit already used an action this turn.
    pub acted: bool,
}

/// Summary of one building on the board.
#[derive(Clone, Copy, Debug)]
pub struct BuildingOverview {
    /// Building identifier.
    pub id: BuildingId,
    /// Position on the board.
    pub cell: Cell,
    /// Prototype of the building.
    pub kind: BuildingKind,
    /// Current state.
    pub state: BuildingState,
    /// Owning player, if any.
    pub owner: Option<PlayerId>,
}

/// Map dimensions as `(width, height)`.
#[must_use]
pub fn dimensions(battle: &Battle) -> (i32, i32) {
    (battle.width, battle.height)
}

/// The winning team once the battle is decided.
#[must_use]
pub fn winner_team(battle: &Battle) -> Option<u32> {
    battle.winner_team
}

/// The unit holding UI focus, if any.
#[must_use]
pub fn selected_unit(battle: &Battle) -> Option<UnitId> {
    battle.selected_unit
}

/// Summary of the active player, or `None` on a corrupted aggregate.
#[must_use]
pub fn active_player(battle: &Battle) -> Option<ActivePlayer> {
    let player = battle.player(battle.active_player)?;
    Some(ActivePlayer {
        id: player.id,
        kind: player.kind,
        color: player.color,
        team: player.team,
        money: player.money,
        unit_limit: player.unit_limit,
        unit_count: battle.unit_count(player.id),
    })
}

/// Team of a player.
#[must_use]
pub fn team_of(battle: &Battle, player: PlayerId) -> Option<u32> {
    battle.team_of(player)
}

/// Every unit on the board, ordered by id.
#[must_use]
pub fn units(battle: &Battle) -> Vec<UnitOverview> {
    let mut list: Vec<UnitOverview> = battle
        .units
        .iter()
        .map(|unit| UnitOverview {
            id: unit.id,
            owner: unit.owner,
            kind: unit.kind,
            cell: unit.cell,
            health: unit.health,
            level: unit.level,
            acted: unit.acted_this_turn(),
        })
        .collect();
    list.sort_by_key(|unit| unit.id);
    list
}

/// Every building on the board.
#[must_use]
pub fn buildings(battle: &Battle) -> Vec<BuildingOverview> {
    battle
        .buildings
        .iter()
        .map(|building| BuildingOverview {
            id: building.id,
            cell: building.cell,
            kind: building.kind,
            state: building.state,
            owner: building.owner,
        })
        .collect()
}

/// The unit standing on `cell`, if any.
#[must_use]
pub fn unit_at(battle: &Battle, cell: Cell) -> Option<UnitId> {
    battle.unit_at(cell).map(|unit| unit.id)
}

/// The action map of one unit; empty for an unknown id.
#[must_use]
pub fn available_actions(battle: &Battle, id: UnitId) -> BTreeMap<Cell, ActionKind> {
    battle
        .unit(id)
        .map(|unit| actions::available_actions(battle, unit))
        .unwrap_or_default()
}

/// Store listing of the building on `cell`, if the active player may buy
/// there right now.
#[must_use]
pub fn store_listing(battle: &Battle, cell: Cell) -> Option<Vec<StoreItem>> {
    store::store_listing_at(battle, cell)
}

/// Full event list reconstructing the client state, selection included.
#[must_use]
pub fn snapshot(battle: &Battle) -> Vec<Event> {
    let mut events = Vec::new();

    let mut terrain = BTreeMap::new();
    for (cell, tile) in &battle.terrain {
        let _ = terrain.insert(format!("{},{}", cell.x(), cell.y()), tile.name.clone());
    }
    events.push(Event::UpdateMap {
        width: battle.width,
        height: battle.height,
        terrain,
        buildings: battle.buildings.iter().map(setup::map_building).collect(),
    });
    events.push(Event::AddBuildings {
        buildings: battle
            .buildings
            .iter()
            .map(|building| setup::building_snapshot(battle, building))
            .collect(),
    });
    events.push(Event::AddUnits {
        units: battle
            .units
            .iter()
            .map(|unit| setup::unit_snapshot(battle, unit))
            .collect(),
    });
    if !battle.graves.is_empty() {
        events.push(Event::AddGraves {
            graves: battle
                .graves
                .iter()
                .map(|grave| warbound_core::GraveSnapshot {
                    id: grave.id,
                    x: grave.cell.x(),
                    y: grave.cell.y(),
                })
                .collect(),
        });
    }
    if let Some(player) = active_player(battle) {
        events.push(Event::UpdateStatus {
            color: player.color,
            unit_count: player.unit_count,
            unit_limit: player.unit_limit,
            money: player.money,
            winner_team: battle.winner_team,
            income: None,
        });
    }
    if let Some(unit) = battle.selected_unit.and_then(|id| battle.unit(id)) {
        events.push(crate::selection_panel(battle, unit));
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn snapshot_reconstructs_the_whole_board() {
        let mut battle = flat_battle(6, 6);
        let soldier = add_unit(&mut battle, 1, UnitKind::Soldier, Cell::new(1, 1));
        let _ = add_unit(&mut battle, 2, UnitKind::Archer, Cell::new(4, 4));
        let _ = add_building(
            &mut battle,
            Some(1),
            BuildingKind::Castle,
            BuildingState::Normal,
            Cell::new(0, 0),
        );
        let _ = add_grave(&mut battle, Cell::new(3, 3));
        battle.selected_unit = Some(soldier);

        let events = snapshot(&battle);
        assert!(matches!(
            &events[0],
            Event::UpdateMap { terrain, .. } if terrain.len() == 36
        ));
        assert!(matches!(&events[1], Event::AddBuildings { buildings } if buildings.len() == 1));
        match &events[2] {
            Event::AddUnits { units } => {
                assert_eq!(units.len(), 2);
                assert_eq!(units[0].active, Some(true));
                assert_eq!(units[1].active, Some(false));
            }
            other => panic!("expected add-units, got {other:?}"),
        }
        assert!(matches!(&events[3], Event::AddGraves { graves } if graves.len() == 1));
        assert!(matches!(&events[4], Event::UpdateStatus { money: 500, .. }));
        assert!(matches!(
            &events[5],
            Event::UpdateSelectedUnit { x: 1, y: 1, .. }
        ));
    }

    #[test]
    fn unit_overviews_come_back_in_id_order() {
        let mut battle = flat_battle(6, 6);
        let first = add_unit(&mut battle, 1, UnitKind::Soldier, Cell::new(1, 1));
        let second = add_unit(&mut battle, 2, UnitKind::Archer, Cell::new(4, 4));
        battle.units.swap(0, 1);

        let list = units(&battle);
        assert_eq!(list[0].id, first);
        assert_eq!(list[1].id, second);
        assert_eq!(list[1].kind, UnitKind::Archer);
    }

    #[test]
    fn unknown_units_have_no_actions() {
        let battle = flat_battle(6, 6);
        assert!(available_actions(&battle, UnitId::new(99)).is_empty());
    }

    #[test]
    fn snapshot_omits_the_panel_for_a_dangling_selection() {
        let mut battle = flat_battle(6, 6);
        battle.selected_unit = Some(UnitId::new(99));

        let events = snapshot(&battle);
        assert!(!events
            .iter()
            .any(|event| matches!(event, Event::UpdateSelectedUnit { .. })));
    }
}
