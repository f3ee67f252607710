#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic computer opponent proposing one command at a time.
//!
//! The system is pure: it inspects a battle through the world's query API
//! and proposes the next [`Command`] for an active cpu player. It returns
//! `None` when the battle is decided, when the active player is not a cpu,
//! or when no useful command remains; the driver then submits
//! [`Command::EndTurn`] and control passes on.

use warbound_core::{
    ActionKind, BuildingKind, BuildingState, Cell, Command, PlayerKind, UnitId, UnitKind,
};
use warbound_world::query::{self, ActivePlayer, UnitOverview};
use warbound_world::Battle;

/// Greedy action priority: strike first, raise reinforcements, take ground,
/// repair, demolish, and only then walk towards the nearest enemy.
const ACTION_PRIORITY: [ActionKind; 5] = [
    ActionKind::AttackUnit,
    ActionKind::RaiseSkeleton,
    ActionKind::OccupyBuilding,
    ActionKind::FixBuilding,
    ActionKind::AttackBuilding,
];

/// Proposes the next command for the active cpu player.
#[must_use]
pub fn next_command(battle: &Battle) -> Option<Command> {
    if query::winner_team(battle).is_some() {
        return None;
    }
    let player = query::active_player(battle)?;
    if player.kind != PlayerKind::Cpu {
        return None;
    }

    let units = query::units(battle);
    let own_units: Vec<&UnitOverview> = units
        .iter()
        .filter(|unit| unit.owner == Some(player.id))
        .collect();

    // Finish the selected unit before touching anything else.
    let selected = query::selected_unit(battle);
    if let Some(id) = selected {
        if own_units.iter().any(|unit| unit.id == id) {
            if let Some(cell) = best_action_cell(battle, id, &player, &units) {
                tracing::debug!(unit = id.get(), ?cell, "cpu continues selected unit");
                return Some(Command::ClickCell { cell });
            }
        }
    }

    // Otherwise select the lowest-id unit that still has a useful action.
    for unit in &own_units {
        if Some(unit.id) == selected {
            continue;
        }
        if best_action_cell(battle, unit.id, &player, &units).is_some() {
            tracing::debug!(unit = unit.id.get(), "cpu selects unit");
            return Some(Command::ClickCell { cell: unit.cell });
        }
    }

    if let Some((store_cell, kind)) = best_purchase(battle, &player) {
        tracing::debug!(?kind, ?store_cell, "cpu buys unit");
        return Some(Command::BuyUnit { kind, store_cell });
    }
    None
}

/// The cell the unit should click next, or `None` when nothing useful is
/// left. Approach moves must strictly shrink the distance to the nearest
/// enemy, which keeps the turn finite.
fn best_action_cell(
    battle: &Battle,
    id: UnitId,
    player: &ActivePlayer,
    units: &[UnitOverview],
) -> Option<Cell> {
    let actions = query::available_actions(battle, id);
    for wanted in ACTION_PRIORITY {
        if let Some(cell) = actions
            .iter()
            .find(|(_, action)| **action == wanted)
            .map(|(cell, _)| *cell)
        {
            return Some(cell);
        }
    }

    let unit = units.iter().find(|unit| unit.id == id)?;
    let enemy_cells: Vec<Cell> = units
        .iter()
        .filter(|other| is_enemy(battle, player, other))
        .map(|other| other.cell)
        .collect();
    let current = nearest_distance(unit.cell, &enemy_cells)?;
    actions
        .iter()
        .filter(|(_, action)| **action == ActionKind::Move)
        .filter_map(|(cell, _)| Some((nearest_distance(*cell, &enemy_cells)?, *cell)))
        .filter(|(distance, _)| *distance < current)
        .min_by_key(|(distance, cell)| (*distance, *cell))
        .map(|(_, cell)| cell)
}

fn is_enemy(battle: &Battle, player: &ActivePlayer, unit: &UnitOverview) -> bool {
    match unit.owner {
        Some(owner) => query::team_of(battle, owner) != Some(player.team),
        None => true,
    }
}

fn nearest_distance(origin: Cell, targets: &[Cell]) -> Option<u32> {
    targets
        .iter()
        .map(|target| origin.manhattan_distance(*target))
        .min()
}

/// The most expensive affordable unit at the first free own castle.
fn best_purchase(battle: &Battle, player: &ActivePlayer) -> Option<(Cell, UnitKind)> {
    for building in query::buildings(battle) {
        if building.kind != BuildingKind::Castle
            || building.state != BuildingState::Normal
            || building.owner != Some(player.id)
            || query::unit_at(battle, building.cell).is_some()
        {
            continue;
        }
        let items = query::store_listing(battle, building.cell)?;
        if let Some(item) = items.iter().rev().find(|item| item.available) {
            return Some((building.cell, item.kind));
        }
    }
    None
}
