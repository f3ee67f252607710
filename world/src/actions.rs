//! Per-unit action availability.
//!
//! Derives the map of eligible target cells to the action each permits,
//! honouring the four per-turn flags and the unit's prototype abilities.

use std::collections::{BTreeMap, HashSet};

use warbound_core::catalog::POISON_MOVE_PENALTY;
use warbound_core::{ActionKind, BuildingState, Cell};

use crate::{path, Battle, Unit};

/// Map of reachable or eligible target cells to the action each permits.
///
/// Rules apply in priority order; a later rule may overwrite the action
/// recorded for the unit's own cell.
pub(crate) fn available_actions(battle: &Battle, unit: &Unit) -> BTreeMap<Cell, ActionKind> {
    let mut actions = BTreeMap::new();
    let stats = unit.stats();

    if !unit.acted_this_turn() {
        let obstacles = enemy_unit_cells(battle, unit);
        let class = stats.move_class;
        let reach = path::reachable(
            unit.cell,
            movement_budget(unit),
            battle.width,
            battle.height,
            |cell| battle.resistance(cell, class),
            &obstacles,
        );
        for cell in reach {
            // Friendly units can be pathed around but not stood upon.
            if battle.unit_at(cell).is_none() {
                let _ = actions.insert(cell, ActionKind::Move);
            }
        }
    }

    if stats.can_fix && !unit.did_attack && !unit.did_occupy {
        if let Some(building) = battle.building_at(unit.cell) {
            if building.state == BuildingState::Destroyed {
                let _ = actions.insert(unit.cell, ActionKind::FixBuilding);
            }
        }
    }

    if !stats.occupies.is_empty() && !unit.did_attack && !unit.did_fix {
        if let Some(building) = battle.building_at(unit.cell) {
            let foreign = building
                .owner
                .map_or(true, |owner| battle.team_of(owner) != unit_team(battle, unit));
            if building.state == BuildingState::Normal
                && stats.occupies.contains(&building.kind)
                && foreign
            {
                let _ = actions.insert(unit.cell, ActionKind::OccupyBuilding);
            }
        }
    }

    let may_attack = !unit.did_attack
        && !unit.did_occupy
        && !unit.did_fix
        && !(stats.cannot_act_after_move && unit.did_move);
    if may_attack && stats.range.max > 0 {
        let threat = path::under_threat(
            unit.cell,
            stats.range.max,
            stats.range.min,
            battle.width,
            battle.height,
        );
        let unit_targets: Vec<Cell> = battle
            .units
            .iter()
            .filter(|other| {
                other.id != unit.id
                    && is_hostile(battle, unit, other)
                    && threat.contains(&other.cell)
            })
            .map(|other| other.cell)
            .collect();

        if stats.can_destroy_building {
            for building in &battle.buildings {
                let enemy_owned = building
                    .owner
                    .is_some_and(|owner| battle.team_of(owner) != unit_team(battle, unit));
                if building.state == BuildingState::Normal
                    && building.kind.stats().destroyable
                    && enemy_owned
                    && threat.contains(&building.cell)
                    && !unit_targets.contains(&building.cell)
                {
                    let _ = actions.insert(building.cell, ActionKind::AttackBuilding);
                }
            }
        }

        for cell in unit_targets {
            let _ = actions.insert(cell, ActionKind::AttackUnit);
        }
    }

    // Raising is independent of the per-turn flags.
    if stats.raise_range > 0 {
        let reach = path::under_threat(
            unit.cell,
            stats.raise_range,
            0,
            battle.width,
            battle.height,
        );
        for grave in &battle.graves {
            if reach.contains(&grave.cell) && battle.unit_at(grave.cell).is_none() {
                let _ = actions.insert(grave.cell, ActionKind::RaiseSkeleton);
            }
        }
    }

    actions
}

/// Whether `attacker_cell` lies in the unit's attack-unit target set.
/// Strike-back has no separate range rule.
pub(crate) fn can_strike_back(battle: &Battle, unit: &Unit, attacker_cell: Cell) -> bool {
    available_actions(battle, unit).get(&attacker_cell) == Some(&ActionKind::AttackUnit)
}

/// Movement budget for one turn; poison slows the unit down.
pub(crate) fn movement_budget(unit: &Unit) -> i32 {
    let mut budget = unit.stats().mov as i32 - 1;
    if unit.poison_count > 0 {
        budget -= POISON_MOVE_PENALTY;
    }
    budget
}

fn unit_team(battle: &Battle, unit: &Unit) -> Option<u32> {
    unit.owner.and_then(|owner| battle.team_of(owner))
}

/// Enemy or unowned units block movement and are valid attack targets.
fn is_hostile(battle: &Battle, unit: &Unit, other: &Unit) -> bool {
    match (unit_team(battle, unit), unit_team(battle, other)) {
        (Some(own), Some(theirs)) => own != theirs,
        _ => true,
    }
}

fn enemy_unit_cells(battle: &Battle, unit: &Unit) -> HashSet<Cell> {
    battle
        .units
        .iter()
        .filter(|other| other.id != unit.id && is_hostile(battle, unit, other))
        .map(|other| other.cell)
        .collect()
}
