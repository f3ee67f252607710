//! Combat resolution: strikes, demolition, raising, experience, and death.

use warbound_core::catalog::{
    level_for_xp, TerrainKind, BUILDING_DEFENCE_BONUS, DEFAULT_HEALTH, GRAVE_TTL, PER_LEVEL_BONUS,
    POISON_COMBAT_PENALTY, WATER_ATTACK_BONUS, WATER_DEFENCE_BONUS,
};
use warbound_core::{
    BuildingChanges, BuildingState, Cell, EngineError, Event, GraveSnapshot, MoveClass,
    UnitChanges, UnitId, UnitKind, UnitSnapshot,
};

use crate::{actions, defeat, Battle, Grave, Unit};

/// Resolves one attack: the attacker's blow, then at most one strike-back
/// if the defender survived and threatens the attacker's cell.
pub(crate) fn attack_unit(
    battle: &mut Battle,
    attacker_id: UnitId,
    defender_id: UnitId,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    battle
        .unit_mut(attacker_id)
        .ok_or(EngineError::Invariant("attacker is gone"))?
        .did_attack = true;

    strike(battle, attacker_id, defender_id, events)?;

    if let Some(defender) = battle.unit(defender_id).cloned() {
        let attacker_cell = battle
            .unit(attacker_id)
            .ok_or(EngineError::Invariant("attacker is gone"))?
            .cell;
        // The counter does not set the defender's attack flag and is never
        // answered in turn.
        if actions::can_strike_back(battle, &defender, attacker_cell) {
            strike(battle, defender_id, attacker_id, events)?;
        }
    }
    Ok(())
}

/// One directed blow. Applies damage, poisons a surviving defender when the
/// attacker bites with poison, awards the attacker the damage as experience,
/// and buries the defender if it fell.
fn strike(
    battle: &mut Battle,
    attacker_id: UnitId,
    defender_id: UnitId,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    let attacker = battle
        .unit(attacker_id)
        .ok_or(EngineError::Invariant("attacker is gone"))?
        .clone();
    let defender = battle
        .unit(defender_id)
        .ok_or(EngineError::Invariant("defender is gone"))?
        .clone();
    let stats = attacker.stats();

    let roll = battle.roll(stats.atk_min, stats.atk_max) as i32;
    let attack = roll + attack_bonus(battle, &attacker, &defender);
    let defence = defence_value(battle, &defender);
    let damage = damage_from(attack, defence, attacker.health, defender.health);
    tracing::debug!(
        attacker = attacker_id.get(),
        defender = defender_id.get(),
        attack,
        defence,
        damage,
        "strike"
    );

    let survives = defender.health > damage;
    let poison = (survives && stats.poison_period > 0).then_some(stats.poison_period);
    {
        let unit = battle
            .unit_mut(defender_id)
            .ok_or(EngineError::Invariant("defender is gone"))?;
        unit.health -= damage;
        if let Some(period) = poison {
            unit.poison_count = period;
        }
    }
    events.push(Event::UpdateUnit {
        id: defender_id,
        changes: UnitChanges {
            health: Some(defender.health - damage),
            poison_count: poison,
            ..Default::default()
        },
    });

    award_xp(battle, attacker_id, damage, events)?;

    if !survives {
        kill_unit(battle, defender_id, events)?;
    }
    Ok(())
}

fn attack_bonus(battle: &Battle, attacker: &Unit, defender: &Unit) -> i32 {
    let stats = attacker.stats();
    let mut bonus = PER_LEVEL_BONUS * attacker.level as i32;
    if stats.move_class == MoveClass::Flow
        && battle.terrain_kind(defender.cell) == Some(TerrainKind::Water)
    {
        bonus += WATER_ATTACK_BONUS;
    }
    if defender.stats().move_class == MoveClass::Fly {
        bonus += stats.bonus_vs_fly;
    }
    if defender.kind == UnitKind::Skeleton {
        bonus += stats.bonus_vs_skeleton;
    }
    if attacker.poison_count > 0 {
        bonus -= POISON_COMBAT_PENALTY;
    }
    // Aura support is reserved in the catalog and contributes nothing yet.
    bonus
}

fn defence_value(battle: &Battle, defender: &Unit) -> i32 {
    let mut value = defender.stats().def
        + PER_LEVEL_BONUS * defender.level as i32
        + cell_defence_bonus(battle, defender);
    if defender.poison_count > 0 {
        value -= POISON_COMBAT_PENALTY;
    }
    value
}

/// Defence contributed by the cell a unit stands on: any building beats
/// water cover for flow units, which beats the plain terrain value.
pub(crate) fn cell_defence_bonus(battle: &Battle, unit: &Unit) -> i32 {
    if battle.building_at(unit.cell).is_some() {
        return BUILDING_DEFENCE_BONUS;
    }
    let kind = battle.terrain_kind(unit.cell);
    if unit.stats().move_class == MoveClass::Flow && kind == Some(TerrainKind::Water) {
        return WATER_DEFENCE_BONUS;
    }
    kind.map_or(0, |kind| kind.stats().defence)
}

/// Damage of one blow: the attack/defence margin scaled by the attacker's
/// remaining health, rounded half up, at least one point, capped at the
/// defender's health.
pub(crate) fn damage_from(
    attack: i32,
    defence: i32,
    attacker_health: u32,
    defender_health: u32,
) -> u32 {
    let scaled = (attack - defence) * attacker_health as i32;
    let rounded = (scaled + 50).div_euclid(100);
    (rounded.max(1) as u32).min(defender_health)
}

/// Adds experience, rederives the level, and mirrors both onto the owner's
/// commander record when the unit is the linked commander.
fn award_xp(
    battle: &mut Battle,
    unit_id: UnitId,
    amount: u32,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    let (owner, xp, level) = {
        let unit = battle
            .unit_mut(unit_id)
            .ok_or(EngineError::Invariant("experience recipient is gone"))?;
        unit.xp += amount;
        unit.level = level_for_xp(unit.xp);
        (unit.owner, unit.xp, unit.level)
    };
    if let Some(owner) = owner {
        if let Some(player) = battle.player_mut(owner) {
            if player.commander.unit == Some(unit_id) {
                player.commander.xp = xp;
                player.commander.level = level;
            }
        }
    }
    events.push(Event::UpdateUnit {
        id: unit_id,
        changes: UnitChanges {
            xp: Some(xp),
            level: Some(level),
            ..Default::default()
        },
    });
    Ok(())
}

/// Removes a dead unit from the board.
///
/// A linked commander unit is unlinked from its record instead of leaving a
/// grave, and its owner is checked for defeat. Every other unit leaves a
/// grave; the catalog's no-grave flag is deliberately not consulted here.
pub(crate) fn kill_unit(
    battle: &mut Battle,
    unit_id: UnitId,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    let index = battle
        .units
        .iter()
        .position(|unit| unit.id == unit_id)
        .ok_or(EngineError::Invariant("dead unit is gone"))?;
    let unit = battle.units.remove(index);
    events.push(Event::DeleteUnit { id: unit_id });

    if battle.selected_unit == Some(unit_id) {
        battle.selected_unit = None;
        events.push(Event::ClearSelectedUnit);
    }

    let commander_owner = unit.owner.filter(|owner| {
        battle
            .player(*owner)
            .is_some_and(|player| player.commander.unit == Some(unit_id))
    });
    if let Some(owner) = commander_owner {
        let player = battle
            .player_mut(owner)
            .ok_or(EngineError::Invariant("owner is gone"))?;
        player.commander.unit = None;
        player.commander.death_count += 1;
        defeat::check_defeat(battle, owner, events)?;
    } else {
        let id = battle.fresh_grave_id();
        battle.graves.push(Grave {
            id,
            cell: unit.cell,
            ttl: GRAVE_TTL,
        });
        events.push(Event::AddGraves {
            graves: vec![GraveSnapshot {
                id,
                x: unit.cell.x(),
                y: unit.cell.y(),
            }],
        });
    }
    Ok(())
}

/// Knocks a building into the destroyed state and strips its owner.
/// Demolition awards no experience and draws no strike-back.
pub(crate) fn attack_building(
    battle: &mut Battle,
    unit_id: UnitId,
    cell: Cell,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    battle
        .unit_mut(unit_id)
        .ok_or(EngineError::Invariant("attacker is gone"))?
        .did_attack = true;
    let (building_id, previous_owner) = {
        let building = battle
            .building_at_mut(cell)
            .ok_or(EngineError::Invariant("demolition target is gone"))?;
        building.state = BuildingState::Destroyed;
        let previous = building.owner.take();
        (building.id, previous)
    };
    events.push(Event::UpdateBuilding {
        id: building_id,
        changes: BuildingChanges {
            state: Some(BuildingState::Destroyed),
            color: None,
        },
    });
    if let Some(previous) = previous_owner {
        defeat::check_defeat(battle, previous, events)?;
    }
    Ok(())
}

/// Consumes a grave and raises a fresh skeleton for the raiser's player.
/// The skeleton spawns with every flag set and cannot act this turn.
pub(crate) fn raise_skeleton(
    battle: &mut Battle,
    unit_id: UnitId,
    cell: Cell,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    let owner = {
        let unit = battle
            .unit_mut(unit_id)
            .ok_or(EngineError::Invariant("raiser is gone"))?;
        unit.did_attack = true;
        unit.owner
    };
    let grave_id = battle
        .grave_at(cell)
        .ok_or(EngineError::Invariant("raised grave is gone"))?
        .id;
    battle.graves.retain(|grave| grave.id != grave_id);
    events.push(Event::DeleteGrave { id: grave_id });

    let id = battle.fresh_unit_id();
    battle.units.push(Unit {
        id,
        owner,
        kind: UnitKind::Skeleton,
        cell,
        health: DEFAULT_HEALTH,
        xp: 0,
        level: 0,
        poison_count: 0,
        did_move: true,
        did_attack: true,
        did_fix: true,
        did_occupy: true,
    });
    let color = owner.and_then(|owner| battle.player(owner)).map(|p| p.color);
    events.push(Event::AddUnit {
        unit: UnitSnapshot {
            id,
            x: cell.x(),
            y: cell.y(),
            kind: UnitKind::Skeleton,
            color,
            level: 0,
            health: DEFAULT_HEALTH,
            state: "waiting".to_owned(),
            active: None,
        },
    });
    Ok(())
}
