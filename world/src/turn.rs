//! Turn rotation and the start-of-turn bookkeeping it triggers.

use std::collections::BTreeMap;

use warbound_core::catalog::DEFAULT_HEALTH;
use warbound_core::{BuildingState, EngineError, Event, UnitChanges, UnitDelta, UnitId};

use crate::Battle;

/// Ends the active player's turn and prepares the next live player's.
///
/// Drops the selection, resets the outgoing units' flags, rotates to the
/// next non-defeated player, expires graves, then pays income, heals
/// garrisoned units, and ticks down the incoming player's poison counters.
pub(crate) fn end_turn(battle: &mut Battle, events: &mut Vec<Event>) -> Result<(), EngineError> {
    if battle.selected_unit.take().is_some() {
        events.push(Event::ClearSelectedUnit);
    }

    let outgoing = battle.active_player;
    for unit in battle
        .units
        .iter_mut()
        .filter(|unit| unit.owner == Some(outgoing))
    {
        unit.did_move = false;
        unit.did_attack = false;
        unit.did_fix = false;
        unit.did_occupy = false;
    }

    let index = battle
        .players
        .iter()
        .position(|player| player.id == outgoing)
        .ok_or(EngineError::Invariant("active player is gone"))?;
    let count = battle.players.len();
    let mut next = None;
    for step in 1..=count {
        let candidate = (index + step) % count;
        if !battle.players[candidate].defeated {
            next = Some(candidate);
            break;
        }
    }
    let next = next.ok_or(EngineError::Invariant("no live player to receive the turn"))?;
    battle.turn_count += 1;
    if next <= index {
        battle.circle_count += 1;
    }
    let incoming = battle.players[next].id;
    battle.active_player = incoming;
    tracing::debug!(
        turn = battle.turn_count,
        player = incoming.get(),
        "turn handed over"
    );

    let mut expired = Vec::new();
    for grave in &mut battle.graves {
        grave.ttl = grave.ttl.saturating_sub(1);
    }
    battle.graves.retain(|grave| {
        if grave.ttl == 0 {
            expired.push(grave.id);
            false
        } else {
            true
        }
    });
    for id in expired {
        events.push(Event::DeleteGrave { id });
    }

    let income: u32 = battle
        .buildings
        .iter()
        .filter(|building| {
            building.owner == Some(incoming) && building.state == BuildingState::Normal
        })
        .map(|building| building.kind.stats().earn)
        .sum();
    battle
        .player_mut(incoming)
        .ok_or(EngineError::Invariant("incoming player is gone"))?
        .money += income;

    let mut changes: BTreeMap<UnitId, UnitChanges> = BTreeMap::new();

    let heals: Vec<(UnitId, u32)> = battle
        .units
        .iter()
        .filter(|unit| unit.owner == Some(incoming) && unit.health < DEFAULT_HEALTH)
        .filter_map(|unit| {
            let building = battle.building_at(unit.cell)?;
            if building.state != BuildingState::Normal {
                return None;
            }
            let stats = building.kind.stats();
            let heals_here = building.owner == Some(incoming)
                || (building.owner.is_none() && stats.heals_neutral);
            heals_here.then_some((unit.id, stats.heal))
        })
        .collect();
    for (id, amount) in heals {
        let unit = battle
            .unit_mut(id)
            .ok_or(EngineError::Invariant("healing unit is gone"))?;
        unit.health = (unit.health + amount).min(DEFAULT_HEALTH);
        changes.entry(id).or_default().health = Some(unit.health);
    }

    for unit in battle
        .units
        .iter_mut()
        .filter(|unit| unit.owner == Some(incoming) && unit.poison_count > 0)
    {
        unit.poison_count -= 1;
        changes.entry(unit.id).or_default().poison_count = Some(unit.poison_count);
    }

    if !changes.is_empty() {
        events.push(Event::UpdateUnits {
            units: changes
                .into_iter()
                .map(|(id, changes)| UnitDelta { id, changes })
                .collect(),
        });
    }

    let (color, unit_limit, money) = {
        let player = battle.active()?;
        (player.color, player.unit_limit, player.money)
    };
    events.push(Event::UpdateStatus {
        color,
        unit_count: battle.unit_count(incoming),
        unit_limit,
        money,
        winner_team: battle.winner_team,
        income: Some(income),
    });
    Ok(())
}
