//! Unit store: listings for selling buildings and purchase handling.

use warbound_core::catalog::{ALL_UNIT_KINDS, COMMANDER_SURCHARGE, DEFAULT_HEALTH};
use warbound_core::{
    BuildingState, Cell, EngineError, Event, StoreItem, UnitKind, UnitSnapshot,
};

use crate::{Battle, Player, Unit};

/// Store listing offered by the building on `cell`, or `None` when the cell
/// hosts no store the active player may use right now.
pub(crate) fn store_listing_at(battle: &Battle, cell: Cell) -> Option<Vec<StoreItem>> {
    let building = battle.building_at(cell)?;
    if !building.kind.stats().sells_units
        || building.state != BuildingState::Normal
        || building.owner != Some(battle.active_player)
        || battle.unit_at(cell).is_some()
    {
        return None;
    }
    let player = battle.player(battle.active_player)?;
    let unit_count = battle.unit_count(player.id);

    let mut items: Vec<StoreItem> = ALL_UNIT_KINDS
        .into_iter()
        .filter_map(|kind| offered_price(player, kind).map(|cost| (kind, cost)))
        .map(|(kind, cost)| {
            let stats = kind.stats();
            StoreItem {
                kind,
                name: stats.name.to_owned(),
                description: stats.description.to_owned(),
                color: player.color,
                atk_min: stats.atk_min,
                atk_max: stats.atk_max,
                def: stats.def,
                mov: stats.mov,
                cost,
                available: cost <= player.money && unit_count < player.unit_limit,
            }
        })
        .collect();
    items.sort_by_key(|item| item.cost);
    Some(items)
}

/// Price at which the store offers `kind` to `player`, or `None` when the
/// prototype is not for sale. Commanders are offered only to the player
/// whose own commander fell, surcharged per prior death.
fn offered_price(player: &Player, kind: UnitKind) -> Option<u32> {
    let stats = kind.stats();
    if !stats.purchasable || stats.cost == 0 {
        return None;
    }
    if kind.is_commander_character() {
        let commander = &player.commander;
        if kind != commander.character || commander.unit.is_some() {
            return None;
        }
        return Some(stats.cost + COMMANDER_SURCHARGE * commander.death_count);
    }
    Some(stats.cost)
}

/// Purchases a unit at the store building on `store_cell` for the active
/// player. The recruit spawns with every flag set and cannot act on its
/// purchase turn; a re-bought commander relinks and keeps its record's
/// experience.
pub(crate) fn buy_unit(
    battle: &mut Battle,
    kind: UnitKind,
    store_cell: Cell,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    let is_store = battle.building_at(store_cell).is_some_and(|building| {
        building.kind.stats().sells_units
            && building.state == BuildingState::Normal
            && building.owner == Some(battle.active_player)
    });
    if !is_store {
        return Err(EngineError::NotFound("store building"));
    }

    let buyer = battle.active_player;
    let (price, commander_purchase, color) = {
        let player = battle
            .player(buyer)
            .ok_or(EngineError::Invariant("active player is gone"))?;
        let price = offered_price(player, kind)
            .ok_or(EngineError::InvalidAction("the store does not offer this unit"))?;
        if price > player.money {
            return Err(EngineError::InvalidAction("cannot afford the unit"));
        }
        if battle.unit_count(buyer) >= player.unit_limit {
            return Err(EngineError::InvalidAction("unit limit reached"));
        }
        (price, kind.is_commander_character(), player.color)
    };
    if battle.unit_at(store_cell).is_some() {
        return Err(EngineError::InvalidAction("store cell is occupied"));
    }

    let id = battle.fresh_unit_id();
    let (xp, level) = {
        let player = battle
            .player_mut(buyer)
            .ok_or(EngineError::Invariant("active player is gone"))?;
        player.money -= price;
        if commander_purchase {
            player.commander.unit = Some(id);
            (player.commander.xp, player.commander.level)
        } else {
            (0, 0)
        }
    };
    battle.units.push(Unit {
        id,
        owner: Some(buyer),
        kind,
        cell: store_cell,
        health: DEFAULT_HEALTH,
        xp,
        level,
        poison_count: 0,
        did_move: true,
        did_attack: true,
        did_fix: true,
        did_occupy: true,
    });
    tracing::debug!(player = buyer.get(), ?kind, price, "unit purchased");

    events.push(Event::AddUnit {
        unit: UnitSnapshot {
            id,
            x: store_cell.x(),
            y: store_cell.y(),
            kind,
            color: Some(color),
            level,
            health: DEFAULT_HEALTH,
            state: "waiting".to_owned(),
            active: None,
        },
    });
    let (unit_limit, money) = {
        let player = battle.active()?;
        (player.unit_limit, player.money)
    };
    events.push(Event::UpdateStatus {
        color,
        unit_count: battle.unit_count(buyer),
        unit_limit,
        money,
        winner_team: battle.winner_team,
        income: None,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use warbound_core::{BuildingKind, PlayerId};

    fn battle_with_store() -> (Battle, Cell) {
        let mut battle = flat_battle(8, 8);
        let cell = Cell::new(1, 1);
        let _ = add_building(
            &mut battle,
            Some(1),
            BuildingKind::Castle,
            BuildingState::Normal,
            cell,
        );
        // Field the commander so no commander row is on offer by default.
        let commander = add_unit(&mut battle, 1, UnitKind::Galamar, Cell::new(0, 0));
        battle.player_mut(PlayerId::new(1)).expect("player").commander.unit = Some(commander);
        (battle, cell)
    }

    #[test]
    fn the_listing_is_sorted_and_hides_unsellable_prototypes() {
        let (battle, cell) = battle_with_store();
        let items = store_listing_at(&battle, cell).expect("listing");

        assert!(items.windows(2).all(|pair| pair[0].cost <= pair[1].cost));
        let kinds: Vec<UnitKind> = items.iter().map(|item| item.kind).collect();
        assert!(kinds.contains(&UnitKind::Soldier));
        assert!(kinds.contains(&UnitKind::Dragon));
        assert!(!kinds.contains(&UnitKind::Skeleton));
        assert!(!kinds.contains(&UnitKind::Crystal));
        assert!(!kinds.contains(&UnitKind::SaethHeavensFury));
        // The commander is alive on the field, so no commander row is offered.
        assert!(kinds.iter().all(|kind| !kind.is_commander_character()));

        let soldier = items
            .iter()
            .find(|item| item.kind == UnitKind::Soldier)
            .expect("soldier row");
        assert_eq!(soldier.cost, 150);
        assert!(soldier.available);
        let dragon = items
            .iter()
            .find(|item| item.kind == UnitKind::Dragon)
            .expect("dragon row");
        assert!(!dragon.available, "1000 gold exceeds the treasury");
    }

    #[test]
    fn only_own_normal_free_castles_sell() {
        let (mut battle, cell) = battle_with_store();
        assert!(store_listing_at(&battle, cell).is_some());

        let _ = add_unit(&mut battle, 1, UnitKind::Soldier, cell);
        assert!(store_listing_at(&battle, cell).is_none(), "occupied");
        battle.units.clear();

        battle.buildings[0].state = BuildingState::Destroyed;
        assert!(store_listing_at(&battle, cell).is_none(), "destroyed");
        battle.buildings[0].state = BuildingState::Normal;

        battle.buildings[0].owner = Some(PlayerId::new(2));
        assert!(store_listing_at(&battle, cell).is_none(), "enemy store");
        battle.buildings[0].owner = Some(PlayerId::new(1));

        battle.buildings[0].kind = BuildingKind::Farm;
        assert!(store_listing_at(&battle, cell).is_none(), "farms do not sell");
    }

    #[test]
    fn a_lost_commander_returns_to_the_shelf_with_a_surcharge() {
        let (mut battle, cell) = battle_with_store();
        {
            let commander = &mut battle.player_mut(PlayerId::new(1)).expect("player").commander;
            commander.unit = None;
            commander.death_count = 1;
        }
        let items = store_listing_at(&battle, cell).expect("listing");
        let row = items
            .iter()
            .find(|item| item.kind == UnitKind::Galamar)
            .expect("commander row");
        assert_eq!(row.cost, 400);
        // The enemy commander is never on offer.
        assert!(items.iter().all(|item| item.kind != UnitKind::Saeth));
    }

    #[test]
    fn buying_spawns_a_spent_unit_and_charges_the_treasury() {
        let (mut battle, cell) = battle_with_store();
        let mut events = Vec::new();
        buy_unit(&mut battle, UnitKind::Soldier, cell, &mut events).expect("buy");

        let unit = battle.unit_at(cell).expect("recruit");
        assert_eq!(unit.kind, UnitKind::Soldier);
        assert_eq!(unit.owner, Some(PlayerId::new(1)));
        assert!(unit.acted_this_turn(), "recruits cannot act on arrival");
        assert_eq!(battle.player(PlayerId::new(1)).expect("player").money, 350);
        assert!(events.iter().any(|event| matches!(event, Event::AddUnit { .. })));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::UpdateStatus { money: 350, unit_count: 2, .. }
        )));
    }

    #[test]
    fn purchase_validation_rejects_each_broken_precondition() {
        let (mut battle, cell) = battle_with_store();
        let mut events = Vec::new();

        assert_eq!(
            buy_unit(&mut battle, UnitKind::Dragon, cell, &mut events),
            Err(EngineError::InvalidAction("cannot afford the unit"))
        );
        assert_eq!(
            buy_unit(&mut battle, UnitKind::Crystal, cell, &mut events),
            Err(EngineError::InvalidAction("the store does not offer this unit"))
        );
        assert_eq!(
            buy_unit(&mut battle, UnitKind::Saeth, cell, &mut events),
            Err(EngineError::InvalidAction("the store does not offer this unit"))
        );
        assert_eq!(
            buy_unit(&mut battle, UnitKind::Soldier, Cell::new(4, 4), &mut events),
            Err(EngineError::NotFound("store building"))
        );

        battle.player_mut(PlayerId::new(1)).expect("player").unit_limit = 0;
        assert_eq!(
            buy_unit(&mut battle, UnitKind::Soldier, cell, &mut events),
            Err(EngineError::InvalidAction("unit limit reached"))
        );
        battle.player_mut(PlayerId::new(1)).expect("player").unit_limit = 10;

        let _ = add_unit(&mut battle, 1, UnitKind::Soldier, cell);
        assert_eq!(
            buy_unit(&mut battle, UnitKind::Soldier, cell, &mut events),
            Err(EngineError::InvalidAction("store cell is occupied"))
        );
        assert!(events.is_empty());
        assert_eq!(battle.player(PlayerId::new(1)).expect("player").money, 500);
    }

    #[test]
    fn a_rebought_commander_relinks_and_keeps_its_record() {
        let (mut battle, cell) = battle_with_store();
        {
            let commander = &mut battle.player_mut(PlayerId::new(1)).expect("player").commander;
            commander.unit = None;
            commander.death_count = 1;
            commander.xp = 200;
            commander.level = 2;
        }
        let mut events = Vec::new();
        buy_unit(&mut battle, UnitKind::Galamar, cell, &mut events).expect("rebuy");

        let unit = battle.unit_at(cell).expect("commander").clone();
        assert_eq!(unit.kind, UnitKind::Galamar);
        assert_eq!(unit.xp, 200);
        assert_eq!(unit.level, 2);
        let player = battle.player(PlayerId::new(1)).expect("player");
        assert_eq!(player.commander.unit, Some(unit.id));
        assert_eq!(player.money, 100, "base 200 plus one death surcharge");
    }
}
