//! Derived defeat state and victory detection.

use warbound_core::{BuildingKind, EngineError, Event, PlayerId};

use crate::Battle;

/// Re-derives the defeat state of one player after a death or an ownership
/// change that may have affected it.
///
/// A player falls when its commander is unlinked and it owns no castle. On
/// the transition its treasury splits evenly among surviving teammates
/// (remainder dropped); with no survivors left on the team, a single
/// remaining live team wins the battle. Defeated players' leftover units
/// and non-castle buildings stay on the map.
pub(crate) fn check_defeat(
    battle: &mut Battle,
    player_id: PlayerId,
    events: &mut Vec<Event>,
) -> Result<(), EngineError> {
    let (already_defeated, team, commander_linked) = {
        let player = battle
            .player(player_id)
            .ok_or(EngineError::Invariant("checked player is gone"))?;
        (player.defeated, player.team, player.commander.unit.is_some())
    };
    if already_defeated || commander_linked {
        return Ok(());
    }
    let owns_castle = battle
        .buildings
        .iter()
        .any(|building| building.kind == BuildingKind::Castle && building.owner == Some(player_id));
    if owns_castle {
        return Ok(());
    }

    tracing::info!(player = player_id.get(), "player defeated");
    let inheritance = {
        let player = battle
            .player_mut(player_id)
            .ok_or(EngineError::Invariant("checked player is gone"))?;
        player.defeated = true;
        std::mem::take(&mut player.money)
    };

    let survivors: Vec<PlayerId> = battle
        .players
        .iter()
        .filter(|player| player.team == team && !player.defeated)
        .map(|player| player.id)
        .collect();
    if survivors.is_empty() {
        let mut live_teams: Vec<u32> = battle
            .players
            .iter()
            .filter(|player| !player.defeated)
            .map(|player| player.team)
            .collect();
        live_teams.sort_unstable();
        live_teams.dedup();
        if let [winner] = live_teams[..] {
            battle.winner_team = Some(winner);
            tracing::info!(team = winner, "battle decided");
        }
    } else {
        let share = inheritance / survivors.len() as u32;
        for id in survivors {
            battle
                .player_mut(id)
                .ok_or(EngineError::Invariant("surviving teammate is gone"))?
                .money += share;
        }
    }

    let (color, unit_limit, money) = {
        let player = battle.active()?;
        (player.color, player.unit_limit, player.money)
    };
    events.push(Event::UpdateStatus {
        color,
        unit_count: battle.unit_count(battle.active_player),
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
    use warbound_core::{BuildingState, Cell, PlayerColor, UnitKind};

    #[test]
    fn a_castle_or_a_linked_commander_keeps_a_player_standing() {
        let mut battle = flat_battle(6, 6);
        let _ = add_building(
            &mut battle,
            Some(2),
            warbound_core::BuildingKind::Castle,
            BuildingState::Normal,
            Cell::new(1, 1),
        );
        let mut events = Vec::new();
        check_defeat(&mut battle, PlayerId::new(2), &mut events).expect("check");
        assert!(!battle.player(PlayerId::new(2)).expect("player").defeated);

        // Losing the castle is survivable while the commander lives.
        battle.buildings.clear();
        let commander = add_unit(&mut battle, 2, UnitKind::Saeth, Cell::new(3, 3));
        battle.player_mut(PlayerId::new(2)).expect("player").commander.unit = Some(commander);
        check_defeat(&mut battle, PlayerId::new(2), &mut events).expect("check");
        assert!(!battle.player(PlayerId::new(2)).expect("player").defeated);
    }

    #[test]
    fn the_inheritance_splits_evenly_among_surviving_teammates() {
        let mut battle = flat_battle(6, 6);
        battle
            .players
            .push(test_player(3, 2, PlayerColor::Green, UnitKind::Valadorn));
        battle
            .players
            .push(test_player(4, 2, PlayerColor::Black, UnitKind::DemonLord));
        // Teammates need a castle each to outlive the check.
        let _ = add_building(
            &mut battle,
            Some(3),
            warbound_core::BuildingKind::Castle,
            BuildingState::Normal,
            Cell::new(1, 1),
        );
        let _ = add_building(
            &mut battle,
            Some(4),
            warbound_core::BuildingKind::Castle,
            BuildingState::Normal,
            Cell::new(2, 2),
        );
        battle.player_mut(PlayerId::new(2)).expect("player").money = 300;

        let mut events = Vec::new();
        check_defeat(&mut battle, PlayerId::new(2), &mut events).expect("check");

        assert!(battle.player(PlayerId::new(2)).expect("player").defeated);
        assert_eq!(battle.player(PlayerId::new(2)).expect("player").money, 0);
        assert_eq!(battle.player(PlayerId::new(3)).expect("player").money, 650);
        assert_eq!(battle.player(PlayerId::new(4)).expect("player").money, 650);
        assert_eq!(battle.winner_team, None, "team two still stands");
    }

    #[test]
    fn odd_inheritance_drops_the_remainder() {
        let mut battle = flat_battle(6, 6);
        battle
            .players
            .push(test_player(3, 2, PlayerColor::Green, UnitKind::Valadorn));
        let _ = add_building(
            &mut battle,
            Some(3),
            warbound_core::BuildingKind::Castle,
            BuildingState::Normal,
            Cell::new(1, 1),
        );
        battle.player_mut(PlayerId::new(2)).expect("player").money = 301;
        battle
            .players
            .push(test_player(4, 2, PlayerColor::Black, UnitKind::DemonLord));
        let _ = add_building(
            &mut battle,
            Some(4),
            warbound_core::BuildingKind::Castle,
            BuildingState::Normal,
            Cell::new(2, 2),
        );

        let mut events = Vec::new();
        check_defeat(&mut battle, PlayerId::new(2), &mut events).expect("check");
        assert_eq!(battle.player(PlayerId::new(3)).expect("player").money, 650);
        assert_eq!(battle.player(PlayerId::new(4)).expect("player").money, 650);
    }

    #[test]
    fn the_last_standing_team_wins() {
        let mut battle = flat_battle(6, 6);
        let mut events = Vec::new();
        check_defeat(&mut battle, PlayerId::new(2), &mut events).expect("check");

        assert!(battle.player(PlayerId::new(2)).expect("player").defeated);
        assert_eq!(battle.winner_team, Some(1));
        assert!(events.iter().any(|event| matches!(
            event,
            Event::UpdateStatus { winner_team: Some(1), .. }
        )));
    }

    #[test]
    fn a_defeated_player_is_never_rechecked() {
        let mut battle = flat_battle(6, 6);
        battle.player_mut(PlayerId::new(2)).expect("player").defeated = true;
        battle.player_mut(PlayerId::new(2)).expect("player").money = 300;

        let mut events = Vec::new();
        check_defeat(&mut battle, PlayerId::new(2), &mut events).expect("check");
        assert_eq!(battle.player(PlayerId::new(2)).expect("player").money, 300);
        assert!(events.is_empty());
    }
}
