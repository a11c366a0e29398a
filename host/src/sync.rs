//! Projection of the host's authoritative state into the per-controller
//! sync payload. Pure function of game state plus registry, so the same
//! inputs always produce the same wire payload.

use crate::game::GameState;
use crate::registry::ControllerRegistry;
use shared::{digit_at, GameSyncState, Phase, TeamColor};

/// Builds the sync payload as seen by the controller on `team`.
///
/// Most fields are shared between the two controllers; `team_color`,
/// `team_name` and the card visibility differ. The full card is only sent
/// while that controller's team is the one playing, so the opposing phone
/// never has the answer on screen.
pub fn project(game: &GameState, registry: &ControllerRegistry, team: TeamColor) -> GameSyncState {
    let own = &game.teams[team.index()];
    let is_active = game.active_team_color() == team;
    let sole_controller = registry.len() == 1;

    let shows_card = match game.phase {
        Phase::TurnActive => is_active || sole_controller,
        Phase::SpecialTurn => true,
        _ => false,
    };

    let current_card = if shows_card && game.phase == Phase::TurnActive {
        game.current_card.clone()
    } else {
        None
    };

    let special_turn_card = if game.phase == Phase::SpecialTurn {
        game.special_cards.get(game.special_card_index).cloned()
    } else {
        None
    };

    GameSyncState {
        current_word_index: digit_at(game.current_team().position),
        current_card,
        timer_active: game.phase == Phase::TurnActive && !game.is_paused,
        time_left: game.time_left,
        team_color: team,
        team_name: own.name.clone(),
        is_paused: game.is_paused,
        active_team_color: game.active_team_color(),
        connection_count: registry.len(),
        can_start_turn: game.phase == Phase::Playing && !game.is_paused && (is_active || sole_controller),
        game_phase: game.phase,
        current_turn_correct_words: game.correct_words.clone(),
        is_multiplayer: registry.is_multiplayer(),
        special_turn_card,
        special_turn_card_index: game.special_card_index,
        special_turn_team_position: game.current_team().position,
    }
}
