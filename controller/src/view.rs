//! Text rendering of the synced game state for the console controller.

use shared::{GameSyncState, Phase};

/// Formats a sync payload into the lines shown on the controller.
pub fn render_sync(state: &GameSyncState) -> String {
    let mut out = String::new();

    out.push_str(&format!(
        "[{} team] phase: {:?}{}\n",
        state.team_color,
        state.game_phase,
        if state.is_paused { " (paused)" } else { "" }
    ));
    out.push_str(&format!(
        "connections: {}{}, active team: {}\n",
        state.connection_count,
        if state.is_multiplayer { " (multiplayer)" } else { "" },
        state.active_team_color
    ));

    match state.game_phase {
        Phase::Playing => {
            if state.can_start_turn {
                out.push_str("your turn: type 'start' to begin\n");
            } else {
                out.push_str("waiting for the other team\n");
            }
        }
        Phase::TurnActive => {
            out.push_str(&format!("time left: {}s\n", state.time_left));
            if let Some(card) = &state.current_card {
                out.push_str(&format!(
                    "word #{}: {}\n",
                    state.current_word_index,
                    card.word_at(state.current_word_index)
                ));
            }
            for guessed in &state.current_turn_correct_words {
                out.push_str(&format!("  {}. {}\n", guessed.number, guessed.word));
            }
        }
        Phase::TurnEnd => {
            out.push_str("turn over, waiting for the board\n");
        }
        Phase::SpecialTurn => {
            out.push_str(&format!(
                "special turn at position {} (card {} of 5)\n",
                state.special_turn_team_position,
                state.special_turn_card_index + 1
            ));
            if let Some(card) = &state.special_turn_card {
                out.push_str(&format!(
                    "word: {}\n",
                    card.word_at(state.current_word_index)
                ));
            }
        }
        Phase::Winner => {
            out.push_str("game over\n");
        }
    }

    out
}
