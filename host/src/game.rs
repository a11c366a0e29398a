//! Authoritative turn/movement state machine, owned by the host.
//!
//! Phases: `Playing` (waiting for the current team to start) ->
//! `TurnActive` (timer running, words exposed) -> `TurnEnd` (opponent bonus
//! question, then acknowledgment) -> back to `Playing` or `Winner`. A team
//! sitting on a special board position is routed into `SpecialTurn` instead
//! of a timed turn. All transitions are total: an action in the wrong phase
//! is a no-op, never an error.

use crate::deck::{draw_card, draw_special_cards, used_key};
use log::{debug, info};
use rand::Rng;
use shared::{
    apply_movement, calculate_movement, check_winner, digit_at, is_special_position, Card,
    GameAction, GuessedWord, Phase, TeamColor, SPECIAL_TURN_CARDS,
};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub blue_team_name: String,
    pub red_team_name: String,
    pub turn_duration: u32,
    pub allow_negative: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            blue_team_name: "Blue".to_string(),
            red_team_name: "Red".to_string(),
            turn_duration: 60,
            allow_negative: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Team {
    pub name: String,
    pub position: u32,
    pub color: TeamColor,
}

/// Movement waiting to be applied once the turn-end screen is acknowledged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingMovement {
    pub team_index: usize,
    pub movement: i32,
    pub opponent_bonus: bool,
}

/// Finalized per-turn numbers, kept around for the turn-end display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnOutcome {
    pub correct: u32,
    pub skipped: u32,
    pub movement: i32,
    pub opponent_bonus: bool,
}

#[derive(Debug, Clone)]
pub struct GameState {
    pub teams: [Team; 2],
    pub current_team_index: usize,
    pub deck: Vec<Card>,
    pub used_words: HashSet<String>,
    pub phase: Phase,
    pub turn_duration: u32,
    pub allow_negative: bool,
    pub current_card: Option<Card>,
    pub turn_correct: u32,
    pub turn_skipped: u32,
    pub pending_movement: Option<PendingMovement>,
    pub turn_result: Option<TurnOutcome>,
    /// The word left unresolved on screen when the timer ran out.
    pub last_word: Option<String>,
    pub correct_words: Vec<GuessedWord>,
    pub special_cards: Vec<Card>,
    pub special_card_index: usize,
    pub special_team_points: u32,
    pub special_opponent_points: u32,
    pub is_paused: bool,
    pub time_left: u32,
}

impl GameState {
    pub fn new(config: GameConfig, deck: Vec<Card>) -> Self {
        Self {
            teams: [
                Team {
                    name: config.blue_team_name,
                    position: 0,
                    color: TeamColor::Blue,
                },
                Team {
                    name: config.red_team_name,
                    position: 0,
                    color: TeamColor::Red,
                },
            ],
            current_team_index: 0,
            deck,
            used_words: HashSet::new(),
            phase: Phase::Playing,
            turn_duration: config.turn_duration,
            allow_negative: config.allow_negative,
            current_card: None,
            turn_correct: 0,
            turn_skipped: 0,
            pending_movement: None,
            turn_result: None,
            last_word: None,
            correct_words: Vec::new(),
            special_cards: Vec::new(),
            special_card_index: 0,
            special_team_points: 0,
            special_opponent_points: 0,
            is_paused: false,
            time_left: config.turn_duration,
        }
    }

    pub fn current_team(&self) -> &Team {
        &self.teams[self.current_team_index]
    }

    pub fn active_team_color(&self) -> TeamColor {
        self.teams[self.current_team_index].color
    }

    fn opponent_index(&self) -> usize {
        1 - self.current_team_index
    }

    fn current_digit(&self) -> usize {
        digit_at(self.current_team().position)
    }

    /// The word currently on screen for the active team, if any.
    pub fn current_word(&self) -> Option<&str> {
        let digit = self.current_digit();
        self.current_card.as_ref().map(|c| c.word_at(digit))
    }

    pub fn winner(&self) -> Option<TeamColor> {
        if self.phase != Phase::Winner {
            return None;
        }
        self.teams
            .iter()
            .find(|t| check_winner(t.position))
            .map(|t| t.color)
    }

    /// Routes a controller-originated action into the matching transition.
    pub fn apply_action<R: Rng>(&mut self, action: GameAction, rng: &mut R) {
        match action {
            GameAction::Correct => self.correct(rng),
            GameAction::Skip => self.skip(rng),
            GameAction::Pause | GameAction::Resume => self.toggle_pause(),
            GameAction::StartTurn => self.start_turn(rng),
            GameAction::SpecialTeamGuessed => self.special_team_guessed(),
            GameAction::SpecialOpponentGuessed => self.special_opponent_guessed(),
        }
    }

    /// `Playing` -> `TurnActive`, or into a special turn when the current
    /// team sits on a special position. Ignored while paused.
    pub fn start_turn<R: Rng>(&mut self, rng: &mut R) {
        if self.phase != Phase::Playing || self.is_paused {
            return;
        }

        if is_special_position(self.current_team().position) {
            self.start_special_turn(rng);
            return;
        }

        let digit = self.current_digit();
        let Some(card) = draw_card(&self.deck, &self.used_words, digit, rng) else {
            debug!("start_turn with an empty deck; staying in Playing");
            return;
        };

        self.used_words.insert(used_key(card.id, digit));
        self.last_word = Some(card.word_at(digit).to_string());
        self.current_card = Some(card);
        self.turn_correct = 0;
        self.turn_skipped = 0;
        self.correct_words.clear();
        self.time_left = self.turn_duration;
        self.phase = Phase::TurnActive;
        info!(
            "{} team started a turn ({}s on the clock)",
            self.active_team_color(),
            self.turn_duration
        );
    }

    /// Current word guessed: record it, bump the counter, draw the next card.
    pub fn correct<R: Rng>(&mut self, rng: &mut R) {
        if self.phase != Phase::TurnActive || self.is_paused {
            return;
        }
        let digit = self.current_digit();
        let Some(guessed) = self.current_word().map(str::to_string) else {
            return;
        };
        let Some(next) = draw_card(&self.deck, &self.used_words, digit, rng) else {
            return;
        };

        self.turn_correct += 1;
        self.correct_words.push(GuessedWord {
            word: guessed,
            number: self.correct_words.len() as u32 + 1,
        });
        self.used_words.insert(used_key(next.id, digit));
        self.last_word = Some(next.word_at(digit).to_string());
        self.current_card = Some(next);
    }

    /// Current word skipped: bump the counter and draw the next card; the
    /// guessed-words list is untouched.
    pub fn skip<R: Rng>(&mut self, rng: &mut R) {
        if self.phase != Phase::TurnActive || self.is_paused {
            return;
        }
        let digit = self.current_digit();
        let Some(next) = draw_card(&self.deck, &self.used_words, digit, rng) else {
            return;
        };

        self.turn_skipped += 1;
        self.used_words.insert(used_key(next.id, digit));
        self.last_word = Some(next.word_at(digit).to_string());
        self.current_card = Some(next);
    }

    /// One-second timer tick. Returns whether anything observable changed.
    pub fn tick(&mut self) -> bool {
        if self.phase != Phase::TurnActive || self.is_paused || self.time_left == 0 {
            return false;
        }
        self.time_left -= 1;
        if self.time_left == 0 {
            self.end_turn();
        }
        true
    }

    /// Timer expired: finalize the movement and move to the turn-end screen.
    fn end_turn(&mut self) {
        let movement = calculate_movement(self.turn_correct, self.turn_skipped, self.allow_negative);
        self.last_word = self.current_word().map(str::to_string);
        self.turn_result = Some(TurnOutcome {
            correct: self.turn_correct,
            skipped: self.turn_skipped,
            movement,
            opponent_bonus: false,
        });
        self.pending_movement = Some(PendingMovement {
            team_index: self.current_team_index,
            movement,
            opponent_bonus: false,
        });
        // The card and guessed list must not linger into the next screen.
        self.current_card = None;
        self.correct_words.clear();
        self.phase = Phase::TurnEnd;
        info!(
            "turn over for {} team: {} correct, {} skipped, movement {}",
            self.active_team_color(),
            self.turn_correct,
            self.turn_skipped,
            movement
        );
    }

    /// The opponent's yes/no answer on the last unresolved word.
    pub fn answer_opponent_bonus(&mut self, guessed: bool) {
        if self.phase != Phase::TurnEnd || !guessed {
            return;
        }
        if let Some(pending) = self.pending_movement.as_mut() {
            pending.opponent_bonus = true;
        }
        if let Some(result) = self.turn_result.as_mut() {
            result.opponent_bonus = true;
        }
    }

    /// Turn-end acknowledged: apply the pending movement and hand the turn
    /// over, or finish the game.
    pub fn advance_turn(&mut self) {
        if self.phase != Phase::TurnEnd {
            return;
        }
        let Some(pending) = self.pending_movement.take() else {
            return;
        };

        let team = &mut self.teams[pending.team_index];
        team.position = apply_movement(team.position, pending.movement);

        if pending.opponent_bonus {
            let opponent = &mut self.teams[1 - pending.team_index];
            opponent.position = apply_movement(opponent.position, 1);
        }

        self.finish_turn_common(pending.team_index);
        self.turn_result = None;
    }

    /// `Playing` -> `SpecialTurn`: five cards for the current digit, all
    /// marked used up front, no timer.
    fn start_special_turn<R: Rng>(&mut self, rng: &mut R) {
        let digit = self.current_digit();
        let cards = draw_special_cards(&self.deck, &self.used_words, digit, SPECIAL_TURN_CARDS, rng);
        if cards.is_empty() {
            debug!("special turn requested with an empty deck; staying in Playing");
            return;
        }

        for card in &cards {
            self.used_words.insert(used_key(card.id, digit));
        }
        self.special_cards = cards;
        self.special_card_index = 0;
        self.special_team_points = 0;
        self.special_opponent_points = 0;
        self.correct_words.clear();
        self.time_left = self.turn_duration;
        self.phase = Phase::SpecialTurn;
        info!(
            "{} team entered a special turn at position {}",
            self.active_team_color(),
            self.current_team().position
        );
    }

    /// Special turn: the playing team got the word first. Not pause-gated,
    /// matching the long-standing behavior of the game.
    pub fn special_team_guessed(&mut self) {
        if self.phase != Phase::SpecialTurn || self.special_card_index >= self.special_cards.len() {
            return;
        }
        self.special_team_points += 1;
        self.special_card_index += 1;
    }

    /// Special turn: the opponent got the word first.
    pub fn special_opponent_guessed(&mut self) {
        if self.phase != Phase::SpecialTurn || self.special_card_index >= self.special_cards.len() {
            return;
        }
        self.special_opponent_points += 1;
        self.special_card_index += 1;
    }

    /// Applies both special-turn tallies unconditionally (no negative gate)
    /// and passes the turn.
    pub fn finish_special_turn(&mut self) {
        if self.phase != Phase::SpecialTurn {
            return;
        }

        let team_points = self.special_team_points as i32;
        let opponent_points = self.special_opponent_points as i32;
        let current = self.current_team_index;
        let opponent = self.opponent_index();

        self.teams[current].position = apply_movement(self.teams[current].position, team_points);
        self.teams[opponent].position =
            apply_movement(self.teams[opponent].position, opponent_points);

        self.special_cards.clear();
        self.special_card_index = 0;
        self.special_team_points = 0;
        self.special_opponent_points = 0;
        self.finish_turn_common(current);
    }

    /// Winner check plus turn hand-over shared by normal and special turns.
    fn finish_turn_common(&mut self, played_index: usize) {
        self.current_card = None;
        self.correct_words.clear();
        self.turn_correct = 0;
        self.turn_skipped = 0;
        self.pending_movement = None;

        if self.teams.iter().any(|t| check_winner(t.position)) {
            self.phase = Phase::Winner;
            info!(
                "game over: {} team wins at position {}",
                self.winner().map(|c| c.to_string()).unwrap_or_default(),
                self.teams.iter().map(|t| t.position).max().unwrap_or(0)
            );
        } else {
            self.current_team_index = 1 - played_index;
            self.phase = Phase::Playing;
        }
    }

    /// Pause toggle; both the PAUSE and RESUME actions land here.
    pub fn toggle_pause(&mut self) {
        if self.phase == Phase::Winner {
            return;
        }
        self.is_paused = !self.is_paused;
        info!("game {}", if self.is_paused { "paused" } else { "resumed" });
    }
}
