use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

pub mod frame;

/// Hard cap on simultaneously connected controllers.
pub const MAX_CONTROLLERS: usize = 2;
/// Highest board position; reaching it (or beyond) wins the game.
pub const BOARD_MAX: u32 = 80;
pub const WORDS_PER_CARD: usize = 10;
/// Number of cards drawn for an untimed special turn.
pub const SPECIAL_TURN_CARDS: usize = 5;

/// How often the host pings controllers and sweeps for dead links.
pub const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(2);
/// A controller silent for longer than this is considered gone, even if the
/// transport still reports the link as open.
pub const STALE_TIMEOUT: Duration = Duration::from_secs(5);
/// Grace period between sending CONNECTION_REJECTED and closing the link,
/// so the rejection has a chance to flush.
pub const REJECT_CLOSE_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TeamColor {
    Blue,
    Red,
}

impl TeamColor {
    pub fn opponent(self) -> TeamColor {
        match self {
            TeamColor::Blue => TeamColor::Red,
            TeamColor::Red => TeamColor::Blue,
        }
    }

    /// Index into the host's two-team array (blue always first).
    pub fn index(self) -> usize {
        match self {
            TeamColor::Blue => 0,
            TeamColor::Red => 1,
        }
    }
}

impl fmt::Display for TeamColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamColor::Blue => write!(f, "blue"),
            TeamColor::Red => write!(f, "red"),
        }
    }
}

impl FromStr for TeamColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "blue" => Ok(TeamColor::Blue),
            "red" => Ok(TeamColor::Red),
            other => Err(format!("unknown team color: {}", other)),
        }
    }
}

/// A word card: ten words, one per board digit.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: u32,
    pub words: Vec<String>,
}

impl Card {
    pub fn word_at(&self, digit: usize) -> &str {
        &self.words[digit]
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    TurnActive,
    TurnEnd,
    SpecialTurn,
    Winner,
}

/// A word guessed correctly this turn, numbered in guess order.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct GuessedWord {
    pub word: String,
    pub number: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    Correct,
    Skip,
    Pause,
    Resume,
    StartTurn,
    SpecialTeamGuessed,
    SpecialOpponentGuessed,
}

/// Per-controller view of the authoritative game state, recomputed by the
/// host for every send. `current_card` is only populated when this
/// controller is allowed to see the word.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct GameSyncState {
    pub current_card: Option<Card>,
    pub current_word_index: usize,
    pub timer_active: bool,
    pub time_left: u32,
    pub team_color: TeamColor,
    pub team_name: String,
    pub is_paused: bool,
    pub active_team_color: TeamColor,
    pub connection_count: usize,
    pub can_start_turn: bool,
    pub game_phase: Phase,
    pub current_turn_correct_words: Vec<GuessedWord>,
    pub is_multiplayer: bool,
    // Special turn fields, only meaningful while game_phase == SpecialTurn
    pub special_turn_card: Option<Card>,
    pub special_turn_card_index: usize,
    pub special_turn_team_position: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub enum Packet {
    Identify {
        controller_id: String,
        requested_team: Option<TeamColor>,
    },
    SyncState {
        payload: Box<GameSyncState>,
    },
    Action {
        payload: GameAction,
    },
    ConnectionRejected {
        reason: String,
    },
    Ping,
    Pong,
}

/// Which of a card's ten words applies at a given board position.
pub fn digit_at(position: u32) -> usize {
    (position % 10) as usize
}

/// Board positions that force an untimed 5-card special turn.
///
/// Decreasing-step walk: start at 7 with step 7; after each stop the step
/// shrinks by one, resetting back to 7 once it reaches 1.
pub fn special_positions() -> HashSet<u32> {
    let mut positions = HashSet::new();
    let mut current = 7u32;
    let mut step = 7u32;

    while current <= BOARD_MAX {
        positions.insert(current);
        step = (step - 1).max(1);
        if step == 1 {
            step = 7;
        }
        current += step;
    }

    positions
}

pub fn is_special_position(position: u32) -> bool {
    special_positions().contains(&position)
}

/// Net board movement for a normal turn.
pub fn calculate_movement(correct: u32, skipped: u32, allow_negative: bool) -> i32 {
    let movement = correct as i32 - skipped as i32;
    if allow_negative {
        movement
    } else {
        movement.max(0)
    }
}

/// Applies a movement to a board position, clamped to the board range.
pub fn apply_movement(position: u32, movement: i32) -> u32 {
    (position as i32 + movement).clamp(0, BOARD_MAX as i32) as u32
}

pub fn check_winner(position: u32) -> bool {
    position >= BOARD_MAX
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_card() -> Card {
        Card {
            id: 3,
            words: (0..10).map(|i| format!("word{}", i)).collect(),
        }
    }

    #[test]
    fn test_digit_at_position() {
        assert_eq!(digit_at(0), 0);
        assert_eq!(digit_at(7), 7);
        assert_eq!(digit_at(10), 0);
        assert_eq!(digit_at(80), 0);
        assert_eq!(digit_at(79), 9);
    }

    #[test]
    fn test_card_word_lookup() {
        let card = test_card();
        assert_eq!(card.word_at(0), "word0");
        assert_eq!(card.word_at(9), "word9");
    }

    #[test]
    fn test_special_positions_walk() {
        let positions = special_positions();

        // First cycle of the decreasing-step walk
        for p in [7, 13, 18, 22, 25, 27] {
            assert!(positions.contains(&p), "expected {} to be special", p);
        }
        // Step resets to 7 after reaching 1, so the next stop is 34 not 28
        assert!(!positions.contains(&28));
        for p in [34, 40, 45, 49, 52, 54, 61, 67, 72, 76, 79] {
            assert!(positions.contains(&p), "expected {} to be special", p);
        }

        assert_eq!(positions.len(), 17);
        assert!(positions.iter().all(|&p| p <= BOARD_MAX));
        assert!(!is_special_position(0));
        assert!(!is_special_position(80));
    }

    #[test]
    fn test_movement_calculation() {
        assert_eq!(calculate_movement(2, 1, false), 1);
        assert_eq!(calculate_movement(1, 4, false), 0);
        assert_eq!(calculate_movement(1, 4, true), -3);
        assert_eq!(calculate_movement(0, 0, false), 0);
    }

    #[test]
    fn test_apply_movement_clamps_to_board() {
        assert_eq!(apply_movement(79, 5), 80);
        assert_eq!(apply_movement(5, -10), 0);
        assert_eq!(apply_movement(0, 3), 3);
        assert_eq!(apply_movement(80, 1), 80);
    }

    #[test]
    fn test_winner_detection() {
        assert!(!check_winner(79));
        assert!(check_winner(80));
        assert!(check_winner(81));
    }

    #[test]
    fn test_team_color_parsing() {
        assert_eq!("blue".parse::<TeamColor>().unwrap(), TeamColor::Blue);
        assert_eq!("RED".parse::<TeamColor>().unwrap(), TeamColor::Red);
        assert!("green".parse::<TeamColor>().is_err());
        assert_eq!(TeamColor::Blue.opponent(), TeamColor::Red);
        assert_eq!(TeamColor::Red.index(), 1);
    }

    #[test]
    fn test_packet_serialization_identify() {
        let packet = Packet::Identify {
            controller_id: "ctrl-1".to_string(),
            requested_team: Some(TeamColor::Red),
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::Identify {
                controller_id,
                requested_team,
            } => {
                assert_eq!(controller_id, "ctrl-1");
                assert_eq!(requested_team, Some(TeamColor::Red));
            }
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_sync_state() {
        let state = GameSyncState {
            current_card: Some(test_card()),
            current_word_index: 3,
            timer_active: true,
            time_left: 42,
            team_color: TeamColor::Blue,
            team_name: "Blue".to_string(),
            is_paused: false,
            active_team_color: TeamColor::Blue,
            connection_count: 2,
            can_start_turn: false,
            game_phase: Phase::TurnActive,
            current_turn_correct_words: vec![GuessedWord {
                word: "word3".to_string(),
                number: 1,
            }],
            is_multiplayer: true,
            special_turn_card: None,
            special_turn_card_index: 0,
            special_turn_team_position: 0,
        };

        let packet = Packet::SyncState {
            payload: Box::new(state.clone()),
        };
        let serialized = bincode::serialize(&packet).unwrap();
        let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

        match deserialized {
            Packet::SyncState { payload } => assert_eq!(*payload, state),
            _ => panic!("Wrong packet type after deserialization"),
        }
    }

    #[test]
    fn test_packet_serialization_action() {
        for action in [
            GameAction::Correct,
            GameAction::Skip,
            GameAction::Pause,
            GameAction::Resume,
            GameAction::StartTurn,
            GameAction::SpecialTeamGuessed,
            GameAction::SpecialOpponentGuessed,
        ] {
            let packet = Packet::Action { payload: action };
            let serialized = bincode::serialize(&packet).unwrap();
            let deserialized: Packet = bincode::deserialize(&serialized).unwrap();

            match deserialized {
                Packet::Action { payload } => assert_eq!(payload, action),
                _ => panic!("Wrong packet type after deserialization"),
            }
        }
    }
}
