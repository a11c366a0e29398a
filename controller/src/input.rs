//! Maps console input to game actions.

use shared::GameAction;

/// Parses a console line into an action. Unknown input yields `None`.
pub fn parse_command(line: &str) -> Option<GameAction> {
    match line.trim().to_lowercase().as_str() {
        "correct" | "c" => Some(GameAction::Correct),
        "skip" | "s" => Some(GameAction::Skip),
        "start" => Some(GameAction::StartTurn),
        "pause" => Some(GameAction::Pause),
        "resume" => Some(GameAction::Resume),
        "us" => Some(GameAction::SpecialTeamGuessed),
        "them" => Some(GameAction::SpecialOpponentGuessed),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("correct"), Some(GameAction::Correct));
        assert_eq!(parse_command("c"), Some(GameAction::Correct));
        assert_eq!(parse_command("skip"), Some(GameAction::Skip));
        assert_eq!(parse_command("  START  "), Some(GameAction::StartTurn));
        assert_eq!(parse_command("pause"), Some(GameAction::Pause));
        assert_eq!(parse_command("resume"), Some(GameAction::Resume));
        assert_eq!(parse_command("us"), Some(GameAction::SpecialTeamGuessed));
        assert_eq!(parse_command("them"), Some(GameAction::SpecialOpponentGuessed));
        assert_eq!(parse_command("banana"), None);
        assert_eq!(parse_command(""), None);
    }
}
