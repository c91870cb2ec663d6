//! Line-based moderator console used by the headless binary.

use thiserror::Error;

use crate::{
    services::controller::{ControllerInput, ModeratorKey},
    state::board::PlayerId,
};

/// One parsed console line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Forward to the controller.
    Input(ControllerInput),
    /// Hold a player's key down.
    Press(PlayerId),
    /// Release a player's key.
    Release(PlayerId),
    /// Single buzz, consumed once.
    Buzz(PlayerId),
    /// Print scores and phase.
    Status,
    /// Stop the program.
    Quit,
}

/// Lines that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsoleError {
    /// Blank line.
    #[error("empty command")]
    Empty,
    /// Missing or malformed argument.
    #[error("`{command}` expects {expected}")]
    Argument {
        /// Command word.
        command: String,
        /// What was expected.
        expected: &'static str,
    },
}

/// Parse a console line.
///
/// Player numbers are one-based like the buzzer buttons. Unknown words count as an
/// "any key" press.
pub fn parse_command(line: &str) -> Result<ConsoleCommand, ConsoleError> {
    let line = line.trim();
    let (word, rest) = line
        .split_once(char::is_whitespace)
        .map(|(word, rest)| (word, rest.trim()))
        .unwrap_or((line, ""));

    let key = |key: ModeratorKey| -> Result<ConsoleCommand, ConsoleError> {
        Ok(ConsoleCommand::Input(ControllerInput::Key(key)))
    };
    match word {
        "" => Err(ConsoleError::Empty),
        "j" | "accept" => key(ModeratorKey::Accept),
        "n" | "reject" => key(ModeratorKey::Reject),
        "back" => key(ModeratorKey::Back),
        "del" | "delete" => key(ModeratorKey::Delete),
        "u" | "undo" => key(ModeratorKey::Undo),
        "click" => {
            let mut coords = rest.split_whitespace().map(str::parse::<usize>);
            match (coords.next(), coords.next(), coords.next()) {
                (Some(Ok(column)), Some(Ok(row)), None) => {
                    Ok(ConsoleCommand::Input(ControllerInput::Pointer { column, row }))
                }
                _ => Err(argument(word, "a column and a row")),
            }
        }
        "name" => {
            let (player, name) = rest
                .split_once(char::is_whitespace)
                .ok_or_else(|| argument(word, "a player number and a name"))?;
            Ok(ConsoleCommand::Input(ControllerInput::NameEntered {
                player: player_arg(word, player)?,
                name: name.trim().to_string(),
            }))
        }
        "press" => Ok(ConsoleCommand::Press(player_arg(word, rest)?)),
        "release" => Ok(ConsoleCommand::Release(player_arg(word, rest)?)),
        "buzz" => Ok(ConsoleCommand::Buzz(player_arg(word, rest)?)),
        "status" => Ok(ConsoleCommand::Status),
        "quit" | "q" => Ok(ConsoleCommand::Quit),
        _ => key(ModeratorKey::Other),
    }
}

fn player_arg(command: &str, arg: &str) -> Result<PlayerId, ConsoleError> {
    match arg.as_bytes() {
        [byte] => PlayerId::from_button(*byte),
        _ => None,
    }
    .ok_or_else(|| argument(command, "a player number from 1 to 4"))
}

fn argument(command: &str, expected: &'static str) -> ConsoleError {
    ConsoleError::Argument {
        command: command.to_string(),
        expected,
    }
}
