//! Console symbol mapping.

use crate::command::MoveCommand;
use crate::config::CONSOLE_STEP;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConsoleAction {
    Move(MoveCommand),
    /// Re-arm advertising after it expired.
    RestartAdvertising,
    Ignore,
}

/// `a`/`d` move left/right, `w`/`s` up/down, `r` restarts advertising.
pub fn map_symbol(byte: u8) -> ConsoleAction {
    match byte {
        b'a' => ConsoleAction::Move(MoveCommand::new(-CONSOLE_STEP, 0, 0)),
        b'd' => ConsoleAction::Move(MoveCommand::new(CONSOLE_STEP, 0, 0)),
        b'w' => ConsoleAction::Move(MoveCommand::new(0, -CONSOLE_STEP, 0)),
        b's' => ConsoleAction::Move(MoveCommand::new(0, CONSOLE_STEP, 0)),
        b'r' => ConsoleAction::RestartAdvertising,
        _ => ConsoleAction::Ignore,
    }
}
