//! Movement commands produced by the console and the HTTP gateway.

use embassy_sync::channel::{Channel, Receiver, Sender};
use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::config::MOVE_QUEUE_DEPTH;
use crate::hid::report::{MouseReport, BUTTON_MASK};

/// One relative move, optionally with buttons held.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MoveCommand {
    pub dx: i8,
    pub dy: i8,
    pub button: u8,
}

impl MoveCommand {
    pub const fn new(dx: i8, dy: i8, button: u8) -> Self {
        Self { dx, dy, button }
    }

    /// Report carrying this move. Unused button bits are dropped, the
    /// wheel is never moved.
    pub const fn to_report(self) -> MouseReport {
        MouseReport::new(self.button & BUTTON_MASK, self.dx, self.dy, 0)
    }
}

/// Producer to notifier queue.
pub type MoveChannel<M> = Channel<M, MoveCommand, MOVE_QUEUE_DEPTH>;

pub type MoveSender<'a, M> = Sender<'a, M, MoveCommand, MOVE_QUEUE_DEPTH>;

pub type MoveReceiver<'a, M> = Receiver<'a, M, MoveCommand, MOVE_QUEUE_DEPTH>;

/// Queue `cmd` without waiting. A full queue drops the command.
pub fn enqueue<M: RawMutex>(tx: &MoveSender<'_, M>, cmd: MoveCommand) -> bool {
    match tx.try_send(cmd) {
        Ok(()) => true,
        Err(_) => {
            warn!("move queue full, dropping {:?}", cmd);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    #[test]
    fn report_masks_buttons_and_zeroes_wheel() {
        let report = MoveCommand::new(5, -3, 0xFF).to_report();
        assert_eq!(report.to_bytes(), [0x07, 0x05, 0xFD, 0x00]);
    }

    #[test]
    fn enqueue_drops_when_full() {
        let channel: MoveChannel<CriticalSectionRawMutex> = Channel::new();
        let tx = channel.sender();
        for i in 0..MOVE_QUEUE_DEPTH {
            assert!(enqueue(&tx, MoveCommand::new(i as i8, 0, 0)));
        }
        assert!(!enqueue(&tx, MoveCommand::new(1, 1, 1)));
        assert_eq!(channel.try_receive().unwrap(), MoveCommand::new(0, 0, 0));
    }
}
