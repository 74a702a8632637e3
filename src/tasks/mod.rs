//! Movement producers.
//!
//! - `console`: UARTE0 keystrokes, straight to the notifier
//! - `gateway`: HTTP request lines from the network co-processor on
//!   UARTE1, queued on the movement channel
//! - `movement`: drains the channel into the notifier

pub mod console;
pub mod gateway;
pub mod movement;

use ble_hid_mouse::command::MoveChannel;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

pub type Moves = MoveChannel<CriticalSectionRawMutex>;
