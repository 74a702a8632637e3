//! BLE HID-over-GATT mouse: protocol engine.
//!
//! Everything here is `no_std` and free of hardware access so it can be
//! tested on the host:
//!
//! - [`hid`]: mouse report, report map and fixed characteristic values
//! - [`gatt`]: attribute tree, access contract and registration
//! - [`ble`]: host-controller seams, connection state, advertising and
//!   the GAP/GATT event dispatcher
//! - [`notifier`]: the producer entry point (`submit_move`)
//! - [`command`], [`http`], [`console`]: movement producers' parsing
//!
//! Usage: `cargo test` on the host. The firmware (`src/main.rs`) needs
//! `--features embedded` and a thumbv7em target.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod ble;
pub mod command;
pub mod config;
pub mod console;
pub mod error;
pub mod gatt;
pub mod hid;
pub mod http;
pub mod notifier;

pub use ble::dispatcher::{Dispatcher, EventReply, HostEvent};
pub use command::MoveCommand;
pub use error::Error;
pub use hid::MouseReport;
pub use notifier::{Delivery, ReportNotifier};
