//! Bluetooth Low Energy peripheral engine.
//!
//! The SoftDevice (or any other host controller) is an external actor:
//!
//! 1. **Host** - the narrow traits the engine calls into: start/stop
//!    advertising, delete a bond, notify/indicate a value.
//! 2. **Dispatcher** - consumes the closed set of [`dispatcher::HostEvent`]s
//!    the host controller delivers and turns them into state changes and
//!    advertising actions.
//! 3. **Connection** - the single active link and its subscription flags,
//!    published to report producers as a read-only snapshot.
//! 4. **Advertising** - advertisement payload encoding and the start/stop
//!    controller.

pub mod advertising;
pub mod bonds;
pub mod connection;
pub mod dispatcher;
pub mod host;

/// Opaque link identifier assigned by the host controller.
pub type ConnHandle = u16;

/// ATT attribute handle.
pub type AttrHandle = u16;

/// Bluetooth device address of a peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PeerAddress {
    /// Address type (public, random static, ...), as reported by the host.
    pub kind: u8,
    /// Little-endian address bytes.
    pub bytes: [u8; 6],
}

impl PeerAddress {
    pub const fn new(kind: u8, bytes: [u8; 6]) -> Self {
        Self { kind, bytes }
    }
}
