//! SoftDevice S140 binding for the protocol engine.
//!
//! 1. **Server** - registers the attribute tree through `ServiceBuilder`
//!    and turns GATT writes into dispatcher events.
//! 2. **Host** - [`HostController`](ble_hid_mouse::ble::host::HostController)
//!    and [`ReportTransport`](ble_hid_mouse::ble::host::ReportTransport)
//!    on top of the SoftDevice calls.
//! 3. **Bonder** - in-RAM bond store and pairing policy.
//! 4. **GAP** - owns the dispatcher and runs the advertise/connect loop.

pub mod bonder;
pub mod gap;
pub mod host;
pub mod server;

use ble_hid_mouse::ble::connection::SharedLink;
use ble_hid_mouse::ble::PeerAddress;
use ble_hid_mouse::ReportNotifier;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use nrf_softdevice::ble::Address;

pub type Link = SharedLink<CriticalSectionRawMutex>;

pub type Notifier = ReportNotifier<'static, CriticalSectionRawMutex, host::SoftdeviceTransport>;

/// Engine-side form of a SoftDevice address.
pub fn peer_address(addr: &Address) -> PeerAddress {
    PeerAddress::new(addr.addr_type() as u8, addr.bytes())
}
