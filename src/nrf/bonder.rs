//! Pairing policy and the RAM bond store.
//!
//! Just Works pairing (no I/O), bonds kept in a [`BondTable`] keyed by the
//! central's identity address. A central that is already bonded and asks
//! to pair again is reported to the dispatcher, which drops the stale bond
//! and lets the new pairing go through.
//!
//! CCCD values are kept per bond and restored when the central reconnects.
//! A restored Report subscription is replayed to the dispatcher, since the
//! central will not write the CCCD again.

use core::cell::RefCell;

use ble_hid_mouse::ble::bonds::BondTable;
use ble_hid_mouse::ble::PeerAddress;
use ble_hid_mouse::config::{MAX_BONDS, SYS_ATTRS_LEN};
use ble_hid_mouse::gatt::{CccdFlags, Registration};
use ble_hid_mouse::{EventReply, HostEvent};
use defmt::{debug, info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::once_lock::OnceLock;
use nrf_softdevice::ble::gatt_server::{get_sys_attrs, set_sys_attrs};
use nrf_softdevice::ble::security::{IoCapabilities, SecurityHandler};
use nrf_softdevice::ble::{Connection, EncryptionInfo, IdentityKey, MasterId, SecurityMode};
use nrf_softdevice::raw;

use super::gap::Gap;
use super::peer_address;

#[derive(Clone)]
struct PeerBond {
    master_id: MasterId,
    key: EncryptionInfo,
    peer_id: IdentityKey,
    sys_attrs: heapless::Vec<u8, SYS_ATTRS_LEN>,
}

struct Routing {
    gap: &'static Gap,
    report_cccd: Option<u16>,
}

pub struct Bonder {
    bonds: Mutex<CriticalSectionRawMutex, RefCell<BondTable<PeerBond, MAX_BONDS>>>,
    routing: OnceLock<Routing>,
}

impl Bonder {
    pub const fn new() -> Self {
        Self {
            bonds: Mutex::new(RefCell::new(BondTable::new())),
            routing: OnceLock::new(),
        }
    }

    /// Route pairing events to `gap`. Set once at startup.
    pub fn attach(&self, gap: &'static Gap, registration: &Registration) {
        let routing = Routing {
            gap,
            report_cccd: registration.report_cccd(),
        };
        if self.routing.init(routing).is_err() {
            warn!("bonder already attached");
        }
    }

    /// Drop the bond of `peer`. False if there was none.
    pub fn forget(&self, peer: &PeerAddress) -> bool {
        self.bonds.lock(|b| b.borrow_mut().remove(peer).is_some())
    }

    fn bonded_peer(&self, conn: &Connection) -> Option<PeerAddress> {
        let addr = conn.peer_address();
        self.bonds.lock(|b| {
            b.borrow()
                .find(|_, bond| bond.peer_id.is_match(addr))
                .map(|(peer, _)| *peer)
        })
    }

    fn dispatch(&self, event: HostEvent) -> EventReply {
        match self.routing.try_get() {
            Some(routing) => routing.gap.dispatch(event),
            None => EventReply::Done,
        }
    }

    /// Replay the Report subscription found in restored system attributes.
    fn restore_subscription(&self, conn: &Connection) {
        let Some(handle) = conn.handle() else { return };
        let Some(cccd) = self.routing.try_get().and_then(|r| r.report_cccd) else {
            return;
        };

        let mut buf = [0u8; 2];
        let mut value = raw::ble_gatts_value_t {
            len: buf.len() as u16,
            offset: 0,
            p_value: buf.as_mut_ptr(),
        };
        let ret = unsafe { raw::sd_ble_gatts_value_get(handle, cccd, &mut value) };
        if ret != raw::NRF_SUCCESS {
            warn!("stored CCCD not read: {}", ret);
            return;
        }

        let len = usize::from(value.len).min(buf.len());
        let flags = CccdFlags::from_value(&buf[..len]);
        if flags.any() {
            info!("restored report subscription on {}: {:?}", handle, flags);
            self.dispatch(HostEvent::Subscribe {
                handle,
                attr_handle: cccd,
                notify: flags.notify,
                indicate: flags.indicate,
            });
        }
    }
}

impl Default for Bonder {
    fn default() -> Self {
        Self::new()
    }
}

impl SecurityHandler for Bonder {
    fn io_capabilities(&self) -> IoCapabilities {
        IoCapabilities::None
    }

    fn can_bond(&self, conn: &Connection) -> bool {
        let (Some(peer), Some(handle)) = (self.bonded_peer(conn), conn.handle()) else {
            return true;
        };

        match self.dispatch(HostEvent::RepeatPairing { handle, peer }) {
            EventReply::RetryPairing => true,
            EventReply::Done => {
                warn!("repeat pairing on {} not cleared", handle);
                true
            }
        }
    }

    fn on_bonded(
        &self,
        _conn: &Connection,
        master_id: MasterId,
        key: EncryptionInfo,
        peer_id: IdentityKey,
    ) {
        let peer = peer_address(&peer_id.addr);
        let evicted = self.bonds.lock(|b| {
            b.borrow_mut().insert(
                peer,
                PeerBond {
                    master_id,
                    key,
                    peer_id,
                    sys_attrs: heapless::Vec::new(),
                },
            )
        });
        info!("bonded with {:?}", peer);
        if let Some(old) = evicted {
            info!("bond table full, evicted {:?}", old);
        }
    }

    fn get_key(&self, _conn: &Connection, master_id: MasterId) -> Option<EncryptionInfo> {
        self.bonds.lock(|b| {
            b.borrow()
                .find(|_, bond| bond.master_id == master_id)
                .map(|(_, bond)| bond.key)
        })
    }

    fn on_security_update(&self, conn: &Connection, mode: SecurityMode) {
        info!("security mode updated: {}", mode);
        if let Some(handle) = conn.handle() {
            self.dispatch(HostEvent::EncryptionChanged { handle, status: 0 });
        }
    }

    fn save_sys_attrs(&self, conn: &Connection) {
        let addr = conn.peer_address();
        let mut buf = [0u8; SYS_ATTRS_LEN];
        let len = match get_sys_attrs(conn, &mut buf) {
            Ok(len) => len.min(SYS_ATTRS_LEN),
            Err(e) => {
                warn!("system attributes not read: {:?}", e);
                return;
            }
        };

        let saved = self.bonds.lock(|b| {
            let mut b = b.borrow_mut();
            let bond = b.find_mut(|_, bond| bond.peer_id.is_match(addr))?;
            bond.sys_attrs = heapless::Vec::from_slice(&buf[..len]).ok()?;
            Some(())
        });
        match saved {
            Some(()) => debug!("saved {} bytes of system attributes for {:?}", len, addr),
            None => debug!("{:?} not bonded, system attributes dropped", addr),
        }
    }

    fn load_sys_attrs(&self, conn: &Connection) {
        let addr = conn.peer_address();
        let stored = self.bonds.lock(|b| {
            b.borrow()
                .find(|_, bond| bond.peer_id.is_match(addr))
                .map(|(_, bond)| bond.sys_attrs.clone())
        });
        let attrs = stored.as_deref().filter(|a| !a.is_empty());

        if let Err(e) = set_sys_attrs(conn, attrs) {
            warn!("system attributes not restored: {:?}", e);
            return;
        }
        if attrs.is_some() {
            self.restore_subscription(conn);
        }
    }
}
