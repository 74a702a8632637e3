//! GATT server on the SoftDevice attribute table.
//!
//! Registration goes through [`SoftdeviceRegistrar`]; the resulting
//! [`HidServer`] receives every write the SoftDevice does not answer by
//! itself. Reads are served from the attribute table, which the notifier
//! keeps current for the Report and Boot Mouse Report
//! characteristics.

use ble_hid_mouse::error::HostError;
use ble_hid_mouse::gatt::{
    AccessOp, AttributeRegistrar, CccdFlags, CharacteristicHandles, CharacteristicInit, Properties,
    Registration, ServiceDef, ServiceHandles,
};
use defmt::{debug, info, warn};
use nrf_softdevice::ble::gatt_server::builder::ServiceBuilder;
use nrf_softdevice::ble::gatt_server::characteristic::{self, Attribute, Metadata};
use nrf_softdevice::ble::gatt_server::{self, RegisterError, WriteOp};
use nrf_softdevice::ble::{Connection, SecurityMode, Uuid};
use nrf_softdevice::{raw, Softdevice};

use super::Notifier;

fn register_error(e: RegisterError) -> HostError {
    match e {
        RegisterError::Raw(raw) => HostError::new(raw as u32),
    }
}

fn sd_properties(p: Properties) -> characteristic::Properties {
    let mut out = characteristic::Properties::new();
    if p.contains(Properties::READ) {
        out = out.read();
    }
    if p.contains(Properties::WRITE) {
        out = out.write();
    }
    if p.contains(Properties::WRITE_WITHOUT_RESPONSE) {
        out = out.write_without_response();
    }
    if p.contains(Properties::NOTIFY) {
        out = out.notify();
    }
    if p.contains(Properties::INDICATE) {
        out = out.indicate();
    }
    out
}

pub struct SoftdeviceRegistrar<'a> {
    sd: &'a mut Softdevice,
}

impl<'a> SoftdeviceRegistrar<'a> {
    pub fn new(sd: &'a mut Softdevice) -> Self {
        Self { sd }
    }
}

impl AttributeRegistrar for SoftdeviceRegistrar<'_> {
    fn add_service(
        &mut self,
        service: &ServiceDef,
        characteristics: &[CharacteristicInit<'_>],
    ) -> Result<ServiceHandles, HostError> {
        // HID attributes need an encrypted link (HOGP 4.x).
        let security = if service.encrypted {
            SecurityMode::JustWorks
        } else {
            SecurityMode::Open
        };

        let mut sb = ServiceBuilder::new(self.sd, Uuid::new_16(service.uuid)).map_err(register_error)?;
        let mut out = ServiceHandles::new();

        for c in characteristics {
            let attr = Attribute::new(c.initial.as_slice())
                .read_security(security)
                .write_security(security);
            let metadata = Metadata::with_security(sd_properties(c.def.properties), security);
            let mut cb = sb
                .add_characteristic(Uuid::new_16(c.def.uuid), attr, metadata)
                .map_err(register_error)?;

            let mut descriptors = heapless::Vec::new();
            for d in &c.descriptors {
                let handle = cb
                    .add_descriptor(
                        Uuid::new_16(d.uuid),
                        Attribute::new(d.value.as_slice()).read_security(security),
                    )
                    .map_err(register_error)?;
                descriptors
                    .push(handle.handle())
                    .map_err(|_| HostError::new(raw::NRF_ERROR_NO_MEM))?;
            }

            let handles = cb.build();
            out.push(CharacteristicHandles {
                value: handles.value_handle,
                cccd: (handles.cccd_handle != 0).then_some(handles.cccd_handle),
                descriptors,
            })
            .map_err(|_| HostError::new(raw::NRF_ERROR_NO_MEM))?;
        }

        let _ = sb.build();
        Ok(out)
    }
}

/// GATT events that reach the dispatcher.
pub enum ServerEvent {
    Subscribe {
        attr_handle: u16,
        notify: bool,
        indicate: bool,
    },
}

pub struct HidServer {
    registration: &'static Registration,
    notifier: &'static Notifier,
}

impl HidServer {
    pub fn new(registration: &'static Registration, notifier: &'static Notifier) -> Self {
        Self {
            registration,
            notifier,
        }
    }
}

impl gatt_server::Server for HidServer {
    type Event = ServerEvent;

    fn on_write(
        &self,
        _conn: &Connection,
        handle: u16,
        _op: WriteOp,
        _offset: usize,
        data: &[u8],
    ) -> Option<Self::Event> {
        if Some(handle) == self.registration.report_cccd() {
            let flags = CccdFlags::from_value(data);
            return Some(ServerEvent::Subscribe {
                attr_handle: handle,
                notify: flags.notify,
                indicate: flags.indicate,
            });
        }

        match self.registration.contract_for(handle) {
            Some(contract) => match self.notifier.access(contract, AccessOp::Write(data)) {
                Ok(_) => debug!("GATT write on {} ({:?}) accepted", handle, contract),
                Err(e) => warn!("GATT write on {} ({:?}) refused: {:?}", handle, contract, e),
            },
            None => info!("GATT write on unknown handle {}", handle),
        }
        None
    }
}
