//! Host-controller seams implemented on the SoftDevice.

use ble_hid_mouse::ble::advertising::{AdvertisingParams, AdvertisingPayload};
use ble_hid_mouse::ble::host::{HostController, ReportTransport};
use ble_hid_mouse::ble::{AttrHandle, ConnHandle, PeerAddress};
use ble_hid_mouse::error::{HostError, TransmitError};
use defmt::debug;
use nrf_softdevice::ble::gatt_server::{self, IndicateValueError, NotifyValueError, SetValueError};
use nrf_softdevice::ble::Connection;
use nrf_softdevice::{raw, RawError, Softdevice};

use super::bonder::Bonder;

/// An advertising start accepted by the dispatcher, waiting for the GAP
/// task to hand it to `advertise_pairable`.
#[derive(Clone, Debug)]
pub struct AdvertisingRequest {
    pub payload: AdvertisingPayload,
    pub params: AdvertisingParams,
}

/// Advertising in the SoftDevice is a future, so starting it only queues a
/// request for the GAP task.
pub struct SoftdeviceHost {
    pending: Option<AdvertisingRequest>,
    bonder: &'static Bonder,
}

impl SoftdeviceHost {
    pub fn new(bonder: &'static Bonder) -> Self {
        Self {
            pending: None,
            bonder,
        }
    }

    pub fn take_request(&mut self) -> Option<AdvertisingRequest> {
        self.pending.take()
    }
}

impl HostController for SoftdeviceHost {
    fn start_advertising(
        &mut self,
        payload: &AdvertisingPayload,
        params: &AdvertisingParams,
    ) -> Result<(), HostError> {
        self.pending = Some(AdvertisingRequest {
            payload: payload.clone(),
            params: *params,
        });
        Ok(())
    }

    fn stop_advertising(&mut self) -> Result<(), HostError> {
        // The SoftDevice already stopped when it reported the timeout.
        self.pending = None;
        Ok(())
    }

    fn delete_bond(&mut self, peer: &PeerAddress) -> Result<(), HostError> {
        if self.bonder.forget(peer) {
            Ok(())
        } else {
            Err(HostError::new(raw::NRF_ERROR_NOT_FOUND))
        }
    }
}

fn raw_transmit_error(e: RawError) -> TransmitError {
    match e {
        RawError::Resources | RawError::Busy => TransmitError::Busy,
        other => TransmitError::Rejected(HostError::new(other as u32)),
    }
}

fn notify_error(e: NotifyValueError) -> TransmitError {
    match e {
        NotifyValueError::Disconnected => TransmitError::NotConnected,
        NotifyValueError::Raw(raw) => raw_transmit_error(raw),
    }
}

fn indicate_error(e: IndicateValueError) -> TransmitError {
    match e {
        IndicateValueError::Disconnected => TransmitError::NotConnected,
        IndicateValueError::Raw(raw) => raw_transmit_error(raw),
    }
}

#[derive(Clone, Copy)]
pub struct SoftdeviceTransport {
    sd: &'static Softdevice,
}

impl SoftdeviceTransport {
    pub fn new(sd: &'static Softdevice) -> Self {
        Self { sd }
    }
}

impl ReportTransport for SoftdeviceTransport {
    fn notify(&self, conn: ConnHandle, handle: AttrHandle, data: &[u8]) -> Result<(), TransmitError> {
        let conn = Connection::from_handle(conn).ok_or(TransmitError::NotConnected)?;
        gatt_server::notify_value(&conn, handle, data).map_err(notify_error)
    }

    fn indicate(&self, conn: ConnHandle, handle: AttrHandle, data: &[u8])
        -> Result<(), TransmitError> {
        let conn = Connection::from_handle(conn).ok_or(TransmitError::NotConnected)?;
        gatt_server::indicate_value(&conn, handle, data).map_err(indicate_error)
    }

    fn store_value(&self, handle: AttrHandle, data: &[u8]) -> Result<(), TransmitError> {
        gatt_server::set_value(self.sd, handle, data).map_err(|e| {
            debug!("set_value on {} failed", handle);
            match e {
                SetValueError::Raw(raw) => raw_transmit_error(raw),
            }
        })
    }
}
