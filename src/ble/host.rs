//! The host controller as seen from the engine.
//!
//! Two seams: [`HostController`] is driven by the dispatcher from the
//! host's own event context, [`ReportTransport`] by report producers.
//! The embedded binary implements both on top of the SoftDevice; tests
//! use recording mocks.

use crate::error::{HostError, TransmitError};

use super::advertising::{AdvertisingParams, AdvertisingPayload};
use super::{AttrHandle, ConnHandle, PeerAddress};

pub trait HostController {
    /// Begin broadcasting `payload` with `params`.
    fn start_advertising(
        &mut self,
        payload: &AdvertisingPayload,
        params: &AdvertisingParams,
    ) -> Result<(), HostError>;

    fn stop_advertising(&mut self) -> Result<(), HostError>;

    /// Forget the stored keys of `peer`.
    fn delete_bond(&mut self, peer: &PeerAddress) -> Result<(), HostError>;

    /// Radiated power used for the TX Power Level advertising field.
    fn tx_power(&self) -> i8 {
        0
    }
}

pub trait ReportTransport {
    /// Unacknowledged value push.
    fn notify(&self, conn: ConnHandle, handle: AttrHandle, data: &[u8]) -> Result<(), TransmitError>;

    /// Acknowledged value push.
    fn indicate(&self, conn: ConnHandle, handle: AttrHandle, data: &[u8])
        -> Result<(), TransmitError>;

    /// Mirror the value into the host's attribute table, for hosts that
    /// serve reads themselves.
    fn store_value(&self, _handle: AttrHandle, _data: &[u8]) -> Result<(), TransmitError> {
        Ok(())
    }
}

impl<T: ReportTransport + ?Sized> ReportTransport for &T {
    fn notify(&self, conn: ConnHandle, handle: AttrHandle, data: &[u8]) -> Result<(), TransmitError> {
        (**self).notify(conn, handle, data)
    }

    fn indicate(&self, conn: ConnHandle, handle: AttrHandle, data: &[u8])
        -> Result<(), TransmitError> {
        (**self).indicate(conn, handle, data)
    }

    fn store_value(&self, handle: AttrHandle, data: &[u8]) -> Result<(), TransmitError> {
        (**self).store_value(handle, data)
    }
}
