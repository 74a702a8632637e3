//! Report notifier: the producer-facing entry point.
//!
//! Owns the single mouse report buffer (last writer wins) and pushes each
//! new report to the subscribed central. Delivery is at most once per
//! call; there is no retry and no backlog.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::ble::connection::{SharedLink, Transmission};
use crate::ble::host::ReportTransport;
use crate::ble::AttrHandle;
use crate::command::MoveCommand;
use crate::error::{AttError, TransmitError};
use crate::gatt::{access, AccessContract, AccessOp, AccessOutcome, Registration};
use crate::hid::MouseReport;

/// What happened to a submitted report.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Delivery {
    Indicated,
    Notified,
    /// No subscriber; the buffer was updated but nothing was sent.
    Dropped,
}

pub struct ReportNotifier<'a, M: RawMutex, T: ReportTransport> {
    report: Mutex<M, Cell<MouseReport>>,
    report_handle: AttrHandle,
    boot_handle: Option<AttrHandle>,
    link: &'a SharedLink<M>,
    transport: T,
}

impl<'a, M: RawMutex, T: ReportTransport> ReportNotifier<'a, M, T> {
    /// The Report handle comes from a finished registration, so it is
    /// known before the first transmission.
    pub fn new(registration: &Registration, link: &'a SharedLink<M>, transport: T) -> Self {
        Self {
            report: Mutex::new(Cell::new(MouseReport::empty())),
            report_handle: registration.report_handle(),
            boot_handle: registration.handle_for(AccessContract::BootMouseReport),
            link,
            transport,
        }
    }

    pub fn report_handle(&self) -> AttrHandle {
        self.report_handle
    }

    /// Current report buffer.
    pub fn snapshot(&self) -> MouseReport {
        self.report.lock(|r| r.get())
    }

    pub fn is_subscribed(&self) -> bool {
        self.link.is_subscribed()
    }

    /// Overwrite the report buffer and send it to the subscriber, if any.
    ///
    /// Indication is used whenever it is enabled. A refused transmission
    /// is logged and returned; the report is not retried.
    pub fn submit_move(
        &self,
        buttons: u8,
        dx: i8,
        dy: i8,
        wheel: i8,
    ) -> Result<Delivery, TransmitError> {
        let report = MouseReport::new(buttons, dx, dy, wheel);
        self.report.lock(|r| r.set(report));
        let bytes = report.to_bytes();

        // Reads of both input characteristics are served from the host table.
        for handle in core::iter::once(self.report_handle).chain(self.boot_handle) {
            if let Err(e) = self.transport.store_value(handle, &bytes) {
                debug!("report value not stored on {}: {:?}", handle, e);
            }
        }

        let result = match self.link.get().transmission() {
            Some(Transmission::Indicate(conn)) => self
                .transport
                .indicate(conn, self.report_handle, &bytes)
                .map(|()| Delivery::Indicated),
            Some(Transmission::Notify(conn)) => self
                .transport
                .notify(conn, self.report_handle, &bytes)
                .map(|()| Delivery::Notified),
            None => Ok(Delivery::Dropped),
        };

        if let Err(e) = &result {
            warn!("report {:?} not sent: {:?}", report, e);
        }
        result
    }

    pub fn submit(&self, cmd: MoveCommand) -> Result<Delivery, TransmitError> {
        let report = cmd.to_report();
        self.submit_move(report.buttons, report.dx, report.dy, report.wheel)
    }

    /// Serve an attribute access against the current report buffer.
    pub fn access(&self, contract: AccessContract, op: AccessOp<'_>) -> Result<AccessOutcome, AttError> {
        access(contract, op, &self.snapshot())
    }
}
