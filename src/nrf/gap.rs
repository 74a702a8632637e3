//! GAP driver: owns the dispatcher and runs the advertise/connect loop.
//!
//! All host events funnel through [`Gap::dispatch`], so the dispatcher is
//! entered from one place at a time. Advertising starts accepted by the
//! dispatcher are queued in the [`SoftdeviceHost`] and picked up by
//! [`gap_task`], which also reports expiry, connection and disconnection.

use core::cell::RefCell;

use ble_hid_mouse::ble::advertising::AdvertisingParams;
use ble_hid_mouse::error::HostError;
use ble_hid_mouse::{Dispatcher, EventReply, HostEvent};
use defmt::{info, warn};
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::signal::Signal;
use nrf_softdevice::ble::gatt_server;
use nrf_softdevice::ble::peripheral::{self, AdvertiseError, ConnectableAdvertisement};
use nrf_softdevice::{raw, Softdevice};

use super::bonder::Bonder;
use super::host::{AdvertisingRequest, SoftdeviceHost};
use super::server::{HidServer, ServerEvent};

struct GapState {
    dispatcher: Dispatcher<'static, CriticalSectionRawMutex>,
    host: SoftdeviceHost,
}

pub struct Gap {
    state: Mutex<CriticalSectionRawMutex, RefCell<GapState>>,
    wake: Signal<CriticalSectionRawMutex, ()>,
}

impl Gap {
    pub fn new(dispatcher: Dispatcher<'static, CriticalSectionRawMutex>, host: SoftdeviceHost) -> Self {
        Self {
            state: Mutex::new(RefCell::new(GapState { dispatcher, host })),
            wake: Signal::new(),
        }
    }

    pub fn dispatch(&self, event: HostEvent) -> EventReply {
        let reply = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let GapState { dispatcher, host } = &mut *s;
            dispatcher.dispatch(event, host)
        });
        self.wake.signal(());
        reply
    }

    /// Boot start and console restart. Ignored while connected or
    /// already advertising.
    pub fn start_advertising(&self) {
        let result = self.state.lock(|s| {
            let mut s = s.borrow_mut();
            let GapState { dispatcher, host } = &mut *s;
            dispatcher.start_advertising(host)
        });
        if let Err(e) = result {
            warn!("advertising not started: {:?}", e);
        }
        self.wake.signal(());
    }

    fn take_request(&self) -> Option<AdvertisingRequest> {
        self.state.lock(|s| s.borrow_mut().host.take_request())
    }

    async fn next_request(&self) -> AdvertisingRequest {
        loop {
            if let Some(request) = self.take_request() {
                return request;
            }
            self.wake.wait().await;
        }
    }
}

/// Advertising timeout in the SoftDevice's 10 ms units.
fn timeout_units(duration_ms: u32) -> u16 {
    u16::try_from(duration_ms / 10).unwrap_or(u16::MAX)
}

/// GAP appearance and preferred connection parameters.
pub fn configure_gap(appearance: u16, params: &AdvertisingParams) -> Result<(), HostError> {
    let ret = unsafe { raw::sd_ble_gap_appearance_set(appearance) };
    if ret != raw::NRF_SUCCESS {
        return Err(HostError::new(ret));
    }

    let ppcp = raw::ble_gap_conn_params_t {
        min_conn_interval: params.conn_interval_min,
        max_conn_interval: params.conn_interval_max,
        slave_latency: params.slave_latency,
        conn_sup_timeout: params.supervision_timeout,
    };
    let ret = unsafe { raw::sd_ble_gap_ppcp_set(&ppcp) };
    if ret != raw::NRF_SUCCESS {
        return Err(HostError::new(ret));
    }
    Ok(())
}

#[embassy_executor::task]
pub async fn gap_task(
    sd: &'static Softdevice,
    gap: &'static Gap,
    server: &'static HidServer,
    bonder: &'static Bonder,
) -> ! {
    info!("GAP task started");

    loop {
        let request = gap.next_request().await;
        let config = peripheral::Config {
            interval: u32::from(request.params.interval_min),
            timeout: Some(timeout_units(request.params.duration_ms)),
            ..Default::default()
        };
        let adv = ConnectableAdvertisement::ScannableUndirected {
            adv_data: request.payload.as_bytes(),
            scan_data: &[],
        };

        let conn = match peripheral::advertise_pairable(sd, adv, &config, bonder).await {
            Ok(conn) => conn,
            Err(AdvertiseError::Timeout) => {
                gap.dispatch(HostEvent::AdvertisingComplete);
                continue;
            }
            Err(AdvertiseError::NoFreeConn) => {
                let error = HostError::new(raw::NRF_ERROR_CONN_COUNT);
                gap.dispatch(HostEvent::AdvertisingRejected { error });
                continue;
            }
            Err(AdvertiseError::Raw(e)) => {
                let error = HostError::new(e as u32);
                gap.dispatch(HostEvent::AdvertisingRejected { error });
                continue;
            }
        };

        let Some(handle) = conn.handle() else {
            warn!("connection dropped before it was reported");
            gap.dispatch(HostEvent::ConnectFailed {
                status: raw::NRF_ERROR_INVALID_STATE,
            });
            gap.start_advertising();
            continue;
        };

        gap.dispatch(HostEvent::Connected { handle });

        gatt_server::run(&conn, server, |event| match event {
            ServerEvent::Subscribe {
                attr_handle,
                notify,
                indicate,
            } => {
                gap.dispatch(HostEvent::Subscribe {
                    handle,
                    attr_handle,
                    notify,
                    indicate,
                });
            }
        })
        .await;

        // The SoftDevice wrapper does not surface the HCI reason.
        gap.dispatch(HostEvent::Disconnected {
            handle,
            reason: None,
        });
    }
}
