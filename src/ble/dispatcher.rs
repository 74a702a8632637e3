//! GAP/GATT event dispatcher.
//!
//! The host controller delivers a closed set of [`HostEvent`]s, serially,
//! from its own event context. [`Dispatcher::transition`] maps each event
//! onto the connection and advertising state and returns the [`Action`]s
//! it calls for; [`Dispatcher::dispatch`] also carries those actions out
//! against a [`HostController`] and publishes the new link snapshot.
//!
//! ```text
//! Idle -> Advertising -> Connected <-> Subscribed
//!   ^          |  ^          |
//!   | expired  |  +----------+ disconnect (always restarts advertising)
//!   +----------+
//! ```
//!
//! Nothing here returns an error to the caller: a failure inside a host
//! callback is logged and contained.

use embassy_sync::blocking_mutex::raw::RawMutex;

use crate::error::{Error, HostError};
use crate::gatt::Registration;

use super::advertising::AdvertisingController;
use super::connection::{ConnectionState, SharedLink};
use super::host::HostController;
use super::{AttrHandle, ConnHandle, PeerAddress};

/// Callbacks from the host controller.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HostEvent {
    Connected {
        handle: ConnHandle,
    },
    /// A connection attempt failed; the host keeps advertising.
    ConnectFailed {
        status: u32,
    },
    Disconnected {
        handle: ConnHandle,
        /// HCI reason code, when the host reports one.
        reason: Option<u8>,
    },
    ConnParamsUpdated {
        handle: ConnHandle,
    },
    /// CCCD write. `notify`/`indicate` are the new values, not toggles.
    Subscribe {
        handle: ConnHandle,
        attr_handle: AttrHandle,
        notify: bool,
        indicate: bool,
    },
    /// The advertising duration expired without a connection.
    AdvertisingComplete,
    /// The host refused to (re)start advertising after accepting the request.
    AdvertisingRejected {
        error: HostError,
    },
    /// A central that is already bonded asked to pair again.
    RepeatPairing {
        handle: ConnHandle,
        peer: PeerAddress,
    },
    EncryptionChanged {
        handle: ConnHandle,
        status: u32,
    },
    MtuUpdated {
        handle: ConnHandle,
        mtu: u16,
    },
}

/// Side effects requested by a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    StartAdvertising,
    StopAdvertising,
    DeleteBond(PeerAddress),
}

/// What the host controller should do once the event is handled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EventReply {
    Done,
    /// Retry the pairing procedure (the stale bond is gone).
    RetryPairing,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Phase {
    Idle,
    Advertising,
    Connected,
    /// Connected, with notify and/or indicate enabled on the Report.
    Subscribed,
}

pub type Actions = heapless::Vec<Action, 2>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub actions: Actions,
    pub reply: EventReply,
}

impl Transition {
    fn none() -> Self {
        Self {
            actions: Actions::new(),
            reply: EventReply::Done,
        }
    }

    fn with(action: Action) -> Self {
        let mut t = Self::none();
        // Capacity is 2; one action always fits.
        let _ = t.actions.push(action);
        t
    }
}

pub struct Dispatcher<'a, M: RawMutex> {
    conn: ConnectionState,
    adv: AdvertisingController,
    registration: &'a Registration,
    link: &'a SharedLink<M>,
}

impl<'a, M: RawMutex> Dispatcher<'a, M> {
    pub fn new(registration: &'a Registration, link: &'a SharedLink<M>) -> Self {
        Self::with_advertising(registration, link, AdvertisingController::new())
    }

    pub fn with_advertising(
        registration: &'a Registration,
        link: &'a SharedLink<M>,
        adv: AdvertisingController,
    ) -> Self {
        link.publish(ConnectionState::new().snapshot());
        Self {
            conn: ConnectionState::new(),
            adv,
            registration,
            link,
        }
    }

    pub fn phase(&self) -> Phase {
        match self.conn.active() {
            Some(c) if c.is_subscribed() => Phase::Subscribed,
            Some(_) => Phase::Connected,
            None if self.adv.is_advertising() => Phase::Advertising,
            None => Phase::Idle,
        }
    }

    pub fn connection(&self) -> &ConnectionState {
        &self.conn
    }

    /// Apply `event` to the state and return the follow-up actions.
    pub fn transition(&mut self, event: HostEvent) -> Transition {
        match event {
            HostEvent::Connected { handle } => {
                if let Some(stale) = self.conn.connect(handle) {
                    warn!("GAP: connection {} superseded by {}", stale.handle, handle);
                }
                // The host stops advertising on connect.
                self.adv.mark_idle();
                info!("GAP: connected, handle {}", handle);
                Transition::none()
            }
            HostEvent::ConnectFailed { status } => {
                warn!("GAP: connection failed, status {}", status);
                Transition::none()
            }
            HostEvent::Disconnected { handle, reason } => {
                if let Some(c) = self.conn.active().filter(|c| c.handle != handle) {
                    warn!("GAP: disconnect for {} while {} is active, ignored", handle, c.handle);
                    return Transition::none();
                }
                self.conn.disconnect();
                self.adv.mark_idle();
                info!("GAP: disconnected, handle {} reason {:?}", handle, reason);
                Transition::with(Action::StartAdvertising)
            }
            HostEvent::ConnParamsUpdated { handle } => {
                self.conn.refresh(handle);
                debug!("GAP: connection parameters updated, handle {}", handle);
                Transition::none()
            }
            HostEvent::Subscribe {
                handle,
                attr_handle,
                notify,
                indicate,
            } => {
                if !self.registration.is_report_subscription(attr_handle) {
                    debug!("GATT: subscribe on attribute {} ignored", attr_handle);
                } else if self.conn.subscribe(handle, notify, indicate) {
                    info!(
                        "GATT: report subscription notify={} indicate={}",
                        notify, indicate
                    );
                } else {
                    warn!("GATT: subscribe from unknown connection {}", handle);
                }
                Transition::none()
            }
            HostEvent::AdvertisingComplete => {
                info!("GAP: advertising expired, staying idle");
                Transition::with(Action::StopAdvertising)
            }
            HostEvent::AdvertisingRejected { error } => {
                warn!("GAP: advertising rejected: {:?}", error);
                self.adv.mark_idle();
                Transition::none()
            }
            HostEvent::RepeatPairing { handle, peer } => {
                info!("GAP: repeat pairing on {}, dropping old bond", handle);
                let mut t = Transition::with(Action::DeleteBond(peer));
                t.reply = EventReply::RetryPairing;
                t
            }
            HostEvent::EncryptionChanged { handle, status } => {
                info!("GAP: encryption changed, handle {} status {}", handle, status);
                Transition::none()
            }
            HostEvent::MtuUpdated { handle, mtu } => {
                info!("GATT: mtu {} on handle {}", mtu, handle);
                Transition::none()
            }
        }
    }

    /// Handle `event` end to end. Never fails; errors are logged.
    pub fn dispatch<H: HostController + ?Sized>(&mut self, event: HostEvent, host: &mut H) -> EventReply {
        let transition = self.transition(event);
        self.link.publish(self.conn.snapshot());

        for action in transition.actions {
            match action {
                Action::StartAdvertising => {
                    let _ = self.adv.start_advertising(host);
                }
                Action::StopAdvertising => {
                    let _ = self.adv.stop_advertising(host);
                }
                Action::DeleteBond(peer) => match host.delete_bond(&peer) {
                    Ok(()) => info!("GAP: bond deleted"),
                    Err(e) => warn!("GAP: bond delete failed: {:?}", e),
                },
            }
        }

        transition.reply
    }

    /// Externally triggered start (boot, manual restart). Refused while a
    /// central is connected.
    pub fn start_advertising<H: HostController + ?Sized>(&mut self, host: &mut H) -> Result<(), Error> {
        if self.conn.is_connected() {
            debug!("GAP: connected, not advertising");
            return Ok(());
        }
        self.adv.start_advertising(host)
    }
}
