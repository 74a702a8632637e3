//! Single active link and its subscription flags.
//!
//! [`ConnectionState`] is owned by the dispatcher and only mutated from the
//! host controller's event context. Report producers never see it; they
//! read the [`LinkSnapshot`] the dispatcher publishes into a [`SharedLink`]
//! after every event.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_sync::blocking_mutex::Mutex;

use super::ConnHandle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ActiveConnection {
    pub handle: ConnHandle,
    pub notify_enabled: bool,
    pub indicate_enabled: bool,
}

impl ActiveConnection {
    pub const fn new(handle: ConnHandle) -> Self {
        Self {
            handle,
            notify_enabled: false,
            indicate_enabled: false,
        }
    }

    pub const fn is_subscribed(&self) -> bool {
        self.notify_enabled || self.indicate_enabled
    }
}

/// At most one live connection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ConnectionState {
    active: Option<ActiveConnection>,
}

impl ConnectionState {
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// Adopt `handle` as the live link with both flags cleared.
    /// Returns the connection it superseded, if any.
    pub fn connect(&mut self, handle: ConnHandle) -> Option<ActiveConnection> {
        self.active.replace(ActiveConnection::new(handle))
    }

    /// Drop the live link. Returns what was dropped.
    pub fn disconnect(&mut self) -> Option<ActiveConnection> {
        self.active.take()
    }

    /// Re-confirm `handle` after a parameter update. Flags are kept when
    /// the handle is unchanged.
    pub fn refresh(&mut self, handle: ConnHandle) {
        if self.active.map(|c| c.handle) != Some(handle) {
            self.active = Some(ActiveConnection::new(handle));
        }
    }

    /// Apply the authoritative CCCD values carried by a subscribe event.
    /// Returns `false` (and changes nothing) if `handle` is not the live link.
    pub fn subscribe(&mut self, handle: ConnHandle, notify: bool, indicate: bool) -> bool {
        match &mut self.active {
            Some(conn) if conn.handle == handle => {
                conn.notify_enabled = notify;
                conn.indicate_enabled = indicate;
                true
            }
            _ => false,
        }
    }

    pub fn active(&self) -> Option<&ActiveConnection> {
        self.active.as_ref()
    }

    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    pub fn snapshot(&self) -> LinkSnapshot {
        LinkSnapshot { active: self.active }
    }
}

/// How a report would currently be delivered.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Transmission {
    Indicate(ConnHandle),
    Notify(ConnHandle),
}

/// Read-only copy of the connection state handed to producers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkSnapshot {
    active: Option<ActiveConnection>,
}

impl LinkSnapshot {
    pub const DISCONNECTED: Self = Self { active: None };

    pub fn handle(&self) -> Option<ConnHandle> {
        self.active.map(|c| c.handle)
    }

    pub fn is_subscribed(&self) -> bool {
        self.active.is_some_and(|c| c.is_subscribed())
    }

    /// Indication wins when both flags are set.
    pub fn transmission(&self) -> Option<Transmission> {
        let conn = self.active?;
        if conn.indicate_enabled {
            Some(Transmission::Indicate(conn.handle))
        } else if conn.notify_enabled {
            Some(Transmission::Notify(conn.handle))
        } else {
            None
        }
    }
}

/// Latest [`LinkSnapshot`], shared between the dispatcher (writer) and
/// any number of producers (readers).
pub struct SharedLink<M: RawMutex> {
    inner: Mutex<M, Cell<LinkSnapshot>>,
}

impl<M: RawMutex> SharedLink<M> {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Cell::new(LinkSnapshot::DISCONNECTED)),
        }
    }

    pub fn publish(&self, snapshot: LinkSnapshot) {
        self.inner.lock(|cell| cell.set(snapshot));
    }

    pub fn get(&self) -> LinkSnapshot {
        self.inner.lock(|cell| cell.get())
    }

    pub fn is_subscribed(&self) -> bool {
        self.get().is_subscribed()
    }
}

impl<M: RawMutex> Default for SharedLink<M> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

    #[test]
    fn connect_starts_unsubscribed() {
        let mut state = ConnectionState::new();
        assert_eq!(state.connect(7), None);
        let conn = state.active().unwrap();
        assert_eq!(conn.handle, 7);
        assert!(!conn.notify_enabled && !conn.indicate_enabled);
    }

    #[test]
    fn new_connect_supersedes_stale_link() {
        let mut state = ConnectionState::new();
        state.connect(1);
        state.subscribe(1, true, true);
        let old = state.connect(2).unwrap();
        assert_eq!(old.handle, 1);
        assert_eq!(state.snapshot().handle(), Some(2));
        assert!(!state.snapshot().is_subscribed());
    }

    #[test]
    fn disconnect_clears_everything() {
        let mut state = ConnectionState::new();
        state.connect(3);
        state.subscribe(3, true, false);
        state.disconnect();
        assert_eq!(state.snapshot(), LinkSnapshot::DISCONNECTED);
        assert!(!state.is_connected());
    }

    #[test]
    fn subscribe_sets_flags_not_toggles() {
        let mut state = ConnectionState::new();
        state.connect(3);
        assert!(state.subscribe(3, true, false));
        assert!(state.subscribe(3, true, false));
        assert!(state.active().unwrap().notify_enabled);
        assert!(state.subscribe(3, false, false));
        assert!(!state.snapshot().is_subscribed());
    }

    #[test]
    fn subscribe_for_other_handle_is_ignored() {
        let mut state = ConnectionState::new();
        assert!(!state.subscribe(3, true, true));
        state.connect(4);
        assert!(!state.subscribe(3, true, true));
        assert!(!state.snapshot().is_subscribed());
    }

    #[test]
    fn refresh_keeps_flags_for_same_handle() {
        let mut state = ConnectionState::new();
        state.connect(5);
        state.subscribe(5, false, true);
        state.refresh(5);
        assert!(state.active().unwrap().indicate_enabled);
        state.refresh(6);
        assert_eq!(state.snapshot().handle(), Some(6));
        assert!(!state.snapshot().is_subscribed());
    }

    #[test]
    fn indication_preferred() {
        let mut state = ConnectionState::new();
        state.connect(9);
        state.subscribe(9, true, true);
        assert_eq!(state.snapshot().transmission(), Some(Transmission::Indicate(9)));
        state.subscribe(9, true, false);
        assert_eq!(state.snapshot().transmission(), Some(Transmission::Notify(9)));
        state.subscribe(9, false, false);
        assert_eq!(state.snapshot().transmission(), None);
    }

    #[test]
    fn shared_link_publishes_snapshots() {
        let link: SharedLink<CriticalSectionRawMutex> = SharedLink::new();
        assert!(!link.is_subscribed());
        let mut state = ConnectionState::new();
        state.connect(1);
        state.subscribe(1, true, false);
        link.publish(state.snapshot());
        assert!(link.is_subscribed());
        assert_eq!(link.get().handle(), Some(1));
    }
}
