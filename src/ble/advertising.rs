//! Advertisement payload encoding and the advertising controller.
//!
//! ## Payload layout
//!
//! Legacy advertising data: a sequence of AD structures
//! `[len][type][data...]`, at most 31 bytes in total. The HID mouse
//! payload carries flags, complete local name, appearance, the complete
//! 16-bit service UUID list and the TX power level.

use crate::config;
use crate::error::{AdvertisingSetupError, Error, HostError};

use super::host::HostController;

/// AD type codes (Bluetooth Assigned Numbers, "Common Data Types").
pub mod ad_type {
    pub const FLAGS: u8 = 0x01;
    pub const INCOMPLETE_UUID16: u8 = 0x02;
    pub const COMPLETE_UUID16: u8 = 0x03;
    pub const COMPLETE_LOCAL_NAME: u8 = 0x09;
    pub const TX_POWER_LEVEL: u8 = 0x0A;
    pub const APPEARANCE: u8 = 0x19;
}

/// Flags AD bits.
pub mod flags {
    pub const LE_LIMITED_DISCOVERABLE: u8 = 0x01;
    pub const LE_GENERAL_DISCOVERABLE: u8 = 0x02;
    pub const BR_EDR_NOT_SUPPORTED: u8 = 0x04;
}

/// Legacy advertising payload limit.
pub const MAX_PAYLOAD_LEN: usize = 31;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TxPower {
    /// Filled in from the host controller's configured output power.
    Auto,
    Dbm(i8),
}

/// Fields that make up an advertisement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AdvertisingFields<'a> {
    pub flags: u8,
    pub name: &'a str,
    pub appearance: u16,
    pub uuids16: &'a [u16],
    pub tx_power: Option<TxPower>,
}

impl AdvertisingFields<'static> {
    pub const fn hid_mouse() -> Self {
        Self {
            flags: flags::LE_LIMITED_DISCOVERABLE | flags::BR_EDR_NOT_SUPPORTED,
            name: config::DEVICE_NAME,
            appearance: config::APPEARANCE_MOUSE,
            uuids16: &[crate::gatt::uuid::HID_SERVICE],
            tx_power: Some(TxPower::Auto),
        }
    }
}

impl AdvertisingFields<'_> {
    /// Encode into AD structures. `auto_dbm` resolves [`TxPower::Auto`].
    pub fn encode(&self, auto_dbm: i8) -> Result<AdvertisingPayload, AdvertisingSetupError> {
        let mut out = AdvertisingPayload::default();

        out.push_field(ad_type::FLAGS, &[self.flags])?;
        out.push_field(ad_type::COMPLETE_LOCAL_NAME, self.name.as_bytes())?;
        out.push_field(ad_type::APPEARANCE, &self.appearance.to_le_bytes())?;

        if !self.uuids16.is_empty() {
            let mut uuids: heapless::Vec<u8, MAX_PAYLOAD_LEN> = heapless::Vec::new();
            for uuid in self.uuids16 {
                uuids
                    .extend_from_slice(&uuid.to_le_bytes())
                    .map_err(|_| AdvertisingSetupError::PayloadTooLarge)?;
            }
            out.push_field(ad_type::COMPLETE_UUID16, &uuids)?;
        }

        if let Some(tx) = self.tx_power {
            let dbm = match tx {
                TxPower::Auto => auto_dbm,
                TxPower::Dbm(dbm) => dbm,
            };
            out.push_field(ad_type::TX_POWER_LEVEL, &[dbm as u8])?;
        }

        Ok(out)
    }
}

/// Encoded advertising data, rebuilt on every start.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AdvertisingPayload(heapless::Vec<u8, MAX_PAYLOAD_LEN>);

impl AdvertisingPayload {
    fn push_field(&mut self, ty: u8, data: &[u8]) -> Result<(), AdvertisingSetupError> {
        if self.0.len() + 2 + data.len() > MAX_PAYLOAD_LEN {
            return Err(AdvertisingSetupError::PayloadTooLarge);
        }
        // Length checked above; these cannot fail.
        let _ = self.0.push(data.len() as u8 + 1);
        let _ = self.0.push(ty);
        let _ = self.0.extend_from_slice(data);
        Ok(())
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Data of the first AD structure of type `ty`.
    pub fn field(&self, ty: u8) -> Option<&[u8]> {
        let data = self.as_bytes();
        let mut i = 0;
        while i < data.len() {
            let len = data[i] as usize;
            if len == 0 || i + len >= data.len() {
                break;
            }
            if data[i + 1] == ty {
                return Some(&data[i + 2..i + 1 + len]);
            }
            i += len + 1;
        }
        None
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectableMode {
    Undirected,
    NonConnectable,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscoverableMode {
    Limited,
    General,
}

/// Everything the host controller needs besides the payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingParams {
    pub conn_mode: ConnectableMode,
    pub disc_mode: DiscoverableMode,
    /// Session length before the host reports expiry (ms).
    pub duration_ms: u32,
    /// Advertising interval (0.625 ms units).
    pub interval_min: u16,
    pub interval_max: u16,
    /// Preferred connection interval (1.25 ms units).
    pub conn_interval_min: u16,
    pub conn_interval_max: u16,
    pub slave_latency: u16,
    /// Supervision timeout (10 ms units).
    pub supervision_timeout: u16,
}

impl AdvertisingParams {
    pub const HID_MOUSE: Self = Self {
        conn_mode: ConnectableMode::Undirected,
        disc_mode: DiscoverableMode::Limited,
        duration_ms: config::ADV_DURATION_MS,
        interval_min: config::ADV_INTERVAL_MIN,
        interval_max: config::ADV_INTERVAL_MAX,
        conn_interval_min: config::BLE_CONN_INTERVAL_MIN,
        conn_interval_max: config::BLE_CONN_INTERVAL_MAX,
        slave_latency: config::BLE_SLAVE_LATENCY,
        supervision_timeout: config::BLE_SUP_TIMEOUT,
    };
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingState {
    Idle,
    Advertising,
}

/// Starts and stops broadcasting. Never retries on its own.
#[derive(Clone, Debug)]
pub struct AdvertisingController {
    state: AdvertisingState,
    fields: AdvertisingFields<'static>,
    params: AdvertisingParams,
}

impl AdvertisingController {
    pub const fn new() -> Self {
        Self::with(AdvertisingFields::hid_mouse(), AdvertisingParams::HID_MOUSE)
    }

    pub const fn with(fields: AdvertisingFields<'static>, params: AdvertisingParams) -> Self {
        Self {
            state: AdvertisingState::Idle,
            fields,
            params,
        }
    }

    pub fn state(&self) -> AdvertisingState {
        self.state
    }

    pub fn is_advertising(&self) -> bool {
        self.state == AdvertisingState::Advertising
    }

    pub fn params(&self) -> &AdvertisingParams {
        &self.params
    }

    /// Build the payload and ask the host to broadcast it.
    ///
    /// Failures are logged here; callers may ignore the result.
    pub fn start_advertising<H: HostController + ?Sized>(&mut self, host: &mut H) -> Result<(), Error> {
        if self.is_advertising() {
            debug!("ADV: already advertising");
            return Ok(());
        }

        let payload = self.fields.encode(host.tx_power()).map_err(|e| {
            warn!("ADV: payload rejected: {:?}", e);
            Error::AdvertisingSetup(e)
        })?;

        host.start_advertising(&payload, &self.params).map_err(|e| {
            warn!("ADV: start failed: {:?}", e);
            Error::AdvertisingStart(e)
        })?;

        info!(
            "ADV: advertising as \"{}\" for {} ms",
            self.fields.name, self.params.duration_ms
        );
        self.state = AdvertisingState::Advertising;
        Ok(())
    }

    /// Ask the host to stop broadcasting. The controller is Idle
    /// afterwards even if the host complains.
    pub fn stop_advertising<H: HostController + ?Sized>(&mut self, host: &mut H) -> Result<(), HostError> {
        self.state = AdvertisingState::Idle;
        host.stop_advertising().inspect_err(|e| {
            warn!("ADV: stop failed: {:?}", e);
        })?;
        info!("ADV: stopped");
        Ok(())
    }

    /// The host stops advertising by itself once a central connects, or
    /// when it refuses an already accepted start.
    pub fn mark_idle(&mut self) {
        self.state = AdvertisingState::Idle;
    }
}

impl Default for AdvertisingController {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::PeerAddress;

    #[derive(Default)]
    struct FakeHost {
        starts: usize,
        stops: usize,
        refuse: bool,
        last_payload: Option<AdvertisingPayload>,
    }

    impl HostController for FakeHost {
        fn start_advertising(
            &mut self,
            payload: &AdvertisingPayload,
            _params: &AdvertisingParams,
        ) -> Result<(), HostError> {
            if self.refuse {
                return Err(HostError::new(0x12));
            }
            self.starts += 1;
            self.last_payload = Some(payload.clone());
            Ok(())
        }

        fn stop_advertising(&mut self) -> Result<(), HostError> {
            self.stops += 1;
            Ok(())
        }

        fn delete_bond(&mut self, _peer: &PeerAddress) -> Result<(), HostError> {
            Ok(())
        }

        fn tx_power(&self) -> i8 {
            4
        }
    }

    #[test]
    fn hid_mouse_payload_fields() {
        let payload = AdvertisingFields::hid_mouse().encode(-8).unwrap();
        assert!(payload.as_bytes().len() <= MAX_PAYLOAD_LEN);
        assert_eq!(payload.field(ad_type::FLAGS), Some(&[0x05][..]));
        assert_eq!(
            payload.field(ad_type::COMPLETE_LOCAL_NAME),
            Some(config::DEVICE_NAME.as_bytes())
        );
        assert_eq!(payload.field(ad_type::APPEARANCE), Some(&[0xC2, 0x03][..]));
        assert_eq!(payload.field(ad_type::COMPLETE_UUID16), Some(&[0x12, 0x18][..]));
        assert_eq!(payload.field(ad_type::TX_POWER_LEVEL), Some(&[0xF8][..]));
    }

    #[test]
    fn oversized_name_is_setup_error() {
        let fields = AdvertisingFields {
            name: "a-device-name-that-cannot-possibly-fit",
            ..AdvertisingFields::hid_mouse()
        };
        assert_eq!(fields.encode(0), Err(AdvertisingSetupError::PayloadTooLarge));

        let mut ctl = AdvertisingController::with(fields, AdvertisingParams::HID_MOUSE);
        let mut host = FakeHost::default();
        assert_eq!(
            ctl.start_advertising(&mut host),
            Err(Error::AdvertisingSetup(AdvertisingSetupError::PayloadTooLarge))
        );
        assert_eq!(host.starts, 0);
        assert_eq!(ctl.state(), AdvertisingState::Idle);
    }

    #[test]
    fn start_uses_host_tx_power() {
        let mut ctl = AdvertisingController::new();
        let mut host = FakeHost::default();
        ctl.start_advertising(&mut host).unwrap();
        assert!(ctl.is_advertising());
        let payload = host.last_payload.unwrap();
        assert_eq!(payload.field(ad_type::TX_POWER_LEVEL), Some(&[4][..]));
    }

    #[test]
    fn refused_start_stays_idle() {
        let mut ctl = AdvertisingController::new();
        let mut host = FakeHost {
            refuse: true,
            ..Default::default()
        };
        assert_eq!(
            ctl.start_advertising(&mut host),
            Err(Error::AdvertisingStart(HostError::new(0x12)))
        );
        assert_eq!(ctl.state(), AdvertisingState::Idle);
    }

    #[test]
    fn second_start_is_noop_while_advertising() {
        let mut ctl = AdvertisingController::new();
        let mut host = FakeHost::default();
        ctl.start_advertising(&mut host).unwrap();
        ctl.start_advertising(&mut host).unwrap();
        assert_eq!(host.starts, 1);
        ctl.stop_advertising(&mut host).unwrap();
        assert_eq!(host.stops, 1);
        assert!(!ctl.is_advertising());
    }

    #[test]
    fn params_are_limited_undirected_three_minutes() {
        let p = AdvertisingParams::HID_MOUSE;
        assert_eq!(p.conn_mode, ConnectableMode::Undirected);
        assert_eq!(p.disc_mode, DiscoverableMode::Limited);
        assert_eq!(p.duration_ms, 180_000);
        assert!(p.conn_interval_min <= p.conn_interval_max);
    }
}
