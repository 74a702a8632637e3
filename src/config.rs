//! Application-wide constants and compile-time configuration.
//!
//! All advertising parameters, timing budgets, and HID identity values
//! live here so they can be tuned in one place.

// BLE identity

/// GAP device name, advertised as the complete local name.
pub const DEVICE_NAME: &str = "ble_mouse";

/// GAP appearance value for a generic mouse.
pub const APPEARANCE_MOUSE: u16 = 0x03C2;

// Advertising

/// How long one advertising session lasts before it expires (ms).
pub const ADV_DURATION_MS: u32 = 3 * 60 * 1000;

/// Advertising interval range (in 0.625 ms units).
/// 48 = 30 ms, 96 = 60 ms (HOGP connection-establishment window).
pub const ADV_INTERVAL_MIN: u16 = 48;
pub const ADV_INTERVAL_MAX: u16 = 96;

/// Preferred connection interval range (in 1.25 ms units).
/// 6 = 7.5 ms (lowest latency for HID).
pub const BLE_CONN_INTERVAL_MIN: u16 = 6;
pub const BLE_CONN_INTERVAL_MAX: u16 = 12;

/// BLE slave latency (number of connection events the peripheral can skip).
pub const BLE_SLAVE_LATENCY: u16 = 0;

/// BLE supervision timeout (in 10 ms units). 400 = 4 s.
pub const BLE_SUP_TIMEOUT: u16 = 400;

// Startup

/// Upper bound on the wait for the host controller's identity address.
pub const HOST_SYNC_TIMEOUT_MS: u64 = 5_000;

// Bonding

/// Maximum number of bonded centrals kept in RAM.
pub const MAX_BONDS: usize = 4;

/// Room for one central's stored GATT system attributes (CCCD values).
pub const SYS_ATTRS_LEN: usize = 62;

// HID identity

/// Placeholder battery level reported by the Battery service (percent).
pub const BATTERY_LEVEL_PLACEHOLDER: u8 = 100;

/// PnP ID vendor ID source: 0x02 = USB Implementer's Forum.
pub const PNP_VENDOR_ID_SOURCE: u8 = 0x02;

/// PnP ID vendor/product - the open-source "f055.io" allocation.
/// Replace with your own allocated VID/PID for production.
pub const PNP_VENDOR_ID: u16 = 0xF055;
pub const PNP_PRODUCT_ID: u16 = 0x000A;
pub const PNP_PRODUCT_VERSION: u16 = 0x0001;

// Producers

/// Delta applied by one console keystroke.
pub const CONSOLE_STEP: i8 = 20;

/// Capacity of the producer → notifier movement queue.
pub const MOVE_QUEUE_DEPTH: usize = 10;

/// Request path served by the HTTP command gateway.
pub const HTTP_MOVE_PATH: &str = "/mouse";

/// Fixed acknowledgement body, sent regardless of parse outcome.
pub const HTTP_ACK_BODY: &str = "URI GET Response";

/// Longest request line the gateway buffers before discarding it.
pub const HTTP_MAX_LINE: usize = 128;
