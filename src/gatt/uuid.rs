//! Bluetooth-assigned 16-bit UUIDs used by the attribute tree.

// Services
pub const HID_SERVICE: u16 = 0x1812;
pub const BATTERY_SERVICE: u16 = 0x180F;
pub const DEVICE_INFORMATION_SERVICE: u16 = 0x180A;

// Characteristics
pub const REPORT_MAP: u16 = 0x2A4B;
pub const REPORT: u16 = 0x2A4D;
pub const BOOT_MOUSE_INPUT_REPORT: u16 = 0x2A33;
pub const HID_INFORMATION: u16 = 0x2A4A;
pub const HID_CONTROL_POINT: u16 = 0x2A4C;
pub const BATTERY_LEVEL: u16 = 0x2A19;
pub const PNP_ID: u16 = 0x2A50;

// Descriptors
pub const CLIENT_CHARACTERISTIC_CONFIGURATION: u16 = 0x2902;
pub const REPORT_REFERENCE: u16 = 0x2908;
