//! HID-over-GATT mouse report and the fixed characteristic payloads of
//! the HID, Battery and Device Information services.
//!
//! Report layout (4 bytes, no Report ID prefix - the ID travels in the
//! Report Reference descriptor):
//! ```text
//! Byte 0: Button bitfield
//!         Bit 0 = Left, Bit 1 = Right, Bit 2 = Middle
//! Byte 1: X displacement (signed, -127..127)
//! Byte 2: Y displacement (signed, -127..127)
//! Byte 3: Scroll wheel  (signed, -127..127)
//! ```

use crate::config;

/// Mouse report size in bytes.
pub const MOUSE_REPORT_SIZE: usize = 4;

/// Report ID of the mouse input report inside the Report Map.
pub const MOUSE_REPORT_ID: u8 = 0x01;

/// Mask of the three button bits used by the report.
pub const BUTTON_MASK: u8 = 0x07;

/// Left button bit.
pub const BUTTON_LEFT: u8 = 0x01;

/// Relative-motion mouse input report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct MouseReport {
    /// Button bitfield (bit 0 = left, bit 1 = right, bit 2 = middle).
    pub buttons: u8,
    /// Relative X movement (signed).
    pub dx: i8,
    /// Relative Y movement (signed).
    pub dy: i8,
    /// Scroll wheel delta (signed).
    pub wheel: i8,
}

impl MouseReport {
    /// Create an idle (no movement, no buttons) report.
    pub const fn empty() -> Self {
        Self {
            buttons: 0,
            dx: 0,
            dy: 0,
            wheel: 0,
        }
    }

    pub const fn new(buttons: u8, dx: i8, dy: i8, wheel: i8) -> Self {
        Self {
            buttons,
            dx,
            dy,
            wheel,
        }
    }

    /// Wire encoding, in (buttons, dx, dy, wheel) order.
    pub const fn to_bytes(&self) -> [u8; MOUSE_REPORT_SIZE] {
        [
            self.buttons,
            self.dx as u8,
            self.dy as u8,
            self.wheel as u8,
        ]
    }
}

// HID report descriptor for a 3-button relative mouse with wheel

/// Report Map characteristic value (HID 1.11 report descriptor).
pub const MOUSE_REPORT_MAP: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x02, // Usage (Mouse)
    0xA1, 0x01, // Collection (Application)
    0x85, MOUSE_REPORT_ID, //   Report ID (1)
    0x09, 0x01, //   Usage (Pointer)
    0xA1, 0x00, //   Collection (Physical)
    //
    //   - Buttons (3 bits + 5 padding) -
    0x05, 0x09, //     Usage Page (Buttons)
    0x19, 0x01, //     Usage Minimum (Button 1)
    0x29, 0x03, //     Usage Maximum (Button 3)
    0x15, 0x00, //     Logical Minimum (0)
    0x25, 0x01, //     Logical Maximum (1)
    0x75, 0x01, //     Report Size (1)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x02, //     Input (Data, Variable, Absolute)
    0x75, 0x05, //     Report Size (5)
    0x95, 0x01, //     Report Count (1)
    0x81, 0x01, //     Input (Constant) - padding
    //
    //   - X, Y, Wheel -
    0x05, 0x01, //     Usage Page (Generic Desktop)
    0x09, 0x30, //     Usage (X)
    0x09, 0x31, //     Usage (Y)
    0x09, 0x38, //     Usage (Wheel)
    0x15, 0x81, //     Logical Minimum (-127)
    0x25, 0x7F, //     Logical Maximum (127)
    0x75, 0x08, //     Report Size (8)
    0x95, 0x03, //     Report Count (3)
    0x81, 0x06, //     Input (Data, Variable, Relative)
    //
    0xC0, //   End Collection (Physical)
    0xC0, // End Collection (Application)
];

/// Report type carried in the Report Reference descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReportType {
    Input = 0x01,
    Output = 0x02,
    Feature = 0x03,
}

/// Report Reference descriptor (0x2908) value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ReportReference {
    pub report_id: u8,
    pub report_type: ReportType,
}

impl ReportReference {
    pub const MOUSE_INPUT: Self = Self {
        report_id: MOUSE_REPORT_ID,
        report_type: ReportType::Input,
    };

    pub const fn to_bytes(&self) -> [u8; 2] {
        [self.report_id, self.report_type as u8]
    }
}

/// HID Information characteristic (0x2A4A) value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidInformation {
    /// HID specification release as advertised to hosts, sent little-endian.
    pub bcd_hid: u16,
    pub country_code: u8,
    /// Bit 0 = RemoteWake, bit 1 = NormallyConnectable.
    pub flags: u8,
}

impl HidInformation {
    pub const DEFAULT: Self = Self {
        bcd_hid: 0x1101,
        country_code: 0x00,
        flags: 0x00,
    };

    pub const fn to_bytes(&self) -> [u8; 4] {
        let bcd = self.bcd_hid.to_le_bytes();
        [bcd[0], bcd[1], self.country_code, self.flags]
    }
}

/// PnP ID characteristic (0x2A50) value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PnpId {
    pub vendor_id_source: u8,
    pub vendor_id: u16,
    pub product_id: u16,
    pub product_version: u16,
}

impl PnpId {
    pub const DEFAULT: Self = Self {
        vendor_id_source: config::PNP_VENDOR_ID_SOURCE,
        vendor_id: config::PNP_VENDOR_ID,
        product_id: config::PNP_PRODUCT_ID,
        product_version: config::PNP_PRODUCT_VERSION,
    };

    /// Layout: `[source][vid LE][pid LE][version LE]`.
    pub const fn to_bytes(&self) -> [u8; 7] {
        let vid = self.vendor_id.to_le_bytes();
        let pid = self.product_id.to_le_bytes();
        let ver = self.product_version.to_le_bytes();
        [
            self.vendor_id_source,
            vid[0],
            vid[1],
            pid[0],
            pid[1],
            ver[0],
            ver[1],
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mouse_report_empty() {
        assert_eq!(MouseReport::empty().to_bytes(), [0, 0, 0, 0]);
    }

    #[test]
    fn mouse_report_bytes_in_wire_order() {
        let report = MouseReport::new(0x01, 20, -3, 0);
        assert_eq!(report.to_bytes(), [0x01, 0x14, 0xFD, 0x00]);
    }

    #[test]
    fn mouse_report_extremes() {
        let report = MouseReport::new(BUTTON_MASK, -128, 127, -1);
        assert_eq!(report.to_bytes(), [0x07, 0x80, 0x7F, 0xFF]);
    }

    #[test]
    fn report_map_declares_report_id() {
        assert_eq!(&MOUSE_REPORT_MAP[6..8], &[0x85, MOUSE_REPORT_ID]);
        assert_eq!(MOUSE_REPORT_MAP.len(), 54);
        assert_eq!(MOUSE_REPORT_MAP[MOUSE_REPORT_MAP.len() - 1], 0xC0);
    }

    #[test]
    fn report_reference_is_input_id_1() {
        assert_eq!(ReportReference::MOUSE_INPUT.to_bytes(), [0x01, 0x01]);
    }

    #[test]
    fn hid_information_encoding() {
        assert_eq!(HidInformation::DEFAULT.to_bytes(), [0x01, 0x11, 0x00, 0x00]);
    }

    #[test]
    fn pnp_id_encoding() {
        assert_eq!(
            PnpId::DEFAULT.to_bytes(),
            [0x02, 0x55, 0xF0, 0x0A, 0x00, 0x01, 0x00]
        );
    }
}
