//! HID Report Descriptor walker.
//!
//! Used at registration time to check that the Report Map we serve
//! actually describes the input report we notify: a Generic Desktop /
//! Mouse application collection, its Report ID, and the number of input
//! bits that follow that ID.
//!
//! ## Limitations
//!
//! Handles the short-item subset that mouse descriptors use:
//! - Long items are skipped
//! - Push/Pop state is not supported
//! - Only the first mouse application collection is summarised

use super::report::{MOUSE_REPORT_ID, MOUSE_REPORT_SIZE};

/// Usage page codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsagePage {
    /// Generic Desktop (mouse, keyboard, joystick).
    GenericDesktop,
    /// Button.
    Button,
    /// Unknown/unsupported.
    Unknown(u16),
}

impl From<u16> for UsagePage {
    fn from(code: u16) -> Self {
        match code {
            0x01 => UsagePage::GenericDesktop,
            0x09 => UsagePage::Button,
            other => UsagePage::Unknown(other),
        }
    }
}

/// Generic Desktop usage codes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DesktopUsage {
    Pointer,
    Mouse,
    X,
    Y,
    Wheel,
    Unknown(u16),
}

impl From<u16> for DesktopUsage {
    fn from(code: u16) -> Self {
        match code {
            0x01 => DesktopUsage::Pointer,
            0x02 => DesktopUsage::Mouse,
            0x30 => DesktopUsage::X,
            0x31 => DesktopUsage::Y,
            0x38 => DesktopUsage::Wheel,
            other => DesktopUsage::Unknown(other),
        }
    }
}

/// What a Report Map says about its mouse input report.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HidDescriptor {
    /// A Generic Desktop / Mouse application collection is present.
    pub has_mouse: bool,
    /// Report ID declared inside the mouse collection, when present.
    pub mouse_report_id: Option<u8>,
    /// Input bits declared for the mouse report (padding included).
    pub mouse_input_bits: u16,
    pub has_x: bool,
    pub has_y: bool,
    pub has_wheel: bool,
}

impl HidDescriptor {
    /// Mouse input report length in bytes, rounded up.
    pub fn mouse_input_len(&self) -> usize {
        (self.mouse_input_bits as usize).div_ceil(8)
    }

    /// The map describes the 4-byte (buttons, X, Y, wheel) report under
    /// the Report ID the Report Reference descriptor announces.
    pub fn matches_mouse_report(&self) -> bool {
        self.has_mouse
            && self.has_x
            && self.has_y
            && self.has_wheel
            && self.mouse_report_id == Some(MOUSE_REPORT_ID)
            && self.mouse_input_len() == MOUSE_REPORT_SIZE
    }

    /// Parse a HID Report Descriptor.
    ///
    /// Returns `None` when no mouse application collection is found.
    pub fn parse(data: &[u8]) -> Option<Self> {
        let mut desc = HidDescriptor::default();

        // Global state
        let mut usage_page = UsagePage::Unknown(0);
        let mut report_id: u8 = 0;
        let mut report_size: u16 = 0;
        let mut report_count: u16 = 0;
        // Local state (cleared after every main item)
        let mut usage: Option<u16> = None;
        // Collection depth of the mouse application collection, if inside one.
        let mut depth: u8 = 0;
        let mut mouse_depth: Option<u8> = None;
        let mut mouse_done = false;

        let mut i = 0;
        while i < data.len() {
            let prefix = data[i];

            // Long item: 0xFE, bDataSize, bLongItemTag, data...
            if prefix == 0xFE {
                let Some(&len) = data.get(i + 1) else { break };
                i += 3 + len as usize;
                continue;
            }

            let tag = (prefix >> 4) & 0x0F;
            let item_type = (prefix >> 2) & 0x03;
            let size = match prefix & 0x03 {
                0 => 0,
                1 => 1,
                2 => 2,
                _ => 4,
            };

            if i + 1 + size > data.len() {
                debug!("HID descriptor: truncated item at offset {}", i);
                break;
            }

            let value: u32 = match size {
                0 => 0,
                1 => data[i + 1] as u32,
                2 => u16::from_le_bytes([data[i + 1], data[i + 2]]) as u32,
                _ => u32::from_le_bytes([data[i + 1], data[i + 2], data[i + 3], data[i + 4]]),
            };

            match item_type {
                // Main items
                0 => {
                    match tag {
                        // Input
                        0x08 => {
                            if mouse_depth.is_some() && report_id == desc.mouse_report_id.unwrap_or(0) {
                                desc.mouse_input_bits = desc
                                    .mouse_input_bits
                                    .saturating_add(report_size.saturating_mul(report_count));
                            }
                        }
                        // Collection
                        0x0A => {
                            depth = depth.saturating_add(1);
                            let application = value == 0x01;
                            let is_mouse = matches!(usage_page, UsagePage::GenericDesktop)
                                && usage.map(DesktopUsage::from) == Some(DesktopUsage::Mouse);
                            if application && is_mouse && mouse_depth.is_none() && !mouse_done {
                                desc.has_mouse = true;
                                mouse_depth = Some(depth);
                            }
                        }
                        // End Collection
                        0x0C => {
                            if mouse_depth == Some(depth) {
                                mouse_depth = None;
                                mouse_done = true;
                            }
                            depth = depth.saturating_sub(1);
                        }
                        _ => {}
                    }
                    usage = None;
                }
                // Global items
                1 => match tag {
                    // Usage Page
                    0x00 => usage_page = UsagePage::from(value as u16),
                    // Report ID
                    0x08 => {
                        report_id = value as u8;
                        if mouse_depth.is_some() && desc.mouse_report_id.is_none() {
                            desc.mouse_report_id = Some(report_id);
                        }
                    }
                    // Report Size
                    0x07 => report_size = value as u16,
                    // Report Count
                    0x09 => report_count = value as u16,
                    _ => {}
                },
                // Local items
                2 => {
                    if tag == 0x00 {
                        usage = Some(value as u16);
                        if mouse_depth.is_some() && matches!(usage_page, UsagePage::GenericDesktop) {
                            match DesktopUsage::from(value as u16) {
                                DesktopUsage::X => desc.has_x = true,
                                DesktopUsage::Y => desc.has_y = true,
                                DesktopUsage::Wheel => desc.has_wheel = true,
                                _ => {}
                            }
                        }
                    }
                }
                _ => {}
            }

            i += 1 + size;
        }

        if desc.has_mouse {
            Some(desc)
        } else {
            debug!("HID descriptor: no mouse collection found");
            None
        }
    }
}
