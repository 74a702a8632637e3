//! HID report types and the HID-over-GATT characteristic payloads.

pub mod descriptor;
pub mod report;

pub use descriptor::HidDescriptor;
pub use report::{
    HidInformation, MouseReport, PnpId, ReportReference, ReportType, MOUSE_REPORT_MAP,
    MOUSE_REPORT_SIZE,
};

/// Check the served Report Map against the notified report layout.
pub fn report_map_is_consistent(map: &[u8]) -> bool {
    HidDescriptor::parse(map).is_some_and(|d| d.matches_mouse_report())
}
