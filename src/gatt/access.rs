//! Per-characteristic access contract.
//!
//! Every attribute access is a pure function of the bound contract, the
//! operation and the current mouse report. Reads yield a payload, writes
//! yield a disposition, and anything else is an ATT error for the peer.

use crate::config;
use crate::error::AttError;
use crate::hid::report::{HidInformation, MouseReport, PnpId, ReportReference, MOUSE_REPORT_MAP};

use super::tree::AccessContract;

/// Largest attribute value served by the tree (the Report Map).
pub const MAX_VALUE_LEN: usize = 64;

pub type AttributeValue = heapless::Vec<u8, MAX_VALUE_LEN>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessOp<'a> {
    Read,
    Write(&'a [u8]),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AccessOutcome {
    /// Payload for a read.
    Value(AttributeValue),
    /// Write accepted; nothing observable changes.
    Accepted,
}

/// Subscription state carried by a CCCD value (Core Spec Vol 3, Part G, 3.3.3.3).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CccdFlags {
    pub notify: bool,
    pub indicate: bool,
}

impl CccdFlags {
    const NOTIFY: u8 = 0x01;
    const INDICATE: u8 = 0x02;

    /// Decode a written or restored CCCD value. Only the low byte carries flags.
    pub fn from_value(value: &[u8]) -> Self {
        let bits = value.first().copied().unwrap_or(0);
        Self {
            notify: bits & Self::NOTIFY != 0,
            indicate: bits & Self::INDICATE != 0,
        }
    }

    pub fn any(&self) -> bool {
        self.notify || self.indicate
    }
}

fn value(bytes: &[u8]) -> Result<AccessOutcome, AttError> {
    AttributeValue::from_slice(bytes)
        .map(AccessOutcome::Value)
        .map_err(|_| AttError::InsufficientResources)
}

/// Serve one access against `contract`.
pub fn access(
    contract: AccessContract,
    op: AccessOp<'_>,
    report: &MouseReport,
) -> Result<AccessOutcome, AttError> {
    match (contract, op) {
        (AccessContract::ReportMap, AccessOp::Read) => value(MOUSE_REPORT_MAP),
        (AccessContract::ReportMap, AccessOp::Write(_)) => Err(AttError::WriteNotPermitted),

        (AccessContract::Report | AccessContract::BootMouseReport, AccessOp::Read) => {
            value(&report.to_bytes())
        }
        (AccessContract::Report | AccessContract::BootMouseReport, AccessOp::Write(data)) => {
            debug!("HID report write ignored ({} bytes)", data.len());
            Ok(AccessOutcome::Accepted)
        }

        (AccessContract::ReportReference, AccessOp::Read) => {
            value(&ReportReference::MOUSE_INPUT.to_bytes())
        }
        (AccessContract::HidInformation, AccessOp::Read) => {
            value(&HidInformation::DEFAULT.to_bytes())
        }
        (AccessContract::ReportReference | AccessContract::HidInformation, AccessOp::Write(_)) => {
            Err(AttError::WriteNotPermitted)
        }

        // 0x00 = suspend, 0x01 = exit suspend. Neither changes anything here.
        (AccessContract::HidControlPoint, AccessOp::Write(data)) => {
            info!("HID control point: {}", data.first().copied().unwrap_or(0xFF));
            Ok(AccessOutcome::Accepted)
        }
        (AccessContract::HidControlPoint, AccessOp::Read) => Err(AttError::ReadNotPermitted),

        (AccessContract::BatteryLevel, AccessOp::Read) => value(&[config::BATTERY_LEVEL_PLACEHOLDER]),
        (AccessContract::PnpId, AccessOp::Read) => value(&PnpId::DEFAULT.to_bytes()),
        (AccessContract::BatteryLevel | AccessContract::PnpId, AccessOp::Write(_)) => {
            Err(AttError::RequestNotSupported)
        }
    }
}

/// Value handed to the host controller when the attribute is created.
pub fn initial_value(contract: AccessContract) -> AttributeValue {
    match access(contract, AccessOp::Read, &MouseReport::empty()) {
        Ok(AccessOutcome::Value(v)) => v,
        // Write-only attributes start as a single zero byte.
        _ => AttributeValue::from_slice(&[0]).unwrap_or_default(),
    }
}
