//! Declarative GATT attribute tree.
//!
//! Services, characteristics and descriptors are static data. Each
//! characteristic and descriptor names the [`AccessContract`] that serves
//! it; the contract table lives in [`super::access`]. CCCDs are not
//! listed: the host controller adds one to every characteristic that can
//! notify or indicate.

use super::uuid;

/// ATT characteristic properties (Core Spec Vol 3, Part G, 3.3.1.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Properties(u8);

impl Properties {
    pub const READ: Self = Self(0x02);
    pub const WRITE_WITHOUT_RESPONSE: Self = Self(0x04);
    pub const WRITE: Self = Self(0x08);
    pub const NOTIFY: Self = Self(0x10);
    pub const INDICATE: Self = Self(0x20);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    /// The host controller attaches a CCCD to this characteristic.
    pub const fn has_cccd(self) -> bool {
        self.0 & (Self::NOTIFY.0 | Self::INDICATE.0) != 0
    }
}

/// Which fixed access behaviour an attribute implements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AccessContract {
    ReportMap,
    Report,
    BootMouseReport,
    ReportReference,
    HidInformation,
    HidControlPoint,
    BatteryLevel,
    PnpId,
}

#[derive(Clone, Copy, Debug)]
pub struct DescriptorDef {
    pub uuid: u16,
    pub contract: AccessContract,
}

#[derive(Clone, Copy, Debug)]
pub struct CharacteristicDef {
    pub uuid: u16,
    pub properties: Properties,
    pub contract: AccessContract,
    pub descriptors: &'static [DescriptorDef],
}

#[derive(Clone, Copy, Debug)]
pub struct ServiceDef {
    pub uuid: u16,
    /// Attribute access needs an encrypted (bonded) link.
    pub encrypted: bool,
    pub characteristics: &'static [CharacteristicDef],
}

pub const HID_SERVICE: ServiceDef = ServiceDef {
    uuid: uuid::HID_SERVICE,
    encrypted: true,
    characteristics: &[
        CharacteristicDef {
            uuid: uuid::REPORT_MAP,
            properties: Properties::READ,
            contract: AccessContract::ReportMap,
            descriptors: &[],
        },
        CharacteristicDef {
            uuid: uuid::REPORT,
            properties: Properties::READ
                .union(Properties::NOTIFY)
                .union(Properties::INDICATE),
            contract: AccessContract::Report,
            descriptors: &[DescriptorDef {
                uuid: uuid::REPORT_REFERENCE,
                contract: AccessContract::ReportReference,
            }],
        },
        CharacteristicDef {
            uuid: uuid::BOOT_MOUSE_INPUT_REPORT,
            properties: Properties::READ.union(Properties::WRITE),
            contract: AccessContract::BootMouseReport,
            descriptors: &[],
        },
        CharacteristicDef {
            uuid: uuid::HID_INFORMATION,
            properties: Properties::READ,
            contract: AccessContract::HidInformation,
            descriptors: &[],
        },
        CharacteristicDef {
            uuid: uuid::HID_CONTROL_POINT,
            properties: Properties::WRITE_WITHOUT_RESPONSE,
            contract: AccessContract::HidControlPoint,
            descriptors: &[],
        },
    ],
};

pub const BATTERY_SERVICE: ServiceDef = ServiceDef {
    uuid: uuid::BATTERY_SERVICE,
    encrypted: false,
    characteristics: &[CharacteristicDef {
        uuid: uuid::BATTERY_LEVEL,
        properties: Properties::READ,
        contract: AccessContract::BatteryLevel,
        descriptors: &[],
    }],
};

pub const DEVICE_INFORMATION_SERVICE: ServiceDef = ServiceDef {
    uuid: uuid::DEVICE_INFORMATION_SERVICE,
    encrypted: false,
    characteristics: &[CharacteristicDef {
        uuid: uuid::PNP_ID,
        properties: Properties::READ,
        contract: AccessContract::PnpId,
        descriptors: &[],
    }],
};

/// The tree registered at startup.
#[cfg(feature = "device-info")]
pub const ATTRIBUTE_TREE: &[ServiceDef] = &[HID_SERVICE, BATTERY_SERVICE, DEVICE_INFORMATION_SERVICE];

/// The tree registered at startup.
#[cfg(not(feature = "device-info"))]
pub const ATTRIBUTE_TREE: &[ServiceDef] = &[HID_SERVICE, BATTERY_SERVICE];

/// Total characteristics plus descriptors in `tree`.
pub fn attribute_count(tree: &[ServiceDef]) -> usize {
    tree.iter()
        .flat_map(|s| s.characteristics.iter())
        .map(|c| 1 + c.descriptors.len())
        .sum()
}
