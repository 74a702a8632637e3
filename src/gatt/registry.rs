//! Submits the attribute tree to the host controller and records which
//! handle serves which access contract.

use crate::ble::AttrHandle;
use crate::error::{HostError, RegistrationError};
use crate::hid;

use super::access::{initial_value, AttributeValue};
use super::tree::{AccessContract, CharacteristicDef, ServiceDef};

/// Upper bound on characteristics + descriptors tracked per registration.
pub const MAX_ATTRIBUTES: usize = 16;

/// Most descriptors a characteristic in the tree declares.
pub const MAX_DESCRIPTORS: usize = 2;

/// Descriptor to attach to a characteristic, with its initial value.
#[derive(Clone, Debug)]
pub struct DescriptorValue {
    pub uuid: u16,
    pub value: AttributeValue,
}

/// Handles assigned by the host controller to one characteristic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CharacteristicHandles {
    pub value: AttrHandle,
    pub cccd: Option<AttrHandle>,
    /// In the order the descriptors were submitted.
    pub descriptors: heapless::Vec<AttrHandle, MAX_DESCRIPTORS>,
}

/// Most characteristics a service in the tree declares.
pub const MAX_CHARACTERISTICS: usize = 8;

/// A characteristic ready for submission.
#[derive(Clone, Debug)]
pub struct CharacteristicInit<'a> {
    pub def: &'a CharacteristicDef,
    pub initial: AttributeValue,
    pub descriptors: heapless::Vec<DescriptorValue, MAX_DESCRIPTORS>,
}

pub type ServiceHandles = heapless::Vec<CharacteristicHandles, MAX_CHARACTERISTICS>;

/// Host-controller side of registration.
pub trait AttributeRegistrar {
    /// Create one service with its characteristics, in order. Returns one
    /// entry per characteristic.
    fn add_service(
        &mut self,
        service: &ServiceDef,
        characteristics: &[CharacteristicInit<'_>],
    ) -> Result<ServiceHandles, HostError>;
}

/// Result of a successful registration.
#[derive(Clone, Debug)]
pub struct Registration {
    report: CharacteristicHandles,
    contracts: heapless::Vec<(AttrHandle, AccessContract), MAX_ATTRIBUTES>,
}

impl Registration {
    /// Value handle of the Report characteristic. Every transmission is
    /// addressed to it.
    pub fn report_handle(&self) -> AttrHandle {
        self.report.value
    }

    pub fn report_cccd(&self) -> Option<AttrHandle> {
        self.report.cccd
    }

    /// The attribute handle a subscribe event must carry to count as a
    /// Report subscription. Host stacks differ on whether they report the
    /// value handle or the CCCD handle, so both are accepted.
    pub fn is_report_subscription(&self, handle: AttrHandle) -> bool {
        handle == self.report.value || Some(handle) == self.report.cccd
    }

    pub fn contract_for(&self, handle: AttrHandle) -> Option<AccessContract> {
        self.contracts
            .iter()
            .find_map(|&(h, c)| (h == handle).then_some(c))
    }

    pub fn handle_for(&self, contract: AccessContract) -> Option<AttrHandle> {
        self.contracts
            .iter()
            .find_map(|&(h, c)| (c == contract).then_some(h))
    }
}

/// Register every service of `tree`, in order.
///
/// Any refusal aborts the whole registration; a peripheral without its
/// HID service is useless.
pub fn register_tree<R: AttributeRegistrar>(
    registrar: &mut R,
    tree: &[ServiceDef],
) -> Result<Registration, RegistrationError> {
    if !hid::report_map_is_consistent(hid::MOUSE_REPORT_MAP) {
        error!("GATT: report map does not describe the mouse input report");
        return Err(RegistrationError::InvalidReportMap);
    }

    let mut contracts = heapless::Vec::new();
    let mut report = None;

    for service in tree {
        info!("GATT: registering service {:#x}", service.uuid);

        let mut inits: heapless::Vec<CharacteristicInit<'_>, MAX_CHARACTERISTICS> =
            heapless::Vec::new();
        for def in service.characteristics {
            let mut descriptors = heapless::Vec::new();
            for d in def.descriptors {
                descriptors
                    .push(DescriptorValue {
                        uuid: d.uuid,
                        value: initial_value(d.contract),
                    })
                    .map_err(|_| RegistrationError::TooManyAttributes)?;
            }
            inits
                .push(CharacteristicInit {
                    def,
                    initial: initial_value(def.contract),
                    descriptors,
                })
                .map_err(|_| RegistrationError::TooManyAttributes)?;
        }

        let handles = registrar.add_service(service, &inits).map_err(|e| {
            error!("GATT: service {:#x} rejected: {:?}", service.uuid, e);
            RegistrationError::Host(e)
        })?;

        for (def, handles) in service.characteristics.iter().zip(handles) {
            info!(
                "GATT:   characteristic {:#x} -> handle {}",
                def.uuid, handles.value
            );
            contracts
                .push((handles.value, def.contract))
                .map_err(|_| RegistrationError::TooManyAttributes)?;
            for (d, &h) in def.descriptors.iter().zip(handles.descriptors.iter()) {
                info!("GATT:     descriptor {:#x} -> handle {}", d.uuid, h);
                contracts
                    .push((h, d.contract))
                    .map_err(|_| RegistrationError::TooManyAttributes)?;
            }
            if let Some(cccd) = handles.cccd {
                debug!("GATT:     cccd -> handle {}", cccd);
            }

            if def.contract == AccessContract::Report && report.is_none() {
                report = Some(handles);
            }
        }
    }

    let report = report.ok_or(RegistrationError::ReportHandleMissing)?;
    info!("GATT: report handle {}", report.value);

    Ok(Registration { report, contracts })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::gatt::tree::{ATTRIBUTE_TREE, BATTERY_SERVICE};
    use crate::gatt::uuid;

    /// Hands out sequential handles the way the SoftDevice does: value
    /// handle after the declaration, CCCD right after the value.
    #[derive(Default)]
    pub(crate) struct SequentialRegistrar {
        next: u16,
        pub services: heapless::Vec<u16, 4>,
        pub initial: heapless::Vec<(u16, AttributeValue), 16>,
        pub fail_on: Option<u16>,
    }

    impl AttributeRegistrar for SequentialRegistrar {
        fn add_service(
            &mut self,
            service: &ServiceDef,
            characteristics: &[CharacteristicInit<'_>],
        ) -> Result<ServiceHandles, HostError> {
            self.next += 1;
            self.services.push(service.uuid).unwrap();
            let mut out = ServiceHandles::new();
            for c in characteristics {
                if self.fail_on == Some(c.def.uuid) {
                    return Err(HostError::new(0x3001));
                }
                self.next += 2;
                let value = self.next;
                let cccd = if c.def.properties.has_cccd() {
                    self.next += 1;
                    Some(self.next)
                } else {
                    None
                };
                let mut handles = CharacteristicHandles {
                    value,
                    cccd,
                    descriptors: heapless::Vec::new(),
                };
                for _ in &c.descriptors {
                    self.next += 1;
                    handles.descriptors.push(self.next).unwrap();
                }
                self.initial.push((c.def.uuid, c.initial.clone())).unwrap();
                out.push(handles).unwrap();
            }
            Ok(out)
        }
    }

    #[test]
    fn registers_full_tree_and_captures_report_handle() {
        let mut reg = SequentialRegistrar::default();
        let registration = register_tree(&mut reg, ATTRIBUTE_TREE).unwrap();

        // HID service at 1; Report Map 2/3; Report 4/5 with CCCD 6.
        assert_eq!(registration.report_handle(), 5);
        assert_eq!(registration.report_cccd(), Some(6));
        assert_eq!(registration.contract_for(5), Some(AccessContract::Report));
        assert_eq!(
            registration.contract_for(7),
            Some(AccessContract::ReportReference)
        );
        assert_eq!(reg.services[0], uuid::HID_SERVICE);
        assert!(registration.is_report_subscription(5));
        assert!(registration.is_report_subscription(6));
        assert!(!registration.is_report_subscription(3));
    }

    #[test]
    fn report_map_initial_value_is_descriptor() {
        let mut reg = SequentialRegistrar::default();
        register_tree(&mut reg, ATTRIBUTE_TREE).unwrap();
        let (_, map) = reg
            .initial
            .iter()
            .find(|(u, _)| *u == uuid::REPORT_MAP)
            .unwrap();
        assert_eq!(map.as_slice(), hid::MOUSE_REPORT_MAP);
    }

    #[test]
    fn host_refusal_is_registration_error() {
        let mut reg = SequentialRegistrar {
            fail_on: Some(uuid::REPORT),
            ..Default::default()
        };
        assert_eq!(
            register_tree(&mut reg, ATTRIBUTE_TREE).unwrap_err(),
            RegistrationError::Host(HostError::new(0x3001))
        );
    }

    #[test]
    fn tree_without_report_is_rejected() {
        let mut reg = SequentialRegistrar::default();
        assert_eq!(
            register_tree(&mut reg, &[BATTERY_SERVICE]).unwrap_err(),
            RegistrationError::ReportHandleMissing
        );
    }
}
