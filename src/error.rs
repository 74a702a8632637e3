//! Unified error type for the HID peripheral.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (behind the `defmt` feature) for efficient
//! on-target logging.

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Startup (fatal)
    /// The host controller never reported its identity address.
    HostSync,

    /// The GATT attribute tree was rejected by the host controller.
    ServiceRegistration(RegistrationError),

    // Advertising (recoverable)
    /// Advertisement fields could not be encoded.
    AdvertisingSetup(AdvertisingSetupError),

    /// The host controller refused to start broadcasting.
    AdvertisingStart(HostError),

    // Reports (recoverable)
    /// A notify/indicate request was refused; the report is dropped.
    Transmission(TransmitError),

    // Protocol
    /// A characteristic access was refused with an ATT error.
    AccessRejected(AttError),
}

/// Raw status code returned by the host controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HostError {
    pub code: u32,
}

impl HostError {
    pub const fn new(code: u32) -> Self {
        Self { code }
    }
}

/// Why the attribute tree could not be registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RegistrationError {
    /// The host controller refused a service, characteristic or descriptor.
    Host(HostError),
    /// The Report Map does not describe the 4-byte mouse input report.
    InvalidReportMap,
    /// Registration finished without yielding a Report value handle.
    ReportHandleMissing,
    /// The tree holds more characteristics than the registry can track.
    TooManyAttributes,
}

/// Advertisement field construction failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AdvertisingSetupError {
    /// Encoded fields exceed the 31-byte legacy advertising payload.
    PayloadTooLarge,
    /// The host controller rejected the advertisement data.
    Rejected(HostError),
}

/// Notify/indicate request failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransmitError {
    /// The connection handle no longer refers to a live link.
    NotConnected,
    /// The host controller has no buffers left (link congestion).
    Busy,
    /// Any other refusal, with the raw status code.
    Rejected(HostError),
}

/// ATT protocol errors surfaced to the remote peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttError {
    ReadNotPermitted,
    WriteNotPermitted,
    RequestNotSupported,
    InsufficientResources,
}

impl AttError {
    /// ATT wire error code (Core Spec Vol 3, Part F, 3.4.1.1).
    pub const fn code(self) -> u8 {
        match self {
            AttError::ReadNotPermitted => 0x02,
            AttError::WriteNotPermitted => 0x03,
            AttError::RequestNotSupported => 0x06,
            AttError::InsufficientResources => 0x11,
        }
    }
}

// Convenience conversions

impl From<RegistrationError> for Error {
    fn from(e: RegistrationError) -> Self {
        Error::ServiceRegistration(e)
    }
}

impl From<AdvertisingSetupError> for Error {
    fn from(e: AdvertisingSetupError) -> Self {
        Error::AdvertisingSetup(e)
    }
}

impl From<TransmitError> for Error {
    fn from(e: TransmitError) -> Self {
        Error::Transmission(e)
    }
}

impl From<AttError> for Error {
    fn from(e: AttError) -> Self {
        Error::AccessRejected(e)
    }
}

impl From<HostError> for RegistrationError {
    fn from(e: HostError) -> Self {
        RegistrationError::Host(e)
    }
}
