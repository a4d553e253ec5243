//! Result records returned by the interface helpers.
//!
//! Every helper returns an [`Outcome`]: driver errors are converted into a
//! [`Failure`] at the façade and never propagate further.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::mac::MacAddress;
use crate::mode::InterfaceMode;

/// Why an operation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Interface unknown to the OS or not wireless.
    Resolution,
    /// Handle exists but failed a sanity check.
    Validation,
    /// The driver primitive itself returned an error.
    Driver,
    /// Caller asked for an invalid combination of interface roles.
    Policy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Failure {
    pub kind: FailureKind,
    pub message: String,
}

impl Failure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn policy(message: impl Into<String>) -> Self {
        Self::new(FailureKind::Policy, message)
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for Failure {}

pub type Outcome<T> = std::result::Result<T, Failure>;

/// Interface picked by [`crate::InterfaceController::find_interface`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FoundInterface {
    pub interface_name: String,
    /// The interface was on the exclusion list, so this role shares a radio
    /// with another one.
    pub is_virtual: bool,
}

/// Which MAC to write in [`crate::InterfaceController::set_interface_mac`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacRequest {
    Random,
    Explicit(MacAddress),
}

/// Result of a MAC change.
///
/// `new_mac` is the address that was attempted, whether or not the write
/// succeeded; `old_mac` is present once it has been read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacChange {
    pub old_mac: Option<MacAddress>,
    pub new_mac: Option<MacAddress>,
    pub result: Outcome<()>,
}

impl MacChange {
    pub fn succeeded(&self) -> bool {
        self.result.is_ok()
    }
}

/// Validated monitor/AP (and optional internet) assignment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceAssignment {
    pub monitor_interface: String,
    pub monitor_virtual: bool,
    pub ap_interface: String,
    pub ap_virtual: bool,
    pub internet_interface: Option<String>,
}

/// Snapshot of a wireless interface. Fields the driver could not report are
/// `None`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceStatus {
    pub interface: String,
    pub phy: u32,
    pub ifindex: u32,
    pub mode: Option<InterfaceMode>,
    pub is_up: Option<bool>,
    pub channel: Option<u32>,
    pub mac: Option<MacAddress>,
    pub supported_modes: Vec<InterfaceMode>,
}
