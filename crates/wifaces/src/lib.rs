//! # wifaces
//!
//! Wireless interface helpers for an access-point toolkit: resolve an
//! interface to its radio, power it up or down, switch its mode, tune its
//! channel, rewrite its MAC address, and pick a monitor/AP interface pair.
//!
//! ## Layout
//!
//! - [`InterfaceController`]: the façade. Each call re-resolves the
//!   interface, validates the card, runs one driver primitive and returns an
//!   [`Outcome`]. Driver errors are logged under the `wifi` tracing target.
//! - [`WirelessOps`]: the driver primitives the façade is built on.
//! - [`Nl80211Ops`]: the kernel implementation (nl80211 + rtnetlink + sysfs).
//!
//! ## Platform Support
//!
//! The kernel backend is Linux-only and gated with `#[cfg(target_os = "linux")]`.
//! The façade, mode and MAC types compile everywhere.
//!
//! ## Usage
//!
//! ```no_run
//! use wifaces::{BackendConfig, InterfaceController, InterfaceMode};
//!
//! let controller = InterfaceController::native(BackendConfig::from_env());
//! let roles = controller.setup_interfaces(None, None, None)?;
//! controller.set_interface_mode(&roles.monitor_interface, InterfaceMode::Monitor, None)?;
//! # Ok::<(), wifaces::Failure>(())
//! ```

pub mod config;
pub mod error;
pub mod interfaces;
pub mod mac;
pub mod mode;
#[cfg(target_os = "linux")]
pub mod nl80211;
pub mod ops;
pub mod outcome;

/// Tracing target for every event this crate emits.
pub const LOG_TARGET: &str = "wifi";

pub use config::BackendConfig;
pub use error::{Result, WirelessError};
pub use interfaces::InterfaceController;
pub use mac::{MacAddress, MacError, RANDOM_MAC_PREFIX};
pub use mode::InterfaceMode;
#[cfg(target_os = "linux")]
pub use nl80211::{channel_to_frequency, frequency_to_channel, Nl80211Ops};
pub use ops::{Card, WirelessOps};
pub use outcome::{
    Failure, FailureKind, FoundInterface, InterfaceAssignment, InterfaceStatus, MacChange,
    MacRequest, Outcome,
};
