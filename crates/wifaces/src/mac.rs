//! MAC address parsing, formatting and generation.
//!
//! Generated addresses keep a caller-chosen OUI and draw the three NIC
//! octets from `getrandom`. The default prefix used by
//! [`crate::interfaces::InterfaceController::set_interface_mac`] is
//! [`RANDOM_MAC_PREFIX`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// OUI used for randomly generated addresses.
pub const RANDOM_MAC_PREFIX: [u8; 3] = [0x00, 0x00, 0x00];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MacError {
    #[error("Expected 6 octets, got {0}")]
    OctetCount(usize),

    #[error("Invalid hex octet: {0}")]
    InvalidOctet(String),

    #[error("Unrecognized MAC format: {0}")]
    Format(String),

    #[error("Failed to get random bytes: {0}")]
    Rng(String),
}

/// A validated 48-bit MAC address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress {
    bytes: [u8; 6],
}

impl MacAddress {
    #[must_use]
    pub fn new(bytes: [u8; 6]) -> Self {
        Self { bytes }
    }

    /// Parse a MAC address from string
    ///
    /// Accepts formats:
    /// - `aa:bb:cc:dd:ee:ff`
    /// - `aa-bb-cc-dd-ee-ff`
    /// - `aabbccddeeff`
    ///
    /// # Errors
    ///
    /// Returns an error if the string is not a valid MAC address
    pub fn parse(s: &str) -> Result<Self, MacError> {
        s.parse()
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; 6] {
        &self.bytes
    }

    /// First three octets (vendor identifier)
    #[must_use]
    pub fn oui(&self) -> [u8; 3] {
        [self.bytes[0], self.bytes[1], self.bytes[2]]
    }

    /// Last three octets (device specific)
    #[must_use]
    pub fn nic(&self) -> [u8; 3] {
        [self.bytes[3], self.bytes[4], self.bytes[5]]
    }

    /// Create a MAC with the given OUI and three random NIC octets.
    ///
    /// The OUI is used verbatim; no locally-administered or unicast bits are
    /// forced.
    pub fn random_with_oui(oui: [u8; 3]) -> Result<Self, MacError> {
        let mut bytes = [0u8; 6];
        bytes[..3].copy_from_slice(&oui);
        getrandom::getrandom(&mut bytes[3..6]).map_err(|e| MacError::Rng(e.to_string()))?;
        Ok(Self { bytes })
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let b = &self.bytes;
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            b[0], b[1], b[2], b[3], b[4], b[5]
        )
    }
}

fn parse_octets(parts: &[&str]) -> Result<[u8; 6], MacError> {
    if parts.len() != 6 {
        return Err(MacError::OctetCount(parts.len()));
    }
    let mut bytes = [0u8; 6];
    for (slot, part) in bytes.iter_mut().zip(parts) {
        if part.len() != 2 || !part.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(MacError::InvalidOctet(part.to_string()));
        }
        *slot =
            u8::from_str_radix(part, 16).map_err(|_| MacError::InvalidOctet(part.to_string()))?;
    }
    Ok(bytes)
}

impl FromStr for MacAddress {
    type Err = MacError;

    fn from_str(s: &str) -> Result<Self, MacError> {
        let s = s.trim();

        if s.contains(':') {
            let parts: Vec<&str> = s.split(':').collect();
            return parse_octets(&parts).map(Self::new);
        }

        if s.contains('-') {
            let parts: Vec<&str> = s.split('-').collect();
            return parse_octets(&parts).map(Self::new);
        }

        if s.len() == 12 && s.is_ascii() {
            let parts: Vec<&str> = (0..6).map(|i| &s[i * 2..i * 2 + 2]).collect();
            return parse_octets(&parts).map(Self::new);
        }

        Err(MacError::Format(s.to_string()))
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

impl TryFrom<String> for MacAddress {
    type Error = MacError;

    fn try_from(value: String) -> Result<Self, MacError> {
        value.parse()
    }
}
