use thiserror::Error;

/// Error type for every driver-level wireless operation.
///
/// These never cross the [`crate::interfaces`] façade: they are logged there
/// and folded into a [`crate::outcome::Failure`].
#[derive(Error, Debug)]
pub enum WirelessError {
    #[error("Interface '{name}' not found. Verify interface exists with 'ip link show'.")]
    InterfaceNotFound { name: String },

    #[error("Interface '{name}' is not a wireless device")]
    NotWireless { name: String },

    #[error("Failed to get interface index for '{interface}': {reason}")]
    InterfaceIndexError { interface: String, reason: String },

    #[error("Failed to set interface '{interface}' state to {desired_state}: {reason}")]
    SetStateError {
        interface: String,
        desired_state: String,
        reason: String,
    },

    #[error("Failed to set wireless interface '{interface}' to {mode} mode: {reason}")]
    WirelessModeError {
        interface: String,
        mode: String,
        reason: String,
    },

    #[error("Failed to set channel {channel} on '{interface}': {reason}")]
    ChannelSetError {
        interface: String,
        channel: u32,
        reason: String,
    },

    #[error("MAC address operation failed on '{interface}': {reason}")]
    MacAddressError { interface: String, reason: String },

    #[error("Failed to query wireless info for '{interface}': {reason}")]
    WirelessInfoError { interface: String, reason: String },

    #[error("Invalid MAC address: {0}")]
    InvalidMac(#[from] crate::mac::MacError),

    #[error("Invalid argument: {parameter} = '{value}': {reason}")]
    InvalidArgument {
        parameter: String,
        value: String,
        reason: String,
    },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Permission denied: {operation}. Root privileges required.")]
    PermissionDenied { operation: String },

    #[error("IO error during {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Netlink protocol error during {operation}: {reason}")]
    NetlinkProtocol { operation: String, reason: String },

    #[error("Runtime error: {context}: {reason}")]
    Runtime { context: String, reason: String },
}

pub type Result<T> = std::result::Result<T, WirelessError>;

impl WirelessError {
    /// Create an IO error with context
    pub fn io_error(operation: impl Into<String>, source: std::io::Error) -> Self {
        if source.kind() == std::io::ErrorKind::PermissionDenied {
            return Self::PermissionDenied {
                operation: operation.into(),
            };
        }
        Self::Io {
            operation: operation.into(),
            source,
        }
    }

    /// Create a netlink protocol error with context
    pub fn netlink_error(operation: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::NetlinkProtocol {
            operation: operation.into(),
            reason: reason.into(),
        }
    }

    /// Create a runtime error with context
    pub fn runtime(context: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Runtime {
            context: context.into(),
            reason: reason.into(),
        }
    }

    /// Whether the interface could not be resolved to a wireless card at all.
    pub fn is_resolution(&self) -> bool {
        match self {
            Self::InterfaceNotFound { .. }
            | Self::NotWireless { .. }
            | Self::InterfaceIndexError { .. } => true,
            Self::InvalidArgument { parameter, .. } => parameter == "interface name",
            _ => false,
        }
    }
}
