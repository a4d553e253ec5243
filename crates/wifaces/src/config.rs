use std::env;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_NL_RECV_TIMEOUT_MS: u64 = 800;
pub const DEFAULT_SYSFS_NET: &str = "/sys/class/net";

/// Settings for the kernel backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendConfig {
    /// Receive timeout applied to each nl80211 socket.
    pub recv_timeout: Duration,
    /// Directory holding one entry per network interface.
    pub sysfs_root: PathBuf,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            recv_timeout: Duration::from_millis(DEFAULT_NL_RECV_TIMEOUT_MS),
            sysfs_root: PathBuf::from(DEFAULT_SYSFS_NET),
        }
    }
}

impl BackendConfig {
    pub fn from_env() -> Self {
        let recv_timeout_ms = env::var("WIFACES_NL_RECV_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .unwrap_or(DEFAULT_NL_RECV_TIMEOUT_MS);
        let sysfs_root = env::var("WIFACES_SYSFS_NET")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SYSFS_NET));

        Self {
            recv_timeout: Duration::from_millis(recv_timeout_ms),
            sysfs_root,
        }
    }
}
