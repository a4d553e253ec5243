use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// nl80211 interface types
const NL80211_IFTYPE_UNSPECIFIED: u32 = 0;
const NL80211_IFTYPE_ADHOC: u32 = 1;
const NL80211_IFTYPE_STATION: u32 = 2;
const NL80211_IFTYPE_AP: u32 = 3;
const NL80211_IFTYPE_AP_VLAN: u32 = 4;
const NL80211_IFTYPE_WDS: u32 = 5;
const NL80211_IFTYPE_MONITOR: u32 = 6;
const NL80211_IFTYPE_MESH_POINT: u32 = 7;
const NL80211_IFTYPE_P2P_CLIENT: u32 = 8;
const NL80211_IFTYPE_P2P_GO: u32 = 9;

/// Wireless interface operating mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterfaceMode {
    Unspecified,
    Ibss,
    Managed,
    Ap,
    ApVlan,
    Wds,
    Monitor,
    Mesh,
    P2p,
}

impl InterfaceMode {
    pub const ALL: [InterfaceMode; 9] = [
        Self::Unspecified,
        Self::Ibss,
        Self::Managed,
        Self::Ap,
        Self::ApVlan,
        Self::Wds,
        Self::Monitor,
        Self::Mesh,
        Self::P2p,
    ];

    pub fn to_nl80211(self) -> u32 {
        match self {
            Self::Unspecified => NL80211_IFTYPE_UNSPECIFIED,
            Self::Ibss => NL80211_IFTYPE_ADHOC,
            Self::Managed => NL80211_IFTYPE_STATION,
            Self::Ap => NL80211_IFTYPE_AP,
            Self::ApVlan => NL80211_IFTYPE_AP_VLAN,
            Self::Wds => NL80211_IFTYPE_WDS,
            Self::Monitor => NL80211_IFTYPE_MONITOR,
            Self::Mesh => NL80211_IFTYPE_MESH_POINT,
            Self::P2p => NL80211_IFTYPE_P2P_CLIENT,
        }
    }

    /// Map a kernel iftype to a mode. P2P-GO folds into [`InterfaceMode::P2p`];
    /// newer types (P2P device, OCB, NAN) have no mode here.
    pub fn from_nl80211(iftype: u32) -> Option<Self> {
        match iftype {
            NL80211_IFTYPE_UNSPECIFIED => Some(Self::Unspecified),
            NL80211_IFTYPE_ADHOC => Some(Self::Ibss),
            NL80211_IFTYPE_STATION => Some(Self::Managed),
            NL80211_IFTYPE_AP => Some(Self::Ap),
            NL80211_IFTYPE_AP_VLAN => Some(Self::ApVlan),
            NL80211_IFTYPE_WDS => Some(Self::Wds),
            NL80211_IFTYPE_MONITOR => Some(Self::Monitor),
            NL80211_IFTYPE_MESH_POINT => Some(Self::Mesh),
            NL80211_IFTYPE_P2P_CLIENT | NL80211_IFTYPE_P2P_GO => Some(Self::P2p),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unspecified => "unspecified",
            Self::Ibss => "IBSS",
            Self::Managed => "managed",
            Self::Ap => "AP",
            Self::ApVlan => "AP VLAN",
            Self::Wds => "wds",
            Self::Monitor => "monitor",
            Self::Mesh => "mesh",
            Self::P2p => "p2p",
        }
    }
}

impl fmt::Display for InterfaceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterfaceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_'], " ");
        match normalized.as_str() {
            "unspecified" => Ok(Self::Unspecified),
            "ibss" | "adhoc" | "ad hoc" => Ok(Self::Ibss),
            "managed" | "station" => Ok(Self::Managed),
            "ap" => Ok(Self::Ap),
            "ap vlan" => Ok(Self::ApVlan),
            "wds" => Ok(Self::Wds),
            "monitor" => Ok(Self::Monitor),
            "mesh" => Ok(Self::Mesh),
            "p2p" => Ok(Self::P2p),
            _ => Err(format!("unknown interface mode '{}'", s)),
        }
    }
}
