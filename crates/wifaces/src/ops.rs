use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mac::MacAddress;
use crate::mode::InterfaceMode;

/// Handle tying an interface name to the radio that backs it.
///
/// Cards are resolved fresh by every façade call and never cached; a card
/// can go stale if the interface is removed or renamed underneath it, which
/// [`WirelessOps::is_valid_card`] detects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// wiphy index (`phyN`)
    pub phy: u32,
    pub dev: String,
    pub ifindex: u32,
}

/// Driver primitives the interface helpers are built on.
///
/// [`crate::Nl80211Ops`] talks to the kernel; tests inject a fake.
pub trait WirelessOps: Send + Sync {
    /// Wireless interface names, in enumeration order.
    fn wireless_interfaces(&self) -> Result<Vec<String>>;
    /// Whether any interface (wired or wireless) with this name exists.
    fn interface_exists(&self, name: &str) -> bool;

    fn card(&self, name: &str) -> Result<Card>;
    fn is_valid_card(&self, card: &Card) -> bool;
    fn supported_modes(&self, card: &Card) -> Result<Vec<InterfaceMode>>;

    fn is_up(&self, card: &Card) -> Result<bool>;
    fn set_up(&self, card: &Card) -> Result<()>;
    fn set_down(&self, card: &Card) -> Result<()>;

    fn mode(&self, card: &Card) -> Result<InterfaceMode>;
    fn set_mode(&self, card: &Card, mode: InterfaceMode) -> Result<()>;

    fn channel(&self, card: &Card) -> Result<Option<u32>>;
    fn set_channel(&self, card: &Card, channel: u32) -> Result<()>;

    fn mac(&self, card: &Card) -> Result<MacAddress>;
    fn set_mac(&self, card: &Card, mac: &MacAddress) -> Result<()>;
}
