//! Kernel backend: nl80211 over generic netlink for wireless state,
//! rtnetlink for link flags and MAC writes, sysfs for cheap reads.
//!
//! Every call opens its own socket; nothing is cached between calls.

use std::future::Future;
use std::io;
use std::os::unix::io::AsRawFd;
use std::path::{Path, PathBuf};
use std::time::Duration;

use neli::{
    consts::{
        nl::{NlmF, NlmFFlags},
        socket::NlFamily,
    },
    genl::{Genlmsghdr, Nlattr},
    nl::{NlPayload, Nlmsghdr},
    socket::NlSocketHandle,
    types::{Buffer, GenlBuffer},
};
use rtnetlink::{new_connection, Handle};
use tracing::debug;

use crate::config::BackendConfig;
use crate::error::{Result, WirelessError};
use crate::mac::MacAddress;
use crate::mode::InterfaceMode;
use crate::ops::{Card, WirelessOps};
use crate::LOG_TARGET;

const NL80211_GENL_NAME: &str = "nl80211";

const NL80211_CMD_GET_WIPHY: u8 = 1;
const NL80211_CMD_SET_WIPHY: u8 = 2;
const NL80211_CMD_GET_INTERFACE: u8 = 5;
const NL80211_CMD_SET_INTERFACE: u8 = 6;

const NL80211_ATTR_WIPHY: u16 = 1;
const NL80211_ATTR_IFINDEX: u16 = 3;
const NL80211_ATTR_IFTYPE: u16 = 5;
const NL80211_ATTR_SUPPORTED_IFTYPES: u16 = 32;
const NL80211_ATTR_WIPHY_FREQ: u16 = 38;
const NL80211_ATTR_WIPHY_CHANNEL_TYPE: u16 = 39;

const NL80211_CHAN_NO_HT: u32 = 0;
const NLA_TYPE_MASK: u16 = 0x3fff;

const IFF_UP: u32 = 0x1;

/// Center frequency in MHz of a channel number.
///
/// No band check is made; the kernel rejects channels the radio cannot tune
/// to. `None` only when the frequency does not fit in a `u32`.
pub fn channel_to_frequency(channel: u32) -> Option<u32> {
    match channel {
        14 => Some(2484),
        ch if ch < 14 => Some(2407 + 5 * ch),
        ch => ch.checked_mul(5)?.checked_add(5000),
    }
}

/// Channel number for a center frequency, if it sits on the 5 MHz raster.
pub fn frequency_to_channel(freq: u32) -> Option<u32> {
    match freq {
        2484 => Some(14),
        2412..=2472 if (freq - 2407) % 5 == 0 => Some((freq - 2407) / 5),
        5000.. if (freq - 5000) % 5 == 0 => Some((freq - 5000) / 5),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct NlAttrSlice<'a> {
    nla_type: u16,
    payload: &'a [u8],
}

fn parse_nested_attrs(payload: &[u8]) -> Vec<NlAttrSlice<'_>> {
    let mut attrs = Vec::new();
    let mut offset = 0;
    while payload.len().saturating_sub(offset) >= 4 {
        let header = &payload[offset..offset + 4];
        let len = u16::from_ne_bytes([header[0], header[1]]) as usize;
        let nla_type = u16::from_ne_bytes([header[2], header[3]]) & NLA_TYPE_MASK;
        if len < 4 || offset + len > payload.len() {
            break;
        }
        attrs.push(NlAttrSlice {
            nla_type,
            payload: &payload[offset + 4..offset + len],
        });
        offset = offset.saturating_add((len + 3) & !3);
    }
    attrs
}

/// Modes listed in an `NL80211_ATTR_SUPPORTED_IFTYPES` nest. Each child
/// attribute is a flag whose type is the iftype number.
fn parse_supported_iftypes(payload: &[u8]) -> Vec<InterfaceMode> {
    let mut modes = Vec::new();
    for attr in parse_nested_attrs(payload) {
        if let Some(mode) = InterfaceMode::from_nl80211(u32::from(attr.nla_type)) {
            if !modes.contains(&mode) {
                modes.push(mode);
            }
        }
    }
    modes
}

fn attr_u32(payload: &[u8]) -> Option<u32> {
    payload
        .get(..4)
        .map(|b| u32::from_ne_bytes([b[0], b[1], b[2], b[3]]))
}

fn set_recv_timeout(sock: &NlSocketHandle, timeout: Duration) {
    let fd = sock.as_raw_fd();
    let tv = libc::timeval {
        tv_sec: timeout.as_secs() as libc::time_t,
        tv_usec: timeout.subsec_micros() as libc::suseconds_t,
    };
    let rc = unsafe {
        libc::setsockopt(
            fd,
            libc::SOL_SOCKET,
            libc::SO_RCVTIMEO,
            &tv as *const _ as *const libc::c_void,
            std::mem::size_of::<libc::timeval>() as libc::socklen_t,
        )
    };
    if rc != 0 {
        debug!(
            target: LOG_TARGET,
            "failed to set nl80211 recv timeout: {}",
            io::Error::last_os_error()
        );
    }
}

fn errno_error(operation: &str, code: i32) -> WirelessError {
    WirelessError::io_error(operation, io::Error::from_raw_os_error(code.abs()))
}

/// Read-only view of the per-interface sysfs tree.
#[derive(Debug, Clone)]
pub struct SysfsNet {
    root: PathBuf,
}

impl SysfsNet {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir(&self, name: &str) -> Result<PathBuf> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\0']) {
            return Err(WirelessError::InvalidArgument {
                parameter: "interface name".to_string(),
                value: name.to_string(),
                reason: "not a valid interface name".to_string(),
            });
        }
        Ok(self.root.join(name))
    }

    fn read(&self, name: &str, file: &str) -> io::Result<String> {
        let dir = self
            .dir(name)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        std::fs::read_to_string(dir.join(file)).map(|s| s.trim().to_string())
    }

    pub fn exists(&self, name: &str) -> bool {
        self.dir(name).map(|d| d.exists()).unwrap_or(false)
    }

    pub fn is_wireless(&self, name: &str) -> bool {
        self.dir(name)
            .map(|d| is_wireless_dir(&d))
            .unwrap_or(false)
    }

    pub fn ifindex(&self, name: &str) -> Result<u32> {
        let raw = self
            .read(name, "ifindex")
            .map_err(|e| WirelessError::InterfaceIndexError {
                interface: name.to_string(),
                reason: e.to_string(),
            })?;
        raw.parse::<u32>()
            .map_err(|e| WirelessError::InterfaceIndexError {
                interface: name.to_string(),
                reason: format!("unparsable ifindex '{}': {}", raw, e),
            })
    }

    pub fn phy_index(&self, name: &str) -> Result<u32> {
        let raw = self
            .read(name, "phy80211/index")
            .map_err(|e| WirelessError::WirelessInfoError {
                interface: name.to_string(),
                reason: format!("reading phy index: {}", e),
            })?;
        raw.parse::<u32>()
            .map_err(|e| WirelessError::WirelessInfoError {
                interface: name.to_string(),
                reason: format!("unparsable phy index '{}': {}", raw, e),
            })
    }

    pub fn is_up(&self, name: &str) -> Result<bool> {
        let raw = self
            .read(name, "flags")
            .map_err(|e| WirelessError::io_error(format!("reading flags of {}", name), e))?;
        let flags = u32::from_str_radix(raw.trim_start_matches("0x"), 16).map_err(|e| {
            WirelessError::WirelessInfoError {
                interface: name.to_string(),
                reason: format!("unparsable flags '{}': {}", raw, e),
            }
        })?;
        Ok(flags & IFF_UP != 0)
    }

    pub fn mac(&self, name: &str) -> Result<MacAddress> {
        let raw = self
            .read(name, "address")
            .map_err(|e| WirelessError::MacAddressError {
                interface: name.to_string(),
                reason: e.to_string(),
            })?;
        Ok(raw.parse::<MacAddress>()?)
    }

    /// Wireless interface names ordered by ifindex.
    pub fn wireless_interfaces(&self) -> Result<Vec<String>> {
        let entries = std::fs::read_dir(&self.root).map_err(|e| {
            WirelessError::io_error(format!("listing {}", self.root.display()), e)
        })?;

        let mut found = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| {
                WirelessError::io_error(format!("listing {}", self.root.display()), e)
            })?;
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if !is_wireless_dir(&entry.path()) {
                continue;
            }
            let index = self.ifindex(&name).unwrap_or(u32::MAX);
            found.push((index, name));
        }
        found.sort();
        Ok(found.into_iter().map(|(_, name)| name).collect())
    }

    pub fn card(&self, name: &str) -> Result<Card> {
        let dir = self.dir(name)?;
        if !dir.exists() {
            return Err(WirelessError::InterfaceNotFound {
                name: name.to_string(),
            });
        }
        if !is_wireless_dir(&dir) {
            return Err(WirelessError::NotWireless {
                name: name.to_string(),
            });
        }
        Ok(Card {
            phy: self.phy_index(name)?,
            dev: name.to_string(),
            ifindex: self.ifindex(name)?,
        })
    }

    pub fn is_valid_card(&self, card: &Card) -> bool {
        self.is_wireless(&card.dev)
            && self.ifindex(&card.dev).ok() == Some(card.ifindex)
            && self.phy_index(&card.dev).ok() == Some(card.phy)
    }
}

fn is_wireless_dir(dir: &Path) -> bool {
    dir.join("wireless").exists() || dir.join("phy80211").exists()
}

/// [`WirelessOps`] backed by the running kernel.
pub struct Nl80211Ops {
    config: BackendConfig,
    sysfs: SysfsNet,
}

impl Nl80211Ops {
    pub fn new(config: BackendConfig) -> Self {
        let sysfs = SysfsNet::new(config.sysfs_root.clone());
        Self { config, sysfs }
    }

    fn connect(&self) -> Result<(NlSocketHandle, u16)> {
        let mut socket = NlSocketHandle::connect(NlFamily::Generic, None, &[]).map_err(|e| {
            WirelessError::ConnectionFailed(format!("Failed to create nl80211 socket: {}", e))
        })?;
        let family_id = socket.resolve_genl_family(NL80211_GENL_NAME).map_err(|e| {
            WirelessError::netlink_error(
                "resolving nl80211 family",
                format!("wireless drivers not loaded? {}", e),
            )
        })?;
        set_recv_timeout(&socket, self.config.recv_timeout);
        Ok((socket, family_id))
    }

    /// Send one nl80211 command and read one reply.
    ///
    /// Returns the reply body for GET commands and `None` for an ACK.
    fn transact(
        &self,
        operation: &str,
        cmd: u8,
        attrs: GenlBuffer<u16, Buffer>,
        ack: bool,
    ) -> Result<Option<Genlmsghdr<u8, u16>>> {
        let (mut socket, family_id) = self.connect()?;

        let flags = if ack {
            NlmFFlags::new(&[NlmF::Request, NlmF::Ack])
        } else {
            NlmFFlags::new(&[NlmF::Request])
        };
        let genlhdr = Genlmsghdr::new(cmd, 1, attrs);
        let nlhdr = Nlmsghdr::new(None, family_id, flags, None, None, NlPayload::Payload(genlhdr));

        socket.send(nlhdr).map_err(|e| {
            WirelessError::netlink_error(operation, format!("send failed: {}", e))
        })?;

        let response: Nlmsghdr<u16, Genlmsghdr<u8, u16>> = socket
            .recv()
            .map_err(|e| WirelessError::netlink_error(operation, format!("recv failed: {}", e)))?
            .ok_or_else(|| WirelessError::netlink_error(operation, "no response received"))?;

        match response.nl_payload {
            NlPayload::Payload(genl) => Ok(Some(genl)),
            // NLMSG_ERROR with error == 0 is the ACK
            NlPayload::Err(err) if err.error == 0 => Ok(None),
            NlPayload::Ack(ack) if ack.error == 0 => Ok(None),
            NlPayload::Err(err) => Err(errno_error(operation, err.error)),
            NlPayload::Ack(ack) => Err(errno_error(operation, ack.error)),
            other => Err(WirelessError::netlink_error(
                operation,
                format!("unexpected payload {:?}", other),
            )),
        }
    }

    fn attr(operation: &str, nla_type: u16, value: u32) -> Result<Nlattr<u16, Buffer>> {
        Nlattr::new(false, false, nla_type, value).map_err(|e| {
            WirelessError::netlink_error(operation, format!("building attribute {}: {}", nla_type, e))
        })
    }

    fn get_interface(&self, card: &Card) -> Result<Genlmsghdr<u8, u16>> {
        let operation = "get_interface";
        let mut attrs = GenlBuffer::new();
        attrs.push(Self::attr(operation, NL80211_ATTR_IFINDEX, card.ifindex)?);
        self.transact(operation, NL80211_CMD_GET_INTERFACE, attrs, false)?
            .ok_or_else(|| WirelessError::WirelessInfoError {
                interface: card.dev.clone(),
                reason: "kernel returned no interface record".to_string(),
            })
    }

    fn interface_u32(&self, card: &Card, nla_type: u16) -> Result<Option<u32>> {
        let genl = self.get_interface(card)?;
        let value = genl
            .get_attr_handle()
            .iter()
            .find(|attr| attr.nla_type.nla_type == nla_type)
            .and_then(|attr| attr_u32(attr.nla_payload.as_ref()));
        Ok(value)
    }

    /// Run one rtnetlink request on a private current-thread runtime.
    fn link_request<F, Fut>(&self, context: &str, request: F) -> Result<()>
    where
        F: FnOnce(Handle) -> Fut,
        Fut: Future<Output = Result<()>>,
    {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| WirelessError::runtime(context, e.to_string()))?;

        runtime.block_on(async move {
            let (connection, handle, _) = new_connection().map_err(|e| {
                WirelessError::ConnectionFailed(format!("rtnetlink for {}: {}", context, e))
            })?;
            tokio::spawn(connection);
            request(handle).await
        })
    }

    fn set_link_state(&self, card: &Card, up: bool) -> Result<()> {
        let index = card.ifindex;
        let interface = card.dev.clone();
        let desired_state = if up { "UP" } else { "DOWN" };
        debug!(target: LOG_TARGET, iface = %interface, ifindex = index, state = desired_state, "rtnetlink set link");

        self.link_request("setting link state", move |handle| async move {
            let request = handle.link().set(index);
            let request = if up { request.up() } else { request.down() };
            request
                .execute()
                .await
                .map_err(|e| WirelessError::SetStateError {
                    interface,
                    desired_state: desired_state.to_string(),
                    reason: e.to_string(),
                })
        })
    }
}

impl WirelessOps for Nl80211Ops {
    fn wireless_interfaces(&self) -> Result<Vec<String>> {
        self.sysfs.wireless_interfaces()
    }

    fn interface_exists(&self, name: &str) -> bool {
        self.sysfs.exists(name)
    }

    fn card(&self, name: &str) -> Result<Card> {
        self.sysfs.card(name)
    }

    fn is_valid_card(&self, card: &Card) -> bool {
        self.sysfs.is_valid_card(card)
    }

    fn supported_modes(&self, card: &Card) -> Result<Vec<InterfaceMode>> {
        let operation = "get_wiphy";
        let mut attrs = GenlBuffer::new();
        attrs.push(Self::attr(operation, NL80211_ATTR_WIPHY, card.phy)?);

        let genl = self
            .transact(operation, NL80211_CMD_GET_WIPHY, attrs, false)?
            .ok_or_else(|| WirelessError::WirelessInfoError {
                interface: card.dev.clone(),
                reason: format!("kernel returned no record for phy{}", card.phy),
            })?;

        let modes = genl
            .get_attr_handle()
            .iter()
            .find(|attr| attr.nla_type.nla_type == NL80211_ATTR_SUPPORTED_IFTYPES)
            .map(|attr| parse_supported_iftypes(attr.nla_payload.as_ref()))
            .unwrap_or_default();
        debug!(target: LOG_TARGET, iface = %card.dev, phy = card.phy, ?modes, "nl80211 supported modes");
        Ok(modes)
    }

    fn is_up(&self, card: &Card) -> Result<bool> {
        self.sysfs.is_up(&card.dev)
    }

    fn set_up(&self, card: &Card) -> Result<()> {
        self.set_link_state(card, true)
    }

    fn set_down(&self, card: &Card) -> Result<()> {
        self.set_link_state(card, false)
    }

    fn mode(&self, card: &Card) -> Result<InterfaceMode> {
        let iftype = self
            .interface_u32(card, NL80211_ATTR_IFTYPE)?
            .ok_or_else(|| WirelessError::WirelessInfoError {
                interface: card.dev.clone(),
                reason: "no iftype reported".to_string(),
            })?;
        InterfaceMode::from_nl80211(iftype).ok_or_else(|| WirelessError::WirelessInfoError {
            interface: card.dev.clone(),
            reason: format!("unknown iftype {}", iftype),
        })
    }

    fn set_mode(&self, card: &Card, mode: InterfaceMode) -> Result<()> {
        let operation = "set_interface";
        debug!(target: LOG_TARGET, iface = %card.dev, ifindex = card.ifindex, %mode, "nl80211 set_mode");

        let mut attrs = GenlBuffer::new();
        attrs.push(Self::attr(operation, NL80211_ATTR_IFINDEX, card.ifindex)?);
        attrs.push(Self::attr(operation, NL80211_ATTR_IFTYPE, mode.to_nl80211())?);

        match self.transact(operation, NL80211_CMD_SET_INTERFACE, attrs, true) {
            Ok(_) => Ok(()),
            Err(e @ WirelessError::PermissionDenied { .. }) => Err(e),
            Err(e) => Err(WirelessError::WirelessModeError {
                interface: card.dev.clone(),
                mode: mode.to_string(),
                reason: e.to_string(),
            }),
        }
    }

    fn channel(&self, card: &Card) -> Result<Option<u32>> {
        Ok(self
            .interface_u32(card, NL80211_ATTR_WIPHY_FREQ)?
            .and_then(frequency_to_channel))
    }

    fn set_channel(&self, card: &Card, channel: u32) -> Result<()> {
        let operation = "set_wiphy";
        let frequency =
            channel_to_frequency(channel).ok_or_else(|| WirelessError::ChannelSetError {
                interface: card.dev.clone(),
                channel,
                reason: "channel number out of range".to_string(),
            })?;
        debug!(target: LOG_TARGET, iface = %card.dev, channel, frequency, "nl80211 set_channel");

        let mut attrs = GenlBuffer::new();
        attrs.push(Self::attr(operation, NL80211_ATTR_IFINDEX, card.ifindex)?);
        attrs.push(Self::attr(operation, NL80211_ATTR_WIPHY_FREQ, frequency)?);
        attrs.push(Self::attr(
            operation,
            NL80211_ATTR_WIPHY_CHANNEL_TYPE,
            NL80211_CHAN_NO_HT,
        )?);

        match self.transact(operation, NL80211_CMD_SET_WIPHY, attrs, true) {
            Ok(_) => Ok(()),
            Err(e @ WirelessError::PermissionDenied { .. }) => Err(e),
            Err(e) => Err(WirelessError::ChannelSetError {
                interface: card.dev.clone(),
                channel,
                reason: e.to_string(),
            }),
        }
    }

    fn mac(&self, card: &Card) -> Result<MacAddress> {
        self.sysfs.mac(&card.dev)
    }

    fn set_mac(&self, card: &Card, mac: &MacAddress) -> Result<()> {
        let index = card.ifindex;
        let interface = card.dev.clone();
        let bytes = mac.as_bytes().to_vec();
        debug!(target: LOG_TARGET, iface = %interface, %mac, "rtnetlink set address");

        self.link_request("setting MAC address", move |handle| async move {
            handle
                .link()
                .set(index)
                .address(bytes)
                .execute()
                .await
                .map_err(|e| WirelessError::MacAddressError {
                    interface,
                    reason: e.to_string(),
                })
        })
    }
}
