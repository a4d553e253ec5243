//! Interface identity, mode and channel helpers.
//!
//! Every operation re-resolves the interface card, validates it and calls a
//! single [`WirelessOps`] primitive. Driver errors are logged under the
//! `wifi` target and returned as a [`Failure`]; role-selection errors from
//! [`InterfaceController::setup_interfaces`] are returned without logging.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::mac::{MacAddress, RANDOM_MAC_PREFIX};
use crate::mode::InterfaceMode;
use crate::ops::{Card, WirelessOps};
use crate::outcome::{
    Failure, FailureKind, FoundInterface, InterfaceAssignment, InterfaceStatus, MacChange,
    MacRequest, Outcome,
};
use crate::LOG_TARGET;

pub struct InterfaceController {
    ops: Arc<dyn WirelessOps>,
}

impl InterfaceController {
    pub fn new(ops: Arc<dyn WirelessOps>) -> Self {
        Self { ops }
    }

    /// Controller over the kernel nl80211/rtnetlink backend.
    #[cfg(target_os = "linux")]
    pub fn native(config: crate::config::BackendConfig) -> Self {
        Self::new(Arc::new(crate::nl80211::Nl80211Ops::new(config)))
    }

    /// Resolve the card behind `interface_name`.
    pub fn get_interface_card(&self, interface_name: &str) -> Outcome<Card> {
        self.ops.card(interface_name).map_err(|e| {
            error!(
                target: LOG_TARGET,
                interface = interface_name,
                operation = "get_card",
                error = %e,
                "Failed to get the card object for {}",
                interface_name
            );
            let kind = if e.is_resolution() {
                FailureKind::Resolution
            } else {
                FailureKind::Driver
            };
            Failure::new(
                kind,
                format!("Failed to get the card object for {}: {}", interface_name, e),
            )
        })
    }

    fn valid_card(&self, interface_name: &str, card: Option<&Card>) -> Outcome<Card> {
        let card = match card {
            Some(card) => card.clone(),
            None => self.get_interface_card(interface_name)?,
        };
        if !self.ops.is_valid_card(&card) {
            warn!(
                target: LOG_TARGET,
                interface = interface_name,
                phy = card.phy,
                ifindex = card.ifindex,
                "Card for {} is no longer valid",
                interface_name
            );
            return Err(Failure::new(
                FailureKind::Validation,
                format!("Card for {} is not valid", interface_name),
            ));
        }
        Ok(card)
    }

    /// Bring the interface up (`on`) or down.
    pub fn turn_interface(
        &self,
        interface_name: &str,
        on: bool,
        card: Option<&Card>,
    ) -> Outcome<()> {
        let card = self.valid_card(interface_name, card)?;
        let state = if on { "ON" } else { "OFF" };
        let result = if on {
            self.ops.set_up(&card)
        } else {
            self.ops.set_down(&card)
        };
        result.map_err(|e| {
            error!(
                target: LOG_TARGET,
                interface = interface_name,
                operation = "power",
                error = %e,
                "Failed to turn {} {}",
                interface_name,
                state
            );
            Failure::new(
                FailureKind::Driver,
                format!("Failed to turn {} {}: {}", interface_name, state, e),
            )
        })?;
        debug!(target: LOG_TARGET, interface = interface_name, "Turned {} {}", interface_name, state);
        Ok(())
    }

    /// Switch the interface to `mode`.
    ///
    /// The device is powered off first and powered on again only if the mode
    /// change succeeded. A failed mode change therefore leaves the device
    /// down; a failed power-off means the mode is never touched.
    pub fn set_interface_mode(
        &self,
        interface_name: &str,
        mode: InterfaceMode,
        card: Option<&Card>,
    ) -> Outcome<()> {
        let card = self.valid_card(interface_name, card)?;
        self.turn_interface(interface_name, false, Some(&card))?;

        self.ops.set_mode(&card, mode).map_err(|e| {
            error!(
                target: LOG_TARGET,
                interface = interface_name,
                operation = "set_mode",
                mode = %mode,
                error = %e,
                "Failed to set {} to {}",
                interface_name,
                mode
            );
            Failure::new(
                FailureKind::Driver,
                format!("Failed to set {} to {}: {}", interface_name, mode, e),
            )
        })?;

        self.turn_interface(interface_name, true, Some(&card))?;
        info!(target: LOG_TARGET, interface = interface_name, mode = %mode, "Interface mode set");
        Ok(())
    }

    /// Tune the interface to `channel`. Range checking is left to the driver.
    pub fn set_interface_channel(
        &self,
        interface_name: &str,
        channel: u32,
        card: Option<&Card>,
    ) -> Outcome<()> {
        let card = self.valid_card(interface_name, card)?;
        self.ops.set_channel(&card, channel).map_err(|e| {
            error!(
                target: LOG_TARGET,
                interface = interface_name,
                operation = "set_channel",
                channel,
                error = %e,
                "Failed to set {} to channel {}",
                interface_name,
                channel
            );
            Failure::new(
                FailureKind::Driver,
                format!("Failed to set {} to channel {}: {}", interface_name, channel, e),
            )
        })?;
        info!(target: LOG_TARGET, interface = interface_name, channel, "Channel set");
        Ok(())
    }

    /// Write a new MAC to the interface, switching it to managed mode first.
    pub fn set_interface_mac(&self, interface_name: &str, request: MacRequest) -> MacChange {
        let new_mac = match request {
            MacRequest::Explicit(mac) => mac,
            MacRequest::Random => match MacAddress::random_with_oui(RANDOM_MAC_PREFIX) {
                Ok(mac) => mac,
                Err(e) => {
                    error!(
                        target: LOG_TARGET,
                        interface = interface_name,
                        operation = "generate_mac",
                        error = %e,
                        "Failed to generate a random MAC address"
                    );
                    return MacChange {
                        old_mac: None,
                        new_mac: None,
                        result: Err(Failure::new(
                            FailureKind::Driver,
                            format!("Failed to generate a random MAC address: {}", e),
                        )),
                    };
                }
            },
        };

        let mut change = MacChange {
            old_mac: None,
            new_mac: Some(new_mac),
            result: Ok(()),
        };

        let card = match self.get_interface_card(interface_name) {
            Ok(card) => card,
            Err(failure) => {
                change.result = Err(failure);
                return change;
            }
        };

        if let Err(failure) =
            self.set_interface_mode(interface_name, InterfaceMode::Managed, Some(&card))
        {
            change.result = Err(failure);
            return change;
        }

        let written = self.ops.mac(&card).and_then(|old| {
            change.old_mac = Some(old);
            self.ops.set_mac(&card, &new_mac)
        });

        if let Err(e) = written {
            error!(
                target: LOG_TARGET,
                interface = interface_name,
                operation = "set_mac",
                mac = %new_mac,
                error = %e,
                "Failed to change MAC address"
            );
            change.result = Err(Failure::new(
                FailureKind::Driver,
                format!("Failed to change MAC address of {}: {}", interface_name, e),
            ));
            return change;
        }

        info!(
            target: LOG_TARGET,
            interface = interface_name,
            old_mac = ?change.old_mac.map(|m| m.to_string()),
            new_mac = %new_mac,
            "MAC address changed"
        );
        change
    }

    /// Whether `interface_name` supports `mode`. Any failure reads as `false`.
    pub fn has_mode(&self, interface_name: &str, mode: InterfaceMode) -> bool {
        let Ok(card) = self.get_interface_card(interface_name) else {
            return false;
        };
        match self.ops.supported_modes(&card) {
            Ok(modes) => modes.contains(&mode),
            Err(e) => {
                error!(
                    target: LOG_TARGET,
                    interface = interface_name,
                    operation = "supported_modes",
                    mode = %mode,
                    error = %e,
                    "Failed to check if {} has {} mode",
                    interface_name,
                    mode
                );
                false
            }
        }
    }

    /// Wireless interface names in the order the backend reports them.
    pub fn list_wireless_interfaces(&self) -> Outcome<Vec<String>> {
        self.ops.wireless_interfaces().map_err(|e| {
            error!(
                target: LOG_TARGET,
                operation = "list_interfaces",
                error = %e,
                "Failed to enumerate wireless interfaces"
            );
            Failure::new(
                FailureKind::Driver,
                format!("Failed to enumerate wireless interfaces: {}", e),
            )
        })
    }

    /// Find an interface supporting `mode`.
    ///
    /// Interfaces in `exclude` stay eligible but are only chosen when no
    /// other interface qualifies, in which case the result is flagged
    /// virtual. Finding nothing is a policy failure and is not logged.
    pub fn find_interface(&self, mode: InterfaceMode, exclude: &[&str]) -> Outcome<FoundInterface> {
        let mut alternative: Option<String> = None;

        for name in self.list_wireless_interfaces()? {
            if !self.has_mode(&name, mode) {
                continue;
            }
            if !exclude.contains(&name.as_str()) {
                return Ok(FoundInterface {
                    interface_name: name,
                    is_virtual: false,
                });
            }
            if alternative.is_none() {
                alternative = Some(name);
            }
        }

        match alternative {
            Some(name) => Ok(FoundInterface {
                interface_name: name,
                is_virtual: true,
            }),
            None => Err(Failure::policy(format!(
                "Failed to find an interface with {} mode",
                mode
            ))),
        }
    }

    /// Pick or validate the monitor and AP interfaces, plus an optional
    /// internet-facing one.
    pub fn setup_interfaces(
        &self,
        monitor_interface: Option<&str>,
        ap_interface: Option<&str>,
        internet_interface: Option<&str>,
    ) -> Outcome<InterfaceAssignment> {
        let mut assignment = match (monitor_interface, ap_interface) {
            (Some(monitor), Some(ap)) => {
                if monitor == ap {
                    return Err(Failure::policy(
                        "Monitor interface and AP interface can not be the same",
                    ));
                }
                self.require_mode(monitor, InterfaceMode::Monitor, "Monitor")?;
                self.require_mode(ap, InterfaceMode::Ap, "AP")?;
                InterfaceAssignment {
                    monitor_interface: monitor.to_string(),
                    monitor_virtual: false,
                    ap_interface: ap.to_string(),
                    ap_virtual: false,
                    internet_interface: None,
                }
            }
            (Some(monitor), None) => {
                self.require_mode(monitor, InterfaceMode::Monitor, "Monitor")?;
                let found = self.find_interface(InterfaceMode::Ap, &[monitor])?;
                InterfaceAssignment {
                    monitor_interface: monitor.to_string(),
                    monitor_virtual: false,
                    ap_interface: found.interface_name,
                    ap_virtual: found.is_virtual,
                    internet_interface: None,
                }
            }
            (None, Some(ap)) => {
                self.require_mode(ap, InterfaceMode::Ap, "AP")?;
                let found = self.find_interface(InterfaceMode::Monitor, &[ap])?;
                InterfaceAssignment {
                    monitor_interface: found.interface_name,
                    monitor_virtual: found.is_virtual,
                    ap_interface: ap.to_string(),
                    ap_virtual: false,
                    internet_interface: None,
                }
            }
            (None, None) => {
                let monitor = self.find_interface(InterfaceMode::Monitor, &[])?;
                let ap =
                    self.find_interface(InterfaceMode::Ap, &[monitor.interface_name.as_str()])?;
                InterfaceAssignment {
                    monitor_interface: monitor.interface_name,
                    monitor_virtual: monitor.is_virtual,
                    ap_interface: ap.interface_name,
                    ap_virtual: ap.is_virtual,
                    internet_interface: None,
                }
            }
        };

        if let Some(internet) = internet_interface {
            if !self.ops.interface_exists(internet) {
                return Err(Failure::policy(format!(
                    "Internet interface {} is invalid",
                    internet
                )));
            }
            assignment.internet_interface = Some(internet.to_string());
        }

        if assignment.monitor_virtual || assignment.ap_virtual {
            warn!(
                target: LOG_TARGET,
                monitor = %assignment.monitor_interface,
                ap = %assignment.ap_interface,
                "Monitor and AP roles share one radio"
            );
        }
        Ok(assignment)
    }

    fn require_mode(&self, interface_name: &str, mode: InterfaceMode, role: &str) -> Outcome<()> {
        if self.has_mode(interface_name, mode) {
            Ok(())
        } else {
            Err(Failure::policy(format!(
                "{} interface {} is invalid",
                role, interface_name
            )))
        }
    }

    /// Read mode, power state, channel and MAC of a wireless interface.
    pub fn interface_status(&self, interface_name: &str) -> Outcome<InterfaceStatus> {
        let card = self.valid_card(interface_name, None)?;
        let read = |what: &str, e: crate::error::WirelessError| {
            debug!(
                target: LOG_TARGET,
                interface = interface_name,
                error = %e,
                "Could not read {} of {}",
                what,
                interface_name
            );
        };

        Ok(InterfaceStatus {
            interface: interface_name.to_string(),
            phy: card.phy,
            ifindex: card.ifindex,
            mode: self.ops.mode(&card).map_err(|e| read("mode", e)).ok(),
            is_up: self.ops.is_up(&card).map_err(|e| read("power state", e)).ok(),
            channel: self
                .ops
                .channel(&card)
                .map_err(|e| read("channel", e))
                .ok()
                .flatten(),
            mac: self.ops.mac(&card).map_err(|e| read("MAC", e)).ok(),
            supported_modes: self
                .ops
                .supported_modes(&card)
                .map_err(|e| read("supported modes", e))
                .unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ops::mock::MockWirelessOps;
    use InterfaceMode::{Ap, Managed, Monitor};

    fn controller(ops: &MockWirelessOps) -> InterfaceController {
        InterfaceController::new(Arc::new(ops.clone()))
    }

    #[test]
    fn test_card_resolution_failures() {
        let ops = MockWirelessOps::new();
        ops.add_wired("eth0");
        let ctl = controller(&ops);

        let err = ctl.get_interface_card("wlan9").unwrap_err();
        assert_eq!(err.kind, FailureKind::Resolution);
        assert!(err.message.contains("wlan9"));

        let err = ctl.get_interface_card("eth0").unwrap_err();
        assert_eq!(err.kind, FailureKind::Resolution);
    }

    #[test]
    fn test_card_lookup_driver_error_is_not_resolution() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        ops.fail("card", "wlan0");
        let ctl = controller(&ops);

        let err = ctl.get_interface_card("wlan0").unwrap_err();
        assert_eq!(err.kind, FailureKind::Driver);
    }

    #[test]
    fn test_turn_interface_uses_supplied_card() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        let ctl = controller(&ops);
        let card = ctl.get_interface_card("wlan0").unwrap();

        ctl.turn_interface("wlan0", false, Some(&card)).unwrap();
        assert!(!ops.interface("wlan0").unwrap().up);
        assert_eq!(ops.calls(), vec!["card:wlan0", "down:wlan0"]);
    }

    #[test]
    fn test_turn_interface_rejects_invalid_card() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        ops.invalidate_card("wlan0");
        let ctl = controller(&ops);

        let err = ctl.turn_interface("wlan0", true, None).unwrap_err();
        assert_eq!(err.kind, FailureKind::Validation);
        assert!(!ops.calls().contains(&"up:wlan0".to_string()));
    }

    #[test]
    fn test_turn_interface_driver_failure_is_not_retried() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        ops.fail("up", "wlan0");
        let ctl = controller(&ops);

        let err = ctl.turn_interface("wlan0", true, None).unwrap_err();
        assert_eq!(err.kind, FailureKind::Driver);
        let ups = ops.calls_for("wlan0").iter().filter(|c| *c == "up:wlan0").count();
        assert_eq!(ups, 1);
    }

    #[test]
    fn test_set_mode_brackets_with_power() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        let ctl = controller(&ops);

        ctl.set_interface_mode("wlan0", Monitor, None).unwrap();
        assert_eq!(
            ops.calls(),
            vec!["card:wlan0", "down:wlan0", "set_mode:wlan0", "up:wlan0"]
        );
        let iface = ops.interface("wlan0").unwrap();
        assert_eq!(iface.mode, Monitor);
        assert!(iface.up);
    }

    #[test]
    fn test_set_mode_skipped_when_power_down_fails() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        ops.fail("down", "wlan0");
        let ctl = controller(&ops);

        assert!(ctl.set_interface_mode("wlan0", Monitor, None).is_err());
        assert!(!ops.calls().contains(&"set_mode:wlan0".to_string()));
        assert_eq!(ops.interface("wlan0").unwrap().mode, Managed);
    }

    #[test]
    fn test_failed_mode_change_leaves_device_down() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        ops.fail("set_mode", "wlan0");
        let ctl = controller(&ops);

        let err = ctl.set_interface_mode("wlan0", Monitor, None).unwrap_err();
        assert_eq!(err.kind, FailureKind::Driver);
        assert!(!ops.calls().contains(&"up:wlan0".to_string()));
        assert!(!ops.interface("wlan0").unwrap().up);
    }

    #[test]
    fn test_set_mode_fails_when_power_up_fails() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        ops.fail("up", "wlan0");
        let ctl = controller(&ops);

        assert!(ctl.set_interface_mode("wlan0", Monitor, None).is_err());
        assert_eq!(ops.interface("wlan0").unwrap().mode, Monitor);
    }

    #[test]
    fn test_set_channel() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        let ctl = controller(&ops);

        ctl.set_interface_channel("wlan0", 11, None).unwrap();
        assert_eq!(ops.interface("wlan0").unwrap().channel, Some(11));

        ops.fail("set_channel", "wlan0");
        let err = ctl.set_interface_channel("wlan0", 200, None).unwrap_err();
        assert_eq!(err.kind, FailureKind::Driver);
        assert!(ctl.set_interface_channel("wlan7", 1, None).is_err());
    }

    #[test]
    fn test_random_mac_has_fixed_prefix_and_forces_managed() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor, Managed]);
        let ctl = controller(&ops);
        ctl.set_interface_mode("wlan0", Monitor, None).unwrap();
        let before = ops.interface("wlan0").unwrap().mac;

        let change = ctl.set_interface_mac("wlan0", MacRequest::Random);
        assert!(change.succeeded());
        let new_mac = change.new_mac.unwrap();
        assert_eq!(new_mac.oui(), [0, 0, 0]);
        assert!(new_mac.to_string().starts_with("00:00:00:"));
        assert_eq!(change.old_mac, Some(before));

        let iface = ops.interface("wlan0").unwrap();
        assert_eq!(iface.mac, new_mac);
        assert_eq!(iface.mode, Managed);
    }

    #[test]
    fn test_explicit_mac_bypasses_randomization() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Managed]);
        let ctl = controller(&ops);
        let wanted: MacAddress = "de:ad:be:ef:00:01".parse().unwrap();

        let change = ctl.set_interface_mac("wlan0", MacRequest::Explicit(wanted));
        assert!(change.succeeded());
        assert_eq!(change.new_mac, Some(wanted));
        assert_eq!(ops.interface("wlan0").unwrap().mac, wanted);
    }

    #[test]
    fn test_mac_failure_still_reports_attempted_mac() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Managed]);
        ops.fail("set_mac", "wlan0");
        let ctl = controller(&ops);
        let wanted: MacAddress = "00:00:00:01:02:03".parse().unwrap();

        let change = ctl.set_interface_mac("wlan0", MacRequest::Explicit(wanted));
        assert!(!change.succeeded());
        assert_eq!(change.new_mac, Some(wanted));
        assert!(change.old_mac.is_some());
        assert_eq!(change.result.unwrap_err().kind, FailureKind::Driver);
    }

    #[test]
    fn test_mac_not_written_when_managed_switch_fails() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Managed]);
        ops.fail("set_mode", "wlan0");
        let ctl = controller(&ops);

        let change = ctl.set_interface_mac("wlan0", MacRequest::Random);
        assert!(!change.succeeded());
        assert!(change.new_mac.is_some());
        assert!(change.old_mac.is_none());
        assert!(!ops.calls().contains(&"set_mac:wlan0".to_string()));
    }

    #[test]
    fn test_has_mode() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Ap]);
        ops.add_wireless("wlan1", &[Ap]);
        ops.fail("modes", "wlan1");
        let ctl = controller(&ops);

        assert!(ctl.has_mode("wlan0", Ap));
        assert!(!ctl.has_mode("wlan0", Monitor));
        assert!(!ctl.has_mode("DoesNotExist", Ap));
        assert!(!ctl.has_mode("wlan1", Ap));
    }

    #[test]
    fn test_find_prefers_non_excluded() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("A", &[Ap, Monitor]);
        ops.add_wireless("B", &[Monitor]);
        let ctl = controller(&ops);

        let found = ctl.find_interface(Monitor, &["A"]).unwrap();
        assert_eq!(found.interface_name, "B");
        assert!(!found.is_virtual);

        let found = ctl.find_interface(Ap, &["A"]).unwrap();
        assert_eq!(found.interface_name, "A");
        assert!(found.is_virtual);
    }

    #[test]
    fn test_find_uses_enumeration_order() {
        let ops = MockWirelessOps::new();
        ops.add_wired("eth0");
        ops.add_wireless("wlan1", &[Monitor]);
        ops.add_wireless("wlan0", &[Monitor]);
        let ctl = controller(&ops);

        let found = ctl.find_interface(Monitor, &[]).unwrap();
        assert_eq!(found.interface_name, "wlan1");
    }

    #[test]
    fn test_find_fails_without_capable_interface() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Managed]);
        let ctl = controller(&ops);

        let err = ctl.find_interface(Ap, &[]).unwrap_err();
        assert_eq!(err.kind, FailureKind::Policy);
        assert_eq!(err.message, "Failed to find an interface with AP mode");

        ops.fail("list", "*");
        let err = ctl.find_interface(Ap, &[]).unwrap_err();
        assert_eq!(err.kind, FailureKind::Driver);
    }

    #[test]
    fn test_setup_rejects_same_interface_before_checking_modes() {
        let ops = MockWirelessOps::new();
        let ctl = controller(&ops);

        let err = ctl
            .setup_interfaces(Some("wlan0"), Some("wlan0"), None)
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Policy);
        assert_eq!(
            err.message,
            "Monitor interface and AP interface can not be the same"
        );
        assert!(ops.calls().is_empty());
    }

    #[test]
    fn test_setup_both_given_validates_each() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        ops.add_wireless("wlan1", &[Ap]);
        let ctl = controller(&ops);

        let assignment = ctl
            .setup_interfaces(Some("wlan0"), Some("wlan1"), None)
            .unwrap();
        assert_eq!(assignment.monitor_interface, "wlan0");
        assert_eq!(assignment.ap_interface, "wlan1");
        assert!(!assignment.monitor_virtual && !assignment.ap_virtual);
        assert!(!ops.calls().contains(&"list:*".to_string()));

        let err = ctl
            .setup_interfaces(Some("wlan1"), Some("wlan0"), None)
            .unwrap_err();
        assert_eq!(err.message, "Monitor interface wlan1 is invalid");

        let err = ctl
            .setup_interfaces(Some("wlan0"), Some("wlan2"), None)
            .unwrap_err();
        assert_eq!(err.message, "AP interface wlan2 is invalid");
    }

    #[test]
    fn test_setup_monitor_only_searches_ap() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor, Ap]);
        let ctl = controller(&ops);

        let assignment = ctl.setup_interfaces(Some("wlan0"), None, None).unwrap();
        assert_eq!(assignment.ap_interface, "wlan0");
        assert!(assignment.ap_virtual);

        let err = ctl.setup_interfaces(Some("wlan5"), None, None).unwrap_err();
        assert_eq!(err.message, "Monitor interface wlan5 is invalid");
    }

    #[test]
    fn test_setup_monitor_only_without_ap_capable() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        let ctl = controller(&ops);

        let err = ctl.setup_interfaces(Some("wlan0"), None, None).unwrap_err();
        assert_eq!(err.message, "Failed to find an interface with AP mode");
    }

    #[test]
    fn test_setup_ap_only_reports_ap_name() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        ops.add_wireless("wlan1", &[Ap]);
        let ctl = controller(&ops);

        let assignment = ctl.setup_interfaces(None, Some("wlan1"), None).unwrap();
        assert_eq!(assignment.monitor_interface, "wlan0");
        assert!(!assignment.monitor_virtual);

        let err = ctl.setup_interfaces(None, Some("wlan0"), None).unwrap_err();
        assert_eq!(err.message, "AP interface wlan0 is invalid");
    }

    #[test]
    fn test_setup_auto_selects_distinct_radios() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor, Ap]);
        ops.add_wireless("wlan1", &[Ap]);
        let ctl = controller(&ops);

        let assignment = ctl.setup_interfaces(None, None, None).unwrap();
        assert_eq!(assignment.monitor_interface, "wlan0");
        assert_eq!(assignment.ap_interface, "wlan1");
        assert!(!assignment.monitor_virtual && !assignment.ap_virtual);
    }

    #[test]
    fn test_setup_auto_without_monitor_names_monitor() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Ap, Managed]);
        let ctl = controller(&ops);

        let err = ctl.setup_interfaces(None, None, None).unwrap_err();
        assert_eq!(err.kind, FailureKind::Policy);
        assert!(err.message.contains("monitor"));
        assert_eq!(err.message, "Failed to find an interface with monitor mode");
    }

    #[test]
    fn test_setup_internet_interface() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor]);
        ops.add_wireless("wlan1", &[Ap]);
        ops.add_wired("eth0");
        let ctl = controller(&ops);

        let assignment = ctl.setup_interfaces(None, None, Some("eth0")).unwrap();
        assert_eq!(assignment.internet_interface.as_deref(), Some("eth0"));

        let err = ctl
            .setup_interfaces(None, None, Some("ppp9"))
            .unwrap_err();
        assert_eq!(err.message, "Internet interface ppp9 is invalid");
    }

    #[test]
    fn test_interface_status_tolerates_read_failures() {
        let ops = MockWirelessOps::new();
        ops.add_wireless("wlan0", &[Monitor, Managed]);
        ops.fail("get_channel", "wlan0");
        let ctl = controller(&ops);

        let status = ctl.interface_status("wlan0").unwrap();
        assert_eq!(status.mode, Some(Managed));
        assert_eq!(status.is_up, Some(true));
        assert_eq!(status.channel, None);
        assert!(status.mac.is_some());
        assert_eq!(status.supported_modes, vec![Monitor, Managed]);

        assert!(ctl.interface_status("nope0").is_err());
    }

    mod logging {
        use super::*;
        use std::sync::Mutex;
        use tracing::{Event, Level, Subscriber};
        use tracing_subscriber::layer::{Context, SubscriberExt};
        use tracing_subscriber::Layer;

        #[derive(Clone, Default)]
        struct EventLog {
            events: Arc<Mutex<Vec<(String, Level)>>>,
        }

        impl<S: Subscriber> Layer<S> for EventLog {
            fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
                let meta = event.metadata();
                self.events
                    .lock()
                    .unwrap()
                    .push((meta.target().to_string(), *meta.level()));
            }
        }

        impl EventLog {
            fn capture<F: FnOnce()>(&self, f: F) {
                let subscriber = tracing_subscriber::registry().with(self.clone());
                tracing::subscriber::with_default(subscriber, f);
            }

            /// Warnings and errors recorded under the `wifi` target.
            fn failures(&self) -> usize {
                self.events
                    .lock()
                    .unwrap()
                    .iter()
                    .filter(|(target, level)| target == LOG_TARGET && *level <= Level::WARN)
                    .count()
            }

            fn total(&self) -> usize {
                self.events.lock().unwrap().len()
            }
        }

        #[test]
        fn test_driver_failure_logs_one_event() {
            let ops = MockWirelessOps::new();
            ops.add_wireless("wlan0", &[Monitor]);
            ops.fail("set_mode", "wlan0");
            let ctl = controller(&ops);
            let log = EventLog::default();

            log.capture(|| {
                assert!(ctl.set_interface_mode("wlan0", Monitor, None).is_err());
            });
            assert_eq!(log.failures(), 1);
        }

        #[test]
        fn test_resolution_and_validation_failures_are_logged() {
            let ops = MockWirelessOps::new();
            ops.add_wireless("wlan0", &[Monitor]);
            ops.invalidate_card("wlan0");
            let ctl = controller(&ops);

            let log = EventLog::default();
            log.capture(|| {
                assert!(ctl.get_interface_card("wlan9").is_err());
            });
            assert_eq!(log.failures(), 1);

            let log = EventLog::default();
            log.capture(|| {
                assert!(ctl.turn_interface("wlan0", true, None).is_err());
            });
            assert_eq!(log.failures(), 1);
        }

        #[test]
        fn test_policy_failures_are_silent() {
            let ops = MockWirelessOps::new();
            ops.add_wireless("wlan0", &[Ap]);
            let ctl = controller(&ops);
            let log = EventLog::default();

            log.capture(|| {
                assert!(ctl
                    .setup_interfaces(Some("wlan0"), Some("wlan0"), None)
                    .is_err());
            });
            assert_eq!(log.total(), 0);

            let log = EventLog::default();
            log.capture(|| {
                assert!(ctl.setup_interfaces(None, None, None).is_err());
            });
            assert_eq!(log.failures(), 0);
        }
    }
}
