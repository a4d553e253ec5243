use anyhow::{anyhow, Result};
use serde_json::{json, Value};
use wifaces::{InterfaceController, MacRequest};

use crate::cli::{Commands, PowerState};

/// Run one subcommand, returning the human message and JSON data.
pub fn dispatch_command(controller: &InterfaceController, command: Commands) -> Result<(String, Value)> {
    match command {
        Commands::List => {
            let names = controller.list_wireless_interfaces()?;
            Ok((
                format!("{} wireless interface(s)", names.len()),
                json!({ "interfaces": names }),
            ))
        }
        Commands::Status(args) => {
            let status = controller.interface_status(&args.interface)?;
            Ok((
                format!("Status of {}", args.interface),
                serde_json::to_value(status)?,
            ))
        }
        Commands::Power(args) => {
            let on = args.state == PowerState::On;
            controller.turn_interface(&args.interface, on, None)?;
            Ok((
                format!("{} is {}", args.interface, if on { "up" } else { "down" }),
                json!({ "interface": args.interface, "up": on }),
            ))
        }
        Commands::Mode(args) => {
            controller.set_interface_mode(&args.interface, args.mode, None)?;
            Ok((
                format!("{} set to {} mode", args.interface, args.mode),
                json!({ "interface": args.interface, "mode": args.mode }),
            ))
        }
        Commands::Channel(args) => {
            controller.set_interface_channel(&args.interface, args.channel, None)?;
            Ok((
                format!("{} tuned to channel {}", args.interface, args.channel),
                json!({ "interface": args.interface, "channel": args.channel }),
            ))
        }
        Commands::Mac(args) => {
            let request = args
                .address
                .map(MacRequest::Explicit)
                .unwrap_or(MacRequest::Random);
            let change = controller.set_interface_mac(&args.interface, request);
            if let Err(failure) = change.result {
                let attempted = change
                    .new_mac
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "no address".to_string());
                return Err(anyhow!(failure).context(format!(
                    "MAC change on {} to {} failed",
                    args.interface, attempted
                )));
            }
            Ok((
                format!("MAC address of {} changed", args.interface),
                json!({
                    "interface": args.interface,
                    "old_mac": change.old_mac,
                    "new_mac": change.new_mac,
                }),
            ))
        }
        Commands::Find(args) => {
            let exclude: Vec<&str> = args.exclude.iter().map(String::as_str).collect();
            let found = controller.find_interface(args.mode, &exclude)?;
            Ok((
                format!("{} supports {} mode", found.interface_name, args.mode),
                serde_json::to_value(found)?,
            ))
        }
        Commands::Setup(args) => {
            let assignment = controller.setup_interfaces(
                args.monitor.as_deref(),
                args.ap.as_deref(),
                args.internet.as_deref(),
            )?;
            Ok((
                format!(
                    "monitor={} ap={}",
                    assignment.monitor_interface, assignment.ap_interface
                ),
                serde_json::to_value(assignment)?,
            ))
        }
    }
}
