mod cli;
mod commands;
mod logging;

use anyhow::Result;
use clap::Parser;
use serde_json::{json, Value};
use wifaces::InterfaceController;

use crate::cli::{Cli, Commands, OutputFormat};
use crate::commands::dispatch_command;
use crate::logging::LoggingConfig;

fn main() {
    let cli = Cli::parse();
    let format = if cli.json {
        OutputFormat::Json
    } else {
        cli.output_format
    };

    let mut log_cfg = LoggingConfig::from_env();
    if let Some(level) = cli.log_level.clone() {
        log_cfg.enabled = true;
        log_cfg.level = level;
    }
    let guards = match logging::init(&log_cfg) {
        Ok(guards) => Some(guards),
        Err(err) => {
            eprintln!("Logging disabled: {}", err);
            None
        }
    };

    let result = run(cli.command, format);
    drop(guards);
    if let Err(err) = result {
        emit_error(format, &err);
        std::process::exit(1);
    }
}

fn run(command: Commands, format: OutputFormat) -> Result<()> {
    let controller = controller()?;
    let (message, data) = dispatch_command(&controller, command)?;
    emit_payload(format, "ok", message, data)
}

#[cfg(target_os = "linux")]
fn controller() -> Result<InterfaceController> {
    Ok(InterfaceController::native(wifaces::BackendConfig::from_env()))
}

#[cfg(not(target_os = "linux"))]
fn controller() -> Result<InterfaceController> {
    anyhow::bail!("wifacectl needs the Linux nl80211 backend")
}

fn error_payload(err: &anyhow::Error) -> Value {
    let details: Vec<String> = err.chain().map(|cause| cause.to_string()).collect();
    json!({
        "status": "error",
        "message": err.to_string(),
        "details": details,
        "data": Value::Null,
    })
}

fn emit_error(format: OutputFormat, err: &anyhow::Error) {
    match format {
        OutputFormat::Json => println!("{}", error_payload(err)),
        OutputFormat::Text => {
            eprintln!("Error: {}", err);
            for detail in err.chain().skip(1) {
                eprintln!("  -> {}", detail);
            }
        }
    }
}

fn emit_payload(format: OutputFormat, status: &str, message: String, data: Value) -> Result<()> {
    let payload = json!({
        "status": status,
        "message": message,
        "data": data,
    });

    match format {
        OutputFormat::Json => println!("{}", payload),
        OutputFormat::Text => {
            println!("{}", payload["message"].as_str().unwrap_or_default());
            if !payload["data"].is_null() {
                let pretty = serde_json::to_string_pretty(&payload["data"])?;
                println!("{pretty}");
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn test_error_payload_lists_causes() {
        let err = Err::<(), _>(anyhow::anyhow!("Card for wlan0 is not valid"))
            .context("setting mode")
            .unwrap_err();
        let payload = error_payload(&err);
        assert_eq!(payload["status"], "error");
        assert_eq!(payload["message"], "setting mode");
        assert_eq!(
            payload["details"],
            json!(["setting mode", "Card for wlan0 is not valid"])
        );
        assert!(payload["data"].is_null());
    }
}
