use clap::{Args, Parser, Subcommand, ValueEnum};
use wifaces::{InterfaceMode, MacAddress};

#[derive(Parser, Debug)]
#[command(
    name = "wifacectl",
    author,
    version,
    about = "Inspect and configure wireless interfaces"
)]
pub struct Cli {
    /// Output format for command responses
    #[arg(
        long = "output",
        value_enum,
        default_value_t = OutputFormat::Text,
        global = true
    )]
    pub output_format: OutputFormat,

    /// Shorthand for --output json
    #[arg(long, global = true)]
    pub json: bool,

    /// Log filter (e.g. `debug`, `wifi=trace`); overrides WIFACES_LOG_LEVEL
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List wireless interfaces
    List,
    /// Show mode, power state, channel and MAC of an interface
    Status(InterfaceArgs),
    /// Bring an interface up or down
    Power(PowerArgs),
    /// Switch an interface to another mode
    Mode(ModeArgs),
    /// Tune an interface to a channel
    Channel(ChannelArgs),
    /// Set a random or explicit MAC address
    Mac(MacArgs),
    /// Find an interface supporting a mode
    Find(FindArgs),
    /// Select monitor and AP interfaces
    Setup(SetupArgs),
}

#[derive(Args, Debug)]
pub struct InterfaceArgs {
    pub interface: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum PowerState {
    On,
    Off,
}

#[derive(Args, Debug)]
pub struct PowerArgs {
    pub interface: String,
    #[arg(value_enum)]
    pub state: PowerState,
}

#[derive(Args, Debug)]
pub struct ModeArgs {
    pub interface: String,
    /// managed, monitor, AP, IBSS, mesh, ...
    pub mode: InterfaceMode,
}

#[derive(Args, Debug)]
pub struct ChannelArgs {
    pub interface: String,
    pub channel: u32,
}

#[derive(Args, Debug)]
pub struct MacArgs {
    pub interface: String,
    /// Address to write; a random one is generated when omitted
    #[arg(long)]
    pub address: Option<MacAddress>,
}

#[derive(Args, Debug)]
pub struct FindArgs {
    pub mode: InterfaceMode,
    /// Interfaces to avoid unless nothing else qualifies (repeatable)
    #[arg(long = "exclude")]
    pub exclude: Vec<String>,
}

#[derive(Args, Debug)]
pub struct SetupArgs {
    #[arg(long)]
    pub monitor: Option<String>,
    #[arg(long)]
    pub ap: Option<String>,
    #[arg(long)]
    pub internet: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mode_command() {
        let cli = Cli::try_parse_from(["wifacectl", "mode", "wlan0", "monitor"]).unwrap();
        match cli.command {
            Commands::Mode(args) => {
                assert_eq!(args.interface, "wlan0");
                assert_eq!(args.mode, InterfaceMode::Monitor);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert_eq!(cli.output_format, OutputFormat::Text);
    }

    #[test]
    fn test_parse_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["wifacectl", "list", "--json", "--log-level", "debug"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.log_level.as_deref(), Some("debug"));
    }

    #[test]
    fn test_parse_find_with_excludes() {
        let cli = Cli::try_parse_from([
            "wifacectl", "find", "AP", "--exclude", "wlan0", "--exclude", "wlan1",
        ])
        .unwrap();
        match cli.command {
            Commands::Find(args) => {
                assert_eq!(args.mode, InterfaceMode::Ap);
                assert_eq!(args.exclude, vec!["wlan0", "wlan1"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_rejects_bad_values() {
        assert!(Cli::try_parse_from(["wifacectl", "mode", "wlan0", "sniffer"]).is_err());
        assert!(Cli::try_parse_from(["wifacectl", "mac", "wlan0", "--address", "zz"]).is_err());
        assert!(Cli::try_parse_from(["wifacectl", "power", "wlan0", "maybe"]).is_err());
    }
}
