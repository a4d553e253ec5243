use std::env;
use std::path::PathBuf;

use anyhow::Result;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::{LevelFilter, Targets};
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

use wifaces::LOG_TARGET;

const WIFI_LOG_FILE: &str = "wifi.log";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub level: String,
    /// Directory for the daily-rolling `wifi.log`; stderr only when unset.
    pub log_dir: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "warn".to_string(),
            log_dir: None,
        }
    }
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let enabled = env::var("WIFACES_LOG")
            .map(|v| !(v == "0" || v.eq_ignore_ascii_case("false") || v.eq_ignore_ascii_case("off")))
            .unwrap_or(defaults.enabled);
        let level = env::var("WIFACES_LOG_LEVEL")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(defaults.level);
        let log_dir = env::var("WIFACES_LOG_DIR")
            .ok()
            .filter(|v| !v.trim().is_empty())
            .map(PathBuf::from);

        Self {
            enabled,
            level,
            log_dir,
        }
    }
}

pub struct LoggingGuards {
    _file_guard: Option<WorkerGuard>,
}

pub fn init(cfg: &LoggingConfig) -> Result<LoggingGuards> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .compact();

    let mut warn_msg: Option<String> = None;
    let mut file_guard = None;
    let file_layer = match (&cfg.log_dir, cfg.enabled) {
        (Some(dir), true) => match std::fs::create_dir_all(dir) {
            Ok(()) => {
                let appender = tracing_appender::rolling::daily(dir, WIFI_LOG_FILE);
                let (writer, guard) = tracing_appender::non_blocking(appender);
                file_guard = Some(guard);
                Some(
                    fmt::layer()
                        .with_target(true)
                        .with_level(true)
                        .with_thread_ids(true)
                        .with_line_number(true)
                        .with_ansi(false)
                        .compact()
                        .with_writer(writer)
                        .with_filter(Targets::new().with_target(LOG_TARGET, LevelFilter::TRACE)),
                )
            }
            Err(err) => {
                warn_msg = Some(format!(
                    "File logging disabled ({}): {}",
                    dir.display(),
                    err
                ));
                None
            }
        },
        _ => None,
    };

    tracing_subscriber::registry()
        .with(build_filter(cfg))
        .with(stderr_layer)
        .with(file_layer)
        .try_init()?;

    if let Some(message) = warn_msg {
        tracing::warn!("{message}");
    }

    Ok(LoggingGuards {
        _file_guard: file_guard,
    })
}

fn build_filter(cfg: &LoggingConfig) -> EnvFilter {
    if !cfg.enabled {
        return EnvFilter::new("off");
    }
    EnvFilter::try_new(cfg.level.clone()).unwrap_or_else(|_| EnvFilter::new("warn"))
}
