//! Tracing subscriber setup and the startup banner.

use crate::config::LoggingSettings;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Installs the global subscriber.
///
/// `RUST_LOG` wins over `config.level` when set. JSON output is chosen when
/// the config file or the `--json-logs` flag (`force_json`) asks for it.
pub fn setup_logging(
    config: &LoggingSettings,
    force_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));
    let subscriber = tracing_subscriber::registry().with(filter);

    if force_json || config.json_format {
        subscriber
            .with(fmt::layer().json().with_current_span(false).with_thread_ids(true))
            .try_init()?;
    } else {
        subscriber
            .with(fmt::layer().with_target(false).with_thread_ids(true))
            .try_init()?;
    }

    info!("🔧 Logging initialized with level: {}", config.level);
    Ok(())
}

pub fn display_banner() {
    info!("╔══════════════════════════════════════════╗");
    info!("║               # GRIDLINE #               ║");
    info!("║   turn-based grid game server v{:<8}  ║", env!("CARGO_PKG_VERSION"));
    info!("║                                          ║");
    info!("║  🎲 2-13 players per game                ║");
    info!("║  🧩 Many concurrent games                ║");
    info!("║  📜 Plain-text line protocol             ║");
    info!("╚══════════════════════════════════════════╝");
}
