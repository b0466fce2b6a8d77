//! # Gridline
//!
//! Process entry for the grid game server. [`init`] reads the command line
//! and `config.toml`, installs logging, and hands over to [`Application`].
//!
//! ```bash
//! gridline                                  # 127.0.0.1:5000, config.toml
//! gridline -c prod.toml --json-logs
//! gridline --bind 0.0.0.0:5000 -l debug
//! ```
//!
//! A missing config file is created with default values. The first SIGINT
//! or SIGTERM drains the server; a second one exits at once.

use tracing::error;

mod app;
mod cli;
mod config;
mod logging;
mod signals;

pub use app::Application;
pub use cli::CliArgs;
pub use config::{AppConfig, LoggingSettings, ServerSettings};

pub async fn init() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let mut config = match AppConfig::load_from_file(&args.config_path).await {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "❌ Failed to load configuration from {}: {e}",
                args.config_path.display()
            );
            std::process::exit(1);
        }
    };
    args.apply_overrides(&mut config);

    if let Err(e) = logging::setup_logging(&config.logging, args.json_logs) {
        eprintln!("❌ Failed to setup logging: {e}");
        std::process::exit(1);
    }

    match Application::new(config) {
        Ok(app) => {
            if let Err(e) = app.run().await {
                error!("❌ Application error: {:?}", e);
                std::process::exit(1);
            }
        }
        Err(e) => {
            error!("❌ Failed to start application: {e:?}");
            std::process::exit(1);
        }
    }

    Ok(())
}
