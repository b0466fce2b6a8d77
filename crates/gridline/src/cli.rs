//! Command-line interface handling for the gridline server.
//!
//! This module provides command-line argument parsing using the `clap`
//! builder API.

use crate::config::AppConfig;
use clap::{Arg, ArgMatches, Command};
use std::ffi::OsString;
use std::path::PathBuf;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Command-line arguments for the server.
///
/// Every option except `--config` overrides the matching value from the
/// configuration file.
#[derive(Debug, Clone)]
pub struct CliArgs {
    pub config_path: PathBuf,
    pub bind_address: Option<String>,
    pub log_level: Option<String>,
    pub json_logs: bool,
}

impl CliArgs {
    /// Parses the process arguments, exiting with usage on error.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    /// Parses an explicit argument list; the first item is the program name.
    pub fn parse_from<I, T>(args: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        Self::from_matches(&command().get_matches_from(args))
    }

    fn from_matches(matches: &ArgMatches) -> Self {
        Self {
            config_path: matches
                .get_one::<String>("config")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH)),
            bind_address: matches.get_one::<String>("bind").cloned(),
            log_level: matches.get_one::<String>("log-level").cloned(),
            json_logs: matches.get_flag("json-logs"),
        }
    }

    /// Writes the command-line overrides into `config`.
    pub fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(bind_address) = &self.bind_address {
            config.server.bind_address = bind_address.clone();
        }
        if let Some(log_level) = &self.log_level {
            config.logging.level = log_level.clone();
        }
        if self.json_logs {
            config.logging.json_format = true;
        }
    }
}

fn command() -> Command {
    Command::new("gridline")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Multi-session turn-based grid game server")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value(DEFAULT_CONFIG_PATH),
        )
        .arg(
            Arg::new("bind")
                .short('b')
                .long("bind")
                .value_name("ADDRESS")
                .help("Bind address (e.g., 127.0.0.1:5000)"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (trace, debug, info, warn, error)"),
        )
        .arg(
            Arg::new("json-logs")
                .long("json-logs")
                .help("Output logs in JSON format")
                .action(clap::ArgAction::SetTrue),
        )
}
