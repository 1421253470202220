use std::env;
use log::info;
use crate::config::{load_config, Config};
use crate::errors::UnrecoverableError;
use crate::logging::setup_logger;

const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// Loads configuration and sets up logging
///
/// The configuration file is given by the CONFIG_FILE environment variable and defaults
/// to config.toml in the working directory.
///
/// # Arguments
///
/// * 'mode' - the mode the binary runs in, used as log file name
pub fn config(mode: &str) -> Result<Config, UnrecoverableError> {
    let config_path = env::var("CONFIG_FILE").unwrap_or(DEFAULT_CONFIG_FILE.to_string());
    let config = load_config(&config_path)?;

    setup_logger(&config.general.log_path, mode, config.general.log_level, config.general.log_to_stdout)?;

    // Print version
    info!("wbgtwatch version: {}", env!("CARGO_PKG_VERSION"));
    info!("running {} for {} ({})", mode, config.station.location, config.station.point_code);

    Ok(config)
}
