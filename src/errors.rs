use std::fmt;
use std::fmt::Formatter;
use thiserror::Error;
use crate::manager_scrape::errors::ScrapeError;
use crate::manager_wbgt::errors::FetchError;
use crate::parsers::ParseError;

/// Error depicting errors that occur while loading configuration or credentials
///
#[derive(Debug)]
pub struct ConfigError(pub String);

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ConfigError: {}", self.0)
    }
}
impl From<&str> for ConfigError {
    fn from(e: &str) -> Self { ConfigError(e.to_string()) }
}
impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self { ConfigError(e.to_string()) }
}
impl From<toml::de::Error> for ConfigError {
    fn from(e: toml::de::Error) -> Self { ConfigError(e.to_string()) }
}

/// Error depicting errors that occur while reading or writing files in the data directory
///
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("StorageError::File: {0}")]
    File(#[from] std::io::Error),
    #[error("StorageError::Document: {0}")]
    Document(#[from] serde_json::Error),
}

/// Error returned when no source yields a WBGT value
///
#[derive(Error, Debug)]
#[error("NoDataError: {0}")]
pub struct NoDataError(pub String);

/// Errors that end a collection run. The caller substitutes a degraded snapshot for all of them.
///
#[derive(Error, Debug)]
pub enum CollectError {
    #[error("{0}")]
    NoData(#[from] NoDataError),
    #[error("{0}")]
    Fetch(#[from] FetchError),
    #[error("{0}")]
    Parse(#[from] ParseError),
    #[error("{0}")]
    Scrape(#[from] ScrapeError),
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Storage(#[from] StorageError),
}
impl From<ConfigError> for CollectError {
    fn from(e: ConfigError) -> Self { CollectError::Config(e) }
}

/// Error that can't be recovered from, the process exits after logging it
///
#[derive(Error, Debug)]
#[error("UnrecoverableError: {0}")]
pub struct UnrecoverableError(pub String);

impl From<ConfigError> for UnrecoverableError {
    fn from(e: ConfigError) -> Self { UnrecoverableError(e.to_string()) }
}
impl From<crate::logging::LoggingError> for UnrecoverableError {
    fn from(e: crate::logging::LoggingError) -> Self { UnrecoverableError(e.to_string()) }
}
