use thiserror::Error;
use crate::errors::NoDataError;
use crate::parsers::ParseError;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("ScrapeError::Config: {0}")]
    Config(String),
    #[error("ScrapeError::Proxy: {0}")]
    Proxy(String),
    #[error("ScrapeError::Document: {0}")]
    Document(#[from] ParseError),
    #[error("ScrapeError::NoData: {0}")]
    NoData(#[from] NoDataError),
}
impl From<ureq::Error> for ScrapeError {
    fn from(e: ureq::Error) -> ScrapeError {
        ScrapeError::Proxy(format!("http request error: {}", e))
    }
}
