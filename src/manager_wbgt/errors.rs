use thiserror::Error;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("FetchError::Network: {0}")]
    Network(String),
    #[error("FetchError::Status: http status {0}")]
    Status(u16),
}
impl From<ureq::Error> for FetchError {
    fn from(e: ureq::Error) -> FetchError {
        match e {
            ureq::Error::StatusCode(code) => FetchError::Status(code),
            other => FetchError::Network(other.to_string()),
        }
    }
}
