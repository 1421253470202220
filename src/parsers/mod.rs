pub mod csv_files;
pub mod html_page;

use thiserror::Error;

/// Errors raised when a downloaded document doesn't have the expected shape
///
#[derive(Error, Debug)]
pub enum ParseError {
    #[error("ParseError::Csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("ParseError::Shape: {0}")]
    Shape(String),
    #[error("ParseError::Pattern: {0}")]
    Pattern(#[from] regex::Error),
}
