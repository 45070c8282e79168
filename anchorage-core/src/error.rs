use crate::provider::ProviderError;
use anchorage_scanner::ScanError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CheckError {
    #[error("Graph provider failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Verifier setup failed: {0}")]
    Scanner(#[from] ScanError),

    #[error("Report pushed after the reporter was closed")]
    ReporterClosed,
}

pub type Result<T> = std::result::Result<T, CheckError>;
