use thiserror::Error;

use crate::application::repos::BlobStoreError;

#[derive(Debug, Error)]
pub enum InfraError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("telemetry initialization failed: {0}")]
    Telemetry(String),
    #[error("configuration error: {message}")]
    Configuration { message: String },
    #[error("site file `{path}` is invalid: {message}")]
    SiteFile { path: String, message: String },
    #[error(transparent)]
    Blob(#[from] BlobStoreError),
}

impl InfraError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn telemetry(message: impl Into<String>) -> Self {
        Self::Telemetry(message.into())
    }

    pub fn site_file(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SiteFile {
            path: path.into(),
            message: message.into(),
        }
    }
}
