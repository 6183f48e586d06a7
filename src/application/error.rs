use std::error::Error as StdError;

use thiserror::Error;

use crate::{
    application::{pipeline::PipelineError, repos::RepoError},
    infra::error::InfraError,
    sync::SyncError,
};

#[derive(Debug, Error)]
pub enum AppError {
    /// No content type or instance carries the favicon settings.
    #[error(
        "no favicon settings defined: flag a content type with `contains_settings` and create an instance of it"
    )]
    NoSettingsRecord,
    #[error(transparent)]
    Infra(#[from] InfraError),
    #[error(transparent)]
    Repo(#[from] RepoError),
    #[error(transparent)]
    Pipeline(#[from] PipelineError),
    #[error(transparent)]
    Sync(#[from] SyncError),
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("unexpected error: {0}")]
    Unexpected(String),
}

impl AppError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::Unexpected(message.into())
    }

    /// Messages of this error and every source below it, outermost first.
    pub fn chain(&self) -> Vec<String> {
        let mut messages = vec![self.to_string()];
        let mut current = StdError::source(self);
        while let Some(inner) = current {
            messages.push(inner.to_string());
            current = inner.source();
        }
        messages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chain_lists_sources() {
        let error = AppError::from(InfraError::configuration("missing site file"));
        let chain = error.chain();
        assert_eq!(chain[0], "configuration error: missing site file");
    }

    #[test]
    fn no_settings_message_is_actionable() {
        let message = AppError::NoSettingsRecord.to_string();
        assert!(message.contains("contains_settings"));
    }
}
