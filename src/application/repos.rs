//! Collaborator traits describing the host content platform.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

use crate::domain::content::{
    BlobRef, ContentKind, ContentRecord, ContentRef, ContentTypeDefinition,
};
use crate::domain::site::SiteDefinition;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("content `{0}` not found")]
    NotFound(ContentRef),
    #[error("invalid input: {message}")]
    InvalidInput { message: String },
}

impl RepoError {
    pub fn from_persistence(err: impl std::fmt::Display) -> Self {
        Self::Persistence(err.to_string())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }
}

/// Content repository: records, folders and content-type definitions.
#[async_trait]
pub trait ContentStore: Send + Sync {
    async fn try_get(&self, reference: ContentRef) -> Result<Option<ContentRecord>, RepoError>;

    async fn get_children(&self, folder: ContentRef) -> Result<Vec<ContentRecord>, RepoError>;

    /// Persist the record and return its reference; unsaved records get a new one.
    async fn save(&self, record: ContentRecord) -> Result<ContentRef, RepoError>;

    /// Recursively delete everything below `folder`, keeping the folder itself.
    async fn delete_children(&self, folder: ContentRef) -> Result<(), RepoError>;

    /// Recursively delete `reference` and its descendants.
    async fn delete(&self, reference: ContentRef) -> Result<(), RepoError>;

    async fn list_content_types(&self) -> Result<Vec<ContentTypeDefinition>, RepoError>;

    /// Live instances of a content type, oldest first.
    async fn list_instances(&self, content_type: &str) -> Result<Vec<ContentRef>, RepoError>;

    /// Unsaved record of `kind` under `parent`.
    fn get_default(&self, kind: ContentKind, parent: ContentRef) -> ContentRecord {
        ContentRecord::draft(kind, Some(parent))
    }
}

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("invalid blob path `{0}`")]
    InvalidPath(String),
    #[error("blob `{0}` not found")]
    NotFound(String),
    #[error("blob payload is empty")]
    EmptyPayload,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Binary storage for media payloads, grouped in named containers.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn open_read(&self, blob: &BlobRef) -> Result<Bytes, BlobStoreError>;

    /// Write `data` as `name` inside `container`, replacing any previous payload.
    async fn create_and_write(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
    ) -> Result<BlobRef, BlobStoreError>;

    /// Remove a container and every blob in it. Missing containers are a no-op.
    async fn delete_container(&self, container: &str) -> Result<(), BlobStoreError>;
}

/// How a source image is fitted to the target dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CropMode {
    /// Preserve aspect ratio, cover the target and crop the overflow.
    #[default]
    Auto,
    /// Scale both axes independently to the target.
    Stretch,
}

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to decode source image: {0}")]
    Decode(String),
    #[error("failed to encode png: {0}")]
    Encode(String),
    #[error("invalid target size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
}

/// Decode capability. Implementations must be pure.
pub trait ImageCodec: Send + Sync {
    /// Decode `source` once; every variant of a run is resized from the result.
    fn decode(&self, source: &[u8]) -> Result<Arc<dyn SourceImage>, CodecError>;
}

/// Decoded pixels shared by the variants of one run.
pub trait SourceImage: Send + Sync {
    /// Fit the image to `width`x`height` and encode it as PNG.
    fn resize(&self, width: u32, height: u32, crop: CropMode) -> Result<Vec<u8>, CodecError>;
}

/// Read-only accessor for the current site.
pub trait SiteConfig: Send + Sync {
    fn start_page(&self) -> ContentRef;

    fn display_name(&self) -> &str;

    fn assets_root(&self) -> ContentRef;

    fn favicons_path(&self) -> &str;
}

impl SiteConfig for SiteDefinition {
    fn start_page(&self) -> ContentRef {
        self.start_page
    }

    fn display_name(&self) -> &str {
        &self.name
    }

    fn assets_root(&self) -> ContentRef {
        SiteDefinition::assets_root(self)
    }

    fn favicons_path(&self) -> &str {
        SiteDefinition::favicons_path(self)
    }
}
