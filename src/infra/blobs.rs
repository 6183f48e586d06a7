//! Filesystem blob storage.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use sha2::{Digest, Sha256};
use tokio::{fs, io::AsyncWriteExt};
use tracing::debug;

use crate::application::repos::{BlobStore, BlobStoreError};
use crate::domain::content::BlobRef;

/// Blob store laying containers out as directories under `root`.
///
/// A blob `name` in container `siteassets/favicons` lands at
/// `<root>/siteassets/favicons/<name>`.
#[derive(Debug)]
pub struct FsBlobStore {
    root: PathBuf,
}

impl FsBlobStore {
    /// Initialise storage rooted at the provided directory, creating it if necessary.
    pub fn new(root: PathBuf) -> Result<Self, std::io::Error> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, BlobStoreError> {
        let path = Path::new(relative);
        let escapes = path.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::Prefix(_) | Component::RootDir
            )
        });
        if relative.trim().is_empty() || escapes {
            return Err(BlobStoreError::InvalidPath(relative.to_string()));
        }

        Ok(self.root.join(path))
    }

    fn blob_path(&self, container: &str, name: &str) -> Result<PathBuf, BlobStoreError> {
        let file = Path::new(name);
        let mut components = file.components();
        let single = matches!(
            (components.next(), components.next()),
            (Some(Component::Normal(_)), None)
        );
        if !single {
            return Err(BlobStoreError::InvalidPath(name.to_string()));
        }
        Ok(self.resolve(container)?.join(file))
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn open_read(&self, blob: &BlobRef) -> Result<Bytes, BlobStoreError> {
        let absolute = self.blob_path(&blob.container, &blob.name)?;
        match fs::read(&absolute).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(
                BlobStoreError::NotFound(format!("{}/{}", blob.container, blob.name)),
            ),
            Err(err) => Err(BlobStoreError::Io(err)),
        }
    }

    async fn create_and_write(
        &self,
        container: &str,
        name: &str,
        data: Bytes,
    ) -> Result<BlobRef, BlobStoreError> {
        if data.is_empty() {
            return Err(BlobStoreError::EmptyPayload);
        }

        let absolute = self.blob_path(container, name)?;
        if let Some(parent) = absolute.parent() {
            fs::create_dir_all(parent).await?;
        }

        let mut file = fs::File::create(&absolute).await?;
        file.write_all(&data).await?;
        file.flush().await?;

        let checksum = hex::encode(Sha256::digest(&data[..]).as_slice());
        debug!(container, name, size = data.len(), "Stored blob");

        Ok(BlobRef {
            container: container.to_string(),
            name: name.to_string(),
            checksum,
            size_bytes: data.len() as u64,
        })
    }

    async fn delete_container(&self, container: &str) -> Result<(), BlobStoreError> {
        let absolute = self.resolve(container)?;
        match fs::remove_dir_all(&absolute).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(BlobStoreError::Io(err)),
        }
    }
}
