//! Regenerates the catalog of icon variants from a source image.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use futures::{StreamExt, stream};
use metrics::{counter, histogram};
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, instrument, warn};

use crate::application::repos::{
    BlobStore, BlobStoreError, CodecError, ContentStore, CropMode, ImageCodec, RepoError,
    SiteConfig, SourceImage,
};
use crate::domain::content::{ContentKind, ContentRef};
use crate::domain::site::FAVICONS_FOLDER_NAME;
use crate::domain::variants::{VariantFamily, VariantSpec};

const METRIC_VARIANT_WRITTEN: &str = "favicons_variant_written_total";
const METRIC_VARIANT_FAILED: &str = "favicons_variant_failed_total";
const METRIC_PIPELINE_MS: &str = "favicons_pipeline_ms";

#[derive(Debug, Error)]
pub enum PipelineError {
    /// The icon reference does not resolve to a media record with a payload.
    #[error("source image `{reference}` is unavailable")]
    SourceUnavailable { reference: ContentRef },
    #[error("failed to read source image `{reference}`")]
    StorageRead {
        reference: ContentRef,
        #[source]
        source: BlobStoreError,
    },
    #[error("favicons folder could not be resolved")]
    FolderUnavailable {
        #[source]
        source: RepoError,
    },
    #[error("failed to purge icon container `{container}`")]
    Storage {
        container: String,
        #[source]
        source: BlobStoreError,
    },
    #[error(transparent)]
    Content(#[from] RepoError),
}

/// Tunables for a pipeline run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineConfig {
    /// Upper bound on variants resized at the same time.
    pub concurrency: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// A variant that could not be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VariantFailure {
    pub file_name: String,
    pub reason: String,
}

/// Outcome of one fan-out over a variant family.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationReport {
    pub family: VariantFamily,
    pub folder: ContentRef,
    /// File names written, sorted.
    pub written: Vec<String>,
    pub failed: Vec<VariantFailure>,
}

impl GenerationReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Debug, Error)]
enum VariantError {
    #[error("source image is empty")]
    EmptySource,
    #[error("source image is unusable: {0}")]
    Unusable(String),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error("resize task failed: {0}")]
    Task(String),
    #[error("codec produced no output")]
    EmptyOutput,
    #[error(transparent)]
    Blob(#[from] BlobStoreError),
    #[error(transparent)]
    Content(#[from] RepoError),
}

impl VariantError {
    /// Copy of a failure that applies to every variant of the run.
    fn for_each_variant(&self) -> Self {
        match self {
            VariantError::EmptySource => VariantError::EmptySource,
            other => VariantError::Unusable(other.to_string()),
        }
    }
}

/// Clones share one run lock, so every clone of a site's pipeline is
/// serialized against the others.
#[derive(Clone)]
pub struct IconPipeline {
    content: Arc<dyn ContentStore>,
    blobs: Arc<dyn BlobStore>,
    codec: Arc<dyn ImageCodec>,
    site: Arc<dyn SiteConfig>,
    config: PipelineConfig,
    run_lock: Arc<Mutex<()>>,
}

impl IconPipeline {
    pub fn new(
        content: Arc<dyn ContentStore>,
        blobs: Arc<dyn BlobStore>,
        codec: Arc<dyn ImageCodec>,
        site: Arc<dyn SiteConfig>,
        config: PipelineConfig,
    ) -> Self {
        Self {
            content,
            blobs,
            codec,
            site,
            config,
            run_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Exclusive access for a clean-then-populate run of this site.
    ///
    /// `generate`, `clean_up` and `delete` do not take it themselves; callers
    /// hold the guard across the whole sequence.
    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.run_lock.lock().await
    }

    /// Regenerate the main icon family. Returns `false` when there is no icon,
    /// or when the source or output folder cannot be reached.
    pub async fn generate_icons(&self, icon: Option<ContentRef>) -> bool {
        let Some(icon) = icon else {
            debug!("No website icon configured; skipping icon generation");
            return false;
        };

        match self.generate(VariantFamily::Icons, icon).await {
            Ok(_) => true,
            Err(err) => {
                warn!(icon = %icon, error = %err, "Icon generation aborted");
                false
            }
        }
    }

    /// Regenerate the splash screens from the mobile app icon.
    pub async fn generate_mobile_icons(&self, icon: Option<ContentRef>) {
        let Some(icon) = icon else {
            debug!("No mobile app icon configured; skipping splash generation");
            return;
        };

        if let Err(err) = self.generate(VariantFamily::Splash, icon).await {
            warn!(icon = %icon, error = %err, "Splash generation aborted");
        }
    }

    /// Resize `icon` into every variant of `family` and store the results.
    ///
    /// Variants that fail are recorded in the report; the remaining variants
    /// are still written.
    #[instrument(skip(self))]
    pub async fn generate(
        &self,
        family: VariantFamily,
        icon: ContentRef,
    ) -> Result<GenerationReport, PipelineError> {
        let started_at = Instant::now();
        let folder = self.ensure_folder().await?;
        let source = self.load_source(icon).await?;
        let container = self.site.favicons_path().to_string();
        let existing = self.existing_variants(folder).await?;

        let mut seen = HashSet::new();
        let variants: Vec<VariantSpec> = family
            .variants()
            .iter()
            .copied()
            .filter(|variant| seen.insert(variant.file_name()))
            .collect();

        let outcomes: Vec<(VariantSpec, Result<String, VariantError>)> =
            match self.decode(source).await {
                Ok(image) => {
                    let image = &image;
                    let container = container.as_str();
                    let existing = &existing;
                    stream::iter(variants)
                        .map(move |variant| async move {
                            let replaces = existing
                                .get(&variant.file_name().to_ascii_lowercase())
                                .copied();
                            let outcome = self
                                .write_variant(folder, container, image, variant, replaces)
                                .await;
                            (variant, outcome)
                        })
                        .buffer_unordered(self.config.concurrency.max(1))
                        .collect()
                        .await
                }
                Err(err) => variants
                    .into_iter()
                    .map(|variant| (variant, Err(err.for_each_variant())))
                    .collect(),
            };

        let mut written = Vec::new();
        let mut failed = Vec::new();
        for (variant, outcome) in outcomes {
            match outcome {
                Ok(file_name) => {
                    counter!(METRIC_VARIANT_WRITTEN, "family" => family.as_str()).increment(1);
                    written.push(file_name);
                }
                Err(VariantError::EmptySource) => {
                    debug!(variant = %variant, "Source image is empty; variant skipped");
                    failed.push(VariantFailure {
                        file_name: variant.file_name(),
                        reason: VariantError::EmptySource.to_string(),
                    });
                }
                Err(err) => {
                    counter!(METRIC_VARIANT_FAILED, "family" => family.as_str()).increment(1);
                    warn!(variant = %variant, error = %err, "Failed to produce icon variant");
                    failed.push(VariantFailure {
                        file_name: variant.file_name(),
                        reason: err.to_string(),
                    });
                }
            }
        }
        written.sort();
        failed.sort_by(|a, b| a.file_name.cmp(&b.file_name));

        histogram!(METRIC_PIPELINE_MS, "family" => family.as_str())
            .record(started_at.elapsed().as_secs_f64() * 1000.0);
        info!(
            target = "favicons::pipeline",
            family = family.as_str(),
            icon = %icon,
            written = written.len(),
            failed = failed.len(),
            "Generated icon variants"
        );

        Ok(GenerationReport {
            family,
            folder,
            written,
            failed,
        })
    }

    /// Remove every generated icon. The folder itself is kept.
    #[instrument(skip(self))]
    pub async fn clean_up(&self) -> Result<(), PipelineError> {
        if let Some(folder) = self.find_folder().await? {
            self.content.delete_children(folder).await?;
            debug!(folder = %folder, "Removed generated icon records");
        }
        self.purge_container().await
    }

    /// Remove every generated icon and the favicons folder.
    #[instrument(skip(self))]
    pub async fn delete(&self) -> Result<(), PipelineError> {
        self.clean_up().await?;
        if let Some(folder) = self.find_folder().await? {
            self.content.delete(folder).await?;
            info!(
                target = "favicons::pipeline",
                folder = %folder,
                "Deleted favicons folder"
            );
        }
        Ok(())
    }

    /// Locate the favicons folder under the asset root without creating it.
    pub async fn find_folder(&self) -> Result<Option<ContentRef>, PipelineError> {
        let root = self.site.assets_root();
        let children = self
            .content
            .get_children(root)
            .await
            .map_err(|source| PipelineError::FolderUnavailable { source })?;

        Ok(children
            .into_iter()
            .find(|child| {
                child.is_folder() && child.name.eq_ignore_ascii_case(FAVICONS_FOLDER_NAME)
            })
            .and_then(|child| child.reference))
    }

    async fn ensure_folder(&self) -> Result<ContentRef, PipelineError> {
        if let Some(folder) = self.find_folder().await? {
            return Ok(folder);
        }

        let root = self.site.assets_root();
        let draft = self
            .content
            .get_default(ContentKind::Folder, root)
            .with_name(FAVICONS_FOLDER_NAME);
        let folder = self
            .content
            .save(draft)
            .await
            .map_err(|source| PipelineError::FolderUnavailable { source })?;
        info!(
            target = "favicons::pipeline",
            root = %root,
            folder = %folder,
            "Created favicons folder"
        );
        Ok(folder)
    }

    async fn load_source(&self, icon: ContentRef) -> Result<Bytes, PipelineError> {
        let record = self.content.try_get(icon).await?;
        let Some(blob) = record.and_then(|record| record.blob) else {
            return Err(PipelineError::SourceUnavailable { reference: icon });
        };

        self.blobs
            .open_read(&blob)
            .await
            .map_err(|source| PipelineError::StorageRead {
                reference: icon,
                source,
            })
    }

    async fn purge_container(&self) -> Result<(), PipelineError> {
        let container = self.site.favicons_path();
        self.blobs
            .delete_container(container)
            .await
            .map_err(|source| PipelineError::Storage {
                container: container.to_string(),
                source,
            })
    }

    /// Media records already in `folder`, keyed by lowercased name.
    async fn existing_variants(
        &self,
        folder: ContentRef,
    ) -> Result<HashMap<String, ContentRef>, PipelineError> {
        let children = self
            .content
            .get_children(folder)
            .await
            .map_err(|source| PipelineError::FolderUnavailable { source })?;

        Ok(children
            .into_iter()
            .filter(|child| !child.is_folder())
            .filter_map(|child| {
                child
                    .reference
                    .map(|reference| (child.name.to_ascii_lowercase(), reference))
            })
            .collect())
    }

    async fn decode(&self, source: Bytes) -> Result<Arc<dyn SourceImage>, VariantError> {
        if source.is_empty() {
            return Err(VariantError::EmptySource);
        }

        let codec = Arc::clone(&self.codec);
        let image = tokio::task::spawn_blocking(move || codec.decode(&source))
            .await
            .map_err(|err| VariantError::Task(err.to_string()))??;
        Ok(image)
    }

    async fn write_variant(
        &self,
        folder: ContentRef,
        container: &str,
        image: &Arc<dyn SourceImage>,
        variant: VariantSpec,
        replaces: Option<ContentRef>,
    ) -> Result<String, VariantError> {
        let image = Arc::clone(image);
        let encoded = tokio::task::spawn_blocking(move || {
            image.resize(variant.width, variant.height, CropMode::Auto)
        })
        .await
        .map_err(|err| VariantError::Task(err.to_string()))??;

        if encoded.is_empty() {
            return Err(VariantError::EmptyOutput);
        }

        let file_name = variant.file_name();
        let blob = self
            .blobs
            .create_and_write(container, &file_name, Bytes::from(encoded))
            .await?;
        let mut record = self
            .content
            .get_default(ContentKind::Media, folder)
            .with_name(file_name.clone())
            .with_blob(blob);
        record.reference = replaces;
        self.content.save(record).await?;

        Ok(file_name)
    }
}
