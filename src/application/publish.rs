//! Reaction to the site start page being published.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use crate::application::error::AppError;
use crate::application::pipeline::{GenerationReport, IconPipeline, PipelineError};
use crate::application::repos::{ContentStore, RepoError, SiteConfig};
use crate::cache::SettingsCache;
use crate::domain::content::{Capability, ContentRef};
use crate::domain::variants::VariantFamily;
use crate::sync::{ChangeKind, ChangeNotifier};

/// What a publish event ended up doing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PublishOutcome {
    /// The published content is not the start page.
    Ignored,
    /// No website icon is configured; generated output was removed.
    Removed,
    Generated {
        icons: GenerationReport,
        splash: Option<GenerationReport>,
    },
    /// The website icon could not be read. Previous output was already purged.
    SourceUnavailable,
    /// Regeneration exceeded the configured timeout.
    TimedOut,
}

impl PublishOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishOutcome::Ignored => "ignored",
            PublishOutcome::Removed => "removed",
            PublishOutcome::Generated { .. } => "generated",
            PublishOutcome::SourceUnavailable => "source_unavailable",
            PublishOutcome::TimedOut => "timed_out",
        }
    }
}

pub struct FaviconPublisher {
    content: Arc<dyn ContentStore>,
    site: Arc<dyn SiteConfig>,
    cache: SettingsCache,
    pipeline: IconPipeline,
    notifier: Option<Arc<ChangeNotifier>>,
    timeout: Duration,
}

impl FaviconPublisher {
    pub fn new(
        content: Arc<dyn ContentStore>,
        site: Arc<dyn SiteConfig>,
        cache: SettingsCache,
        pipeline: IconPipeline,
        timeout: Duration,
    ) -> Self {
        Self {
            content,
            site,
            cache,
            pipeline,
            notifier: None,
            timeout,
        }
    }

    /// Announce completed changes to peer instances.
    pub fn with_notifier(mut self, notifier: Arc<ChangeNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    #[instrument(skip(self))]
    pub async fn handle_published(
        &self,
        reference: ContentRef,
    ) -> Result<PublishOutcome, AppError> {
        if reference != self.site.start_page() {
            return Ok(PublishOutcome::Ignored);
        }

        self.cache.evict_start_page();
        let (outcome, change) = {
            let _run = self.pipeline.lock().await;
            self.apply(reference).await?
        };
        // Announced after the run lock is released; a peer handler on the same
        // bus may need it.
        if let Some(kind) = change {
            self.announce(kind).await;
        }

        info!(
            target = "favicons::publish",
            outcome = outcome.as_str(),
            "Handled start page publish"
        );
        Ok(outcome)
    }

    async fn apply(
        &self,
        reference: ContentRef,
    ) -> Result<(PublishOutcome, Option<ChangeKind>), AppError> {
        let record = self
            .content
            .try_get(reference)
            .await?
            .ok_or(RepoError::NotFound(reference))?;
        let record = self.cache.refresh(record).await?;

        let locator = self.cache.resolver().locator();
        let icon: Option<ContentRef> = locator.locate(&record, Capability::WebsiteIcon);
        let mobile: Option<ContentRef> = locator.locate(&record, Capability::MobileAppIcon);

        let Some(icon) = icon else {
            self.pipeline.delete().await?;
            return Ok((PublishOutcome::Removed, Some(ChangeKind::Deleted)));
        };

        match tokio::time::timeout(self.timeout, self.regenerate(icon, mobile)).await {
            Ok(outcome) => {
                let outcome = outcome?;
                let change = matches!(outcome, PublishOutcome::Generated { .. })
                    .then_some(ChangeKind::Created);
                Ok((outcome, change))
            }
            Err(_) => {
                warn!(
                    icon = %icon,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Favicon regeneration timed out; output may be partial"
                );
                Ok((PublishOutcome::TimedOut, None))
            }
        }
    }

    async fn regenerate(
        &self,
        icon: ContentRef,
        mobile: Option<ContentRef>,
    ) -> Result<PublishOutcome, AppError> {
        self.pipeline.clean_up().await?;

        let icons = match self.pipeline.generate(VariantFamily::Icons, icon).await {
            Ok(report) => report,
            Err(
                err @ (PipelineError::SourceUnavailable { .. } | PipelineError::StorageRead { .. }),
            ) => {
                warn!(icon = %icon, error = %err, "Website icon is unreadable");
                return Ok(PublishOutcome::SourceUnavailable);
            }
            Err(err) => return Err(err.into()),
        };

        let splash = match mobile {
            Some(mobile) => match self.pipeline.generate(VariantFamily::Splash, mobile).await {
                Ok(report) => Some(report),
                Err(err) => {
                    warn!(icon = %mobile, error = %err, "Splash generation aborted");
                    None
                }
            },
            None => None,
        };

        Ok(PublishOutcome::Generated { icons, splash })
    }

    async fn announce(&self, kind: ChangeKind) {
        let Some(notifier) = &self.notifier else {
            return;
        };
        if let Err(err) = notifier.announce(kind).await {
            warn!(kind = kind.as_str(), error = %err, "Failed to announce favicon change");
        }
    }
}
