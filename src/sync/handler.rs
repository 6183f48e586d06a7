use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::application::pipeline::IconPipeline;
use crate::application::repos::{ContentStore, SiteConfig};
use crate::cache::SettingsCache;
use crate::domain::content::{Capability, ContentRef};

use super::SyncError;
use super::notifier::{ChangeHandler, ChangeKind};

/// Replays a peer's favicon change on this instance.
pub struct FaviconSync {
    content: Arc<dyn ContentStore>,
    site: Arc<dyn SiteConfig>,
    cache: SettingsCache,
    pipeline: IconPipeline,
}

impl FaviconSync {
    pub fn new(
        content: Arc<dyn ContentStore>,
        site: Arc<dyn SiteConfig>,
        cache: SettingsCache,
        pipeline: IconPipeline,
    ) -> Self {
        Self {
            content,
            site,
            cache,
            pipeline,
        }
    }

    async fn regenerate(&self) -> Result<(), SyncError> {
        let start_page = self.site.start_page();
        let Some(record) = self
            .content
            .try_get(start_page)
            .await
            .map_err(SyncError::handler)?
        else {
            warn!(start_page = %start_page, "Start page missing; skipping favicon sync");
            return Ok(());
        };

        let record = self
            .cache
            .refresh(record)
            .await
            .map_err(SyncError::handler)?;

        let locator = self.cache.resolver().locator();
        let icon: Option<ContentRef> = locator.locate(&record, Capability::WebsiteIcon);
        let mobile: Option<ContentRef> = locator.locate(&record, Capability::MobileAppIcon);

        self.pipeline
            .clean_up()
            .await
            .map_err(SyncError::handler)?;
        if self.pipeline.generate_icons(icon).await {
            self.pipeline.generate_mobile_icons(mobile).await;
        }
        Ok(())
    }
}

#[async_trait]
impl ChangeHandler for FaviconSync {
    async fn on_change(&self, kind: ChangeKind) -> Result<(), SyncError> {
        info!(
            target = "favicons::sync",
            kind = kind.as_str(),
            "Applying peer favicon change"
        );
        let _run = self.pipeline.lock().await;
        match kind {
            ChangeKind::Created => self.regenerate().await,
            ChangeKind::Deleted => {
                self.cache.invalidate();
                self.pipeline.clean_up().await.map_err(SyncError::handler)
            }
        }
    }
}
