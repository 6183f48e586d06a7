//! Cached `FaviconSettings` for the current site.

use std::collections::HashSet;
use std::sync::Arc;

use metrics::counter;
use tracing::{debug, instrument};

use crate::application::error::AppError;
use crate::application::repos::SiteConfig;
use crate::application::resolver::SettingsResolver;
use crate::domain::content::ContentRecord;
use crate::domain::settings::FaviconSettings;

use super::config::CacheConfig;
use super::keys::{CacheKey, EntityKey};
use super::store::CacheProvider;

const METRIC_CACHE_HIT: &str = "favicons_settings_cache_hit_total";
const METRIC_CACHE_MISS: &str = "favicons_settings_cache_miss_total";

/// Provider type able to hold the settings snapshot.
pub type SettingsProvider = dyn CacheProvider<Arc<FaviconSettings>>;

/// Single-entry settings cache, evicted whenever the start page changes.
///
/// Concurrent misses may each resolve and store; the last store wins.
#[derive(Clone)]
pub struct SettingsCache {
    provider: Arc<SettingsProvider>,
    resolver: SettingsResolver,
    site: Arc<dyn SiteConfig>,
    config: CacheConfig,
}

impl SettingsCache {
    pub fn new(
        provider: Arc<SettingsProvider>,
        resolver: SettingsResolver,
        site: Arc<dyn SiteConfig>,
        config: CacheConfig,
    ) -> Self {
        Self {
            provider,
            resolver,
            site,
            config,
        }
    }

    pub fn resolver(&self) -> &SettingsResolver {
        &self.resolver
    }

    /// Cached settings, resolving and storing them on a miss.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<Arc<FaviconSettings>, AppError> {
        if self.config.enabled
            && let Some(settings) = self.provider.get(&CacheKey::FAVICON_SETTINGS)
        {
            counter!(METRIC_CACHE_HIT).increment(1);
            return Ok(settings);
        }

        counter!(METRIC_CACHE_MISS).increment(1);
        let settings = Arc::new(self.resolver.resolve_current().await?);
        self.store(Arc::clone(&settings));
        Ok(settings)
    }

    /// Replace the cached value with settings resolved from `record`.
    #[instrument(skip(self, record))]
    pub fn set(&self, record: &ContentRecord) -> Result<Arc<FaviconSettings>, AppError> {
        self.invalidate();
        let settings = Arc::new(self.resolver.resolve(Some(record))?);
        self.store(Arc::clone(&settings));
        Ok(settings)
    }

    /// React to `record` having changed and return the record that carries
    /// the settings.
    ///
    /// Only a record of the settings type replaces the cached value. Any other
    /// record drops the entry and the settings record is looked up instead.
    pub async fn refresh(&self, record: ContentRecord) -> Result<ContentRecord, AppError> {
        if self.resolver.has_settings(&record) {
            self.set(&record)?;
            return Ok(record);
        }

        self.invalidate();
        self.resolver.locate_settings_record().await
    }

    pub fn invalidate(&self) {
        self.provider.remove(&CacheKey::FAVICON_SETTINGS);
        debug!("Invalidated favicon settings");
    }

    /// Eviction signal for the start page's cache dependency.
    pub fn evict_start_page(&self) -> usize {
        self.provider
            .evict(&EntityKey::Content(self.site.start_page()))
    }

    fn store(&self, settings: Arc<FaviconSettings>) {
        if !self.config.enabled {
            return;
        }
        let dependencies = HashSet::from([EntityKey::Content(self.site.start_page())]);
        self.provider
            .insert(CacheKey::FAVICON_SETTINGS, settings, dependencies);
    }
}
