#![allow(dead_code)]

use std::io::Cursor;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use favicons::application::locator::PropertyLocator;
use favicons::application::pipeline::{IconPipeline, PipelineConfig};
use favicons::application::publish::FaviconPublisher;
use favicons::application::repos::{BlobStore, ContentStore, ImageCodec, SiteConfig};
use favicons::application::resolver::SettingsResolver;
use favicons::cache::{CacheConfig, ObjectCache, SettingsCache, SettingsProvider};
use favicons::domain::content::{
    Capability, ContentKind, ContentRecord, ContentRef, ContentTypeDefinition, FieldDefinition,
    FieldValue,
};
use favicons::domain::settings::FaviconSettings;
use favicons::domain::site::{SITE_ASSETS_ICON_PATH, SiteDefinition};
use favicons::infra::blobs::FsBlobStore;
use favicons::infra::codec::ImageCrateCodec;
use favicons::infra::memory::MemoryContentStore;
use image::{ImageFormat, Rgba, RgbaImage};
use tempfile::TempDir;

pub const START_PAGE_TYPE: &str = "StartPage";
pub const SITE_SETTINGS_TYPE: &str = "SiteSettings";

/// A site with an empty start page, backed by a temporary output directory.
pub struct Harness {
    pub dir: TempDir,
    pub content: Arc<MemoryContentStore>,
    pub blobs: Arc<FsBlobStore>,
    pub site: Arc<SiteDefinition>,
    pub locator: Arc<PropertyLocator>,
    /// Record of a dedicated settings type, when the start page does not
    /// carry the settings itself.
    pub settings_page: Option<ContentRef>,
}

pub fn start_page_type() -> ContentTypeDefinition {
    let field = |name: &str, capability: Capability| FieldDefinition {
        name: name.to_string(),
        capabilities: vec![capability],
    };
    ContentTypeDefinition {
        id: START_PAGE_TYPE.to_string(),
        contains_settings: true,
        fields: vec![
            field("SiteIcon", Capability::WebsiteIcon),
            field("MobileIcon", Capability::MobileAppIcon),
            field("ThemeColor", Capability::ThemeColor),
            field("TileColor", Capability::TileColor),
            field("AppName", Capability::ApplicationName),
            field("ShortName", Capability::ApplicationShortName),
        ],
    }
}

/// Solid square PNG of the given size.
pub fn png(size: u32) -> Bytes {
    let image = RgbaImage::from_pixel(size, size, Rgba([51, 102, 153, 255]));
    let mut buffer = Cursor::new(Vec::new());
    image
        .write_to(&mut buffer, ImageFormat::Png)
        .expect("encode test png");
    Bytes::from(buffer.into_inner())
}

/// Same fields as the start page type, under its own id.
pub fn site_settings_type() -> ContentTypeDefinition {
    ContentTypeDefinition {
        id: SITE_SETTINGS_TYPE.to_string(),
        ..start_page_type()
    }
}

impl Harness {
    pub async fn new() -> Self {
        Self::build(false).await
    }

    /// A site whose settings live on a separate `SiteSettings` record; the
    /// start page type is not flagged as carrying settings.
    pub async fn with_settings_page() -> Self {
        Self::build(true).await
    }

    async fn build(separate_settings: bool) -> Self {
        let dir = tempfile::tempdir().expect("temp dir");
        let content = Arc::new(MemoryContentStore::new());
        let blobs = Arc::new(FsBlobStore::new(dir.path().join("public")).expect("blob store"));

        let mut definitions = Vec::new();
        if separate_settings {
            definitions.push(site_settings_type());
            definitions.push(ContentTypeDefinition {
                contains_settings: false,
                ..start_page_type()
            });
        } else {
            definitions.push(start_page_type());
        }
        for definition in &definitions {
            content.register_content_type(definition.clone());
        }

        let global_assets_root = content
            .save(ContentRecord::draft(ContentKind::Folder, None).with_name("Global Assets"))
            .await
            .expect("global assets");
        let site_assets_root = content
            .save(ContentRecord::draft(ContentKind::Folder, None).with_name("Acme Assets"))
            .await
            .expect("site assets");
        let start_page = content
            .save(
                ContentRecord::draft(ContentKind::Page, None)
                    .with_name("Home")
                    .with_content_type(START_PAGE_TYPE),
            )
            .await
            .expect("start page");
        let settings_page = if separate_settings {
            let page = content
                .save(
                    ContentRecord::draft(ContentKind::Page, Some(start_page))
                        .with_name("Settings")
                        .with_content_type(SITE_SETTINGS_TYPE),
                )
                .await
                .expect("settings page");
            Some(page)
        } else {
            None
        };

        let site = Arc::new(SiteDefinition {
            name: "Acme".to_string(),
            start_page,
            site_assets_root: Some(site_assets_root),
            global_assets_root,
        });

        Self {
            dir,
            content,
            blobs,
            site,
            locator: Arc::new(PropertyLocator::new(&definitions)),
            settings_page,
        }
    }

    pub fn start_page(&self) -> ContentRef {
        self.site.start_page
    }

    /// Store `data` as an uploaded media item and return its reference.
    pub async fn upload(&self, name: &str, data: Bytes) -> ContentRef {
        let blob = self
            .blobs
            .create_and_write("uploads", name, data)
            .await
            .expect("upload blob");
        self.content
            .save(
                ContentRecord::draft(ContentKind::Media, self.site.site_assets_root)
                    .with_name(name)
                    .with_blob(blob),
            )
            .await
            .expect("media record")
    }

    /// Overwrite one field on the start page.
    pub async fn set_field(&self, field: &str, value: FieldValue) {
        self.set_field_on(self.start_page(), field, value).await;
    }

    pub async fn set_field_on(&self, reference: ContentRef, field: &str, value: FieldValue) {
        let record = self
            .content
            .try_get(reference)
            .await
            .expect("lookup")
            .expect("record exists");
        self.content
            .save(record.with_field(field, value))
            .await
            .expect("save record");
    }

    pub async fn set_icon(&self, icon: Option<ContentRef>) {
        let value = icon.map_or(FieldValue::Empty, FieldValue::Reference);
        self.set_field("SiteIcon", value).await;
    }

    pub async fn set_mobile_icon(&self, icon: Option<ContentRef>) {
        let value = icon.map_or(FieldValue::Empty, FieldValue::Reference);
        self.set_field("MobileIcon", value).await;
    }

    pub fn content_store(&self) -> Arc<dyn ContentStore> {
        self.content.clone()
    }

    pub fn site_config(&self) -> Arc<dyn SiteConfig> {
        self.site.clone()
    }

    pub fn cache(&self) -> SettingsCache {
        let config = CacheConfig::default();
        let resolver =
            SettingsResolver::new(self.content_store(), self.locator.clone(), self.site_config());
        let provider: Arc<SettingsProvider> =
            Arc::new(ObjectCache::<Arc<FaviconSettings>>::new(&config));
        SettingsCache::new(provider, resolver, self.site_config(), config)
    }

    pub fn pipeline(&self) -> IconPipeline {
        self.pipeline_with_codec(Arc::new(ImageCrateCodec::default()))
    }

    pub fn pipeline_with_codec(&self, codec: Arc<dyn ImageCodec>) -> IconPipeline {
        self.pipeline_with(codec, self.blobs.clone())
    }

    pub fn pipeline_with(
        &self,
        codec: Arc<dyn ImageCodec>,
        blobs: Arc<dyn BlobStore>,
    ) -> IconPipeline {
        IconPipeline::new(
            self.content_store(),
            blobs,
            codec,
            self.site_config(),
            PipelineConfig::default(),
        )
    }

    pub fn publisher(&self, cache: SettingsCache, pipeline: IconPipeline) -> FaviconPublisher {
        FaviconPublisher::new(
            self.content_store(),
            self.site_config(),
            cache,
            pipeline,
            Duration::from_secs(60),
        )
    }

    pub fn icon_dir(&self) -> PathBuf {
        self.blobs.root().join(SITE_ASSETS_ICON_PATH)
    }

    /// Sorted file names currently in the favicons container.
    pub fn icon_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.icon_dir()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .file_name()
                    .to_string_lossy()
                    .into_owned()
            })
            .collect();
        names.sort();
        names
    }

    /// Media records currently under the favicons folder.
    pub async fn icon_records(&self, pipeline: &IconPipeline) -> Vec<ContentRecord> {
        match pipeline.find_folder().await.expect("find folder") {
            Some(folder) => self
                .content
                .get_children(folder)
                .await
                .expect("folder children"),
            None => Vec::new(),
        }
    }
}
