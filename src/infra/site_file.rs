//! TOML description of a site, loaded into the in-memory content store.
//!
//! ```toml
//! [site]
//! name = "Acme"
//! start_page = "home"
//! site_assets = true
//!
//! [[content_types]]
//! id = "StartPage"
//! contains_settings = true
//! fields = [
//!     { name = "SiteIcon", capabilities = ["website_icon"] },
//!     { name = "ThemeColor", capabilities = ["theme_color"] },
//! ]
//!
//! [[media]]
//! key = "logo"
//! file = "assets/logo.png"
//!
//! [[pages]]
//! key = "home"
//! name = "Home"
//! content_type = "StartPage"
//! fields = { SiteIcon = { media = "logo" }, ThemeColor = "#336699" }
//! ```

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use bytes::Bytes;
use serde::Deserialize;
use tracing::{debug, info};

use crate::application::repos::{BlobStore, ContentStore};
use crate::domain::content::{
    ContentKind, ContentRecord, ContentRef, ContentTypeDefinition, FieldValue,
};
use crate::domain::site::SiteDefinition;
use crate::infra::error::InfraError;
use crate::infra::memory::MemoryContentStore;

/// Container source media are uploaded to.
pub const UPLOADS_CONTAINER: &str = "uploads";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct SiteFile {
    site: SiteSection,
    #[serde(default)]
    content_types: Vec<ContentTypeDefinition>,
    #[serde(default)]
    media: Vec<MediaEntry>,
    #[serde(default)]
    pages: Vec<PageEntry>,
}

#[derive(Debug, Deserialize)]
struct SiteSection {
    name: String,
    start_page: String,
    #[serde(default = "default_site_assets")]
    site_assets: bool,
}

fn default_site_assets() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct MediaEntry {
    key: String,
    file: String,
}

#[derive(Debug, Deserialize)]
struct PageEntry {
    key: String,
    #[serde(default)]
    name: Option<String>,
    content_type: String,
    #[serde(default)]
    fields: BTreeMap<String, FileFieldValue>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FileFieldValue {
    Text(String),
    Media { media: String },
}

/// Everything a command needs from a loaded site file.
#[derive(Debug, Clone)]
pub struct LoadedSite {
    pub site: SiteDefinition,
    pub content_types: Vec<ContentTypeDefinition>,
}

/// Parse `path`, upload its media into `blobs` and populate `content`.
pub async fn load_site(
    path: &Path,
    content: &MemoryContentStore,
    blobs: &dyn BlobStore,
) -> Result<LoadedSite, InfraError> {
    let display = path.display().to_string();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|err| InfraError::site_file(&display, err.to_string()))?;
    let file: SiteFile =
        toml::from_str(&raw).map_err(|err| InfraError::site_file(&display, err.to_string()))?;
    let base = path.parent().unwrap_or_else(|| Path::new("."));

    for definition in &file.content_types {
        content.register_content_type(definition.clone());
    }

    let global_assets_root = save(content, folder("Global Assets"), &display).await?;
    let site_assets_root = if file.site.site_assets {
        Some(save(content, folder(&format!("{} Assets", file.site.name)), &display).await?)
    } else {
        None
    };
    let media_root = site_assets_root.unwrap_or(global_assets_root);

    let mut media = HashMap::new();
    for entry in &file.media {
        let source = base.join(&entry.file);
        let data = tokio::fs::read(&source).await.map_err(|err| {
            InfraError::site_file(&display, format!("media `{}`: {err}", entry.key))
        })?;
        let name = source
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(entry.key.as_str())
            .to_string();
        let blob = blobs
            .create_and_write(UPLOADS_CONTAINER, &name, Bytes::from(data))
            .await?;
        let record = ContentRecord::draft(ContentKind::Media, Some(media_root))
            .with_name(name)
            .with_blob(blob);
        let reference = save(content, record, &display).await?;
        debug!(key = entry.key.as_str(), reference = %reference, "Uploaded media");
        media.insert(entry.key.as_str(), reference);
    }

    let mut pages = HashMap::new();
    for entry in &file.pages {
        let mut record = ContentRecord::draft(ContentKind::Page, None)
            .with_name(entry.name.clone().unwrap_or_else(|| entry.key.clone()))
            .with_content_type(entry.content_type.clone());
        for (field, value) in &entry.fields {
            let value = match value {
                FileFieldValue::Text(text) => FieldValue::Text(text.clone()),
                FileFieldValue::Media { media: key } => match media.get(key.as_str()) {
                    Some(reference) => FieldValue::Reference(*reference),
                    None => {
                        return Err(InfraError::site_file(
                            &display,
                            format!("page `{}` references unknown media `{key}`", entry.key),
                        ));
                    }
                },
            };
            record = record.with_field(field.clone(), value);
        }
        pages.insert(entry.key.as_str(), save(content, record, &display).await?);
    }

    let start_page = pages
        .get(file.site.start_page.as_str())
        .copied()
        .ok_or_else(|| {
            InfraError::site_file(
                &display,
                format!("start page `{}` is not defined", file.site.start_page),
            )
        })?;

    info!(
        target = "favicons::site",
        site = file.site.name.as_str(),
        media = media.len(),
        pages = pages.len(),
        "Loaded site file"
    );

    Ok(LoadedSite {
        site: SiteDefinition {
            name: file.site.name,
            start_page,
            site_assets_root,
            global_assets_root,
        },
        content_types: file.content_types,
    })
}

fn folder(name: &str) -> ContentRecord {
    ContentRecord::draft(ContentKind::Folder, None).with_name(name)
}

async fn save(
    content: &MemoryContentStore,
    record: ContentRecord,
    display: &str,
) -> Result<ContentRef, InfraError> {
    content
        .save(record)
        .await
        .map_err(|err| InfraError::site_file(display, err.to_string()))
}
