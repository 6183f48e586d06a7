//! Site definition as seen by the favicon services.

use serde::Deserialize;

use super::content::ContentRef;

pub const SITE_ASSETS_ICON_PATH: &str = "siteassets/favicons";
pub const GLOBAL_ASSETS_ICON_PATH: &str = "globalassets/favicons";

/// Name of the folder created under the asset root to hold generated icons.
pub const FAVICONS_FOLDER_NAME: &str = "Favicons";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SiteDefinition {
    /// Display name, used when no application name is configured.
    pub name: String,
    pub start_page: ContentRef,
    /// Asset folder owned by this site, when it has one.
    #[serde(default)]
    pub site_assets_root: Option<ContentRef>,
    pub global_assets_root: ContentRef,
}

impl SiteDefinition {
    /// Folder the favicons folder is created under.
    pub fn assets_root(&self) -> ContentRef {
        self.site_assets_root.unwrap_or(self.global_assets_root)
    }

    /// Virtual path generated icons are served from.
    pub fn favicons_path(&self) -> &'static str {
        if self.site_assets_root.is_some() {
            SITE_ASSETS_ICON_PATH
        } else {
            GLOBAL_ASSETS_ICON_PATH
        }
    }
}
