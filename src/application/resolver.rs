//! Builds `FaviconSettings` from the settings record.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::application::error::AppError;
use crate::application::locator::PropertyLocator;
use crate::application::repos::{ContentStore, SiteConfig};
use crate::domain::content::{Capability, ContentRecord, ContentRef};
use crate::domain::settings::{DEFAULT_COLOR, FaviconSettings, non_blank_or};

#[derive(Clone)]
pub struct SettingsResolver {
    content: Arc<dyn ContentStore>,
    locator: Arc<PropertyLocator>,
    site: Arc<dyn SiteConfig>,
}

impl SettingsResolver {
    pub fn new(
        content: Arc<dyn ContentStore>,
        locator: Arc<PropertyLocator>,
        site: Arc<dyn SiteConfig>,
    ) -> Self {
        Self {
            content,
            locator,
            site,
        }
    }

    pub fn locator(&self) -> &Arc<PropertyLocator> {
        &self.locator
    }

    /// Whether `record` is of the type flagged as carrying favicon settings.
    pub fn has_settings(&self, record: &ContentRecord) -> bool {
        self.locator.has_settings(record)
    }

    /// Resolve settings from the supplied record, applying defaults.
    pub fn resolve(&self, record: Option<&ContentRecord>) -> Result<FaviconSettings, AppError> {
        let record = record.ok_or(AppError::NoSettingsRecord)?;
        let locator = &self.locator;

        let application_name: Option<String> =
            locator.locate(record, Capability::ApplicationName);
        let application_short_name: Option<String> =
            locator.locate(record, Capability::ApplicationShortName);
        let theme_color: Option<String> = locator.locate(record, Capability::ThemeColor);
        let tile_color: Option<String> = locator.locate(record, Capability::TileColor);
        let website_icon: Option<ContentRef> = locator.locate(record, Capability::WebsiteIcon);
        let mobile_app_icon: Option<ContentRef> =
            locator.locate(record, Capability::MobileAppIcon);

        let site_name = self.site.display_name();

        Ok(FaviconSettings {
            theme_color: non_blank_or(theme_color, DEFAULT_COLOR),
            tile_color: non_blank_or(tile_color, DEFAULT_COLOR),
            display_favicons: website_icon.is_some(),
            mobile_web_app_capable: mobile_app_icon.is_some(),
            favicons_path: self.site.favicons_path().to_string(),
            application_name: non_blank_or(application_name, site_name),
            application_short_name: non_blank_or(application_short_name, site_name),
        })
    }

    /// Find the first live instance of the first content type flagged as
    /// carrying settings.
    #[instrument(skip(self))]
    pub async fn locate_settings_record(&self) -> Result<ContentRecord, AppError> {
        let definitions = self.content.list_content_types().await?;
        let Some(definition) = definitions.iter().find(|d| d.contains_settings) else {
            return Err(AppError::NoSettingsRecord);
        };

        for reference in self.content.list_instances(&definition.id).await? {
            if let Some(record) = self.content.try_get(reference).await? {
                debug!(
                    content_type = definition.id.as_str(),
                    reference = %reference,
                    "Located favicon settings record"
                );
                return Ok(record);
            }
        }

        Err(AppError::NoSettingsRecord)
    }

    /// Locate the settings record and resolve it.
    pub async fn resolve_current(&self) -> Result<FaviconSettings, AppError> {
        let record = self.locate_settings_record().await?;
        self.resolve(Some(&record))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::content::{
        ContentKind, ContentTypeDefinition, FieldDefinition, FieldValue,
    };
    use crate::domain::site::SiteDefinition;
    use crate::infra::memory::MemoryContentStore;

    fn reference(id: u64) -> ContentRef {
        ContentRef::new(id).expect("non-zero reference")
    }

    fn site() -> SiteDefinition {
        SiteDefinition {
            name: "Acme Site".to_string(),
            start_page: reference(1),
            site_assets_root: Some(reference(2)),
            global_assets_root: reference(3),
        }
    }

    fn settings_type(contains_settings: bool) -> ContentTypeDefinition {
        let field = |name: &str, capability| FieldDefinition {
            name: name.to_string(),
            capabilities: vec![capability],
        };
        ContentTypeDefinition {
            id: "StartPage".to_string(),
            contains_settings,
            fields: vec![
                field("AppName", Capability::ApplicationName),
                field("AppShortName", Capability::ApplicationShortName),
                field("ThemeColor", Capability::ThemeColor),
                field("TileColor", Capability::TileColor),
                field("SiteIcon", Capability::WebsiteIcon),
                field("MobileIcon", Capability::MobileAppIcon),
            ],
        }
    }

    fn resolver(store: MemoryContentStore, types: &[ContentTypeDefinition]) -> SettingsResolver {
        SettingsResolver::new(
            Arc::new(store),
            Arc::new(PropertyLocator::new(types)),
            Arc::new(site()),
        )
    }

    #[test]
    fn missing_colors_default() {
        let types = [settings_type(true)];
        let resolver = resolver(MemoryContentStore::new(), &types);
        let record = ContentRecord::draft(ContentKind::Page, None)
            .with_content_type("StartPage")
            .with_field("SiteIcon", FieldValue::Reference(reference(10)));

        let settings = resolver.resolve(Some(&record)).expect("resolved settings");

        assert_eq!(settings.theme_color, DEFAULT_COLOR);
        assert_eq!(settings.tile_color, DEFAULT_COLOR);
        assert!(settings.display_favicons);
        assert!(!settings.mobile_web_app_capable);
        assert_eq!(settings.application_name, "Acme Site");
        assert_eq!(settings.application_short_name, "Acme Site");
        assert_eq!(settings.favicons_path, "siteassets/favicons");
    }

    #[test]
    fn configured_values_win() {
        let types = [settings_type(true)];
        let resolver = resolver(MemoryContentStore::new(), &types);
        let record = ContentRecord::draft(ContentKind::Page, None)
            .with_content_type("StartPage")
            .with_field("AppName", FieldValue::Text("Acme Corporation".into()))
            .with_field("AppShortName", FieldValue::Text("Acme".into()))
            .with_field("ThemeColor", FieldValue::Text("#112233".into()))
            .with_field("TileColor", FieldValue::Text("  ".into()))
            .with_field("SiteIcon", FieldValue::Empty)
            .with_field("MobileIcon", FieldValue::Reference(reference(11)));

        let settings = resolver.resolve(Some(&record)).expect("resolved settings");

        assert_eq!(settings.application_name, "Acme Corporation");
        assert_eq!(settings.application_short_name, "Acme");
        assert_eq!(settings.theme_color, "#112233");
        assert_eq!(settings.tile_color, DEFAULT_COLOR);
        assert!(!settings.display_favicons);
        assert!(settings.mobile_web_app_capable);
    }

    #[test]
    fn missing_record_is_loud() {
        let resolver = resolver(MemoryContentStore::new(), &[]);
        assert!(matches!(
            resolver.resolve(None),
            Err(AppError::NoSettingsRecord)
        ));
    }

    #[test]
    fn has_settings_checks_record_type() {
        let types = [settings_type(true)];
        let resolver = resolver(MemoryContentStore::new(), &types);
        let start = ContentRecord::draft(ContentKind::Page, None).with_content_type("StartPage");
        let media = ContentRecord::draft(ContentKind::Media, None);

        assert!(resolver.has_settings(&start));
        assert!(!resolver.has_settings(&media));
    }

    #[tokio::test]
    async fn no_settings_type_fails() {
        let store = MemoryContentStore::new();
        store.register_content_type(settings_type(false));
        let resolver = resolver(store, &[settings_type(false)]);

        let result = resolver.locate_settings_record().await;
        assert!(matches!(result, Err(AppError::NoSettingsRecord)));
    }

    #[tokio::test]
    async fn settings_type_without_instances_fails() {
        let store = MemoryContentStore::new();
        store.register_content_type(settings_type(true));
        let resolver = resolver(store, &[settings_type(true)]);

        let result = resolver.resolve_current().await;
        assert!(matches!(result, Err(AppError::NoSettingsRecord)));
    }

    #[tokio::test]
    async fn locates_first_instance_of_settings_type() {
        let store = MemoryContentStore::new();
        store.register_content_type(settings_type(true));
        let record = ContentRecord::draft(ContentKind::Page, None)
            .with_name("Home")
            .with_content_type("StartPage")
            .with_field("ThemeColor", FieldValue::Text("#ABCDEF".into()));
        store.save(record).await.expect("saved start page");
        let resolver = resolver(store, &[settings_type(true)]);

        let settings = resolver.resolve_current().await.expect("settings");
        assert_eq!(settings.theme_color, "#ABCDEF");
    }
}
