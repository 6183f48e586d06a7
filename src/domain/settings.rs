//! Resolved favicon settings for one site.

use serde::Serialize;

/// Color used for the theme and tile when the settings record leaves them unset.
pub const DEFAULT_COLOR: &str = "#1E1E1E";

/// Immutable snapshot of the favicon configuration.
///
/// Replaced wholesale whenever the settings record changes; never patched
/// field by field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FaviconSettings {
    pub theme_color: String,
    pub tile_color: String,
    /// A website icon is configured.
    pub display_favicons: bool,
    /// A mobile app icon is configured.
    pub mobile_web_app_capable: bool,
    /// Virtual base path the icons are served from, without slashes.
    pub favicons_path: String,
    pub application_name: String,
    pub application_short_name: String,
}

/// Returns the trimmed value, or `fallback` when the value is missing or blank.
pub(crate) fn non_blank_or(value: Option<String>, fallback: &str) -> String {
    match value {
        Some(value) if !value.trim().is_empty() => value.trim().to_string(),
        _ => fallback.to_string(),
    }
}
