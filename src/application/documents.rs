//! Companion documents served next to the generated icons.

use serde::Serialize;

use crate::domain::settings::FaviconSettings;
use crate::domain::variants::{ANDROID_CHROME, MANIFEST_ICONS, MSTILE, VariantSpec};

const PNG_MIME: &str = "image/png";

/// Render `browserconfig.xml` for Windows tiles.
pub fn browserconfig_xml(settings: &FaviconSettings) -> String {
    let tile = |element: &str, width: u32, height: u32| {
        format!(
            "      <{element} src=\"{}\"/>\n",
            xml_escape(&icon_src(
                &settings.favicons_path,
                &VariantSpec {
                    prefix: MSTILE,
                    width,
                    height,
                },
            ))
        )
    };

    let mut logos = String::new();
    logos.push_str(&tile("square70x70logo", 70, 70));
    logos.push_str(&tile("square150x150logo", 150, 150));
    logos.push_str(&tile("square310x310logo", 310, 310));
    logos.push_str(&tile("wide310x150logo", 310, 150));

    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\"?>\n<browserconfig>\n  <msapplication>\n    <tile>\n{}      <TileColor>{}</TileColor>\n    </tile>\n  </msapplication>\n</browserconfig>\n",
        logos,
        xml_escape(&settings.tile_color)
    )
}

#[derive(Debug, Serialize)]
struct WebManifest<'a> {
    short_name: &'a str,
    name: &'a str,
    icons: Vec<ManifestIcon>,
}

#[derive(Debug, Serialize)]
struct ManifestIcon {
    src: String,
    sizes: String,
    #[serde(rename = "type")]
    mime_type: &'static str,
    density: &'static str,
}

/// Render the web app `manifest.json` as pretty-printed JSON.
pub fn manifest_json(settings: &FaviconSettings) -> serde_json::Result<String> {
    let icons = MANIFEST_ICONS
        .iter()
        .map(|&(size, density)| {
            let variant = VariantSpec {
                prefix: ANDROID_CHROME,
                width: size,
                height: size,
            };
            ManifestIcon {
                src: icon_src(&settings.favicons_path, &variant),
                sizes: variant.sizes(),
                mime_type: PNG_MIME,
                density,
            }
        })
        .collect();

    let manifest = WebManifest {
        short_name: &settings.application_short_name,
        name: &settings.application_name,
        icons,
    };
    serde_json::to_string_pretty(&manifest)
}

fn icon_src(base: &str, variant: &VariantSpec) -> String {
    format!("/{}/{}", base.trim_matches('/'), variant.file_name())
}

fn xml_escape(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::domain::content::ContentRef;
    use crate::domain::settings::DEFAULT_COLOR;
    use crate::domain::site::SiteDefinition;

    fn settings() -> FaviconSettings {
        FaviconSettings {
            theme_color: DEFAULT_COLOR.to_string(),
            tile_color: DEFAULT_COLOR.to_string(),
            display_favicons: true,
            mobile_web_app_capable: false,
            favicons_path: "siteassets/favicons".to_string(),
            application_name: "Acme Corporation".to_string(),
            application_short_name: "Acme".to_string(),
        }
    }

    #[test]
    fn browserconfig_lists_tiles() {
        insta::assert_snapshot!(browserconfig_xml(&settings()), @r#"
        <?xml version="1.0" encoding="utf-8"?>
        <browserconfig>
          <msapplication>
            <tile>
              <square70x70logo src="/siteassets/favicons/mstile-70x70.png"/>
              <square150x150logo src="/siteassets/favicons/mstile-150x150.png"/>
              <square310x310logo src="/siteassets/favicons/mstile-310x310.png"/>
              <wide310x150logo src="/siteassets/favicons/mstile-310x150.png"/>
              <TileColor>#1E1E1E</TileColor>
            </tile>
          </msapplication>
        </browserconfig>
        "#);
    }

    #[test]
    fn browserconfig_escapes_tile_color() {
        let mut settings = settings();
        settings.tile_color = "<red & blue>".to_string();
        let xml = browserconfig_xml(&settings);
        assert!(xml.contains("<TileColor>&lt;red &amp; blue&gt;</TileColor>"));
    }

    #[test]
    fn manifest_lists_android_icons() {
        let json = manifest_json(&settings()).expect("manifest json");
        let manifest: Value = serde_json::from_str(&json).expect("valid json");

        assert_eq!(manifest["short_name"], "Acme");
        assert_eq!(manifest["name"], "Acme Corporation");

        let icons = manifest["icons"].as_array().expect("icons array");
        assert_eq!(icons.len(), 6);
        assert_eq!(icons[0]["src"], "/siteassets/favicons/android-chrome-36x36.png");
        assert_eq!(icons[0]["density"], "0.75");

        let largest = &icons[5];
        assert_eq!(largest["sizes"], "192x192");
        assert_eq!(largest["type"], "image/png");
        assert_eq!(largest["density"], "4.0");
    }

    #[test]
    fn manifest_uses_global_path() {
        let reference = |id| ContentRef::new(id).expect("non-zero reference");
        let site = SiteDefinition {
            name: "Acme".to_string(),
            start_page: reference(1),
            site_assets_root: None,
            global_assets_root: reference(2),
        };
        let mut settings = settings();
        settings.favicons_path = site.favicons_path().to_string();
        let json = manifest_json(&settings).expect("manifest json");
        assert!(json.contains("/globalassets/favicons/android-chrome-192x192.png"));
    }
}
