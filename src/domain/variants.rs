//! Static catalog of every icon variant produced for a site.

use std::fmt;

/// One resized output: `<prefix>-<width>x<height>.png`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct VariantSpec {
    pub prefix: &'static str,
    pub width: u32,
    pub height: u32,
}

impl VariantSpec {
    const fn new(prefix: &'static str, width: u32, height: u32) -> Self {
        Self {
            prefix,
            width,
            height,
        }
    }

    const fn square(prefix: &'static str, size: u32) -> Self {
        Self::new(prefix, size, size)
    }

    pub fn file_name(&self) -> String {
        format!("{}-{}x{}.png", self.prefix, self.width, self.height)
    }

    /// `sizes` attribute value, e.g. `192x192`.
    pub fn sizes(&self) -> String {
        format!("{}x{}", self.width, self.height)
    }
}

impl fmt::Display for VariantSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}x{}", self.prefix, self.width, self.height)
    }
}

/// Which catalog table a pipeline run iterates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantFamily {
    Icons,
    Splash,
}

impl VariantFamily {
    pub fn variants(self) -> &'static [VariantSpec] {
        match self {
            VariantFamily::Icons => icon_variants(),
            VariantFamily::Splash => splash_variants(),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            VariantFamily::Icons => "icons",
            VariantFamily::Splash => "splash",
        }
    }
}

pub const APPLE_TOUCH_ICON: &str = "apple-touch-icon";
pub const MSTILE: &str = "mstile";
pub const ANDROID_CHROME: &str = "android-chrome";
pub const FAVICON: &str = "favicon";
pub const APPLE_TOUCH_STARTUP_IMAGE: &str = "apple-touch-startup-image";

const ICON_VARIANTS: [VariantSpec; 23] = [
    VariantSpec::square(APPLE_TOUCH_ICON, 57),
    VariantSpec::square(APPLE_TOUCH_ICON, 60),
    VariantSpec::square(APPLE_TOUCH_ICON, 72),
    VariantSpec::square(APPLE_TOUCH_ICON, 76),
    VariantSpec::square(APPLE_TOUCH_ICON, 114),
    VariantSpec::square(APPLE_TOUCH_ICON, 120),
    VariantSpec::square(APPLE_TOUCH_ICON, 144),
    VariantSpec::square(APPLE_TOUCH_ICON, 152),
    VariantSpec::square(APPLE_TOUCH_ICON, 180),
    VariantSpec::square(MSTILE, 70),
    VariantSpec::square(MSTILE, 150),
    VariantSpec::square(MSTILE, 310),
    VariantSpec::new(MSTILE, 310, 150),
    VariantSpec::square(ANDROID_CHROME, 36),
    VariantSpec::square(ANDROID_CHROME, 48),
    VariantSpec::square(ANDROID_CHROME, 72),
    VariantSpec::square(ANDROID_CHROME, 96),
    VariantSpec::square(ANDROID_CHROME, 144),
    VariantSpec::square(ANDROID_CHROME, 192),
    VariantSpec::square(FAVICON, 16),
    VariantSpec::square(FAVICON, 32),
    VariantSpec::square(FAVICON, 96),
    VariantSpec::square(FAVICON, 192),
];

// 640x1096 appears twice; writers de-duplicate by file name.
const SPLASH_VARIANTS: [VariantSpec; 8] = [
    VariantSpec::new(APPLE_TOUCH_STARTUP_IMAGE, 1536, 2008),
    VariantSpec::new(APPLE_TOUCH_STARTUP_IMAGE, 1496, 2048),
    VariantSpec::new(APPLE_TOUCH_STARTUP_IMAGE, 768, 1004),
    VariantSpec::new(APPLE_TOUCH_STARTUP_IMAGE, 748, 1024),
    VariantSpec::new(APPLE_TOUCH_STARTUP_IMAGE, 640, 1096),
    VariantSpec::new(APPLE_TOUCH_STARTUP_IMAGE, 640, 1096),
    VariantSpec::new(APPLE_TOUCH_STARTUP_IMAGE, 640, 920),
    VariantSpec::new(APPLE_TOUCH_STARTUP_IMAGE, 320, 460),
];

/// Main icon family: touch icons, tiles, android and classic favicons.
pub fn icon_variants() -> &'static [VariantSpec] {
    &ICON_VARIANTS
}

/// Mobile splash screens generated from the mobile app icon.
pub fn splash_variants() -> &'static [VariantSpec] {
    &SPLASH_VARIANTS
}

/// Android chrome icons listed in `manifest.json`, paired with their density.
pub const MANIFEST_ICONS: [(u32, &str); 6] = [
    (36, "0.75"),
    (48, "1.0"),
    (72, "1.5"),
    (96, "2.0"),
    (144, "3.0"),
    (192, "4.0"),
];
