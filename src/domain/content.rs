//! Content model mirrored from the host content repository.
//!
//! Records are schema-less bags of named fields; the meaning of a field comes
//! from the capability tags its content type declares for it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Reference to a content item. References are never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContentRef(u64);

impl ContentRef {
    /// Build a reference, rejecting the empty (zero) reference.
    pub fn new(id: u64) -> Option<Self> {
        (id != 0).then_some(Self(id))
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ContentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    Folder,
    Page,
    Media,
}

/// Semantic role a content type assigns to one of its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ApplicationName,
    ApplicationShortName,
    ThemeColor,
    TileColor,
    WebsiteIcon,
    MobileAppIcon,
}

impl Capability {
    pub const ALL: [Capability; 6] = [
        Capability::ApplicationName,
        Capability::ApplicationShortName,
        Capability::ThemeColor,
        Capability::TileColor,
        Capability::WebsiteIcon,
        Capability::MobileAppIcon,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Capability::ApplicationName => "application_name",
            Capability::ApplicationShortName => "application_short_name",
            Capability::ThemeColor => "theme_color",
            Capability::TileColor => "tile_color",
            Capability::WebsiteIcon => "website_icon",
            Capability::MobileAppIcon => "mobile_app_icon",
        }
    }
}

/// Raw value held by a content field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    Text(String),
    Reference(ContentRef),
    Empty,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub name: String,
    #[serde(default)]
    pub capabilities: Vec<Capability>,
}

/// Registered content type and the capabilities of its fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentTypeDefinition {
    pub id: String,
    /// Marks the type whose instance carries the favicon configuration.
    #[serde(default)]
    pub contains_settings: bool,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

impl ContentTypeDefinition {
    /// First field tagged with the capability, in declaration order.
    pub fn field_for(&self, capability: Capability) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|field| field.capabilities.contains(&capability))
    }
}

/// Location of binary data owned by a media record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub container: String,
    pub name: String,
    pub checksum: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentRecord {
    /// `None` until the record has been saved.
    pub reference: Option<ContentRef>,
    pub kind: ContentKind,
    pub content_type: Option<String>,
    pub name: String,
    pub parent: Option<ContentRef>,
    pub fields: BTreeMap<String, FieldValue>,
    pub blob: Option<BlobRef>,
}

impl ContentRecord {
    /// Unsaved record of the given kind placed under `parent`.
    pub fn draft(kind: ContentKind, parent: Option<ContentRef>) -> Self {
        Self {
            reference: None,
            kind,
            content_type: None,
            name: String::new(),
            parent,
            fields: BTreeMap::new(),
            blob: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_field(mut self, name: impl Into<String>, value: FieldValue) -> Self {
        self.fields.insert(name.into(), value);
        self
    }

    pub fn with_blob(mut self, blob: BlobRef) -> Self {
        self.blob = Some(blob);
        self
    }

    pub fn field(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }

    pub fn is_folder(&self) -> bool {
        self.kind == ContentKind::Folder
    }
}
