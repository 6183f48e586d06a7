//! Cache key definitions.

use std::borrow::Cow;
use std::fmt;

use crate::domain::content::ContentRef;

/// Something whose change invalidates cached values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntityKey {
    /// A content item, typically the site start page.
    Content(ContentRef),
}

/// Name of a cached value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(Cow<'static, str>);

impl CacheKey {
    /// Resolved favicon settings of the current site.
    pub const FAVICON_SETTINGS: CacheKey = CacheKey(Cow::Borrowed("FaviconSettings"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
