//! Favicon settings cache.
//!
//! `ObjectCache` is a small in-process stand-in for the host object cache:
//! entries carry entity dependencies and are dropped when one of them is
//! evicted. `SettingsCache` keeps the resolved `FaviconSettings` in it under
//! a fixed key that depends on the site start page.

mod config;
mod keys;
mod lock;
mod registry;
mod settings;
mod store;

pub use config::CacheConfig;
pub use keys::{CacheKey, EntityKey};
pub(crate) use lock::{rw_read, rw_write};
pub use registry::CacheRegistry;
pub use settings::{SettingsCache, SettingsProvider};
pub use store::{CacheProvider, ObjectCache};
