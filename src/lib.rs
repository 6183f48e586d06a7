//! Favicon generation for a content-managed site.
//!
//! When the start page is published, the favicon settings are resolved from
//! whichever content record carries them, cached against the start page, and
//! a fixed catalog of icon, tile and splash PNGs is regenerated into the
//! favicons folder. `browserconfig.xml` and `manifest.json` are rendered from
//! the same settings, and peer instances are kept in step over an event bus.

pub mod application;
pub mod cache;
pub mod config;
pub mod domain;
pub mod infra;
pub mod sync;
