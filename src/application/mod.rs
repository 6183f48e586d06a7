//! Favicon services: settings resolution, icon generation and documents.

pub mod documents;
pub mod error;
pub mod locator;
pub mod pipeline;
pub mod publish;
pub mod repos;
pub mod resolver;
