//! Domain layer types and invariants.

pub mod content;
pub mod settings;
pub mod site;
pub mod variants;
