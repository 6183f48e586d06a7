//! Infrastructure adapters: storage, codec, site loading and telemetry.

pub mod blobs;
pub mod codec;
pub mod error;
pub mod memory;
pub mod site_file;
pub mod telemetry;
