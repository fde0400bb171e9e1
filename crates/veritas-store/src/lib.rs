//! Storage layer: directory-backed output store (dataset, key-value records,
//! usage events) and boot-manifest integrity checks.

mod error;
pub use error::StoreError;

pub mod manifest;
pub mod output;

pub use manifest::{EntryStatus, ManifestReport, verify_manifest};
pub use output::{OutputStore, UsageEvent};
