// src/fetch/mod.rs

use anyhow::Result;
use async_trait::async_trait;
use std::path::Path;

use crate::credentials::Credentials;

pub mod download;
pub mod listing;
pub mod local;

pub use listing::FolderListingFetch;
pub use local::LocalFolderFetch;

/// Brings the submitted spreadsheets from the shared store into `target_dir`.
#[async_trait]
pub trait FileFetch: Send + Sync {
    /// Returns the names of the files written into `target_dir`.
    async fn fetch(&self, credentials: &Credentials, target_dir: &Path) -> Result<Vec<String>>;
}
