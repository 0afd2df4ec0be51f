use anyhow::{Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{info, warn};

use super::FileFetch;
use crate::credentials::Credentials;

/// Copies spreadsheets from a mounted share (or any local folder).
/// Credentials are accepted for interface parity and otherwise unused.
pub struct LocalFolderFetch {
    source_dir: PathBuf,
    extension: String,
}

impl LocalFolderFetch {
    pub fn new(source_dir: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            source_dir: source_dir.into(),
            extension: extension.to_lowercase(),
        }
    }
}

#[async_trait]
impl FileFetch for LocalFolderFetch {
    async fn fetch(&self, _credentials: &Credentials, target_dir: &Path) -> Result<Vec<String>> {
        fs::create_dir_all(target_dir)
            .await
            .with_context(|| format!("creating {}", target_dir.display()))?;

        let mut entries = fs::read_dir(&self.source_dir)
            .await
            .with_context(|| format!("reading {}", self.source_dir.display()))?;
        let mut names = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().to_string();
            if !entry.file_type().await?.is_file()
                || !name.to_lowercase().ends_with(&self.extension)
            {
                continue;
            }
            let dest = target_dir.join(&name);
            fs::copy(entry.path(), &dest)
                .await
                .with_context(|| format!("copying {name}"))?;
            info!(name = %name, dest = %dest.display(), "downloaded");
            names.push(name);
        }

        if names.is_empty() {
            warn!(source = %self.source_dir.display(), "no files found in the folder");
        }
        names.sort();
        Ok(names)
    }
}
