// src/fetch/listing.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use scraper::{Html, Selector};
use std::{path::Path, time::Duration};
use tokio::time::sleep;
use tracing::{info, instrument, warn};
use url::Url;

use super::{download::download_file, FileFetch};
use crate::{config::StoreConfig, credentials::Credentials};

const MAX_RETRIES: usize = 3;
const RETRY_DELAY: Duration = Duration::from_secs(1);

/// Fetches every spreadsheet linked from the document library's folder page.
pub struct FolderListingFetch {
    client: Client,
    folder_url: Url,
    extension: String,
}

impl FolderListingFetch {
    pub fn new(client: Client, store: &StoreConfig) -> Result<Self> {
        let folder_url = Url::parse(&store.folder_url())
            .with_context(|| format!("parsing folder URL {}", store.folder_url()))?;
        Ok(Self {
            client,
            folder_url,
            extension: store.extension.clone(),
        })
    }

    async fn list_links(&self, credentials: &Credentials) -> Result<Vec<Url>> {
        let mut attempt = 0;
        loop {
            attempt += 1;

            let resp = self
                .client
                .get(self.folder_url.as_str())
                .basic_auth(&credentials.username, Some(&credentials.password))
                .send()
                .await;
            match resp {
                Ok(resp) if resp.status().is_success() => match resp.text().await {
                    Ok(html) => return extract_links(&html, &self.folder_url, &self.extension),
                    Err(_) if attempt < MAX_RETRIES => {
                        sleep(RETRY_DELAY).await;
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                },
                Err(_) if attempt < MAX_RETRIES => {
                    sleep(RETRY_DELAY).await;
                    continue;
                }
                Ok(resp) => return Err(anyhow!("HTTP error: {}", resp.status())),
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl FileFetch for FolderListingFetch {
    #[instrument(
        level = "info",
        skip(self, credentials),
        fields(folder = %self.folder_url, target = %target_dir.display())
    )]
    async fn fetch(&self, credentials: &Credentials, target_dir: &Path) -> Result<Vec<String>> {
        tokio::fs::create_dir_all(target_dir)
            .await
            .with_context(|| format!("creating {}", target_dir.display()))?;

        let links = self.list_links(credentials).await?;
        if links.is_empty() {
            warn!("no files found in the folder");
            return Ok(Vec::new());
        }

        let mut names = Vec::with_capacity(links.len());
        for link in links {
            let path = download_file(&self.client, &link, credentials, target_dir).await?;
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default();
            info!(name = %name, dest = %path.display(), "downloaded");
            names.push(name);
        }
        Ok(names)
    }
}

/// All `<a href>` targets on the page ending in `extension`, resolved against `base`.
pub fn extract_links(html: &str, base: &Url, extension: &str) -> Result<Vec<Url>> {
    let selector = Selector::parse("a[href]").map_err(|e| anyhow!("invalid selector: {e:?}"))?;
    let ext = extension.to_lowercase();

    Ok(Html::parse_document(html)
        .select(&selector)
        .filter_map(|e| e.value().attr("href"))
        .filter(|href| {
            href.split(['?', '#'])
                .next()
                .is_some_and(|p| p.to_lowercase().ends_with(&ext))
        })
        .filter_map(|href| base.join(href).ok())
        .collect())
}
