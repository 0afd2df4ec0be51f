use anyhow::{Context, Result};
use reqwest::Client;
use std::path::{Component, Path, PathBuf};
use tokio::fs;
use url::Url;

use crate::credentials::Credentials;

/// Download `url` into `dest_dir` under its (percent-decoded) last path segment.
/// Returns the full path of the saved file.
pub async fn download_file(
    client: &Client,
    url: &Url,
    credentials: &Credentials,
    dest_dir: impl AsRef<Path>,
) -> Result<PathBuf> {
    let dest_dir = dest_dir.as_ref();
    let filename =
        file_name_of(url).with_context(|| format!("no usable file name in link {url}"))?;
    let dest_path = dest_dir.join(filename);

    fs::create_dir_all(dest_dir)
        .await
        .with_context(|| format!("creating {}", dest_dir.display()))?;

    let bytes = client
        .get(url.as_str())
        .basic_auth(&credentials.username, Some(&credentials.password))
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()?
        .bytes()
        .await
        .with_context(|| format!("reading body from {}", url))?;
    fs::write(&dest_path, &bytes)
        .await
        .with_context(|| format!("writing {}", dest_path.display()))?;

    Ok(dest_path)
}

/// Last path segment, percent-decoded, reduced to a single plain file name.
/// Segments that decode to a directory component (`..`, `a/b`) are refused.
pub fn file_name_of(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.last()?;
    let decoded = urlencoding::decode(segment).ok()?;

    let mut components = Path::new(decoded.as_ref()).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(name)), None) => Some(name.to_string_lossy().into_owned()),
        _ => None,
    }
}
