use std::path::Path;

use reqwest::Client;

use crate::{
    error::{Dash2HlsError, Dash2HlsResult},
    ProfileSet, Url,
};

/// Downloads a manifest.
pub async fn fetch_remote(client: &Client, url: &Url) -> Dash2HlsResult<String> {
    log::info!("Fetching manifest from {url}");
    let response = client
        .get(url.as_ref())
        .header("Accept", "application/dash+xml,video/vnd.mpeg.dash.mpd")
        .send()
        .await?;
    if !response.status().is_success() {
        let status = response.status();
        if let Ok(body) = response.text().await {
            log::warn!("Error body: {body}");
        }
        return Err(Dash2HlsError::HttpError(status));
    }

    Ok(response.text().await?)
}

/// Reads a manifest from disk.
pub async fn read_local<P>(path: P) -> Dash2HlsResult<String>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !tokio::fs::metadata(path)
        .await
        .is_ok_and(|metadata| metadata.is_file())
    {
        return Err(Dash2HlsError::InvalidPath(path.display().to_string()));
    }
    Ok(tokio::fs::read_to_string(path).await?)
}

impl ProfileSet {
    pub async fn from_remote(client: &Client, url: &Url) -> Dash2HlsResult<Self> {
        let text = fetch_remote(client, url).await?;
        Self::load(&text, Some(url))
    }

    /// Loads a manifest from disk.
    ///
    /// A local manifest has no url of its own, so relative templates need
    /// `base_url` unless the manifest declares an absolute `BaseURL`.
    pub async fn from_local<P>(path: P, base_url: Option<&Url>) -> Dash2HlsResult<Self>
    where
        P: AsRef<Path>,
    {
        let text = read_local(path).await?;
        Self::load(&text, base_url)
    }
}
