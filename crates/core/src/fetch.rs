use crate::error::IngestError;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;
use uuid::Uuid;

/// Downloads a PDF into `download_dir` and returns the saved path, which can
/// then be ingested like any local document.
pub async fn fetch_pdf(url: &str, download_dir: &Path) -> Result<PathBuf, IngestError> {
    let parsed = Url::parse(url)
        .map_err(|error| IngestError::Config(format!("invalid pdf url {url}: {error}")))?;

    let client = Client::builder()
        .timeout(Duration::from_secs(60))
        .build()
        .map_err(IngestError::Http)?;

    let response = client.get(parsed.clone()).send().await?;
    if !response.status().is_success() {
        return Err(IngestError::Download {
            url: url.to_string(),
            reason: format!("server answered {}", response.status()),
        });
    }
    let bytes = response.bytes().await?;

    tokio::fs::create_dir_all(download_dir).await?;
    let target = download_dir.join(filename_for(&parsed));
    tokio::fs::write(&target, &bytes).await?;
    Ok(target)
}

fn filename_for(url: &Url) -> String {
    let mut name = url
        .path_segments()
        .and_then(|segments| segments.last())
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_string())
        .unwrap_or_else(|| Uuid::new_v4().simple().to_string());

    if !name.to_lowercase().ends_with(".pdf") {
        name.push_str(".pdf");
    }
    name
}
