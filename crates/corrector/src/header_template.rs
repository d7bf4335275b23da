use std::time::Duration;

use anyhow::{Context, Result, bail};
use chrono::Datelike;
use tracing::warn;

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(30);

async fn download(url: &str) -> Result<String> {
    if let Some(path) = url.strip_prefix("file://") {
        return tokio::fs::read_to_string(path)
            .await
            .context(format!("Failed to read {path}"));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        bail!("Unsupported header url: {url}");
    }
    let client = reqwest::Client::builder()
        .timeout(DOWNLOAD_TIMEOUT)
        .build()?;
    let response = client.get(url).send().await?.error_for_status()?;
    Ok(response.text().await?)
}

/// Fetch the header template and substitute `yyyy` by the current year.
///
/// `None` when it cannot be fetched: headers are then left alone.
pub async fn load_header_template(url: &str) -> Option<Vec<String>> {
    match download(url).await {
        Ok(content) => {
            let year = chrono::Local::now().year().to_string();
            Some(
                content
                    .split('\n')
                    .map(|line| line.replace("yyyy", &year))
                    .collect(),
            )
        }
        Err(e) => {
            warn!("headers are not updated because {url} could not be read: {e:#}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_template_with_year() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("header");
        fs::write(&path, "(C) Copyright yyyy\nline two\n").unwrap();

        let lines = load_header_template(&format!("file://{}", path.display()))
            .await
            .unwrap();
        let year = chrono::Local::now().year();
        assert_eq!(lines[0], format!("(C) Copyright {year}"));
        assert_eq!(lines[1], "line two");
    }

    #[tokio::test]
    async fn test_missing_template_is_none() {
        let temp_dir = TempDir::new().unwrap();
        let url = format!("file://{}/absent", temp_dir.path().display());
        assert!(load_header_template(&url).await.is_none());
        assert!(load_header_template("ftp://example.org/header").await.is_none());
    }
}
