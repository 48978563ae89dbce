use anyhow::{Context, Result};
use futures_util::StreamExt;
use reqwest::Client;
use tempfile::NamedTempFile;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};
use url::Url;

const PROGRESS_STEP_BYTES: u64 = 10 * 1024 * 1024;

/// Stream `url_str` into a temporary file named after the last URL segment.
/// The file is deleted when the returned handle is dropped; read it back
/// through `NamedTempFile::reopen`.
///
/// Only one network-sized piece of the body is held in memory at a time.
#[instrument(level = "info", skip(client))]
pub async fn download_to_tempfile(client: &Client, url_str: &str) -> Result<NamedTempFile> {
    let url = Url::parse(url_str).with_context(|| format!("parsing download URL {}", url_str))?;
    let filename = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|name| !name.is_empty())
        .unwrap_or("download.csv");

    let tmp = tempfile::Builder::new()
        .prefix("taxi-ingest-")
        .suffix(&format!("-{}", filename))
        .tempfile()
        .context("creating temporary download file")?;
    let mut out = tokio::fs::File::from_std(
        tmp.reopen()
            .context("opening temporary download file for writing")?,
    );

    let response = client
        .get(url.as_str())
        .send()
        .await
        .with_context(|| format!("GET {}", url))?
        .error_for_status()
        .with_context(|| format!("downloading {}", url))?;

    let mut stream = response.bytes_stream();
    let mut total = 0u64;
    let mut next_report = PROGRESS_STEP_BYTES;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.with_context(|| format!("reading body from {}", url))?;
        out.write_all(&chunk)
            .await
            .context("writing to temporary download file")?;
        total += chunk.len() as u64;

        if total >= next_report {
            debug!("downloaded {} MB", total / (1024 * 1024));
            next_report += PROGRESS_STEP_BYTES;
        }
    }
    out.flush().await.context("flushing temporary download file")?;

    info!(bytes = total, path = %tmp.path().display(), "download complete");
    Ok(tmp)
}
