//! Saving a generated image to disk.
//!
//! Artifacts are named after the last path segment of their URL with a UTC timestamp
//! inserted before the extension, e.g. `out-0.jpg` becomes `out-0_20261018T101502123Z.jpg`.
//! Files are opened with create-new semantics, so an existing artifact is never overwritten.

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use color_eyre::{
    Result,
    eyre::{WrapErr as _, eyre},
};
use log::{debug, error, info};
use reqwest::{Client, Url};
use tokio::{
    fs::{self, File, OpenOptions},
    io::AsyncWriteExt,
    pin,
};
use tokio_stream::StreamExt;

/// `YYYYMMDDTHHMMSSmmmZ`, an ISO-8601 instant with `:`, `.` and `-` stripped
pub const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%3fZ";

/// Splits a file name like `path.extname` does: the extension starts at the last dot,
/// unless that dot is the first character.
pub fn split_extension(file_name: &str) -> (&str, &str) {
    match file_name.rfind('.') {
        Some(idx) if idx > 0 => file_name.split_at(idx),
        _ => (file_name, ""),
    }
}

/// The last non-empty path segment of `url`, ignoring query and fragment.
pub fn url_file_name(url: &str) -> Result<String> {
    let parsed = Url::parse(url).wrap_err_with(|| format!("Invalid artifact URL: {url}"))?;
    parsed
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
        .map(str::to_string)
        .ok_or_else(|| eyre!("Artifact URL has no file name: {url}"))
}

/// `<base>_<timestamp><ext>`, with `_<attempt>` after the timestamp for retries.
pub fn artifact_file_name(url_file_name: &str, now: DateTime<Utc>, attempt: u32) -> String {
    let (base, ext) = split_extension(url_file_name);
    let timestamp = now.format(TIMESTAMP_FORMAT);
    if attempt == 0 {
        format!("{base}_{timestamp}{ext}")
    } else {
        format!("{base}_{timestamp}_{attempt}{ext}")
    }
}

/// Creates `dir` and its parents if missing. Returns whether anything was created.
pub async fn ensure_dir(dir: &Path) -> Result<bool> {
    let exists = fs::try_exists(dir)
        .await
        .wrap_err_with(|| format!("Couldn't access {}", dir.display()))?;
    if exists {
        return Ok(false);
    }
    fs::create_dir_all(dir)
        .await
        .wrap_err_with(|| format!("Couldn't create {}", dir.display()))?;
    info!("{}", created_line(dir));
    Ok(true)
}

fn created_line(dir: &Path) -> String {
    format!("Created directory: {}", dir.display())
}

/// Creates a fresh artifact file in `dir` and returns it with its path.
async fn create_artifact(dir: &Path, url_file_name: &str) -> Result<(File, PathBuf)> {
    let now = Utc::now();
    let mut attempt = 0;
    loop {
        let path = dir.join(artifact_file_name(url_file_name, now, attempt));
        match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                debug!("{} exists already", path.display());
                attempt += 1;
            }
            Err(e) => {
                return Err(e).wrap_err_with(|| format!("Couldn't create {}", path.display()));
            }
        }
    }
}

/// Streams `url` into a new timestamped file inside `dir` and returns its path.
///
/// A file that was partially written before an error is left in place.
pub async fn download(client: &Client, url: &str, dir: &Path) -> Result<PathBuf> {
    let res = try_download(client, url, dir).await;
    if let Err(e) = &res {
        error!("Error downloading the file: {e:#}");
    }
    res
}

async fn try_download(client: &Client, url: &str, dir: &Path) -> Result<PathBuf> {
    let name = url_file_name(url)?;
    ensure_dir(dir).await?;
    let (mut file, path) = create_artifact(dir, &name).await?;

    let resp = client.get(url).send().await?.error_for_status()?;
    let stream = resp.bytes_stream();
    pin!(stream);

    let mut written = 0;
    while let Some(chunk) = stream.try_next().await? {
        file.write_all(&chunk).await?;
        written += chunk.len();
    }
    file.flush().await?;

    info!("Saved {written} bytes to {}", path.display());
    Ok(path)
}
