//! Dataset Download
//! Fetches the source CSV once. Failures are logged, never retried, and
//! never leave a partial file behind.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Google Drive export of the LA crime dataset.
pub const DEFAULT_SOURCE_URL: &str =
    "https://drive.google.com/uc?export=download&id=1SdKIbIm3SrLa9XtQxlCZXHklp3w8FGEi";

/// Bytes read from the response per write.
pub const CHUNK_SIZE: usize = 8192;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    AlreadyPresent,
    Downloaded { bytes: u64 },
    Failed(String),
}

#[derive(Error, Debug)]
enum DownloadError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded with {0}")]
    Status(reqwest::StatusCode),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Download `url` to `path` unless `path` already exists.
pub fn ensure_dataset(url: &str, path: &Path) -> DownloadOutcome {
    if path.exists() {
        log::info!("File already exists at {}", path.display());
        return DownloadOutcome::AlreadyPresent;
    }

    log::info!("Downloading {url} to {}", path.display());
    match fetch(url, path) {
        Ok(bytes) => {
            log::info!("Download complete: {} ({bytes} bytes)", path.display());
            DownloadOutcome::Downloaded { bytes }
        }
        Err(e) => {
            log::error!("Failed to download {url}: {e}");
            DownloadOutcome::Failed(e.to_string())
        }
    }
}

fn fetch(url: &str, path: &Path) -> Result<u64, DownloadError> {
    let mut response = reqwest::blocking::get(url)?;
    let status = response.status();
    if !status.is_success() {
        return Err(DownloadError::Status(status));
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    let part = partial_path(path);
    let result = stream_to(&mut response, &part).and_then(|bytes| {
        fs::rename(&part, path)?;
        Ok(bytes)
    });
    if result.is_err() {
        let _ = fs::remove_file(&part);
    }
    result
}

/// Sibling path the body is streamed into before the final rename.
fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".part");
    path.with_file_name(name)
}

fn stream_to(reader: &mut impl Read, dest: &Path) -> Result<u64, DownloadError> {
    let mut file = File::create(dest)?;
    let mut buf = [0u8; CHUNK_SIZE];
    let mut total = 0u64;

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        file.write_all(&buf[..n])?;
        total += n as u64;
    }

    file.flush()?;
    Ok(total)
}
