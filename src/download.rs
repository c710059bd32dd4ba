use std::{
    fmt, io,
    path::{Path, PathBuf},
    time::Duration,
};

use indicatif::{ProgressBar, ProgressStyle};
use reqwest::{Client, StatusCode};
use tokio::{fs::File, io::AsyncWriteExt, time::sleep};

use crate::{utils, warning};

const MAX_ATTEMPTS: u32 = 3;

#[derive(Debug)]
pub enum DownloadError {
    Http(reqwest::Error),
    Io(io::Error),
    Status(StatusCode),
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        DownloadError::Http(err)
    }
}

impl From<io::Error> for DownloadError {
    fn from(err: io::Error) -> Self {
        DownloadError::Io(err)
    }
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DownloadError::Http(e) => write!(f, "download failed: {}", e),
            DownloadError::Io(e) => write!(f, "cannot write download: {}", e),
            DownloadError::Status(s) => write!(f, "download failed with status {}", s),
        }
    }
}

impl std::error::Error for DownloadError {}

impl DownloadError {
    fn is_retryable(&self) -> bool {
        match self {
            DownloadError::Http(e) => e.is_connect() || e.is_timeout() || e.is_body(),
            DownloadError::Status(s) => s.is_server_error() || *s == StatusCode::TOO_MANY_REQUESTS,
            DownloadError::Io(_) => false,
        }
    }
}

/// Byte progress bar for one file.
pub fn file_progress(label: &str) -> ProgressBar {
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template(
            "{msg:30!} [{bar:30.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec})",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("=> "),
    );
    pb.set_message(label.to_string());
    pb
}

/// Streams `url` into `dest`, retrying transient failures. A partially
/// written file is removed before each retry and on final failure.
pub async fn download_to(
    client: &Client,
    url: &str,
    dest: &Path,
    pb: &ProgressBar,
) -> Result<u64, DownloadError> {
    let mut attempt = 1;
    loop {
        match fetch_once(client, url, dest, pb).await {
            Ok(written) => return Ok(written),
            Err(e) => {
                let _ = async_fs::remove_file(dest).await;
                if !e.is_retryable() || attempt >= MAX_ATTEMPTS {
                    return Err(e);
                }
                warning!("{}, retrying ({}/{})...", e, attempt, MAX_ATTEMPTS);
                sleep(Duration::from_secs(2 * attempt as u64)).await;
                attempt += 1;
            }
        }
    }
}

async fn fetch_once(
    client: &Client,
    url: &str,
    dest: &Path,
    pb: &ProgressBar,
) -> Result<u64, DownloadError> {
    let mut response = client.get(url).send().await?;
    if !response.status().is_success() {
        return Err(DownloadError::Status(response.status()));
    }

    pb.set_position(0);
    if let Some(len) = response.content_length() {
        pb.set_length(len);
    }

    let mut file = File::create(dest).await?;
    let mut written = 0u64;
    while let Some(chunk) = response.chunk().await? {
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
        pb.set_position(written);
    }
    file.flush().await?;

    Ok(written)
}

/// Downloads a song into the temp directory as `<song id>-<random>.part`.
pub async fn download_song(
    client: &Client,
    url: &str,
    songs_dir: &Path,
    song_id: u64,
    pb: &ProgressBar,
) -> Result<PathBuf, DownloadError> {
    async_fs::create_dir_all(songs_dir).await?;
    let dest = songs_dir.join(format!("{}-{}.part", song_id, utils::random_suffix(8)));
    download_to(client, url, &dest, pb).await?;
    Ok(dest)
}

/// Downloads a cover image once; an existing file is reused.
pub async fn download_cover(client: &Client, url: &str, dest: &Path) -> Result<PathBuf, DownloadError> {
    if dest.is_file() {
        return Ok(dest.to_path_buf());
    }
    if let Some(parent) = dest.parent() {
        async_fs::create_dir_all(parent).await?;
    }

    let part = dest.with_extension(format!("{}.part", utils::random_suffix(6)));
    download_to(client, url, &part, &ProgressBar::hidden()).await?;
    async_fs::rename(&part, dest).await?;
    Ok(dest.to_path_buf())
}
