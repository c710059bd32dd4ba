//! Configuration management for grabnetease.
//!
//! Values come from environment variables, optionally seeded from a `.env`
//! file in the local data directory. Variables already present in the
//! process environment win over the file. Every accessor falls back to a
//! default so the tool runs without any configuration against a local API
//! server on port 9979.

use std::{env, path::PathBuf, time::Duration};

use crate::types::AudioQuality;

pub const APP_DIR: &str = "grabnetease";

const DEFAULT_API_PORT: u16 = 9979;
const DEFAULT_API_SCRIPT: &str = "NeteaseCloudMusicApi/node_modules/NeteaseCloudMusicApi/app.js";
const DEFAULT_DOWNLOAD_DIR: &str = "Download";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Loads environment variables from `<data_local_dir>/grabnetease/.env`.
///
/// A missing file is not an error; a file that exists but cannot be parsed
/// is.
///
/// # Directory Structure
///
/// - Linux: `~/.local/share/grabnetease/.env`
/// - macOS: `~/Library/Application Support/grabnetease/.env`
/// - Windows: `%LOCALAPPDATA%/grabnetease/.env`
pub async fn load_env() -> Result<(), String> {
    let path = data_dir().join(".env");
    if let Some(parent) = path.parent() {
        async_fs::create_dir_all(parent)
            .await
            .map_err(|e| e.to_string())?;
    }

    if path.is_file() {
        dotenv::from_path(&path).map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Per-user data directory holding the session, the `.env` file and the
/// last login QR code.
pub fn data_dir() -> PathBuf {
    let mut path = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(APP_DIR);
    path
}

/// Port of the NeteaseCloudMusicApi server (`NETEASE_API_PORT`).
pub fn api_port() -> u16 {
    env::var("NETEASE_API_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_API_PORT)
}

/// Base URL of the API server (`NETEASE_API_URL`), defaulting to
/// `http://localhost:<port>`.
pub fn api_url() -> String {
    env::var("NETEASE_API_URL")
        .ok()
        .filter(|u| !u.trim().is_empty())
        .unwrap_or_else(|| format!("http://localhost:{}", api_port()))
}

/// Entry script of the node API server (`NETEASE_API_SCRIPT`).
pub fn api_script() -> PathBuf {
    env::var("NETEASE_API_SCRIPT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_API_SCRIPT))
}

/// Whether to launch the node API server ourselves (`NETEASE_API_SPAWN`).
pub fn spawn_api_server() -> bool {
    env_flag("NETEASE_API_SPAWN")
}

/// Root of the download tree (`GRAB_DOWNLOAD_DIR`).
pub fn download_dir() -> PathBuf {
    env::var("GRAB_DOWNLOAD_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_DOWNLOAD_DIR))
}

/// Default quality level (`GRAB_QUALITY`); unknown values fall back to
/// `exhigh`.
pub fn quality() -> AudioQuality {
    env::var("GRAB_QUALITY")
        .ok()
        .and_then(|q| q.parse().ok())
        .unwrap_or_default()
}

/// Timeout for a single HTTP request (`GRAB_HTTP_TIMEOUT`, seconds).
pub fn http_timeout() -> Duration {
    let secs = env::var("GRAB_HTTP_TIMEOUT")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|s| *s > 0)
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Verbose output (`GRAB_DEBUG`).
pub fn debug_enabled() -> bool {
    env_flag("GRAB_DEBUG")
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(false)
}

/// Layout of the download tree:
///
/// ```text
/// <root>/Covers/<AlbumID>.jpg
/// <root>/Songs/<temp files>
/// <root>/MusicLibrary/<Artist>/<Year>-<Album>/<Disc>-<Track>-<Name>.<ext>
/// ```
#[derive(Debug, Clone)]
pub struct DownloadLayout {
    root: PathBuf,
}

impl DownloadLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &PathBuf {
        &self.root
    }

    pub fn covers(&self) -> PathBuf {
        self.root.join("Covers")
    }

    pub fn songs(&self) -> PathBuf {
        self.root.join("Songs")
    }

    pub fn library(&self) -> PathBuf {
        self.root.join("MusicLibrary")
    }

    pub fn cover_for(&self, album_id: u64) -> PathBuf {
        self.covers().join(format!("{}.jpg", album_id))
    }
}
