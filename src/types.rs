use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::library::Track;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub cookie: String,
    pub user_id: Option<u64>,
    pub nickname: Option<String>,
    pub obtained_at: u64,
}

/// Bit-rate level requested from `/song/url/v1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioQuality {
    /// 128kbps
    Standard,
    /// 192kbps
    Higher,
    /// 320kbps
    #[default]
    Exhigh,
    /// FLAC
    Lossless,
    /// Hi-Res FLAC
    Hires,
}

impl AudioQuality {
    pub fn level(&self) -> &'static str {
        match self {
            AudioQuality::Standard => "standard",
            AudioQuality::Higher => "higher",
            AudioQuality::Exhigh => "exhigh",
            AudioQuality::Lossless => "lossless",
            AudioQuality::Hires => "hires",
        }
    }
}

impl fmt::Display for AudioQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.level())
    }
}

impl FromStr for AudioQuality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" => Ok(AudioQuality::Standard),
            "higher" => Ok(AudioQuality::Higher),
            "exhigh" => Ok(AudioQuality::Exhigh),
            "lossless" => Ok(AudioQuality::Lossless),
            "hires" => Ok(AudioQuality::Hires),
            other => Err(format!(
                "unknown quality '{other}', expected one of: standard, higher, exhigh, lossless, hires"
            )),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrKeyResponse {
    pub data: QrKeyData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrKeyData {
    pub unikey: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrCreateResponse {
    pub data: QrCreateData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrCreateData {
    pub qrurl: String,
    #[serde(default)]
    pub qrimg: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QrCheckResponse {
    pub code: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub cookie: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QrStatus {
    Expired,
    Waiting,
    Scanned,
    Authorized(String),
    Unknown(i64),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginStatusResponse {
    pub data: LoginStatusData,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginStatusData {
    #[serde(default)]
    pub profile: Option<Profile>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub user_id: u64,
    pub nickname: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlbumResponse {
    pub album: Album,
    #[serde(default)]
    pub songs: Vec<Song>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub publish_time: Option<i64>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub pic_url: Option<String>,
    #[serde(default)]
    pub size: Option<u32>,
    #[serde(default)]
    pub artist: Option<ArtistRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtistRef {
    pub id: u64,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Song {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub no: Option<u32>,
    #[serde(default)]
    pub cd: Option<String>,
    #[serde(default)]
    pub ar: Vec<ArtistRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongUrlResponse {
    pub data: Vec<SongUrl>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SongUrl {
    pub id: u64,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub size: Option<u64>,
    #[serde(default)]
    pub br: Option<u64>,
}

/// A track of a fetched album, still waiting to be downloaded.
///
/// The format is decided once the download URL is resolved, so `track`
/// carries a provisional format until then.
#[derive(Debug, Clone)]
pub struct AlbumTrack {
    pub song_id: u64,
    pub track: Track,
}

#[derive(Tabled)]
pub struct TrackTableRow {
    pub disc: u32,
    pub no: u32,
    pub title: String,
    pub artist: String,
}

#[derive(Tabled)]
pub struct ResultTableRow {
    pub track: String,
    pub status: String,
    pub detail: String,
}
