use std::{fmt, path::Path, str::FromStr};

use serde::{Deserialize, Serialize};

/// Container format of a downloaded audio file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Mp3,
    Flac,
    M4a,
    Aac,
}

impl AudioFormat {
    /// Lowercase file extension, without the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Aac => "aac",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mp3" => Ok(AudioFormat::Mp3),
            "flac" => Ok(AudioFormat::Flac),
            "m4a" | "mp4" => Ok(AudioFormat::M4a),
            "aac" => Ok(AudioFormat::Aac),
            other => Err(format!("unsupported audio format: {other}")),
        }
    }
}

/// One song's metadata, as placed into the library.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Track {
    pub artist: String,
    pub album: String,
    pub year: i32,
    pub disc_number: u32,
    pub track_number: u32,
    pub title: String,
    pub format: AudioFormat,
}
