use crate::{
    library::AudioFormat,
    types::{AudioQuality, SongUrl, SongUrlResponse},
};

use super::{ApiClient, ApiError};

/// A resolved download link.
#[derive(Debug, Clone)]
pub struct ResolvedSong {
    pub url: String,
    pub format: AudioFormat,
    pub size: Option<u64>,
    pub bitrate: Option<u64>,
}

/// Resolves the download URL of a song at the requested quality.
///
/// Returns `Ok(None)` when the service has no URL for it (region locked,
/// VIP only, removed) or reports a format the library does not handle.
pub async fn get_song_url(
    client: &ApiClient,
    song_id: u64,
    quality: AudioQuality,
) -> Result<Option<ResolvedSong>, ApiError> {
    let response: SongUrlResponse = client
        .get_json(
            "/song/url/v1",
            &[
                ("id", song_id.to_string()),
                ("level", quality.level().to_string()),
            ],
        )
        .await?;

    Ok(response
        .data
        .into_iter()
        .find(|s| s.id == song_id)
        .and_then(resolve))
}

/// Turns a `/song/url/v1` entry into a download link, if it carries one.
pub fn resolve(song: SongUrl) -> Option<ResolvedSong> {
    let url = song.url.filter(|u| !u.is_empty())?;
    let format = song
        .kind
        .as_deref()
        .and_then(|k| k.parse().ok())
        .or_else(|| format_from_url(&url))?;

    Some(ResolvedSong {
        url,
        format,
        size: song.size,
        bitrate: song.br,
    })
}

fn format_from_url(url: &str) -> Option<AudioFormat> {
    let path = url.split(['?', '#']).next()?;
    let (_, ext) = path.rsplit_once('.')?;
    ext.parse().ok()
}
