use crate::{
    library::{AudioFormat, Track},
    types::{AlbumResponse, AlbumTrack},
    utils,
};

use super::{ApiClient, ApiError};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

/// Fetches album details and its song list from `/album`.
pub async fn get_album(client: &ApiClient, album_id: u64) -> Result<AlbumResponse, ApiError> {
    client
        .get_json("/album", &[("id", album_id.to_string())])
        .await
}

/// Builds library tracks for every song of an album.
///
/// The album artist names the artist directory for the whole album so that
/// features on single songs do not scatter it; the song's first artist is
/// used only when the album has none. Songs without a track number are
/// numbered by position. The format is provisional (`Mp3`) until the
/// download URL tells the real one.
pub fn album_tracks(response: &AlbumResponse) -> Vec<AlbumTrack> {
    let album = &response.album;
    let year = utils::publish_year(album.publish_time);
    let album_artist = album
        .artist
        .as_ref()
        .map(|a| a.name.trim())
        .filter(|name| !name.is_empty());

    response
        .songs
        .iter()
        .enumerate()
        .map(|(i, song)| {
            let artist = album_artist
                .or_else(|| song.ar.first().map(|a| a.name.trim()))
                .filter(|name| !name.is_empty())
                .unwrap_or(UNKNOWN_ARTIST)
                .to_string();

            AlbumTrack {
                song_id: song.id,
                track: Track {
                    artist,
                    album: album.name.clone(),
                    year,
                    disc_number: utils::parse_disc_number(song.cd.as_deref()),
                    track_number: song.no.filter(|n| *n > 0).unwrap_or(i as u32 + 1),
                    title: song.name.clone(),
                    format: AudioFormat::Mp3,
                },
            }
        })
        .collect()
}
