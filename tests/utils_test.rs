use std::path::Path;

use grabnetease::{
    library::AudioFormat,
    netease::{
        album::{UNKNOWN_ARTIST, album_tracks},
        login::qr_status,
        song::resolve,
    },
    types::{AlbumResponse, AudioQuality, QrStatus, SongUrl},
    utils::*,
};
use serde_json::json;

// Helper function to build an album response the way the API returns it
fn create_test_album(album_artist: Option<&str>) -> AlbumResponse {
    let artist = album_artist.map(|name| json!({ "id": 7, "name": name }));
    serde_json::from_value(json!({
        "code": 200,
        "album": {
            "id": 34720827,
            "name": "Album B",
            "publishTime": 1577836800000i64,
            "company": "Label",
            "picUrl": "http://p1.music.126.net/cover.jpg",
            "size": 3,
            "artist": artist
        },
        "songs": [
            { "id": 1, "name": "Intro", "no": 1, "cd": "01", "ar": [{ "id": 8, "name": "Guest" }] },
            { "id": 2, "name": "Song C", "no": 3, "cd": "1", "ar": [] },
            { "id": 3, "name": "Bonus", "no": 0, "cd": "2", "ar": [{ "id": 9, "name": "Other" }] }
        ]
    }))
    .unwrap()
}

#[test]
fn test_parse_album_id_plain_number() {
    assert_eq!(parse_album_id("34720827"), Some(34720827));
    assert_eq!(parse_album_id("  42 \n"), Some(42));
}

#[test]
fn test_parse_album_id_urls() {
    assert_eq!(
        parse_album_id("https://music.163.com/#/album?id=34720827"),
        Some(34720827)
    );
    assert_eq!(
        parse_album_id("https://music.163.com/album?id=123&userid=456"),
        Some(123)
    );
    assert_eq!(
        parse_album_id("https://music.163.com/album?userid=456&id=123"),
        Some(123)
    );
    assert_eq!(
        parse_album_id("https://y.music.163.com/m/album/789?app=1"),
        Some(789)
    );
}

#[test]
fn test_parse_album_id_rejects_garbage() {
    assert_eq!(parse_album_id(""), None);
    assert_eq!(parse_album_id("hello"), None);
    assert_eq!(parse_album_id("https://music.163.com/#/album?id="), None);
}

#[test]
fn test_parse_disc_number() {
    assert_eq!(parse_disc_number(Some("01")), 1);
    assert_eq!(parse_disc_number(Some("2")), 2);
    assert_eq!(parse_disc_number(Some("2/2")), 2);
    assert_eq!(parse_disc_number(Some("")), 1);
    assert_eq!(parse_disc_number(Some("0")), 1);
    assert_eq!(parse_disc_number(None), 1);
}

#[test]
fn test_publish_year() {
    assert_eq!(publish_year(Some(1577836800000)), 2020);
    assert_eq!(publish_year(Some(0)), 0);
    assert_eq!(publish_year(None), 0);
}

#[test]
fn test_random_suffix() {
    let a = random_suffix(8);
    assert_eq!(a.len(), 8);
    assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
    assert_ne!(a, random_suffix(8));
}

#[test]
fn test_decode_data_url() {
    assert_eq!(
        decode_data_url("data:image/png;base64,aGVsbG8="),
        Some(b"hello".to_vec())
    );
    assert_eq!(decode_data_url("data:image/png,aGVsbG8="), None);
    assert_eq!(decode_data_url("http://example.com/qr.png"), None);
}

#[test]
fn test_audio_quality_parsing() {
    assert_eq!("LOSSLESS".parse::<AudioQuality>(), Ok(AudioQuality::Lossless));
    assert_eq!("hires".parse::<AudioQuality>(), Ok(AudioQuality::Hires));
    assert!("bogus".parse::<AudioQuality>().is_err());
    assert_eq!(AudioQuality::default(), AudioQuality::Exhigh);
    assert_eq!(AudioQuality::Standard.level(), "standard");
}

#[test]
fn test_audio_format_parsing() {
    assert_eq!("FLAC".parse::<AudioFormat>(), Ok(AudioFormat::Flac));
    assert_eq!("mp4".parse::<AudioFormat>(), Ok(AudioFormat::M4a));
    assert!("ogg".parse::<AudioFormat>().is_err());
    assert_eq!(
        AudioFormat::from_path(Path::new("music/song.MP3")),
        Some(AudioFormat::Mp3)
    );
    assert_eq!(AudioFormat::from_path(Path::new("music/song")), None);
}

#[test]
fn test_album_tracks_use_album_artist() {
    let tracks = album_tracks(&create_test_album(Some("Artist A")));

    assert_eq!(tracks.len(), 3);
    assert!(tracks.iter().all(|t| t.track.artist == "Artist A"));
    assert!(tracks.iter().all(|t| t.track.album == "Album B"));
    assert!(tracks.iter().all(|t| t.track.year == 2020));

    assert_eq!(tracks[1].song_id, 2);
    assert_eq!(tracks[1].track.title, "Song C");
    assert_eq!(tracks[1].track.track_number, 3);
    assert_eq!(tracks[1].track.disc_number, 1);
}

#[test]
fn test_album_tracks_number_by_position_when_missing() {
    let tracks = album_tracks(&create_test_album(Some("Artist A")));

    assert_eq!(tracks[2].track.track_number, 3);
    assert_eq!(tracks[2].track.disc_number, 2);
}

#[test]
fn test_album_tracks_fall_back_to_song_artist() {
    let tracks = album_tracks(&create_test_album(None));

    assert_eq!(tracks[0].track.artist, "Guest");
    assert_eq!(tracks[1].track.artist, UNKNOWN_ARTIST);
    assert_eq!(tracks[2].track.artist, "Other");
}

#[test]
fn test_resolve_song_url() {
    let song = SongUrl {
        id: 1,
        url: Some("http://m701.music.126.net/a.flac".to_string()),
        kind: Some("FLAC".to_string()),
        size: Some(10),
        br: Some(999000),
    };
    let resolved = resolve(song).unwrap();
    assert_eq!(resolved.format, AudioFormat::Flac);
    assert_eq!(resolved.size, Some(10));

    let from_url = SongUrl {
        id: 1,
        url: Some("http://m701.music.126.net/a.mp3?vuutv=x".to_string()),
        kind: None,
        size: None,
        br: None,
    };
    assert_eq!(resolve(from_url).unwrap().format, AudioFormat::Mp3);
}

#[test]
fn test_resolve_song_without_url() {
    let song = SongUrl {
        id: 1,
        url: None,
        kind: Some("mp3".to_string()),
        size: None,
        br: None,
    };
    assert!(resolve(song).is_none());

    let unknown = SongUrl {
        id: 1,
        url: Some("http://example.com/a.ogg".to_string()),
        kind: Some("ogg".to_string()),
        size: None,
        br: None,
    };
    assert!(resolve(unknown).is_none());
}

#[test]
fn test_qr_status_codes() {
    assert_eq!(qr_status(800, None), QrStatus::Expired);
    assert_eq!(qr_status(801, None), QrStatus::Waiting);
    assert_eq!(qr_status(802, None), QrStatus::Scanned);
    assert_eq!(
        qr_status(803, Some("MUSIC_U=abc".to_string())),
        QrStatus::Authorized("MUSIC_U=abc".to_string())
    );
    assert_eq!(qr_status(803, None), QrStatus::Unknown(803));
    assert_eq!(qr_status(502, None), QrStatus::Unknown(502));
}
