use std::fs;

use grabnetease::{
    library::{AudioFormat, Track},
    tagging::{TagError, embed_tags, image_mime},
};
use id3::TagLike;
use tempfile::tempdir;

const PNG: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, 0, 0, 0, 0];
const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10];

// Helper function to create a test track
fn create_test_track(format: AudioFormat) -> Track {
    Track {
        artist: "Artist A".to_string(),
        album: "Album B".to_string(),
        year: 2020,
        disc_number: 2,
        track_number: 3,
        title: "Song C".to_string(),
        format,
    }
}

// TYER or TDRC, depending on how the tag version stores it
fn year_of(tag: &id3::Tag) -> Option<i32> {
    tag.year().or_else(|| tag.date_recorded().map(|d| d.year))
}

#[test]
fn test_image_mime() {
    assert_eq!(image_mime(PNG), "image/png");
    assert_eq!(image_mime(JPEG), "image/jpeg");
    assert_eq!(image_mime(&[]), "image/jpeg");
}

#[test]
fn test_embed_id3_tags() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("song.mp3");
    fs::write(&path, b"fake mpeg frames").unwrap();

    embed_tags(&path, &create_test_track(AudioFormat::Mp3), Some(PNG)).unwrap();

    let tag = id3::Tag::read_from_path(&path).unwrap();
    assert_eq!(tag.title(), Some("Song C"));
    assert_eq!(tag.artist(), Some("Artist A"));
    assert_eq!(tag.album_artist(), Some("Artist A"));
    assert_eq!(tag.album(), Some("Album B"));
    assert_eq!(tag.track(), Some(3));
    assert_eq!(tag.disc(), Some(2));
    assert_eq!(year_of(&tag), Some(2020));

    let pictures: Vec<_> = tag.pictures().collect();
    assert_eq!(pictures.len(), 1);
    assert_eq!(pictures[0].mime_type, "image/png");
    assert_eq!(pictures[0].data, PNG);

    // audio payload is kept after the tag
    assert!(fs::read(&path).unwrap().ends_with(b"fake mpeg frames"));
}

#[test]
fn test_embed_id3_tags_twice_keeps_one_cover() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("song.mp3");
    fs::write(&path, b"fake mpeg frames").unwrap();
    let track = create_test_track(AudioFormat::Mp3);

    embed_tags(&path, &track, Some(JPEG)).unwrap();
    embed_tags(&path, &track, Some(PNG)).unwrap();

    let tag = id3::Tag::read_from_path(&path).unwrap();
    let pictures: Vec<_> = tag.pictures().collect();
    assert_eq!(pictures.len(), 1);
    assert_eq!(pictures[0].mime_type, "image/png");
}

#[test]
fn test_unknown_year_is_not_written() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("song.mp3");
    fs::write(&path, b"fake mpeg frames").unwrap();
    let mut track = create_test_track(AudioFormat::Mp3);
    track.year = 0;

    embed_tags(&path, &track, None).unwrap();

    let tag = id3::Tag::read_from_path(&path).unwrap();
    assert_eq!(year_of(&tag), None);
    assert_eq!(tag.pictures().count(), 0);
}

#[test]
fn test_flac_requires_valid_stream() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("song.flac");
    fs::write(&path, b"definitely not flac").unwrap();

    let result = embed_tags(&path, &create_test_track(AudioFormat::Flac), None);

    assert!(matches!(result, Err(TagError::Flac(_))));
}

#[test]
fn test_m4a_is_unsupported() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("song.m4a");
    fs::write(&path, b"ftyp").unwrap();

    let result = embed_tags(&path, &create_test_track(AudioFormat::M4a), None);

    assert!(matches!(result, Err(TagError::Unsupported(AudioFormat::M4a))));
    assert_eq!(fs::read(&path).unwrap(), b"ftyp");
}
