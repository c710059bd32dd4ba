use std::{fmt, path::Path};

use id3::{
    TagLike, Version,
    frame::{Picture, PictureType},
};
use metaflac::block::PictureType as FlacPictureType;

use crate::library::{AudioFormat, Track};

#[derive(Debug)]
pub enum TagError {
    Id3(id3::Error),
    Flac(metaflac::Error),
    Unsupported(AudioFormat),
}

impl From<id3::Error> for TagError {
    fn from(err: id3::Error) -> Self {
        TagError::Id3(err)
    }
}

impl From<metaflac::Error> for TagError {
    fn from(err: metaflac::Error) -> Self {
        TagError::Flac(err)
    }
}

impl fmt::Display for TagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagError::Id3(e) => write!(f, "cannot write ID3 tag: {}", e),
            TagError::Flac(e) => write!(f, "cannot write FLAC tag: {}", e),
            TagError::Unsupported(format) => {
                write!(f, "tagging {} files is not supported", format)
            }
        }
    }
}

impl std::error::Error for TagError {}

/// Writes title, artist, album, year, track, disc and the optional cover
/// into the audio file at `path`, according to `track.format`.
pub fn embed_tags(path: &Path, track: &Track, cover: Option<&[u8]>) -> Result<(), TagError> {
    match track.format {
        AudioFormat::Mp3 | AudioFormat::Aac => write_id3(path, track, cover),
        AudioFormat::Flac => write_flac(path, track, cover),
        AudioFormat::M4a => Err(TagError::Unsupported(track.format)),
    }
}

fn write_id3(path: &Path, track: &Track, cover: Option<&[u8]>) -> Result<(), TagError> {
    let mut tag = id3::Tag::read_from_path(path).unwrap_or_else(|_| id3::Tag::new());
    tag.set_title(track.title.as_str());
    tag.set_artist(track.artist.as_str());
    tag.set_album_artist(track.artist.as_str());
    tag.set_album(track.album.as_str());
    tag.set_track(track.track_number);
    tag.set_disc(track.disc_number);
    if track.year > 0 {
        tag.set_year(track.year);
    }

    if let Some(data) = cover {
        tag.remove_picture_by_type(PictureType::CoverFront);
        tag.add_frame(Picture {
            mime_type: image_mime(data).to_string(),
            picture_type: PictureType::CoverFront,
            description: "cover".to_string(),
            data: data.to_vec(),
        });
    }

    tag.write_to_path(path, Version::Id3v23)?;
    Ok(())
}

fn write_flac(path: &Path, track: &Track, cover: Option<&[u8]>) -> Result<(), TagError> {
    let mut tag = metaflac::Tag::read_from_path(path)?;

    let comments = tag.vorbis_comments_mut();
    comments.set_title(vec![track.title.clone()]);
    comments.set_artist(vec![track.artist.clone()]);
    comments.set_album_artist(vec![track.artist.clone()]);
    comments.set_album(vec![track.album.clone()]);
    comments.set_track(track.track_number);
    comments.set("DISCNUMBER", vec![track.disc_number.to_string()]);
    if track.year > 0 {
        comments.set("DATE", vec![track.year.to_string()]);
    }

    if let Some(data) = cover {
        tag.remove_picture_type(FlacPictureType::CoverFront);
        tag.add_picture(image_mime(data), FlacPictureType::CoverFront, data.to_vec());
    }

    tag.save()?;
    Ok(())
}

/// MIME type guessed from the image's magic bytes; JPEG when unknown.
pub fn image_mime(data: &[u8]) -> &'static str {
    if data.starts_with(&[0x89, b'P', b'N', b'G']) {
        "image/png"
    } else {
        "image/jpeg"
    }
}
