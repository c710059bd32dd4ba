use std::path::PathBuf;

use crate::{
    config::DownloadLayout,
    error,
    library::{AudioFormat, Organizer, Placement, Track},
    success,
};

/// Metadata given on the command line for `grabnetease organize`.
#[derive(Debug, Clone)]
pub struct OrganizeRequest {
    pub file: PathBuf,
    pub artist: String,
    pub album: String,
    pub year: i32,
    pub disc: u32,
    pub track: u32,
    pub title: String,
}

/// Files a local audio file into the library.
pub async fn organize(request: OrganizeRequest, download_dir: PathBuf) {
    let Some(format) = AudioFormat::from_path(&request.file) else {
        error!(
            "Cannot tell the audio format of {} (expected .mp3, .flac, .m4a or .aac)",
            request.file.display()
        );
    };

    let track = Track {
        artist: request.artist,
        album: request.album,
        year: request.year,
        disc_number: request.disc,
        track_number: request.track,
        title: request.title,
        format,
    };

    let organizer = Organizer::new(DownloadLayout::new(download_dir).library());
    match organizer.place_detailed(&track, &request.file).await {
        Ok(Placement::Moved(path)) => success!("Moved to {}", path.display()),
        Ok(Placement::AlreadyPresent(path)) => {
            success!("Already in the library at {}", path.display())
        }
        Err(e) => error!("Cannot organize {}: {}", request.file.display(), e),
    }
}
