use std::{
    io::{self, Write},
    path::{Path, PathBuf},
    sync::Arc,
};

use tabled::Table;

use crate::{
    config::{self, DownloadLayout},
    download, error, info,
    library::{Organizer, Placement},
    netease::{
        ApiClient, ApiError,
        album::{album_tracks, get_album},
        song::get_song_url,
    },
    success, tagging,
    types::{AlbumTrack, AudioQuality, ResultTableRow, TrackTableRow},
    utils, warning,
};

use super::login::{api_client, ensure_session, login_and_persist, start_server};

/// Result of one track of a batch.
#[derive(Debug)]
pub struct TrackOutcome {
    pub label: String,
    pub result: Result<Placement, String>,
}

#[derive(Debug)]
pub struct AlbumReport {
    pub album_id: u64,
    pub album: String,
    pub artist: String,
    pub cover: Option<PathBuf>,
    pub outcomes: Vec<TrackOutcome>,
}

impl AlbumReport {
    pub fn placed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes.len() - self.placed()
    }
}

/// `grabnetease album`: resolve the album id (prompting when missing),
/// make sure there is a session, then download the whole album.
pub async fn album(input: Option<String>, quality: AudioQuality, download_dir: PathBuf) {
    let input = match input {
        Some(input) => input,
        None => match prompt("Album URL or ID: ") {
            Ok(line) => line,
            Err(e) => error!("Cannot read input: {}", e),
        },
    };

    let Some(album_id) = utils::parse_album_id(&input) else {
        error!("Not an album URL or ID: {}", input.trim());
    };

    let server = start_server().await;

    let mut client = api_client(server.as_ref());
    if let Err(e) = ensure_session(&mut client).await {
        error!("Login failed: {}", e);
    }

    let layout = DownloadLayout::new(download_dir);
    let report = match grab_album(&client, album_id, &layout, quality).await {
        Err(ApiError::NotLoggedIn) => {
            warning!("The service rejected the session, please log in again.");
            if let Err(e) = login_and_persist(&mut client).await {
                error!("Login failed: {}", e);
            }
            grab_album(&client, album_id, &layout, quality).await
        }
        other => other,
    };

    match report {
        Ok(report) => print_report(&report),
        Err(e) => error!("Cannot fetch album {}: {}", album_id, e),
    }
}

/// Downloads, tags and files every track of an album.
///
/// Only a failure to fetch the album itself is an error; a track that
/// cannot be resolved, downloaded or placed is recorded in the report and
/// skipped. Tagging failures are warnings and never block saving the audio.
pub async fn grab_album(
    client: &ApiClient,
    album_id: u64,
    layout: &DownloadLayout,
    quality: AudioQuality,
) -> Result<AlbumReport, ApiError> {
    info!("Fetching album {}...", album_id);
    let response = get_album(client, album_id).await?;
    let tracks = album_tracks(&response);
    let artist = tracks
        .first()
        .map(|t| t.track.artist.clone())
        .unwrap_or_default();

    print_tracklist(&response.album.name, &artist, &tracks);

    let cover = match &response.album.pic_url {
        Some(url) => {
            match download::download_cover(client.http(), url, &layout.cover_for(album_id)).await
            {
                Ok(path) => Some(path),
                Err(e) => {
                    warning!("Cannot download cover art: {}", e);
                    None
                }
            }
        }
        None => None,
    };
    let cover_bytes: Option<Arc<Vec<u8>>> = match &cover {
        Some(path) => async_fs::read(path).await.ok().map(Arc::new),
        None => None,
    };

    let organizer = Organizer::new(layout.library());
    let mut outcomes = Vec::with_capacity(tracks.len());

    for album_track in tracks {
        let label = format!(
            "{}-{} {}",
            album_track.track.disc_number, album_track.track.track_number, album_track.track.title
        );
        let result = grab_track(
            client,
            album_track,
            layout,
            &organizer,
            quality,
            cover_bytes.clone(),
        )
        .await;

        if let Err(reason) = &result {
            warning!("Skipping {}: {}", label, reason);
        }
        outcomes.push(TrackOutcome { label, result });
    }

    Ok(AlbumReport {
        album_id,
        album: response.album.name,
        artist,
        cover,
        outcomes,
    })
}

async fn grab_track(
    client: &ApiClient,
    album_track: AlbumTrack,
    layout: &DownloadLayout,
    organizer: &Organizer,
    quality: AudioQuality,
    cover: Option<Arc<Vec<u8>>>,
) -> Result<Placement, String> {
    let AlbumTrack { song_id, mut track } = album_track;

    let resolved = get_song_url(client, song_id, quality)
        .await
        .map_err(|e| e.to_string())?
        .ok_or("no download URL (unavailable or VIP only)")?;
    track.format = resolved.format;

    let pb = download::file_progress(&track.title);
    let temp = download::download_song(client.http(), &resolved.url, &layout.songs(), song_id, &pb)
        .await;
    pb.finish_and_clear();
    let temp = temp.map_err(|e| e.to_string())?;

    let tag_path = temp.clone();
    let tag_track = track.clone();
    let tagged = tokio::task::spawn_blocking(move || {
        tagging::embed_tags(&tag_path, &tag_track, cover.as_ref().map(|c| c.as_slice()))
    })
    .await;
    match tagged {
        Ok(Ok(())) => {}
        Ok(Err(e)) => warning!("{}: {}, saving without tags", track.title, e),
        Err(e) => warning!("{}: tagging aborted ({}), saving without tags", track.title, e),
    }

    match organizer.place_detailed(&track, &temp).await {
        Ok(placement) => Ok(placement),
        Err(e) => {
            let _ = async_fs::remove_file(&temp).await;
            Err(e.to_string())
        }
    }
}

fn print_tracklist(album: &str, artist: &str, tracks: &[AlbumTrack]) {
    let rows: Vec<TrackTableRow> = tracks
        .iter()
        .map(|t| TrackTableRow {
            disc: t.track.disc_number,
            no: t.track.track_number,
            title: t.track.title.clone(),
            artist: t.track.artist.clone(),
        })
        .collect();
    println!("{} - {}\n{}\n", artist, album, Table::new(rows));
}

fn print_report(report: &AlbumReport) {
    let rows: Vec<ResultTableRow> = report
        .outcomes
        .iter()
        .map(|o| match &o.result {
            Ok(Placement::Moved(path)) => ResultTableRow {
                track: o.label.clone(),
                status: "saved".to_string(),
                detail: path.display().to_string(),
            },
            Ok(Placement::AlreadyPresent(path)) => ResultTableRow {
                track: o.label.clone(),
                status: "present".to_string(),
                detail: path.display().to_string(),
            },
            Err(reason) => ResultTableRow {
                track: o.label.clone(),
                status: "skipped".to_string(),
                detail: reason.clone(),
            },
        })
        .collect();
    println!("{}", Table::new(rows));

    if report.skipped() == 0 {
        success!(
            "Album '{}' by {} finished: {} tracks.",
            report.album,
            report.artist,
            report.placed()
        );
    } else {
        warning!(
            "Album '{}' by {} finished: {} placed, {} skipped.",
            report.album,
            report.artist,
            report.placed(),
            report.skipped()
        );
    }
}

fn prompt(message: &str) -> io::Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

/// Default download root: `--download-dir` or `GRAB_DOWNLOAD_DIR`.
pub fn resolve_download_dir(flag: Option<&Path>) -> PathBuf {
    flag.map(Path::to_path_buf)
        .unwrap_or_else(config::download_dir)
}
