//! # Music library layout
//!
//! Everything that decides where a track lives on disk: the [`Track`]
//! descriptor, the [`LibraryPath`] naming scheme
//! (`Artist/Year-Album/Disc-Track-Title.ext`) with per-segment sanitizing,
//! and the [`Organizer`] that moves downloaded files into place without
//! ever overwriting a different file.
//!
//! ## Collisions
//!
//! When the nominal name is taken by a file with other content, the
//! organizer appends ` (1)`, ` (2)`, … to the file stem and takes the first
//! free name. When a candidate already holds the same bytes (equal size and
//! SHA-256) the incoming copy is dropped and the existing path is returned,
//! so re-running a download is harmless.
//!
//! ## Example
//!
//! ```text
//! Track { artist: "Artist A", album: "Album B", year: 2020,
//!         disc_number: 1, track_number: 3, title: "Song C", format: Flac }
//!   -> Artist A/2020-Album B/1-3-Song C.flac
//! ```

mod organizer;
mod path;
mod track;

pub use organizer::OrganizeError;
pub use organizer::Organizer;
pub use organizer::Placement;
pub use organizer::file_digest;
pub use path::ILLEGAL_CHARS;
pub use path::LibraryPath;
pub use path::sanitize_segment;
pub use track::AudioFormat;
pub use track::Track;
