//! # CLI Module
//!
//! User-facing commands of grabnetease. Each command wires the lower layers
//! together and owns the terminal feedback: colored status lines, progress
//! bars and result tables.
//!
//! ## Commands
//!
//! - [`login`] - QR code login, persists the session cookie
//! - [`logout`] - ends the session remotely and deletes the local file
//! - [`status`] - shows which account the stored session belongs to
//! - [`album`] - downloads a whole album into the library
//! - [`organize`] - files a local audio file into the library
//!
//! ## Layers
//!
//! ```text
//! CLI Layer (User Interface)
//!     ↓
//! Management Layer (Session)      Library Layer (Naming, Organizer)
//!     ↓                                ↑
//! API Layer (NetEase client)  →  Download / Tagging
//!     ↓
//! Network Layer (HTTP Requests)
//! ```
//!
//! ## Error handling
//!
//! Fatal problems (bad input, no album, failed login) end the program with
//! `error!`. Inside an album batch, a track that fails is reported and
//! skipped so the remaining tracks still get downloaded.
//!
//! ## Usage
//!
//! ```bash
//! grabnetease login
//! grabnetease album https://music.163.com/#/album?id=34720827
//! grabnetease album 34720827 --quality lossless
//! grabnetease organize ./song.flac --artist "Artist A" --album "Album B" \
//!     --year 2020 --disc 1 --track 3 --title "Song C"
//! ```

mod album;
mod login;
mod organize;

pub use album::AlbumReport;
pub use album::TrackOutcome;
pub use album::album;
pub use album::grab_album;
pub use album::resolve_download_dir;
pub use login::ensure_session;
pub use login::login;
pub use login::logout;
pub use login::status;
pub use organize::OrganizeRequest;
pub use organize::organize;
