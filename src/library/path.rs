use std::path::PathBuf;

use super::Track;

/// Characters rejected by at least one common file system.
pub const ILLEGAL_CHARS: [char; 9] = ['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

const REPLACEMENT: char = '_';
const MAX_SEGMENT_BYTES: usize = 200;

const RESERVED_NAMES: [&str; 22] = [
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Turns an arbitrary string into a single safe path segment.
///
/// Illegal and control characters become `_`, surrounding whitespace and
/// trailing dots are trimmed, reserved device names get a trailing `_` and
/// the result never exceeds 200 bytes. Never returns an empty string.
pub fn sanitize_segment(raw: &str) -> String {
    let replaced: String = raw
        .chars()
        .map(|c| {
            if ILLEGAL_CHARS.contains(&c) || c.is_control() {
                REPLACEMENT
            } else {
                c
            }
        })
        .collect();

    let mut segment = truncate_on_char_boundary(replaced.trim(), MAX_SEGMENT_BYTES)
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string();

    if segment.is_empty() {
        return REPLACEMENT.to_string();
    }

    let stem = segment.split('.').next().unwrap_or_default();
    if RESERVED_NAMES
        .iter()
        .any(|name| name.eq_ignore_ascii_case(stem))
    {
        segment.push(REPLACEMENT);
    }

    segment
}

fn truncate_on_char_boundary(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Canonical location of a track relative to the library root:
/// `Artist/Year-Album/Disc-Track-Title.ext`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryPath {
    artist_dir: String,
    album_dir: String,
    file_stem: String,
    extension: &'static str,
}

impl LibraryPath {
    pub fn from_track(track: &Track) -> Self {
        Self {
            artist_dir: sanitize_segment(&track.artist),
            album_dir: sanitize_segment(&format!("{}-{}", track.year, track.album)),
            file_stem: sanitize_segment(&format!(
                "{}-{}-{}",
                track.disc_number, track.track_number, track.title
            )),
            extension: track.format.extension(),
        }
    }

    /// Directory part, e.g. `Artist A/2020-Album B`.
    pub fn dir(&self) -> PathBuf {
        PathBuf::from(&self.artist_dir).join(&self.album_dir)
    }

    /// File name for the given collision index; `0` is the nominal name and
    /// `n > 0` appends ` (n)` to the stem.
    pub fn file_name(&self, index: u32) -> String {
        match index {
            0 => format!("{}.{}", self.file_stem, self.extension),
            n => format!("{} ({}).{}", self.file_stem, n, self.extension),
        }
    }

    /// Collision index of `name` if it is one of this path's candidates;
    /// the inverse of [`LibraryPath::file_name`].
    pub fn candidate_index(&self, name: &str) -> Option<u32> {
        if name == self.file_name(0) {
            return Some(0);
        }
        let suffix = format!(").{}", self.extension);
        let index: u32 = name
            .strip_prefix(self.file_stem.as_str())?
            .strip_prefix(" (")?
            .strip_suffix(suffix.as_str())?
            .parse()
            .ok()?;
        (index > 0 && self.file_name(index) == name).then_some(index)
    }

    /// Nominal relative path.
    pub fn relative(&self) -> PathBuf {
        self.candidate(0)
    }

    pub fn candidate(&self, index: u32) -> PathBuf {
        self.dir().join(self.file_name(index))
    }
}
