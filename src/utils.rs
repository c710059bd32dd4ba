use chrono::{DateTime, Datelike, Utc};
use rand::{Rng, distr::Alphanumeric};

/// Extracts a numeric album id from user input.
///
/// Accepts a bare id (`"34720827"`), any URL carrying `id=<digits>`
/// (including the `#/album?id=` fragment form) and `/album/<digits>` paths.
pub fn parse_album_id(input: &str) -> Option<u64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if input.chars().all(|c| c.is_ascii_digit()) {
        return input.parse().ok();
    }

    if let Some(pos) = find_query_id(input) {
        return leading_digits(&input[pos..]);
    }

    input
        .find("/album/")
        .and_then(|pos| leading_digits(&input[pos + "/album/".len()..]))
}

fn find_query_id(input: &str) -> Option<usize> {
    ["?id=", "&id="]
        .iter()
        .filter_map(|marker| input.find(marker).map(|pos| pos + marker.len()))
        .min()
}

fn leading_digits(s: &str) -> Option<u64> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

/// Disc number from the API's `cd` field (`"01"`, `"1"`, `"2/2"`); defaults to 1.
pub fn parse_disc_number(cd: Option<&str>) -> u32 {
    cd.and_then(|cd| cd.split('/').next())
        .and_then(|n| n.trim().parse::<u32>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(1)
}

/// Year (UTC) of a millisecond timestamp; 0 when unknown.
pub fn publish_year(publish_time_ms: Option<i64>) -> i32 {
    publish_time_ms
        .filter(|ms| *ms > 0)
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .map(|dt| dt.year())
        .unwrap_or(0)
}

pub fn random_suffix(len: usize) -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Decodes a `data:<mime>;base64,<payload>` URL.
pub fn decode_data_url(url: &str) -> Option<Vec<u8>> {
    use base64::{Engine, engine::general_purpose::STANDARD};

    let (header, payload) = url.split_once(',')?;
    if !header.starts_with("data:") || !header.ends_with(";base64") {
        return None;
    }
    STANDARD.decode(payload.trim()).ok()
}
