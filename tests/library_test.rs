use std::path::PathBuf;

use grabnetease::library::{AudioFormat, ILLEGAL_CHARS, LibraryPath, Track, sanitize_segment};

// Helper function to create a test track
fn create_test_track(artist: &str, album: &str, title: &str) -> Track {
    Track {
        artist: artist.to_string(),
        album: album.to_string(),
        year: 2020,
        disc_number: 1,
        track_number: 3,
        title: title.to_string(),
        format: AudioFormat::Flac,
    }
}

#[test]
fn test_library_path_layout() {
    let track = create_test_track("Artist A", "Album B", "Song C");
    let path = LibraryPath::from_track(&track);

    assert_eq!(
        path.relative(),
        PathBuf::from("Artist A")
            .join("2020-Album B")
            .join("1-3-Song C.flac")
    );
    assert_eq!(path.dir(), PathBuf::from("Artist A").join("2020-Album B"));
}

#[test]
fn test_library_path_uses_format_extension() {
    let mut track = create_test_track("A", "B", "C");
    for (format, ext) in [
        (AudioFormat::Mp3, "mp3"),
        (AudioFormat::Flac, "flac"),
        (AudioFormat::M4a, "m4a"),
        (AudioFormat::Aac, "aac"),
    ] {
        track.format = format;
        let name = LibraryPath::from_track(&track).file_name(0);
        assert_eq!(name, format!("1-3-C.{}", ext));
    }
}

#[test]
fn test_collision_candidates() {
    let track = create_test_track("Artist A", "Album B", "Song C");
    let path = LibraryPath::from_track(&track);

    assert_eq!(path.file_name(0), "1-3-Song C.flac");
    assert_eq!(path.file_name(1), "1-3-Song C (1).flac");
    assert_eq!(path.file_name(2), "1-3-Song C (2).flac");
    assert_eq!(path.candidate(0), path.relative());
    assert_ne!(path.candidate(1), path.candidate(2));
}

#[test]
fn test_sanitize_replaces_illegal_characters() {
    assert_eq!(sanitize_segment("AC/DC"), "AC_DC");
    assert_eq!(
        sanitize_segment("a\\b:c*d?e\"f<g>h|i"),
        "a_b_c_d_e_f_g_h_i"
    );
    assert_eq!(sanitize_segment("line\nbreak\ttab"), "line_break_tab");
}

#[test]
fn test_sanitize_keeps_unicode() {
    assert_eq!(sanitize_segment("周杰伦"), "周杰伦");
    assert_eq!(sanitize_segment("Beyoncé"), "Beyoncé");
}

#[test]
fn test_sanitize_trims_and_never_returns_empty() {
    assert_eq!(sanitize_segment("  padded  "), "padded");
    assert_eq!(sanitize_segment("ends with dots..."), "ends with dots");
    assert_eq!(sanitize_segment(""), "_");
    assert_eq!(sanitize_segment("   "), "_");
    assert_eq!(sanitize_segment("."), "_");
    assert_eq!(sanitize_segment(".."), "_");
}

#[test]
fn test_sanitize_reserved_device_names() {
    assert_eq!(sanitize_segment("CON"), "CON_");
    assert_eq!(sanitize_segment("nul"), "nul_");
    assert_eq!(sanitize_segment("Com1"), "Com1_");
    assert_eq!(sanitize_segment("CONTROL"), "CONTROL");
}

#[test]
fn test_sanitize_truncates_on_char_boundary() {
    let long = "あ".repeat(300);
    let segment = sanitize_segment(&long);

    assert!(segment.len() <= 200);
    assert!(!segment.is_empty());
    assert!(segment.chars().all(|c| c == 'あ'));
}

#[test]
fn test_derived_path_never_contains_illegal_characters() {
    let nasty = [
        "AC/DC",
        "..",
        "C:\\Windows",
        "What?",
        "<Intro>",
        "\"Quoted\"",
        "a|b",
        "star*",
        "",
        "  ",
        "CON",
        "tab\there",
        "trailing.",
        "../../etc/passwd",
    ];

    for artist in nasty {
        for title in nasty {
            let track = create_test_track(artist, title, title);
            let relative = LibraryPath::from_track(&track).relative();
            let components: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();

            assert_eq!(components.len(), 3, "path {:?} escaped its layout", relative);
            for component in components {
                assert!(
                    !component.chars().any(|c| ILLEGAL_CHARS.contains(&c) || c.is_control()),
                    "illegal character in {:?}",
                    component
                );
                assert_ne!(component, "..");
                assert_ne!(component, ".");
            }
        }
    }
}

#[test]
fn test_candidate_index_inverts_file_name() {
    let track = create_test_track("Artist A", "Album B", "Song C");
    let path = LibraryPath::from_track(&track);

    for index in [0, 1, 2, 17, 9999] {
        assert_eq!(path.candidate_index(&path.file_name(index)), Some(index));
    }
    assert_eq!(path.candidate_index("1-3-Song C (01).flac"), None);
    assert_eq!(path.candidate_index("1-3-Song C (0).flac"), None);
    assert_eq!(path.candidate_index("1-3-Song C (1).mp3"), None);
    assert_eq!(path.candidate_index("1-3-Song C (x).flac"), None);
    assert_eq!(path.candidate_index("1-2-Other.flac"), None);
}
