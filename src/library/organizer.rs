use std::{
    collections::BTreeSet,
    fmt,
    fs::File,
    io::{self, ErrorKind, Read},
    path::{Path, PathBuf},
};

use sha2::{Digest, Sha256};

use super::{LibraryPath, Track};
use crate::{utils, warning};

const MAX_SUFFIX: u32 = 9999;
const DIGEST_CHUNK: usize = 1024 * 1024;

#[derive(Debug)]
pub enum OrganizeError {
    Io(io::Error),
    MissingSource(PathBuf),
    Exhausted(PathBuf),
}

impl From<io::Error> for OrganizeError {
    fn from(err: io::Error) -> Self {
        OrganizeError::Io(err)
    }
}

impl fmt::Display for OrganizeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrganizeError::Io(e) => write!(f, "I/O error: {}", e),
            OrganizeError::MissingSource(p) => {
                write!(f, "source is not a regular file: {}", p.display())
            }
            OrganizeError::Exhausted(p) => {
                write!(f, "no free file name left for {}", p.display())
            }
        }
    }
}

impl std::error::Error for OrganizeError {}

/// What happened to a placed file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Placement {
    /// Moved to a new location.
    Moved(PathBuf),
    /// Identical content already lived here; the source was discarded.
    AlreadyPresent(PathBuf),
}

impl Placement {
    pub fn path(&self) -> &Path {
        match self {
            Placement::Moved(p) | Placement::AlreadyPresent(p) => p,
        }
    }

    pub fn into_path(self) -> PathBuf {
        match self {
            Placement::Moved(p) | Placement::AlreadyPresent(p) => p,
        }
    }
}

/// Moves downloaded files into `<root>/Artist/Year-Album/Disc-Track-Title.ext`.
pub struct Organizer {
    root: PathBuf,
    max_suffix: u32,
}

impl Organizer {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            max_suffix: MAX_SUFFIX,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_max_suffix(mut self, max_suffix: u32) -> Self {
        self.max_suffix = max_suffix;
        self
    }

    /// Nominal absolute destination for `track`.
    pub fn destination(&self, track: &Track) -> PathBuf {
        self.root.join(LibraryPath::from_track(track).relative())
    }

    /// Places `source` into the library and returns its final path.
    pub async fn place(&self, track: &Track, source: &Path) -> Result<PathBuf, OrganizeError> {
        self.place_detailed(track, source)
            .await
            .map(Placement::into_path)
    }

    /// Like [`Organizer::place`], but tells whether the file was moved or
    /// already present.
    ///
    /// Every existing candidate (`Title.ext`, `Title (1).ext`, …) is compared
    /// with the source first; a match on any of them, gaps included, means
    /// the file is already present. Otherwise the source takes the lowest
    /// free candidate. Existing files are never overwritten, and a name
    /// taken by a concurrent run between the scan and the move is skipped.
    pub async fn place_detailed(
        &self,
        track: &Track,
        source: &Path,
    ) -> Result<Placement, OrganizeError> {
        let source_meta = match async_fs::metadata(source).await {
            Ok(meta) if meta.is_file() => meta,
            Ok(_) => return Err(OrganizeError::MissingSource(source.to_path_buf())),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(OrganizeError::MissingSource(source.to_path_buf()));
            }
            Err(e) => return Err(OrganizeError::Io(e)),
        };

        let library_path = LibraryPath::from_track(track);
        let dir = self.root.join(library_path.dir());
        async_fs::create_dir_all(&dir).await?;

        let source_canonical = async_fs::canonicalize(source).await?;
        let mut identity = SourceIdentity {
            path: source,
            len: source_meta.len(),
            digest: None,
        };

        let taken = self.taken_indices(&dir, &library_path).await?;
        for index in &taken {
            let candidate = dir.join(library_path.file_name(*index));
            if async_fs::canonicalize(&candidate).await.ok().as_ref() == Some(&source_canonical) {
                return Ok(Placement::AlreadyPresent(candidate));
            }
            if identity.matches(&candidate).await? {
                async_fs::remove_file(source).await?;
                return Ok(Placement::AlreadyPresent(candidate));
            }
        }

        for index in (0..=self.max_suffix).filter(|i| !taken.contains(i)) {
            let candidate = dir.join(library_path.file_name(index));
            if move_file(source, &candidate).await? {
                return Ok(Placement::Moved(candidate));
            }
            // another run claimed this name since the scan
            if identity.matches(&candidate).await? {
                async_fs::remove_file(source).await?;
                return Ok(Placement::AlreadyPresent(candidate));
            }
        }

        Err(OrganizeError::Exhausted(self.root.join(library_path.relative())))
    }

    /// Collision indices of the candidates already present in `dir`.
    async fn taken_indices(
        &self,
        dir: &Path,
        library_path: &LibraryPath,
    ) -> io::Result<BTreeSet<u32>> {
        let mut taken = BTreeSet::new();
        let mut entries = tokio::fs::read_dir(dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            if let Some(index) = name
                .to_str()
                .and_then(|name| library_path.candidate_index(name))
                .filter(|index| *index <= self.max_suffix)
            {
                taken.insert(index);
            }
        }
        Ok(taken)
    }
}

/// Size and lazily computed digest of the file being placed.
struct SourceIdentity<'a> {
    path: &'a Path,
    len: u64,
    digest: Option<Vec<u8>>,
}

impl SourceIdentity<'_> {
    async fn matches(&mut self, candidate: &Path) -> io::Result<bool> {
        let meta = match async_fs::metadata(candidate).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        if !meta.is_file() || meta.len() != self.len {
            return Ok(false);
        }

        let digest = match &self.digest {
            Some(d) => d.clone(),
            None => {
                let d = file_digest(self.path).await?;
                self.digest = Some(d.clone());
                d
            }
        };
        Ok(file_digest(candidate).await? == digest)
    }
}

/// SHA-256 of the file contents, read in 1 MiB chunks.
pub async fn file_digest(path: &Path) -> io::Result<Vec<u8>> {
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || -> io::Result<Vec<u8>> {
        let mut file = File::open(&path)?;
        let mut hasher = Sha256::new();
        let mut buffer = vec![0u8; DIGEST_CHUNK];

        loop {
            let read = file.read(&mut buffer)?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(hasher.finalize().to_vec())
    })
    .await
    .map_err(io::Error::other)?
}

/// Moves `from` to `to` without ever replacing an existing `to`.
///
/// The name is claimed with a hard link, which fails if `to` exists. When
/// linking is impossible (another file system) the data goes through
/// [`copy_then_link`]. Returns `Ok(false)` if `to` was already taken.
pub(crate) async fn move_file(from: &Path, to: &Path) -> io::Result<bool> {
    match link_new(from, to).await {
        Ok(true) => {
            remove_source(from).await;
            Ok(true)
        }
        Ok(false) => Ok(false),
        Err(_) => copy_then_link(from, to).await,
    }
}

/// Copies `from` into a hidden `.part` file next to `to`, claims `to` from
/// it and removes `from`. The `.part` file never outlives the call.
pub(crate) async fn copy_then_link(from: &Path, to: &Path) -> io::Result<bool> {
    let part = part_path(to);
    if let Err(e) = async_fs::copy(from, &part).await {
        let _ = async_fs::remove_file(&part).await;
        return Err(e);
    }

    let claimed = match link_new(&part, to).await {
        Err(_) => claim_by_rename(&part, to).await,
        linked => linked,
    };
    let _ = async_fs::remove_file(&part).await;

    if claimed? {
        remove_source(from).await;
        return Ok(true);
    }
    Ok(false)
}

async fn link_new(from: &Path, to: &Path) -> io::Result<bool> {
    match async_fs::hard_link(from, to).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(e) => Err(e),
    }
}

// file systems without hard links; not atomic
async fn claim_by_rename(part: &Path, to: &Path) -> io::Result<bool> {
    match async_fs::metadata(to).await {
        Ok(_) => Ok(false),
        Err(e) if e.kind() == ErrorKind::NotFound => async_fs::rename(part, to).await.map(|_| true),
        Err(e) => Err(e),
    }
}

/// The file is already in the library at this point, so a source that
/// cannot be removed is only worth a warning.
async fn remove_source(from: &Path) {
    if let Err(e) = async_fs::remove_file(from).await {
        warning!("Placed a copy but cannot remove {}: {}", from.display(), e);
    }
}

fn part_path(to: &Path) -> PathBuf {
    let nonce = utils::random_suffix(8);
    let name = to
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    to.with_file_name(format!(".{name}.{nonce}.part"))
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;
    use crate::library::AudioFormat;

    fn create_test_track() -> Track {
        Track {
            artist: "Artist A".to_string(),
            album: "Album B".to_string(),
            year: 2020,
            disc_number: 1,
            track_number: 3,
            title: "Song C".to_string(),
            format: AudioFormat::Flac,
        }
    }

    fn part_files(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .filter(|name| name.ends_with(".part"))
            .collect()
    }

    #[tokio::test]
    async fn copy_then_link_moves_and_cleans_up() {
        let tmp = tempdir().unwrap();
        let from = tmp.path().join("download.bin");
        let to = tmp.path().join("lib").join("song.flac");
        fs::create_dir_all(to.parent().unwrap()).unwrap();
        fs::write(&from, b"audio").unwrap();

        assert!(copy_then_link(&from, &to).await.unwrap());

        assert_eq!(fs::read(&to).unwrap(), b"audio");
        assert!(!from.exists());
        assert!(part_files(to.parent().unwrap()).is_empty());
    }

    #[tokio::test]
    async fn copy_then_link_never_replaces_existing_file() {
        let tmp = tempdir().unwrap();
        let from = tmp.path().join("download.bin");
        let to = tmp.path().join("song.flac");
        fs::write(&from, b"new").unwrap();
        fs::write(&to, b"old").unwrap();

        assert!(!copy_then_link(&from, &to).await.unwrap());

        assert_eq!(fs::read(&to).unwrap(), b"old");
        assert_eq!(fs::read(&from).unwrap(), b"new");
        assert!(part_files(tmp.path()).is_empty());
    }

    #[tokio::test]
    async fn move_file_never_replaces_existing_file() {
        let tmp = tempdir().unwrap();
        let from = tmp.path().join("download.bin");
        let to = tmp.path().join("song.flac");
        fs::write(&from, b"new").unwrap();
        fs::write(&to, b"old").unwrap();

        assert!(!move_file(&from, &to).await.unwrap());

        assert_eq!(fs::read(&to).unwrap(), b"old");
        assert!(from.exists());
    }

    #[tokio::test]
    async fn failed_source_removal_is_only_a_warning() {
        let tmp = tempdir().unwrap();
        // a directory cannot be removed with remove_file
        let stuck = tmp.path().join("stuck");
        fs::create_dir(&stuck).unwrap();

        remove_source(&stuck).await;

        assert!(stuck.is_dir());
    }

    #[tokio::test]
    async fn place_reports_exhausted_when_every_suffix_is_taken() {
        let tmp = tempdir().unwrap();
        let organizer = Organizer::new(tmp.path().join("lib")).with_max_suffix(2);
        let track = create_test_track();

        for n in 0..3 {
            let source = tmp.path().join(format!("{}.part", n));
            fs::write(&source, format!("take {}", n)).unwrap();
            organizer.place(&track, &source).await.unwrap();
        }

        let extra = tmp.path().join("extra.part");
        fs::write(&extra, b"one take too many").unwrap();
        let result = organizer.place(&track, &extra).await;

        assert!(matches!(result, Err(OrganizeError::Exhausted(_))));
        assert!(extra.exists());
    }

    #[tokio::test]
    async fn file_digest_spans_multiple_chunks() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("big.bin");
        let data: Vec<u8> = (0..DIGEST_CHUNK * 2 + 17).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &data).unwrap();

        assert_eq!(
            file_digest(&path).await.unwrap(),
            Sha256::digest(&data).to_vec()
        );
    }
}
