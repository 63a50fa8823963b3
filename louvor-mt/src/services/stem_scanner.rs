//! Stem discovery inside an extraction workspace
//!
//! Walks the workspace iteratively (walkdir keeps its own stack) with a hard
//! depth bound and without following symbolic links, so link cycles cannot
//! loop. Entries are visited in file-name order, which makes repeated scans of
//! the same tree yield the same sequence.

use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Extensions accepted as audio stems (lowercase)
pub const AUDIO_EXTENSIONS: [&str; 6] = ["mp3", "wav", "flac", "m4a", "aac", "ogg"];

const DEFAULT_MAX_DEPTH: usize = 32;

/// An audio file found in the workspace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateStem {
    /// File name without extension
    pub name: String,
    /// Path relative to the workspace root
    pub relative_path: PathBuf,
    pub absolute_path: PathBuf,
    /// Lowercase extension without the dot
    pub extension: String,
}

impl CandidateStem {
    /// File name as it appeared in the archive
    pub fn file_name(&self) -> String {
        self.absolute_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| format!("{}.{}", self.name, self.extension))
    }
}

/// Directories skipped wholesale (macOS archive metadata)
pub const IGNORED_DIRECTORIES: [&str; 1] = ["__MACOSX"];

/// Audio stem scanner
pub struct StemScanner {
    max_depth: usize,
}

impl StemScanner {
    /// Scanner with a hard depth bound
    ///
    /// Files are kept or dropped by extension alone; the only other filter is
    /// the `__MACOSX` metadata tree, whose `._` files carry audio extensions
    /// but no audio.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Lazily walk `root`, yielding stems in file-name order
    pub fn iter<'a>(&'a self, root: &'a Path) -> impl Iterator<Item = CandidateStem> + 'a {
        WalkDir::new(root)
            .follow_links(false)
            .max_depth(self.max_depth)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_ignored_directory(e))
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    tracing::debug!("Skipping unreadable entry: {}", e);
                    None
                }
            })
            .filter(|entry| entry.file_type().is_file())
            .filter_map(move |entry| to_candidate(root, entry.path()))
    }

    /// Collect every stem under `root`
    pub fn scan(&self, root: &Path) -> Vec<CandidateStem> {
        let stems: Vec<CandidateStem> = self.iter(root).collect();
        tracing::debug!(root = %root.display(), stems = stems.len(), "Stem scan complete");
        stems
    }

}

impl Default for StemScanner {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DEPTH)
    }
}

/// Check if extension is an accepted stem format
pub fn is_audio_extension(ext: &str) -> bool {
    AUDIO_EXTENSIONS.contains(&ext)
}

fn is_ignored_directory(entry: &DirEntry) -> bool {
    entry.file_type().is_dir()
        && IGNORED_DIRECTORIES
            .iter()
            .any(|name| entry.file_name() == std::ffi::OsStr::new(name))
}

fn to_candidate(root: &Path, path: &Path) -> Option<CandidateStem> {
    let extension = path.extension()?.to_string_lossy().to_lowercase();
    if !is_audio_extension(&extension) {
        return None;
    }

    let name = path.file_stem()?.to_string_lossy().into_owned();
    let relative_path = path.strip_prefix(root).ok()?.to_path_buf();

    Some(CandidateStem {
        name,
        relative_path,
        absolute_path: path.to_path_buf(),
        extension,
    })
}
