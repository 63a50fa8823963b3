//! Archive extraction into a private workspace
//!
//! Every entry's destination is resolved inside the workspace root and
//! re-checked after its parent directory exists on disk. An entry that would
//! land outside the root, collide with an earlier entry or push the unpacked
//! total past the byte ceiling aborts the whole extraction.

use std::fs::{self, File};
use std::io::{self, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use zip::ZipArchive;

use super::{IngestError, IngestResult};

/// Name prefix of extraction workspaces in the scratch root
pub const WORKSPACE_PREFIX: &str = "extract_";

const S_IFMT: u32 = 0o170000;
const S_IFLNK: u32 = 0o120000;

/// Unpacks archives into fresh workspaces under the scratch root
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    scratch_root: PathBuf,
    max_unpacked_bytes: u64,
}

/// Directory holding one unpacked archive
#[derive(Debug)]
pub struct ExtractionWorkspace {
    root: PathBuf,
    entries: Vec<PathBuf>,
}

impl ExtractionWorkspace {
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Relative paths of extracted files, in archive order
    pub fn entries(&self) -> &[PathBuf] {
        &self.entries
    }

    /// Archive position of an extracted file
    pub fn position_of(&self, relative: &Path) -> Option<usize> {
        self.entries.iter().position(|e| e == relative)
    }

    /// Remove the workspace and everything in it (best effort)
    pub fn discard(self) {
        remove_workspace(&self.root);
    }
}

impl ArchiveExtractor {
    pub fn new(scratch_root: PathBuf, max_unpacked_bytes: u64) -> Self {
        Self {
            scratch_root,
            max_unpacked_bytes,
        }
    }

    /// Unpack `archive_path` into a new uniquely named workspace
    ///
    /// On any failure the partially written workspace is removed before the
    /// error is returned.
    pub fn extract(&self, archive_path: &Path) -> IngestResult<ExtractionWorkspace> {
        fs::create_dir_all(&self.scratch_root)?;
        let root = self.scratch_root.join(format!(
            "{}{}",
            WORKSPACE_PREFIX,
            louvor_common::uuid_utils::generate()
        ));
        fs::create_dir(&root)?;

        match unpack(archive_path, &root, self.max_unpacked_bytes) {
            Ok(entries) => {
                tracing::info!(
                    archive = %archive_path.display(),
                    workspace = %root.display(),
                    files = entries.len(),
                    "Archive extracted"
                );
                Ok(ExtractionWorkspace { root, entries })
            }
            Err(e) => {
                tracing::warn!(archive = %archive_path.display(), error = %e, "Extraction failed");
                remove_workspace(&root);
                Err(e)
            }
        }
    }
}

fn unpack(archive_path: &Path, root: &Path, max_bytes: u64) -> IngestResult<Vec<PathBuf>> {
    let canonical_root = root.canonicalize()?;

    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))
        .map_err(|e| IngestError::ArchiveCorrupt(e.to_string()))?;

    let mut entries = Vec::new();
    let mut unpacked: u64 = 0;

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|e| IngestError::ArchiveCorrupt(format!("entry {}: {}", index, e)))?;
        let raw_name = entry.name().to_string();

        let enclosed = entry
            .enclosed_name()
            .ok_or_else(|| IngestError::ArchiveCorrupt(format!("unsafe entry path: {}", raw_name)))?;
        let destination = resolve_inside(&canonical_root, &enclosed)
            .ok_or_else(|| IngestError::ArchiveCorrupt(format!("entry escapes workspace: {}", raw_name)))?;

        if entry.is_dir() {
            fs::create_dir_all(&destination).map_err(entry_error(&raw_name))?;
            ensure_inside(&canonical_root, &destination, &raw_name)?;
            continue;
        }

        if entry.unix_mode().is_some_and(|mode| mode & S_IFMT == S_IFLNK) {
            tracing::debug!(entry = %raw_name, "Skipping symbolic link entry");
            continue;
        }

        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(entry_error(&raw_name))?;
            ensure_inside(&canonical_root, parent, &raw_name)?;
        }

        let mut out = File::create(&destination).map_err(entry_error(&raw_name))?;
        let remaining = max_bytes.saturating_sub(unpacked);
        let copied = io::copy(&mut (&mut entry).take(remaining.saturating_add(1)), &mut out)
            .map_err(entry_error(&raw_name))?;
        if copied > remaining {
            return Err(IngestError::ArchiveCorrupt(format!(
                "archive expands beyond {} bytes",
                max_bytes
            )));
        }
        unpacked += copied;

        // Manifest paths match what the scanner sees: no `.` or `..` parts
        let relative = destination
            .strip_prefix(&canonical_root)
            .map(Path::to_path_buf)
            .map_err(|_| IngestError::ArchiveCorrupt(format!("entry escapes workspace: {}", raw_name)))?;

        tracing::debug!(entry = %raw_name, bytes = copied, "Extracted");
        entries.push(relative);
    }

    Ok(entries)
}

/// Join `relative` onto `root` lexically, refusing anything that leaves it
fn resolve_inside(root: &Path, relative: &Path) -> Option<PathBuf> {
    let mut resolved = root.to_path_buf();

    for component in relative.components() {
        match component {
            Component::Normal(part) => {
                if part.to_string_lossy().contains('\0') {
                    return None;
                }
                resolved.push(part);
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if resolved == root || !resolved.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    (resolved != root && resolved.starts_with(root)).then_some(resolved)
}

/// Canonical check against what is actually on disk
fn ensure_inside(canonical_root: &Path, path: &Path, entry: &str) -> IngestResult<()> {
    let canonical = path.canonicalize().map_err(entry_error(entry))?;
    if canonical.starts_with(canonical_root) {
        Ok(())
    } else {
        Err(IngestError::ArchiveCorrupt(format!(
            "entry escapes workspace: {}",
            entry
        )))
    }
}

/// Filesystem failures caused by an entry's own path are archive faults
fn entry_error(entry: &str) -> impl Fn(io::Error) -> IngestError + '_ {
    move |e| IngestError::ArchiveCorrupt(format!("{}: {}", entry, e))
}

fn remove_workspace(root: &Path) {
    match fs::remove_dir_all(root) {
        Ok(()) => tracing::debug!(workspace = %root.display(), "Workspace removed"),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!(workspace = %root.display(), error = %e, "Failed to remove workspace"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;
    use zip::ZipWriter;

    fn write_zip(path: &Path, entries: &[(&str, &str)]) {
        let mut zip = ZipWriter::new(File::create(path).unwrap());
        for (name, data) in entries {
            if name.ends_with('/') {
                zip.add_directory(*name, SimpleFileOptions::default()).unwrap();
            } else {
                zip.start_file(*name, SimpleFileOptions::default()).unwrap();
                zip.write_all(data.as_bytes()).unwrap();
            }
        }
        zip.finish().unwrap();
    }

    const LIMIT: u64 = 1024 * 1024;

    fn scratch_is_empty(scratch: &Path) -> bool {
        fs::read_dir(scratch).map(|mut d| d.next().is_none()).unwrap_or(true)
    }

    #[test]
    fn test_extracts_nested_entries_in_order() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("band.zip");
        write_zip(
            &archive,
            &[
                ("stems/", ""),
                ("stems/vocal.wav", "v"),
                ("stems/inner/drums.wav", "d"),
                ("readme.txt", "r"),
            ],
        );

        let extractor = ArchiveExtractor::new(dir.path().join("scratch"), LIMIT);
        let workspace = extractor.extract(&archive).unwrap();

        assert!(workspace.root().join("stems/vocal.wav").is_file());
        assert_eq!(fs::read(workspace.root().join("stems/inner/drums.wav")).unwrap(), b"d");
        assert_eq!(
            workspace.entries(),
            &[
                PathBuf::from("stems/vocal.wav"),
                PathBuf::from("stems/inner/drums.wav"),
                PathBuf::from("readme.txt"),
            ]
        );
        assert_eq!(workspace.position_of(Path::new("readme.txt")), Some(2));

        let root = workspace.root().to_path_buf();
        workspace.discard();
        assert!(!root.exists());
    }

    #[test]
    fn test_each_extraction_gets_its_own_workspace() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("a.zip");
        write_zip(&archive, &[("a.wav", "a")]);

        let extractor = ArchiveExtractor::new(dir.path().join("scratch"), LIMIT);
        let first = extractor.extract(&archive).unwrap();
        let second = extractor.extract(&archive).unwrap();
        assert_ne!(first.root(), second.root());

        first.discard();
        second.discard();
    }

    #[test]
    fn test_path_traversal_entry_rejected() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("evil.zip");
        write_zip(&archive, &[("ok.wav", "fine"), ("../../escaped.wav", "bad")]);

        let scratch = dir.path().join("scratch");
        let err = ArchiveExtractor::new(scratch.clone(), LIMIT).extract(&archive).unwrap_err();

        assert!(matches!(err, IngestError::ArchiveCorrupt(_)), "got {:?}", err);
        assert!(!dir.path().join("escaped.wav").exists());
        assert!(scratch_is_empty(&scratch), "partial workspace must be removed");
    }

    #[test]
    fn test_corrupt_archive() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("broken.zip");
        fs::write(&archive, "PK\x03\x04 definitely not a zip").unwrap();

        let scratch = dir.path().join("scratch");
        let err = ArchiveExtractor::new(scratch.clone(), LIMIT).extract(&archive).unwrap_err();
        assert!(matches!(err, IngestError::ArchiveCorrupt(_)));
        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_file_then_directory_collision_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("clash.zip");
        write_zip(&archive, &[("stems", "s"), ("stems/vocal.wav", "v")]);

        let scratch = dir.path().join("scratch");
        let err = ArchiveExtractor::new(scratch.clone(), LIMIT).extract(&archive).unwrap_err();

        assert!(matches!(err, IngestError::ArchiveCorrupt(_)), "got {:?}", err);
        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_directory_then_file_collision_is_corrupt() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("clash.zip");
        write_zip(&archive, &[("x/", ""), ("x", "file over a directory")]);

        let scratch = dir.path().join("scratch");
        let err = ArchiveExtractor::new(scratch.clone(), LIMIT).extract(&archive).unwrap_err();

        assert!(matches!(err, IngestError::ArchiveCorrupt(_)), "got {:?}", err);
        assert!(scratch_is_empty(&scratch));
    }

    #[test]
    fn test_manifest_drops_current_dir_prefix() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("dotted.zip");
        write_zip(&archive, &[("./zeta_vocal.wav", "v"), ("alpha_drums.wav", "d")]);

        let workspace = ArchiveExtractor::new(dir.path().join("scratch"), LIMIT)
            .extract(&archive)
            .unwrap();

        assert_eq!(
            workspace.entries(),
            &[PathBuf::from("zeta_vocal.wav"), PathBuf::from("alpha_drums.wav")]
        );
        assert_eq!(workspace.position_of(Path::new("zeta_vocal.wav")), Some(0));
        workspace.discard();
    }

    #[test]
    fn test_unpacked_size_ceiling() {
        let dir = TempDir::new().unwrap();
        let archive = dir.path().join("bomb.zip");
        let big = "0".repeat(4096);
        write_zip(&archive, &[("a.wav", big.as_str()), ("b.wav", big.as_str())]);

        let scratch = dir.path().join("scratch");
        let err = ArchiveExtractor::new(scratch.clone(), 6000).extract(&archive).unwrap_err();
        assert!(matches!(err, IngestError::ArchiveCorrupt(_)), "got {:?}", err);
        assert!(scratch_is_empty(&scratch));

        // Exactly at the ceiling is fine
        let workspace = ArchiveExtractor::new(scratch, 8192).extract(&archive).unwrap();
        assert_eq!(workspace.entries().len(), 2);
        workspace.discard();
    }

    #[test]
    fn test_resolve_inside() {
        let root = Path::new("/work/extract_1");
        assert_eq!(
            resolve_inside(root, Path::new("a/./b.wav")),
            Some(PathBuf::from("/work/extract_1/a/b.wav"))
        );
        assert_eq!(
            resolve_inside(root, Path::new("a/../b.wav")),
            Some(PathBuf::from("/work/extract_1/b.wav"))
        );
        assert_eq!(resolve_inside(root, Path::new("../b.wav")), None);
        assert_eq!(resolve_inside(root, Path::new("a/../../b.wav")), None);
        assert_eq!(resolve_inside(root, Path::new("/b.wav")), None);
        assert_eq!(resolve_inside(root, Path::new(".")), None);
    }
}
