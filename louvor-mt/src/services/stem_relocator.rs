//! Copies classified stems into durable storage
//!
//! Each ingestion gets its own `{uuid}` directory under the storage root and
//! each stem an index-based name, `track_{n}_{instrument}.{ext}`. Together
//! these keep stored paths unique across the whole tree.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use uuid::Uuid;

use super::stem_scanner::CandidateStem;
use super::{IngestError, IngestResult};
use crate::models::{Instrument, MultitrackTrack};

/// Result of a successful relocation
#[derive(Debug)]
pub struct RelocatedStems {
    pub directory_id: Uuid,
    /// Absolute path of the new storage directory
    pub directory: PathBuf,
    /// Tracks in input order; `file_path` is relative to the storage root
    pub tracks: Vec<MultitrackTrack>,
}

#[derive(Debug, Clone)]
pub struct StemRelocator {
    storage_root: PathBuf,
}

impl StemRelocator {
    pub fn new(storage_root: PathBuf) -> Self {
        Self { storage_root }
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    /// Copy every stem into a fresh storage directory
    ///
    /// All or nothing: if any copy fails the new directory is removed and
    /// `CopyFailure` names the stem that failed.
    pub fn relocate(&self, stems: &[(CandidateStem, Instrument)]) -> IngestResult<RelocatedStems> {
        fs::create_dir_all(&self.storage_root)?;

        let directory_id = Uuid::new_v4();
        let directory = self.storage_root.join(directory_id.to_string());
        fs::create_dir(&directory)?;

        match copy_all(&directory, directory_id, stems) {
            Ok(tracks) => {
                tracing::info!(
                    directory = %directory.display(),
                    tracks = tracks.len(),
                    "Stems relocated"
                );
                Ok(RelocatedStems {
                    directory_id,
                    directory,
                    tracks,
                })
            }
            Err(e) => {
                if let Err(cleanup) = fs::remove_dir_all(&directory) {
                    tracing::warn!(
                        directory = %directory.display(),
                        error = %cleanup,
                        "Failed to remove partial stem directory"
                    );
                }
                Err(e)
            }
        }
    }
}

fn copy_all(
    directory: &Path,
    directory_id: Uuid,
    stems: &[(CandidateStem, Instrument)],
) -> IngestResult<Vec<MultitrackTrack>> {
    let mut tracks = Vec::with_capacity(stems.len());

    for (index, (stem, instrument)) in stems.iter().enumerate() {
        let stored_name = synthesize_file_name(index + 1, *instrument, &stem.extension);
        let destination = directory.join(&stored_name);

        copy_stem(&stem.absolute_path, &destination).map_err(|source| IngestError::CopyFailure {
            stem: stem.file_name(),
            source,
        })?;

        tracing::debug!(
            stem = %stem.relative_path.display(),
            stored = %stored_name,
            instrument = %instrument,
            "Stem stored"
        );

        tracks.push(MultitrackTrack::new(
            stem.name.clone(),
            stem.file_name(),
            format!("{}/{}", directory_id, stored_name),
            *instrument,
        ));
    }

    Ok(tracks)
}

fn copy_stem(source: &Path, destination: &Path) -> io::Result<()> {
    if !source.is_file() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("{} is not a regular file", source.display()),
        ));
    }
    fs::copy(source, destination).map(|_| ())
}

/// `track_{index}_{instrument}.{ext}`, sanitized
pub fn synthesize_file_name(index: usize, instrument: Instrument, extension: &str) -> String {
    sanitize_file_name(&format!("track_{}_{}.{}", index, instrument, extension))
}

/// Replace anything outside `[A-Za-z0-9._-]` with `_`
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
