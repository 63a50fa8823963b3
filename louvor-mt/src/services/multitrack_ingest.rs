//! Multitrack ingestion pipeline
//!
//! extract → scan → classify → relocate for one buffered upload. The uploaded
//! archive and the extraction workspace are removed whatever the outcome; a
//! failed relocation leaves no storage directory behind.

use std::path::{Path, PathBuf};

use louvor_common::config::MultitrackSettings;
use uuid::Uuid;

use super::{
    classify, ArchiveExtractor, ArchiveIntake, CandidateStem, ExtractionWorkspace, IngestError,
    IngestResult, RetentionSweeper, StemRelocator, StemScanner, SweepReport, UploadedArchive,
};
use crate::models::{Instrument, MultitrackDescriptor, MultitrackTrack};

/// A completed ingestion
#[derive(Debug)]
pub struct IngestOutcome {
    pub descriptor: MultitrackDescriptor,
    pub directory_id: Uuid,
}

/// Owns every stage of the pipeline
pub struct MultitrackIngestor {
    intake: ArchiveIntake,
    extractor: ArchiveExtractor,
    scanner: StemScanner,
    relocator: StemRelocator,
    sweeper: RetentionSweeper,
    storage_root: PathBuf,
    scratch_root: PathBuf,
}

impl MultitrackIngestor {
    pub fn new(storage_root: PathBuf, scratch_root: PathBuf, settings: &MultitrackSettings) -> Self {
        Self {
            intake: ArchiveIntake::new(scratch_root.clone(), settings.max_archive_bytes),
            extractor: ArchiveExtractor::new(scratch_root.clone(), settings.max_unpacked_bytes),
            scanner: StemScanner::new(settings.max_scan_depth),
            relocator: StemRelocator::new(storage_root.clone()),
            sweeper: RetentionSweeper::from_hours(settings.retention_hours),
            storage_root,
            scratch_root,
        }
    }

    pub fn intake(&self) -> &ArchiveIntake {
        &self.intake
    }

    pub fn storage_root(&self) -> &Path {
        &self.storage_root
    }

    pub fn scratch_root(&self) -> &Path {
        &self.scratch_root
    }

    /// Sweep stale stem directories and scratch leftovers
    pub fn sweep_stale(&self) -> SweepReport {
        let mut report = self.sweeper.sweep(&self.storage_root);
        let scratch = self.sweeper.sweep(&self.scratch_root);

        report.removed.extend(scratch.removed);
        report.retained += scratch.retained;
        report.failed += scratch.failed;

        if !report.removed.is_empty() || report.failed > 0 {
            tracing::info!(
                removed = report.removed.len(),
                failed = report.failed,
                "Retention sweep finished"
            );
        }
        report
    }

    /// Run the pipeline on a buffered upload
    ///
    /// Consumes the archive; its temp file is gone when this returns.
    pub fn ingest(&self, archive: UploadedArchive) -> IngestResult<IngestOutcome> {
        let archive_file_name = archive.file_name().to_string();
        let archive_file_path = archive.path().to_string_lossy().into_owned();

        let extracted = self.extractor.extract(archive.path());
        archive.discard();
        let workspace = extracted?;

        let relocated = self.classify_and_relocate(&workspace);
        workspace.discard();
        let (directory_id, tracks) = relocated?;

        tracing::info!(
            archive = %archive_file_name,
            directory = %directory_id,
            tracks = tracks.len(),
            "Multitrack ingested"
        );

        Ok(IngestOutcome {
            descriptor: MultitrackDescriptor {
                archive_file_name,
                archive_file_path,
                tracks,
                uploaded_at: louvor_common::time::now(),
            },
            directory_id,
        })
    }

    fn classify_and_relocate(
        &self,
        workspace: &ExtractionWorkspace,
    ) -> IngestResult<(Uuid, Vec<MultitrackTrack>)> {
        let mut stems = self.scanner.scan(workspace.root());
        if stems.is_empty() {
            return Err(IngestError::NoAudioFound);
        }

        order_by_archive(&mut stems, workspace);

        let classified: Vec<(CandidateStem, Instrument)> = stems
            .into_iter()
            .map(|stem| {
                let instrument = classify(&stem.name);
                (stem, instrument)
            })
            .collect();

        let relocated = self.relocator.relocate(&classified)?;
        Ok((relocated.directory_id, relocated.tracks))
    }
}

/// Archive entry order; stems missing from the manifest keep scan order at the end
fn order_by_archive(stems: &mut [CandidateStem], workspace: &ExtractionWorkspace) {
    stems.sort_by_key(|stem| {
        workspace
            .position_of(&stem.relative_path)
            .unwrap_or(usize::MAX)
    });
}
