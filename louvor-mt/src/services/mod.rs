//! Multitrack ingestion services
//!
//! Flow for one upload:
//! intake → extract → scan → classify → relocate, with stale storage swept
//! before the request starts. Every step is synchronous file I/O; the HTTP
//! layer runs the pipeline on the blocking thread pool.

pub mod archive_extractor;
pub mod archive_intake;
pub mod instrument_classifier;
pub mod multitrack_ingest;
pub mod retention_sweeper;
pub mod stem_relocator;
pub mod stem_scanner;

pub use archive_extractor::{ArchiveExtractor, ExtractionWorkspace};
pub use archive_intake::{ArchiveIntake, IntakeBuffer, UploadedArchive};
pub use instrument_classifier::classify;
pub use multitrack_ingest::{IngestOutcome, MultitrackIngestor};
pub use retention_sweeper::{RetentionSweeper, SweepReport};
pub use stem_relocator::{RelocatedStems, StemRelocator};
pub use stem_scanner::{CandidateStem, StemScanner};

use thiserror::Error;

/// Ingestion failures
#[derive(Debug, Error)]
pub enum IngestError {
    /// Upload rejected before extraction (type or size)
    #[error("Invalid upload: {0}")]
    Validation(String),

    /// Archive cannot be decoded or contains an unsafe entry
    #[error("Archive corrupt or unreadable: {0}")]
    ArchiveCorrupt(String),

    /// Extraction succeeded but nothing in it is audio
    #[error("No audio files found in archive")]
    NoAudioFound,

    /// Copying one stem into storage failed; the batch was discarded
    #[error("Failed to copy stem '{stem}': {source}")]
    CopyFailure {
        stem: String,
        #[source]
        source: std::io::Error,
    },

    /// Other file system error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type IngestResult<T> = std::result::Result<T, IngestError>;
