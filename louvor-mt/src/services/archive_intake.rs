//! Upload intake: validate the declared archive and buffer it to disk
//!
//! Bytes arrive in chunks (multipart streaming) or from any `Read`. The
//! size ceiling is enforced while writing, so an oversized upload never lands
//! on disk in full.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use super::{IngestError, IngestResult};

/// Accepted archive extension (compared case-insensitively)
pub const ARCHIVE_EXTENSION: &str = ".zip";

/// Name prefix of buffered uploads in the scratch root
pub const UPLOAD_PREFIX: &str = "upload_";

const ARCHIVE_MIME_TYPES: &[&str] = &[
    "application/zip",
    "application/x-zip",
    "application/x-zip-compressed",
    "application/zip-compressed",
    "multipart/x-zip",
];

/// Validates and buffers uploaded archives
#[derive(Debug, Clone)]
pub struct ArchiveIntake {
    scratch_root: PathBuf,
    max_bytes: u64,
}

impl ArchiveIntake {
    pub fn new(scratch_root: PathBuf, max_bytes: u64) -> Self {
        Self {
            scratch_root,
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    /// Check the declared file name / content type
    ///
    /// Accepted when the content type is an archive MIME type or the name
    /// ends in `.zip`.
    pub fn validate_declared(file_name: &str, content_type: Option<&str>) -> IngestResult<()> {
        let mime_ok = content_type
            .map(|ct| {
                let essence = ct.split(';').next().unwrap_or("").trim().to_ascii_lowercase();
                ARCHIVE_MIME_TYPES.contains(&essence.as_str())
            })
            .unwrap_or(false);

        let name_ok = file_name.to_ascii_lowercase().ends_with(ARCHIVE_EXTENSION);

        if mime_ok || name_ok {
            Ok(())
        } else {
            Err(IngestError::Validation(format!(
                "Only .zip archives are accepted (got '{}', {})",
                file_name,
                content_type.unwrap_or("no content type")
            )))
        }
    }

    /// Start buffering an upload into a fresh temp file
    pub fn begin(&self, file_name: &str, content_type: Option<&str>) -> IngestResult<IntakeBuffer> {
        Self::validate_declared(file_name, content_type)?;

        fs::create_dir_all(&self.scratch_root)?;
        let path = self
            .scratch_root
            .join(format!("{}{}{}", UPLOAD_PREFIX, louvor_common::uuid_utils::generate(), ARCHIVE_EXTENSION));
        let file = File::create(&path)?;

        tracing::debug!(file_name, path = %path.display(), "Buffering upload");

        Ok(IntakeBuffer {
            writer: Some(BufWriter::new(file)),
            path,
            written: 0,
            max_bytes: self.max_bytes,
            file_name: file_name.to_string(),
            content_type: content_type.map(str::to_string),
        })
    }

    /// Buffer a whole reader
    pub fn accept<R: Read>(
        &self,
        mut reader: R,
        file_name: &str,
        content_type: Option<&str>,
    ) -> IngestResult<UploadedArchive> {
        let mut buffer = self.begin(file_name, content_type)?;
        let mut chunk = vec![0u8; 64 * 1024];

        loop {
            let n = reader.read(&mut chunk)?;
            if n == 0 {
                break;
            }
            buffer.write_chunk(&chunk[..n])?;
        }

        buffer.finish()
    }
}

/// An upload being written to disk
///
/// Dropping an unfinished buffer deletes its temp file.
pub struct IntakeBuffer {
    writer: Option<BufWriter<File>>,
    path: PathBuf,
    written: u64,
    max_bytes: u64,
    file_name: String,
    content_type: Option<String>,
}

impl IntakeBuffer {
    /// Append a chunk; fails once the total exceeds the ceiling
    pub fn write_chunk(&mut self, chunk: &[u8]) -> IngestResult<()> {
        let total = self.written + chunk.len() as u64;
        if total > self.max_bytes {
            return Err(IngestError::Validation(format!(
                "Archive exceeds maximum size of {} bytes",
                self.max_bytes
            )));
        }

        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| IngestError::Validation("Upload already finished".to_string()))?;
        writer.write_all(chunk)?;
        self.written = total;
        Ok(())
    }

    pub fn bytes_written(&self) -> u64 {
        self.written
    }

    /// Flush and hand over the buffered archive
    pub fn finish(mut self) -> IngestResult<UploadedArchive> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush()?;
        }

        tracing::info!(
            file_name = %self.file_name,
            bytes = self.written,
            "Upload buffered"
        );

        Ok(UploadedArchive {
            path: std::mem::take(&mut self.path),
            file_name: std::mem::take(&mut self.file_name),
            size: self.written,
            content_type: self.content_type.take(),
        })
    }
}

impl Drop for IntakeBuffer {
    fn drop(&mut self) {
        // finish() empties `path`
        if self.path.as_os_str().is_empty() {
            return;
        }
        self.writer.take();
        if let Err(e) = fs::remove_file(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove partial upload");
        }
    }
}

/// A fully buffered upload waiting for extraction
#[derive(Debug)]
pub struct UploadedArchive {
    path: PathBuf,
    file_name: String,
    size: u64,
    content_type: Option<String>,
}

impl UploadedArchive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Delete the buffered file (best effort)
    pub fn discard(self) {
        match fs::remove_file(&self.path) {
            Ok(()) => tracing::debug!(path = %self.path.display(), "Upload removed"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(path = %self.path.display(), error = %e, "Failed to remove upload"),
        }
    }
}
