//! Removes stale stem directories and abandoned scratch files
//!
//! Runs at the start of each ingestion request. Only top-level entries this
//! service creates are considered: `{uuid}` stem directories and the
//! `upload_*` / `extract_*` scratch entries. Anything else is left alone.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use super::archive_extractor::WORKSPACE_PREFIX;
use super::archive_intake::UPLOAD_PREFIX;

/// Outcome of one sweep
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SweepReport {
    pub removed: Vec<PathBuf>,
    pub retained: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct RetentionSweeper {
    ttl: Duration,
}

impl RetentionSweeper {
    pub fn new(ttl: Duration) -> Self {
        Self { ttl }
    }

    pub fn from_hours(hours: u64) -> Self {
        Self::new(Duration::from_secs(hours * 3600))
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn sweep(&self, root: &Path) -> SweepReport {
        self.sweep_at(root, SystemTime::now())
    }

    /// Sweep `root` as if the current time were `now`
    ///
    /// Best effort: an entry that cannot be inspected or removed is logged and
    /// counted, and the sweep moves on.
    pub fn sweep_at(&self, root: &Path, now: SystemTime) -> SweepReport {
        let mut report = SweepReport::default();

        let entries = match fs::read_dir(root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return report,
            Err(e) => {
                tracing::warn!(root = %root.display(), error = %e, "Cannot read directory for sweep");
                report.failed += 1;
                return report;
            }
        };

        for entry in entries.flatten() {
            let name = entry.file_name().to_string_lossy().into_owned();
            if !is_managed_name(&name) {
                continue;
            }

            let path = entry.path();
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Cannot stat entry");
                    report.failed += 1;
                    continue;
                }
            };

            let modified = match metadata.modified() {
                Ok(t) => t,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "No modification time");
                    report.failed += 1;
                    continue;
                }
            };

            // Clock skew (mtime in the future) counts as fresh
            let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
            if age <= self.ttl {
                report.retained += 1;
                continue;
            }

            let result = if metadata.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };

            match result {
                Ok(()) => {
                    tracing::info!(path = %path.display(), age_secs = age.as_secs(), "Removed stale entry");
                    report.removed.push(path);
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "Failed to remove stale entry");
                    report.failed += 1;
                }
            }
        }

        report
    }
}

fn is_managed_name(name: &str) -> bool {
    louvor_common::uuid_utils::is_uuid(name)
        || name.starts_with(UPLOAD_PREFIX)
        || name.starts_with(WORKSPACE_PREFIX)
}
