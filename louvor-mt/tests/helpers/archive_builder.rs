//! Zip fixtures

use std::io::{Cursor, Write};
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// One archive entry; names ending in `/` become directories
pub struct ZipEntry {
    pub name: String,
    pub data: Vec<u8>,
}

impl ZipEntry {
    pub fn file(name: &str, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.to_string(),
            data: data.into(),
        }
    }

    pub fn dir(name: &str) -> Self {
        Self {
            name: format!("{}/", name.trim_end_matches('/')),
            data: Vec::new(),
        }
    }
}

/// Build a zip archive in memory
pub fn build_zip(entries: &[ZipEntry]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for entry in entries {
        if entry.name.ends_with('/') {
            zip.add_directory(entry.name.as_str(), SimpleFileOptions::default())
                .unwrap();
        } else {
            zip.start_file(entry.name.as_str(), SimpleFileOptions::default())
                .unwrap();
            zip.write_all(&entry.data).unwrap();
        }
    }
    zip.finish().unwrap().into_inner()
}

/// Build a zip archive on disk
pub fn write_zip(path: &Path, entries: &[ZipEntry]) {
    std::fs::write(path, build_zip(entries)).unwrap();
}
