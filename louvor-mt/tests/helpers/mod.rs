//! Test Helper Utilities
//!
//! Shared utilities for testing louvor-mt
#![allow(dead_code)]

pub mod archive_builder;
pub mod audio_generator;
pub mod test_app;

pub use archive_builder::{build_zip, write_zip, ZipEntry};
pub use audio_generator::{generate_test_wav, wav_bytes, AudioConfig};
pub use test_app::{multipart_body, read_json, TestApp, BOUNDARY};
