//! # Louvor Common Library
//!
//! Shared code for the Louvor services:
//! - Error type shared by repository and configuration code
//! - Configuration loading (root folder resolution, TOML bootstrap)
//! - Timestamp and identifier helpers

pub mod config;
pub mod error;
pub mod time;
pub mod uuid_utils;

pub use error::{Error, Result};
