//! UUID utilities

use uuid::Uuid;

/// Generate a new UUIDv4
pub fn generate() -> Uuid {
    Uuid::new_v4()
}

/// True if `s` is exactly the lowercase hyphenated form [`generate`] produces
///
/// Used to recognise directories created by [`generate`] when sweeping
/// storage roots. Simple, braced, URN and uppercase spellings are rejected.
pub fn is_uuid(s: &str) -> bool {
    Uuid::try_parse(s).is_ok_and(|id| id.hyphenated().to_string() == s)
}
