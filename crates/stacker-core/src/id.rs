//! Recipe identifier generation.

use uuid::Uuid;

/// Generate a fresh recipe id (UUIDv4, hyphenated).
///
/// No uniqueness check is made against any store; collisions are
/// negligible at this width.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}
