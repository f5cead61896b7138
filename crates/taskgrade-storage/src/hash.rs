//! Deterministic content digests for submitted programs using blake3.
//!
//! The digest is computed over the canonical JSON form of a parsed program, so
//! documents that differ only in formatting, key order or optional fields
//! (such as an empty `else`) share a digest.

use taskgrade_core::Program;

/// Returns the hex-encoded blake3 digest of the program's canonical form.
pub fn program_digest(program: &Program) -> String {
    let canonical = program.to_json().to_string();
    blake3::hash(canonical.as_bytes()).to_hex().to_string()
}
