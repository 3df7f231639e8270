//! Checksum calculation for image deduplication.

use sha2::{Digest, Sha256};

/// Calculate the SHA-256 checksum of raw image bytes.
///
/// Used as the derived `source_image_id` when an uploader does not supply
/// one, so transparent retries of the same upload stay idempotent.
///
/// # Arguments
/// * `bytes` - Raw image content
///
/// # Returns
/// Hexadecimal string representation of the SHA-256 hash.
pub fn image_checksum(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let result = hasher.finalize();
    hex::encode(result)
}
