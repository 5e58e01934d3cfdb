//! Default content digest

use super::types::DigestGenerator;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hex SHA-256 of the item's compact JSON encoding
///
/// `serde_json` keeps object keys sorted unless `preserve_order` is enabled,
/// so equal items hash equally regardless of the key order the CMS sent.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sha256Digest;

impl DigestGenerator for Sha256Digest {
    fn digest(&self, data: &Value) -> String {
        let mut hasher = Sha256::new();
        hasher.update(data.to_string().as_bytes());
        let digest = hasher.finalize();
        digest.iter().map(|byte| format!("{byte:02x}")).collect()
    }
}
