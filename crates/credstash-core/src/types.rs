//! Secret record types
//!
//! A record is one row of a credstash table: one version of one named secret,
//! holding the KMS-wrapped key material, the encrypted payload and its digest.

use std::collections::BTreeMap;
use std::fmt;

/// Width of the zero-padded version string used as the table's sort key
pub const VERSION_WIDTH: usize = 19;

/// Encryption context handed verbatim to the key service
///
/// Must equal the context used when the key was wrapped. Ordered so that it
/// logs and compares deterministically.
pub type EncryptionContext = BTreeMap<String, String>;

/// Format a numeric version the way the table stores it
pub fn format_version(version: u64) -> String {
    format!("{:0width$}", version, width = VERSION_WIDTH)
}

/// One stored version of a secret
#[derive(Clone, PartialEq, Eq)]
pub struct SecretRecord {
    /// Secret name (partition key)
    pub name: String,
    /// Zero-padded version (sort key)
    pub version: String,
    /// KMS ciphertext blob wrapping the 64 bytes of key material
    pub wrapped_key: Vec<u8>,
    /// AES-256-CTR encrypted payload
    pub ciphertext: Vec<u8>,
    /// Hex HMAC-SHA256 of `ciphertext`
    pub hmac_digest: String,
}

// The wrapped key is safe to show but noisy; the payload never is.
impl fmt::Debug for SecretRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecretRecord")
            .field("name", &self.name)
            .field("version", &self.version)
            .field("wrapped_key_len", &self.wrapped_key.len())
            .field("ciphertext_len", &self.ciphertext.len())
            .finish_non_exhaustive()
    }
}

/// Pick the record with the lexically greatest version
///
/// Versions are zero-padded, so lexical order is numeric order.
pub fn select_latest(records: Vec<SecretRecord>) -> Option<SecretRecord> {
    records.into_iter().max_by(|a, b| a.version.cmp(&b.version))
}
