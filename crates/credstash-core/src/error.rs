//! Error types for credstash-core

use std::fmt;
use thiserror::Error;

/// Result type alias using credstash-core's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Why the key-management service refused to unwrap a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyServiceFailure {
    /// Caller is not authorized, or the encryption context does not grant access
    AccessDenied,
    /// The master key referenced by the blob (or by `key_id`) does not exist
    KeyNotFound,
    /// The blob is malformed, was wrapped under another key, or the context does not match
    InvalidCiphertext,
    /// The key exists but is disabled or pending deletion
    KeyUnavailable,
    /// Anything else reported by the service or its transport
    Other,
}

impl fmt::Display for KeyServiceFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyServiceFailure::AccessDenied => write!(f, "access denied"),
            KeyServiceFailure::KeyNotFound => write!(f, "key not found"),
            KeyServiceFailure::InvalidCiphertext => write!(f, "invalid ciphertext"),
            KeyServiceFailure::KeyUnavailable => write!(f, "key unavailable"),
            KeyServiceFailure::Other => write!(f, "service error"),
        }
    }
}

/// Errors surfaced by secret retrieval
///
/// None of the messages carry key material or plaintext.
#[derive(Error, Debug)]
pub enum Error {
    /// No record for the name (and version, if one was requested)
    #[error("Secret not found: {name}{} in table {table}", version_suffix(.version))]
    NotFound {
        name: String,
        version: Option<String>,
        table: String,
    },

    /// The key-management service rejected the unwrap
    #[error("Key service rejected unwrap ({kind}): {message}")]
    KeyService {
        kind: KeyServiceFailure,
        message: String,
    },

    /// Unwrapped key material has the wrong size
    #[error("Unwrapped key material has wrong size: expected {expected} bytes, got {actual}")]
    MaterialLength { expected: usize, actual: usize },

    /// Stored digest does not match the ciphertext
    #[error("Integrity check failed for {name} version {version}: digest mismatch")]
    Integrity { name: String, version: String },

    /// Stream cipher could not be initialised
    #[error("Cipher error: {0}")]
    Cipher(String),

    /// The store could not be read
    #[error("Store error: {message}")]
    Store { message: String },

    /// A record exists but cannot be interpreted
    #[error("Malformed record {name} version {version}: {reason}")]
    MalformedRecord {
        name: String,
        version: String,
        reason: String,
    },

    /// Decrypted secret is not valid UTF-8
    #[error("Decrypted value of {name} is not valid UTF-8")]
    InvalidUtf8 { name: String },

    /// Configuration could not be loaded or is invalid
    #[error("Invalid configuration: {message}")]
    Config { message: String },
}

fn version_suffix(version: &Option<String>) -> String {
    match version {
        Some(v) => format!(" (version {})", v),
        None => String::new(),
    }
}

impl Error {
    /// Create a not found error
    pub fn not_found(name: impl Into<String>, version: Option<&str>, table: impl Into<String>) -> Self {
        Self::NotFound {
            name: name.into(),
            version: version.map(str::to_string),
            table: table.into(),
        }
    }

    /// Create a key service error
    pub fn key_service(kind: KeyServiceFailure, message: impl Into<String>) -> Self {
        Self::KeyService {
            kind,
            message: message.into(),
        }
    }

    /// Create an integrity error
    pub fn integrity(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self::Integrity {
            name: name.into(),
            version: version.into(),
        }
    }

    /// Create a store error
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create a malformed record error
    pub fn malformed(
        name: impl Into<String>,
        version: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedRecord {
            name: name.into(),
            version: version.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// True for `NotFound`
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}
