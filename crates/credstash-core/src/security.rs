//! Security utilities for secret retrieval
//!
//! Provides:
//! - SecureString with zeroize
//! - Audit logging (never logs secret values)

use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// A secure string that is automatically zeroed on drop
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct SecureString {
    inner: String,
}

impl SecureString {
    /// Create a new secure string
    pub fn new(value: String) -> Self {
        Self { inner: value }
    }

    /// Get the string value (use with caution)
    pub fn expose(&self) -> &str {
        &self.inner
    }

}

impl From<String> for SecureString {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl fmt::Debug for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SecureString([REDACTED {} bytes])", self.inner.len())
    }
}

impl fmt::Display for SecureString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// Audit log entry for a secret read
#[derive(Debug, Clone)]
pub struct AuditLog {
    pub secret_name: String,
    pub version: Option<String>,
    pub table: String,
    pub success: bool,
    pub error: Option<String>,
    pub timestamp: std::time::SystemTime,
}

impl AuditLog {
    pub fn new(secret_name: &str, table: &str) -> Self {
        Self {
            secret_name: secret_name.to_string(),
            version: None,
            table: table.to_string(),
            success: true,
            error: None,
            timestamp: std::time::SystemTime::now(),
        }
    }

    pub fn with_version(mut self, version: &str) -> Self {
        self.version = Some(version.to_string());
        self
    }

    pub fn with_error(mut self, error: String) -> Self {
        self.success = false;
        self.error = Some(error);
        self
    }

    /// Log the audit entry (never logs secret values)
    pub fn log(&self) {
        if self.success {
            tracing::info!(
                secret_name = %self.secret_name,
                version = ?self.version,
                table = %self.table,
                timestamp = ?self.timestamp,
                "Secret read successful"
            );
        } else {
            tracing::warn!(
                secret_name = %self.secret_name,
                version = ?self.version,
                table = %self.table,
                error = ?self.error,
                timestamp = ?self.timestamp,
                "Secret read failed"
            );
        }
    }
}
