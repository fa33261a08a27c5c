//! Credstash secret retrieval
//!
//! This crate reads secrets written by credstash:
//! - **Store**: versioned DynamoDB table, latest version by zero-padded sort key
//! - **Envelope decryption**: per-secret key material wrapped by AWS KMS under an encryption context
//! - **Integrity**: HMAC-SHA256 checked in constant time before any decryption
//! - **Cipher**: AES-256-CTR payloads
//! - **Security**: zeroized key material and plaintext, audit logging without values
//!
//! ## Usage
//!
//! ```ignore
//! use credstash_core::{CredstashConfig, EncryptionContext, SecretClient};
//!
//! let config = CredstashConfig::load(None)?;
//! let client = SecretClient::from_config(&config).await?;
//!
//! let mut context = EncryptionContext::new();
//! context.insert("env".to_string(), "prod".to_string());
//!
//! let secret = client.get_secret("db.password", "", "", &context).await?;
//! ```

pub mod aws;
pub mod cipher;
pub mod client;
pub mod config;
pub mod error;
pub mod integrity;
pub mod kms;
pub mod security;
pub mod store;
pub mod types;

// Re-export commonly used items
pub use cipher::{Aes256CtrDecipher, Decipher};
pub use client::SecretClient;
pub use config::{AssumeRoleConfig, ClientConfig, CredstashConfig, EndpointConfig};
pub use error::{Error, KeyServiceFailure, Result};
pub use kms::{KeyService, KmsKeyService, UnwrappedMaterial};
pub use security::{AuditLog, SecureString};
pub use store::{DynamoDbStore, MemoryStore, SecretStore};
pub use types::{format_version, EncryptionContext, SecretRecord};
