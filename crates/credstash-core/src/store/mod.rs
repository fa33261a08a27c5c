//! Versioned secret stores
//!
//! A store returns one record per (name, version). With no version it returns
//! the record whose zero-padded version sorts last. Stores never cache.

pub mod dynamodb;
pub mod memory;

use crate::error::Result;
use crate::types::SecretRecord;
use async_trait::async_trait;

pub use dynamodb::DynamoDbStore;
pub use memory::MemoryStore;

/// Read capability of a versioned key-value table
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetch `name` at `version` from `table`, or the latest version when
    /// `version` is `None`
    ///
    /// Returns `Error::NotFound` when no matching record exists.
    async fn get_record(
        &self,
        name: &str,
        version: Option<&str>,
        table: &str,
    ) -> Result<SecretRecord>;

    /// Store name for logs
    fn name(&self) -> &'static str;
}
