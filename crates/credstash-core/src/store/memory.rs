//! In-memory secret store
//!
//! Holds records per table for local use and tests. Counts reads so callers
//! can check that nothing is cached above it.

use crate::error::{Error, Result};
use crate::store::SecretStore;
use crate::types::{select_latest, SecretRecord};
use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// Records keyed by table, then (name, version)
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, BTreeMap<(String, String), SecretRecord>>>,
    reads: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record in `table`
    pub fn insert(&self, table: &str, record: SecretRecord) {
        let mut tables = self.tables.write().unwrap_or_else(|e| e.into_inner());
        tables
            .entry(table.to_string())
            .or_default()
            .insert((record.name.clone(), record.version.clone()), record);
    }

    /// Number of `get_record` calls served
    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for MemoryStore {
    async fn get_record(
        &self,
        name: &str,
        version: Option<&str>,
        table: &str,
    ) -> Result<SecretRecord> {
        self.reads.fetch_add(1, Ordering::SeqCst);

        let tables = self.tables.read().unwrap_or_else(|e| e.into_inner());
        let rows = tables.get(table);

        let found = match version {
            Some(version) => rows
                .and_then(|rows| rows.get(&(name.to_string(), version.to_string())))
                .cloned(),
            None => select_latest(
                rows.map(|rows| {
                    rows.values()
                        .filter(|record| record.name == name)
                        .cloned()
                        .collect()
                })
                .unwrap_or_default(),
            ),
        };

        found.ok_or_else(|| Error::not_found(name, version, table))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::format_version;

    fn record(name: &str, version: u64) -> SecretRecord {
        SecretRecord {
            name: name.to_string(),
            version: format_version(version),
            wrapped_key: vec![version as u8],
            ciphertext: vec![],
            hmac_digest: String::new(),
        }
    }

    #[tokio::test]
    async fn test_latest_by_padded_version() {
        let store = MemoryStore::new();
        for v in [1, 2, 10] {
            store.insert("credential-store", record("api.key", v));
        }
        store.insert("credential-store", record("other", 99));

        let latest = store
            .get_record("api.key", None, "credential-store")
            .await
            .unwrap();
        assert_eq!(latest.version, "0000000000000000010");
    }

    #[tokio::test]
    async fn test_exact_version() {
        let store = MemoryStore::new();
        store.insert("t", record("api.key", 1));
        store.insert("t", record("api.key", 2));

        let pinned = store
            .get_record("api.key", Some("0000000000000000001"), "t")
            .await
            .unwrap();
        assert_eq!(pinned.wrapped_key, vec![1]);
    }

    #[tokio::test]
    async fn test_missing_is_not_found() {
        let store = MemoryStore::new();
        store.insert("t", record("api.key", 1));

        let err = store.get_record("nope", None, "t").await.unwrap_err();
        assert!(err.is_not_found());

        let err = store
            .get_record("api.key", Some("0000000000000000005"), "t")
            .await
            .unwrap_err();
        assert!(err.is_not_found());

        let err = store.get_record("api.key", None, "other-table").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_counts_reads() {
        let store = MemoryStore::new();
        store.insert("t", record("api.key", 1));
        let _ = store.get_record("api.key", None, "t").await;
        let _ = store.get_record("api.key", None, "t").await;
        assert_eq!(store.reads(), 2);
    }
}
