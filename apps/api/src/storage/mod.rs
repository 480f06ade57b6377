//! Snapshot storage — the immutable "DSN" pointer for every contract version.
//!
//! Callers hand over an arbitrary JSON payload and get back an opaque identifier.
//! The lifecycle manager only ever talks to the `SnapshotStore` trait, so the
//! in-memory backend can be swapped for object storage without touching it.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::errors::AppError;

pub mod handlers;
pub mod memory;
pub mod s3;

pub use memory::InMemorySnapshotStore;
pub use s3::S3SnapshotStore;

/// Namespace every snapshot identifier starts with.
pub const SNAPSHOT_ID_PREFIX: &str = "autonomys-";
pub const DEFAULT_COLLECTION: &str = "default";

#[derive(Debug, Clone, Default)]
pub struct StoreOptions {
    pub collection: Option<String>,
    pub metadata: Option<BTreeMap<String, Value>>,
}

impl StoreOptions {
    pub fn collection(name: &str) -> Self {
        Self {
            collection: Some(name.to_string()),
            metadata: None,
        }
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(BTreeMap::new)
            .insert(key.to_string(), value.into());
        self
    }
}

/// Returned by every successful `store`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreReceipt {
    pub identifier: String,
    pub timestamp: DateTime<Utc>,
    pub collection: String,
    pub metadata: BTreeMap<String, Value>,
}

impl StoreReceipt {
    fn new(options: StoreOptions) -> Self {
        Self {
            identifier: new_identifier(),
            timestamp: Utc::now(),
            collection: options
                .collection
                .unwrap_or_else(|| DEFAULT_COLLECTION.to_string()),
            metadata: options.metadata.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationResult {
    pub authentic: bool,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

impl VerificationResult {
    fn from_comparison(stored: &Value, candidate: &Value) -> Self {
        let authentic = stored == candidate;
        Self {
            authentic,
            timestamp: Utc::now(),
            message: if authentic {
                "Payload matches the stored snapshot".to_string()
            } else {
                "Payload differs from the stored snapshot".to_string()
            },
        }
    }
}

/// Content store for immutable snapshots. Carried in `AppState` as `Arc<dyn SnapshotStore>`.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Stores `payload` and returns a fresh identifier. No dedup: storing the
    /// same payload twice yields two identifiers.
    async fn store(&self, payload: &Value, options: StoreOptions) -> Result<StoreReceipt, AppError>;

    /// Returns exactly the payload stored under `identifier`.
    async fn retrieve(&self, identifier: &str) -> Result<Value, AppError>;

    async fn verify(
        &self,
        identifier: &str,
        candidate: &Value,
    ) -> Result<VerificationResult, AppError> {
        let stored = self.retrieve(identifier).await?;
        Ok(VerificationResult::from_comparison(&stored, candidate))
    }
}

fn new_identifier() -> String {
    format!("{SNAPSHOT_ID_PREFIX}{}", Uuid::new_v4().simple())
}

/// Rejects identifiers outside the snapshot namespace.
pub fn check_identifier(identifier: &str) -> Result<(), AppError> {
    match identifier.strip_prefix(SNAPSHOT_ID_PREFIX) {
        Some(rest) if !rest.is_empty() => Ok(()),
        _ => Err(AppError::InvalidIdentifier(identifier.to_string())),
    }
}
