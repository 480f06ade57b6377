use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::info;

use crate::errors::AppError;
use crate::storage::{check_identifier, SnapshotStore, StoreOptions, StoreReceipt};

/// Process-local snapshot store. Nothing survives a restart.
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: RwLock<HashMap<String, (Value, StoreReceipt)>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub async fn len(&self) -> usize {
        self.snapshots.read().await.len()
    }

    #[cfg(test)]
    pub async fn receipt(&self, identifier: &str) -> Option<StoreReceipt> {
        self.snapshots
            .read()
            .await
            .get(identifier)
            .map(|(_, receipt)| receipt.clone())
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn store(&self, payload: &Value, options: StoreOptions) -> Result<StoreReceipt, AppError> {
        let receipt = StoreReceipt::new(options);
        self.snapshots
            .write()
            .await
            .insert(receipt.identifier.clone(), (payload.clone(), receipt.clone()));

        info!(
            "Stored snapshot {} in collection '{}'",
            receipt.identifier, receipt.collection
        );
        Ok(receipt)
    }

    async fn retrieve(&self, identifier: &str) -> Result<Value, AppError> {
        check_identifier(identifier)?;
        info!("Retrieving snapshot {identifier}");

        self.snapshots
            .read()
            .await
            .get(identifier)
            .map(|(payload, _)| payload.clone())
            .ok_or_else(|| AppError::NotFound(format!("Snapshot {identifier} not found")))
    }
}
