use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use serde_json::Value;
use tracing::info;

use crate::errors::AppError;
use crate::storage::{check_identifier, SnapshotStore, StoreOptions, StoreReceipt};

const KEY_PREFIX: &str = "snapshots";

/// Snapshot store backed by an S3-compatible bucket (MinIO locally).
/// Objects are written once and never overwritten.
pub struct S3SnapshotStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    timeout: Duration,
}

impl S3SnapshotStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, timeout: Duration) -> Self {
        Self {
            client,
            bucket,
            timeout,
        }
    }
}

/// Every call is bounded; a slow bucket fails the whole operation.
async fn with_timeout<T, F>(timeout: Duration, op: &str, fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, AppError>>,
{
    tokio::time::timeout(timeout, fut).await.map_err(|_| {
        AppError::StorageUnavailable(format!(
            "S3 {op} timed out after {}s",
            timeout.as_secs()
        ))
    })?
}

pub fn object_key(identifier: &str) -> String {
    format!("{KEY_PREFIX}/{identifier}.json")
}

#[async_trait]
impl SnapshotStore for S3SnapshotStore {
    async fn store(&self, payload: &Value, options: StoreOptions) -> Result<StoreReceipt, AppError> {
        let receipt = StoreReceipt::new(options);
        let key = object_key(&receipt.identifier);
        let body = serde_json::to_vec(payload).map_err(|e| AppError::Internal(e.into()))?;
        let metadata =
            serde_json::to_string(&receipt.metadata).map_err(|e| AppError::Internal(e.into()))?;

        with_timeout(self.timeout, "upload", async {
            self.client
                .put_object()
                .bucket(&self.bucket)
                .key(&key)
                .body(ByteStream::from(body))
                .content_type("application/json")
                .metadata("collection", &receipt.collection)
                .metadata("snapshot-metadata", metadata)
                .send()
                .await
                .map_err(|e| AppError::StorageUnavailable(format!("S3 upload failed: {e}")))
        })
        .await?;

        info!(
            "Stored snapshot {} at s3://{}/{}",
            receipt.identifier, self.bucket, key
        );
        Ok(receipt)
    }

    async fn retrieve(&self, identifier: &str) -> Result<Value, AppError> {
        check_identifier(identifier)?;
        let key = object_key(identifier);
        info!("Retrieving snapshot {identifier} from s3://{}/{}", self.bucket, key);

        let bytes: Bytes = with_timeout(self.timeout, "download", async {
            let output = self
                .client
                .get_object()
                .bucket(&self.bucket)
                .key(&key)
                .send()
                .await
                .map_err(|e| {
                    if e.as_service_error().map(|se| se.is_no_such_key()) == Some(true) {
                        AppError::NotFound(format!("Snapshot {identifier} not found"))
                    } else {
                        AppError::StorageUnavailable(format!("S3 download failed: {e}"))
                    }
                })?;

            output
                .body
                .collect()
                .await
                .map(|data| data.into_bytes())
                .map_err(|e| AppError::StorageUnavailable(format!("S3 read failed: {e}")))
        })
        .await?;

        serde_json::from_slice(&bytes).map_err(|e| {
            AppError::StorageUnavailable(format!("Snapshot {identifier} is not valid JSON: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_object_key_layout() {
        assert_eq!(
            object_key("autonomys-abc123"),
            "snapshots/autonomys-abc123.json"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stalled_call_times_out_as_unavailable() {
        let err = with_timeout(
            Duration::from_secs(5),
            "upload",
            std::future::pending::<Result<(), AppError>>(),
        )
        .await
        .unwrap_err();
        match err {
            AppError::StorageUnavailable(message) => {
                assert_eq!(message, "S3 upload timed out after 5s")
            }
            other => panic!("expected StorageUnavailable, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_within_deadline_passes_through() {
        let value = with_timeout(Duration::from_secs(5), "download", async {
            tokio::time::sleep(Duration::from_secs(4)).await;
            Ok::<_, AppError>(7)
        })
        .await
        .unwrap();
        assert_eq!(value, 7);

        let err = with_timeout(Duration::from_secs(5), "download", async {
            Err::<(), _>(AppError::NotFound("gone".to_string()))
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
