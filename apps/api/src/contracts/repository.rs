//! Contract persistence. One record per contract id; the lifecycle manager
//! serializes writers, the repository only guarantees per-record replacement.

use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::contracts::models::Contract;
use crate::errors::AppError;

#[async_trait]
pub trait ContractRepository: Send + Sync {
    /// All contracts in insertion order.
    async fn get_all(&self) -> Result<Vec<Contract>, AppError>;

    async fn get_by_id(&self, id: &str) -> Result<Option<Contract>, AppError>;

    /// Replaces the record with the same id, or appends a new one.
    async fn upsert(&self, contract: &Contract) -> Result<(), AppError>;

    async fn list_for_party(&self, address: &str) -> Result<Vec<Contract>, AppError> {
        Ok(self
            .get_all()
            .await?
            .into_iter()
            .filter(|c| c.involves(address))
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryContractRepository {
    contracts: RwLock<Vec<Contract>>,
}

impl InMemoryContractRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContractRepository for InMemoryContractRepository {
    async fn get_all(&self) -> Result<Vec<Contract>, AppError> {
        Ok(self.contracts.read().await.clone())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Contract>, AppError> {
        Ok(self
            .contracts
            .read()
            .await
            .iter()
            .find(|c| c.id == id)
            .cloned())
    }

    async fn upsert(&self, contract: &Contract) -> Result<(), AppError> {
        let mut contracts = self.contracts.write().await;
        match contracts.iter_mut().find(|c| c.id == contract.id) {
            Some(existing) => *existing = contract.clone(),
            None => contracts.push(contract.clone()),
        }
        Ok(())
    }
}

/// PostgreSQL-backed repository. The full record lives in a JSONB column;
/// party addresses are duplicated into columns for filtering.
pub struct PgContractRepository {
    pool: PgPool,
}

impl PgContractRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContractRepository for PgContractRepository {
    async fn get_all(&self) -> Result<Vec<Contract>, AppError> {
        let rows: Vec<Json<Contract>> =
            sqlx::query_scalar("SELECT record FROM contracts ORDER BY position ASC")
                .fetch_all(&self.pool)
                .await?;
        Ok(rows.into_iter().map(|Json(c)| c).collect())
    }

    async fn get_by_id(&self, id: &str) -> Result<Option<Contract>, AppError> {
        let row: Option<Json<Contract>> =
            sqlx::query_scalar("SELECT record FROM contracts WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|Json(c)| c))
    }

    async fn upsert(&self, contract: &Contract) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO contracts (id, client, freelancer, record)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id) DO UPDATE
                SET client = EXCLUDED.client,
                    freelancer = EXCLUDED.freelancer,
                    record = EXCLUDED.record,
                    updated_at = NOW()
            "#,
        )
        .bind(&contract.id)
        .bind(&contract.client)
        .bind(&contract.freelancer)
        .bind(Json(contract))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_for_party(&self, address: &str) -> Result<Vec<Contract>, AppError> {
        let rows: Vec<Json<Contract>> = sqlx::query_scalar(
            "SELECT record FROM contracts WHERE client = $1 OR freelancer = $1 ORDER BY position ASC",
        )
        .bind(address)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(|Json(c)| c).collect())
    }
}
