//! Contract lifecycle — creation, milestone updates and status changes.
//!
//! Every mutation follows the same order: read current state, compute the new
//! version, store an immutable snapshot, then persist the record with the new
//! snapshot pointer. A snapshot failure aborts before anything is persisted.
//! Writers to the same contract are serialized through a per-id lock.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::contracts::models::{
    compute_progress, Contract, ContractStatus, MilestoneStatus, NewContract,
};
use crate::contracts::repository::ContractRepository;
use crate::errors::AppError;
use crate::storage::{SnapshotStore, StoreOptions};

const SNAPSHOT_COLLECTION: &str = "contracts";

pub struct ContractLifecycle {
    repo: Arc<dyn ContractRepository>,
    snapshots: Arc<dyn SnapshotStore>,
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ContractLifecycle {
    pub fn new(repo: Arc<dyn ContractRepository>, snapshots: Arc<dyn SnapshotStore>) -> Self {
        Self {
            repo,
            snapshots,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn lock_for(&self, contract_id: &str) -> Arc<Mutex<()>> {
        self.locks
            .lock()
            .await
            .entry(contract_id.to_string())
            .or_default()
            .clone()
    }

    /// Drops the id's entry once no other writer holds or awaits it.
    async fn release(&self, contract_id: &str, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock().await;
        drop(lock);
        if locks
            .get(contract_id)
            .is_some_and(|l| Arc::strong_count(l) == 1)
        {
            locks.remove(contract_id);
        }
    }

    pub async fn create_contract(&self, fields: NewContract) -> Result<Contract, AppError> {
        if !matches!(fields.status, ContractStatus::Draft | ContractStatus::Active) {
            return Err(AppError::Validation(format!(
                "A new contract must start as draft or active, not {}",
                fields.status.as_str()
            )));
        }

        let NewContract {
            name,
            client,
            freelancer,
            total_amount,
            status,
            milestones,
            terms,
        } = fields;

        let mut contract = Contract {
            id: format!("contract-{}", Uuid::new_v4().simple()),
            name,
            client,
            freelancer,
            total_amount,
            status,
            progress: 0,
            milestones,
            created_at: Utc::now(),
            terms,
            storage_identifier: None,
        };
        contract.refresh_progress();

        let options = StoreOptions::collection(SNAPSHOT_COLLECTION)
            .with_metadata("contractId", contract.id.clone())
            .with_metadata("clientAddress", contract.client.clone())
            .with_metadata("freelancerAddress", contract.freelancer.clone());

        self.snapshot_and_persist(&mut contract, options).await?;

        info!(
            "Created contract {} between {} and {} ({} milestones)",
            contract.id,
            contract.client,
            contract.freelancer,
            contract.milestones.len()
        );
        Ok(contract)
    }

    pub async fn update_milestone_status(
        &self,
        contract_id: &str,
        milestone_index: usize,
        status: MilestoneStatus,
    ) -> Result<Contract, AppError> {
        let lock = self.lock_for(contract_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.apply_milestone_update(contract_id, milestone_index, status)
                .await
        };
        self.release(contract_id, lock).await;
        result
    }

    /// Externally triggered transitions (activation, dispute, cancellation).
    pub async fn update_contract_status(
        &self,
        contract_id: &str,
        status: ContractStatus,
    ) -> Result<Contract, AppError> {
        let lock = self.lock_for(contract_id).await;
        let result = {
            let _guard = lock.lock().await;
            self.apply_status_update(contract_id, status).await
        };
        self.release(contract_id, lock).await;
        result
    }

    async fn apply_milestone_update(
        &self,
        contract_id: &str,
        milestone_index: usize,
        status: MilestoneStatus,
    ) -> Result<Contract, AppError> {
        let mut contract = self.require(contract_id).await?;

        if !contract.status.accepts_milestone_updates() {
            return Err(AppError::InvalidState(format!(
                "Contract {contract_id} is {} and no longer accepts milestone updates",
                contract.status.as_str()
            )));
        }

        let len = contract.milestones.len();
        let milestone = contract
            .milestones
            .get_mut(milestone_index)
            .ok_or(AppError::InvalidIndex {
                index: milestone_index,
                len,
            })?;
        milestone.status = status;
        contract.refresh_progress();

        let options = StoreOptions::collection(SNAPSHOT_COLLECTION)
            .with_metadata("contractId", contract_id)
            .with_metadata("action", "milestone-update")
            .with_metadata("milestoneIndex", milestone_index)
            .with_metadata("status", status.as_str());

        self.snapshot_and_persist(&mut contract, options).await?;

        info!(
            "Contract {contract_id} milestone {milestone_index} -> {}; progress {}%, status {}",
            status.as_str(),
            contract.progress,
            contract.status.as_str()
        );
        Ok(contract)
    }

    async fn apply_status_update(
        &self,
        contract_id: &str,
        status: ContractStatus,
    ) -> Result<Contract, AppError> {
        let mut contract = self.require(contract_id).await?;

        if !contract.status.can_transition_to(status) {
            return Err(AppError::InvalidState(format!(
                "Contract {contract_id} cannot move from {} to {}",
                contract.status.as_str(),
                status.as_str()
            )));
        }
        let previous = contract.status;
        contract.status = status;

        let options = StoreOptions::collection(SNAPSHOT_COLLECTION)
            .with_metadata("contractId", contract_id)
            .with_metadata("action", "status-update")
            .with_metadata("status", status.as_str());

        self.snapshot_and_persist(&mut contract, options).await?;

        info!(
            "Contract {contract_id} status {} -> {}",
            previous.as_str(),
            status.as_str()
        );
        Ok(contract)
    }

    pub async fn get_contract(&self, contract_id: &str) -> Result<Contract, AppError> {
        self.require(contract_id).await
    }

    /// Contracts where `address` is client or freelancer, in store order.
    pub async fn list_contracts_for_party(&self, address: &str) -> Result<Vec<Contract>, AppError> {
        self.repo.list_for_party(address).await
    }

    async fn require(&self, contract_id: &str) -> Result<Contract, AppError> {
        self.repo
            .get_by_id(contract_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Contract with ID {contract_id} not found")))
    }

    /// Snapshot first; only a stored snapshot may be pointed at by the record.
    async fn snapshot_and_persist(
        &self,
        contract: &mut Contract,
        options: StoreOptions,
    ) -> Result<(), AppError> {
        debug_assert_eq!(contract.progress, compute_progress(&contract.milestones));

        contract.storage_identifier = None;
        let payload = serde_json::to_value(&*contract).map_err(|e| AppError::Internal(e.into()))?;
        let receipt = self.snapshots.store(&payload, options).await?;

        contract.storage_identifier = Some(receipt.identifier);
        self.repo.upsert(contract).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::models::Milestone;
    use crate::contracts::repository::InMemoryContractRepository;
    use crate::storage::{InMemorySnapshotStore, StoreReceipt};
    use async_trait::async_trait;
    use serde_json::Value;

    struct UnavailableSnapshotStore;

    #[async_trait]
    impl SnapshotStore for UnavailableSnapshotStore {
        async fn store(&self, _: &Value, _: StoreOptions) -> Result<StoreReceipt, AppError> {
            Err(AppError::StorageUnavailable("bucket offline".to_string()))
        }

        async fn retrieve(&self, _: &str) -> Result<Value, AppError> {
            Err(AppError::StorageUnavailable("bucket offline".to_string()))
        }
    }

    fn milestone(payment: &str) -> Milestone {
        Milestone {
            name: format!("Deliver {payment}"),
            description: String::new(),
            deadline: "2025-09-30".to_string(),
            payment: payment.to_string(),
            status: MilestoneStatus::Pending,
        }
    }

    fn new_contract(client: &str, freelancer: &str) -> NewContract {
        NewContract {
            name: "Website Development".to_string(),
            client: client.to_string(),
            freelancer: freelancer.to_string(),
            total_amount: "2 ETH".to_string(),
            status: ContractStatus::Active,
            milestones: vec![milestone("0.5 ETH"), milestone("0.7 ETH"), milestone("0.8 ETH")],
            terms: "Net 7 on each milestone".to_string(),
        }
    }

    fn setup() -> (
        ContractLifecycle,
        Arc<InMemoryContractRepository>,
        Arc<InMemorySnapshotStore>,
    ) {
        let repo = Arc::new(InMemoryContractRepository::new());
        let snapshots = Arc::new(InMemorySnapshotStore::new());
        let lifecycle = ContractLifecycle::new(repo.clone(), snapshots.clone());
        (lifecycle, repo, snapshots)
    }

    #[tokio::test]
    async fn test_create_then_get_round_trips() {
        let (lifecycle, repo, snapshots) = setup();
        let created = lifecycle
            .create_contract(new_contract("0xclient", "0xfree"))
            .await
            .unwrap();

        assert!(created.id.starts_with("contract-"));
        assert_eq!(created.progress, 0);
        assert_eq!(created.status, ContractStatus::Active);
        let pointer = created.storage_identifier.clone().unwrap();

        let fetched = repo.get_by_id(&created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);

        let receipt = snapshots.receipt(&pointer).await.unwrap();
        assert_eq!(receipt.collection, "contracts");
        assert_eq!(receipt.metadata["contractId"], created.id.as_str());
        assert_eq!(receipt.metadata["clientAddress"], "0xclient");
    }

    #[tokio::test]
    async fn test_create_rejects_terminal_status() {
        let (lifecycle, repo, _) = setup();
        let mut fields = new_contract("0xc", "0xf");
        fields.status = ContractStatus::Completed;

        let err = lifecycle.create_contract(fields).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_milestones_drive_progress_to_completion() {
        let (lifecycle, _, _) = setup();
        let created = lifecycle
            .create_contract(new_contract("0xc", "0xf"))
            .await
            .unwrap();

        let after_first = lifecycle
            .update_milestone_status(&created.id, 0, MilestoneStatus::Completed)
            .await
            .unwrap();
        assert_eq!(after_first.progress, 33);
        assert_eq!(after_first.status, ContractStatus::Active);

        lifecycle
            .update_milestone_status(&created.id, 1, MilestoneStatus::Completed)
            .await
            .unwrap();
        let done = lifecycle
            .update_milestone_status(&created.id, 2, MilestoneStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.progress, 100);
        assert_eq!(done.status, ContractStatus::Completed);
    }

    #[tokio::test]
    async fn test_every_mutation_replaces_snapshot_pointer() {
        let (lifecycle, _, snapshots) = setup();
        let created = lifecycle
            .create_contract(new_contract("0xc", "0xf"))
            .await
            .unwrap();
        let updated = lifecycle
            .update_milestone_status(&created.id, 1, MilestoneStatus::InProgress)
            .await
            .unwrap();

        let pointer = updated.storage_identifier.clone().unwrap();
        assert_ne!(created.storage_identifier.unwrap(), pointer);
        assert_eq!(snapshots.len().await, 2);

        let stored = snapshots.retrieve(&pointer).await.unwrap();
        assert_eq!(stored["milestones"][1]["status"], "in-progress");
        assert_eq!(stored["id"], created.id.as_str());

        let receipt = snapshots.receipt(&pointer).await.unwrap();
        assert_eq!(receipt.metadata["action"], "milestone-update");
        assert_eq!(receipt.metadata["milestoneIndex"], 1);
    }

    #[tokio::test]
    async fn test_draft_contract_completes_when_all_milestones_done() {
        let (lifecycle, _, _) = setup();
        let mut fields = new_contract("0xc", "0xf");
        fields.status = ContractStatus::Draft;
        fields.milestones.truncate(1);
        let created = lifecycle.create_contract(fields).await.unwrap();

        let done = lifecycle
            .update_milestone_status(&created.id, 0, MilestoneStatus::Completed)
            .await
            .unwrap();
        assert_eq!(done.progress, 100);
        assert_eq!(done.status, ContractStatus::Completed);
    }

    #[tokio::test]
    async fn test_completed_is_not_demoted() {
        let (lifecycle, _, _) = setup();
        let mut fields = new_contract("0xc", "0xf");
        fields.milestones.truncate(1);
        let created = lifecycle.create_contract(fields).await.unwrap();

        lifecycle
            .update_milestone_status(&created.id, 0, MilestoneStatus::Completed)
            .await
            .unwrap();
        let reopened = lifecycle
            .update_milestone_status(&created.id, 0, MilestoneStatus::InProgress)
            .await
            .unwrap();

        assert_eq!(reopened.progress, 0);
        assert_eq!(reopened.status, ContractStatus::Completed);
    }

    #[tokio::test]
    async fn test_unknown_contract_leaves_store_untouched() {
        let (lifecycle, repo, snapshots) = setup();
        lifecycle
            .create_contract(new_contract("0xc", "0xf"))
            .await
            .unwrap();
        let before = repo.get_all().await.unwrap();

        let err = lifecycle
            .update_milestone_status("contract-missing", 0, MilestoneStatus::Completed)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(repo.get_all().await.unwrap(), before);
        assert_eq!(snapshots.len().await, 1);
    }

    #[tokio::test]
    async fn test_lock_entries_do_not_outlive_writers() {
        let (lifecycle, _, _) = setup();
        for i in 0..1000 {
            let err = lifecycle
                .update_milestone_status(&format!("contract-bogus-{i}"), 0, MilestoneStatus::Completed)
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::NotFound(_)));
        }
        let _ = lifecycle
            .update_contract_status("contract-bogus", ContractStatus::Active)
            .await;
        assert!(lifecycle.locks.lock().await.is_empty());

        let created = lifecycle
            .create_contract(new_contract("0xc", "0xf"))
            .await
            .unwrap();
        lifecycle
            .update_milestone_status(&created.id, 0, MilestoneStatus::Completed)
            .await
            .unwrap();
        assert!(lifecycle.locks.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range_index_is_rejected() {
        let (lifecycle, repo, _) = setup();
        let created = lifecycle
            .create_contract(new_contract("0xc", "0xf"))
            .await
            .unwrap();

        let err = lifecycle
            .update_milestone_status(&created.id, 3, MilestoneStatus::Completed)
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::InvalidIndex { index: 3, len: 3 }));
        assert_eq!(repo.get_by_id(&created.id).await.unwrap().unwrap(), created);
    }

    #[tokio::test]
    async fn test_storage_failure_aborts_without_persisting() {
        let repo = Arc::new(InMemoryContractRepository::new());
        let lifecycle = ContractLifecycle::new(repo.clone(), Arc::new(UnavailableSnapshotStore));

        let err = lifecycle
            .create_contract(new_contract("0xc", "0xf"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::StorageUnavailable(_)));
        assert!(repo.get_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_disputed_contract_rejects_milestone_updates() {
        let (lifecycle, _, _) = setup();
        let created = lifecycle
            .create_contract(new_contract("0xc", "0xf"))
            .await
            .unwrap();
        lifecycle
            .update_contract_status(&created.id, ContractStatus::Disputed)
            .await
            .unwrap();

        let err = lifecycle
            .update_milestone_status(&created.id, 0, MilestoneStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_status_transitions_are_guarded() {
        let (lifecycle, _, _) = setup();
        let mut fields = new_contract("0xc", "0xf");
        fields.status = ContractStatus::Draft;
        let created = lifecycle.create_contract(fields).await.unwrap();

        let active = lifecycle
            .update_contract_status(&created.id, ContractStatus::Active)
            .await
            .unwrap();
        assert_eq!(active.status, ContractStatus::Active);

        let err = lifecycle
            .update_contract_status(&created.id, ContractStatus::Completed)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidState(_)));
    }

    #[tokio::test]
    async fn test_list_for_party_filters_and_keeps_store_order() {
        let (lifecycle, repo, _) = setup();
        let a = lifecycle.create_contract(new_contract("0xaaa", "0xbbb")).await.unwrap();
        lifecycle.create_contract(new_contract("0xccc", "0xddd")).await.unwrap();
        let c = lifecycle.create_contract(new_contract("0xeee", "0xaaa")).await.unwrap();
        let before = repo.get_all().await.unwrap();

        let listed = lifecycle.list_contracts_for_party("0xaaa").await.unwrap();

        assert_eq!(listed, vec![a, c]);
        assert_eq!(repo.get_all().await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_concurrent_updates_do_not_lose_writes() {
        let (lifecycle, _, _) = setup();
        let lifecycle = Arc::new(lifecycle);
        let mut fields = new_contract("0xc", "0xf");
        fields.milestones = (0..10).map(|i| milestone(&format!("0.{i} ETH"))).collect();
        let created = lifecycle.create_contract(fields).await.unwrap();

        let handles: Vec<_> = (0..10)
            .map(|i| {
                let lifecycle = lifecycle.clone();
                let id = created.id.clone();
                tokio::spawn(async move {
                    lifecycle
                        .update_milestone_status(&id, i, MilestoneStatus::Completed)
                        .await
                })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let finished = lifecycle.get_contract(&created.id).await.unwrap();
        assert_eq!(finished.progress, 100);
        assert_eq!(finished.status, ContractStatus::Completed);
        assert!(lifecycle.locks.lock().await.is_empty());
    }
}
