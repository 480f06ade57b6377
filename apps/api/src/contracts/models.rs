use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MilestoneStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Disputed,
}

impl MilestoneStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MilestoneStatus::Pending => "pending",
            MilestoneStatus::InProgress => "in-progress",
            MilestoneStatus::Completed => "completed",
            MilestoneStatus::Disputed => "disputed",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractStatus {
    Draft,
    Active,
    Completed,
    Cancelled,
    Disputed,
}

impl ContractStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContractStatus::Draft => "draft",
            ContractStatus::Active => "active",
            ContractStatus::Completed => "completed",
            ContractStatus::Cancelled => "cancelled",
            ContractStatus::Disputed => "disputed",
        }
    }

    /// Transitions a caller may request directly. `completed` is only ever
    /// reached through milestone progress, from draft or active alike: a
    /// draft whose milestones all complete becomes completed without an
    /// activation step.
    pub fn can_transition_to(&self, next: ContractStatus) -> bool {
        use ContractStatus::*;
        matches!(
            (self, next),
            (Draft, Active) | (Draft, Cancelled) | (Active, Disputed) | (Active, Cancelled)
        )
    }

    /// Milestone work is frozen once a contract is cancelled or disputed.
    pub fn accepts_milestone_updates(&self) -> bool {
        !matches!(self, ContractStatus::Cancelled | ContractStatus::Disputed)
    }
}

/// A payable sub-deliverable. Order within a contract is significant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Free-form date string as entered by the parties.
    #[serde(default)]
    pub deadline: String,
    /// Amount plus currency label, e.g. "0.5 ETH".
    pub payment: String,
    #[serde(default)]
    pub status: MilestoneStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contract {
    pub id: String,
    pub name: String,
    /// Client wallet address.
    pub client: String,
    /// Freelancer wallet address.
    pub freelancer: String,
    pub total_amount: String,
    pub status: ContractStatus,
    /// 0 – 100, always derived from `milestones`.
    pub progress: u8,
    pub milestones: Vec<Milestone>,
    pub created_at: DateTime<Utc>,
    pub terms: String,
    /// Most recent snapshot only; replaced on every mutation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_identifier: Option<String>,
}

impl Contract {
    pub fn involves(&self, address: &str) -> bool {
        self.client == address || self.freelancer == address
    }

    /// Recomputes `progress` and promotes to `completed` at 100, whatever the
    /// prior status. Never demotes a completed contract.
    pub fn refresh_progress(&mut self) {
        self.progress = compute_progress(&self.milestones);
        if self.progress == 100 {
            self.status = ContractStatus::Completed;
        }
    }
}

/// Caller-supplied fields for a new contract.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContract {
    pub name: String,
    pub client: String,
    pub freelancer: String,
    pub total_amount: String,
    pub status: ContractStatus,
    pub milestones: Vec<Milestone>,
    #[serde(default)]
    pub terms: String,
}

/// round(100 × completed / total), halves rounded up. No milestones → 0.
pub fn compute_progress(milestones: &[Milestone]) -> u8 {
    let total = milestones.len();
    if total == 0 {
        return 0;
    }
    let completed = milestones
        .iter()
        .filter(|m| m.status == MilestoneStatus::Completed)
        .count();
    // (200c + t) / 2t == floor(100c/t + 1/2)
    ((200 * completed + total) / (2 * total)) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn milestones(statuses: &[MilestoneStatus]) -> Vec<Milestone> {
        statuses
            .iter()
            .enumerate()
            .map(|(i, status)| Milestone {
                name: format!("Milestone {i}"),
                description: String::new(),
                deadline: "2025-06-01".to_string(),
                payment: "0.5 ETH".to_string(),
                status: *status,
            })
            .collect()
    }

    #[test]
    fn test_progress_rounds_to_nearest() {
        use MilestoneStatus::*;
        assert_eq!(compute_progress(&milestones(&[Completed, Pending, Pending])), 33);
        assert_eq!(compute_progress(&milestones(&[Completed, Completed, Pending])), 67);
        assert_eq!(compute_progress(&milestones(&[Completed, Completed, Completed])), 100);
    }

    #[test]
    fn test_progress_half_rounds_up() {
        use MilestoneStatus::*;
        let mut statuses = vec![Pending; 8];
        statuses[0] = Completed;
        // 12.5 → 13
        assert_eq!(compute_progress(&milestones(&statuses)), 13);
    }

    #[test]
    fn test_progress_without_milestones_is_zero() {
        assert_eq!(compute_progress(&[]), 0);
    }

    #[test]
    fn test_in_progress_and_disputed_do_not_count() {
        use MilestoneStatus::*;
        assert_eq!(compute_progress(&milestones(&[InProgress, Disputed])), 0);
    }

    #[test]
    fn test_transitions() {
        use ContractStatus::*;
        assert!(Draft.can_transition_to(Active));
        assert!(Active.can_transition_to(Disputed));
        assert!(Active.can_transition_to(Cancelled));
        assert!(!Active.can_transition_to(Completed));
        assert!(!Completed.can_transition_to(Active));
        assert!(!Disputed.can_transition_to(Active));
        assert!(!Cancelled.can_transition_to(Draft));
    }

    #[test]
    fn test_milestone_status_defaults_to_pending() {
        let m: Milestone = serde_json::from_value(json!({
            "name": "Design Approval",
            "payment": "0.5 ETH"
        }))
        .unwrap();
        assert_eq!(m.status, MilestoneStatus::Pending);

        let m: Milestone = serde_json::from_value(json!({
            "name": "Frontend",
            "payment": "0.7 ETH",
            "status": "in-progress"
        }))
        .unwrap();
        assert_eq!(m.status, MilestoneStatus::InProgress);
    }

    #[test]
    fn test_contract_serializes_camel_case() {
        let contract = Contract {
            id: "contract-1".to_string(),
            name: "Website Development".to_string(),
            client: "0x1234".to_string(),
            freelancer: "0x8765".to_string(),
            total_amount: "2 ETH".to_string(),
            status: ContractStatus::Active,
            progress: 0,
            milestones: vec![],
            created_at: Utc::now(),
            terms: String::new(),
            storage_identifier: Some("autonomys-1".to_string()),
        };
        let value = serde_json::to_value(&contract).unwrap();
        assert_eq!(value["totalAmount"], "2 ETH");
        assert_eq!(value["storageIdentifier"], "autonomys-1");
        assert_eq!(value["status"], "active");
        assert!(value.get("createdAt").is_some());
    }
}
