// Contract tracker: milestone-based agreements between a client and a freelancer,
// each version pinned to an immutable snapshot in the storage adapter.

pub mod handlers;
pub mod lifecycle;
pub mod models;
pub mod repository;

pub use lifecycle::ContractLifecycle;
pub use repository::{ContractRepository, InMemoryContractRepository, PgContractRepository};
