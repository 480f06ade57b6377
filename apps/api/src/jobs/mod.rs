// Job board: postings, search, applications and candidate profiles.

pub mod handlers;
pub mod models;
pub mod prompts;
pub mod store;

pub use store::{InMemoryJobStore, JobStore, PgJobStore};
