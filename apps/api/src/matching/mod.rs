// Job matching: an external model scores jobs against a candidate profile;
// this module validates, ranks and joins its answer with the job records.

pub mod delegate;
pub mod handlers;
pub mod prompts;
pub mod ranking;

pub use delegate::{JobMatch, LlmMatchingDelegate, MatchResponse, MatchingDelegate};
