// Resume intake: upload, text extraction and AI analysis of the stored text.

pub mod analysis;
pub mod extract;
pub mod handlers;
pub mod prompts;
