//! Persistence of inference job outcomes.

mod persistence;
mod record;

pub use persistence::{JsonFileStore, MemoryStore, ResultStore};
pub use record::{JobListing, JobRecord, JobStatus, NewJobRecord, RecordId};
