//! Job records kept by the result store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::schema::ReadableSchema;

/// Record identifier, assigned by the store.
pub type RecordId = u64;

/// One processed upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: RecordId,
    pub file_name: String,
    /// Whether inference finished successfully.
    pub completed: bool,
    /// Readable schema; empty when the job failed.
    pub data_types: ReadableSchema,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    pub fn status(&self) -> JobStatus {
        if self.completed {
            JobStatus::Success
        } else {
            JobStatus::Failed
        }
    }

    /// Listing view of the record.
    pub fn listing(&self) -> JobListing {
        JobListing {
            id: self.id,
            name: self.file_name.clone(),
            status: self.status(),
            dtypes: self.data_types.clone(),
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// A record before the store has assigned an id and timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewJobRecord {
    pub file_name: String,
    pub completed: bool,
    pub data_types: ReadableSchema,
}

impl NewJobRecord {
    /// A completed job with its readable schema.
    pub fn succeeded(file_name: impl Into<String>, data_types: ReadableSchema) -> Self {
        Self {
            file_name: file_name.into(),
            completed: true,
            data_types,
        }
    }

    /// A failed job; the schema is left empty.
    pub fn failed(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            completed: false,
            data_types: ReadableSchema::new(),
        }
    }
}

/// Outcome shown in listings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JobStatus {
    Success,
    Failed,
}

/// A record as exposed by listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobListing {
    pub id: RecordId,
    pub name: String,
    pub status: JobStatus,
    pub dtypes: ReadableSchema,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(completed: bool) -> JobRecord {
        let now = Utc::now();
        JobRecord {
            id: 7,
            file_name: "data.csv".to_string(),
            completed,
            data_types: ReadableSchema::new(),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_status_follows_completed() {
        assert_eq!(record(true).status(), JobStatus::Success);
        assert_eq!(record(false).status(), JobStatus::Failed);
    }

    #[test]
    fn test_listing_serializes_status_names() {
        let json = serde_json::to_value(record(false).listing()).unwrap();
        assert_eq!(json["status"], "Failed");
        assert_eq!(json["name"], "data.csv");
        assert_eq!(json["dtypes"], serde_json::json!({}));
    }

    #[test]
    fn test_failed_record_has_empty_schema() {
        let new = NewJobRecord::failed("x.xlsx");
        assert!(!new.completed);
        assert!(new.data_types.is_empty());
    }
}
