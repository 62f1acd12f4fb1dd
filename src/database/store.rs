use async_trait::async_trait;
use serde::Serialize;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::student::{NewStudent, Student, StudentPatch};
use crate::filter::types::{SortSpec, StudentFilter};

/// Result of a replace-or-insert write
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertOutcome {
    pub record: Student,
    pub is_newly_created: bool,
}

/// Persistence port for the students collection. Each method is a single
/// logical write or read; implementations rely on per-row atomicity only.
#[async_trait]
pub trait StudentStore: Send + Sync {
    async fn count(&self, filter: &StudentFilter) -> Result<u64, DatabaseError>;

    async fn find(
        &self,
        filter: &StudentFilter,
        skip: u64,
        limit: u64,
        sort: SortSpec,
    ) -> Result<Vec<Student>, DatabaseError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>, DatabaseError>;

    /// Insert with a freshly assigned id
    async fn insert(&self, new: NewStudent, photo: Option<String>) -> Result<Student, DatabaseError>;

    /// Replace the record's fields if `id` exists, otherwise create it under `id`.
    /// `photo` of `None` leaves an existing photo in place.
    async fn replace_or_insert(
        &self,
        id: Uuid,
        new: NewStudent,
        photo: Option<String>,
    ) -> Result<UpsertOutcome, DatabaseError>;

    /// Merge present fields; `None` when no record has `id`
    async fn merge_update(&self, id: Uuid, patch: StudentPatch) -> Result<Option<Student>, DatabaseError>;

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<Student>, DatabaseError>;

    async fn health_check(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}
