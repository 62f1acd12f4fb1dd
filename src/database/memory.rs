//! In-process students store. Same query semantics as the PostgreSQL store;
//! used by tests and by `STORE_BACKEND=memory` deployments.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::database::manager::DatabaseError;
use crate::database::models::student::{NewStudent, Student, StudentPatch};
use crate::database::store::{StudentStore, UpsertOutcome};
use crate::filter::filter_order::FilterOrder;
use crate::filter::filter_where::FilterWhere;
use crate::filter::types::{SortSpec, StudentFilter};

#[derive(Default)]
pub struct MemoryStudentStore {
    records: RwLock<Vec<Student>>,
}

impl MemoryStudentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_records(records: Vec<Student>) -> Self {
        Self { records: RwLock::new(records) }
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }
}

#[async_trait]
impl StudentStore for MemoryStudentStore {
    async fn count(&self, filter: &StudentFilter) -> Result<u64, DatabaseError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|s| FilterWhere::matches(filter, s)).count() as u64)
    }

    async fn find(
        &self,
        filter: &StudentFilter,
        skip: u64,
        limit: u64,
        sort: SortSpec,
    ) -> Result<Vec<Student>, DatabaseError> {
        let records = self.records.read().await;
        let mut matching: Vec<&Student> = records.iter().filter(|s| FilterWhere::matches(filter, s)).collect();
        matching.sort_by(|a, b| FilterOrder::compare(a, b, &sort));

        let skip = usize::try_from(skip).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(matching.into_iter().skip(skip).take(limit).cloned().collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>, DatabaseError> {
        let records = self.records.read().await;
        Ok(records.iter().find(|s| s.id == id).cloned())
    }

    async fn insert(&self, new: NewStudent, photo: Option<String>) -> Result<Student, DatabaseError> {
        let student = Student::from_new(Uuid::now_v7(), new, photo, Utc::now());
        self.records.write().await.push(student.clone());
        Ok(student)
    }

    async fn replace_or_insert(
        &self,
        id: Uuid,
        new: NewStudent,
        photo: Option<String>,
    ) -> Result<UpsertOutcome, DatabaseError> {
        let mut records = self.records.write().await;
        let now = Utc::now();
        if let Some(existing) = records.iter_mut().find(|s| s.id == id) {
            existing.replace_with(new, photo, now);
            return Ok(UpsertOutcome { record: existing.clone(), is_newly_created: false });
        }

        let student = Student::from_new(id, new, photo, now);
        records.push(student.clone());
        Ok(UpsertOutcome { record: student, is_newly_created: true })
    }

    async fn merge_update(&self, id: Uuid, patch: StudentPatch) -> Result<Option<Student>, DatabaseError> {
        let mut records = self.records.write().await;
        Ok(records.iter_mut().find(|s| s.id == id).map(|existing| {
            patch.apply_to(existing);
            existing.updated_at = Utc::now();
            existing.clone()
        }))
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<Student>, DatabaseError> {
        let mut records = self.records.write().await;
        Ok(records.iter().position(|s| s.id == id).map(|idx| records.remove(idx)))
    }
}
