use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::auth::policy::{AccessDenied, Operation, PolicyTable, Role};
use crate::database::manager::DatabaseError;
use crate::database::models::student::{NewStudent, Student, StudentPatch};
use crate::database::store::{StudentStore, UpsertOutcome};
use crate::filter::types::{ListParams, QueryDescriptor};
use crate::filter::Paginated;
use crate::storage::{resolve_photo, PhotoStorage, StorageError, UploadedPhoto};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    AccessDenied(#[from] AccessDenied),

    #[error("Photo storage failed: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Store(#[from] DatabaseError),
}

/// Authenticated identity an operation runs on behalf of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Caller {
    pub user_id: Uuid,
    pub role: Role,
}

impl Caller {
    pub fn new(user_id: Uuid, role: Role) -> Self {
        Self { user_id, role }
    }
}

/// Query and mutation engine for the students collection.
/// Every operation passes the policy gate before touching storage.
#[derive(Clone)]
pub struct StudentService {
    store: Arc<dyn StudentStore>,
    policy: Arc<PolicyTable>,
    photos: Arc<dyn PhotoStorage>,
}

impl StudentService {
    pub fn new(store: Arc<dyn StudentStore>, policy: PolicyTable, photos: Arc<dyn PhotoStorage>) -> Self {
        Self {
            store,
            policy: Arc::new(policy),
            photos,
        }
    }

    pub fn store(&self) -> &Arc<dyn StudentStore> {
        &self.store
    }

    /// Policy gate. Every operation below calls this first; transports may
    /// call it earlier to refuse a request before reading its body.
    pub fn authorize(&self, caller: &Caller, operation: Operation) -> Result<(), ServiceError> {
        self.policy.authorize(operation, caller.role).map_err(|denied| {
            warn!(user_id = %caller.user_id, "{}", denied);
            ServiceError::from(denied)
        })
    }

    #[instrument(name = "students.service.list", skip(self, params), fields(role = %caller.role))]
    pub async fn list(&self, caller: &Caller, params: &ListParams) -> Result<Paginated<Student>, ServiceError> {
        self.authorize(caller, Operation::List)?;

        let query = QueryDescriptor::resolve(params);
        debug!(?query, "Resolved list query");

        let pagination = query.pagination;
        let (total_items, items) = tokio::try_join!(
            self.store.count(&query.filter),
            self.store.find(&query.filter, pagination.skip(), pagination.limit(), query.sort),
        )?;

        Ok(Paginated {
            items,
            info: pagination.page_info(total_items),
        })
    }

    #[instrument(name = "students.service.get", skip(self), fields(role = %caller.role))]
    pub async fn get(&self, caller: &Caller, id: Uuid) -> Result<Option<Student>, ServiceError> {
        self.authorize(caller, Operation::ReadOne)?;
        Ok(self.store.find_by_id(id).await?)
    }

    #[instrument(name = "students.service.create", skip(self, new, photo), fields(role = %caller.role))]
    pub async fn create(
        &self,
        caller: &Caller,
        new: NewStudent,
        photo: Option<UploadedPhoto>,
    ) -> Result<Student, ServiceError> {
        self.authorize(caller, Operation::Create)?;

        let photo_url = resolve_photo(self.photos.as_ref(), photo).await?;
        let student = self.store.insert(new, photo_url).await?;

        info!("Created student id={}", student.id);
        Ok(student)
    }

    #[instrument(name = "students.service.upsert", skip(self, new, photo), fields(role = %caller.role))]
    pub async fn upsert(
        &self,
        caller: &Caller,
        id: Uuid,
        new: NewStudent,
        photo: Option<UploadedPhoto>,
    ) -> Result<UpsertOutcome, ServiceError> {
        self.authorize(caller, Operation::Upsert)?;

        let photo_url = resolve_photo(self.photos.as_ref(), photo).await?;
        let outcome = self.store.replace_or_insert(id, new, photo_url).await?;

        info!(is_newly_created = outcome.is_newly_created, "Upserted student id={}", id);
        Ok(outcome)
    }

    #[instrument(name = "students.service.patch", skip(self, patch, photo), fields(role = %caller.role))]
    pub async fn patch(
        &self,
        caller: &Caller,
        id: Uuid,
        mut patch: StudentPatch,
        photo: Option<UploadedPhoto>,
    ) -> Result<Option<Student>, ServiceError> {
        self.authorize(caller, Operation::Patch)?;

        if photo.is_some() {
            // Skip the upload entirely when there is nothing to attach it to
            if self.store.find_by_id(id).await?.is_none() {
                return Ok(None);
            }
            patch.photo = resolve_photo(self.photos.as_ref(), photo).await?;
        }

        let patched = self.store.merge_update(id, patch).await?;
        if patched.is_some() {
            info!("Patched student id={}", id);
        }
        Ok(patched)
    }

    #[instrument(name = "students.service.delete", skip(self), fields(role = %caller.role))]
    pub async fn delete(&self, caller: &Caller, id: Uuid) -> Result<Option<Student>, ServiceError> {
        self.authorize(caller, Operation::Delete)?;

        let deleted = self.store.delete_by_id(id).await?;
        if deleted.is_some() {
            info!("Deleted student id={}", id);
        }
        Ok(deleted)
    }
}
