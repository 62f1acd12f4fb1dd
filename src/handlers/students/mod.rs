pub mod form;

use axum::{
    extract::{FromRequest, Path, RawQuery, Request, State},
    http::StatusCode,
    Extension,
};
use url::form_urlencoded;

use crate::api::validation::{parse_new_student, parse_student_patch};
use crate::app::AppState;
use crate::auth::policy::Operation;
use crate::database::models::student::Student;
use crate::error::ApiError;
use crate::filter::types::ListParams;
use crate::filter::Paginated;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

use self::form::{parse_student_id, StudentForm};

/// GET /students - Paginated, sorted and filtered listing
///
/// Query: `page`, `perPage`, `sortBy`, `sortOrder`, `gender`, `minAge`,
/// `maxAge`, `minAvgMark`, `maxAvgMark`. Unusable values fall back to
/// defaults rather than failing the request; a repeated key keeps its last value.
pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    RawQuery(query): RawQuery,
) -> ApiResult<Paginated<Student>> {
    let params = ListParams::from_pairs(form_urlencoded::parse(query.unwrap_or_default().as_bytes()));
    let page = state.service.list(&user.caller(), &params).await?;
    Ok(ApiResponse::success("Successfully found students!", page))
}

/// GET /students/:studentId - Get a single student
pub async fn get(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(student_id): Path<String>,
) -> ApiResult<Student> {
    let caller = user.caller();
    state.service.authorize(&caller, Operation::ReadOne)?;
    let id = parse_student_id(&student_id)?;
    let student = state
        .service
        .get(&caller, id)
        .await?
        .ok_or_else(ApiError::student_not_found)?;

    Ok(ApiResponse::success(format!("Successfully found student with id {}!", id), student))
}

/// POST /students - Create a student (JSON or multipart with `photo`)
pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    req: Request,
) -> ApiResult<Student> {
    let caller = user.caller();
    state.service.authorize(&caller, Operation::Create)?;
    let form = StudentForm::from_request(req, &state).await?;
    let new = parse_new_student(form.body)?;
    let student = state.service.create(&caller, new, form.photo).await?;

    Ok(ApiResponse::created("Successfully created a student!", student))
}

/// PUT /students/:studentId - Replace a student, creating it under this id if absent
///
/// Answers 201 when the record was created and 200 when it was replaced.
pub async fn upsert(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(student_id): Path<String>,
    req: Request,
) -> ApiResult<Student> {
    let caller = user.caller();
    state.service.authorize(&caller, Operation::Upsert)?;
    let id = parse_student_id(&student_id)?;
    let form = StudentForm::from_request(req, &state).await?;
    let new = parse_new_student(form.body)?;
    let outcome = state.service.upsert(&caller, id, new, form.photo).await?;

    let status = if outcome.is_newly_created { StatusCode::CREATED } else { StatusCode::OK };
    Ok(ApiResponse::with_status("Successfully upserted a student!", outcome.record, status))
}

/// PATCH /students/:studentId - Merge the given fields into an existing student
pub async fn patch(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(student_id): Path<String>,
    req: Request,
) -> ApiResult<Student> {
    let caller = user.caller();
    state.service.authorize(&caller, Operation::Patch)?;
    let id = parse_student_id(&student_id)?;
    let form = StudentForm::from_request(req, &state).await?;
    let patch = parse_student_patch(form.body, form.photo.is_some())?;
    let student = state
        .service
        .patch(&caller, id, patch, form.photo)
        .await?
        .ok_or_else(ApiError::student_not_found)?;

    Ok(ApiResponse::success("Successfully patched a student!", student))
}

/// DELETE /students/:studentId - Remove a student
pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
    Path(student_id): Path<String>,
) -> ApiResult<()> {
    let caller = user.caller();
    state.service.authorize(&caller, Operation::Delete)?;
    let id = parse_student_id(&student_id)?;
    state
        .service
        .delete(&caller, id)
        .await?
        .ok_or_else(ApiError::student_not_found)?;

    Ok(ApiResponse::no_content())
}
