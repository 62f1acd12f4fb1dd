use axum::{
    async_trait,
    extract::{multipart::MultipartError, FromRequest, Multipart, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Json,
};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::api::validation::coerce_form_field;
use crate::error::ApiError;
use crate::storage::UploadedPhoto;

/// Multipart part carrying the photo file
pub const PHOTO_FIELD: &str = "photo";

/// Write request body: a JSON object, or multipart text fields plus an
/// optional `photo` file part.
#[derive(Debug)]
pub struct StudentForm {
    pub body: Value,
    pub photo: Option<UploadedPhoto>,
}

#[async_trait]
impl<S> FromRequest<S> for StudentForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_multipart = req
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.starts_with("multipart/form-data"))
            .unwrap_or(false);

        if is_multipart {
            let multipart = Multipart::from_request(req, state)
                .await
                .map_err(|e| ApiError::bad_request(e.body_text()))?;
            return read_multipart(multipart).await;
        }

        let Json(body) = Json::<Value>::from_request(req, state).await.map_err(|e| {
            if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
                ApiError::payload_too_large(e.body_text())
            } else {
                ApiError::invalid_json(e.body_text())
            }
        })?;
        Ok(Self { body, photo: None })
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<StudentForm, ApiError> {
    let mut body = Map::new();
    let mut photo = None;

    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == PHOTO_FIELD && field.file_name().is_some() {
            let file_name = field.file_name().map(str::to_string).unwrap_or_default();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(multipart_error)?;
            if bytes.is_empty() {
                continue;
            }
            photo = Some(UploadedPhoto {
                file_name,
                content_type,
                bytes: bytes.to_vec(),
            });
        } else {
            let text = field.text().await.map_err(multipart_error)?;
            body.insert(name.clone(), coerce_form_field(&name, &text));
        }
    }

    Ok(StudentForm { body: Value::Object(body), photo })
}

fn multipart_error(e: MultipartError) -> ApiError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large(e.body_text())
    } else {
        ApiError::bad_request(e.body_text())
    }
}

/// `:studentId` must be a UUID
pub fn parse_student_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::bad_request(format!("Invalid student id '{}'", raw)))
}
