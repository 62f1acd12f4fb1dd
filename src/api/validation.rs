//! Request body validation for student payloads.
//!
//! Bodies arrive as loose JSON objects (or multipart text fields coerced into
//! one) and leave as typed [`NewStudent`] / [`StudentPatch`] values. Keys that
//! are not student attributes are kept as extra attributes.

use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

use crate::database::models::student::{Gender, NewStudent, StudentPatch};
use crate::error::ApiError;

/// Fields only the server assigns
const SYSTEM_FIELDS: &[&str] = &["id", "_id", "photo", "createdAt", "updatedAt", "created_at", "updated_at"];

pub const NAME_LEN: (usize, usize) = (3, 30);
pub const AGE_RANGE: (i64, i64) = (6, 16);
pub const AVG_MARK_RANGE: (f64, f64) = (2.0, 12.0);

#[derive(Debug, thiserror::Error)]
pub enum PayloadError {
    #[error("Expected a JSON object")]
    NotAnObject,
    #[error("System field '{0}' cannot be set via API input")]
    SystemFieldNotAllowed(&'static str),
    #[error("Invalid student payload")]
    InvalidFields(HashMap<String, String>),
    #[error("Request body must contain at least one field to update")]
    EmptyPatch,
}

impl From<PayloadError> for ApiError {
    fn from(err: PayloadError) -> Self {
        match err {
            PayloadError::InvalidFields(field_errors) => {
                ApiError::validation_error("Invalid student payload", Some(field_errors))
            }
            PayloadError::NotAnObject => ApiError::invalid_json(err.to_string()),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

/// Turn a multipart text field into the JSON type its key expects.
/// Values that don't parse stay strings and fail validation later.
pub fn coerce_form_field(key: &str, raw: &str) -> Value {
    let trimmed = raw.trim();
    match key {
        "age" => trimmed.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::from(raw)),
        "avgMark" => trimmed
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::from(raw)),
        "onDuty" => match trimmed {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::from(raw),
        },
        _ => Value::from(raw),
    }
}

/// Validate a create/upsert body; every required attribute must be present
pub fn parse_new_student(body: Value) -> Result<NewStudent, PayloadError> {
    let mut fields = FieldReader::new(body)?;

    let name = fields.required("name", read_name);
    let email = fields.optional("email", read_email);
    let gender = fields.required("gender", read_gender);
    let age = fields.required("age", read_age);
    let avg_mark = fields.required("avgMark", read_avg_mark);
    let on_duty = fields.optional("onDuty", read_bool);
    let parent_id = fields.optional("parentId", read_uuid);
    let extra = fields.finish()?;

    match (name, gender, age, avg_mark) {
        (Some(name), Some(gender), Some(age), Some(avg_mark)) => Ok(NewStudent {
            name,
            email,
            gender,
            age,
            avg_mark,
            on_duty: on_duty.unwrap_or(false),
            parent_id,
            extra,
        }),
        _ => Err(PayloadError::InvalidFields(HashMap::new())),
    }
}

/// Validate a patch body. `has_photo` lets a photo-only request through.
pub fn parse_student_patch(body: Value, has_photo: bool) -> Result<StudentPatch, PayloadError> {
    let mut fields = FieldReader::new(body)?;

    let patch = StudentPatch {
        name: fields.optional("name", read_name),
        email: fields.optional("email", read_email),
        gender: fields.optional("gender", read_gender),
        age: fields.optional("age", read_age),
        avg_mark: fields.optional("avgMark", read_avg_mark),
        on_duty: fields.optional("onDuty", read_bool),
        parent_id: fields.optional("parentId", read_uuid),
        photo: None,
        extra: Map::new(),
    };
    let extra = fields.finish()?;
    let patch = StudentPatch { extra, ..patch };

    if patch.is_empty() && !has_photo {
        return Err(PayloadError::EmptyPatch);
    }
    Ok(patch)
}

/// Pulls known keys out of the body while collecting per-field errors
struct FieldReader {
    body: Map<String, Value>,
    errors: HashMap<String, String>,
}

impl FieldReader {
    fn new(body: Value) -> Result<Self, PayloadError> {
        let Value::Object(body) = body else {
            return Err(PayloadError::NotAnObject);
        };
        if let Some(field) = SYSTEM_FIELDS.iter().find(|f| body.contains_key(**f)) {
            return Err(PayloadError::SystemFieldNotAllowed(*field));
        }
        Ok(Self { body, errors: HashMap::new() })
    }

    fn required<T>(&mut self, key: &str, read: fn(&Value) -> Result<T, String>) -> Option<T> {
        match self.body.remove(key) {
            None | Some(Value::Null) => {
                self.errors.insert(key.to_string(), "is required".to_string());
                None
            }
            Some(v) => self.check(key, read(&v)),
        }
    }

    fn optional<T>(&mut self, key: &str, read: fn(&Value) -> Result<T, String>) -> Option<T> {
        match self.body.remove(key) {
            None | Some(Value::Null) => None,
            Some(v) => self.check(key, read(&v)),
        }
    }

    fn check<T>(&mut self, key: &str, result: Result<T, String>) -> Option<T> {
        result.map_err(|e| self.errors.insert(key.to_string(), e)).ok()
    }

    /// Remaining keys become extra attributes
    fn finish(self) -> Result<Map<String, Value>, PayloadError> {
        if self.errors.is_empty() {
            Ok(self.body)
        } else {
            Err(PayloadError::InvalidFields(self.errors))
        }
    }
}

fn read_name(v: &Value) -> Result<String, String> {
    let s = v.as_str().ok_or("must be a string")?;
    let len = s.chars().count();
    if len < NAME_LEN.0 || len > NAME_LEN.1 {
        return Err(format!("must be between {} and {} characters", NAME_LEN.0, NAME_LEN.1));
    }
    Ok(s.to_string())
}

fn read_email(v: &Value) -> Result<String, String> {
    let s = v.as_str().ok_or("must be a string")?.trim();
    let valid = match s.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !s.contains(char::is_whitespace)
        }
        None => false,
    };
    if !valid {
        return Err("must be a valid email address".to_string());
    }
    Ok(s.to_string())
}

fn read_gender(v: &Value) -> Result<Gender, String> {
    v.as_str()
        .and_then(|s| s.parse().ok())
        .ok_or_else(|| {
            let allowed: Vec<&str> = Gender::ALL.iter().map(|g| g.as_str()).collect();
            format!("must be one of: {}", allowed.join(", "))
        })
}

fn read_age(v: &Value) -> Result<i32, String> {
    let age = v.as_i64().ok_or("must be an integer")?;
    if age < AGE_RANGE.0 || age > AGE_RANGE.1 {
        return Err(format!("must be between {} and {}", AGE_RANGE.0, AGE_RANGE.1));
    }
    Ok(age as i32)
}

fn read_avg_mark(v: &Value) -> Result<f64, String> {
    let mark = v.as_f64().ok_or("must be a number")?;
    if !(AVG_MARK_RANGE.0..=AVG_MARK_RANGE.1).contains(&mark) {
        return Err(format!("must be between {} and {}", AVG_MARK_RANGE.0, AVG_MARK_RANGE.1));
    }
    Ok(mark)
}

fn read_bool(v: &Value) -> Result<bool, String> {
    v.as_bool().ok_or_else(|| "must be a boolean".to_string())
}

fn read_uuid(v: &Value) -> Result<Uuid, String> {
    v.as_str()
        .and_then(|s| Uuid::parse_str(s).ok())
        .ok_or_else(|| "must be a valid UUID".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn field_errors(result: Result<impl std::fmt::Debug, PayloadError>) -> HashMap<String, String> {
        match result {
            Err(PayloadError::InvalidFields(errors)) => errors,
            other => panic!("expected field errors, got {other:?}"),
        }
    }

    #[test]
    fn accepts_complete_payload() {
        let student = parse_new_student(json!({
            "name": "Bohdan",
            "email": "bohdan@school.ua",
            "gender": "male",
            "age": 9,
            "avgMark": 10.5,
            "onDuty": true,
            "club": "robotics"
        }))
        .unwrap();

        assert_eq!(student.name, "Bohdan");
        assert_eq!(student.gender, Gender::Male);
        assert_eq!(student.age, 9);
        assert!(student.on_duty);
        assert_eq!(student.extra.get("club"), Some(&json!("robotics")));
    }

    #[test]
    fn reports_every_bad_field() {
        let errors = field_errors(parse_new_student(json!({
            "name": "Al",
            "email": "not-an-email",
            "gender": "robot",
            "age": 17,
            "avgMark": 1.5,
            "parentId": "123"
        })));

        for key in ["name", "email", "gender", "age", "avgMark", "parentId"] {
            assert!(errors.contains_key(key), "missing error for {key}");
        }
    }

    #[test]
    fn missing_required_fields_are_named() {
        let errors = field_errors(parse_new_student(json!({ "name": "Sofiia" })));
        assert_eq!(errors.get("gender").map(String::as_str), Some("is required"));
        assert!(errors.contains_key("age"));
        assert!(errors.contains_key("avgMark"));
        assert!(!errors.contains_key("name"));
    }

    #[test]
    fn system_fields_are_rejected() {
        let result = parse_new_student(json!({
            "id": "x", "name": "Sofiia", "gender": "female", "age": 8, "avgMark": 9
        }));
        assert!(matches!(result, Err(PayloadError::SystemFieldNotAllowed("id"))));

        let result = parse_student_patch(json!({ "photo": "http://evil" }), false);
        assert!(matches!(result, Err(PayloadError::SystemFieldNotAllowed("photo"))));
    }

    #[test]
    fn patch_validates_only_present_fields() {
        let patch = parse_student_patch(json!({ "age": 10 }), false).unwrap();
        assert_eq!(patch.age, Some(10));
        assert!(patch.name.is_none());

        let errors = field_errors(parse_student_patch(json!({ "age": 30 }), false));
        assert!(errors.contains_key("age"));
    }

    #[test]
    fn empty_patch_needs_a_photo() {
        assert!(matches!(parse_student_patch(json!({}), false), Err(PayloadError::EmptyPatch)));
        assert!(parse_student_patch(json!({}), true).is_ok());
    }

    #[test]
    fn form_fields_are_coerced_by_key() {
        assert_eq!(coerce_form_field("age", "12"), json!(12));
        assert_eq!(coerce_form_field("avgMark", "9.5"), json!(9.5));
        assert_eq!(coerce_form_field("onDuty", "true"), json!(true));
        assert_eq!(coerce_form_field("name", "12"), json!("12"));
        assert_eq!(coerce_form_field("age", "twelve"), json!("twelve"));
    }

    #[test]
    fn non_object_body_is_rejected() {
        assert!(matches!(parse_new_student(json!([1, 2])), Err(PayloadError::NotAnObject)));
    }
}
