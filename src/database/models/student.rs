use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Other];

    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Gender {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "male" => Ok(Gender::Male),
            "female" => Ok(Gender::Female),
            "other" => Ok(Gender::Other),
            other => Err(format!("unknown gender '{}'", other)),
        }
    }
}

/// Stored student record. `extra` holds any attributes beyond the known
/// columns and is flattened into the wire representation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub gender: Gender,
    pub age: i32,
    pub avg_mark: f64,
    pub on_duty: bool,
    pub photo: Option<String>,
    pub parent_id: Option<Uuid>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Full payload for create and upsert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    pub gender: Gender,
    pub age: i32,
    pub avg_mark: f64,
    #[serde(default)]
    pub on_duty: bool,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Partial payload for patch; absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub gender: Option<Gender>,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub avg_mark: Option<f64>,
    #[serde(default)]
    pub on_duty: Option<bool>,
    #[serde(default)]
    pub parent_id: Option<Uuid>,
    /// Only ever set from a resolved upload, never from the request body
    #[serde(skip)]
    pub photo: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StudentPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.email.is_none()
            && self.gender.is_none()
            && self.age.is_none()
            && self.avg_mark.is_none()
            && self.on_duty.is_none()
            && self.parent_id.is_none()
            && self.photo.is_none()
            && self.extra.is_empty()
    }

    /// Merge the present fields into `student`. Timestamps are the caller's concern.
    pub fn apply_to(&self, student: &mut Student) {
        if let Some(name) = &self.name { student.name = name.clone(); }
        if let Some(email) = &self.email { student.email = Some(email.clone()); }
        if let Some(gender) = self.gender { student.gender = gender; }
        if let Some(age) = self.age { student.age = age; }
        if let Some(avg_mark) = self.avg_mark { student.avg_mark = avg_mark; }
        if let Some(on_duty) = self.on_duty { student.on_duty = on_duty; }
        if let Some(parent_id) = self.parent_id { student.parent_id = Some(parent_id); }
        if let Some(photo) = &self.photo { student.photo = Some(photo.clone()); }
        for (k, v) in &self.extra {
            student.extra.insert(k.clone(), v.clone());
        }
    }
}

impl Student {
    /// Build a fresh record from a create/upsert payload
    pub fn from_new(id: Uuid, new: NewStudent, photo: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id,
            name: new.name,
            email: new.email,
            gender: new.gender,
            age: new.age,
            avg_mark: new.avg_mark,
            on_duty: new.on_duty,
            photo,
            parent_id: new.parent_id,
            extra: new.extra,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every payload field, keeping id and creation time. The photo
    /// is only replaced when a new one was resolved; `updated_at` only moves
    /// when something actually changed.
    pub fn replace_with(&mut self, new: NewStudent, photo: Option<String>, now: DateTime<Utc>) {
        let before = self.clone();
        self.name = new.name;
        self.email = new.email;
        self.gender = new.gender;
        self.age = new.age;
        self.avg_mark = new.avg_mark;
        self.on_duty = new.on_duty;
        self.parent_id = new.parent_id;
        self.extra = new.extra;
        if photo.is_some() {
            self.photo = photo;
        }
        if *self != before {
            self.updated_at = now;
        }
    }
}
