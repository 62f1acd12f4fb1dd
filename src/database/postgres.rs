use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use sqlx::postgres::{PgArguments, PgRow};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool, Row};
use std::time::Instant;
use uuid::Uuid;

use crate::database::manager::{DatabaseError, DatabaseManager};
use crate::database::models::student::{NewStudent, Student, StudentPatch};
use crate::database::store::{StudentStore, UpsertOutcome};
use crate::filter::types::{SortSpec, SqlResult, StudentFilter};
use crate::filter::Filter;

const TABLE: &str = "students";

const INSERT_COLUMNS: &str =
    "id, name, email, gender, age, avg_mark, on_duty, photo, parent_id, extra, created_at, updated_at";

#[derive(Debug, FromRow)]
struct StudentRow {
    id: Uuid,
    name: String,
    email: Option<String>,
    gender: String,
    age: i32,
    avg_mark: f64,
    on_duty: bool,
    photo: Option<String>,
    parent_id: Option<Uuid>,
    extra: Json<Map<String, Value>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<StudentRow> for Student {
    type Error = DatabaseError;

    fn try_from(row: StudentRow) -> Result<Self, Self::Error> {
        let gender = row.gender.parse().map_err(DatabaseError::InvalidRow)?;
        Ok(Student {
            id: row.id,
            name: row.name,
            email: row.email,
            gender,
            age: row.age,
            avg_mark: row.avg_mark,
            on_duty: row.on_duty,
            photo: row.photo,
            parent_id: row.parent_id,
            extra: row.extra.0,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn decode(row: &PgRow) -> Result<Student, DatabaseError> {
    StudentRow::from_row(row)?.try_into()
}

/// PostgreSQL-backed students store
#[derive(Clone)]
pub struct PgStudentStore {
    pool: PgPool,
    log_queries: bool,
}

impl PgStudentStore {
    pub fn new(pool: PgPool, log_queries: bool) -> Self {
        Self { pool, log_queries }
    }

    fn log(&self, sql: &str, started: Instant) {
        if self.log_queries {
            tracing::debug!(elapsed_ms = started.elapsed().as_millis() as u64, "{}", sql);
        }
    }

    fn insert_sql(on_conflict: &str) -> String {
        format!(
            "INSERT INTO {TABLE} ({INSERT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11) {on_conflict} \
             RETURNING *"
        )
    }

    fn bind_new<'q>(
        q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
        id: Uuid,
        new: NewStudent,
        photo: Option<String>,
    ) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
        q.bind(id)
            .bind(new.name)
            .bind(new.email)
            .bind(new.gender.as_str())
            .bind(new.age)
            .bind(new.avg_mark)
            .bind(new.on_duty)
            .bind(photo)
            .bind(new.parent_id)
            .bind(Json(new.extra))
            .bind(Utc::now())
    }
}

#[async_trait]
impl StudentStore for PgStudentStore {
    async fn count(&self, filter: &StudentFilter) -> Result<u64, DatabaseError> {
        let mut builder = Filter::new(TABLE)?;
        builder.where_clause(filter.clone());
        let sql_result = builder.to_count_sql();

        let started = Instant::now();
        let row = bind_params(sqlx::query(&sql_result.query), &sql_result).fetch_one(&self.pool).await?;
        self.log(&sql_result.query, started);

        let count: i64 = row.try_get("count")?;
        Ok(count.max(0) as u64)
    }

    async fn find(
        &self,
        filter: &StudentFilter,
        skip: u64,
        limit: u64,
        sort: SortSpec,
    ) -> Result<Vec<Student>, DatabaseError> {
        // Postgres LIMIT/OFFSET are bigint
        let cap = i64::MAX as u64;
        let mut builder = Filter::new(TABLE)?;
        builder
            .where_clause(filter.clone())
            .order(sort)
            .limit(limit.min(cap), Some(skip.min(cap)));
        let sql_result = builder.to_sql();

        let started = Instant::now();
        let rows = bind_params(sqlx::query(&sql_result.query), &sql_result).fetch_all(&self.pool).await?;
        self.log(&sql_result.query, started);

        rows.iter().map(decode).collect()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Student>, DatabaseError> {
        let row = sqlx::query(&format!("SELECT * FROM {TABLE} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn insert(&self, new: NewStudent, photo: Option<String>) -> Result<Student, DatabaseError> {
        let sql = Self::insert_sql("");
        let row = Self::bind_new(sqlx::query(&sql), Uuid::now_v7(), new, photo)
            .fetch_one(&self.pool)
            .await?;
        decode(&row)
    }

    async fn replace_or_insert(
        &self,
        id: Uuid,
        new: NewStudent,
        photo: Option<String>,
    ) -> Result<UpsertOutcome, DatabaseError> {
        // xmax = 0 only for a row version produced by the INSERT branch
        let sql = Self::insert_sql(
            "ON CONFLICT (id) DO UPDATE SET \
             name = EXCLUDED.name, email = EXCLUDED.email, gender = EXCLUDED.gender, \
             age = EXCLUDED.age, avg_mark = EXCLUDED.avg_mark, on_duty = EXCLUDED.on_duty, \
             parent_id = EXCLUDED.parent_id, extra = EXCLUDED.extra, \
             photo = COALESCE(EXCLUDED.photo, students.photo), \
             updated_at = CASE WHEN \
                 (students.name, students.email, students.gender, students.age, students.avg_mark, \
                  students.on_duty, students.parent_id, students.extra, students.photo) \
                 IS DISTINCT FROM \
                 (EXCLUDED.name, EXCLUDED.email, EXCLUDED.gender, EXCLUDED.age, EXCLUDED.avg_mark, \
                  EXCLUDED.on_duty, EXCLUDED.parent_id, EXCLUDED.extra, COALESCE(EXCLUDED.photo, students.photo)) \
                 THEN EXCLUDED.updated_at ELSE students.updated_at END",
        )
        .replace("RETURNING *", "RETURNING *, (xmax = 0) AS inserted");

        let row = Self::bind_new(sqlx::query(&sql), id, new, photo)
            .fetch_one(&self.pool)
            .await?;
        let is_newly_created: bool = row.try_get("inserted")?;
        Ok(UpsertOutcome { record: decode(&row)?, is_newly_created })
    }

    async fn merge_update(&self, id: Uuid, patch: StudentPatch) -> Result<Option<Student>, DatabaseError> {
        let sql = format!(
            "UPDATE {TABLE} SET \
             name = COALESCE($2, name), email = COALESCE($3, email), gender = COALESCE($4, gender), \
             age = COALESCE($5, age), avg_mark = COALESCE($6, avg_mark), on_duty = COALESCE($7, on_duty), \
             parent_id = COALESCE($8, parent_id), photo = COALESCE($9, photo), \
             extra = extra || $10, updated_at = now() \
             WHERE id = $1 RETURNING *"
        );
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(patch.name)
            .bind(patch.email)
            .bind(patch.gender.map(|g| g.as_str()))
            .bind(patch.age)
            .bind(patch.avg_mark)
            .bind(patch.on_duty)
            .bind(patch.parent_id)
            .bind(patch.photo)
            .bind(Json(patch.extra))
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<Option<Student>, DatabaseError> {
        let row = sqlx::query(&format!("DELETE FROM {TABLE} WHERE id = $1 RETURNING *"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(decode).transpose()
    }

    async fn health_check(&self) -> Result<(), DatabaseError> {
        DatabaseManager::health_check(&self.pool).await
    }
}

fn bind_params<'q>(
    mut q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    sql_result: &'q SqlResult,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    for p in sql_result.params.iter() {
        q = bind_param(q, p);
    }
    q
}

fn bind_param<'q>(
    q: sqlx::query::Query<'q, sqlx::Postgres, PgArguments>,
    v: &'q Value,
) -> sqlx::query::Query<'q, sqlx::Postgres, PgArguments> {
    match v {
        Value::Null => {
            let none: Option<String> = None;
            q.bind(none)
        }
        Value::Bool(b) => q.bind(*b),
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                q.bind(f)
            } else {
                q.bind(n.to_string())
            }
        }
        Value::String(s) => q.bind(s.as_str()),
        Value::Array(_) | Value::Object(_) => q.bind(Json(v)),
    }
}
