use serde::{Deserialize, Serialize};

use crate::database::models::student::Gender;

use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::pagination::Pagination;

/// Raw, untrusted list parameters as they arrive in the query string.
/// Every field is kept as text so that malformed values fall back to
/// defaults instead of rejecting the request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListParams {
    pub page: Option<String>,
    #[serde(alias = "pageSize")]
    pub per_page: Option<String>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub gender: Option<String>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub min_avg_mark: Option<String>,
    pub max_avg_mark: Option<String>,
}

impl ListParams {
    /// Fold raw query pairs into params. A repeated key (or `pageSize`
    /// next to `perPage`) keeps the last value; unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut params = Self::default();
        for (key, value) in pairs {
            let slot = match key.as_ref() {
                "page" => &mut params.page,
                "perPage" | "pageSize" => &mut params.per_page,
                "sortBy" => &mut params.sort_by,
                "sortOrder" => &mut params.sort_order,
                "gender" => &mut params.gender,
                "minAge" => &mut params.min_age,
                "maxAge" => &mut params.max_age,
                "minAvgMark" => &mut params.min_avg_mark,
                "maxAvgMark" => &mut params.max_avg_mark,
                _ => continue,
            };
            *slot = Some(value.into());
        }
        params
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn to_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

/// Sortable student attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Id,
    Name,
    Age,
    Gender,
    AvgMark,
    OnDuty,
    CreatedAt,
}

impl SortField {
    pub fn column(&self) -> &'static str {
        match self {
            SortField::Id => "id",
            SortField::Name => "name",
            SortField::Age => "age",
            SortField::Gender => "gender",
            SortField::AvgMark => "avg_mark",
            SortField::OnDuty => "on_duty",
            SortField::CreatedAt => "created_at",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self { field: SortField::Id, direction: SortDirection::Asc }
    }
}

/// Structured predicate set. Every bound is inclusive; min/max are not
/// cross-checked, so an inverted range simply matches nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentFilter {
    pub gender: Option<Gender>,
    pub min_age: Option<f64>,
    pub max_age: Option<f64>,
    pub min_avg_mark: Option<f64>,
    pub max_avg_mark: Option<f64>,
}

impl StudentFilter {
    pub fn is_empty(&self) -> bool {
        self.gender.is_none()
            && self.min_age.is_none()
            && self.max_age.is_none()
            && self.min_avg_mark.is_none()
            && self.max_avg_mark.is_none()
    }
}

/// Fully resolved list query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryDescriptor {
    pub pagination: Pagination,
    pub sort: SortSpec,
    pub filter: StudentFilter,
}

impl QueryDescriptor {
    pub fn resolve(params: &ListParams) -> Self {
        Self {
            pagination: Pagination::resolve(params.page.as_deref(), params.per_page.as_deref()),
            sort: FilterOrder::resolve(params.sort_by.as_deref(), params.sort_order.as_deref()),
            filter: FilterWhere::resolve(params),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<serde_json::Value>,
}
