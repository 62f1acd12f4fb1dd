use serde_json::{Number, Value};

use crate::database::models::student::{Gender, Student};

use super::types::{ListParams, StudentFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cmp {
    Eq,
    Gte,
    Lte,
}

impl Cmp {
    fn to_sql(self) -> &'static str {
        match self {
            Cmp::Eq => "=",
            Cmp::Gte => ">=",
            Cmp::Lte => "<=",
        }
    }
}

pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
    conditions: Vec<String>,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
            conditions: vec![],
        }
    }

    /// Extract the recognised keys from raw parameters. Unknown genders and
    /// non-numeric bounds are dropped rather than rejected.
    pub fn resolve(params: &ListParams) -> StudentFilter {
        StudentFilter {
            gender: params.gender.as_deref().and_then(|g| g.trim().parse::<Gender>().ok()),
            min_age: parse_number(params.min_age.as_deref()),
            max_age: parse_number(params.max_age.as_deref()),
            min_avg_mark: parse_number(params.min_avg_mark.as_deref()),
            max_avg_mark: parse_number(params.max_avg_mark.as_deref()),
        }
    }

    /// Build a parameterised WHERE clause (without the keyword) for `filter`.
    pub fn generate(filter: &StudentFilter, starting_param_index: usize) -> (String, Vec<Value>) {
        let mut filter_where = Self::new(starting_param_index);
        filter_where.build(filter)
    }

    fn build(&mut self, filter: &StudentFilter) -> (String, Vec<Value>) {
        if let Some(gender) = filter.gender {
            self.push("gender", Cmp::Eq, Value::String(gender.as_str().to_string()));
        }
        self.push_number("age", Cmp::Gte, filter.min_age);
        self.push_number("age", Cmp::Lte, filter.max_age);
        self.push_number("avg_mark", Cmp::Gte, filter.min_avg_mark);
        self.push_number("avg_mark", Cmp::Lte, filter.max_avg_mark);

        let where_clause = if self.conditions.is_empty() { "1=1".to_string() } else { self.conditions.join(" AND ") };
        (where_clause, std::mem::take(&mut self.param_values))
    }

    fn push_number(&mut self, column: &str, cmp: Cmp, bound: Option<f64>) {
        if let Some(n) = bound.and_then(Number::from_f64) {
            self.push(column, cmp, Value::Number(n));
        }
    }

    fn push(&mut self, column: &str, cmp: Cmp, value: Value) {
        let placeholder = self.param(value);
        self.conditions.push(format!("\"{}\" {} {}", column, cmp.to_sql(), placeholder));
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }

    /// In-memory evaluation with the same inclusive semantics as the SQL form
    pub fn matches(filter: &StudentFilter, student: &Student) -> bool {
        let age = f64::from(student.age);
        filter.gender.map_or(true, |g| student.gender == g)
            && filter.min_age.map_or(true, |min| age >= min)
            && filter.max_age.map_or(true, |max| age <= max)
            && filter.min_avg_mark.map_or(true, |min| student.avg_mark >= min)
            && filter.max_avg_mark.map_or(true, |max| student.avg_mark <= max)
    }
}

fn parse_number(raw: Option<&str>) -> Option<f64> {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(pairs: &[(&str, &str)]) -> ListParams {
        ListParams::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn non_numeric_bounds_are_dropped() {
        let filter = FilterWhere::resolve(&params(&[("minAge", "abc"), ("maxAvgMark", "NaN")]));
        assert_eq!(filter, StudentFilter::default());
    }

    #[test]
    fn unknown_keys_and_genders_are_ignored() {
        let filter = FilterWhere::resolve(&params(&[("gender", "robot"), ("colour", "red")]));
        assert!(filter.is_empty());
    }

    #[test]
    fn recognised_keys_are_coerced() {
        let filter = FilterWhere::resolve(&params(&[
            ("gender", "female"),
            ("minAge", "10"),
            ("maxAge", " 14 "),
            ("minAvgMark", "7.5"),
        ]));
        assert_eq!(filter.gender, Some(Gender::Female));
        assert_eq!(filter.min_age, Some(10.0));
        assert_eq!(filter.max_age, Some(14.0));
        assert_eq!(filter.min_avg_mark, Some(7.5));
        assert_eq!(filter.max_avg_mark, None);
    }

    #[test]
    fn generates_inclusive_predicates_in_order() {
        let filter = StudentFilter {
            gender: Some(Gender::Male),
            min_age: Some(10.0),
            max_avg_mark: Some(11.0),
            ..Default::default()
        };
        let (sql, params) = FilterWhere::generate(&filter, 0);
        assert_eq!(sql, "\"gender\" = $1 AND \"age\" >= $2 AND \"avg_mark\" <= $3");
        assert_eq!(params, vec![json!("male"), json!(10.0), json!(11.0)]);
    }

    #[test]
    fn empty_filter_matches_everything() {
        let (sql, params) = FilterWhere::generate(&StudentFilter::default(), 0);
        assert_eq!(sql, "1=1");
        assert!(params.is_empty());
    }

    #[test]
    fn inverted_range_is_not_an_error() {
        let filter = StudentFilter { min_age: Some(15.0), max_age: Some(8.0), ..Default::default() };
        let (sql, params) = FilterWhere::generate(&filter, 0);
        assert_eq!(sql, "\"age\" >= $1 AND \"age\" <= $2");
        assert_eq!(params.len(), 2);
    }
}
