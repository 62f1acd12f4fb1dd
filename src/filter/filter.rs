use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{SortSpec, SqlResult, StudentFilter};

/// Composes a resolved filter, sort and page window into SQL for one table.
pub struct Filter {
    table_name: String,
    where_data: StudentFilter,
    order_data: Option<SortSpec>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl Filter {
    pub fn new(table_name: impl Into<String>) -> Result<Self, FilterError> {
        let table_name = table_name.into();
        Self::validate_table_name(&table_name)?;
        Ok(Self {
            table_name,
            where_data: StudentFilter::default(),
            order_data: None,
            limit: None,
            offset: None,
        })
    }

    pub fn where_clause(&mut self, filter: StudentFilter) -> &mut Self {
        self.where_data = filter;
        self
    }

    pub fn order(&mut self, sort: SortSpec) -> &mut Self {
        self.order_data = Some(sort);
        self
    }

    pub fn limit(&mut self, limit: u64, offset: Option<u64>) -> &mut Self {
        self.limit = Some(limit);
        self.offset = offset;
        self
    }

    pub fn to_sql(&self) -> SqlResult {
        let where_result = self.to_where_sql();
        let order_clause = self.order_data.as_ref().map(FilterOrder::generate).unwrap_or_default();
        let limit_clause = self.build_limit_clause();

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_result.query),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        SqlResult { query, params: where_result.params }
    }

    pub fn to_where_sql(&self) -> SqlResult {
        let (query, params) = FilterWhere::generate(&self.where_data, 0);
        SqlResult { query, params }
    }

    /// Count query sharing the exact predicate of [`Filter::to_sql`]
    pub fn to_count_sql(&self) -> SqlResult {
        let where_result = self.to_where_sql();
        let query = format!("SELECT COUNT(*) as count FROM \"{}\" WHERE {}", self.table_name, where_result.query);
        SqlResult { query, params: where_result.params }
    }

    fn validate_table_name(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_alphabetic() || c == '_');
        if !valid_start || !name.chars().all(|c| c.is_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidTableName(format!("Invalid table name format: {:?}", name)));
        }
        Ok(())
    }

    fn build_limit_clause(&self) -> String {
        match (self.limit, self.offset) {
            (Some(l), Some(o)) => format!("LIMIT {} OFFSET {}", l, o),
            (Some(l), None) => format!("LIMIT {}", l),
            _ => String::new(),
        }
    }
}
