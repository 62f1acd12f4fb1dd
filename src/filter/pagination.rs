use serde::Serialize;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_PER_PAGE: u64 = 10;

/// Safe page window derived from raw input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub per_page: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: DEFAULT_PAGE, per_page: DEFAULT_PER_PAGE }
    }
}

impl Pagination {
    /// Unparseable input falls back to the default, parsed values below 1
    /// are clamped to 1. No upper bound is applied here.
    pub fn resolve(page: Option<&str>, per_page: Option<&str>) -> Self {
        Self {
            page: parse_positive(page, DEFAULT_PAGE),
            per_page: parse_positive(per_page, DEFAULT_PER_PAGE),
        }
    }

    pub fn skip(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }

    pub fn limit(&self) -> u64 {
        self.per_page
    }

    pub fn page_info(&self, total_items: u64) -> PageInfo {
        PageInfo::new(self.page, self.per_page, total_items)
    }
}

fn parse_positive(raw: Option<&str>, default: u64) -> u64 {
    match raw.map(str::trim).map(str::parse::<i64>) {
        Some(Ok(n)) if n < 1 => 1,
        Some(Ok(n)) => n as u64,
        _ => default,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub page: u64,
    pub per_page: u64,
    pub total_items: u64,
    pub total_pages: u64,
    pub has_previous_page: bool,
    pub has_next_page: bool,
}

impl PageInfo {
    pub fn new(page: u64, per_page: u64, total_items: u64) -> Self {
        let total_pages = total_items.div_ceil(per_page.max(1));
        Self {
            page,
            per_page,
            total_items,
            total_pages,
            has_previous_page: page > 1,
            has_next_page: page < total_pages,
        }
    }
}

/// One page of results plus its metadata
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Paginated<T> {
    pub items: Vec<T>,
    #[serde(flatten)]
    pub info: PageInfo,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_and_limit_follow_page_window() {
        for page in 1..=7u64 {
            for per_page in 1..=12u64 {
                let p = Pagination::resolve(Some(&page.to_string()), Some(&per_page.to_string()));
                assert_eq!(p.skip(), (page - 1) * per_page);
                assert_eq!(p.limit(), per_page);
            }
        }
    }

    #[test]
    fn missing_or_garbage_input_uses_defaults() {
        assert_eq!(Pagination::resolve(None, None), Pagination { page: 1, per_page: 10 });
        assert_eq!(Pagination::resolve(Some("abc"), Some("")), Pagination { page: 1, per_page: 10 });
        assert_eq!(Pagination::resolve(Some("2.5"), Some("x10")), Pagination { page: 1, per_page: 10 });
    }

    #[test]
    fn values_below_one_are_clamped() {
        assert_eq!(Pagination::resolve(Some("0"), Some("-4")), Pagination { page: 1, per_page: 1 });
    }

    #[test]
    fn large_pages_are_not_capped() {
        let p = Pagination::resolve(Some("3"), Some("5000"));
        assert_eq!(p.limit(), 5000);
        assert_eq!(p.skip(), 10_000);
    }

    #[test]
    fn total_pages_is_ceiling() {
        assert_eq!(PageInfo::new(1, 5, 0).total_pages, 0);
        assert_eq!(PageInfo::new(1, 5, 1).total_pages, 1);
        assert_eq!(PageInfo::new(1, 5, 5).total_pages, 1);
        assert_eq!(PageInfo::new(1, 5, 6).total_pages, 2);
        assert_eq!(PageInfo::new(1, 5, 12).total_pages, 3);
    }

    #[test]
    fn previous_and_next_flags() {
        let first = PageInfo::new(1, 5, 12);
        assert!(!first.has_previous_page);
        assert!(first.has_next_page);

        let last = PageInfo::new(3, 5, 12);
        assert!(last.has_previous_page);
        assert!(!last.has_next_page);

        let empty = PageInfo::new(1, 10, 0);
        assert!(!empty.has_previous_page);
        assert!(!empty.has_next_page);

        let beyond = PageInfo::new(9, 5, 12);
        assert!(beyond.has_previous_page);
        assert!(!beyond.has_next_page);
    }
}
