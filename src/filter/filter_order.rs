use std::cmp::Ordering;

use crate::database::models::student::Student;

use super::types::{SortDirection, SortField, SortSpec};

pub struct FilterOrder;

impl FilterOrder {
    /// Unknown fields fall back to `id`, unknown directions to ascending.
    pub fn resolve(sort_by: Option<&str>, sort_order: Option<&str>) -> SortSpec {
        let field = sort_by.and_then(Self::parse_field).unwrap_or(SortField::Id);
        let direction = match sort_order.map(str::trim) {
            Some(dir) if dir.eq_ignore_ascii_case("desc") => SortDirection::Desc,
            _ => SortDirection::Asc,
        };
        SortSpec { field, direction }
    }

    fn parse_field(raw: &str) -> Option<SortField> {
        Some(match raw.trim() {
            "id" | "_id" => SortField::Id,
            "name" => SortField::Name,
            "age" => SortField::Age,
            "gender" => SortField::Gender,
            "avgMark" => SortField::AvgMark,
            "onDuty" => SortField::OnDuty,
            "createdAt" => SortField::CreatedAt,
            _ => return None,
        })
    }

    /// ORDER BY clause with `id` as the stable secondary key
    pub fn generate(sort: &SortSpec) -> String {
        let primary = format!("\"{}\" {}", sort.field.column(), sort.direction.to_sql());
        if sort.field == SortField::Id {
            format!("ORDER BY {}", primary)
        } else {
            format!("ORDER BY {}, \"id\" ASC", primary)
        }
    }

    /// In-memory equivalent of [`FilterOrder::generate`]
    pub fn compare(a: &Student, b: &Student, sort: &SortSpec) -> Ordering {
        let primary = match sort.field {
            SortField::Id => a.id.cmp(&b.id),
            SortField::Name => a.name.cmp(&b.name),
            SortField::Age => a.age.cmp(&b.age),
            SortField::Gender => a.gender.as_str().cmp(b.gender.as_str()),
            SortField::AvgMark => a.avg_mark.total_cmp(&b.avg_mark),
            SortField::OnDuty => a.on_duty.cmp(&b.on_duty),
            SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        };
        let primary = match sort.direction {
            SortDirection::Asc => primary,
            SortDirection::Desc => primary.reverse(),
        };
        primary.then_with(|| a.id.cmp(&b.id))
    }
}
