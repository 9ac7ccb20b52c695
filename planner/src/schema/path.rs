// Dotted paths into the planner document

use super::types::{CalendarField, FinancialField, Namespace, Root};
use crate::calendar::WeekKey;
use std::fmt;

/// A parsed dotted path such as `financials.months.3.netProfit`.
///
/// The empty path addresses the whole document.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DocPath {
    segments: Vec<String>,
}

impl DocPath {
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::root();
        }
        DocPath {
            segments: raw.split('.').map(str::to_string).collect(),
        }
    }

    pub fn root() -> Self {
        DocPath {
            segments: Vec::new(),
        }
    }

    pub fn from_segments<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DocPath {
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// `calendar.<week>.rows.<day>_<row>.<field>`
    pub fn calendar(week: &WeekKey, day: usize, row: usize, field: CalendarField) -> Self {
        Self::from_segments([
            Namespace::Calendar.key().to_string(),
            week.to_string(),
            "rows".to_string(),
            format!("{day}_{row}"),
            field.key().to_string(),
        ])
    }

    /// `financials.months.<month>.<field>`
    pub fn financial(month: u32, field: FinancialField) -> Self {
        Self::from_segments([
            Namespace::Financials.key().to_string(),
            "months".to_string(),
            month.to_string(),
            field.key().to_string(),
        ])
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Which typed part of the document the first segment lands in
    pub fn root_kind(&self) -> Option<Root> {
        self.segments.first().map(|s| Root::resolve(s))
    }

    pub fn namespace(&self) -> Option<Namespace> {
        match self.root_kind() {
            Some(Root::Namespace(ns)) => Some(ns),
            _ => None,
        }
    }

    /// The row field a `calendar.<week>.rows.<slot>.<field>` path names
    pub fn calendar_field(&self) -> Option<CalendarField> {
        match self.segments.as_slice() {
            [ns, _, rows, _, field] if ns == Namespace::Calendar.key() && rows == "rows" => {
                CalendarField::from_key(field)
            }
            _ => None,
        }
    }

    /// The month field a `financials.months.<month>.<field>` path names
    pub fn financial_field(&self) -> Option<FinancialField> {
        match self.segments.as_slice() {
            [ns, months, _, field] if ns == Namespace::Financials.key() && months == "months" => {
                FinancialField::from_key(field)
            }
            _ => None,
        }
    }

    pub fn starts_with(&self, prefix: &DocPath) -> bool {
        self.segments.starts_with(&prefix.segments)
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

impl From<&str> for DocPath {
    fn from(raw: &str) -> Self {
        DocPath::parse(raw)
    }
}

impl From<&String> for DocPath {
    fn from(raw: &String) -> Self {
        DocPath::parse(raw)
    }
}

impl From<String> for DocPath {
    fn from(raw: String) -> Self {
        DocPath::parse(&raw)
    }
}

impl From<&DocPath> for DocPath {
    fn from(path: &DocPath) -> Self {
        path.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_parse_and_display() {
        let path = DocPath::parse("plan.section1.mission");
        assert_eq!(path.segments(), &["plan", "section1", "mission"]);
        assert_eq!(path.to_string(), "plan.section1.mission");
        assert_eq!(path.namespace(), Some(Namespace::Plan));
    }

    #[test]
    fn test_empty_is_root() {
        assert!(DocPath::parse("").is_root());
        assert_eq!(DocPath::root().root_kind(), None);
    }

    #[test]
    fn test_calendar_builder() {
        let week = WeekKey::containing(NaiveDate::from_ymd_opt(2026, 10, 14).unwrap());
        let path = DocPath::calendar(&week, 3, 1, CalendarField::TimeEnd);
        assert_eq!(path.to_string(), "calendar.2026-10-12.rows.3_1.timeEnd");
    }

    #[test]
    fn test_financial_builder() {
        let path = DocPath::financial(3, FinancialField::NetProfit);
        assert_eq!(path.to_string(), "financials.months.3.netProfit");
        assert!(path.starts_with(&DocPath::parse("financials.months")));
        assert_eq!(path.financial_field(), Some(FinancialField::NetProfit));
    }

    #[test]
    fn test_field_of_path() {
        let path = DocPath::parse("calendar.2026-10-12.rows.0_1.platform");
        assert_eq!(path.calendar_field(), Some(CalendarField::Platform));
        assert_eq!(path.financial_field(), None);

        assert_eq!(DocPath::parse("calendar.2026-10-12.rows.0_1").calendar_field(), None);
        assert_eq!(DocPath::parse("plan.rows.a.b.platform").calendar_field(), None);
        assert_eq!(DocPath::parse("financials.months.4.bogus").financial_field(), None);
        assert_eq!(
            DocPath::parse("financials.months.4.donations").financial_field(),
            Some(FinancialField::Donations)
        );
    }
}
