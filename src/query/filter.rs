//! Structured filter request built from listing query parameters.

use super::{
    pagination::PageWindow,
    predicate::{BookField, FieldValue, Predicate},
    sort::{parse_sort, SortDirective},
};
use crate::models::BookQuery;

/// Fields searched by the free-text term
const SEARCH_FIELDS: [BookField; 4] = [
    BookField::Title,
    BookField::Author,
    BookField::Publisher,
    BookField::Genre,
];

#[derive(Debug, Clone, PartialEq)]
pub struct FilterSpec {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub author: Option<String>,
    /// `None` means the availability flag is not filtered
    pub available: Option<bool>,
    pub sort: Vec<SortDirective>,
    pub window: PageWindow,
}

impl Default for FilterSpec {
    fn default() -> Self {
        Self {
            search: None,
            genre: None,
            publisher: None,
            author: None,
            available: None,
            sort: SortDirective::default_order(),
            window: PageWindow::default(),
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
}

fn parse_availability(raw: Option<&str>) -> Option<bool> {
    match raw.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

impl From<&BookQuery> for FilterSpec {
    fn from(query: &BookQuery) -> Self {
        Self {
            search: non_empty(&query.search),
            genre: non_empty(&query.genre),
            publisher: non_empty(&query.publisher),
            author: non_empty(&query.author),
            available: parse_availability(query.available.as_deref()),
            sort: parse_sort(query.sort.as_deref()),
            window: PageWindow::new(query.page, query.per_page),
        }
    }
}

impl FilterSpec {
    /// Build the listing predicate: the search term is OR-ed across the
    /// text fields, everything else is AND-ed together.
    pub fn predicate(&self) -> Predicate {
        let mut parts = Vec::new();

        if let Some(ref term) = self.search {
            parts.push(Predicate::Or(
                SEARCH_FIELDS
                    .iter()
                    .map(|f| Predicate::contains(*f, term.clone()))
                    .collect(),
            ));
        }

        for (field, value) in [
            (BookField::Genre, &self.genre),
            (BookField::Publisher, &self.publisher),
            (BookField::Author, &self.author),
        ] {
            if let Some(v) = value {
                parts.push(Predicate::contains(field, v.clone()));
            }
        }

        if let Some(available) = self.available {
            parts.push(Predicate::equals(
                BookField::Available,
                FieldValue::Bool(available),
            ));
        }

        Predicate::all_of(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::sort::SortDirection;

    #[test]
    fn defaults_from_empty_query() {
        let spec = FilterSpec::from(&BookQuery::default());
        assert_eq!(spec, FilterSpec::default());
        assert_eq!(spec.predicate(), Predicate::Always);
    }

    #[test]
    fn availability_is_tri_state() {
        let parse = |v: &str| {
            FilterSpec::from(&BookQuery {
                available: Some(v.to_string()),
                ..Default::default()
            })
            .available
        };
        assert_eq!(parse("true"), Some(true));
        assert_eq!(parse("FALSE"), Some(false));
        assert_eq!(parse(""), None);
        assert_eq!(parse("yes"), None);
    }

    #[test]
    fn blank_filters_are_ignored() {
        let spec = FilterSpec::from(&BookQuery {
            search: Some("   ".into()),
            genre: Some(String::new()),
            ..Default::default()
        });
        assert_eq!(spec.predicate(), Predicate::Always);
    }

    #[test]
    fn search_is_disjunction_filters_are_conjunction() {
        let spec = FilterSpec::from(&BookQuery {
            search: Some("gatsby".into()),
            genre: Some("Fiction".into()),
            available: Some("true".into()),
            ..Default::default()
        });
        let expected = Predicate::And(vec![
            Predicate::Or(vec![
                Predicate::contains(BookField::Title, "gatsby"),
                Predicate::contains(BookField::Author, "gatsby"),
                Predicate::contains(BookField::Publisher, "gatsby"),
                Predicate::contains(BookField::Genre, "gatsby"),
            ]),
            Predicate::contains(BookField::Genre, "Fiction"),
            Predicate::equals(BookField::Available, FieldValue::Bool(true)),
        ]);
        assert_eq!(spec.predicate(), expected);
    }

    #[test]
    fn sort_and_window_are_decoded() {
        let spec = FilterSpec::from(&BookQuery {
            sort: Some("title:desc".into()),
            page: Some(2),
            per_page: Some(25),
            ..Default::default()
        });
        assert_eq!(spec.sort, vec![SortDirective::new(BookField::Title, SortDirection::Desc)]);
        assert_eq!(spec.window.offset(), 25);
    }
}
