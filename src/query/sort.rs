//! Sort directives and their parsing from the `sort` query parameter.

use std::cmp::Ordering;

use super::predicate::BookField;
use crate::models::Book;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortDirection::Asc => "ASC",
            SortDirection::Desc => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortDirective {
    pub field: BookField,
    pub direction: SortDirection,
}

impl SortDirective {
    pub fn new(field: BookField, direction: SortDirection) -> Self {
        Self { field, direction }
    }

    /// `created_at desc`, used whenever nothing usable was requested
    pub fn default_order() -> Vec<SortDirective> {
        vec![SortDirective::new(BookField::CreatedAt, SortDirection::Desc)]
    }
}

/// Map a public sort field name to a storage field
fn sortable_field(name: &str) -> Option<BookField> {
    match name {
        "title" => Some(BookField::Title),
        "author" => Some(BookField::Author),
        "publisher" => Some(BookField::Publisher),
        "genre" => Some(BookField::Genre),
        "available" => Some(BookField::Available),
        "created_at" | "createdAt" => Some(BookField::CreatedAt),
        "updated_at" | "updatedAt" => Some(BookField::UpdatedAt),
        _ => None,
    }
}

/// Parse `title:asc,author:desc` into directives.
///
/// Unknown fields are dropped. A missing or unrecognised direction means
/// ascending. If nothing survives, the default order is returned.
pub fn parse_sort(raw: Option<&str>) -> Vec<SortDirective> {
    let directives: Vec<SortDirective> = raw
        .unwrap_or("")
        .split(',')
        .filter_map(|part| {
            let mut pieces = part.splitn(2, ':');
            let field = sortable_field(pieces.next()?.trim())?;
            let direction = match pieces.next().map(|d| d.trim().to_ascii_lowercase()) {
                Some(d) if d == "desc" => SortDirection::Desc,
                _ => SortDirection::Asc,
            };
            Some(SortDirective::new(field, direction))
        })
        .collect();

    if directives.is_empty() {
        SortDirective::default_order()
    } else {
        directives
    }
}

/// NULLs sort after every value, as Postgres does for ascending order
fn cmp_nullable<T: Ord>(a: Option<T>, b: Option<T>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
    }
}

fn cmp_field(field: BookField, a: &Book, b: &Book) -> Ordering {
    match field {
        BookField::Available => a.available.cmp(&b.available),
        BookField::CreatedAt => a.created_at.cmp(&b.created_at),
        BookField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        // Case-folded, then byte order, like `LOWER(col) COLLATE "C"` in SQL
        text => cmp_nullable(
            text.text_of(a).map(str::to_lowercase),
            text.text_of(b).map(str::to_lowercase),
        ),
    }
}

/// Compare two books under a list of directives, first directive primary.
/// Ties on every directive fall back to the id so the order is total.
pub fn compare_books(a: &Book, b: &Book, order: &[SortDirective]) -> Ordering {
    order
        .iter()
        .map(|d| {
            let ord = cmp_field(d.field, a, b);
            match d.direction {
                SortDirection::Asc => ord,
                SortDirection::Desc => ord.reverse(),
            }
        })
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or_else(|| a.id.cmp(&b.id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn book(title: &str, author: Option<&str>) -> Book {
        let now = Utc::now();
        Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: author.map(String::from),
            publisher: None,
            genre: None,
            available: true,
            image_url: None,
            user_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn parses_multiple_directives_in_order() {
        assert_eq!(
            parse_sort(Some("title:asc,author:desc")),
            vec![
                SortDirective::new(BookField::Title, SortDirection::Asc),
                SortDirective::new(BookField::Author, SortDirection::Desc),
            ]
        );
    }

    #[test]
    fn tolerates_whitespace_and_case() {
        assert_eq!(
            parse_sort(Some(" genre : DESC ")),
            vec![SortDirective::new(BookField::Genre, SortDirection::Desc)]
        );
    }

    #[test]
    fn missing_direction_is_ascending() {
        assert_eq!(
            parse_sort(Some("createdAt")),
            vec![SortDirective::new(BookField::CreatedAt, SortDirection::Asc)]
        );
    }

    #[test]
    fn unknown_fields_fall_back_to_default() {
        assert_eq!(parse_sort(Some("password:asc")), SortDirective::default_order());
        assert_eq!(parse_sort(Some("")), SortDirective::default_order());
        assert_eq!(parse_sort(None), SortDirective::default_order());
    }

    #[test]
    fn unknown_fields_are_dropped_not_fatal() {
        assert_eq!(
            parse_sort(Some("nope:desc,title:desc")),
            vec![SortDirective::new(BookField::Title, SortDirection::Desc)]
        );
    }

    #[test]
    fn secondary_directive_breaks_ties() {
        let a = book("Same", Some("Adams"));
        let b = book("Same", Some("Zola"));
        let order = parse_sort(Some("title:asc,author:desc"));
        assert_eq!(compare_books(&b, &a, &order), Ordering::Less);
    }

    #[test]
    fn text_sort_ignores_case() {
        let lower = book("apple", None);
        let upper = book("Banana", None);
        let asc = [SortDirective::new(BookField::Title, SortDirection::Asc)];
        assert_eq!(compare_books(&lower, &upper, &asc), Ordering::Less);

        let mut books = vec![book("cherry", None), upper, lower, book("Apricot", None)];
        books.sort_by(|a, b| compare_books(a, b, &asc));
        let titles: Vec<_> = books.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["apple", "Apricot", "Banana", "cherry"]);
    }

    #[test]
    fn nulls_last_ascending_first_descending() {
        let with = book("A", Some("Adams"));
        let without = book("B", None);
        let asc = [SortDirective::new(BookField::Author, SortDirection::Asc)];
        let desc = [SortDirective::new(BookField::Author, SortDirection::Desc)];
        assert_eq!(compare_books(&with, &without, &asc), Ordering::Less);
        assert_eq!(compare_books(&with, &without, &desc), Ordering::Greater);
    }
}
