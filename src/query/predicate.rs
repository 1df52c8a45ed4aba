//! Storage-independent predicate tree over book fields.
//!
//! The engine only ever builds `Predicate` values; each store adapter is
//! responsible for turning them into its own query language (SQL for
//! Postgres, direct evaluation for the in-memory store).

use crate::models::Book;

/// Book attributes that can appear in a predicate or an ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookField {
    Title,
    Author,
    Publisher,
    Genre,
    Available,
    CreatedAt,
    UpdatedAt,
}

impl BookField {
    /// Storage column name
    pub fn column(&self) -> &'static str {
        match self {
            BookField::Title => "title",
            BookField::Author => "author",
            BookField::Publisher => "publisher",
            BookField::Genre => "genre",
            BookField::Available => "available",
            BookField::CreatedAt => "created_at",
            BookField::UpdatedAt => "updated_at",
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(
            self,
            BookField::Title | BookField::Author | BookField::Publisher | BookField::Genre
        )
    }

    /// Text value of a text field, `None` when absent or not a text field
    pub fn text_of<'a>(&self, book: &'a Book) -> Option<&'a str> {
        match self {
            BookField::Title => Some(book.title.as_str()),
            BookField::Author => book.author.as_deref(),
            BookField::Publisher => book.publisher.as_deref(),
            BookField::Genre => book.genre.as_deref(),
            _ => None,
        }
    }
}

/// Literal compared against a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Matches every record
    Always,
    And(Vec<Predicate>),
    Or(Vec<Predicate>),
    /// Case-insensitive substring match on a text field
    Contains { field: BookField, term: String },
    /// Exact equality
    Equals { field: BookField, value: FieldValue },
}

impl Predicate {
    pub fn contains(field: BookField, term: impl Into<String>) -> Self {
        Predicate::Contains {
            field,
            term: term.into(),
        }
    }

    pub fn equals(field: BookField, value: FieldValue) -> Self {
        Predicate::Equals { field, value }
    }

    /// Conjunction that collapses trivial cases
    pub fn all_of(mut parts: Vec<Predicate>) -> Self {
        parts.retain(|p| *p != Predicate::Always);
        match parts.len() {
            0 => Predicate::Always,
            1 => parts.remove(0),
            _ => Predicate::And(parts),
        }
    }

    /// Evaluate the predicate against an in-memory record.
    ///
    /// An empty `And` is true and an empty `Or` is false, matching the SQL
    /// translation.
    pub fn matches(&self, book: &Book) -> bool {
        match self {
            Predicate::Always => true,
            Predicate::And(parts) => parts.iter().all(|p| p.matches(book)),
            Predicate::Or(parts) => parts.iter().any(|p| p.matches(book)),
            Predicate::Contains { field, term } => field
                .text_of(book)
                .map(|text| text.to_lowercase().contains(&term.to_lowercase()))
                .unwrap_or(false),
            Predicate::Equals { field, value } => match (field, value) {
                (BookField::Available, FieldValue::Bool(b)) => book.available == *b,
                (f, FieldValue::Text(t)) => f.text_of(book) == Some(t.as_str()),
                _ => false,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn book(title: &str, author: Option<&str>, genre: Option<&str>, available: bool) -> Book {
        let now = Utc::now();
        Book {
            id: Uuid::new_v4(),
            title: title.to_string(),
            author: author.map(String::from),
            publisher: None,
            genre: genre.map(String::from),
            available,
            image_url: None,
            user_id: None,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    #[test]
    fn contains_is_case_insensitive() {
        let b = book("The Great Gatsby", Some("F. Scott Fitzgerald"), None, true);
        assert!(Predicate::contains(BookField::Title, "gatsby").matches(&b));
        assert!(Predicate::contains(BookField::Author, "SCOTT").matches(&b));
        assert!(!Predicate::contains(BookField::Title, "mockingbird").matches(&b));
    }

    #[test]
    fn contains_on_missing_field_is_false() {
        let b = book("Dune", None, None, true);
        assert!(!Predicate::contains(BookField::Author, "").matches(&b));
    }

    #[test]
    fn equals_bool_and_text() {
        let b = book("Dune", None, Some("Science Fiction"), false);
        assert!(Predicate::equals(BookField::Available, FieldValue::Bool(false)).matches(&b));
        assert!(!Predicate::equals(BookField::Available, FieldValue::Bool(true)).matches(&b));
        assert!(Predicate::equals(
            BookField::Genre,
            FieldValue::Text("Science Fiction".into())
        )
        .matches(&b));
    }

    #[test]
    fn empty_connectives() {
        let b = book("Dune", None, None, true);
        assert!(Predicate::And(vec![]).matches(&b));
        assert!(!Predicate::Or(vec![]).matches(&b));
    }

    #[test]
    fn all_of_collapses() {
        assert_eq!(Predicate::all_of(vec![]), Predicate::Always);
        assert_eq!(
            Predicate::all_of(vec![Predicate::Always, Predicate::contains(BookField::Title, "x")]),
            Predicate::contains(BookField::Title, "x")
        );
    }
}
