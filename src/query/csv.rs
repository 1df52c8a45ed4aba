//! CSV flattening of book listings for the export endpoint.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::Book;

pub const HEADER: &str =
    "ID,Title,Author,Publisher,Genre,Available,Image URL,User ID,Created At,Updated At";

/// Wrap in double quotes, doubling any embedded quote
fn quoted(value: Option<&str>) -> String {
    format!("\"{}\"", value.unwrap_or("").replace('"', "\"\""))
}

fn timestamp(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn row(book: &Book) -> String {
    [
        book.id.to_string(),
        quoted(Some(&book.title)),
        quoted(book.author.as_deref()),
        quoted(book.publisher.as_deref()),
        quoted(book.genre.as_deref()),
        if book.available { "Yes" } else { "No" }.to_string(),
        quoted(book.image_url.as_deref()),
        book.user_id.map(|id| id.to_string()).unwrap_or_default(),
        timestamp(&book.created_at),
        timestamp(&book.updated_at),
    ]
    .join(",")
}

/// Header line, a newline, then one line per book joined by `\n`.
/// An empty slice therefore yields the header followed by an empty line.
pub fn encode_books(books: &[Book]) -> String {
    let rows: Vec<String> = books.iter().map(row).collect();
    format!("{}\n{}", HEADER, rows.join("\n"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn book(title: &str) -> Book {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap();
        Book {
            id: Uuid::nil(),
            title: title.to_string(),
            author: Some("Author".to_string()),
            publisher: None,
            genre: Some("Fiction".to_string()),
            available: false,
            image_url: None,
            user_id: None,
            created_at: at,
            updated_at: at,
            deleted_at: None,
        }
    }

    #[test]
    fn empty_export_is_header_and_empty_line() {
        assert_eq!(encode_books(&[]), format!("{}\n", HEADER));
    }

    #[test]
    fn quotes_are_doubled() {
        let out = encode_books(&[book(r#"She said "hi""#)]);
        assert!(out.contains(r#""She said ""hi""""#));
    }

    #[test]
    fn row_layout() {
        let out = encode_books(&[book("Dune")]);
        let line = out.lines().nth(1).unwrap();
        assert_eq!(
            line,
            "00000000-0000-0000-0000-000000000000,\"Dune\",\"Author\",\"\",\"Fiction\",No,\"\",,\
             2024-03-01T12:30:00.000Z,2024-03-01T12:30:00.000Z"
        );
    }

    #[test]
    fn rows_are_newline_joined_without_trailing_newline() {
        let out = encode_books(&[book("A"), book("B")]);
        assert_eq!(out.matches('\n').count(), 2);
        assert!(!out.ends_with('\n'));
    }
}
