//! Books repository for PostgreSQL.
//!
//! Predicates are translated into parameterised SQL with `QueryBuilder`, so
//! user input never reaches the statement text.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{BookSelection, BookStore, DeletedScope};
use crate::{
    error::AppResult,
    models::{Book, UpdateBook},
    query::{BookField, FieldValue, Predicate, SortDirective},
};

const COLUMNS: &str = "id, title, author, publisher, genre, available, image_url, user_id, \
                       created_at, updated_at, deleted_at";

/// Escape LIKE metacharacters so the term matches literally
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn push_predicate(qb: &mut QueryBuilder<'_, Postgres>, predicate: &Predicate) {
    match predicate {
        Predicate::Always => {
            qb.push("TRUE");
        }
        Predicate::And(parts) | Predicate::Or(parts) if parts.is_empty() => {
            qb.push(if matches!(predicate, Predicate::And(_)) { "TRUE" } else { "FALSE" });
        }
        Predicate::And(parts) | Predicate::Or(parts) => {
            let joiner = if matches!(predicate, Predicate::And(_)) { " AND " } else { " OR " };
            qb.push("(");
            for (i, part) in parts.iter().enumerate() {
                if i > 0 {
                    qb.push(joiner);
                }
                push_predicate(qb, part);
            }
            qb.push(")");
        }
        Predicate::Contains { field, term } => {
            qb.push(field.column())
                .push(" ILIKE ")
                .push_bind(like_pattern(term));
        }
        Predicate::Equals { field, value } => {
            qb.push(field.column()).push(" = ");
            match value {
                FieldValue::Text(t) => qb.push_bind(t.clone()),
                FieldValue::Bool(b) => qb.push_bind(*b),
            };
        }
    }
}

fn push_scope(qb: &mut QueryBuilder<'_, Postgres>, scope: DeletedScope) {
    match scope {
        DeletedScope::Active => {
            qb.push(" AND deleted_at IS NULL");
        }
        DeletedScope::DeletedOnly => {
            qb.push(" AND deleted_at IS NOT NULL");
        }
        DeletedScope::All => {}
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, selection: &BookSelection) {
    qb.push(" WHERE ");
    push_predicate(qb, &selection.predicate);
    push_scope(qb, selection.scope);
}

fn push_order(qb: &mut QueryBuilder<'_, Postgres>, order: &[SortDirective]) {
    qb.push(" ORDER BY ");
    for directive in order {
        let column = directive.field.column();
        if directive.field.is_text() {
            qb.push(format!("LOWER({}) COLLATE \"C\"", column));
        } else {
            qb.push(column);
        }
        qb.push(" ")
            .push(directive.direction.as_sql())
            .push(", ");
    }
    qb.push("id ASC");
}

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    async fn count(&self, selection: &BookSelection) -> AppResult<i64> {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM books");
        push_where(&mut qb, selection);
        let total: i64 = qb.build_query_scalar().fetch_one(&self.pool).await?;
        Ok(total)
    }

    async fn fetch(&self, selection: &BookSelection) -> AppResult<Vec<Book>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM books", COLUMNS));
        push_where(&mut qb, selection);
        push_order(&mut qb, &selection.order);
        if let Some(window) = selection.window {
            qb.push(" LIMIT ")
                .push_bind(window.limit())
                .push(" OFFSET ")
                .push_bind(window.offset());
        }
        let books = qb.build_query_as::<Book>().fetch_all(&self.pool).await?;
        Ok(books)
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn find_and_count(&self, selection: &BookSelection) -> AppResult<(Vec<Book>, i64)> {
        // Two independent statements; the count may drift from the page under concurrent writes.
        tokio::try_join!(self.fetch(selection), self.count(selection))
    }

    async fn find_by_id(&self, id: Uuid, scope: DeletedScope) -> AppResult<Option<Book>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM books WHERE id = ", COLUMNS));
        qb.push_bind(id);
        push_scope(&mut qb, scope);
        let book = qb
            .build_query_as::<Book>()
            .fetch_optional(&self.pool)
            .await?;
        Ok(book)
    }

    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let row = sqlx::query_as::<_, Book>(&format!(
            r#"
            INSERT INTO books (id, title, author, publisher, genre, available, image_url,
                               user_id, created_at, updated_at, deleted_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(book.id)
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.publisher)
        .bind(&book.genre)
        .bind(book.available)
        .bind(&book.image_url)
        .bind(book.user_id)
        .bind(book.created_at)
        .bind(book.updated_at)
        .bind(book.deleted_at)
        .fetch_one(&self.pool)
        .await?;
        Ok(row)
    }

    async fn update(&self, id: Uuid, changes: &UpdateBook) -> AppResult<Option<Book>> {
        let row = sqlx::query_as::<_, Book>(&format!(
            r#"
            UPDATE books SET
                title = COALESCE($1::text, title),
                author = COALESCE($2::text, author),
                publisher = COALESCE($3::text, publisher),
                genre = COALESCE($4::text, genre),
                available = COALESCE($5::boolean, available),
                image_url = COALESCE($6::text, image_url),
                updated_at = $7
            WHERE id = $8 AND deleted_at IS NULL
            RETURNING {}
            "#,
            COLUMNS
        ))
        .bind(&changes.title)
        .bind(&changes.author)
        .bind(&changes.publisher)
        .bind(&changes.genre)
        .bind(changes.available)
        .bind(&changes.image_url)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }

    async fn soft_delete(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE books SET deleted_at = $1 WHERE id = $2 AND deleted_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn restore(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE books SET deleted_at = NULL, updated_at = $1 WHERE id = $2 AND deleted_at IS NOT NULL",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn destroy(&self, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM books WHERE id = $1 AND deleted_at IS NOT NULL")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn distinct_values(&self, field: BookField) -> AppResult<Vec<String>> {
        if !field.is_text() {
            return Ok(Vec::new());
        }
        let column = field.column();
        let values = sqlx::query_scalar::<_, String>(&format!(
            "SELECT DISTINCT {c} COLLATE \"C\" FROM books \
             WHERE deleted_at IS NULL AND {c} IS NOT NULL AND btrim({c}) <> '' \
             ORDER BY 1",
            c = column
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(values)
    }

    async fn ping(&self) -> AppResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
