//! Book catalog service: the listing engine plus the record lifecycle

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{Book, CreateBook, FilterOptions, UpdateBook},
    query::{csv, BookField, FilterSpec, Predicate, ResultPage},
    repository::{BookSelection, BookStore, DeletedScope},
};

#[derive(Clone)]
pub struct BooksService {
    store: Arc<dyn BookStore>,
}

fn not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Book {} not found", id))
}

fn clean_title(title: &str) -> AppResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(AppError::Validation("Title must not be empty".to_string()));
    }
    Ok(title.to_string())
}

impl BooksService {
    pub fn new(store: Arc<dyn BookStore>) -> Self {
        Self { store }
    }

    /// Filtered, sorted, paginated listing of non-deleted books
    pub async fn list(&self, spec: &FilterSpec) -> AppResult<ResultPage> {
        let selection = BookSelection {
            predicate: spec.predicate(),
            scope: DeletedScope::Active,
            order: spec.sort.clone(),
            window: Some(spec.window),
        };
        let (data, total) = self.store.find_and_count(&selection).await?;
        tracing::debug!(total, page = spec.window.page, "Listed books");
        Ok(ResultPage::new(data, total, spec.window))
    }

    /// Soft-deleted books only, for the restore workflow. Search and field
    /// filters do not apply; sort and pagination do.
    pub async fn list_deleted(&self, spec: &FilterSpec) -> AppResult<ResultPage> {
        let selection = BookSelection {
            predicate: Predicate::Always,
            scope: DeletedScope::DeletedOnly,
            order: spec.sort.clone(),
            window: Some(spec.window),
        };
        let (data, total) = self.store.find_and_count(&selection).await?;
        Ok(ResultPage::new(data, total, spec.window))
    }

    /// Every book matching the filters, ignoring pagination, as CSV text
    pub async fn export_all(&self, spec: &FilterSpec) -> AppResult<String> {
        let selection = BookSelection {
            predicate: spec.predicate(),
            scope: DeletedScope::Active,
            order: spec.sort.clone(),
            window: None,
        };
        let (books, total) = self.store.find_and_count(&selection).await?;
        tracing::info!(total, "Exporting books to CSV");
        Ok(csv::encode_books(&books))
    }

    /// Distinct genres, publishers and authors. A failing lookup yields an
    /// empty list for that field instead of failing the request.
    pub async fn filter_options(&self) -> FilterOptions {
        let (genres, publishers, authors) = tokio::join!(
            self.distinct_or_empty(BookField::Genre),
            self.distinct_or_empty(BookField::Publisher),
            self.distinct_or_empty(BookField::Author),
        );
        FilterOptions {
            genres,
            publishers,
            authors,
        }
    }

    async fn distinct_or_empty(&self, field: BookField) -> Vec<String> {
        match self.store.distinct_values(field).await {
            Ok(values) => values,
            Err(e) => {
                tracing::warn!(field = field.column(), "Filter options unavailable: {}", e);
                Vec::new()
            }
        }
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Book> {
        self.store
            .find_by_id(id, DeletedScope::Active)
            .await?
            .ok_or_else(|| not_found(id))
    }

    pub async fn create(&self, owner: Option<Uuid>, data: CreateBook) -> AppResult<Book> {
        data.validate()?;
        let now = Utc::now();
        let book = Book {
            id: Uuid::new_v4(),
            title: clean_title(&data.title)?,
            author: data.author,
            publisher: data.publisher,
            genre: data.genre,
            available: data.available.unwrap_or(true),
            image_url: data.image_url,
            user_id: owner,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        let created = self.store.insert(&book).await?;
        tracing::info!(book_id = %created.id, "Book created");
        Ok(created)
    }

    pub async fn update(&self, id: Uuid, mut data: UpdateBook) -> AppResult<Book> {
        data.validate()?;
        if let Some(ref title) = data.title {
            data.title = Some(clean_title(title)?);
        }
        let updated = self
            .store
            .update(id, &data)
            .await?
            .ok_or_else(|| not_found(id))?;
        tracing::info!(book_id = %id, "Book updated");
        Ok(updated)
    }

    /// Soft delete
    pub async fn delete(&self, id: Uuid) -> AppResult<()> {
        if !self.store.soft_delete(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(book_id = %id, "Book soft-deleted");
        Ok(())
    }

    pub async fn restore(&self, id: Uuid) -> AppResult<Book> {
        let book = self
            .store
            .find_by_id(id, DeletedScope::All)
            .await?
            .ok_or_else(|| not_found(id))?;
        if !book.is_deleted() || !self.store.restore(id).await? {
            return Err(AppError::InvalidState(format!("Book {} is not deleted", id)));
        }
        tracing::info!(book_id = %id, "Book restored");
        self.get(id).await
    }

    /// Permanent removal, only allowed once the book has been soft-deleted
    pub async fn force_delete(&self, id: Uuid) -> AppResult<Book> {
        let book = self
            .store
            .find_by_id(id, DeletedScope::All)
            .await?
            .ok_or_else(|| not_found(id))?;
        if !book.is_deleted() {
            return Err(AppError::InvalidState(format!(
                "Book {} must be deleted before it can be permanently removed",
                id
            )));
        }
        if !self.store.destroy(id).await? {
            return Err(not_found(id));
        }
        tracing::info!(book_id = %id, "Book permanently deleted");
        Ok(book)
    }

    /// Point the book at a new cover image, returning the previous URL
    pub async fn set_image(&self, id: Uuid, image_url: String) -> AppResult<(Book, Option<String>)> {
        let previous = self.get(id).await?.image_url;
        let changes = UpdateBook {
            image_url: Some(image_url),
            ..Default::default()
        };
        let updated = self
            .store
            .update(id, &changes)
            .await?
            .ok_or_else(|| not_found(id))?;
        Ok((updated, previous))
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.store.ping().await
    }
}
