//! Repository layer: the Record Store contract and its adapters

pub mod books;
pub mod memory;
pub mod users;

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        user::{User, UserChanges},
        Book, UpdateBook,
    },
    query::{BookField, PageWindow, Predicate, SortDirective},
};

/// Which rows a query sees with respect to soft deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeletedScope {
    /// Only rows with a null `deleted_at` (the default)
    Active,
    /// Only soft-deleted rows
    DeletedOnly,
    /// Everything ("paranoid" mode off)
    All,
}

impl DeletedScope {
    pub fn admits(&self, book: &Book) -> bool {
        match self {
            DeletedScope::Active => book.deleted_at.is_none(),
            DeletedScope::DeletedOnly => book.deleted_at.is_some(),
            DeletedScope::All => true,
        }
    }
}

/// A fully described listing query handed to a store
#[derive(Debug, Clone)]
pub struct BookSelection {
    pub predicate: Predicate,
    pub scope: DeletedScope,
    pub order: Vec<SortDirective>,
    /// `None` fetches every matching row
    pub window: Option<PageWindow>,
}

/// Persistence contract for books
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    /// Rows for the selection's window plus the total count ignoring the window
    async fn find_and_count(&self, selection: &BookSelection) -> AppResult<(Vec<Book>, i64)>;

    async fn find_by_id(&self, id: Uuid, scope: DeletedScope) -> AppResult<Option<Book>>;

    async fn insert(&self, book: &Book) -> AppResult<Book>;

    /// Merge provided fields into an active record. `None` when no active row matched.
    async fn update(&self, id: Uuid, changes: &UpdateBook) -> AppResult<Option<Book>>;

    /// Set `deleted_at` on an active row; false when nothing changed
    async fn soft_delete(&self, id: Uuid) -> AppResult<bool>;

    /// Clear `deleted_at` on a deleted row; false when nothing changed
    async fn restore(&self, id: Uuid) -> AppResult<bool>;

    /// Permanently remove a soft-deleted row; false when nothing changed
    async fn destroy(&self, id: Uuid) -> AppResult<bool>;

    /// Distinct non-empty values of a text field among active rows, sorted
    async fn distinct_values(&self, field: BookField) -> AppResult<Vec<String>>;

    async fn ping(&self) -> AppResult<()>;
}

/// Persistence contract for user accounts
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>>;

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>>;

    /// Fails with `Conflict` when the email is already registered
    async fn insert(&self, user: &User) -> AppResult<User>;

    async fn update(&self, id: Uuid, changes: &UserChanges) -> AppResult<Option<User>>;
}

/// Main repository struct holding the configured stores
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub users: Arc<dyn UserStore>,
}

impl Repository {
    /// Create a repository backed by PostgreSQL
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            users: Arc::new(users::UsersRepository::new(pool)),
        }
    }

    /// Create a repository that keeps everything in process memory
    pub fn in_memory() -> Self {
        Self {
            books: Arc::new(memory::MemoryBookStore::default()),
            users: Arc::new(memory::MemoryUserStore::default()),
        }
    }
}
