//! In-process stores used by `database.backend = "memory"` and by tests.
//!
//! Predicates are evaluated with `Predicate::matches` and ordering uses the
//! same NULL placement as the Postgres adapter.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{BookSelection, BookStore, DeletedScope, UserStore};
use crate::{
    error::{AppError, AppResult},
    models::{
        user::{User, UserChanges},
        Book, UpdateBook,
    },
    query::{sort::compare_books, BookField},
};

#[derive(Default)]
pub struct MemoryBookStore {
    books: RwLock<HashMap<Uuid, Book>>,
}

impl MemoryBookStore {
    /// Store pre-populated with the given records
    pub fn with_books(books: impl IntoIterator<Item = Book>) -> Self {
        Self {
            books: RwLock::new(books.into_iter().map(|b| (b.id, b)).collect()),
        }
    }
}

#[async_trait]
impl BookStore for MemoryBookStore {
    async fn find_and_count(&self, selection: &BookSelection) -> AppResult<(Vec<Book>, i64)> {
        let books = self.books.read().await;
        let mut matching: Vec<Book> = books
            .values()
            .filter(|b| selection.scope.admits(b) && selection.predicate.matches(b))
            .cloned()
            .collect();
        matching.sort_by(|a, b| compare_books(a, b, &selection.order));

        let total = matching.len() as i64;
        let page = match selection.window {
            Some(window) => matching
                .into_iter()
                .skip(window.offset() as usize)
                .take(window.limit() as usize)
                .collect(),
            None => matching,
        };
        Ok((page, total))
    }

    async fn find_by_id(&self, id: Uuid, scope: DeletedScope) -> AppResult<Option<Book>> {
        let books = self.books.read().await;
        Ok(books.get(&id).filter(|b| scope.admits(b)).cloned())
    }

    async fn insert(&self, book: &Book) -> AppResult<Book> {
        let mut books = self.books.write().await;
        if books.contains_key(&book.id) {
            return Err(AppError::Conflict(format!("Book {} already exists", book.id)));
        }
        books.insert(book.id, book.clone());
        Ok(book.clone())
    }

    async fn update(&self, id: Uuid, changes: &UpdateBook) -> AppResult<Option<Book>> {
        let mut books = self.books.write().await;
        let Some(book) = books.get_mut(&id).filter(|b| !b.is_deleted()) else {
            return Ok(None);
        };

        macro_rules! merge {
            ($field:ident) => {
                if let Some(ref value) = changes.$field {
                    book.$field = Some(value.clone());
                }
            };
        }

        if let Some(ref title) = changes.title {
            book.title = title.clone();
        }
        merge!(author);
        merge!(publisher);
        merge!(genre);
        merge!(image_url);
        if let Some(available) = changes.available {
            book.available = available;
        }
        book.updated_at = Utc::now();
        Ok(Some(book.clone()))
    }

    async fn soft_delete(&self, id: Uuid) -> AppResult<bool> {
        let mut books = self.books.write().await;
        match books.get_mut(&id).filter(|b| !b.is_deleted()) {
            Some(book) => {
                book.deleted_at = Some(Utc::now());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn restore(&self, id: Uuid) -> AppResult<bool> {
        let mut books = self.books.write().await;
        match books.get_mut(&id).filter(|b| b.is_deleted()) {
            Some(book) => {
                book.deleted_at = None;
                book.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn destroy(&self, id: Uuid) -> AppResult<bool> {
        let mut books = self.books.write().await;
        if books.get(&id).is_some_and(|b| b.is_deleted()) {
            books.remove(&id);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn distinct_values(&self, field: BookField) -> AppResult<Vec<String>> {
        let books = self.books.read().await;
        let values: BTreeSet<String> = books
            .values()
            .filter(|b| !b.is_deleted())
            .filter_map(|b| field.text_of(b))
            .filter(|v| !v.trim().is_empty())
            .map(String::from)
            .collect();
        Ok(values.into_iter().collect())
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn insert(&self, user: &User) -> AppResult<User> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::Conflict("Email is already registered".to_string()));
        }
        users.insert(user.id, user.clone());
        Ok(user.clone())
    }

    async fn update(&self, id: Uuid, changes: &UserChanges) -> AppResult<Option<User>> {
        let mut users = self.users.write().await;
        if let Some(ref email) = changes.email {
            if users
                .values()
                .any(|u| u.id != id && u.email.eq_ignore_ascii_case(email))
            {
                return Err(AppError::Conflict("Email is already registered".to_string()));
            }
        }
        let Some(user) = users.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(ref name) = changes.name {
            user.name = name.clone();
        }
        if let Some(ref email) = changes.email {
            user.email = email.clone();
        }
        if let Some(ref hash) = changes.password_hash {
            user.password_hash = hash.clone();
        }
        user.updated_at = Utc::now();
        Ok(Some(user.clone()))
    }
}
