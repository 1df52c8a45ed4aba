//! Business logic services

pub mod auth;
pub mod books;
pub mod uploads;

use crate::{config::AppConfig, repository::Repository};

/// Container for all services
#[derive(Clone)]
pub struct Services {
    pub auth: auth::AuthService,
    pub books: books::BooksService,
    pub uploads: uploads::UploadService,
}

impl Services {
    /// Create all services with the given repository
    pub fn new(repository: Repository, config: &AppConfig) -> Self {
        Self {
            auth: auth::AuthService::new(
                repository.users.clone(),
                auth::PasswordService::new(),
                config.auth.clone(),
            ),
            books: books::BooksService::new(repository.books.clone()),
            uploads: uploads::UploadService::new(&config.uploads),
        }
    }
}
