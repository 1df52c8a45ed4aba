//! Book (catalog entry) model and related request types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Book record as stored and returned by the API.
///
/// A non-null `deleted_at` marks the record as soft-deleted: it stays in
/// storage and can be restored, but normal listings skip it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub available: bool,
    /// Cover image URL (either external or served from the upload prefix)
    pub image_url: Option<String>,
    /// Owning user
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Book {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: String,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub available: Option<bool>,
    #[validate(length(max = 2048, message = "Image URL is too long"))]
    pub image_url: Option<String>,
}

/// Partial update request; absent fields are left untouched
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct UpdateBook {
    #[validate(length(min = 1, max = 255, message = "Title must be 1-255 characters"))]
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    pub genre: Option<String>,
    pub available: Option<bool>,
    #[validate(length(max = 2048, message = "Image URL is too long"))]
    pub image_url: Option<String>,
}

/// Book listing query parameters, exactly as they arrive on the query string
#[derive(Debug, Clone, Default, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Free-text search over title, author, publisher and genre
    pub search: Option<String>,
    pub genre: Option<String>,
    pub publisher: Option<String>,
    pub author: Option<String>,
    /// `true`, `false`, or absent
    pub available: Option<String>,
    /// Comma-separated `field:direction` pairs, e.g. `title:asc,author:desc`
    pub sort: Option<String>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

/// Distinct values offered by the filter dropdowns
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FilterOptions {
    pub genres: Vec<String>,
    pub publishers: Vec<String>,
    pub authors: Vec<String>,
}
