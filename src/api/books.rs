//! Book catalog endpoints

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use axum_extra::extract::Multipart;
use chrono::Utc;
use uuid::Uuid;

use crate::{
    error::{AppError, AppResult},
    models::{Book, BookQuery, CreateBook, FilterOptions, UpdateBook},
    query::{FilterSpec, ResultPage},
};

use super::AuthenticatedUser;

/// List books with search, filters, sorting and pagination
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "Page of books", body = ResultPage),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<ResultPage>> {
    let page = state.services.books.list(&FilterSpec::from(&query)).await?;
    Ok(Json(page))
}

/// Export every book matching the filters as CSV
#[utoipa::path(
    get,
    path = "/books/export",
    tag = "books",
    security(("bearer_auth" = [])),
    params(BookQuery),
    responses(
        (status = 200, description = "CSV file", content_type = "text/csv", body = String),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn export_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<impl IntoResponse> {
    let csv = state
        .services
        .books
        .export_all(&FilterSpec::from(&query))
        .await?;
    let disposition = format!(
        "attachment; filename=\"books-{}.csv\"",
        Utc::now().format("%Y%m%d-%H%M%S")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    ))
}

/// Distinct genres, publishers and authors for filter dropdowns
#[utoipa::path(
    get,
    path = "/books/filters",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Filter options", body = FilterOptions)
    )
)]
pub async fn filter_options(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
) -> Json<FilterOptions> {
    Json(state.services.books.filter_options().await)
}

/// List soft-deleted books
#[utoipa::path(
    get,
    path = "/books/deleted",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("sort" = Option<String>, Query, description = "Comma-separated field:direction pairs"),
        ("page" = Option<i64>, Query, description = "Page number (default: 1)"),
        ("per_page" = Option<i64>, Query, description = "Books per page (default: 10)")
    ),
    responses(
        (status = 200, description = "Page of deleted books", body = ResultPage)
    )
)]
pub async fn list_deleted_books(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Query(query): Query<BookQuery>,
) -> AppResult<Json<ResultPage>> {
    let page = state
        .services
        .books
        .list_deleted(&FilterSpec::from(&query))
        .await?;
    Ok(Json(page))
}

/// Get book details by ID
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book details", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.get(id).await?;
    Ok(Json(book))
}

/// Create a new book owned by the caller
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid input")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(claims): AuthenticatedUser,
    Json(data): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    let created = state
        .services
        .books
        .create(Some(claims.user_id), data)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// Partially update a book
#[utoipa::path(
    put,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body = UpdateBook,
    responses(
        (status = 200, description = "Book updated", body = Book),
        (status = 404, description = "Book not found")
    )
)]
pub async fn update_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    Json(data): Json<UpdateBook>,
) -> AppResult<Json<Book>> {
    let updated = state.services.books.update(id, data).await?;
    Ok(Json(updated))
}

/// Soft-delete a book
#[utoipa::path(
    delete,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book deleted"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    state.services.books.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Restore a soft-deleted book
#[utoipa::path(
    post,
    path = "/books/{id}/restore",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 200, description = "Book restored", body = Book),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book is not deleted")
    )
)]
pub async fn restore_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Book>> {
    let book = state.services.books.restore(id).await?;
    Ok(Json(book))
}

/// Permanently delete a soft-deleted book
#[utoipa::path(
    delete,
    path = "/books/{id}/force",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    responses(
        (status = 204, description = "Book permanently deleted"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book must be soft-deleted first")
    )
)]
pub async fn force_delete_book(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let removed = state.services.books.force_delete(id).await?;
    if let Some(ref url) = removed.image_url {
        state.services.uploads.remove_managed(url).await;
    }
    Ok(StatusCode::NO_CONTENT)
}

/// Upload a cover image (multipart field `image`)
#[utoipa::path(
    post,
    path = "/books/{id}/image",
    tag = "books",
    security(("bearer_auth" = [])),
    params(("id" = Uuid, Path, description = "Book ID")),
    request_body(content = String, content_type = "multipart/form-data", description = "Form with an `image` file field"),
    responses(
        (status = 200, description = "Book with new image", body = Book),
        (status = 400, description = "Missing or invalid file"),
        (status = 404, description = "Book not found")
    )
)]
pub async fn upload_image(
    State(state): State<crate::AppState>,
    AuthenticatedUser(_claims): AuthenticatedUser,
    Path(id): Path<Uuid>,
    mut multipart: Multipart,
) -> AppResult<Json<Book>> {
    // Fail fast before writing anything for an unknown book
    state.services.books.get(id).await?;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("image") {
            continue;
        }
        let file_name = field.file_name().map(String::from);
        let content_type = field.content_type().map(String::from);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        let url = state
            .services
            .uploads
            .store_image(file_name.as_deref(), content_type.as_deref(), &bytes)
            .await?;
        let (book, previous) = match state.services.books.set_image(id, url.clone()).await {
            Ok(result) => result,
            Err(e) => {
                state.services.uploads.remove_managed(&url).await;
                return Err(e);
            }
        };
        if let Some(previous) = previous {
            state.services.uploads.remove_managed(&previous).await;
        }
        return Ok(Json(book));
    }

    Err(AppError::Validation("Missing `image` file field".to_string()))
}
