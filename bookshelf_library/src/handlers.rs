use std::fmt::Display;

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use paperclip::actix::api_v2_operation;

use crate::api::{Book, MessageResponse, UserId};
use crate::books_repository::{BookRepository, BookRepositoryError};
use crate::genres_repository::{ensure_genre, GenresRepository};
use crate::users_repository::{UsersRepository, UsersRepositoryError};

mod auth;
mod books;
mod catalog;
mod genres;
mod library;


pub use auth::{login, register};
pub use books::{add_book, delete_book, get_book, list_books, update_book, update_status};
pub use catalog::{find_cover, search_catalog};
pub use genres::{add_genre, delete_genre, list_genres};
pub use library::{get_dashboard, get_library, import_statuses};

const USER_ID_REQUIRED: &str = "ID do usuário é obrigatório.";
const USER_NOT_FOUND: &str = "Usuário não encontrado.";
const BOOK_NOT_FOUND: &str = "Livro não encontrado.";

/// Failure of a request, rendered as `{"message": ...}` with the matching status code
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    /// Logs the cause and hides it from the client
    pub fn internal(message: &str, cause: impl Display) -> Self {
        tracing::error!("{}: {}", message, cause);
        ApiError::Internal(message.to_string())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(MessageResponse {
            message: self.to_string(),
        })
    }
}

#[api_v2_operation]
pub async fn health() -> Result<HttpResponse, actix_web::Error> {
    Ok(HttpResponse::Ok().finish())
}

/// Checks that the user id was sent and belongs to a registered user
pub(crate) async fn require_user(
    users_repository: &dyn UsersRepository,
    user_id: Option<UserId>,
) -> Result<UserId, ApiError> {
    let user_id = user_id.ok_or_else(|| ApiError::BadRequest(USER_ID_REQUIRED.to_string()))?;
    match users_repository.get_user(user_id).await {
        Ok(user) => Ok(user.id),
        Err(UsersRepositoryError::UserNotFound(_)) => {
            Err(ApiError::NotFound(USER_NOT_FOUND.to_string()))
        }
        Err(err) => Err(ApiError::internal("Erro ao buscar o usuário.", err)),
    }
}

/// Like [`require_user`] when the user id was sent, otherwise nothing is checked
pub(crate) async fn optional_user(
    users_repository: &dyn UsersRepository,
    user_id: Option<UserId>,
) -> Result<Option<UserId>, ApiError> {
    match user_id {
        Some(user_id) => Ok(Some(require_user(users_repository, Some(user_id)).await?)),
        None => Ok(None),
    }
}

/// Loads the book, books of other users are reported as missing
pub(crate) async fn owned_book(
    books_repository: &dyn BookRepository,
    book_id: &str,
    user_id: Option<UserId>,
) -> Result<Book, ApiError> {
    match books_repository.get_book(book_id).await {
        Ok(book) if user_id.map_or(true, |user_id| user_id == book.user_id) => Ok(book),
        Ok(_) | Err(BookRepositoryError::NotFound(_)) => {
            Err(ApiError::NotFound(BOOK_NOT_FOUND.to_string()))
        }
        Err(err) => Err(ApiError::internal("Ocorreu um erro ao buscar o livro.", err)),
    }
}

/// Trimmed genre name, blank names mean no genre
fn normalize_genre(genre: Option<String>) -> Option<String> {
    genre
        .map(|genre| genre.trim().to_string())
        .filter(|genre| !genre.is_empty())
}

/// Free text genres become part of the genre list, books keep the registered spelling
pub(crate) async fn canonical_genre(
    genres_repository: &dyn GenresRepository,
    genre: Option<String>,
) -> Result<Option<String>, ApiError> {
    let Some(genre) = normalize_genre(genre) else {
        return Ok(None);
    };
    let genre = ensure_genre(genres_repository, &genre)
        .await
        .map_err(|err| ApiError::internal("Erro ao registrar o gênero.", err))?;
    Ok(Some(genre.name))
}
