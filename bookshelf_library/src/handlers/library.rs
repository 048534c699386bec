use std::sync::Arc;

use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use paperclip::actix::{api_v2_operation, web};

use crate::api::{
    Book, LegacyStatusImport, LibraryViewParams, LibraryViewResponse, StatusImportResponse,
    UserId, UserQuery,
};
use crate::books_repository::BookRepository;
use crate::handlers::{require_user, ApiError};
use crate::library_view::{self, LibraryQuery};
use crate::reading_status::StatusMap;
use crate::users_repository::UsersRepository;

async fn user_books(
    books_repository: &dyn BookRepository,
    user_id: UserId,
) -> Result<Vec<Book>, ApiError> {
    books_repository
        .list_books(user_id)
        .await
        .map_err(|err| ApiError::internal("Ocorreu um erro ao buscar os livros.", err))
}

/// Books of the user after search, filters and ordering, with status counts of the whole library
#[api_v2_operation]
pub async fn get_library(
    books_repository: Data<Arc<dyn BookRepository>>,
    users_repository: Data<Arc<dyn UsersRepository>>,
    params: web::Query<LibraryViewParams>,
) -> Result<HttpResponse, Error> {
    let params = params.into_inner();
    let user_id = require_user(users_repository.get_ref().as_ref(), params.user_id).await?;
    let books = user_books(books_repository.get_ref().as_ref(), user_id).await?;

    let statuses = StatusMap::from_books(&books);
    let counts = statuses.counts(&books);
    let query = LibraryQuery::from(params);

    Ok(HttpResponse::Ok().json(LibraryViewResponse {
        books: library_view::apply(&books, &query, &statuses),
        counts,
    }))
}

/// Moves statuses kept by older clients onto the books
#[api_v2_operation]
pub async fn import_statuses(
    books_repository: Data<Arc<dyn BookRepository>>,
    users_repository: Data<Arc<dyn UsersRepository>>,
    query: web::Query<UserQuery>,
    request: web::Json<LegacyStatusImport>,
) -> Result<HttpResponse, Error> {
    let user_id = require_user(users_repository.get_ref().as_ref(), query.user_id).await?;
    let books = user_books(books_repository.get_ref().as_ref(), user_id).await?;

    let mut statuses = StatusMap::load(&request.statuses);
    let discarded = statuses.retain_books(books.iter().map(|book| &book.id));
    for (book_id, status) in statuses.iter() {
        books_repository
            .set_status(book_id, Some(*status))
            .await
            .map_err(|err| ApiError::internal("Erro ao importar os status.", err))?;
    }
    tracing::info!(
        "Imported {} statuses for user {}, discarded {}",
        statuses.len(),
        user_id,
        discarded
    );

    Ok(HttpResponse::Ok().json(StatusImportResponse {
        message: "Status importados com sucesso!".to_string(),
        imported: statuses.len(),
        discarded,
    }))
}

#[api_v2_operation]
pub async fn get_dashboard(
    books_repository: Data<Arc<dyn BookRepository>>,
    users_repository: Data<Arc<dyn UsersRepository>>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, Error> {
    let user_id = require_user(users_repository.get_ref().as_ref(), query.user_id).await?;
    let books = user_books(books_repository.get_ref().as_ref(), user_id).await?;
    Ok(HttpResponse::Ok().json(crate::dashboard::compute(&books)))
}
