use std::sync::Arc;

use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use paperclip::actix::{api_v2_operation, web};

use crate::api::{
    BookId, BookResponse, NewBookRequest, StatusUpdate, UpdateBookRequest, UserQuery,
};
use crate::books_repository::BookRepository;
use crate::genres_repository::GenresRepository;
use crate::handlers::{
    canonical_genre, optional_user, owned_book, require_user, ApiError, BOOK_NOT_FOUND,
};
use crate::reading_status::next_status;
use crate::users_repository::UsersRepository;

#[api_v2_operation]
pub async fn list_books(
    books_repository: Data<Arc<dyn BookRepository>>,
    users_repository: Data<Arc<dyn UsersRepository>>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, Error> {
    let user_id = require_user(users_repository.get_ref().as_ref(), query.user_id).await?;
    let books = books_repository
        .list_books(user_id)
        .await
        .map_err(|err| ApiError::internal("Ocorreu um erro ao buscar os livros.", err))?;
    Ok(HttpResponse::Ok().json(books))
}

#[api_v2_operation]
pub async fn add_book(
    books_repository: Data<Arc<dyn BookRepository>>,
    users_repository: Data<Arc<dyn UsersRepository>>,
    genres_repository: Data<Arc<dyn GenresRepository>>,
    request: web::Json<NewBookRequest>,
) -> Result<HttpResponse, Error> {
    let NewBookRequest {
        user_id,
        mut details,
    } = request.into_inner();
    let user_id = require_user(users_repository.get_ref().as_ref(), user_id).await?;

    details
        .validate()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;
    details.genre = canonical_genre(genres_repository.get_ref().as_ref(), details.genre).await?;

    let book = books_repository
        .add_book(user_id, details)
        .await
        .map_err(|err| ApiError::internal("Erro ao adicionar o livro.", err))?;
    tracing::info!("Book {} added for user {}", book.id, user_id);

    Ok(HttpResponse::Created().json(BookResponse {
        message: "Livro adicionado com sucesso!".to_string(),
        book,
    }))
}

#[api_v2_operation]
pub async fn get_book(
    books_repository: Data<Arc<dyn BookRepository>>,
    book_id: web::Path<BookId>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, Error> {
    let book = owned_book(books_repository.get_ref().as_ref(), &book_id, query.user_id).await?;
    Ok(HttpResponse::Ok().json(book))
}

#[api_v2_operation]
pub async fn update_book(
    books_repository: Data<Arc<dyn BookRepository>>,
    users_repository: Data<Arc<dyn UsersRepository>>,
    genres_repository: Data<Arc<dyn GenresRepository>>,
    book_id: web::Path<BookId>,
    query: web::Query<UserQuery>,
    request: web::Json<UpdateBookRequest>,
) -> Result<HttpResponse, Error> {
    let UpdateBookRequest { user_id, mut patch } = request.into_inner();
    let user_id =
        optional_user(users_repository.get_ref().as_ref(), query.user_id.or(user_id)).await?;
    owned_book(books_repository.get_ref().as_ref(), &book_id, user_id).await?;

    patch
        .validate()
        .map_err(|err| ApiError::BadRequest(err.to_string()))?;
    if let Some(genre) = patch.genre.take() {
        // a blank genre clears it like `null` does
        patch.genre = Some(canonical_genre(genres_repository.get_ref().as_ref(), genre).await?);
    }

    let book = books_repository
        .update_book(&book_id, patch)
        .await
        .map_err(|err| ApiError::internal("Erro ao atualizar o livro.", err))?
        .ok_or_else(|| ApiError::NotFound(BOOK_NOT_FOUND.to_string()))?;

    Ok(HttpResponse::Ok().json(BookResponse {
        message: "Livro atualizado com sucesso!".to_string(),
        book,
    }))
}

#[api_v2_operation]
pub async fn delete_book(
    books_repository: Data<Arc<dyn BookRepository>>,
    users_repository: Data<Arc<dyn UsersRepository>>,
    book_id: web::Path<BookId>,
    query: web::Query<UserQuery>,
) -> Result<HttpResponse, Error> {
    let user_id = optional_user(users_repository.get_ref().as_ref(), query.user_id).await?;
    owned_book(books_repository.get_ref().as_ref(), &book_id, user_id).await?;

    let book = books_repository
        .delete_book(&book_id)
        .await
        .map_err(|err| ApiError::internal("Ocorreu um erro ao remover o livro.", err))?
        .ok_or_else(|| ApiError::NotFound(BOOK_NOT_FOUND.to_string()))?;
    tracing::info!("Book {} removed", book.id);

    Ok(HttpResponse::Ok().json(BookResponse {
        message: "Livro removido com sucesso!".to_string(),
        book,
    }))
}

/// Sets the reading status, asking for the current status again clears it
#[api_v2_operation]
pub async fn update_status(
    books_repository: Data<Arc<dyn BookRepository>>,
    users_repository: Data<Arc<dyn UsersRepository>>,
    book_id: web::Path<BookId>,
    query: web::Query<UserQuery>,
    request: web::Json<StatusUpdate>,
) -> Result<HttpResponse, Error> {
    let user_id = optional_user(users_repository.get_ref().as_ref(), query.user_id).await?;
    let current = owned_book(books_repository.get_ref().as_ref(), &book_id, user_id).await?;
    let status = next_status(current.details.status, request.status);

    let book = books_repository
        .set_status(&book_id, status)
        .await
        .map_err(|err| ApiError::internal("Erro ao atualizar o status do livro.", err))?
        .ok_or_else(|| ApiError::NotFound(BOOK_NOT_FOUND.to_string()))?;

    Ok(HttpResponse::Ok().json(BookResponse {
        message: "Status atualizado com sucesso!".to_string(),
        book,
    }))
}
