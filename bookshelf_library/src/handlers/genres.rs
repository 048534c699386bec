use std::sync::Arc;

use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use paperclip::actix::{api_v2_operation, web};

use crate::api::{DeletedGenreResponse, NewGenreRequest};
use crate::books_repository::BookRepository;
use crate::genres_repository::{GenresRepository, GenresRepositoryError};
use crate::handlers::ApiError;

#[api_v2_operation]
pub async fn list_genres(
    genres_repository: Data<Arc<dyn GenresRepository>>,
) -> Result<HttpResponse, Error> {
    let genres = genres_repository
        .list_genres()
        .await
        .map_err(|err| ApiError::internal("Ocorreu um erro ao buscar os gêneros.", err))?;
    Ok(HttpResponse::Ok().json(genres))
}

#[api_v2_operation]
pub async fn add_genre(
    genres_repository: Data<Arc<dyn GenresRepository>>,
    request: web::Json<NewGenreRequest>,
) -> Result<HttpResponse, Error> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(ApiError::BadRequest("Nome do gênero é obrigatório.".to_string()).into());
    }

    match genres_repository.add_genre(name).await {
        Ok(genre) => Ok(HttpResponse::Created().json(genre)),
        Err(GenresRepositoryError::AlreadyExists(_)) => {
            Err(ApiError::Conflict("Gênero já existe.".to_string()).into())
        }
        Err(err) => Err(ApiError::internal("Erro ao adicionar o gênero.", err).into()),
    }
}

/// Removes the genre and detaches it from every book that used it
#[api_v2_operation]
pub async fn delete_genre(
    genres_repository: Data<Arc<dyn GenresRepository>>,
    books_repository: Data<Arc<dyn BookRepository>>,
    genre: web::Path<String>,
) -> Result<HttpResponse, Error> {
    const DELETE_FAILED: &str = "Ocorreu um erro ao remover o gênero.";

    let genre = genres_repository
        .delete_genre(&genre)
        .await
        .map_err(|err| ApiError::internal(DELETE_FAILED, err))?
        .ok_or_else(|| ApiError::NotFound("Gênero não encontrado.".to_string()))?;

    let detached_books = books_repository
        .clear_genre(&genre.name)
        .await
        .map_err(|err| ApiError::internal(DELETE_FAILED, err))?;
    tracing::info!(
        "Genre {} removed, detached from {} books",
        genre.name,
        detached_books
    );

    Ok(HttpResponse::Ok().json(DeletedGenreResponse {
        message: "Gênero removido com sucesso!".to_string(),
        genre,
        detached_books,
    }))
}
