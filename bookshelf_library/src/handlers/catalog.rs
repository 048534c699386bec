use actix_web::web::Data;
use actix_web::{Error, HttpResponse};
use paperclip::actix::{api_v2_operation, web};

use crate::api::{CatalogSearchParams, CatalogSearchResponse, CoverQuery, CoverResponse};
use crate::catalog_search::{CatalogSearchClient, DEFAULT_PAGE_SIZE};
use crate::handlers::ApiError;

#[api_v2_operation]
pub async fn search_catalog(
    catalog: Data<CatalogSearchClient>,
    params: web::Query<CatalogSearchParams>,
) -> Result<HttpResponse, Error> {
    let term = params.q.trim();
    if term.is_empty() {
        return Err(ApiError::BadRequest("Termo de busca é obrigatório.".to_string()).into());
    }

    let books = catalog
        .search(
            params.source.unwrap_or_default(),
            term,
            params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
        )
        .await
        .map_err(|err| {
            ApiError::internal("Erro ao buscar livros no catálogo.", format!("{:#}", err))
        })?;

    Ok(HttpResponse::Ok().json(CatalogSearchResponse { books }))
}

/// Best cover found for the book, falls back to a generated placeholder
#[api_v2_operation]
pub async fn find_cover(
    catalog: Data<CatalogSearchClient>,
    query: web::Query<CoverQuery>,
) -> Result<HttpResponse, Error> {
    let title = query.title.trim();
    if title.is_empty() {
        return Err(ApiError::BadRequest("Título é obrigatório.".to_string()).into());
    }

    let cover_url = catalog.covers().find_cover(title, query.author.trim()).await;
    Ok(HttpResponse::Ok().json(CoverResponse { cover_url }))
}
