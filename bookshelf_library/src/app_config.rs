use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::HttpRequest;
use paperclip::actix::web;

use crate::handlers::{self, ApiError};

pub fn config_app(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(handlers::health)))
        .service(
            web::scope("/api")
                .service(
                    web::scope("/auth")
                        .service(
                            web::resource("/register").route(web::post().to(handlers::register)),
                        )
                        .service(web::resource("/login").route(web::post().to(handlers::login))),
                )
                .service(
                    web::scope("/books")
                        .service(
                            web::resource("")
                                .route(web::get().to(handlers::list_books))
                                .route(web::post().to(handlers::add_book)),
                        )
                        .service(
                            web::resource("/{book_id}")
                                .route(web::get().to(handlers::get_book))
                                .route(web::put().to(handlers::update_book))
                                .route(web::delete().to(handlers::delete_book)),
                        )
                        .service(
                            web::resource("/{book_id}/status")
                                .route(web::put().to(handlers::update_status)),
                        ),
                )
                .service(
                    web::scope("/library")
                        .service(web::resource("").route(web::get().to(handlers::get_library)))
                        .service(
                            web::resource("/statuses")
                                .route(web::post().to(handlers::import_statuses)),
                        ),
                )
                .service(
                    web::resource("/dashboard").route(web::get().to(handlers::get_dashboard)),
                )
                .service(
                    web::scope("/categories")
                        .service(
                            web::resource("")
                                .route(web::get().to(handlers::list_genres))
                                .route(web::post().to(handlers::add_genre)),
                        )
                        .service(
                            web::resource("/{genre}")
                                .route(web::delete().to(handlers::delete_genre)),
                        ),
                )
                .service(
                    web::scope("/catalog")
                        .service(
                            web::resource("/search")
                                .route(web::get().to(handlers::search_catalog)),
                        )
                        .service(
                            web::resource("/cover").route(web::get().to(handlers::find_cover)),
                        ),
                ),
        );
}

/// Malformed JSON bodies are answered with the usual `{"message": ...}` body
pub fn json_config() -> actix_web::web::JsonConfig {
    actix_web::web::JsonConfig::default().error_handler(
        |err: JsonPayloadError, _req: &HttpRequest| {
            ApiError::BadRequest(format!("Dados enviados inválidos: {}", err)).into()
        },
    )
}

pub fn query_config() -> actix_web::web::QueryConfig {
    actix_web::web::QueryConfig::default().error_handler(
        |err: QueryPayloadError, _req: &HttpRequest| {
            ApiError::BadRequest(format!("Parâmetros inválidos: {}", err)).into()
        },
    )
}
