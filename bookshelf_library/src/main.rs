use std::sync::Arc;

use actix_web::{App, HttpServer};
use anyhow::Context;
use opentelemetry::global;
use opentelemetry_sdk::propagation::TraceContextPropagator;
use opentelemetry_sdk::runtime::TokioCurrentThread;
use paperclip::actix::{web, OpenApiExt};
use tracing_actix_web::TracingLogger;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Registry};

use bookshelf_library::app_config::{config_app, json_config, query_config};
use bookshelf_library::books_repository::{
    BookRepository, InMemoryBookRepository, PostgresBooksRepository,
};
use bookshelf_library::catalog_search::CatalogSearchClient;
use bookshelf_library::genres_repository::{
    GenresRepository, InMemoryGenresRepository, PostgresGenresRepository,
};
use bookshelf_library::postgres;
use bookshelf_library::seed::{seed_genres, SeedOptions};
use bookshelf_library::settings::Settings;
use bookshelf_library::users_repository::{
    InMemoryUsersRepository, PostgresUsersRepository, UsersRepository,
};

const APP_NAME: &str = "bookshelf";

// Based on https://github.com/LukeMathWalker/tracing-actix-web/blob/main/examples/opentelemetry/src/main.rs#L15
fn init_telemetry(jaeger_enabled: bool) -> anyhow::Result<()> {
    // Spans are exported to Jaeger in batches, only when enabled
    let telemetry = if jaeger_enabled {
        global::set_text_map_propagator(TraceContextPropagator::new());
        #[allow(deprecated)]
        let tracer = opentelemetry_jaeger::new_agent_pipeline()
            .with_service_name(APP_NAME)
            .install_batch(TokioCurrentThread)
            .context("Failed to install OpenTelemetry tracer.")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    // Tunable via `RUST_LOG` env variable
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new(APP_NAME.into(), std::io::stdout);
    let subscriber = Registry::default()
        .with(env_filter)
        .with(telemetry)
        .with(JsonStorageLayer)
        .with(formatting_layer);
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install `tracing` subscriber.")
}

type Repositories = (
    Arc<dyn BookRepository>,
    Arc<dyn GenresRepository>,
    Arc<dyn UsersRepository>,
);

async fn init_repositories(settings: &Settings) -> anyhow::Result<Repositories> {
    if settings.use_in_memory_db {
        tracing::info!("Using in-memory repositories");
        let books_repository: Arc<dyn BookRepository> =
            Arc::new(InMemoryBookRepository::default());
        let genres_repository: Arc<dyn GenresRepository> =
            Arc::new(InMemoryGenresRepository::default());
        let users_repository: Arc<dyn UsersRepository> =
            Arc::new(InMemoryUsersRepository::default());
        return Ok((books_repository, genres_repository, users_repository));
    }

    let client = postgres::connect(&settings.postgres()).await?;
    let books_repository: Arc<dyn BookRepository> =
        Arc::new(PostgresBooksRepository::init(client.clone()).await?);
    let genres_repository: Arc<dyn GenresRepository> =
        Arc::new(PostgresGenresRepository::init(client.clone()).await?);
    let users_repository: Arc<dyn UsersRepository> =
        Arc::new(PostgresUsersRepository::init(client).await?);
    Ok((books_repository, genres_repository, users_repository))
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load()?;
    init_telemetry(settings.jaeger_enabled)?;

    let (books_repository, genres_repository, users_repository) =
        init_repositories(&settings).await?;
    if settings.seed_genres {
        seed_genres(genres_repository.as_ref())
            .await
            .context("Failed to seed genres")?;
    }

    let catalog = web::Data::new(CatalogSearchClient::new(
        &settings.catalog_endpoints(),
        settings.catalog_retries,
    )?);
    let seed_options = SeedOptions {
        starter_books: settings.starter_books,
    };

    tracing::info!("Starting HTTP server at http://0.0.0.0:{}", settings.port);
    HttpServer::new(move || {
        App::new()
            .wrap_api()
            .app_data(web::Data::new(books_repository.clone()))
            .app_data(web::Data::new(genres_repository.clone()))
            .app_data(web::Data::new(users_repository.clone()))
            .app_data(catalog.clone())
            .app_data(web::Data::new(seed_options))
            .app_data(json_config())
            .app_data(query_config())
            .wrap(TracingLogger::default())
            .configure(config_app)
            .with_json_spec_at("/apispec/v2")
            .build()
    })
    .bind(("0.0.0.0", settings.port))?
    .run()
    .await?;

    Ok(())
}
