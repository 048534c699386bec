use anyhow::Context;
use config::builder::DefaultState;
use config::ConfigBuilder;
use serde::Deserialize;

use crate::catalog_search::CatalogEndpoints;
use crate::postgres::PostgresConfig;

const CONFIG_FILE_ENV: &str = "BOOKSHELF_CONFIG";
const DEFAULT_CONFIG_FILE: &str = "bookshelf.toml";
const ENV_PREFIX: &str = "BOOKSHELF";

/// Server settings, read from an optional toml file and `BOOKSHELF_*` environment variables
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default)]
    pub use_in_memory_db: bool,
    #[serde(default = "Settings::default_db_host")]
    pub db_host: String,
    #[serde(default = "Settings::default_db_credential")]
    pub db_username: String,
    #[serde(default = "Settings::default_db_credential")]
    pub db_password: String,
    #[serde(default = "Settings::default_port")]
    pub port: u16,
    #[serde(default = "Settings::default_catalog_url")]
    pub catalog_url: String,
    #[serde(default = "Settings::default_google_books_url")]
    pub google_books_url: String,
    #[serde(default = "Settings::default_open_library_url")]
    pub open_library_url: String,
    /// Retries of transient failures when calling external catalogs
    #[serde(default = "Settings::default_catalog_retries")]
    pub catalog_retries: u32,
    #[serde(default = "Settings::enabled")]
    pub seed_genres: bool,
    /// New users get a copy of the starter catalog
    #[serde(default = "Settings::enabled")]
    pub starter_books: bool,
    #[serde(default = "Settings::enabled")]
    pub jaeger_enabled: bool,
}

impl Settings {
    fn default_db_host() -> String {
        "127.0.0.1".to_string()
    }

    fn default_db_credential() -> String {
        "postgres".to_string()
    }

    fn default_port() -> u16 {
        8080
    }

    fn default_catalog_url() -> String {
        "https://gutendex.com".to_string()
    }

    fn default_google_books_url() -> String {
        "https://www.googleapis.com".to_string()
    }

    fn default_open_library_url() -> String {
        "https://openlibrary.org".to_string()
    }

    fn default_catalog_retries() -> u32 {
        3
    }

    fn enabled() -> bool {
        true
    }

    pub fn load() -> anyhow::Result<Self> {
        let config_file =
            std::env::var(CONFIG_FILE_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

        Self::from_builder(
            config::Config::builder()
                .add_source(config::File::with_name(&config_file).required(false))
                .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true)),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        builder
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    pub fn catalog_endpoints(&self) -> CatalogEndpoints {
        CatalogEndpoints {
            gutendex: self.catalog_url.clone(),
            google_books: self.google_books_url.clone(),
            open_library: self.open_library_url.clone(),
        }
    }

    pub fn postgres(&self) -> PostgresConfig {
        PostgresConfig {
            hostname: self.db_host.clone(),
            username: self.db_username.clone(),
            password: self.db_password.clone(),
        }
    }
}
