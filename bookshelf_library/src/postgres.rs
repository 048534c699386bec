use std::sync::Arc;

use anyhow::Context;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls};

pub struct PostgresConfig {
    pub hostname: String,
    pub username: String,
    pub password: String,
}

/// Opens the connection shared by every postgres repository
pub async fn connect(config: &PostgresConfig) -> anyhow::Result<Arc<Client>> {
    let connection_str = format!(
        "postgresql://{}:{}@{}",
        config.username, config.password, config.hostname
    );
    tracing::info!(
        "Connecting to postgres at {} as {}",
        config.hostname,
        config.username
    );
    let (client, connection) = tokio_postgres::connect(&connection_str, NoTls)
        .await
        .context("Failed to start postgres")?;

    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::error!("Postgres connection error: {}", e);
        }
    });

    Ok(Arc::new(client))
}

pub(crate) fn is_unique_violation(err: &tokio_postgres::Error) -> bool {
    err.as_db_error()
        .map(|db_err| db_err.code() == &SqlState::UNIQUE_VIOLATION)
        .unwrap_or_default()
}

#[cfg(test)]
pub(crate) mod test_container {
    use std::sync::Arc;

    use testcontainers::core::IntoContainerPort;
    use testcontainers::runners::AsyncRunner;
    use testcontainers::{ContainerAsync, GenericImage, ImageExt};
    use tokio_postgres::Client;

    use super::{connect, PostgresConfig};

    /// Starts a throwaway postgres and connects to it, retrying while it boots
    pub async fn start_postgres_container() -> (ContainerAsync<GenericImage>, Arc<Client>) {
        let pg_container = GenericImage::new("postgres", "latest")
            .with_mapped_port(5432, 5432.tcp())
            .with_env_var("POSTGRES_USER", "postgres")
            .with_env_var("POSTGRES_PASSWORD", "postgres")
            .start()
            .await
            .expect("Failed to start postgres");

        for _ in 0..10 {
            if let Ok(client) = connect(&PostgresConfig {
                hostname: "127.0.0.1".to_string(),
                username: "postgres".to_string(),
                password: "postgres".to_string(),
            })
            .await
            {
                if client.simple_query("SELECT 1").await.is_ok() {
                    return (pg_container, client);
                }
            }
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
        }
        panic!("Failed to setup postgres container")
    }
}
