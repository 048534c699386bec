use anyhow::{anyhow, bail, Context};
use reqwest::StatusCode;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use serde::de::DeserializeOwned;

use crate::api::{
    AuthResponse, Book, BookDetails, BookDetailsPatch, BookResponse, CatalogSearchParams,
    CatalogSearchResponse, CatalogSource, CoverQuery, CoverResponse, DashboardStats,
    DeletedGenreResponse, Genre, LegacyStatusImport, LibraryViewParams, LibraryViewResponse,
    LoginRequest, MessageResponse, NewBookRequest, NewGenreRequest, ReadingStatus,
    RegisterRequest, StatusImportResponse, StatusUpdate, UpdateBookRequest, User, UserId,
    UserQuery,
};

pub struct BookShelfClient {
    url: String,
    client: ClientWithMiddleware,
}

async fn error_message(response: reqwest::Response) -> String {
    let status = response.status();
    response
        .json::<MessageResponse>()
        .await
        .map(|body| body.message)
        .unwrap_or_else(|_| status.to_string())
}

/// Parses a successful response, 404 becomes None
async fn optional<T: DeserializeOwned>(
    response: reqwest::Response,
    action: &str,
) -> anyhow::Result<Option<T>> {
    if response.status() == StatusCode::NOT_FOUND {
        Ok(None)
    } else if response.status().is_success() {
        Ok(Some(response.json().await?))
    } else {
        bail!("Failed to {} {}", action, error_message(response).await)
    }
}

async fn required<T: DeserializeOwned>(
    response: reqwest::Response,
    action: &str,
) -> anyhow::Result<T> {
    if !response.status().is_success() {
        bail!("Failed to {} {}", action, error_message(response).await)
    }
    Ok(response.json().await?)
}

impl BookShelfClient {
    pub fn new(url: &str) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let client = ClientBuilder::new(reqwest_client)
            // Insert the tracing middleware
            .with(TracingMiddleware::default())
            .build();

        Ok(Self {
            url: url.to_string(),
            client,
        })
    }

    /// Calls GET /health endpoint
    pub async fn health(&self) -> anyhow::Result<bool> {
        let response = self
            .client
            .get(format!("{}/health", self.url))
            .send()
            .await?;
        Ok(response.status().is_success())
    }

    /// Calls POST /api/auth/register endpoint
    pub async fn register(&self, request: &RegisterRequest) -> anyhow::Result<User> {
        let response = self
            .client
            .post(format!("{}/api/auth/register", self.url))
            .json(request)
            .send()
            .await?;
        let body: AuthResponse = required(response, "register").await?;
        Ok(body.user)
    }

    /// Calls POST /api/auth/login endpoint
    /// Returns None when the credentials were rejected
    pub async fn login(&self, request: &LoginRequest) -> anyhow::Result<Option<User>> {
        let response = self
            .client
            .post(format!("{}/api/auth/login", self.url))
            .json(request)
            .send()
            .await?;
        if response.status() == StatusCode::UNAUTHORIZED {
            return Ok(None);
        }
        let body: AuthResponse = required(response, "login").await?;
        Ok(Some(body.user))
    }

    /// Calls GET /api/books endpoint
    pub async fn list_books(&self, user_id: UserId) -> anyhow::Result<Vec<Book>> {
        let response = self
            .client
            .get(format!("{}/api/books", self.url))
            .query(&UserQuery {
                user_id: Some(user_id),
            })
            .send()
            .await?;
        required(response, "list books").await
    }

    /// Calls POST /api/books endpoint
    /// Returns the stored book with its assigned id
    pub async fn add_book(&self, user_id: UserId, details: BookDetails) -> anyhow::Result<Book> {
        let response = self
            .client
            .post(format!("{}/api/books", self.url))
            .json(&NewBookRequest {
                user_id: Some(user_id),
                details,
            })
            .send()
            .await?;
        let body: BookResponse = required(response, "add book").await?;
        Ok(body.book)
    }

    /// Calls GET /api/books/{book_id} endpoint
    /// None if the book does not exist or belongs to another user
    pub async fn get_book(&self, book_id: &str, user_id: UserId) -> anyhow::Result<Option<Book>> {
        let response = self
            .client
            .get(format!("{}/api/books/{}", self.url, book_id))
            .query(&UserQuery {
                user_id: Some(user_id),
            })
            .send()
            .await?;
        optional(response, "get book").await
    }

    /// Calls PUT /api/books/{book_id} endpoint
    pub async fn update_book(
        &self,
        book_id: &str,
        user_id: UserId,
        patch: BookDetailsPatch,
    ) -> anyhow::Result<Option<Book>> {
        let response = self
            .client
            .put(format!("{}/api/books/{}", self.url, book_id))
            .json(&UpdateBookRequest {
                user_id: Some(user_id),
                patch,
            })
            .send()
            .await?;
        let body: Option<BookResponse> = optional(response, "update book").await?;
        Ok(body.map(|body| body.book))
    }

    /// Calls DELETE /api/books/{book_id} endpoint
    /// Returns the removed book, None if there was nothing to remove
    pub async fn delete_book(
        &self,
        book_id: &str,
        user_id: UserId,
    ) -> anyhow::Result<Option<Book>> {
        let response = self
            .client
            .delete(format!("{}/api/books/{}", self.url, book_id))
            .query(&UserQuery {
                user_id: Some(user_id),
            })
            .send()
            .await?;
        let body: Option<BookResponse> = optional(response, "delete book").await?;
        Ok(body.map(|body| body.book))
    }

    /// Calls PUT /api/books/{book_id}/status endpoint
    /// Sending the status the book already has clears it
    pub async fn set_status(
        &self,
        book_id: &str,
        user_id: UserId,
        status: Option<ReadingStatus>,
    ) -> anyhow::Result<Option<Book>> {
        let response = self
            .client
            .put(format!("{}/api/books/{}/status", self.url, book_id))
            .query(&UserQuery {
                user_id: Some(user_id),
            })
            .json(&StatusUpdate { status })
            .send()
            .await?;
        let body: Option<BookResponse> = optional(response, "set status").await?;
        Ok(body.map(|body| body.book))
    }

    /// Calls GET /api/library endpoint
    pub async fn library(
        &self,
        params: &LibraryViewParams,
    ) -> anyhow::Result<LibraryViewResponse> {
        let response = self
            .client
            .get(format!("{}/api/library", self.url))
            .query(params)
            .send()
            .await?;
        required(response, "get library").await
    }

    /// Calls POST /api/library/statuses endpoint with a serialized status map
    pub async fn import_statuses(
        &self,
        user_id: UserId,
        statuses: &str,
    ) -> anyhow::Result<StatusImportResponse> {
        let response = self
            .client
            .post(format!("{}/api/library/statuses", self.url))
            .query(&UserQuery {
                user_id: Some(user_id),
            })
            .json(&LegacyStatusImport {
                statuses: statuses.to_string(),
            })
            .send()
            .await?;
        required(response, "import statuses").await
    }

    /// Calls GET /api/dashboard endpoint
    pub async fn dashboard(&self, user_id: UserId) -> anyhow::Result<DashboardStats> {
        let response = self
            .client
            .get(format!("{}/api/dashboard", self.url))
            .query(&UserQuery {
                user_id: Some(user_id),
            })
            .send()
            .await?;
        required(response, "get dashboard").await
    }

    /// Calls GET /api/categories endpoint
    pub async fn list_genres(&self) -> anyhow::Result<Vec<Genre>> {
        let response = self
            .client
            .get(format!("{}/api/categories", self.url))
            .send()
            .await?;
        required(response, "list genres").await
    }

    /// Calls POST /api/categories endpoint
    pub async fn add_genre(&self, name: &str) -> anyhow::Result<Genre> {
        let response = self
            .client
            .post(format!("{}/api/categories", self.url))
            .json(&NewGenreRequest {
                name: name.to_string(),
            })
            .send()
            .await?;
        required(response, "add genre").await
    }

    /// Url of `/api/categories/{name}`, the name is percent-encoded as a single segment
    fn genre_url(&self, name: &str) -> anyhow::Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.url).context("Invalid service url")?;
        url.path_segments_mut()
            .map_err(|_| anyhow!("Service url {} cannot have a path", self.url))?
            .pop_if_empty()
            .extend(["api", "categories"])
            .push(name);
        Ok(url)
    }

    /// Calls DELETE /api/categories/{genre} endpoint
    pub async fn delete_genre(&self, name: &str) -> anyhow::Result<Option<DeletedGenreResponse>> {
        let response = self.client.delete(self.genre_url(name)?).send().await?;
        optional(response, "delete genre").await
    }

    /// Calls GET /api/catalog/search endpoint
    pub async fn search_catalog(
        &self,
        source: CatalogSource,
        term: &str,
        limit: Option<u32>,
    ) -> anyhow::Result<Vec<BookDetails>> {
        let response = self
            .client
            .get(format!("{}/api/catalog/search", self.url))
            .query(&CatalogSearchParams {
                q: term.to_string(),
                limit,
                source: Some(source),
            })
            .send()
            .await?;
        let body: CatalogSearchResponse = required(response, "search catalog").await?;
        Ok(body.books)
    }

    /// Calls GET /api/catalog/cover endpoint
    pub async fn find_cover(&self, title: &str, author: &str) -> anyhow::Result<String> {
        let response = self
            .client
            .get(format!("{}/api/catalog/cover", self.url))
            .query(&CoverQuery {
                title: title.to_string(),
                author: author.to_string(),
            })
            .send()
            .await?;
        let body: CoverResponse = required(response, "find cover").await?;
        Ok(body.cover_url)
    }
}
