//! Lookup of books in external catalogs, turned into book drafts: public domain books in a
//! Gutendex compatible catalog or the curated Portuguese list.

use std::collections::HashMap;

use anyhow::Context;
use futures_util::future::join_all;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::policies::ExponentialBackoff;
use reqwest_retry::RetryTransientMiddleware;
use reqwest_tracing::TracingMiddleware;
use serde::Deserialize;

use crate::api::{BookDetails, CatalogSource};
use crate::brazilian_catalog;
use crate::cover_lookup::CoverLookup;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 32;

const UNKNOWN_AUTHOR: &str = "Autor Desconhecido";
const FALLBACK_GENRE: &str = "Ficção";
const FALLBACK_SYNOPSIS: &str =
    "Um clássico da literatura mundial disponível gratuitamente no Project Gutenberg.";
const EARLIEST_YEAR: i32 = 1800;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GutendexPage {
    #[serde(default)]
    pub results: Vec<GutendexBook>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GutendexAuthor {
    pub name: String,
    #[serde(default)]
    pub birth_year: Option<i32>,
    #[serde(default)]
    pub death_year: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GutendexBook {
    pub title: String,
    #[serde(default)]
    pub authors: Vec<GutendexAuthor>,
    #[serde(default)]
    pub subjects: Vec<String>,
    #[serde(default)]
    pub bookshelves: Vec<String>,
    #[serde(default)]
    pub formats: HashMap<String, String>,
}

fn non_blank(value: &str) -> Option<&str> {
    Some(value).filter(|value| !value.trim().is_empty())
}

/// Publication year is not part of the catalog, it is guessed from the author's life
fn estimated_year(author: Option<&GutendexAuthor>) -> Option<i32> {
    let author = author?;
    if let Some(death_year) = author.death_year {
        Some((death_year - 50).max(EARLIEST_YEAR))
    } else {
        author
            .birth_year
            .map(|birth_year| (birth_year + 30).max(EARLIEST_YEAR))
    }
}

impl GutendexBook {
    pub fn to_draft(&self) -> BookDetails {
        let first_author = self.authors.first();
        let author = first_author
            .and_then(|author| non_blank(&author.name))
            .unwrap_or(UNKNOWN_AUTHOR);

        let genre = self
            .subjects
            .first()
            .and_then(|subject| subject.split(" -- ").next())
            .and_then(non_blank)
            .or_else(|| self.bookshelves.first().and_then(|shelf| non_blank(shelf)))
            .unwrap_or(FALLBACK_GENRE);

        let synopsis = if self.subjects.is_empty() {
            FALLBACK_SYNOPSIS.to_string()
        } else {
            let topics: Vec<&str> = self.subjects.iter().take(3).map(String::as_str).collect();
            format!("Um livro clássico sobre {}.", topics.join(", ").to_lowercase())
        };

        BookDetails {
            title: self.title.clone(),
            author: author.to_string(),
            cover_url: self.formats.get("image/jpeg").cloned().unwrap_or_default(),
            genre: Some(genre.to_string()),
            year: estimated_year(first_author),
            pages: None,
            rating: None,
            synopsis: Some(synopsis),
            status: None,
        }
    }
}

/// Base urls of the external services books and covers are looked up in
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEndpoints {
    pub gutendex: String,
    pub google_books: String,
    pub open_library: String,
}

pub struct CatalogSearchClient {
    url: String,
    client: ClientWithMiddleware,
    covers: CoverLookup,
}

impl CatalogSearchClient {
    /// Transient failures are retried up to `max_retries` times with exponential backoff
    pub fn new(endpoints: &CatalogEndpoints, max_retries: u32) -> anyhow::Result<Self> {
        let reqwest_client = reqwest::Client::builder()
            .build()
            .context("Failed to build reqwest client")?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(max_retries);
        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        let covers = CoverLookup::new(
            client.clone(),
            &endpoints.google_books,
            &endpoints.open_library,
        );

        Ok(Self {
            url: endpoints.gutendex.trim_end_matches('/').to_string(),
            client,
            covers,
        })
    }

    pub fn covers(&self) -> &CoverLookup {
        &self.covers
    }

    /// Searches the chosen source and fills in a cover for every draft
    pub async fn search(
        &self,
        source: CatalogSource,
        term: &str,
        page_size: u32,
    ) -> anyhow::Result<Vec<BookDetails>> {
        let page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        let drafts = match source {
            CatalogSource::Gutenberg => self.search_gutendex(term, page_size).await?,
            CatalogSource::BaixeLivros => brazilian_catalog::search(term)
                .into_iter()
                .take(page_size as usize)
                .collect(),
        };

        Ok(join_all(drafts.into_iter().map(|draft| self.with_cover(draft))).await)
    }

    /// The image the catalog itself offers is kept only when no better cover is found
    async fn with_cover(&self, mut draft: BookDetails) -> BookDetails {
        let own_image = Some(std::mem::take(&mut draft.cover_url)).filter(|url| !url.is_empty());
        draft.cover_url = self
            .covers
            .find_cover_or(&draft.title, &draft.author, own_image)
            .await;
        draft
    }

    /// Calls GET {catalog}/books?search=&page_size= and converts every result into a draft
    async fn search_gutendex(
        &self,
        term: &str,
        page_size: u32,
    ) -> anyhow::Result<Vec<BookDetails>> {
        let response = self
            .client
            .get(format!("{}/books", self.url))
            .query(&[
                ("search", term.to_string()),
                ("page_size", page_size.to_string()),
            ])
            .send()
            .await
            .context("Failed to query catalog")?
            .error_for_status()
            .context("Catalog returned an error")?;

        let page: GutendexPage = response
            .json()
            .await
            .context("Failed to parse catalog response")?;
        tracing::debug!("Catalog returned {} books for {:?}", page.results.len(), term);

        Ok(page.results.iter().map(GutendexBook::to_draft).collect())
    }
}
