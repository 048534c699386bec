use paperclip::actix::Apiv2Schema;
use serde::{Deserialize, Deserializer, Serialize};

pub type UserId = i32;
pub type BookId = String;
pub type GenreId = i32;

/// Reading progress a user attaches to a book
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, Apiv2Schema)]
pub enum ReadingStatus {
    #[serde(rename = "lido")]
    Read,
    #[serde(rename = "lendo")]
    Reading,
    #[serde(rename = "quero ler")]
    WantToRead,
}

impl ReadingStatus {
    pub const ALL: [ReadingStatus; 3] = [
        ReadingStatus::Read,
        ReadingStatus::Reading,
        ReadingStatus::WantToRead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReadingStatus::Read => "lido",
            ReadingStatus::Reading => "lendo",
            ReadingStatus::WantToRead => "quero ler",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == value)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Título e autor são obrigatórios.")]
    MissingTitleOrAuthor,
    #[error("A avaliação deve estar entre 1 e 5 (recebido {0}).")]
    RatingOutOfRange(u8),
}

fn check_rating(rating: Option<u8>) -> Result<(), ValidationError> {
    match rating {
        Some(rating) if !(1..=5).contains(&rating) => {
            Err(ValidationError::RatingOutOfRange(rating))
        }
        _ => Ok(()),
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Struct representing details of the book, everything except its identity and owner
pub struct BookDetails {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub cover_url: String,
    #[serde(default)]
    pub genre: Option<String>,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub pages: Option<u32>,
    /// 1 to 5 stars
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub synopsis: Option<String>,
    #[serde(default)]
    pub status: Option<ReadingStatus>,
}

impl BookDetails {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.title.trim().is_empty() || self.author.trim().is_empty() {
            return Err(ValidationError::MissingTitleOrAuthor);
        }
        check_rating(self.rating)
    }
}

/// `null` sent for an optional field is kept as `Some(None)`, so it clears the stored value
fn clearable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Struct representing a patch to book details. Allows to specify only a few fields and patch
/// the current details. Optional fields are `None` when absent and `Some(None)` when cleared
/// with `null`
pub struct BookDetailsPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cover_url: Option<String>,
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub genre: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub year: Option<Option<i32>>,
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub pages: Option<Option<u32>>,
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub rating: Option<Option<u8>>,
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub synopsis: Option<Option<String>>,
    #[serde(
        default,
        deserialize_with = "clearable",
        skip_serializing_if = "Option::is_none"
    )]
    pub status: Option<Option<ReadingStatus>>,
}

impl BookDetailsPatch {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let blank = |value: &Option<String>| value.as_ref().is_some_and(|v| v.trim().is_empty());
        if blank(&self.title) || blank(&self.author) {
            return Err(ValidationError::MissingTitleOrAuthor);
        }
        check_rating(self.rating.flatten())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// A book stored in somebody's library
pub struct Book {
    pub id: BookId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub details: BookDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct NewBookRequest {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(flatten)]
    pub details: BookDetails,
}

#[derive(Debug, Clone, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<UserId>,
    #[serde(flatten)]
    pub patch: BookDetailsPatch,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
/// `null` clears the status, requesting the current status again clears it as well
pub struct StatusUpdate {
    #[serde(default)]
    pub status: Option<ReadingStatus>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct UserQuery {
    #[serde(default)]
    pub user_id: Option<UserId>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct BookResponse {
    pub message: String,
    pub book: Book,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// User as exposed to clients, never carries the password
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    /// Unix timestamp in seconds
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct AuthResponse {
    pub message: String,
    pub user: User,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
pub struct NewGenreRequest {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct DeletedGenreResponse {
    pub message: String,
    pub genre: Genre,
    /// Books that referenced the genre and had it removed
    pub detached_books: u64,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    #[default]
    Title,
    Author,
    Year,
    Pages,
    Rating,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
/// Query string of the library view
pub struct LibraryViewParams {
    #[serde(default)]
    pub user_id: Option<UserId>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    /// One of the reading statuses or "sem status"
    #[serde(default)]
    pub status: Option<String>,
    /// Minimal rating, non numeric values are ignored
    #[serde(default)]
    pub rating: Option<String>,
    #[serde(default)]
    pub sort: Option<SortField>,
    #[serde(default)]
    pub direction: Option<SortDirection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct StatusCounts {
    pub total: usize,
    pub lido: usize,
    pub lendo: usize,
    pub quero_ler: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct LibraryViewResponse {
    pub books: Vec<Book>,
    pub counts: StatusCounts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
/// Status map as kept by older clients in local storage, still serialized
pub struct LegacyStatusImport {
    #[serde(default)]
    pub statuses: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
pub struct StatusImportResponse {
    pub message: String,
    pub imported: usize,
    pub discarded: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
pub struct GenreSlice {
    pub name: String,
    pub value: usize,
    pub color: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Apiv2Schema)]
pub struct RatingBucket {
    pub rating: u8,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Apiv2Schema)]
pub struct YearSummary {
    pub year: i32,
    pub books: usize,
    pub pages: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_books: usize,
    pub total_pages: u64,
    pub average_rating: f64,
    pub genre_distribution: Vec<GenreSlice>,
    pub most_read_genre: Option<String>,
    pub rating_distribution: Vec<RatingBucket>,
    pub yearly_data: Vec<YearSummary>,
    pub reading_time_hours: u64,
}

/// External catalog a search runs against
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// Project Gutenberg, international public domain books
    #[default]
    Gutenberg,
    /// Curated books in Portuguese
    BaixeLivros,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
pub struct CatalogSearchParams {
    #[serde(default)]
    pub q: String,
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub source: Option<CatalogSource>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Apiv2Schema)]
pub struct CoverQuery {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
#[serde(rename_all = "camelCase")]
pub struct CoverResponse {
    pub cover_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Apiv2Schema)]
/// Drafts pre-filled from the external catalog, ready to be sent to `POST /api/books`
pub struct CatalogSearchResponse {
    pub books: Vec<BookDetails>,
}

#[cfg(test)]
mod api_tests {
    use super::*;

    #[test]
    fn reading_status_uses_portuguese_labels_on_the_wire() {
        assert_eq!(
            serde_json::to_string(&ReadingStatus::WantToRead).unwrap(),
            "\"quero ler\""
        );
        assert_eq!(ReadingStatus::parse("lendo"), Some(ReadingStatus::Reading));
        assert_eq!(ReadingStatus::parse("Lendo"), None);
    }

    #[test]
    fn catalog_source_names_are_lowercase() {
        assert_eq!(
            serde_json::to_string(&CatalogSource::BaixeLivros).unwrap(),
            "\"baixelivros\""
        );
        assert_eq!(CatalogSource::default(), CatalogSource::Gutenberg);
    }

    #[test]
    fn book_is_flat_camel_case_json() {
        let book = Book {
            id: "1_1".to_string(),
            user_id: 1,
            details: BookDetails {
                title: "Dom Casmurro".to_string(),
                author: "Machado de Assis".to_string(),
                cover_url: "http://covers/1.jpg".to_string(),
                ..BookDetails::default()
            },
        };
        let value = serde_json::to_value(&book).unwrap();
        assert_eq!(value["userId"], 1);
        assert_eq!(value["coverUrl"], "http://covers/1.jpg");
        assert_eq!(value["title"], "Dom Casmurro");

        let parsed: Book = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, book);
    }

    #[test]
    fn validation_requires_title_author_and_rating_in_range() {
        let mut details = BookDetails {
            title: "Iracema".to_string(),
            author: "  ".to_string(),
            ..BookDetails::default()
        };
        assert_eq!(
            details.validate(),
            Err(ValidationError::MissingTitleOrAuthor)
        );

        details.author = "José de Alencar".to_string();
        details.rating = Some(6);
        assert_eq!(details.validate(), Err(ValidationError::RatingOutOfRange(6)));

        details.rating = Some(5);
        assert_eq!(details.validate(), Ok(()));

        let patch = BookDetailsPatch {
            rating: Some(Some(0)),
            ..BookDetailsPatch::default()
        };
        assert_eq!(patch.validate(), Err(ValidationError::RatingOutOfRange(0)));
        assert_eq!(BookDetailsPatch::default().validate(), Ok(()));
    }

    #[test]
    fn patch_tells_cleared_fields_from_absent_ones() {
        let patch: BookDetailsPatch =
            serde_json::from_str(r#"{"rating": null, "year": 1900, "title": "Helena"}"#).unwrap();
        assert_eq!(patch.rating, Some(None));
        assert_eq!(patch.year, Some(Some(1900)));
        assert_eq!(patch.pages, None);
        assert_eq!(patch.validate(), Ok(()));

        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"title": "Helena", "year": 1900, "rating": null})
        );
    }
}
