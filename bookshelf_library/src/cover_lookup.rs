//! Cover images for catalog drafts: a table of well known editions, then Google Books, then
//! Open Library, and a generated placeholder when nothing matched.

use anyhow::Context;
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use unicode_normalization::UnicodeNormalization;

const GOOGLE_BOOKS_MAX_RESULTS: u32 = 10;
const OPEN_LIBRARY_LIMIT: u32 = 5;
const OPEN_LIBRARY_COVERS_URL: &str = "https://covers.openlibrary.org/b/id";
const PLACEHOLDER_URL: &str = "https://placehold.co/300x450";
const PLACEHOLDER_TITLE_CHARS: usize = 20;
const CLASSIC_COLOR: &str = "1F4A8C";
const DEFAULT_COLOR: &str = "28A745";
const BRAZILIAN_CLASSICS: [&str; 4] =
    ["dom casmurro", "o cortiço", "iracema", "memórias póstumas"];
/// Share of title words a candidate has to contain
const TITLE_MATCH_RATIO: f64 = 0.7;
/// Shorter words are too common to tell books apart
const MIN_WORD_LEN: usize = 3;

/// (title, author, cover)
const KNOWN_COVERS: [(&str, &str, &str); 12] = [
    (
        "dom casmurro",
        "machado de assis",
        "https://m.media-amazon.com/images/I/61TY7tNhbkL._AC_UF1000,1000_QL80_.jpg",
    ),
    (
        "o cortiço",
        "aluísio azevedo",
        "https://m.media-amazon.com/images/I/71dB7Xe8T7L._AC_UF1000,1000_QL80_.jpg",
    ),
    (
        "iracema",
        "josé de alencar",
        "https://m.media-amazon.com/images/I/71BHF3rGfEL._AC_UF1000,1000_QL80_.jpg",
    ),
    (
        "memórias póstumas de brás cubas",
        "machado de assis",
        "https://m.media-amazon.com/images/I/81QYd7r3nDL._AC_UF1000,1000_QL80_.jpg",
    ),
    (
        "o guarani",
        "josé de alencar",
        "https://m.media-amazon.com/images/I/71+uKK6YQYL._AC_UF1000,1000_QL80_.jpg",
    ),
    (
        "a moreninha",
        "joaquim manuel de macedo",
        "https://m.media-amazon.com/images/I/81pqNgNfMBL._AC_UF1000,1000_QL80_.jpg",
    ),
    (
        "auto da barca do inferno",
        "gil vicente",
        "https://m.media-amazon.com/images/I/71qOA4j4pBL._AC_UF1000,1000_QL80_.jpg",
    ),
    (
        "o pequeno príncipe",
        "antoine de saint-exupéry",
        "https://m.media-amazon.com/images/I/51R5QlwHL-L._AC_UF1000,1000_QL80_.jpg",
    ),
    (
        "o menino maluquinho",
        "ziraldo",
        "https://m.media-amazon.com/images/I/71T6wJ5OPNL._AC_UF1000,1000_QL80_.jpg",
    ),
    (
        "as leis",
        "platão",
        "https://m.media-amazon.com/images/I/61DjGgkrKsL._AC_UF1000,1000_QL80_.jpg",
    ),
    (
        "a política",
        "aristóteles",
        "https://m.media-amazon.com/images/I/71jKzAYvJKL._AC_UF1000,1000_QL80_.jpg",
    ),
    (
        "o discurso do método",
        "rené descartes",
        "https://m.media-amazon.com/images/I/71M9YVbG5HL._AC_UF1000,1000_QL80_.jpg",
    ),
];

#[derive(Debug, Default, Deserialize)]
struct GoogleBooksResponse {
    #[serde(default)]
    items: Vec<GoogleBookItem>,
}

#[derive(Debug, Default, Deserialize)]
struct GoogleBookItem {
    #[serde(rename = "volumeInfo", default)]
    volume_info: GoogleVolumeInfo,
}

#[derive(Debug, Default, Deserialize)]
struct GoogleVolumeInfo {
    title: Option<String>,
    #[serde(default)]
    authors: Vec<String>,
    #[serde(rename = "imageLinks")]
    image_links: Option<GoogleImageLinks>,
}

#[derive(Debug, Default, Deserialize)]
struct GoogleImageLinks {
    thumbnail: Option<String>,
    medium: Option<String>,
    large: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenLibrarySearch {
    #[serde(default)]
    docs: Vec<OpenLibraryDoc>,
}

#[derive(Debug, Default, Deserialize)]
struct OpenLibraryDoc {
    cover_i: Option<i64>,
    title: Option<String>,
    #[serde(default)]
    author_name: Vec<String>,
}

/// Lower case words with accents dropped, punctuation turned into single spaces
pub fn normalize_text(text: &str) -> String {
    let stripped: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{300}'..='\u{36f}').contains(c))
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { ' ' })
        .collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Title and author of the book being looked up, normalized once
struct Wanted {
    title: String,
    author: String,
}

impl Wanted {
    fn new(title: &str, author: &str) -> Self {
        Self {
            title: normalize_text(title),
            author: normalize_text(author),
        }
    }

    fn known_cover(&self) -> Option<&'static str> {
        if self.title.is_empty() || self.author.is_empty() {
            return None;
        }
        let overlaps = |a: &str, b: &str| a.contains(b) || b.contains(a);
        KNOWN_COVERS
            .iter()
            .find(|(title, author, _)| {
                overlaps(&self.title, &normalize_text(title))
                    && overlaps(&self.author, &normalize_text(author))
            })
            .map(|(_, _, cover)| *cover)
    }

    /// Most title words and at least one author word appear in the candidate
    fn is_good_match(&self, title: &str, authors: &[String]) -> bool {
        let candidate_title = normalize_text(title);
        let significant = |word: &&str| word.chars().count() >= MIN_WORD_LEN;

        let title_words: Vec<&str> = self.title.split(' ').collect();
        let title_matches = title_words
            .iter()
            .copied()
            .filter(significant)
            .filter(|word| candidate_title.contains(*word))
            .count();
        let title_ratio = title_matches as f64 / title_words.len() as f64;

        let author_match = authors.iter().any(|author| {
            let candidate_author = normalize_text(author);
            self.author
                .split(' ')
                .filter(significant)
                .any(|word| candidate_author.contains(word))
        });

        title_ratio >= TITLE_MATCH_RATIO && author_match
    }

    fn pick_google_cover(&self, response: &GoogleBooksResponse) -> Option<String> {
        response.items.iter().find_map(|item| {
            let info = &item.volume_info;
            let links = info.image_links.as_ref()?;
            let thumbnail = links.thumbnail.as_ref()?;
            let title = info.title.as_ref()?;
            if info.authors.is_empty() || !self.is_good_match(title, &info.authors) {
                return None;
            }
            let best = links.medium.as_ref().or(links.large.as_ref()).unwrap_or(thumbnail);
            Some(best.replacen("http:", "https:", 1))
        })
    }

    fn pick_open_library_cover(&self, response: &OpenLibrarySearch) -> Option<String> {
        response.docs.iter().find_map(|doc| {
            let cover_id = doc.cover_i?;
            let title = doc.title.as_ref()?;
            if doc.author_name.is_empty() || !self.is_good_match(title, &doc.author_name) {
                return None;
            }
            Some(format!("{}/{}-L.jpg", OPEN_LIBRARY_COVERS_URL, cover_id))
        })
    }
}

/// Generated cover showing the start of the title, classics get their own color
pub fn placeholder_cover(title: &str) -> String {
    let lower_title = title.to_lowercase();
    let color = if BRAZILIAN_CLASSICS
        .iter()
        .any(|classic| lower_title.contains(classic))
    {
        CLASSIC_COLOR
    } else {
        DEFAULT_COLOR
    };
    let display_title: String = title.chars().take(PLACEHOLDER_TITLE_CHARS).collect();
    format!(
        "{}/{}/FFFFFF/png?text={}",
        PLACEHOLDER_URL,
        color,
        urlencoding::encode(&display_title)
    )
}

#[derive(Clone)]
pub struct CoverLookup {
    client: ClientWithMiddleware,
    google_books_url: String,
    open_library_url: String,
}

impl CoverLookup {
    pub fn new(
        client: ClientWithMiddleware,
        google_books_url: &str,
        open_library_url: &str,
    ) -> Self {
        Self {
            client,
            google_books_url: google_books_url.trim_end_matches('/').to_string(),
            open_library_url: open_library_url.trim_end_matches('/').to_string(),
        }
    }

    /// Never fails, lookups that error out are logged and skipped
    pub async fn find_cover(&self, title: &str, author: &str) -> String {
        self.find_cover_or(title, author, None).await
    }

    /// Like [`CoverLookup::find_cover`], `fallback` is used before the placeholder
    pub async fn find_cover_or(
        &self,
        title: &str,
        author: &str,
        fallback: Option<String>,
    ) -> String {
        let wanted = Wanted::new(title, author);
        if let Some(cover) = wanted.known_cover() {
            return cover.to_string();
        }

        match self.google_books_cover(&wanted, title, author).await {
            Ok(Some(cover)) => return cover,
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("Google Books cover lookup for {:?} failed: {:#}", title, err)
            }
        }
        match self.open_library_cover(&wanted, title, author).await {
            Ok(Some(cover)) => return cover,
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("Open Library cover lookup for {:?} failed: {:#}", title, err)
            }
        }

        fallback.unwrap_or_else(|| placeholder_cover(title))
    }

    /// Calls GET {google}/books/v1/volumes?q="title" "author"
    async fn google_books_cover(
        &self,
        wanted: &Wanted,
        title: &str,
        author: &str,
    ) -> anyhow::Result<Option<String>> {
        let response: GoogleBooksResponse = self
            .client
            .get(format!("{}/books/v1/volumes", self.google_books_url))
            .query(&[
                ("q", format!("\"{}\" \"{}\"", title, author)),
                ("maxResults", GOOGLE_BOOKS_MAX_RESULTS.to_string()),
            ])
            .send()
            .await
            .context("Failed to query Google Books")?
            .error_for_status()
            .context("Google Books returned an error")?
            .json()
            .await
            .context("Failed to parse Google Books response")?;
        Ok(wanted.pick_google_cover(&response))
    }

    /// Calls GET {open library}/search.json?title=&author=
    async fn open_library_cover(
        &self,
        wanted: &Wanted,
        title: &str,
        author: &str,
    ) -> anyhow::Result<Option<String>> {
        let response: OpenLibrarySearch = self
            .client
            .get(format!("{}/search.json", self.open_library_url))
            .query(&[
                ("title", title.to_string()),
                ("author", author.to_string()),
                ("limit", OPEN_LIBRARY_LIMIT.to_string()),
            ])
            .send()
            .await
            .context("Failed to query Open Library")?
            .error_for_status()
            .context("Open Library returned an error")?
            .json()
            .await
            .context("Failed to parse Open Library response")?;
        Ok(wanted.pick_open_library_cover(&response))
    }
}

#[cfg(test)]
mod cover_lookup_tests {
    use super::*;

    #[test]
    fn text_is_normalized_without_accents_and_punctuation() {
        assert_eq!(
            normalize_text("  Memórias Póstumas de Brás Cubas! "),
            "memorias postumas de bras cubas"
        );
        assert_eq!(normalize_text("Saint-Exupéry, Antoine"), "saint exupery antoine");
        assert_eq!(normalize_text("O Cortiço"), "o cortico");
        assert_eq!(normalize_text("?!"), "");
    }

    #[test]
    fn known_editions_are_found_regardless_of_accents() {
        assert_eq!(
            Wanted::new("O Cortiço", "Aluísio Azevedo").known_cover(),
            Some(KNOWN_COVERS[1].2)
        );
        assert_eq!(
            Wanted::new("Dom Casmurro (edição comentada)", "Machado de Assis").known_cover(),
            Some(KNOWN_COVERS[0].2)
        );
        assert_eq!(Wanted::new("Dom Casmurro", "Outro Autor").known_cover(), None);
        assert_eq!(Wanted::new("Dom Casmurro", "").known_cover(), None);
    }

    #[test]
    fn good_match_needs_most_title_words_and_an_author_word() {
        let wanted = Wanted::new("Pride and Prejudice", "Austen, Jane");
        let austen = vec!["Jane Austen".to_string()];
        assert!(wanted.is_good_match("Pride and Prejudice (Illustrated)", &austen));
        assert!(!wanted.is_good_match("Pride", &austen));
        assert!(!wanted.is_good_match("Pride and Prejudice", &["Seth Grahame".to_string()]));

        // short words count against the ratio but never match
        let wanted = Wanted::new("O Cortiço", "Aluísio Azevedo");
        assert!(!wanted.is_good_match("O Cortiço", &["Aluísio Azevedo".to_string()]));
    }

    #[test]
    fn google_cover_prefers_bigger_images_of_a_matching_volume() {
        let response: GoogleBooksResponse = serde_json::from_str(
            r#"{
                "kind": "books#volumes",
                "items": [
                    {"volumeInfo": {"title": "Emma", "authors": ["Jane Austen"],
                        "imageLinks": {"thumbnail": "http://books.google.com/emma"}}},
                    {"volumeInfo": {"title": "Pride and Prejudice", "authors": ["Jane Austen"]}},
                    {"volumeInfo": {"title": "Pride and Prejudice", "authors": ["Jane Austen"],
                        "imageLinks": {
                            "thumbnail": "http://books.google.com/thumb",
                            "medium": "http://books.google.com/medium"
                        }}}
                ]
            }"#,
        )
        .unwrap();
        let wanted = Wanted::new("Pride and Prejudice", "Jane Austen");
        assert_eq!(
            wanted.pick_google_cover(&response).as_deref(),
            Some("https://books.google.com/medium")
        );
        assert_eq!(wanted.pick_google_cover(&GoogleBooksResponse::default()), None);
    }

    #[test]
    fn open_library_cover_is_built_from_the_cover_id() {
        let response: OpenLibrarySearch = serde_json::from_str(
            r#"{
                "numFound": 2,
                "docs": [
                    {"title": "Pride and Prejudice", "author_name": ["Jane Austen"]},
                    {"title": "Pride and Prejudice", "author_name": ["Jane Austen"],
                        "cover_i": 14348537}
                ]
            }"#,
        )
        .unwrap();
        let wanted = Wanted::new("Pride and Prejudice", "Jane Austen");
        assert_eq!(
            wanted.pick_open_library_cover(&response).as_deref(),
            Some("https://covers.openlibrary.org/b/id/14348537-L.jpg")
        );
    }

    #[test]
    fn placeholder_shows_the_title_start() {
        assert_eq!(
            placeholder_cover("Iracema"),
            "https://placehold.co/300x450/1F4A8C/FFFFFF/png?text=Iracema"
        );
        assert_eq!(
            placeholder_cover("The Adventures of Sherlock Holmes"),
            "https://placehold.co/300x450/28A745/FFFFFF/png?text=The%20Adventures%20of%20Sh"
        );
    }
}
