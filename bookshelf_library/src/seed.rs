use crate::api::BookDetails;
use crate::genres_repository::{ensure_genre, GenresRepository, GenresRepositoryError};

pub const DEFAULT_GENRES: [&str; 10] = [
    "Ficção",
    "Romance",
    "Fantasia",
    "Ficção Científica",
    "Mistério",
    "Biografia",
    "História",
    "Filosofia",
    "Poesia",
    "Infantil",
];

/// What a freshly registered user starts with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedOptions {
    pub starter_books: bool,
}

/// Registers the default genres, names that already exist are left alone
pub async fn seed_genres(repository: &dyn GenresRepository) -> Result<(), GenresRepositoryError> {
    for name in DEFAULT_GENRES {
        ensure_genre(repository, name).await?;
    }
    tracing::info!("Default genres seeded");
    Ok(())
}

struct StarterBook {
    title: &'static str,
    author: &'static str,
    genre: &'static str,
    year: i32,
    pages: u32,
    rating: u8,
    synopsis: &'static str,
}

const STARTER_BOOKS: [StarterBook; 10] = [
    StarterBook {
        title: "Dom Casmurro",
        author: "Machado de Assis",
        genre: "Romance",
        year: 1899,
        pages: 256,
        rating: 5,
        synopsis: "Bentinho relembra a juventude e o ciúme que sente de Capitu.",
    },
    StarterBook {
        title: "Memórias Póstumas de Brás Cubas",
        author: "Machado de Assis",
        genre: "Romance",
        year: 1881,
        pages: 208,
        rating: 5,
        synopsis: "Um defunto autor narra a própria vida com ironia.",
    },
    StarterBook {
        title: "O Cortiço",
        author: "Aluísio Azevedo",
        genre: "Romance",
        year: 1890,
        pages: 304,
        rating: 4,
        synopsis: "A vida em uma habitação coletiva no Rio de Janeiro do século XIX.",
    },
    StarterBook {
        title: "Iracema",
        author: "José de Alencar",
        genre: "Romance",
        year: 1865,
        pages: 144,
        rating: 4,
        synopsis: "A lenda do Ceará e o amor entre Iracema e Martim.",
    },
    StarterBook {
        title: "O Guarani",
        author: "José de Alencar",
        genre: "Romance",
        year: 1857,
        pages: 400,
        rating: 3,
        synopsis: "Peri dedica a vida a proteger Ceci.",
    },
    StarterBook {
        title: "Vidas Secas",
        author: "Graciliano Ramos",
        genre: "Ficção",
        year: 1938,
        pages: 176,
        rating: 5,
        synopsis: "Uma família de retirantes atravessa o sertão nordestino.",
    },
    StarterBook {
        title: "Grande Sertão: Veredas",
        author: "João Guimarães Rosa",
        genre: "Ficção",
        year: 1956,
        pages: 624,
        rating: 5,
        synopsis: "Riobaldo conta suas andanças de jagunço pelo sertão.",
    },
    StarterBook {
        title: "O Sítio do Picapau Amarelo",
        author: "Monteiro Lobato",
        genre: "Infantil",
        year: 1920,
        pages: 192,
        rating: 4,
        synopsis: "As aventuras de Narizinho, Pedrinho e Emília.",
    },
    StarterBook {
        title: "Mensagem",
        author: "Fernando Pessoa",
        genre: "Poesia",
        year: 1934,
        pages: 112,
        rating: 4,
        synopsis: "Poemas sobre a história e o destino de Portugal.",
    },
    StarterBook {
        title: "Os Sertões",
        author: "Euclides da Cunha",
        genre: "História",
        year: 1902,
        pages: 656,
        rating: 3,
        synopsis: "O relato da Guerra de Canudos.",
    },
];

/// Books every new user finds on the shelf after registering
pub fn starter_books() -> Vec<BookDetails> {
    STARTER_BOOKS
        .iter()
        .map(|book| BookDetails {
            title: book.title.to_string(),
            author: book.author.to_string(),
            cover_url: String::new(),
            genre: Some(book.genre.to_string()),
            year: Some(book.year),
            pages: Some(book.pages),
            rating: Some(book.rating),
            synopsis: Some(book.synopsis.to_string()),
            status: None,
        })
        .collect()
}

#[cfg(test)]
mod seed_tests {
    use super::*;
    use crate::genres_repository::InMemoryGenresRepository;

    #[test]
    fn starter_books_are_valid_and_use_default_genres() {
        let books = starter_books();
        assert_eq!(books.len(), STARTER_BOOKS.len());
        for book in books {
            assert_eq!(book.validate(), Ok(()));
            assert!(DEFAULT_GENRES.contains(&book.genre.as_deref().unwrap()));
        }
    }

    #[tokio::test]
    async fn seeding_twice_keeps_one_genre_per_name() {
        let repository = InMemoryGenresRepository::default();
        repository.add_genre("romance").await.unwrap();

        seed_genres(&repository).await.unwrap();
        seed_genres(&repository).await.unwrap();

        let genres = repository.list_genres().await.unwrap();
        assert_eq!(genres.len(), DEFAULT_GENRES.len());
        assert!(genres.iter().any(|genre| genre.name == "romance"));
    }
}
