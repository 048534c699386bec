//! Curated list of books available in Portuguese, searched locally.

use crate::api::BookDetails;

pub const MAX_RESULTS: usize = 4;
const DEFAULT_CATEGORY: &str = "Literatura Brasileira";

struct CatalogEntry {
    title: &'static str,
    author: &'static str,
    description: &'static str,
    category: &'static str,
    year: i32,
}

static ENTRIES: [CatalogEntry; 12] = [
    CatalogEntry {
        title: "Dom Casmurro",
        author: "Machado de Assis",
        description: "Um dos maiores clássicos da literatura brasileira, narrando a história de \
                      Bentinho e sua obsessão por Capitu.",
        category: "Literatura Brasileira",
        year: 1899,
    },
    CatalogEntry {
        title: "O Cortiço",
        author: "Aluísio Azevedo",
        description: "Romance naturalista que retrata a vida em uma habitação coletiva no Rio de \
                      Janeiro do século XIX.",
        category: "Realismo/Naturalismo",
        year: 1890,
    },
    CatalogEntry {
        title: "Iracema",
        author: "José de Alencar",
        description: "Lenda do Ceará que narra o amor entre a índia Iracema e o português Martím.",
        category: "Romantismo",
        year: 1865,
    },
    CatalogEntry {
        title: "Memórias Póstumas de Brás Cubas",
        author: "Machado de Assis",
        description: "Romance inovador narrado por um defunto autor, marco do Realismo brasileiro.",
        category: "Literatura Brasileira",
        year: 1881,
    },
    CatalogEntry {
        title: "Auto da Barca do Inferno",
        author: "Gil Vicente",
        description: "Peça teatral clássica da literatura portuguesa, disponível em português \
                      brasileiro.",
        category: "Teatro Clássico",
        year: 1517,
    },
    CatalogEntry {
        title: "O Guarani",
        author: "José de Alencar",
        description: "Romance indianista que narra a história de amor entre Peri e Ceci.",
        category: "Romantismo",
        year: 1857,
    },
    CatalogEntry {
        title: "A Moreninha",
        author: "Joaquim Manuel de Macedo",
        description: "Romance urbano que retrata a sociedade carioca do século XIX.",
        category: "Romantismo",
        year: 1844,
    },
    CatalogEntry {
        title: "O Pequeno Príncipe",
        author: "Antoine de Saint-Exupéry",
        description: "Um clássico atemporal sobre a solidão, amizade e os valores da vida, \
                      narrado através dos olhos de uma criança.",
        category: "Literatura Infantil",
        year: 1943,
    },
    CatalogEntry {
        title: "O Menino Maluquinho",
        author: "Ziraldo",
        description: "As aventuras de um menino esperto e travesso que encanta crianças e adultos.",
        category: "Literatura Infantil",
        year: 1980,
    },
    CatalogEntry {
        title: "As Leis",
        author: "Platão",
        description: "Obra fundamental da filosofia política, explorando questões sobre \
                      justiça, governo e sociedade.",
        category: "Filosofia",
        year: -360,
    },
    CatalogEntry {
        title: "A Política",
        author: "Aristóteles",
        description: "Tratado clássico sobre teoria política e organização do Estado.",
        category: "Filosofia",
        year: -335,
    },
    CatalogEntry {
        title: "O Discurso do Método",
        author: "René Descartes",
        description: "Obra fundamental do racionalismo, estabelecendo métodos para o \
                      conhecimento científico.",
        category: "Filosofia",
        year: 1637,
    },
];

/// Broad words in the search term that select a whole category
const BROAD_TERMS: [(&str, &str); 4] = [
    ("literatura", "literatura"),
    ("filosofia", "filosofia"),
    ("infantil", "infantil"),
    ("criança", "infantil"),
];
const CLASSIC_TERM: &str = "clássico";
const CLASSIC_CATEGORIES: [&str; 3] = ["Literatura Brasileira", "Filosofia", "Romantismo"];

impl CatalogEntry {
    fn matches(&self, term: &str) -> bool {
        self.title.to_lowercase().contains(term)
            || self.author.to_lowercase().contains(term)
            || self.category.to_lowercase().contains(term)
    }

    fn matches_broadly(&self, term: &str) -> bool {
        let category = self.category.to_lowercase();
        BROAD_TERMS
            .iter()
            .any(|(word, wanted)| term.contains(word) && category.contains(wanted))
            || (term.contains(CLASSIC_TERM) && CLASSIC_CATEGORIES.contains(&self.category))
    }

    fn to_draft(&self) -> BookDetails {
        BookDetails {
            title: self.title.to_string(),
            author: self.author.to_string(),
            genre: Some(
                Some(self.category)
                    .filter(|category| !category.is_empty())
                    .unwrap_or(DEFAULT_CATEGORY)
                    .to_string(),
            ),
            year: Some(self.year),
            synopsis: Some(self.description.to_string()),
            ..BookDetails::default()
        }
    }
}

/// Books whose title, author or category contain `term`. Without any, books of a category the
/// term names broadly, and as a last resort the first books of the list. Never empty and never
/// more than [`MAX_RESULTS`]. Covers are left for the caller to fill in.
pub fn search(term: &str) -> Vec<BookDetails> {
    let term = term.to_lowercase();
    let mut found: Vec<&CatalogEntry> = ENTRIES
        .iter()
        .filter(|entry| entry.matches(&term))
        .collect();
    if found.is_empty() {
        found = ENTRIES
            .iter()
            .filter(|entry| entry.matches_broadly(&term))
            .collect();
    }
    if found.is_empty() {
        tracing::debug!("No curated book matches {:?}, suggesting popular ones", term);
        found = ENTRIES.iter().collect();
    }
    found
        .into_iter()
        .take(MAX_RESULTS)
        .map(CatalogEntry::to_draft)
        .collect()
}

#[cfg(test)]
mod brazilian_catalog_tests {
    use super::*;

    fn titles(books: &[BookDetails]) -> Vec<&str> {
        books.iter().map(|book| book.title.as_str()).collect()
    }

    #[test]
    fn title_author_and_category_are_searched_ignoring_case() {
        assert_eq!(
            titles(&search("MACHADO")),
            vec!["Dom Casmurro", "Memórias Póstumas de Brás Cubas"]
        );
        assert_eq!(titles(&search("iracema")), vec!["Iracema"]);
        assert_eq!(
            titles(&search("romantismo")),
            vec!["Iracema", "O Guarani", "A Moreninha"]
        );
    }

    #[test]
    fn results_are_capped() {
        // "o " is part of many titles
        assert_eq!(search("o ").len(), MAX_RESULTS);
    }

    #[test]
    fn broad_terms_select_whole_categories() {
        assert_eq!(
            titles(&search("livros para criança")),
            vec!["O Pequeno Príncipe", "O Menino Maluquinho"]
        );
        assert_eq!(
            titles(&search("um clássico qualquer")),
            vec![
                "Dom Casmurro",
                "Iracema",
                "Memórias Póstumas de Brás Cubas",
                "O Guarani"
            ]
        );
    }

    #[test]
    fn unknown_terms_suggest_the_first_books() {
        assert_eq!(
            titles(&search("xyz")),
            vec!["Dom Casmurro", "O Cortiço", "Iracema", "Memórias Póstumas de Brás Cubas"]
        );
    }

    #[test]
    fn drafts_carry_category_year_and_description() {
        let drafts = search("platão");
        assert_eq!(drafts.len(), 1);
        let draft = &drafts[0];
        assert_eq!(draft.author, "Platão");
        assert_eq!(draft.genre.as_deref(), Some("Filosofia"));
        assert_eq!(draft.year, Some(-360));
        assert!(draft.synopsis.as_deref().unwrap().starts_with("Obra fundamental"));
        assert_eq!(draft.cover_url, "");
        assert_eq!(draft.validate(), Ok(()));
    }
}
