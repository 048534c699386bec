use std::collections::{BTreeMap, HashMap};

use crate::api::{Book, DashboardStats, GenreSlice, RatingBucket, YearSummary};

pub const PALETTE: [&str; 10] = [
    "#8884d8", "#82ca9d", "#ffc658", "#ff7300", "#8dd1e1", "#d084d0", "#ffb347", "#87ceeb",
    "#dda0dd", "#98fb98",
];

const WORDS_PER_PAGE: u64 = 250;
const WORDS_PER_MINUTE: u64 = 200;

/// Estimated hours needed to read `total_pages`, rounded to the nearest hour
pub fn reading_time_hours(total_pages: u64) -> u64 {
    let minutes = (total_pages * WORDS_PER_PAGE) as f64 / WORDS_PER_MINUTE as f64;
    (minutes / 60.0).round() as u64
}

fn genre_distribution(books: &[Book]) -> Vec<GenreSlice> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for genre in books.iter().filter_map(|book| book.details.genre.as_deref()) {
        *counts.entry(genre).or_default() += 1;
    }

    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|(name_a, count_a), (name_b, count_b)| {
        count_b.cmp(count_a).then_with(|| name_a.cmp(name_b))
    });

    ranked
        .into_iter()
        .enumerate()
        .map(|(rank, (name, value))| GenreSlice {
            name: name.to_string(),
            value,
            color: PALETTE[rank % PALETTE.len()].to_string(),
        })
        .collect()
}

fn rating_distribution(books: &[Book]) -> Vec<RatingBucket> {
    let mut buckets: Vec<RatingBucket> = (1..=5)
        .map(|rating| RatingBucket { rating, count: 0 })
        .collect();
    for rating in books.iter().filter_map(|book| book.details.rating) {
        if let Some(bucket) = buckets.iter_mut().find(|bucket| bucket.rating == rating) {
            bucket.count += 1;
        }
    }
    buckets
}

fn yearly_data(books: &[Book]) -> Vec<YearSummary> {
    let mut years: BTreeMap<i32, YearSummary> = BTreeMap::new();
    for book in books {
        let Some(year) = book.details.year else {
            continue;
        };
        let summary = years.entry(year).or_insert(YearSummary {
            year,
            books: 0,
            pages: 0,
        });
        summary.books += 1;
        summary.pages += u64::from(book.details.pages.unwrap_or_default());
    }
    years.into_values().collect()
}

/// Summary of a book list as shown on the dashboard
pub fn compute(books: &[Book]) -> DashboardStats {
    let total_books = books.len();
    let total_pages: u64 = books
        .iter()
        .map(|book| u64::from(book.details.pages.unwrap_or_default()))
        .sum();
    let ratings_sum: u64 = books
        .iter()
        .map(|book| u64::from(book.details.rating.unwrap_or_default()))
        .sum();
    let average_rating = if total_books == 0 {
        0.0
    } else {
        ratings_sum as f64 / total_books as f64
    };

    let genre_distribution = genre_distribution(books);
    let most_read_genre = genre_distribution.first().map(|slice| slice.name.clone());

    DashboardStats {
        total_books,
        total_pages,
        average_rating,
        genre_distribution,
        most_read_genre,
        rating_distribution: rating_distribution(books),
        yearly_data: yearly_data(books),
        reading_time_hours: reading_time_hours(total_pages),
    }
}
