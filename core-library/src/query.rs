//! Filtered and sorted views of the collection.
//!
//! Everything here is pure: the collection is borrowed and never modified.

use crate::models::AlbumRecord;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Rating filter options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RatingFilter {
    /// Rating greater than or equal to the value.
    AtLeast(u8),
    /// Rating strictly below 5.
    BelowFive,
}

impl RatingFilter {
    pub fn matches(&self, rating: u8) -> bool {
        match self {
            RatingFilter::AtLeast(min) => rating >= *min,
            RatingFilter::BelowFive => rating < 5,
        }
    }
}

/// Sorting options for collection queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SortKey {
    #[default]
    ListenDateDesc,
    ListenDateAsc,
    RatingDesc,
    RatingAsc,
    TitleAsc,
}

/// Filter options for querying the collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QueryCriteria {
    /// Case-insensitive substring matched against title or artist.
    pub search: Option<String>,
    /// Exact genre.
    pub genre: Option<String>,
    pub rating: Option<RatingFilter>,
    pub sort: SortKey,
}

impl QueryCriteria {
    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_genre(mut self, genre: impl Into<String>) -> Self {
        self.genre = Some(genre.into());
        self
    }

    pub fn with_rating(mut self, rating: RatingFilter) -> Self {
        self.rating = Some(rating);
        self
    }

    pub fn sorted_by(mut self, sort: SortKey) -> Self {
        self.sort = sort;
        self
    }

    fn matches(&self, record: &AlbumRecord, needle: Option<&str>) -> bool {
        if let Some(needle) = needle {
            if !record.title.to_lowercase().contains(needle)
                && !record.artist.to_lowercase().contains(needle)
            {
                return false;
            }
        }

        if let Some(genre) = &self.genre {
            if &record.genre != genre {
                return false;
            }
        }

        if let Some(rating) = &self.rating {
            if !rating.matches(record.rating) {
                return false;
            }
        }

        true
    }
}

/// Apply the criteria to the collection.
///
/// Filters combine with AND. Sorting is stable: records that compare equal
/// keep their collection order.
pub fn query<'a>(records: &'a [AlbumRecord], criteria: &QueryCriteria) -> Vec<&'a AlbumRecord> {
    let needle = criteria
        .search
        .as_deref()
        .map(str::to_lowercase)
        .filter(|s| !s.is_empty());

    let mut results: Vec<&AlbumRecord> = records
        .iter()
        .filter(|r| criteria.matches(r, needle.as_deref()))
        .collect();

    results.sort_by(|a, b| compare(a, b, criteria.sort));
    results
}

fn compare(a: &AlbumRecord, b: &AlbumRecord, sort: SortKey) -> Ordering {
    match sort {
        SortKey::ListenDateDesc => b.listen_date.cmp(&a.listen_date),
        SortKey::ListenDateAsc => a.listen_date.cmp(&b.listen_date),
        SortKey::RatingDesc => b.rating.cmp(&a.rating),
        SortKey::RatingAsc => a.rating.cmp(&b.rating),
        SortKey::TitleAsc => a.title.to_lowercase().cmp(&b.title.to_lowercase()),
    }
}

/// Distinct genres in ascending order.
pub fn available_genres(records: &[AlbumRecord]) -> Vec<String> {
    records
        .iter()
        .map(|r| r.genre.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlbumDraft, AlbumId};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn record(title: &str, artist: &str, genre: &str, rating: u8, day: u32) -> AlbumRecord {
        let t0 = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let draft = AlbumDraft::new(
            title,
            artist,
            genre,
            NaiveDate::from_ymd_opt(2024, 2, day).unwrap(),
            rating,
        );
        AlbumRecord::from_draft(AlbumId::from_string(title), draft, t0)
    }

    fn ratings(results: &[&AlbumRecord]) -> Vec<u8> {
        results.iter().map(|r| r.rating).collect()
    }

    fn sample() -> Vec<AlbumRecord> {
        vec![
            record("Alpha", "Ann", "Rock", 3, 1),
            record("Bravo", "Bob", "Jazz", 7, 2),
            record("charlie", "Cat", "Rock", 9, 3),
            record("Delta", "Dan", "Pop", 2, 4),
            record("Echo", "Eve", "Rock", 10, 5),
        ]
    }

    #[test]
    fn test_rating_at_least_sorted_desc() {
        let records = sample();
        let criteria = QueryCriteria::default()
            .with_rating(RatingFilter::AtLeast(5))
            .sorted_by(SortKey::RatingDesc);

        assert_eq!(ratings(&query(&records, &criteria)), vec![10, 9, 7]);
    }

    #[test]
    fn test_below_five_keeps_collection_order() {
        let records = sample();
        let criteria = QueryCriteria::default()
            .with_rating(RatingFilter::BelowFive)
            .sorted_by(SortKey::ListenDateAsc);

        assert_eq!(ratings(&query(&records, &criteria)), vec![3, 2]);
    }

    #[test]
    fn test_default_sort_is_listen_date_desc() {
        let records = sample();
        let titles: Vec<_> = query(&records, &QueryCriteria::default())
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Echo", "Delta", "charlie", "Bravo", "Alpha"]);
    }

    #[test]
    fn test_search_matches_title_or_artist() {
        let records = sample();

        let by_title = query(&records, &QueryCriteria::default().with_search("CHAR"));
        assert_eq!(by_title.len(), 1);
        assert_eq!(by_title[0].title, "charlie");

        let by_artist = query(&records, &QueryCriteria::default().with_search("eve"));
        assert_eq!(by_artist.len(), 1);
        assert_eq!(by_artist[0].artist, "Eve");

        assert_eq!(
            query(&records, &QueryCriteria::default().with_search("")).len(),
            records.len()
        );
    }

    #[test]
    fn test_filters_combine() {
        let records = sample();
        let criteria = QueryCriteria::default()
            .with_genre("Rock")
            .with_rating(RatingFilter::AtLeast(5))
            .sorted_by(SortKey::TitleAsc);

        let titles: Vec<_> = query(&records, &criteria)
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["charlie", "Echo"]);
    }

    #[test]
    fn test_title_sort_is_case_insensitive() {
        let records = sample();
        let titles: Vec<_> = query(&records, &QueryCriteria::default().sorted_by(SortKey::TitleAsc))
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["Alpha", "Bravo", "charlie", "Delta", "Echo"]);
    }

    #[test]
    fn test_stable_ties() {
        let records = vec![
            record("First", "A", "Rock", 8, 1),
            record("Second", "B", "Rock", 8, 1),
            record("Third", "C", "Rock", 8, 1),
        ];
        let titles: Vec<_> = query(&records, &QueryCriteria::default().sorted_by(SortKey::RatingAsc))
            .iter()
            .map(|r| r.title.as_str())
            .collect();
        assert_eq!(titles, vec!["First", "Second", "Third"]);
    }

    #[test]
    fn test_available_genres() {
        assert_eq!(available_genres(&sample()), vec!["Jazz", "Pop", "Rock"]);
        assert!(available_genres(&[]).is_empty());
    }
}
