//! Statistics over the whole collection.
//!
//! Every function is pure and recomputed on each call. Query filters never
//! apply here. Ties are broken by first appearance in the collection.

use crate::models::{AlbumRecord, MAX_RATING, MIN_RATING};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Number of entries in the top albums and top artists tables.
pub const DEFAULT_TOP_N: usize = 10;

/// Number of most recent months shown in the timeline.
pub const TIMELINE_MONTHS: usize = 12;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenreCount {
    pub genre: String,
    pub count: usize,
}

/// Album counts for ratings 1 through 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RatingHistogram {
    counts: [usize; 10],
}

impl RatingHistogram {
    /// Number of albums with the given rating; zero when out of range.
    pub fn count(&self, rating: u8) -> usize {
        if (MIN_RATING..=MAX_RATING).contains(&rating) {
            self.counts[usize::from(rating - 1)]
        } else {
            0
        }
    }

    /// `(rating, count)` pairs in rating order.
    pub fn buckets(&self) -> impl Iterator<Item = (u8, usize)> + '_ {
        (MIN_RATING..=MAX_RATING).zip(self.counts.iter().copied())
    }

    pub fn total(&self) -> usize {
        self.counts.iter().sum()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyCount {
    pub year: i32,
    pub month: u32,
    pub count: usize,
}

impl MonthlyCount {
    /// `YYYY-MM`
    pub fn label(&self) -> String {
        format!("{}-{:02}", self.year, self.month)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecadeCount {
    /// First year of the decade, e.g. 1990.
    pub decade: i32,
    /// Display label, e.g. "1990s".
    pub label: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtistStats {
    pub artist: String,
    pub album_count: usize,
    pub average_rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreStats {
    pub genre: String,
    pub count: usize,
    pub average_rating: f64,
    /// Share of the collection, 0 to 100.
    pub percentage: f64,
}

/// Headline numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_albums: usize,
    pub unique_artists: usize,
    /// `None` for an empty collection.
    pub average_rating: Option<f64>,
    pub top_genre: Option<String>,
}

/// Running count and rating sum per key, in first-appearance order.
struct Tally {
    index: HashMap<String, usize>,
    entries: Vec<(String, usize, u32)>,
}

impl Tally {
    fn by<F>(records: &[AlbumRecord], key: F) -> Self
    where
        F: Fn(&AlbumRecord) -> &str,
    {
        let mut tally = Tally {
            index: HashMap::new(),
            entries: Vec::new(),
        };

        for record in records {
            let name = key(record);
            let slot = match tally.index.get(name) {
                Some(&slot) => slot,
                None => {
                    tally.entries.push((name.to_string(), 0, 0));
                    tally.index.insert(name.to_string(), tally.entries.len() - 1);
                    tally.entries.len() - 1
                }
            };
            let entry = &mut tally.entries[slot];
            entry.1 += 1;
            entry.2 += u32::from(record.rating);
        }

        // Stable sort keeps first appearance among equal counts.
        tally.entries.sort_by(|a, b| b.1.cmp(&a.1));
        tally
    }
}

fn average(sum: u32, count: usize) -> f64 {
    if count == 0 {
        0.0
    } else {
        f64::from(sum) / count as f64
    }
}

/// Album count per genre, most frequent first.
pub fn genre_distribution(records: &[AlbumRecord]) -> Vec<GenreCount> {
    Tally::by(records, |r| r.genre.as_str())
        .entries
        .into_iter()
        .map(|(genre, count, _)| GenreCount { genre, count })
        .collect()
}

/// Album count per rating. Ratings outside 1..=10 are ignored.
pub fn rating_histogram(records: &[AlbumRecord]) -> RatingHistogram {
    let mut histogram = RatingHistogram::default();
    for record in records {
        if (MIN_RATING..=MAX_RATING).contains(&record.rating) {
            histogram.counts[usize::from(record.rating - 1)] += 1;
        }
    }
    histogram
}

/// Albums listened per month, oldest first, limited to the most recent
/// [`TIMELINE_MONTHS`] months that have any listens.
pub fn monthly_timeline(records: &[AlbumRecord]) -> Vec<MonthlyCount> {
    let mut months: BTreeMap<(i32, u32), usize> = BTreeMap::new();
    for record in records {
        *months.entry(record.listen_month()).or_default() += 1;
    }

    let skip = months.len().saturating_sub(TIMELINE_MONTHS);
    months
        .into_iter()
        .skip(skip)
        .map(|((year, month), count)| MonthlyCount { year, month, count })
        .collect()
}

/// Albums per release decade, oldest first. Records without a release year
/// are left out.
pub fn decade_distribution(records: &[AlbumRecord]) -> Vec<DecadeCount> {
    let mut decades: BTreeMap<i32, usize> = BTreeMap::new();
    for decade in records.iter().filter_map(AlbumRecord::release_decade) {
        *decades.entry(decade).or_default() += 1;
    }

    decades
        .into_iter()
        .map(|(decade, count)| DecadeCount {
            decade,
            label: format!("{}s", decade),
            count,
        })
        .collect()
}

/// Highest rated albums.
pub fn top_albums(records: &[AlbumRecord], n: usize) -> Vec<&AlbumRecord> {
    let mut sorted: Vec<&AlbumRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.rating.cmp(&a.rating));
    sorted.truncate(n);
    sorted
}

/// Most listened artists with their average rating.
pub fn top_artists(records: &[AlbumRecord], n: usize) -> Vec<ArtistStats> {
    Tally::by(records, |r| r.artist.as_str())
        .entries
        .into_iter()
        .take(n)
        .map(|(artist, album_count, sum)| ArtistStats {
            artist,
            album_count,
            average_rating: average(sum, album_count),
        })
        .collect()
}

/// Count, average rating and share of the collection per genre.
pub fn genre_stats(records: &[AlbumRecord]) -> Vec<GenreStats> {
    let total = records.len();
    Tally::by(records, |r| r.genre.as_str())
        .entries
        .into_iter()
        .map(|(genre, count, sum)| GenreStats {
            genre,
            count,
            average_rating: average(sum, count),
            percentage: count as f64 / total as f64 * 100.0,
        })
        .collect()
}

pub fn overview(records: &[AlbumRecord]) -> Overview {
    let unique_artists = records
        .iter()
        .map(|r| r.artist.as_str())
        .collect::<HashSet<_>>()
        .len();

    let average_rating = if records.is_empty() {
        None
    } else {
        let sum: u32 = records.iter().map(|r| u32::from(r.rating)).sum();
        Some(average(sum, records.len()))
    };

    Overview {
        total_albums: records.len(),
        unique_artists,
        average_rating,
        top_genre: genre_distribution(records)
            .into_iter()
            .next()
            .map(|g| g.genre),
    }
}

/// Every album, most recent listen first.
pub fn listening_history(records: &[AlbumRecord]) -> Vec<&AlbumRecord> {
    let mut sorted: Vec<&AlbumRecord> = records.iter().collect();
    sorted.sort_by(|a, b| b.listen_date.cmp(&a.listen_date));
    sorted
}

/// Every aggregate in one value, ready to hand to a chart layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub overview: Overview,
    pub genre_distribution: Vec<GenreCount>,
    pub rating_histogram: RatingHistogram,
    pub monthly_timeline: Vec<MonthlyCount>,
    pub decade_distribution: Vec<DecadeCount>,
    pub top_albums: Vec<AlbumRecord>,
    pub top_artists: Vec<ArtistStats>,
    pub genre_stats: Vec<GenreStats>,
    pub listening_history: Vec<AlbumRecord>,
}

impl AnalyticsReport {
    pub fn compute(records: &[AlbumRecord]) -> Self {
        Self {
            overview: overview(records),
            genre_distribution: genre_distribution(records),
            rating_histogram: rating_histogram(records),
            monthly_timeline: monthly_timeline(records),
            decade_distribution: decade_distribution(records),
            top_albums: top_albums(records, DEFAULT_TOP_N)
                .into_iter()
                .cloned()
                .collect(),
            top_artists: top_artists(records, DEFAULT_TOP_N),
            genre_stats: genre_stats(records),
            listening_history: listening_history(records).into_iter().cloned().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.overview.total_albums == 0
    }
}
