//! Domain models for the album log
//!
//! `AlbumRecord` is the persisted entity; `AlbumDraft` is what the UI submits
//! and is validated before it becomes (or replaces) a record.

use crate::error::{LibraryError, Result};
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;
use url::Url;
use uuid::Uuid;

/// Lowest accepted rating.
pub const MIN_RATING: u8 = 1;
/// Highest accepted rating.
pub const MAX_RATING: u8 = 10;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for an album record
///
/// New records get a UUID v4. Identifiers read from older collections
/// (millisecond timestamps, sometimes stored as JSON numbers) are kept as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct AlbumId(String);

impl AlbumId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AlbumId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for AlbumId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum IdRepr {
            Text(String),
            Number(u64),
        }

        Ok(match IdRepr::deserialize(deserializer)? {
            IdRepr::Text(s) => AlbumId(s),
            IdRepr::Number(n) => AlbumId(n.to_string()),
        })
    }
}

// =============================================================================
// Format
// =============================================================================

/// Release format
///
/// Parsing is case-insensitive. Unknown values are preserved in `Other` so
/// that reading and rewriting a collection never loses data.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum AlbumFormat {
    Lp,
    Ep,
    Single,
    Mixtape,
    Compilation,
    Live,
    Other(String),
}

impl AlbumFormat {
    pub fn as_str(&self) -> &str {
        match self {
            AlbumFormat::Lp => "LP",
            AlbumFormat::Ep => "EP",
            AlbumFormat::Single => "Single",
            AlbumFormat::Mixtape => "Mixtape",
            AlbumFormat::Compilation => "Compilation",
            AlbumFormat::Live => "Live",
            AlbumFormat::Other(s) => s,
        }
    }

    /// Parse a format name, trimming whitespace.
    pub fn parse(s: &str) -> Self {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "lp" => AlbumFormat::Lp,
            "ep" => AlbumFormat::Ep,
            "single" => AlbumFormat::Single,
            "mixtape" => AlbumFormat::Mixtape,
            "compilation" => AlbumFormat::Compilation,
            "live" => AlbumFormat::Live,
            _ => AlbumFormat::Other(trimmed.to_string()),
        }
    }
}

impl FromStr for AlbumFormat {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

impl From<String> for AlbumFormat {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<AlbumFormat> for String {
    fn from(format: AlbumFormat) -> Self {
        format.as_str().to_string()
    }
}

impl fmt::Display for AlbumFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Domain Models
// =============================================================================

/// A logged album
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumRecord {
    /// Unique identifier
    pub id: AlbumId,
    pub title: String,
    pub artist: String,
    /// Free-form genre label
    pub genre: String,
    /// Four-digit release year
    #[serde(default, deserialize_with = "deserialize_release_year")]
    pub release_year: Option<i32>,
    #[serde(default, deserialize_with = "deserialize_format")]
    pub format: Option<AlbumFormat>,
    /// Day the album was listened to
    pub listen_date: NaiveDate,
    /// Rating from 1 to 10
    pub rating: u8,
    #[serde(default, deserialize_with = "deserialize_review")]
    pub review: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    /// Link to the album page on albumoftheyear.org
    #[serde(default)]
    pub aoty_link: Option<String>,
    /// Timestamps
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AlbumRecord {
    /// Build a new record from an already validated draft.
    pub fn from_draft(id: AlbumId, draft: AlbumDraft, now: DateTime<Utc>) -> Self {
        Self {
            id,
            title: draft.title,
            artist: draft.artist,
            genre: draft.genre,
            release_year: draft.release_year,
            format: draft.format,
            listen_date: draft.listen_date,
            rating: draft.rating,
            review: draft.review,
            cover_url: draft.cover_url,
            aoty_link: draft.aoty_link,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every editable field with the draft's values.
    ///
    /// `updated_at` moves to `max(now, previous + 1ms)` so it strictly
    /// advances even when the clock does not.
    pub fn apply_draft(&mut self, draft: AlbumDraft, now: DateTime<Utc>) {
        self.title = draft.title;
        self.artist = draft.artist;
        self.genre = draft.genre;
        self.release_year = draft.release_year;
        self.format = draft.format;
        self.listen_date = draft.listen_date;
        self.rating = draft.rating;
        self.review = draft.review;
        self.cover_url = draft.cover_url;
        self.aoty_link = draft.aoty_link;

        let floor = self.updated_at + Duration::milliseconds(1);
        self.updated_at = now.max(floor);
    }

    /// Case-insensitive `(title, artist)` comparison.
    pub fn same_album(&self, title: &str, artist: &str) -> bool {
        self.title.to_lowercase() == title.to_lowercase()
            && self.artist.to_lowercase() == artist.to_lowercase()
    }

    /// `(year, month)` of the listen date.
    pub fn listen_month(&self) -> (i32, u32) {
        (self.listen_date.year(), self.listen_date.month())
    }

    /// Decade of release, e.g. 1990 for 1994.
    pub fn release_decade(&self) -> Option<i32> {
        self.release_year.map(|year| year.div_euclid(10) * 10)
    }
}

/// Album fields supplied by the UI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlbumDraft {
    pub title: String,
    pub artist: String,
    pub genre: String,
    #[serde(default)]
    pub release_year: Option<i32>,
    #[serde(default)]
    pub format: Option<AlbumFormat>,
    pub listen_date: NaiveDate,
    pub rating: u8,
    #[serde(default)]
    pub review: String,
    #[serde(default)]
    pub cover_url: Option<String>,
    #[serde(default)]
    pub aoty_link: Option<String>,
}

impl AlbumDraft {
    pub fn new(
        title: impl Into<String>,
        artist: impl Into<String>,
        genre: impl Into<String>,
        listen_date: NaiveDate,
        rating: u8,
    ) -> Self {
        Self {
            title: title.into(),
            artist: artist.into(),
            genre: genre.into(),
            release_year: None,
            format: None,
            listen_date,
            rating,
            review: String::new(),
            cover_url: None,
            aoty_link: None,
        }
    }

    pub fn with_release_year(mut self, year: i32) -> Self {
        self.release_year = Some(year);
        self
    }

    pub fn with_format(mut self, format: AlbumFormat) -> Self {
        self.format = Some(format);
        self
    }

    pub fn with_review(mut self, review: impl Into<String>) -> Self {
        self.review = review.into();
        self
    }

    pub fn with_cover_url(mut self, url: impl Into<String>) -> Self {
        self.cover_url = Some(url.into());
        self
    }

    pub fn with_aoty_link(mut self, url: impl Into<String>) -> Self {
        self.aoty_link = Some(url.into());
        self
    }

    /// Validate and normalize the draft.
    ///
    /// Text is trimmed, blank optional strings become `None`. Fails on the
    /// first invalid field.
    pub fn validated(self) -> Result<Self> {
        let title = required_text("title", &self.title)?;
        let artist = required_text("artist", &self.artist)?;
        let genre = required_text("genre", &self.genre)?;

        if !(MIN_RATING..=MAX_RATING).contains(&self.rating) {
            return Err(LibraryError::validation(
                "rating",
                format!(
                    "must be between {} and {}, got {}",
                    MIN_RATING, MAX_RATING, self.rating
                ),
            ));
        }

        if let Some(year) = self.release_year {
            if !(1000..=9999).contains(&year) {
                return Err(LibraryError::validation(
                    "releaseYear",
                    format!("must be a four-digit year, got {}", year),
                ));
            }
        }

        let format = match self.format {
            Some(AlbumFormat::Other(s)) if s.trim().is_empty() => None,
            Some(AlbumFormat::Other(s)) => Some(AlbumFormat::parse(&s)),
            other => other,
        };

        Ok(Self {
            title,
            artist,
            genre,
            release_year: self.release_year,
            format,
            listen_date: self.listen_date,
            rating: self.rating,
            review: self.review.trim().to_string(),
            cover_url: optional_url("coverUrl", self.cover_url)?,
            aoty_link: optional_url("aotyLink", self.aoty_link)?,
        })
    }
}

impl From<&AlbumRecord> for AlbumDraft {
    fn from(record: &AlbumRecord) -> Self {
        Self {
            title: record.title.clone(),
            artist: record.artist.clone(),
            genre: record.genre.clone(),
            release_year: record.release_year,
            format: record.format.clone(),
            listen_date: record.listen_date,
            rating: record.rating,
            review: record.review.clone(),
            cover_url: record.cover_url.clone(),
            aoty_link: record.aoty_link.clone(),
        }
    }
}

fn required_text(field: &str, value: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(LibraryError::validation(field, "cannot be empty"));
    }
    Ok(trimmed.to_string())
}

fn optional_url(field: &str, value: Option<String>) -> Result<Option<String>> {
    let Some(raw) = value else {
        return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }

    match Url::parse(trimmed) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Ok(Some(trimmed.to_string())),
        Ok(url) => Err(LibraryError::validation(
            field,
            format!("unsupported scheme '{}'", url.scheme()),
        )),
        Err(e) => Err(LibraryError::validation(
            field,
            format!("not an absolute URL: {}", e),
        )),
    }
}

// =============================================================================
// Lenient decoding
// =============================================================================

fn deserialize_release_year<'de, D>(deserializer: D) -> std::result::Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum YearRepr {
        Number(i64),
        Text(String),
    }

    Ok(match Option::<YearRepr>::deserialize(deserializer)? {
        Some(YearRepr::Number(n)) => i32::try_from(n).ok(),
        Some(YearRepr::Text(s)) => s.trim().parse().ok(),
        None => None,
    })
}

fn deserialize_format<'de, D>(deserializer: D) -> std::result::Result<Option<AlbumFormat>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .filter(|s| !s.trim().is_empty())
        .map(AlbumFormat::from))
}

fn deserialize_review<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}
