//! # Album Page Import
//!
//! Helpers around a scraped Album of the Year page. The host does the
//! fetching and HTML parsing and hands over an [`ImportedAlbum`]; this module
//! cleans it up and turns it into an [`AlbumDraft`] that still goes through
//! the record store's validation.

use chrono::NaiveDate;
use core_library::{AlbumDraft, AlbumFormat};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{MetadataError, Result};

/// Path fragment every importable link must contain.
pub const IMPORT_LINK_MARKER: &str = "albumoftheyear.org/album/";

const SITE_ORIGIN: &str = "https://www.albumoftheyear.org";

/// Genre returned by [`map_genre`] when nothing matches.
pub const FALLBACK_GENRE: &str = "Autre";

/// Substring table, checked in order; the first hit wins.
const GENRE_TABLE: &[(&str, &str)] = &[
    ("rock", "Rock"),
    ("alternative", "Rock"),
    ("indie rock", "Indie"),
    ("indie", "Indie"),
    ("indie pop", "Indie"),
    ("pop", "Pop"),
    ("synth pop", "Pop"),
    ("art pop", "Pop"),
    ("hip hop", "Hip-Hop"),
    ("hip-hop", "Hip-Hop"),
    ("rap", "Hip-Hop"),
    ("jazz", "Jazz"),
    ("classical", "Classique"),
    ("electronic", "Électronique"),
    ("electro", "Électronique"),
    ("edm", "Électronique"),
    ("house", "Électronique"),
    ("techno", "Électronique"),
    ("r&b", "R&B"),
    ("rnb", "R&B"),
    ("soul", "R&B"),
    ("metal", "Metal"),
    ("heavy metal", "Metal"),
    ("folk", "Folk"),
    ("country", "Folk"),
    ("acoustic", "Folk"),
];

fn pattern(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

fn slug_pattern() -> Option<&'static Regex> {
    static SLUG: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(&SLUG, r"(?i)/album/\d+-([^/]+?)(?:-[^/]+)?\.php")
}

fn size_segment_pattern() -> Option<&'static Regex> {
    static SIZE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(&SIZE, r"/\d+x\d+/")
}

fn dated_year_pattern() -> Option<&'static Regex> {
    static DATED: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(
        &DATED,
        r"(?i)(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},?\s+((?:19|20)\d{2})",
    )
}

fn bare_year_pattern() -> Option<&'static Regex> {
    static BARE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(&BARE, r"\b(?:19|20)\d{2}\b")
}

/// Check that a link points at an Album of the Year album page.
pub fn validate_import_link(link: &str) -> Result<&str> {
    let link = link.trim();
    if link.is_empty() {
        return Err(MetadataError::MissingLink);
    }
    if !link.contains(IMPORT_LINK_MARKER) {
        return Err(MetadataError::UnsupportedLink(link.to_string()));
    }
    Ok(link)
}

/// Recover an artist name from the page slug.
///
/// `/album/516-franz-ferdinand-franz-ferdinand.php` yields `"Franz"`: the
/// slug cannot tell where the artist ends, so only its shortest prefix is
/// taken. Each dash-separated word is capitalized.
pub fn artist_from_link(link: &str) -> Option<String> {
    let captures = slug_pattern()?.captures(link)?;
    let slug = captures.get(1)?.as_str();

    let artist = slug
        .split('-')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ");
    Some(artist)
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Make a scraped cover source absolute and drop its thumbnail size segment.
pub fn normalize_cover_url(src: &str) -> Option<String> {
    let src = src.trim();
    if src.is_empty() {
        return None;
    }

    let absolute = if src.starts_with("//") {
        format!("https:{}", src)
    } else if src.starts_with('/') {
        format!("{}{}", SITE_ORIGIN, src)
    } else {
        src.to_string()
    };

    match size_segment_pattern() {
        Some(re) => Some(re.replacen(&absolute, 1, "/").into_owned()),
        None => Some(absolute),
    }
}

/// Map a free-form genre label onto the log's genre vocabulary.
pub fn map_genre(label: &str) -> &'static str {
    let lower = label.to_lowercase();
    GENRE_TABLE
        .iter()
        .find(|(needle, _)| lower.contains(needle))
        .map(|(_, genre)| *genre)
        .unwrap_or(FALLBACK_GENRE)
}

/// Extract a release year from a page's date row.
///
/// Prefers a full `Month Day, Year` date and falls back to any standalone
/// 19xx/20xx number.
pub fn parse_release_year(text: &str) -> Option<i32> {
    if let Some(year) = dated_year_pattern()
        .and_then(|re| re.captures(text))
        .and_then(|c| c.get(1))
    {
        return year.as_str().parse().ok();
    }

    bare_year_pattern()?.find(text)?.as_str().parse().ok()
}

/// Extract the release format from the start of a page's format row.
pub fn parse_format(text: &str) -> Option<AlbumFormat> {
    const KNOWN: [&str; 6] = ["LP", "EP", "Single", "Mixtape", "Compilation", "Live"];

    let text = text.trim_start();
    KNOWN.iter().find_map(|name| {
        let head = text.get(..name.len())?;
        head.eq_ignore_ascii_case(name)
            .then(|| AlbumFormat::parse(name))
    })
}

/// Fields scraped from an album page. Everything is optional because page
/// layouts vary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImportedAlbum {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub genre: Option<String>,
    pub release_year: Option<i32>,
    pub format: Option<AlbumFormat>,
    pub cover_url: Option<String>,
    pub aoty_link: Option<String>,
}

impl ImportedAlbum {
    /// Start an import for a validated page link.
    pub fn from_link(link: &str) -> Result<Self> {
        let link = validate_import_link(link)?;
        Ok(Self {
            aoty_link: Some(link.to_string()),
            ..Default::default()
        })
    }

    /// Fill the gaps the page scrape left: artist from the link slug, an
    /// absolute full-size cover URL, and blank strings dropped.
    pub fn normalized(mut self) -> Self {
        self.title = non_blank(self.title);
        self.artist = non_blank(self.artist);
        self.genre = non_blank(self.genre);
        self.aoty_link = non_blank(self.aoty_link);
        self.cover_url = self.cover_url.as_deref().and_then(normalize_cover_url);

        if self.artist.is_none() {
            self.artist = self.aoty_link.as_deref().and_then(artist_from_link);
            if let Some(artist) = &self.artist {
                debug!(artist = %artist, "Artist recovered from link slug");
            }
        }
        self
    }

    /// Build a draft for the add form.
    ///
    /// Fails only when the page had no title. The genre is carried over as
    /// scraped; validation of the remaining fields happens on add.
    pub fn into_draft(
        self,
        listen_date: NaiveDate,
        rating: u8,
        review: impl Into<String>,
    ) -> Result<AlbumDraft> {
        let imported = self.normalized();
        let title = imported.title.ok_or(MetadataError::MissingTitle)?;

        let mut draft = AlbumDraft::new(
            title,
            imported.artist.unwrap_or_default(),
            imported.genre.unwrap_or_default(),
            listen_date,
            rating,
        )
        .with_review(review);

        if let Some(year) = imported.release_year {
            draft = draft.with_release_year(year);
        }
        if let Some(format) = imported.format {
            draft = draft.with_format(format);
        }
        if let Some(cover) = imported.cover_url {
            draft = draft.with_cover_url(cover);
        }
        if let Some(link) = imported.aoty_link {
            draft = draft.with_aoty_link(link);
        }
        Ok(draft)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
