//! Collection encoding
//!
//! The whole collection is stored as one pretty-printed JSON array, both in
//! the local cache and in the remote file. Optional fields are written as
//! explicit `null`.

use crate::error::Result;
use crate::models::AlbumRecord;

/// Encode a collection to its canonical JSON form.
pub fn encode(records: &[AlbumRecord]) -> Result<String> {
    Ok(serde_json::to_string_pretty(records)?)
}

/// Decode a collection. Blank input decodes to an empty collection.
pub fn decode(input: &str) -> Result<Vec<AlbumRecord>> {
    if input.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(input)?)
}

/// Decode a collection from raw bytes.
pub fn decode_bytes(input: &[u8]) -> Result<Vec<AlbumRecord>> {
    if input.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_slice(input)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LibraryError;
    use crate::models::{AlbumDraft, AlbumFormat, AlbumId};
    use chrono::{NaiveDate, TimeZone, Utc};

    fn sample() -> Vec<AlbumRecord> {
        let t0 = Utc.with_ymd_and_hms(2024, 5, 2, 8, 30, 15).unwrap();
        let full = AlbumDraft::new(
            "Blue Train",
            "John Coltrane",
            "Jazz",
            NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
            9,
        )
        .with_release_year(1957)
        .with_format(AlbumFormat::Lp)
        .with_review("Locomotion.")
        .with_cover_url("https://cdn.albumoftheyear.org/album/blue-train.jpg")
        .with_aoty_link("https://www.albumoftheyear.org/album/1234-john-coltrane-blue-train.php");
        let bare = AlbumDraft::new(
            "Untitled",
            "Nobody",
            "Ambient",
            NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            4,
        )
        .with_format(AlbumFormat::Other("Box Set".to_string()));

        vec![
            AlbumRecord::from_draft(AlbumId::from_string("a"), full, t0),
            AlbumRecord::from_draft(AlbumId::from_string("1700000000000"), bare, t0),
        ]
    }

    #[test]
    fn test_round_trip_preserves_every_field() {
        let records = sample();
        let encoded = encode(&records).unwrap();
        assert_eq!(decode(&encoded).unwrap(), records);
        assert_eq!(decode_bytes(encoded.as_bytes()).unwrap(), records);
    }

    #[test]
    fn test_encoding_is_pretty_camel_case() {
        let encoded = encode(&sample()).unwrap();
        assert!(encoded.starts_with("[\n"));
        assert!(encoded.contains("\"listenDate\": \"2024-05-01\""));
        assert!(encoded.contains("\"releaseYear\": 1957"));
        assert!(encoded.contains("\"releaseYear\": null"));
        assert!(encoded.contains("\"format\": \"Box Set\""));
    }

    #[test]
    fn test_blank_input_is_empty_collection() {
        assert!(decode("").unwrap().is_empty());
        assert!(decode(" \n").unwrap().is_empty());
        assert!(decode_bytes(b"").unwrap().is_empty());
    }

    #[test]
    fn test_garbage_is_serialization_error() {
        assert!(matches!(
            decode("{not json"),
            Err(LibraryError::Serialization(_))
        ));
        assert!(matches!(
            decode("{\"id\": 1}"),
            Err(LibraryError::Serialization(_))
        ));
    }
}
