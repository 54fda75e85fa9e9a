//! Catalogued manga record

use crate::tags::Tags;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Lowest valid community score
pub const MIN_SCORE: f64 = 0.0;
/// Highest valid community score
pub const MAX_SCORE: f64 = 10.0;

/// One catalogued manga with quality, popularity and genre metadata
///
/// Records are immutable once ingested. `score` and `members` are optional
/// because the upstream API leaves them empty for unrated or obscure entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// MyAnimeList identifier (unique within a dataset)
    pub id: i64,
    /// English title when available, otherwise the default title
    pub title: String,
    /// Community score, 0–10
    pub score: Option<f64>,
    /// Number of users listing the entry (popularity proxy)
    pub members: Option<u64>,
    /// Target demographic label (Shounen, Seinen, ...)
    pub demographic: Option<String>,
    /// Genres followed by themes, comma-joined
    pub tags: Tags,
}

impl Record {
    /// Check the record invariants
    pub fn validate(&self) -> Result<()> {
        if let Some(score) = self.score {
            if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                return Err(Error::InvalidInput(format!(
                    "record {}: score {} outside {}..={}",
                    self.id, score, MIN_SCORE, MAX_SCORE
                )));
            }
        }
        Ok(())
    }

    /// Both metrics needed for classification and trend scoring
    pub fn metrics(&self) -> Option<(f64, u64)> {
        match (self.score, self.members) {
            (Some(score), Some(members)) => Some((score, members)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(score: Option<f64>, members: Option<u64>) -> Record {
        Record {
            id: 1,
            title: "Monster".to_string(),
            score,
            members,
            demographic: Some("Seinen".to_string()),
            tags: Tags::from_raw("Drama, Mystery"),
        }
    }

    #[test]
    fn test_validate_accepts_score_bounds() {
        assert!(record(Some(0.0), None).validate().is_ok());
        assert!(record(Some(10.0), None).validate().is_ok());
        assert!(record(None, None).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_out_of_range_score() {
        let err = record(Some(10.5), Some(3)).validate().unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[test]
    fn test_metrics_requires_both_fields() {
        assert_eq!(record(Some(8.9), Some(200)).metrics(), Some((8.9, 200)));
        assert_eq!(record(Some(8.9), None).metrics(), None);
        assert_eq!(record(None, Some(200)).metrics(), None);
    }
}
