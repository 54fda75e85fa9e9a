//! Tag strings and the tag matching policy
//!
//! A record's tags are stored as the comma-joined string found in the dataset
//! ("Action, Adventure, Fantasy"). The raw string is kept verbatim so that a
//! dataset re-serializes without changes; individual labels are derived on
//! demand.
//!
//! # Matching policy
//! [`TagMatch::Substring`] (the default) matches a tag when it occurs anywhere
//! in the joined string, ignoring case. A short tag can therefore match
//! inside a longer, unrelated one ("Love" matches "Boys Love"). This is the
//! behaviour existing trend reports were produced with, so it stays the
//! default; [`TagMatch::Exact`] is available for label set membership.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Separator used when joining individual labels into a tag string
pub const TAG_SEPARATOR: &str = ", ";

/// How a tag is matched against a record's tag string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TagMatch {
    /// Case-insensitive substring of the joined tag string
    #[default]
    Substring,
    /// Case-sensitive substring of the joined tag string
    SubstringCaseSensitive,
    /// Case-insensitive equality with one of the individual labels
    Exact,
}

impl fmt::Display for TagMatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TagMatch::Substring => "substring",
            TagMatch::SubstringCaseSensitive => "substring-case-sensitive",
            TagMatch::Exact => "exact",
        };
        f.write_str(name)
    }
}

impl FromStr for TagMatch {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "substring" => Ok(TagMatch::Substring),
            "substring-case-sensitive" => Ok(TagMatch::SubstringCaseSensitive),
            "exact" => Ok(TagMatch::Exact),
            other => Err(format!(
                "unknown tag match policy '{}' (expected substring, substring-case-sensitive or exact)",
                other
            )),
        }
    }
}

/// Comma-joined tag string of a single record
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Tags(String);

impl Tags {
    /// Wrap a raw tag string exactly as read from the dataset
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Join individual labels with [`TAG_SEPARATOR`]
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let joined = labels
            .into_iter()
            .map(|l| l.as_ref().trim().to_string())
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(TAG_SEPARATOR);
        Self(joined)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Individual trimmed labels, in the order they appear
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.split(',').map(str::trim).filter(|l| !l.is_empty())
    }

    /// Whether `tag` matches this tag string under `policy`
    pub fn matches(&self, tag: &str, policy: TagMatch) -> bool {
        if self.is_empty() {
            return false;
        }
        match policy {
            TagMatch::Substring => self.0.to_lowercase().contains(&tag.to_lowercase()),
            TagMatch::SubstringCaseSensitive => self.0.contains(tag),
            TagMatch::Exact => {
                let wanted = tag.trim().to_lowercase();
                self.labels().any(|l| l.to_lowercase() == wanted)
            }
        }
    }
}

impl fmt::Display for Tags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Tags {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Tags {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Tags(raw))
    }
}
