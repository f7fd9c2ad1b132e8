use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;

/// Content domain a feedback event or preference record belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    Music,
    Film,
}

impl Domain {
    /// Signal field holding the genre list for this domain
    pub fn genre_field(&self) -> &'static str {
        "genre"
    }

    /// Signal field holding the secondary attribute (artists for music, cast for film)
    pub fn secondary_field(&self) -> &'static str {
        match self {
            Domain::Music => "artist",
            Domain::Film => "cast",
        }
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Domain::Music => write!(f, "music"),
            Domain::Film => write!(f, "film"),
        }
    }
}

impl std::str::FromStr for Domain {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "music" => Ok(Domain::Music),
            "film" => Ok(Domain::Film),
            other => Err(format!("unknown domain: {other}")),
        }
    }
}

/// Whether the user accepted or rejected a recommended item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Polarity {
    Like,
    Dislike,
}

impl Display for Polarity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarity::Like => write!(f, "like"),
            Polarity::Dislike => write!(f, "dislike"),
        }
    }
}

impl std::str::FromStr for Polarity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(Polarity::Like),
            "dislike" => Ok(Polarity::Dislike),
            other => Err(format!("unknown polarity: {other}")),
        }
    }
}

/// A raw signal value as clients send it
///
/// Feedback signals arrive loosely typed: a plain string, a delimited string,
/// an array of strings, or something else entirely. All shape handling lives
/// in the signal extractor; consumers never inspect this enum directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SignalValue {
    Text(String),
    List(Vec<String>),
    Other(serde_json::Value),
}

/// A user's accept/reject action on one recommended item
///
/// Identified by `(user_id, item_id)`: a new event for the same pair
/// supersedes the prior one in the feedback store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub user_id: String,
    pub item_id: String,
    pub domain: Domain,
    pub polarity: Polarity,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub signals: HashMap<String, SignalValue>,
}

impl FeedbackEvent {
    /// Looks up a raw signal value by field name
    pub fn signal(&self, field: &str) -> Option<&SignalValue> {
        self.signals.get(field)
    }
}

/// Minimal projection of a feedback event used for uniqueness decisions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub item_id: String,
    pub polarity: Polarity,
    pub timestamp: DateTime<Utc>,
}

/// A normalized signal token with its occurrence count and relative weight
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TokenWeight {
    pub token: String,
    pub count: u32,
    /// `count / max count`, always in (0, 1]
    pub weight: f64,
}

/// Ranked preference vector derived from a feedback window
///
/// Ephemeral: recomputed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PreferenceVector {
    pub domain: Domain,
    /// Tokens ordered by descending count, ties broken by first-seen order
    pub tokens: Vec<TokenWeight>,
}

impl PreferenceVector {
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Top `n` tokens in rank order
    pub fn top_tokens(&self, n: usize) -> Vec<String> {
        self.tokens.iter().take(n).map(|t| t.token.clone()).collect()
    }
}

/// Proposed change to a user's stored preferences
///
/// Absent fields are left untouched; present fields are unioned into the
/// existing record, never replacing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreferenceDelta {
    #[serde(default)]
    pub genres: Option<Vec<String>>,
    #[serde(default)]
    pub artists: Option<Vec<String>>,
    #[serde(default)]
    pub directors: Option<Vec<String>>,
}

impl PreferenceDelta {
    pub fn is_empty(&self) -> bool {
        fn blank(field: &Option<Vec<String>>) -> bool {
            field.as_ref().map(|v| v.is_empty()).unwrap_or(true)
        }
        blank(&self.genres) && blank(&self.artists) && blank(&self.directors)
    }
}

/// Result of an inference proposal
#[derive(Debug, Clone, Deserialize)]
pub struct ProposedUpdate {
    pub preferences: PreferenceDelta,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Durable per-user, per-domain preference record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredPreferences {
    pub genres: Vec<String>,
    pub artists: Vec<String>,
    pub directors: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

impl Default for StoredPreferences {
    fn default() -> Self {
        Self {
            genres: Vec::new(),
            artists: Vec::new(),
            directors: Vec::new(),
            updated_at: Utc::now(),
        }
    }
}

impl StoredPreferences {
    /// Merges a delta into this record field-wise and stamps the update time
    ///
    /// Existing values are retained; incoming values are appended only when
    /// not already present (case-insensitive), so applying the same delta
    /// twice yields the same record as applying it once.
    pub fn merge(&mut self, delta: &PreferenceDelta) -> bool {
        let mut changed = false;
        if let Some(genres) = &delta.genres {
            changed |= Self::union_into(&mut self.genres, genres);
        }
        if let Some(artists) = &delta.artists {
            changed |= Self::union_into(&mut self.artists, artists);
        }
        if let Some(directors) = &delta.directors {
            changed |= Self::union_into(&mut self.directors, directors);
        }
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }

    fn union_into(existing: &mut Vec<String>, incoming: &[String]) -> bool {
        let mut changed = false;
        for value in incoming {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if !existing.iter().any(|e| e.eq_ignore_ascii_case(value)) {
                existing.push(value.to_string());
                changed = true;
            }
        }
        changed
    }
}

/// Human-readable taste synthesis for one content domain
///
/// A read view recomputed on every request, never a source of truth.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TasteProfile {
    pub domain: Domain,
    pub genres: Vec<String>,
    /// At most three moods, in preference vector order
    pub moods: Vec<String>,
    pub style: String,
    /// 1..=10
    pub intensity: u8,
    /// 0..=10
    pub variety: u8,
}

/// Cross-domain profile summary returned to callers
#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub name: String,
    pub description: String,
    pub music: Option<TasteProfile>,
    pub film: Option<TasteProfile>,
}

/// A candidate recommendation as the uniqueness filter sees it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub item_id: String,
    pub title: String,
    pub domain: Domain,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_value_from_plain_string() {
        let value: SignalValue = serde_json::from_str(r#""Rock, Metal""#).unwrap();
        assert_eq!(value, SignalValue::Text("Rock, Metal".to_string()));
    }

    #[test]
    fn test_signal_value_from_array() {
        let value: SignalValue = serde_json::from_str(r#"["Rock", "Metal"]"#).unwrap();
        assert_eq!(
            value,
            SignalValue::List(vec!["Rock".to_string(), "Metal".to_string()])
        );
    }

    #[test]
    fn test_signal_value_from_unexpected_shape() {
        let value: SignalValue = serde_json::from_str(r#"{"nested": true}"#).unwrap();
        assert!(matches!(value, SignalValue::Other(_)));
    }

    #[test]
    fn test_preferences_merge_retains_existing() {
        let mut prefs = StoredPreferences {
            genres: vec!["Rock".to_string()],
            ..Default::default()
        };
        let delta = PreferenceDelta {
            genres: Some(vec!["Jazz".to_string()]),
            ..Default::default()
        };
        assert!(prefs.merge(&delta));
        assert_eq!(prefs.genres, vec!["Rock".to_string(), "Jazz".to_string()]);
    }

    #[test]
    fn test_preferences_merge_is_idempotent() {
        let mut prefs = StoredPreferences::default();
        let delta = PreferenceDelta {
            genres: Some(vec!["Rock".to_string(), "rock".to_string()]),
            artists: Some(vec!["Queen".to_string()]),
            ..Default::default()
        };
        assert!(prefs.merge(&delta));
        let once = (prefs.genres.clone(), prefs.artists.clone());
        assert!(!prefs.merge(&delta));
        assert_eq!((prefs.genres.clone(), prefs.artists.clone()), once);
        assert_eq!(prefs.genres, vec!["Rock".to_string()]);
    }

    #[test]
    fn test_empty_delta() {
        assert!(PreferenceDelta::default().is_empty());
        let delta = PreferenceDelta {
            genres: Some(Vec::new()),
            ..Default::default()
        };
        assert!(delta.is_empty());
        let delta = PreferenceDelta {
            artists: Some(vec!["Queen".to_string()]),
            ..Default::default()
        };
        assert!(!delta.is_empty());
    }

    #[test]
    fn test_domain_round_trip() {
        assert_eq!("music".parse::<Domain>().unwrap(), Domain::Music);
        assert_eq!(Domain::Film.to_string(), "film");
        assert!("opera".parse::<Domain>().is_err());
    }
}
