// StudioScript Script Parameters
// Copyright (c) 2026 StudioScript
//
// Form parameters shared by the screenplay and ad flows, plus the offline
// template generators used when the LLM is unavailable.

pub mod ad;
pub mod screenplay;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub use ad::generate_ad_script;
pub use screenplay::generate_script;

/// Tone of the piece, as offered by the creation forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Tone {
    #[default]
    Serious,
    Comedic,
    Suspenseful,
    Romantic,
    Dark,
    Lighthearted,
}

impl Tone {
    pub const ALL: [Tone; 6] = [
        Tone::Serious,
        Tone::Comedic,
        Tone::Suspenseful,
        Tone::Romantic,
        Tone::Dark,
        Tone::Lighthearted,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Serious => "Serious",
            Tone::Comedic => "Comedic",
            Tone::Suspenseful => "Suspenseful",
            Tone::Romantic => "Romantic",
            Tone::Dark => "Dark",
            Tone::Lighthearted => "Lighthearted",
        }
    }
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Tone {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Tone::ALL
            .iter()
            .copied()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "Invalid tone '{}'. Expected one of: {}",
                    wanted,
                    join_names(Tone::ALL.iter().map(Tone::as_str))
                )
            })
    }
}

/// Genre (or ad category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Genre {
    Action,
    #[default]
    Drama,
    Thriller,
    #[serde(rename = "Sci-Fi")]
    SciFi,
    Fantasy,
    Horror,
    Romance,
    Comedy,
}

impl Genre {
    pub const ALL: [Genre; 8] = [
        Genre::Action,
        Genre::Drama,
        Genre::Thriller,
        Genre::SciFi,
        Genre::Fantasy,
        Genre::Horror,
        Genre::Romance,
        Genre::Comedy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Action => "Action",
            Genre::Drama => "Drama",
            Genre::Thriller => "Thriller",
            Genre::SciFi => "Sci-Fi",
            Genre::Fantasy => "Fantasy",
            Genre::Horror => "Horror",
            Genre::Romance => "Romance",
            Genre::Comedy => "Comedy",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Genre {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let squashed: String = wanted
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect();
        if squashed.eq_ignore_ascii_case("scifi") {
            return Ok(Genre::SciFi);
        }
        Genre::ALL
            .iter()
            .copied()
            .find(|g| g.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| {
                format!(
                    "Invalid genre '{}'. Expected one of: {}",
                    wanted,
                    join_names(Genre::ALL.iter().map(Genre::as_str))
                )
            })
    }
}

/// Feature length in minutes (roughly one page per minute).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FeatureDuration(u32);

impl FeatureDuration {
    pub const ALLOWED: [u32; 4] = [60, 90, 120, 150];

    pub fn minutes(&self) -> u32 {
        self.0
    }
}

impl Default for FeatureDuration {
    fn default() -> Self {
        Self(90)
    }
}

impl TryFrom<u32> for FeatureDuration {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if Self::ALLOWED.contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "Invalid duration {}. Expected one of: {} (minutes)",
                value,
                join_names(Self::ALLOWED.iter())
            ))
        }
    }
}

impl From<FeatureDuration> for u32 {
    fn from(d: FeatureDuration) -> Self {
        d.0
    }
}

impl FromStr for FeatureDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .trim_end_matches("min")
            .trim()
            .parse()
            .map_err(|_| format!("Invalid duration '{}'", s))?;
        Self::try_from(value)
    }
}

impl fmt::Display for FeatureDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ad spot length in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct AdDuration(u32);

impl AdDuration {
    pub const ALLOWED: [u32; 5] = [30, 45, 60, 90, 120];

    pub fn seconds(&self) -> u32 {
        self.0
    }
}

impl Default for AdDuration {
    fn default() -> Self {
        Self(30)
    }
}

impl TryFrom<u32> for AdDuration {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        if Self::ALLOWED.contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!(
                "Invalid durationSeconds {}. Expected one of: {} (seconds)",
                value,
                join_names(Self::ALLOWED.iter())
            ))
        }
    }
}

impl From<AdDuration> for u32 {
    fn from(d: AdDuration) -> Self {
        d.0
    }
}

impl FromStr for AdDuration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value: u32 = s
            .trim()
            .trim_end_matches('s')
            .trim()
            .parse()
            .map_err(|_| format!("Invalid duration '{}'", s))?;
        Self::try_from(value)
    }
}

impl fmt::Display for AdDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Screenplay request as submitted by the create form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ScriptInput {
    pub summary: String,
    pub duration: FeatureDuration,
    pub tone: Tone,
    pub genre: Genre,
}

impl ScriptInput {
    pub fn validate(&self) -> Result<(), String> {
        require_summary(&self.summary)
    }
}

/// Ad request as submitted by the ad form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AdScriptInput {
    pub summary: String,
    #[serde(rename = "durationSeconds")]
    pub duration_seconds: AdDuration,
    pub tone: Tone,
    pub genre: Genre,
}

impl AdScriptInput {
    pub fn validate(&self) -> Result<(), String> {
        require_summary(&self.summary)
    }
}

fn require_summary(summary: &str) -> Result<(), String> {
    if summary.trim().is_empty() {
        Err("Summary must not be empty".to_string())
    } else {
        Ok(())
    }
}

/// Trims the summary and folds every run of newlines into a single space.
pub(crate) fn collapse_summary(summary: &str) -> String {
    let mut out = String::with_capacity(summary.len());
    let mut in_break = false;
    for c in summary.trim().chars() {
        if c == '\n' {
            if !in_break {
                out.push(' ');
                in_break = true;
            }
        } else {
            out.push(c);
            in_break = false;
        }
    }
    out
}

fn join_names<T: fmt::Display>(items: impl Iterator<Item = T>) -> String {
    items.map(|i| i.to_string()).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tone_parse_is_case_insensitive() {
        assert_eq!("dark".parse::<Tone>(), Ok(Tone::Dark));
        assert_eq!(" LightHearted ".parse::<Tone>(), Ok(Tone::Lighthearted));
        assert!("grim".parse::<Tone>().is_err());
    }

    #[test]
    fn test_genre_scifi_spellings() {
        for s in ["Sci-Fi", "scifi", "sci fi", "SCI_FI"] {
            assert_eq!(s.parse::<Genre>(), Ok(Genre::SciFi), "spelling {}", s);
        }
        assert_eq!(Genre::SciFi.to_string(), "Sci-Fi");
        let err = "western".parse::<Genre>().unwrap_err();
        assert!(err.contains("Sci-Fi"));
    }

    #[test]
    fn test_durations_reject_values_outside_the_form() {
        assert!(FeatureDuration::try_from(90).is_ok());
        assert!(FeatureDuration::try_from(45).is_err());
        assert!(AdDuration::try_from(45).is_ok());
        assert!(AdDuration::try_from(150).is_err());
        assert_eq!("120min".parse::<FeatureDuration>().map(|d| d.minutes()), Ok(120));
        assert_eq!("60s".parse::<AdDuration>().map(|d| d.seconds()), Ok(60));
    }

    #[test]
    fn test_ad_meta_uses_duration_seconds_key() {
        let input = AdScriptInput {
            summary: "A bike".into(),
            duration_seconds: AdDuration::try_from(45).unwrap(),
            tone: Tone::Comedic,
            genre: Genre::SciFi,
        };
        let json = serde_json::to_value(&input).unwrap();
        assert_eq!(json["durationSeconds"], 45);
        assert_eq!(json["genre"], "Sci-Fi");

        let back: AdScriptInput = serde_json::from_value(json).unwrap();
        assert_eq!(back, input);
    }

    #[test]
    fn test_bad_duration_in_json_is_rejected() {
        let raw = r#"{"summary":"x","duration":75,"tone":"Dark","genre":"Drama"}"#;
        assert!(serde_json::from_str::<ScriptInput>(raw).is_err());
    }

    #[test]
    fn test_collapse_summary() {
        assert_eq!(collapse_summary("  one\n\n\ntwo\nthree  "), "one two three");
        assert_eq!(collapse_summary("\n\n"), "");
    }

    #[test]
    fn test_validate_blank_summary() {
        let input = ScriptInput {
            summary: "   ".into(),
            ..Default::default()
        };
        assert!(input.validate().is_err());
    }
}
