use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Global rating status for a piece of content.
///
/// `Yes`/`No` are the capitalised values written by the swipe flow and are kept
/// verbatim so existing documents keep deserialising.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum InteractionStatus {
    #[serde(rename = "liked")]
    Liked,
    #[serde(rename = "not_important")]
    NotImportant,
    #[serde(rename = "wont_watch")]
    WontWatch,
    #[serde(rename = "watched")]
    Watched,
    #[serde(rename = "Yes")]
    Yes,
    #[serde(rename = "No")]
    No,
}

impl InteractionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionStatus::Liked => "liked",
            InteractionStatus::NotImportant => "not_important",
            InteractionStatus::WontWatch => "wont_watch",
            InteractionStatus::Watched => "watched",
            InteractionStatus::Yes => "Yes",
            InteractionStatus::No => "No",
        }
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rating status inside a single bundle.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum BundleStatus {
    Yes,
    NotNow,
    Never,
}

impl BundleStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BundleStatus::Yes => "yes",
            BundleStatus::NotNow => "not_now",
            BundleStatus::Never => "never",
        }
    }
}

impl fmt::Display for BundleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {scope} status '{value}'")]
pub struct ParseStatusError {
    pub scope: &'static str,
    pub value: String,
}

impl FromStr for InteractionStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Exact stored values first, then lenient CLI spellings.
        match s.trim() {
            "liked" => return Ok(InteractionStatus::Liked),
            "not_important" => return Ok(InteractionStatus::NotImportant),
            "wont_watch" => return Ok(InteractionStatus::WontWatch),
            "watched" => return Ok(InteractionStatus::Watched),
            "Yes" => return Ok(InteractionStatus::Yes),
            "No" => return Ok(InteractionStatus::No),
            _ => {}
        }
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "like" | "liked" => Ok(InteractionStatus::Liked),
            "not_important" => Ok(InteractionStatus::NotImportant),
            "wont_watch" | "won't_watch" => Ok(InteractionStatus::WontWatch),
            "watched" => Ok(InteractionStatus::Watched),
            "yes" => Ok(InteractionStatus::Yes),
            "no" => Ok(InteractionStatus::No),
            _ => Err(ParseStatusError {
                scope: "interaction",
                value: s.to_string(),
            }),
        }
    }
}

impl FromStr for BundleStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "yes" => Ok(BundleStatus::Yes),
            "not_now" => Ok(BundleStatus::NotNow),
            "never" => Ok(BundleStatus::Never),
            _ => Err(ParseStatusError {
                scope: "bundle",
                value: s.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interaction_status_keeps_capitalised_legacy_values() {
        let json = serde_json::to_string(&InteractionStatus::Yes).unwrap();
        assert_eq!(json, "\"Yes\"");
        let parsed: InteractionStatus = serde_json::from_str("\"wont_watch\"").unwrap();
        assert_eq!(parsed, InteractionStatus::WontWatch);
    }

    #[test]
    fn test_unknown_status_is_rejected() {
        assert!(serde_json::from_str::<InteractionStatus>("\"maybe\"").is_err());
        assert!("maybe".parse::<BundleStatus>().is_err());
    }

    #[test]
    fn test_bundle_status_from_cli_spelling() {
        assert_eq!("not-now".parse::<BundleStatus>().unwrap(), BundleStatus::NotNow);
        assert_eq!("NEVER".parse::<BundleStatus>().unwrap(), BundleStatus::Never);
    }
}
