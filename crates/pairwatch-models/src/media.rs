use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Catalog media type. Stored lowercase (`movie` / `tv`).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    /// The type to retry with when a lookup under `self` fails.
    pub fn other(&self) -> MediaType {
        match self {
            MediaType::Movie => MediaType::Tv,
            MediaType::Tv => MediaType::Movie,
        }
    }
}

impl Default for MediaType {
    fn default() -> Self {
        MediaType::Movie
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown media type '{0}' (expected 'movie' or 'tv')")]
pub struct ParseMediaTypeError(pub String);

impl FromStr for MediaType {
    type Err = ParseMediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "movie" => Ok(MediaType::Movie),
            "tv" | "show" | "series" => Ok(MediaType::Tv),
            _ => Err(ParseMediaTypeError(s.to_string())),
        }
    }
}
