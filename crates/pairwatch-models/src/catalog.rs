use serde::{Deserialize, Serialize};
use crate::{ContentSnapshot, MediaType, TmdbId};

/// A search/trending/discover hit.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CatalogSummary {
    pub tmdb_id: TmdbId,
    pub media_type: MediaType,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub release_date: Option<String>,
}

impl CatalogSummary {
    pub fn snapshot(&self) -> ContentSnapshot {
        ContentSnapshot {
            title: Some(self.title.clone()),
            poster_path: self.poster_path.clone(),
            vote_average: self.vote_average,
            popularity: self.popularity,
            release_date: self.release_date.clone(),
        }
    }

    /// Year component of `release_date`, when present.
    pub fn year(&self) -> Option<u32> {
        self.release_date
            .as_deref()
            .and_then(|d| d.get(..4))
            .and_then(|y| y.parse().ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContentDetails {
    pub tmdb_id: TmdbId,
    pub media_type: MediaType,
    pub title: String,
    pub overview: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    pub release_date: Option<String>,
    pub runtime_minutes: Option<u32>,
    pub number_of_seasons: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    pub vote_average: Option<f64>,
    pub popularity: Option<f64>,
    pub imdb_id: Option<String>,
}

impl ContentDetails {
    pub fn snapshot(&self) -> ContentSnapshot {
        ContentSnapshot {
            title: Some(self.title.clone()),
            poster_path: self.poster_path.clone(),
            vote_average: self.vote_average,
            popularity: self.popularity,
            release_date: self.release_date.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ProviderOffer {
    pub provider_id: u64,
    pub name: String,
    pub logo_path: Option<String>,
}

/// Streaming offers for one region.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct WatchProviders {
    pub region: String,
    pub link: Option<String>,
    #[serde(default)]
    pub flatrate: Vec<ProviderOffer>,
    #[serde(default)]
    pub rent: Vec<ProviderOffer>,
    #[serde(default)]
    pub buy: Vec<ProviderOffer>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Video {
    pub key: String,
    pub name: String,
    pub site: String,
    pub kind: String,
    pub official: bool,
}

impl Video {
    pub fn is_youtube_trailer(&self) -> bool {
        self.site.eq_ignore_ascii_case("youtube") && self.kind.eq_ignore_ascii_case("trailer")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CastMember {
    pub name: String,
    pub character: Option<String>,
    pub profile_path: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Credits {
    #[serde(default)]
    pub cast: Vec<CastMember>,
    #[serde(default)]
    pub directors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ExternalIds {
    pub imdb_id: Option<String>,
    pub tvdb_id: Option<u64>,
}

/// Critic/audience scores from the ratings aggregator.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AggregatedRatings {
    pub imdb_rating: Option<f32>,
    pub imdb_votes: Option<u64>,
    /// Percentage, 0-100.
    pub rotten_tomatoes: Option<u8>,
    /// 0-100.
    pub metacritic: Option<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_year_and_snapshot() {
        let summary = CatalogSummary {
            tmdb_id: 603,
            media_type: MediaType::Movie,
            title: "The Matrix".to_string(),
            overview: None,
            poster_path: Some("/m.jpg".to_string()),
            vote_average: Some(8.2),
            popularity: None,
            release_date: Some("1999-03-30".to_string()),
        };
        assert_eq!(summary.year(), Some(1999));
        let snapshot = summary.snapshot();
        assert_eq!(snapshot.title.as_deref(), Some("The Matrix"));
        assert_eq!(snapshot.poster_path.as_deref(), Some("/m.jpg"));
    }
}
