use serde::{Deserialize, Deserializer};

/// Catalog identifier. Older documents store it as a string, newer ones as a number.
pub type TmdbId = u64;

/// Accepts both `123` and `"123"`.
pub fn deserialize<'de, D>(deserializer: D) -> Result<TmdbId, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| serde::de::Error::custom(format!("invalid tmdb id '{}'", s))),
    }
}

pub fn serialize<S>(id: &TmdbId, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    serializer.serialize_u64(*id)
}
