/// Failure talking to a remote boundary (document store or metadata API).
///
/// `Clone` so a single in-flight request can hand the same error to every
/// caller waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(String),
    #[error("{service} returned {status}: {body}")]
    Status {
        service: &'static str,
        status: u16,
        body: String,
    },
    #[error("not found: {0}")]
    NotFound(String),
    #[error("failed to decode response: {0}")]
    Decode(String),
    #[error("document store error: {0}")]
    Store(String),
    #[error("configuration error: {0}")]
    Config(String),
}

impl SourceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_))
            || matches!(self, SourceError::Status { status: 404, .. })
    }
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SourceError::Decode(e.to_string())
        } else {
            SourceError::Http(e.to_string())
        }
    }
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        SourceError::Decode(e.to_string())
    }
}

impl From<std::io::Error> for SourceError {
    fn from(e: std::io::Error) -> Self {
        SourceError::Store(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_covers_404_status() {
        assert!(SourceError::NotFound("movie/1".to_string()).is_not_found());
        assert!(SourceError::Status { service: "tmdb", status: 404, body: String::new() }.is_not_found());
        assert!(!SourceError::Status { service: "tmdb", status: 500, body: String::new() }.is_not_found());
    }
}
