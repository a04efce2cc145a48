use thiserror::Error;

/// Failures surfaced while loading feeds or configuration.
/// None of these stop the map from drawing; they become notices.
#[derive(Debug, Error)]
pub enum MapError {
    /// Request rejected, non-success status, or unreadable local file
    #[error("could not fetch {url}: {reason}")]
    NetworkFailure { url: String, reason: String },

    /// The document itself is not a usable feature collection
    #[error("malformed feed data: {0}")]
    MalformedData(String),

    /// No tile access token configured
    #[error("no tile access token (set MAPBOX_ACCESS_TOKEN or access_token in the config file)")]
    MissingCredential,

    #[error("config error: {0}")]
    Config(String),
}

impl MapError {
    pub fn network(url: &str, reason: impl ToString) -> Self {
        Self::NetworkFailure {
            url: url.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type MapResult<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_failure_names_the_url() {
        let err = MapError::network("https://example.invalid/feed", "HTTP 503");
        let msg = err.to_string();
        assert!(msg.contains("https://example.invalid/feed"));
        assert!(msg.contains("HTTP 503"));
    }

    #[test]
    fn missing_credential_mentions_env_var() {
        assert!(MapError::MissingCredential.to_string().contains("MAPBOX_ACCESS_TOKEN"));
    }
}
