use thiserror::Error;

/// Failure reported by the content source while fetching a page or a record.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("{message}")]
    Server {
        status: u16,
        message: String,
        code: Option<String>,
    },

    #[error("Failed to decode response: {0}")]
    Decode(String),
}

impl FetchError {
    /// Machine-readable code supplied by the server, if any
    pub fn code(&self) -> Option<&str> {
        match self {
            FetchError::Server { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            FetchError::Decode(err.to_string())
        } else {
            FetchError::Network(err.to_string())
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EnrichmentError {
    #[error("Summarizer unavailable: {0}")]
    Unavailable(String),

    #[error("Summarization failed: {0}")]
    Engine(String),
}

#[derive(Error, Debug)]
pub enum TabfeedError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid article reference: {0}")]
    InvalidTarget(String),

    // Component errors
    #[error(transparent)]
    Fetch(#[from] FetchError),

    // Network errors
    #[error("HTTP client setup failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type TabfeedResult<T> = Result<T, TabfeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_displays_message_verbatim() {
        let err = FetchError::Server {
            status: 404,
            message: "Não foi encontrado nenhum conteúdo.".to_string(),
            code: Some("CONTENT_NOT_FOUND".to_string()),
        };

        assert_eq!(err.to_string(), "Não foi encontrado nenhum conteúdo.");
        assert_eq!(err.code(), Some("CONTENT_NOT_FOUND"));
    }

    #[test]
    fn test_network_error_has_no_code() {
        let err = FetchError::Network("connection refused".to_string());
        assert_eq!(err.code(), None);
        assert_eq!(err.to_string(), "Network error: connection refused");
    }

    #[test]
    fn test_fetch_error_wraps_into_top_level() {
        let err: TabfeedError = FetchError::Decode("missing field `id`".to_string()).into();
        assert_eq!(err.to_string(), "Failed to decode response: missing field `id`");
    }
}
