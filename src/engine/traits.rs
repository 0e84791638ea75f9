use std::sync::Arc;

use async_trait::async_trait;

use crate::errors::EnrichmentError;

/// Whether the engine can currently serve requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Availability {
    Available,
    Unavailable(String),
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::Available)
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Availability::Available => None,
            Availability::Unavailable(reason) => Some(reason),
        }
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SummaryEngine: Send + Sync {
    fn availability(&self) -> Availability;

    /// Generate a single text result for `prompt` under `instructions`
    async fn summarize(&self, instructions: &str, prompt: &str) -> Result<String, EnrichmentError>;
}

#[async_trait]
impl<T: SummaryEngine + ?Sized> SummaryEngine for Arc<T> {
    fn availability(&self) -> Availability {
        (**self).availability()
    }

    async fn summarize(&self, instructions: &str, prompt: &str) -> Result<String, EnrichmentError> {
        (**self).summarize(instructions, prompt).await
    }
}

/// Engine used when no summarizer is configured on this host
#[derive(Debug, Clone, Default)]
pub struct UnavailableEngine {
    reason: String,
}

impl UnavailableEngine {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[async_trait]
impl SummaryEngine for UnavailableEngine {
    fn availability(&self) -> Availability {
        Availability::Unavailable(self.reason.clone())
    }

    async fn summarize(&self, _instructions: &str, _prompt: &str) -> Result<String, EnrichmentError> {
        Err(EnrichmentError::Unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_engine() {
        let engine = UnavailableEngine::new("SUMMARIZER_URL is not set");

        assert_eq!(engine.availability().reason(), Some("SUMMARIZER_URL is not set"));
        assert_eq!(
            engine.summarize("instructions", "prompt").await,
            Err(EnrichmentError::Unavailable("SUMMARIZER_URL is not set".to_string()))
        );
    }

    #[tokio::test]
    async fn test_shared_engine_delegates() {
        let engine: Arc<dyn SummaryEngine> = Arc::new(UnavailableEngine::new("offline"));
        assert!(!engine.availability().is_available());
        assert!(engine.summarize("i", "p").await.is_err());
    }
}
