use serde::{Deserialize, Serialize};

/// Summary state for a single record identity.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "text", rename_all = "snake_case")]
pub enum EnrichmentState {
    #[default]
    Absent,
    InFlight,
    Ready(String),
    Failed(String),
}

impl EnrichmentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnrichmentState::Absent => "absent",
            EnrichmentState::InFlight => "in_flight",
            EnrichmentState::Ready(_) => "ready",
            EnrichmentState::Failed(_) => "failed",
        }
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(self, EnrichmentState::InFlight)
    }

    /// Ready and Failed stay put until cleared
    pub fn is_settled(&self) -> bool {
        matches!(self, EnrichmentState::Ready(_) | EnrichmentState::Failed(_))
    }

    pub fn summary(&self) -> Option<&str> {
        match self {
            EnrichmentState::Ready(text) => Some(text),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            EnrichmentState::Failed(reason) => Some(reason),
            _ => None,
        }
    }
}

impl std::fmt::Display for EnrichmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Collapse an engine response into a single trimmed paragraph.
pub fn normalize_summary(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_collapses_breaks_and_tabs() {
        assert_eq!(
            normalize_summary("Line one\n\nLine   two\t\t"),
            "Line one Line two"
        );
    }

    #[test]
    fn test_normalize_handles_carriage_returns() {
        assert_eq!(normalize_summary("  a\r\nb\rc  "), "a b c");
    }

    #[test]
    fn test_normalize_empty() {
        assert_eq!(normalize_summary(" \n\t "), "");
    }

    #[test]
    fn test_state_accessors() {
        assert!(EnrichmentState::default() == EnrichmentState::Absent);
        assert!(EnrichmentState::InFlight.is_in_flight());
        assert!(EnrichmentState::Ready("x".into()).is_settled());
        assert_eq!(EnrichmentState::Ready("x".into()).summary(), Some("x"));
        assert_eq!(EnrichmentState::Failed("boom".into()).failure(), Some("boom"));
        assert_eq!(EnrichmentState::Failed("boom".into()).to_string(), "failed");
    }
}
