use serde::{Deserialize, Serialize};

use crate::domain::Record;
use crate::errors::FetchError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedPhase {
    #[default]
    Idle,
    LoadingFirstPage,
    LoadingNextPage,
    Refreshing,
}

impl FeedPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedPhase::Idle => "idle",
            FeedPhase::LoadingFirstPage => "loading_first_page",
            FeedPhase::LoadingNextPage => "loading_next_page",
            FeedPhase::Refreshing => "refreshing",
        }
    }

    pub fn is_loading(&self) -> bool {
        !matches!(self, FeedPhase::Idle)
    }
}

impl std::fmt::Display for FeedPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Read-only view of the pager, published after every mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub items: Vec<Record>,
    pub cursor: u32,
    pub has_more: bool,
    pub phase: FeedPhase,
    pub error: Option<FetchError>,
}

impl FeedSnapshot {
    pub fn is_loading_next_page(&self) -> bool {
        self.phase == FeedPhase::LoadingNextPage
    }
}

impl Default for FeedSnapshot {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            cursor: 1,
            has_more: true,
            phase: FeedPhase::Idle,
            error: None,
        }
    }
}
