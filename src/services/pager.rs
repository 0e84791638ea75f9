use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;

use crate::domain::{FeedPhase, FeedSnapshot, Record};
use crate::errors::FetchError;
use crate::sources::ContentSource;

/// How many rows before the end of the list trigger a prefetch
pub const NEAR_END_THRESHOLD: usize = 3;

struct PagerState {
    items: Vec<Record>,
    ids: HashSet<String>,
    cursor: u32,
    has_more: bool,
    phase: FeedPhase,
    error: Option<FetchError>,
    // Bumped on every reset; completions from older generations are dropped
    generation: u64,
}

impl PagerState {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            ids: HashSet::new(),
            cursor: 1,
            has_more: true,
            phase: FeedPhase::Idle,
            error: None,
            generation: 0,
        }
    }

    fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            items: self.items.clone(),
            cursor: self.cursor,
            has_more: self.has_more,
            phase: self.phase,
            error: self.error.clone(),
        }
    }

    /// Append the unseen part of `batch`; returns how many were added
    fn append_unique(&mut self, batch: Vec<Record>) -> usize {
        let before = self.items.len();
        for record in batch {
            if self.ids.insert(record.id.clone()) {
                self.items.push(record);
            }
        }
        self.items.len() - before
    }
}

/// Ordered, deduplicated, cursor-paged view over a content source.
///
/// All state lives behind one mutex that is never held across an await, so
/// the pager can be shared via `Arc` and driven from several tasks.
pub struct FeedPager<S: ContentSource> {
    source: S,
    page_size: usize,
    strategy: String,
    state: Mutex<PagerState>,
    updates: watch::Sender<FeedSnapshot>,
}

impl<S: ContentSource> FeedPager<S> {
    pub fn new(source: S, page_size: usize, strategy: impl Into<String>) -> Self {
        let (updates, _) = watch::channel(FeedSnapshot::default());

        Self {
            source,
            page_size: page_size.max(1),
            strategy: strategy.into(),
            state: Mutex::new(PagerState::new()),
            updates,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn strategy(&self) -> &str {
        &self.strategy
    }

    /// Latest published state
    pub fn snapshot(&self) -> FeedSnapshot {
        self.updates.borrow().clone()
    }

    /// Snapshots are published while the pager's lock is held; read from the
    /// snapshot rather than calling back into the pager while holding a borrow.
    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.updates.subscribe()
    }

    pub fn items(&self) -> Vec<Record> {
        self.lock().items.clone()
    }

    pub fn cursor(&self) -> u32 {
        self.lock().cursor
    }

    pub fn has_more(&self) -> bool {
        self.lock().has_more
    }

    pub fn phase(&self) -> FeedPhase {
        self.lock().phase
    }

    pub fn error(&self) -> Option<FetchError> {
        self.lock().error.clone()
    }

    fn lock(&self) -> MutexGuard<'_, PagerState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn publish(&self, state: &PagerState) {
        self.updates.send_replace(state.snapshot());
    }

    /// Fetch the page at the cursor, or start over from page 1 when `reset`.
    ///
    /// A non-reset call while another load or a refresh is outstanding
    /// returns `Ok(())` without touching the source.
    pub async fn load_next_page(&self, reset: bool) -> Result<(), FetchError> {
        let (page, generation) = {
            let mut state = self.lock();

            if reset {
                state.items.clear();
                state.ids.clear();
                state.cursor = 1;
                state.has_more = true;
                state.phase = FeedPhase::Refreshing;
                state.generation += 1;
            } else if state.phase.is_loading() {
                tracing::debug!(phase = %state.phase, "load already outstanding, skipping");
                return Ok(());
            } else {
                state.phase = if state.cursor == 1 {
                    FeedPhase::LoadingFirstPage
                } else {
                    FeedPhase::LoadingNextPage
                };
            }

            self.publish(&state);
            (state.cursor, state.generation)
        };

        tracing::debug!(page, per_page = self.page_size, strategy = %self.strategy, reset, "fetching page");

        let mut guard = LoadGuard {
            pager: self,
            generation,
            armed: true,
        };
        let result = self
            .source
            .fetch_page(page, self.page_size, &self.strategy)
            .await;
        guard.armed = false;

        let mut state = self.lock();

        if state.generation != generation {
            tracing::debug!(page, "page superseded by a refresh, discarding");
            return result.map(|_| ());
        }

        let outcome = match result {
            Ok(batch) => {
                let fetched = batch.len();
                let added = state.append_unique(batch);

                state.has_more = fetched == self.page_size;
                if fetched > 0 && state.has_more {
                    state.cursor += 1;
                }
                state.error = None;

                tracing::info!(
                    page,
                    fetched,
                    added,
                    duplicates = fetched - added,
                    has_more = state.has_more,
                    "page applied"
                );
                Ok(())
            }
            Err(err) => {
                tracing::warn!(page, error = %err, "page fetch failed");
                state.error = Some(err.clone());
                Err(err)
            }
        };

        state.phase = FeedPhase::Idle;
        self.publish(&state);
        outcome
    }

    /// Prefetch when `visible_id` is within the last few rows.
    pub async fn load_more_if_needed(&self, visible_id: &str) -> Result<(), FetchError> {
        let should_load = {
            let state = self.lock();
            let threshold = state.items.len().saturating_sub(NEAR_END_THRESHOLD);

            state.has_more
                && state
                    .items
                    .iter()
                    .position(|r| r.id == visible_id)
                    .is_some_and(|index| index >= threshold)
        };

        if should_load {
            self.load_next_page(false).await
        } else {
            Ok(())
        }
    }
}

/// Returns the pager to idle if a load future is dropped mid-fetch
struct LoadGuard<'a, S: ContentSource> {
    pager: &'a FeedPager<S>,
    generation: u64,
    armed: bool,
}

impl<S: ContentSource> Drop for LoadGuard<'_, S> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let mut state = self.pager.lock();
        if state.generation == self.generation && state.phase.is_loading() {
            tracing::debug!("load cancelled before completion");
            state.phase = FeedPhase::Idle;
            self.pager.publish(&state);
        }
    }
}
