use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::watch;

use crate::domain::{normalize_summary, EnrichmentState, Record};
use crate::engine::{build_prompt, Availability, SummaryEngine, INSTRUCTIONS};
use crate::errors::EnrichmentError;

enum Entry {
    InFlight { ticket: u64 },
    Ready(String),
    Failed(String),
}

impl Entry {
    fn state(&self) -> EnrichmentState {
        match self {
            Entry::InFlight { .. } => EnrichmentState::InFlight,
            Entry::Ready(text) => EnrichmentState::Ready(text.clone()),
            Entry::Failed(reason) => EnrichmentState::Failed(reason.clone()),
        }
    }
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<String, Entry>,
    next_ticket: u64,
}

struct Inner<E> {
    engine: E,
    availability: Mutex<Availability>,
    state: Mutex<CacheState>,
    updates: watch::Sender<u64>,
}

/// Per-record summary states, with at most one engine call in flight per id.
///
/// Cloning is cheap and every clone shares the same map.
pub struct EnrichmentCache<E: SummaryEngine + 'static> {
    inner: Arc<Inner<E>>,
}

impl<E: SummaryEngine + 'static> Clone for EnrichmentCache<E> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<E: SummaryEngine + 'static> EnrichmentCache<E> {
    pub fn new(engine: E) -> Self {
        let availability = engine.availability();
        if let Some(reason) = availability.reason() {
            tracing::info!(%reason, "summarizer unavailable");
        }

        let (updates, _) = watch::channel(0);

        Self {
            inner: Arc::new(Inner {
                engine,
                availability: Mutex::new(availability),
                state: Mutex::new(CacheState::default()),
                updates,
            }),
        }
    }

    pub fn engine(&self) -> &E {
        &self.inner.engine
    }

    /// Availability as of construction or the last re-check
    pub fn availability(&self) -> Availability {
        self.inner
            .availability
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn is_engine_available(&self) -> bool {
        self.availability().is_available()
    }

    pub fn recheck_availability(&self) -> bool {
        let availability = self.inner.engine.availability();
        let available = availability.is_available();
        self.store_availability(availability);
        available
    }

    fn store_availability(&self, availability: Availability) {
        *self
            .inner
            .availability
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = availability;
    }

    /// Revision counter, bumped on every state change
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.inner.updates.subscribe()
    }

    pub fn query(&self, id: &str) -> EnrichmentState {
        self.lock()
            .entries
            .get(id)
            .map(Entry::state)
            .unwrap_or_default()
    }

    /// Every identity that is not `Absent`
    pub fn snapshot(&self) -> HashMap<String, EnrichmentState> {
        self.lock()
            .entries
            .iter()
            .map(|(id, entry)| (id.clone(), entry.state()))
            .collect()
    }

    /// Kick off enrichment in the background. No-op unless the record is `Absent`.
    pub fn start(&self, record: &Record) {
        let Some(ticket) = self.begin(&record.id) else {
            return;
        };

        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let cache = self.clone();
                let record = record.clone();
                handle.spawn(async move { cache.run(&record, ticket).await });
            }
            Err(err) => {
                self.complete(
                    &record.id,
                    ticket,
                    Err(EnrichmentError::Engine(format!("no async runtime: {}", err))),
                );
            }
        }
    }

    /// Like `start`, but resolves once the outcome has been applied or discarded
    pub async fn enrich(&self, record: &Record) {
        if let Some(ticket) = self.begin(&record.id) {
            self.run(record, ticket).await;
        }
    }

    /// Return `id` to `Absent`. An outstanding call for it will be ignored.
    pub fn clear(&self, id: &str) {
        let previous = self.lock().entries.remove(id);
        if let Some(previous) = previous {
            tracing::debug!(id, previous = %previous.state(), "enrichment cleared");
            self.notify();
        }
    }

    /// Drop state for every identity not in `ids`
    pub fn retain<'a, I>(&self, ids: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        let keep: HashSet<&str> = ids.into_iter().collect();
        let evicted = {
            let mut state = self.lock();
            let before = state.entries.len();
            state.entries.retain(|id, _| keep.contains(id.as_str()));
            before - state.entries.len()
        };

        if evicted > 0 {
            tracing::debug!(evicted, "enrichment states evicted");
            self.notify();
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // Called with the state lock released, so observers may query from a watch callback
    fn notify(&self) {
        self.inner.updates.send_modify(|revision| *revision += 1);
    }

    /// Absent -> InFlight; returns the ticket the completion must present
    fn begin(&self, id: &str) -> Option<u64> {
        let ticket = {
            let mut state = self.lock();

            if let Some(existing) = state.entries.get(id) {
                tracing::trace!(id, state = %existing.state(), "enrichment already requested");
                return None;
            }

            state.next_ticket += 1;
            let ticket = state.next_ticket;
            state
                .entries
                .insert(id.to_string(), Entry::InFlight { ticket });
            ticket
        };
        self.notify();

        tracing::debug!(id, ticket, "enrichment started");
        Some(ticket)
    }

    async fn run(&self, record: &Record, ticket: u64) {
        let mut guard = RunGuard {
            cache: self,
            id: &record.id,
            ticket,
            armed: true,
        };

        let availability = self.inner.engine.availability();

        let result = match availability {
            Availability::Unavailable(reason) => {
                self.store_availability(Availability::Unavailable(reason.clone()));
                Err(EnrichmentError::Unavailable(reason))
            }
            Availability::Available => {
                let prompt = build_prompt(record);
                self.inner
                    .engine
                    .summarize(INSTRUCTIONS, &prompt)
                    .await
                    .map(|text| normalize_summary(&text))
            }
        };
        guard.armed = false;

        self.complete(&record.id, ticket, result);
    }

    fn complete(&self, id: &str, ticket: u64, result: Result<String, EnrichmentError>) {
        let mut state = self.lock();

        let current = matches!(
            state.entries.get(id),
            Some(Entry::InFlight { ticket: t }) if *t == ticket
        );
        if !current {
            tracing::debug!(id, ticket, "stale enrichment completion discarded");
            return;
        }

        let entry = match result {
            Ok(text) => {
                tracing::debug!(id, chars = text.chars().count(), "enrichment ready");
                Entry::Ready(text)
            }
            Err(err) => {
                tracing::warn!(id, error = %err, "enrichment failed");
                Entry::Failed(err.to_string())
            }
        };

        state.entries.insert(id.to_string(), entry);
        drop(state);
        self.notify();
    }
}

/// Returns the entry to `Absent` if `run` is dropped before the engine answers
struct RunGuard<'a, E: SummaryEngine + 'static> {
    cache: &'a EnrichmentCache<E>,
    id: &'a str,
    ticket: u64,
    armed: bool,
}

impl<E: SummaryEngine + 'static> Drop for RunGuard<'_, E> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        let removed = {
            let mut state = self.cache.lock();
            let current = matches!(
                state.entries.get(self.id),
                Some(Entry::InFlight { ticket }) if *ticket == self.ticket
            );
            current && state.entries.remove(self.id).is_some()
        };

        if removed {
            tracing::debug!(
                id = self.id,
                ticket = self.ticket,
                "enrichment cancelled before completion"
            );
            self.cache.notify();
        }
    }
}
