//! Search sessions with last-writer-wins publication.
//!
//! Every [`SearchSession::issue`] call supersedes the searches issued before
//! it. A superseded search is asked to stop through its cancellation flag,
//! and if it completes anyway its results are discarded: what gets published
//! follows issuance order, never completion order.

use crate::catalog::Catalog;
use crate::codepoint_ty::Codepoint;
use crate::model::UnicodeCharacter;
use log::debug;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

/// One issued search.
#[derive(Debug, Clone)]
pub struct SearchTicket {
    generation: u64,
    query: String,
    limit: usize,
    cancelled: Arc<AtomicBool>,
}

impl SearchTicket {
    /// Issuance number; later searches have larger numbers.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// The query text.
    pub fn query(&self) -> &str {
        &self.query
    }

    /// Returns whether a newer search has superseded this one.
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    fn cancel(&self) {
        self.cancelled.store(true, Ordering::Release);
    }
}

/// The published state of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchSnapshot {
    /// Generation of the search these fields belong to.
    pub generation: u64,
    /// Query of that search.
    pub query: String,
    /// Results, empty while loading.
    pub results: Vec<UnicodeCharacter>,
    /// Whether the latest search is still running.
    pub loading: bool,
}

impl SearchSnapshot {
    /// Codepoints of the published results.
    pub fn codepoints(&self) -> Vec<Codepoint> {
        self.results.iter().map(|ch| ch.codepoint).collect()
    }
}

#[derive(Debug, Default)]
struct SessionState {
    latest: Option<SearchTicket>,
    published: SearchSnapshot,
}

/// Tracks the latest search issued by one caller.
#[derive(Debug)]
pub struct SearchSession {
    limit: usize,
    issued: AtomicU64,
    state: Mutex<SessionState>,
}

impl SearchSession {
    /// Creates a session whose searches return at most `limit` results.
    pub fn new(limit: usize) -> Self {
        SearchSession {
            limit,
            issued: AtomicU64::new(0),
            state: Mutex::new(SessionState::default()),
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Starts a new search, superseding any search in flight.
    ///
    /// Published results are cleared immediately. An empty query stays
    /// published as "done, no results".
    pub fn issue(&self, query: &str) -> SearchTicket {
        let mut state = self.lock_state();
        let generation = self.issued.fetch_add(1, Ordering::AcqRel) + 1;
        let ticket = SearchTicket {
            generation,
            query: query.to_owned(),
            limit: self.limit,
            cancelled: Arc::new(AtomicBool::new(false)),
        };
        if let Some(previous) = state.latest.replace(ticket.clone()) {
            debug!(
                "search #{} ({:?}) superseded by #{}",
                previous.generation, previous.query, generation
            );
            previous.cancel();
        }
        state.published = SearchSnapshot {
            generation,
            query: query.to_owned(),
            results: Vec::new(),
            loading: !query.is_empty(),
        };
        ticket
    }

    /// Publishes the results of `ticket` if it is still the latest search.
    /// Returns `false` and discards `results` otherwise.
    pub fn complete(&self, ticket: &SearchTicket, results: Vec<UnicodeCharacter>) -> bool {
        let mut state = self.lock_state();
        let is_latest = state
            .latest
            .as_ref()
            .map_or(false, |latest| latest.generation == ticket.generation);
        if !is_latest || ticket.is_cancelled() {
            debug!(
                "discarding {} stale results of search #{}",
                results.len(),
                ticket.generation
            );
            return false;
        }
        debug!(
            "search #{} ({:?}) published {} results",
            ticket.generation,
            ticket.query,
            results.len()
        );
        state.published = SearchSnapshot {
            generation: ticket.generation,
            query: ticket.query.clone(),
            results,
            loading: false,
        };
        true
    }

    /// Runs `ticket` against `catalog` on the calling thread and publishes it.
    pub fn run(&self, ticket: &SearchTicket, catalog: &Catalog) -> bool {
        if ticket.query.is_empty() {
            return self.complete(ticket, Vec::new());
        }
        match catalog.search_until(&ticket.query, ticket.limit, || ticket.is_cancelled()) {
            Some(found) => self.complete(ticket, found.into_iter().cloned().collect()),
            None => {
                debug!("search #{} abandoned", ticket.generation);
                false
            }
        }
    }

    /// Issues `query` and runs it on a worker thread.
    pub fn spawn(self: &Arc<Self>, catalog: Arc<Catalog>, query: &str) -> JoinHandle<bool> {
        let ticket = self.issue(query);
        let session = Arc::clone(self);
        thread::spawn(move || session.run(&ticket, &catalog))
    }

    /// The currently published state.
    pub fn snapshot(&self) -> SearchSnapshot {
        self.lock_state().published.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::DEFAULT_SEARCH_LIMIT;
    use crate::dataset::Dataset;

    fn catalog() -> Catalog {
        let mut dataset = Dataset::new();
        dataset.push_group("Emoticons");
        for (hex, name) in [
            ("1F600", "GRINNING FACE"),
            ("1F60A", "SMILING FACE WITH SMILING EYES"),
            ("1F642", "SLIGHTLY SMILING FACE"),
        ] {
            dataset.push_character(Codepoint::from_hex(hex).unwrap(), name, "Emoticons");
        }
        Catalog::new(&dataset)
    }

    #[test]
    fn test_issue_clears_results() {
        let catalog = catalog();
        let session = SearchSession::new(DEFAULT_SEARCH_LIMIT);
        let ticket = session.issue("face");
        assert!(session.snapshot().loading);
        assert!(session.run(&ticket, &catalog));
        assert_eq!(session.snapshot().results.len(), 3);

        session.issue("smiling");
        let snapshot = session.snapshot();
        assert!(snapshot.results.is_empty());
        assert!(snapshot.loading);
    }

    #[test]
    fn test_empty_query_is_done_immediately() {
        let catalog = catalog();
        let session = SearchSession::new(DEFAULT_SEARCH_LIMIT);
        let ticket = session.issue("");
        assert!(!session.snapshot().loading);
        assert!(session.run(&ticket, &catalog));
        assert!(session.snapshot().results.is_empty());
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let catalog = catalog();
        let session = SearchSession::new(DEFAULT_SEARCH_LIMIT);
        let older = session.issue("grinning");
        let newer = session.issue("slightly");
        assert!(older.is_cancelled());
        assert!(!newer.is_cancelled());

        // the newer search finishes first, the older one afterwards
        assert!(session.run(&newer, &catalog));
        let stale = catalog
            .search("grinning", DEFAULT_SEARCH_LIMIT)
            .into_iter()
            .cloned()
            .collect();
        assert!(!session.complete(&older, stale));

        let snapshot = session.snapshot();
        assert_eq!(snapshot.generation, newer.generation());
        assert_eq!(snapshot.query, "slightly");
        assert_eq!(snapshot.codepoints(), vec![Codepoint::from_hex("1F642").unwrap()]);
    }

    #[test]
    fn test_cancelled_search_is_abandoned() {
        let catalog = catalog();
        let session = SearchSession::new(DEFAULT_SEARCH_LIMIT);
        let older = session.issue("face");
        session.issue("grinning");
        assert!(!session.run(&older, &catalog));
        assert!(session.snapshot().results.is_empty());
    }

    #[test]
    fn test_spawned_searches_publish_latest() {
        let catalog = Arc::new(catalog());
        let session = Arc::new(SearchSession::new(DEFAULT_SEARCH_LIMIT));
        let workers: Vec<_> = ["g", "gr", "gri", "smil", "slightly"]
            .iter()
            .map(|query| session.spawn(Arc::clone(&catalog), query))
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }
        let snapshot = session.snapshot();
        assert_eq!(snapshot.generation, 5);
        assert_eq!(snapshot.query, "slightly");
        assert!(!snapshot.loading);
        assert_eq!(snapshot.codepoints(), vec![Codepoint::from_hex("1F642").unwrap()]);
    }
}
