//! Directory listing state
//!
//! Picks the transport for each fetch (session when one is held,
//! stateless otherwise), orders results for display, and keeps the
//! displayed collection. A failed listing clears the entries and shows
//! the error in their place.

use std::cmp::Ordering;

use tracing::debug;

use super::sequencer::Sequencer;
use super::session::SessionLifecycleManager;
use crate::backend::{BrowseError, DirectoryEntry, RemoteTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListingTransport {
    Session(String),
    Stateless(RemoteTarget),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingRequest {
    pub generation: u64,
    pub transport: ListingTransport,
    pub path: String,
}

#[derive(Debug, Default)]
pub struct ListingFetcher {
    entries: Vec<DirectoryEntry>,
    error: Option<String>,
    loading: bool,
    requests: Sequencer,
}

impl ListingFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[DirectoryEntry] {
        &self.entries
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Whether `generation` is the latest fetch issued.
    pub fn is_current(&self, generation: u64) -> bool {
        self.requests.is_current(generation)
    }

    pub fn find(&self, name: &str) -> Option<&DirectoryEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    /// Start a fetch for `path`. Returns `None` while the session is not ready.
    ///
    /// Any fetch still in flight is superseded.
    pub fn begin(&mut self, session: &SessionLifecycleManager, path: &str) -> Option<ListingRequest> {
        if !session.is_ready() {
            return None;
        }

        let transport = match (session.session(), session.target()) {
            (Some(s), _) => ListingTransport::Session(s.session_id.clone()),
            (None, Some(target)) => ListingTransport::Stateless(target.clone()),
            (None, None) => return None,
        };

        let generation = self.requests.next();
        self.loading = true;
        debug!("Listing {:?} via {:?} (generation {})", path, transport, generation);

        Some(ListingRequest {
            generation,
            transport,
            path: path.to_string(),
        })
    }

    /// Drop displayed entries and supersede any in-flight fetch (target change).
    pub fn invalidate(&mut self) {
        self.requests.next();
        self.entries.clear();
        self.error = None;
        self.loading = false;
    }

    /// Apply a fetch result. Returns `false` if the result was superseded.
    pub fn resolve(
        &mut self,
        generation: u64,
        result: Result<Vec<DirectoryEntry>, BrowseError>,
    ) -> bool {
        if !self.requests.is_current(generation) {
            debug!(
                "Discarding superseded listing (generation {}, current {})",
                generation,
                self.requests.current()
            );
            return false;
        }

        self.loading = false;
        match result {
            Ok(mut entries) => {
                sort_entries(&mut entries);
                self.entries = entries;
                self.error = None;
            }
            Err(e) => {
                self.entries.clear();
                self.error = Some(e.user_message());
            }
        }
        true
    }
}

/// Display order: directories first, then by name.
pub fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| {
        if a.is_directory != b.is_directory {
            return b.is_directory.cmp(&a.is_directory);
        }
        locale_compare(&a.name, &b.name)
    });
}

/// Case-insensitive name comparison; among names equal ignoring case,
/// lowercase sorts before uppercase at the first difference.
pub fn locale_compare(a: &str, b: &str) -> Ordering {
    let primary = a
        .chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase));
    if primary != Ordering::Equal {
        return primary;
    }

    for (ca, cb) in a.chars().zip(b.chars()) {
        if ca != cb {
            return match (ca.is_lowercase(), cb.is_lowercase()) {
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                _ => ca.cmp(&cb),
            };
        }
    }
    a.len().cmp(&b.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(entries: &[DirectoryEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.name.as_str()).collect()
    }

    fn ready_manager(session: Option<&str>) -> SessionLifecycleManager {
        let mut mgr = SessionLifecycleManager::new();
        let t = mgr.assign(Some(RemoteTarget::from("1"))).unwrap();
        let generation = t.open.unwrap().generation;
        match session {
            Some(id) => mgr.resolve_open(generation, Ok(id.to_string())),
            None => mgr.resolve_open(generation, Err(BrowseError::Network("down".into()))),
        };
        mgr
    }

    #[test]
    fn test_directories_first_then_name() {
        let mut entries = vec![
            DirectoryEntry::file("b.txt", 1),
            DirectoryEntry::directory("A"),
            DirectoryEntry::file("a.txt", 1),
        ];
        sort_entries(&mut entries);
        assert_eq!(names(&entries), vec!["A", "a.txt", "b.txt"]);
        assert!(entries[0].is_directory);
    }

    #[test]
    fn test_name_order_ignores_case() {
        let mut entries = vec![
            DirectoryEntry::file("Zebra.jpg", 1),
            DirectoryEntry::file("apple.jpg", 1),
            DirectoryEntry::file("Banana.jpg", 1),
            DirectoryEntry::directory("zz"),
            DirectoryEntry::directory("Movies"),
        ];
        sort_entries(&mut entries);
        assert_eq!(
            names(&entries),
            vec!["Movies", "zz", "apple.jpg", "Banana.jpg", "Zebra.jpg"]
        );
    }

    #[test]
    fn test_locale_compare_case_tiebreak() {
        assert_eq!(locale_compare("a", "A"), Ordering::Less);
        assert_eq!(locale_compare("A", "a"), Ordering::Greater);
        assert_eq!(locale_compare("abc", "abc"), Ordering::Equal);
        assert_eq!(locale_compare("ab", "abc"), Ordering::Less);
    }

    #[test]
    fn test_begin_requires_ready() {
        let mut mgr = SessionLifecycleManager::new();
        let mut fetcher = ListingFetcher::new();
        assert!(fetcher.begin(&mgr, "").is_none());

        mgr.assign(Some(RemoteTarget::from("1")));
        assert!(fetcher.begin(&mgr, "").is_none());
        assert!(!fetcher.is_loading());
    }

    #[test]
    fn test_transport_selection() {
        let mut fetcher = ListingFetcher::new();

        let req = fetcher.begin(&ready_manager(Some("s1")), "docs").unwrap();
        assert_eq!(req.transport, ListingTransport::Session("s1".into()));
        assert_eq!(req.path, "docs");

        let req = fetcher.begin(&ready_manager(None), "docs").unwrap();
        assert_eq!(
            req.transport,
            ListingTransport::Stateless(RemoteTarget::from("1"))
        );
    }

    #[test]
    fn test_superseded_result_is_discarded() {
        let mgr = ready_manager(Some("s1"));
        let mut fetcher = ListingFetcher::new();

        let first = fetcher.begin(&mgr, "slow").unwrap();
        let second = fetcher.begin(&mgr, "fast").unwrap();

        assert!(fetcher.resolve(second.generation, Ok(vec![DirectoryEntry::file("new", 1)])));
        assert!(!fetcher.resolve(first.generation, Ok(vec![DirectoryEntry::file("old", 1)])));
        assert_eq!(names(fetcher.entries()), vec!["new"]);
        assert!(!fetcher.is_loading());
    }

    #[test]
    fn test_failure_clears_entries() {
        let mgr = ready_manager(None);
        let mut fetcher = ListingFetcher::new();

        let req = fetcher.begin(&mgr, "").unwrap();
        fetcher.resolve(req.generation, Ok(vec![DirectoryEntry::file("kept?", 1)]));
        assert_eq!(fetcher.entries().len(), 1);

        let req = fetcher.begin(&mgr, "gone").unwrap();
        fetcher.resolve(
            req.generation,
            Err(BrowseError::Api {
                status: 500,
                message: "directory not found".into(),
            }),
        );
        assert!(fetcher.entries().is_empty());
        assert_eq!(fetcher.error(), Some("directory not found"));

        let req = fetcher.begin(&mgr, "").unwrap();
        fetcher.resolve(req.generation, Ok(vec![]));
        assert_eq!(fetcher.error(), None);
    }

    #[test]
    fn test_invalidate_supersedes_in_flight() {
        let mgr = ready_manager(Some("s1"));
        let mut fetcher = ListingFetcher::new();

        let req = fetcher.begin(&mgr, "").unwrap();
        fetcher.invalidate();
        assert!(!fetcher.resolve(req.generation, Ok(vec![DirectoryEntry::file("x", 1)])));
        assert!(fetcher.entries().is_empty());
        assert!(!fetcher.is_loading());
    }
}
