//! Scripted in-memory backend for browser tests

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::error::BrowseError;
use super::types::{DirectoryEntry, RemoteTarget};
use super::BrowseBackend;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Call {
    Open(RemoteTarget),
    Close(String),
    ListSession(String, String),
    ListStateless(RemoteTarget, String),
}

#[derive(Default)]
struct MockState {
    open_delays: HashMap<RemoteTarget, Duration>,
    failing_opens: HashSet<RemoteTarget>,
    fail_all_opens: bool,
    listings: HashMap<(RemoteTarget, String), Vec<DirectoryEntry>>,
    list_delays: HashMap<String, Duration>,
    failing_paths: HashSet<String>,
    fail_closes: bool,
    close_delay: Duration,
    /// Sessions vanish on their first listing (backend idle expiry)
    expire_on_list: bool,
    live: HashMap<String, RemoteTarget>,
    opened: Vec<(String, RemoteTarget)>,
    closed: Vec<String>,
    calls: Vec<Call>,
}

#[derive(Default)]
pub(crate) struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_listing(self, target: &RemoteTarget, path: &str, entries: Vec<DirectoryEntry>) -> Self {
        self.state
            .lock()
            .listings
            .insert((target.clone(), path.to_string()), entries);
        self
    }

    pub fn with_open_delay(self, target: &RemoteTarget, delay: Duration) -> Self {
        self.state.lock().open_delays.insert(target.clone(), delay);
        self
    }

    pub fn with_list_delay(self, path: &str, delay: Duration) -> Self {
        self.state.lock().list_delays.insert(path.to_string(), delay);
        self
    }

    pub fn failing_open_for(self, target: &RemoteTarget) -> Self {
        self.state.lock().failing_opens.insert(target.clone());
        self
    }

    pub fn failing_all_opens(self) -> Self {
        self.state.lock().fail_all_opens = true;
        self
    }

    pub fn failing_closes(self) -> Self {
        self.state.lock().fail_closes = true;
        self
    }

    pub fn with_close_delay(self, delay: Duration) -> Self {
        self.state.lock().close_delay = delay;
        self
    }

    pub fn expiring_sessions(self) -> Self {
        self.state.lock().expire_on_list = true;
        self
    }

    /// Drop a session on the backend side without a close call.
    pub fn expire_session(&self, session_id: &str) {
        self.state.lock().live.remove(session_id);
    }

    pub fn fail_listing(&self, path: &str) {
        self.state.lock().failing_paths.insert(path.to_string());
    }

    pub fn heal_listing(&self, path: &str) {
        self.state.lock().failing_paths.remove(path);
    }

    /// Sessions opened and not yet closed.
    pub fn live_sessions(&self) -> Vec<(String, RemoteTarget)> {
        let state = self.state.lock();
        let mut live: Vec<_> = state
            .live
            .iter()
            .map(|(id, target)| (id.clone(), target.clone()))
            .collect();
        live.sort();
        live
    }

    pub fn opened(&self) -> Vec<(String, RemoteTarget)> {
        self.state.lock().opened.clone()
    }

    pub fn closed(&self) -> Vec<String> {
        self.state.lock().closed.clone()
    }

    pub fn calls(&self) -> Vec<Call> {
        self.state.lock().calls.clone()
    }

    pub fn opens(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Open(_)))
            .count()
    }

    /// Session ids of every close attempt, successful or not.
    pub fn close_attempts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                Call::Close(id) => Some(id),
                _ => None,
            })
            .collect()
    }

    pub fn list_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| matches!(c, Call::ListSession(..) | Call::ListStateless(..)))
            .collect()
    }

    fn listing_for(&self, target: &RemoteTarget, path: &str) -> Result<Vec<DirectoryEntry>, BrowseError> {
        let state = self.state.lock();
        if state.failing_paths.contains(path) {
            return Err(BrowseError::Api {
                status: 500,
                message: format!("cannot list {}", path),
            });
        }
        state
            .listings
            .get(&(target.clone(), path.to_string()))
            .cloned()
            .ok_or_else(|| BrowseError::Api {
                status: 500,
                message: format!("directory not found: {}", path),
            })
    }

    fn list_delay(&self, path: &str) -> Duration {
        self.state
            .lock()
            .list_delays
            .get(path)
            .copied()
            .unwrap_or(Duration::from_millis(10))
    }
}

#[async_trait]
impl BrowseBackend for MockBackend {
    async fn open_session(&self, target: &RemoteTarget) -> Result<String, BrowseError> {
        let (delay, fails) = {
            let mut state = self.state.lock();
            state.calls.push(Call::Open(target.clone()));
            (
                state
                    .open_delays
                    .get(target)
                    .copied()
                    .unwrap_or(Duration::from_millis(20)),
                state.fail_all_opens || state.failing_opens.contains(target),
            )
        };

        tokio::time::sleep(delay).await;

        if fails {
            return Err(BrowseError::Api {
                status: 500,
                message: format!("sessions unsupported for remote {}", target),
            });
        }

        let session_id = uuid::Uuid::new_v4().to_string()[..8].to_string();
        let mut state = self.state.lock();
        state.live.insert(session_id.clone(), target.clone());
        state.opened.push((session_id.clone(), target.clone()));
        Ok(session_id)
    }

    async fn close_session(&self, session_id: &str) -> Result<(), BrowseError> {
        let delay = {
            let mut state = self.state.lock();
            state.calls.push(Call::Close(session_id.to_string()));
            state.close_delay
        };
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        let mut state = self.state.lock();
        if state.fail_closes {
            return Err(BrowseError::Network("connection reset".to_string()));
        }
        state.live.remove(session_id);
        state.closed.push(session_id.to_string());
        Ok(())
    }

    async fn list_via_session(
        &self,
        session_id: &str,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, BrowseError> {
        self.state
            .lock()
            .calls
            .push(Call::ListSession(session_id.to_string(), path.to_string()));
        tokio::time::sleep(self.list_delay(path)).await;

        let target = {
            let mut state = self.state.lock();
            if state.expire_on_list {
                state.live.remove(session_id);
            }
            state
                .live
                .get(session_id)
                .cloned()
                .ok_or_else(|| BrowseError::SessionNotFound(session_id.to_string()))?
        };
        self.listing_for(&target, path)
    }

    async fn list_stateless(
        &self,
        target: &RemoteTarget,
        path: &str,
    ) -> Result<Vec<DirectoryEntry>, BrowseError> {
        self.state
            .lock()
            .calls
            .push(Call::ListStateless(target.clone(), path.to_string()));
        tokio::time::sleep(self.list_delay(path)).await;
        self.listing_for(target, path)
    }
}
