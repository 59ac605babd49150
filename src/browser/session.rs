//! Browse session lifecycle
//!
//! Keeps at most one backend session for the active remote.
//!
//! ```text
//! Idle ──assign(Some)──▶ Opening ──open ok──▶ Ready(session)
//!   ▲                       │
//!   └────assign(None)───────┴──open failed──▶ Ready(fallback)
//! ```
//!
//! This type performs no I/O. It tells the caller which session to close
//! and which open request to issue, and it decides at resolution time
//! whether an open result is still authoritative. Every assignment and
//! teardown advances the generation, so results from superseded requests
//! are recognized no matter in which order they resolve.

use tracing::{debug, info, warn};

use super::sequencer::Sequencer;
use super::types::{BrowseMode, BrowseSession};
use crate::backend::{BrowseError, RemoteTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionPhase {
    Idle,
    Opening,
    /// Ready for listing; `None` means fallback (stateless) transport
    Ready(Option<BrowseSession>),
}

/// Open request to issue for the new target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenRequest {
    pub generation: u64,
    pub target: RemoteTarget,
}

/// Side effects of a target change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Previously held session, to close fire-and-forget
    pub close: Option<BrowseSession>,
    pub open: Option<OpenRequest>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpenResolution {
    /// Session adopted; browser is now ready
    Adopted(BrowseSession),
    /// Open failed; browser is ready in fallback mode
    Fallback,
    /// Result belongs to a superseded request; the session must be closed
    Stale { session_id: String },
    /// Superseded request that failed; nothing to do
    Ignored,
}

#[derive(Debug)]
pub struct SessionLifecycleManager {
    target: Option<RemoteTarget>,
    phase: SessionPhase,
    opens: Sequencer,
    torn_down: bool,
}

impl Default for SessionLifecycleManager {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionLifecycleManager {
    pub fn new() -> Self {
        Self {
            target: None,
            phase: SessionPhase::Idle,
            opens: Sequencer::new(),
            torn_down: false,
        }
    }

    pub fn target(&self) -> Option<&RemoteTarget> {
        self.target.as_ref()
    }

    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, SessionPhase::Ready(_))
    }

    pub fn session(&self) -> Option<&BrowseSession> {
        match self.phase {
            SessionPhase::Ready(Some(ref session)) => Some(session),
            _ => None,
        }
    }

    pub fn mode(&self) -> BrowseMode {
        match self.phase {
            SessionPhase::Idle => BrowseMode::Idle,
            SessionPhase::Opening => BrowseMode::Opening,
            SessionPhase::Ready(Some(_)) => BrowseMode::Session,
            SessionPhase::Ready(None) => BrowseMode::Fallback,
        }
    }

    /// Assign the active remote.
    ///
    /// Returns `None` when the target is unchanged (or after teardown).
    /// Otherwise the held session is released to the caller for closing,
    /// in-flight opens are invalidated, and a new open is requested if a
    /// target remains.
    pub fn assign(&mut self, target: Option<RemoteTarget>) -> Option<Transition> {
        if self.torn_down || self.target == target {
            return None;
        }

        let previous = self.take_session();
        let generation = self.opens.next();

        info!(
            "Browse target {:?} -> {:?} (generation {})",
            self.target.as_ref().map(|t| t.as_str()),
            target.as_ref().map(|t| t.as_str()),
            generation
        );

        self.target = target.clone();
        let open = match target {
            Some(target) => {
                self.phase = SessionPhase::Opening;
                Some(OpenRequest { generation, target })
            }
            None => {
                self.phase = SessionPhase::Idle;
                None
            }
        };

        Some(Transition {
            close: previous,
            open,
        })
    }

    /// Resolve an open request issued with `generation`.
    pub fn resolve_open(
        &mut self,
        generation: u64,
        result: Result<String, BrowseError>,
    ) -> OpenResolution {
        let authoritative = !self.torn_down && self.opens.is_current(generation);

        match (authoritative, result) {
            (false, Ok(session_id)) => {
                debug!(
                    "Discarding session {} from superseded open (generation {}, current {})",
                    session_id,
                    generation,
                    self.opens.current()
                );
                OpenResolution::Stale { session_id }
            }
            (false, Err(e)) => {
                debug!("Superseded open (generation {}) failed: {}", generation, e);
                OpenResolution::Ignored
            }
            (true, result) => {
                let Some(owner) = self.target.clone() else {
                    // Current generation always carries a target when opening
                    return match result {
                        Ok(session_id) => OpenResolution::Stale { session_id },
                        Err(_) => OpenResolution::Ignored,
                    };
                };
                match result {
                    Ok(session_id) => {
                        info!("Browse session {} ready for remote {}", session_id, owner);
                        let session = BrowseSession { session_id, owner };
                        self.phase = SessionPhase::Ready(Some(session.clone()));
                        OpenResolution::Adopted(session)
                    }
                    Err(e) => {
                        warn!(
                            "Browse session unavailable for remote {}, using stateless listing: {}",
                            owner, e
                        );
                        self.phase = SessionPhase::Ready(None);
                        OpenResolution::Fallback
                    }
                }
            }
        }
    }

    /// The backend no longer knows `session_id` (idle expiry).
    ///
    /// If it is the held session, it is forgotten without a close and a
    /// fresh open is requested for the same target under a new generation.
    /// Returns `None` for any other session id.
    pub fn expire(&mut self, session_id: &str) -> Option<OpenRequest> {
        if self.torn_down || self.session().map(|s| s.session_id.as_str()) != Some(session_id) {
            return None;
        }
        let target = self.target.clone()?;
        let generation = self.opens.next();
        info!(
            "Browse session {} expired, reopening for remote {} (generation {})",
            session_id, target, generation
        );
        self.phase = SessionPhase::Opening;
        Some(OpenRequest { generation, target })
    }

    /// Stop using `session_id` and list statelessly for the rest of this target.
    ///
    /// Returns whether it was the held session.
    pub fn fall_back(&mut self, session_id: &str) -> bool {
        if self.torn_down || self.session().map(|s| s.session_id.as_str()) != Some(session_id) {
            return false;
        }
        warn!(
            "Browse session {} expired again, using stateless listing",
            session_id
        );
        self.phase = SessionPhase::Ready(None);
        true
    }

    /// Tear down. Returns the held session exactly once; later calls return `None`.
    pub fn teardown(&mut self) -> Option<BrowseSession> {
        if self.torn_down {
            return None;
        }
        self.torn_down = true;
        self.opens.next();
        let session = self.take_session();
        self.phase = SessionPhase::Idle;
        session
    }

    fn take_session(&mut self) -> Option<BrowseSession> {
        match std::mem::replace(&mut self.phase, SessionPhase::Idle) {
            SessionPhase::Ready(session) => session,
            _ => None,
        }
    }
}
