//! Browser Owner Task
//!
//! One task owns every piece of browser state (session lifecycle, path,
//! listing, selection). Hosts drive it through `BrowserController`, which
//! sends commands over an mpsc channel. Backend calls run as separate
//! tasks and report back through a completion channel, each tagged with
//! the generation captured when it was issued; the owner task is the only
//! place results are applied.
//!
//! # Usage
//!
//! ```ignore
//! let handle = spawn_browser(backend, BrowserOptions {
//!     initial_target: Some(RemoteTarget::from(3)),
//!     on_exclusion: Some(Arc::new(|pattern| println!("exclude {}", pattern))),
//! });
//!
//! handle.controller.enter("media").await?;
//! let snapshot = handle.controller.wait_settled().await?;
//! handle.controller.shutdown().await?;
//! ```

use std::ops::ControlFlow;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use super::emitter::{BrowserEmitter, ExclusionCallback, SelectionReceiver};
use super::listing::{ListingFetcher, ListingRequest, ListingTransport};
use super::navigator::PathNavigator;
use super::selection::{ExclusionSet, SelectionModel};
use super::session::{OpenRequest, OpenResolution, SessionLifecycleManager};
use super::types::{BrowseMode, BrowserSnapshot, ContextMenu, CopyMode};
use crate::backend::{BrowseBackend, BrowseError, DirectoryEntry, RemoteTarget};

/// Commands sent to the Browser Owner Task
pub enum BrowserCommand {
    SetTarget {
        target: Option<RemoteTarget>,
    },
    Enter {
        name: String,
    },
    Up,
    Reset,
    Navigate {
        path: String,
    },
    Refresh,
    SetCopyMode {
        mode: CopyMode,
    },
    ToggleCopyMode {
        reply_tx: oneshot::Sender<CopyMode>,
    },
    OpenContextMenu {
        name: String,
        reply_tx: oneshot::Sender<Option<ContextMenu>>,
    },
    ChooseExclusion {
        index: usize,
        reply_tx: oneshot::Sender<Option<String>>,
    },
    DismissContextMenu,
    SetExclusions {
        patterns: Vec<String>,
        reply_tx: oneshot::Sender<Result<(), BrowseError>>,
    },
    Snapshot {
        reply_tx: oneshot::Sender<BrowserSnapshot>,
    },
    /// Reply once ready with no listing in flight (or idle)
    WaitSettled {
        reply_tx: oneshot::Sender<BrowserSnapshot>,
    },
    Shutdown {
        reply_tx: oneshot::Sender<()>,
    },
}

/// Results of spawned backend calls
enum Completion {
    SessionOpened {
        generation: u64,
        result: Result<String, BrowseError>,
    },
    Listed {
        generation: u64,
        transport: ListingTransport,
        result: Result<Vec<DirectoryEntry>, BrowseError>,
    },
}

#[derive(Default)]
pub struct BrowserOptions {
    pub initial_target: Option<RemoteTarget>,
    pub on_exclusion: Option<ExclusionCallback>,
}

/// A running browser: its controller and the live selection stream.
pub struct BrowserHandle {
    pub controller: BrowserController,
    pub selections: SelectionReceiver,
}

/// Controller for sending commands to the Browser Owner Task
///
/// Cloning is cheap (copies the sender). The owner task tears down and
/// closes its session when `shutdown` is called or the last controller
/// is dropped.
#[derive(Clone)]
pub struct BrowserController {
    cmd_tx: mpsc::Sender<BrowserCommand>,
}

impl BrowserController {
    async fn send(&self, cmd: BrowserCommand) -> Result<(), BrowseError> {
        self.cmd_tx.send(cmd).await.map_err(|_| BrowseError::Closed)
    }

    async fn request<T>(
        &self,
        make: impl FnOnce(oneshot::Sender<T>) -> BrowserCommand,
    ) -> Result<T, BrowseError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.send(make(reply_tx)).await?;
        reply_rx.await.map_err(|_| BrowseError::Closed)
    }

    /// Point the browser at another remote (or none).
    pub async fn set_target(&self, target: Option<RemoteTarget>) -> Result<(), BrowseError> {
        self.send(BrowserCommand::SetTarget { target }).await
    }

    pub async fn enter(&self, name: &str) -> Result<(), BrowseError> {
        self.send(BrowserCommand::Enter {
            name: name.to_string(),
        })
        .await
    }

    pub async fn up(&self) -> Result<(), BrowseError> {
        self.send(BrowserCommand::Up).await
    }

    pub async fn reset(&self) -> Result<(), BrowseError> {
        self.send(BrowserCommand::Reset).await
    }

    pub async fn navigate(&self, path: &str) -> Result<(), BrowseError> {
        self.send(BrowserCommand::Navigate {
            path: path.to_string(),
        })
        .await
    }

    /// Re-list the current path. No-op while not ready.
    pub async fn refresh(&self) -> Result<(), BrowseError> {
        self.send(BrowserCommand::Refresh).await
    }

    pub async fn set_copy_mode(&self, mode: CopyMode) -> Result<(), BrowseError> {
        self.send(BrowserCommand::SetCopyMode { mode }).await
    }

    /// Toggle and return the new mode.
    pub async fn toggle_copy_mode(&self) -> Result<CopyMode, BrowseError> {
        self.request(|reply_tx| BrowserCommand::ToggleCopyMode { reply_tx })
            .await
    }

    /// Open the exclusion menu for a listed entry; `None` if no such entry.
    pub async fn open_context_menu(&self, name: &str) -> Result<Option<ContextMenu>, BrowseError> {
        let name = name.to_string();
        self.request(|reply_tx| BrowserCommand::OpenContextMenu { name, reply_tx })
            .await
    }

    /// Choose an action of the open menu; returns the emitted pattern.
    pub async fn choose_exclusion(&self, index: usize) -> Result<Option<String>, BrowseError> {
        self.request(|reply_tx| BrowserCommand::ChooseExclusion { index, reply_tx })
            .await
    }

    pub async fn dismiss_context_menu(&self) -> Result<(), BrowseError> {
        self.send(BrowserCommand::DismissContextMenu).await
    }

    /// Replace the host's exclusion patterns used to flag listed entries.
    pub async fn set_exclusions(&self, patterns: Vec<String>) -> Result<(), BrowseError> {
        self.request(|reply_tx| BrowserCommand::SetExclusions { patterns, reply_tx })
            .await?
    }

    pub async fn snapshot(&self) -> Result<BrowserSnapshot, BrowseError> {
        self.request(|reply_tx| BrowserCommand::Snapshot { reply_tx })
            .await
    }

    pub async fn wait_settled(&self) -> Result<BrowserSnapshot, BrowseError> {
        self.request(|reply_tx| BrowserCommand::WaitSettled { reply_tx })
            .await
    }

    /// Tear down. Resolves once the close of the held session has been
    /// answered (or failed); closes of superseded sessions stay fire-and-forget.
    pub async fn shutdown(&self) -> Result<(), BrowseError> {
        self.request(|reply_tx| BrowserCommand::Shutdown { reply_tx })
            .await
    }

    pub fn is_alive(&self) -> bool {
        !self.cmd_tx.is_closed()
    }
}

/// Spawn the Browser Owner Task
///
/// Must be called from within a tokio runtime. The initial selection
/// (`""`, `Folder`) is emitted on mount.
pub fn spawn_browser(backend: Arc<dyn BrowseBackend>, options: BrowserOptions) -> BrowserHandle {
    let (cmd_tx, mut cmd_rx) = mpsc::channel::<BrowserCommand>(64);
    let (completion_tx, mut completion_rx) = mpsc::unbounded_channel::<Completion>();
    let (emitter, selections) = BrowserEmitter::new(options.on_exclusion);
    let initial_target = options.initial_target;

    tokio::spawn(async move {
        let mut state = BrowserState::new(backend, emitter, completion_tx);
        info!("Browser owner task started");
        state.mount(initial_target);

        let shutdown_ack = loop {
            tokio::select! {
                cmd = cmd_rx.recv() => match cmd {
                    Some(cmd) => {
                        if let ControlFlow::Break(ack) = state.handle_command(cmd) {
                            break Some(ack);
                        }
                    }
                    None => {
                        info!("All browser controllers dropped");
                        break None;
                    }
                },
                Some(completion) = completion_rx.recv() => state.handle_completion(completion),
            }
            state.notify_settled();
        };

        // === Cleanup phase ===
        let mut closing: Vec<String> = state.teardown().into_iter().collect();

        // Nothing may be applied after teardown; sessions that were opened
        // but not yet delivered are closed here or by their own task.
        completion_rx.close();
        while let Ok(completion) = completion_rx.try_recv() {
            if let Some(session_id) = undelivered_session(completion) {
                debug!("Session {} resolved after teardown, closing", session_id);
                closing.push(session_id);
            }
        }
        for session_id in closing {
            close_quietly(state.backend.as_ref(), &session_id).await;
        }

        if let Some(ack) = shutdown_ack {
            let _ = ack.send(());
        }
        info!("Browser owner task terminated");
    });

    BrowserHandle {
        controller: BrowserController { cmd_tx },
        selections,
    }
}

struct BrowserState {
    backend: Arc<dyn BrowseBackend>,
    session: SessionLifecycleManager,
    navigator: PathNavigator,
    listing: ListingFetcher,
    selection: SelectionModel,
    exclusions: ExclusionSet,
    emitter: BrowserEmitter,
    completion_tx: mpsc::UnboundedSender<Completion>,
    settle_waiters: Vec<oneshot::Sender<BrowserSnapshot>>,
    /// A session was reopened after expiry and no listing has succeeded since
    reopened_after_expiry: bool,
}

impl BrowserState {
    fn new(
        backend: Arc<dyn BrowseBackend>,
        emitter: BrowserEmitter,
        completion_tx: mpsc::UnboundedSender<Completion>,
    ) -> Self {
        Self {
            backend,
            session: SessionLifecycleManager::new(),
            navigator: PathNavigator::new(),
            listing: ListingFetcher::new(),
            selection: SelectionModel::new(),
            exclusions: ExclusionSet::default(),
            emitter,
            completion_tx,
            settle_waiters: Vec::new(),
            reopened_after_expiry: false,
        }
    }

    fn mount(&mut self, initial_target: Option<RemoteTarget>) {
        self.emit_selection();
        self.set_target(initial_target);
    }

    fn handle_command(&mut self, cmd: BrowserCommand) -> ControlFlow<oneshot::Sender<()>> {
        match cmd {
            BrowserCommand::SetTarget { target } => self.set_target(target),
            BrowserCommand::Enter { name } => {
                let changed = self.navigator.enter(&name);
                self.path_changed(changed);
            }
            BrowserCommand::Up => {
                let changed = self.navigator.up();
                self.path_changed(changed);
            }
            BrowserCommand::Reset => {
                let changed = self.navigator.reset();
                self.path_changed(changed);
            }
            BrowserCommand::Navigate { path } => {
                let changed = self.navigator.navigate(&path);
                self.path_changed(changed);
            }
            BrowserCommand::Refresh => self.fetch(),
            BrowserCommand::SetCopyMode { mode } => {
                if self.selection.set_copy_mode(mode) {
                    self.emit_selection();
                }
            }
            BrowserCommand::ToggleCopyMode { reply_tx } => {
                let mode = self.selection.toggle_copy_mode();
                self.emit_selection();
                let _ = reply_tx.send(mode);
            }
            BrowserCommand::OpenContextMenu { name, reply_tx } => {
                let menu = self
                    .listing
                    .find(&name)
                    .cloned()
                    .map(|entry| self.selection.open_menu(entry).clone());
                let _ = reply_tx.send(menu);
            }
            BrowserCommand::ChooseExclusion { index, reply_tx } => {
                let pattern = self.selection.choose(index);
                if let Some(ref pattern) = pattern {
                    self.emitter.emit_exclusion(pattern.clone());
                }
                let _ = reply_tx.send(pattern);
            }
            BrowserCommand::DismissContextMenu => self.selection.dismiss_menu(),
            BrowserCommand::SetExclusions { patterns, reply_tx } => {
                let result = match ExclusionSet::new(&patterns) {
                    Ok(set) => {
                        self.exclusions = set;
                        Ok(())
                    }
                    Err(e) => Err(BrowseError::InvalidPattern(e.to_string())),
                };
                let _ = reply_tx.send(result);
            }
            BrowserCommand::Snapshot { reply_tx } => {
                let _ = reply_tx.send(self.snapshot());
            }
            BrowserCommand::WaitSettled { reply_tx } => {
                if self.is_settled() {
                    let _ = reply_tx.send(self.snapshot());
                } else {
                    self.settle_waiters.push(reply_tx);
                }
            }
            BrowserCommand::Shutdown { reply_tx } => {
                info!("Browser shutdown requested");
                return ControlFlow::Break(reply_tx);
            }
        }
        ControlFlow::Continue(())
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::SessionOpened { generation, result } => {
                match self.session.resolve_open(generation, result) {
                    OpenResolution::Adopted(_) | OpenResolution::Fallback => self.fetch(),
                    OpenResolution::Stale { session_id } => self.spawn_close(session_id),
                    OpenResolution::Ignored => {}
                }
            }
            Completion::Listed {
                generation,
                transport,
                result,
            } => {
                let expired = matches!(result, Err(BrowseError::SessionNotFound(_)));
                if expired && self.listing.is_current(generation) {
                    if let ListingTransport::Session(ref session_id) = transport {
                        if self.recover_expired(session_id) {
                            return;
                        }
                    }
                }

                if self.listing.resolve(generation, result) {
                    self.selection.dismiss_menu();
                    if !expired {
                        self.reopened_after_expiry = false;
                    }
                    if let Some(error) = self.listing.error() {
                        warn!(
                            "Listing {:?} failed: {}",
                            self.navigator.current_path(),
                            error
                        );
                    }
                }
            }
        }
    }

    /// The backend dropped the held session (idle timeout). Reopen once;
    /// if the fresh session is gone again too, list statelessly.
    fn recover_expired(&mut self, session_id: &str) -> bool {
        if !self.reopened_after_expiry {
            let Some(request) = self.session.expire(session_id) else {
                return false;
            };
            self.reopened_after_expiry = true;
            self.listing.invalidate();
            self.selection.dismiss_menu();
            self.spawn_open(request);
            return true;
        }

        if !self.session.fall_back(session_id) {
            return false;
        }
        self.fetch();
        true
    }

    fn set_target(&mut self, target: Option<RemoteTarget>) {
        let Some(transition) = self.session.assign(target) else {
            return;
        };
        self.reopened_after_expiry = false;

        // Entries and path belong to the previous remote
        self.listing.invalidate();
        self.selection.dismiss_menu();
        if self.navigator.reset() {
            self.emit_selection();
        }

        if let Some(previous) = transition.close {
            self.spawn_close(previous.session_id);
        }
        if let Some(request) = transition.open {
            self.spawn_open(request);
        }
    }

    fn path_changed(&mut self, changed: bool) {
        if !changed {
            return;
        }
        self.selection.dismiss_menu();
        self.emit_selection();
        self.fetch();
    }

    fn fetch(&mut self) {
        if let Some(request) = self
            .listing
            .begin(&self.session, self.navigator.current_path())
        {
            self.spawn_list(request);
        }
    }

    fn emit_selection(&mut self) {
        if let Some(state) = self.selection.take_emission(self.navigator.current_path()) {
            self.emitter.emit_selection(state);
        }
    }

    fn is_settled(&self) -> bool {
        match self.session.mode() {
            BrowseMode::Idle => true,
            BrowseMode::Opening => false,
            BrowseMode::Session | BrowseMode::Fallback => !self.listing.is_loading(),
        }
    }

    fn notify_settled(&mut self) {
        if self.settle_waiters.is_empty() || !self.is_settled() {
            return;
        }
        let snapshot = self.snapshot();
        for waiter in self.settle_waiters.drain(..) {
            let _ = waiter.send(snapshot.clone());
        }
    }

    fn snapshot(&self) -> BrowserSnapshot {
        let entries = self.listing.entries();
        BrowserSnapshot {
            target: self.session.target().cloned(),
            mode: self.session.mode(),
            ready: self.session.is_ready(),
            session_id: self.session.session().map(|s| s.session_id.clone()),
            path: self.navigator.current_path().to_string(),
            breadcrumbs: self.navigator.breadcrumbs(),
            entries: entries.to_vec(),
            excluded: self.exclusions.excluded_names(entries),
            loading: self.listing.is_loading(),
            error: self.listing.error().map(str::to_string),
            copy_mode: self.selection.copy_mode(),
            context_menu: self.selection.context_menu().cloned(),
        }
    }

    /// Returns the held session id, to be closed by the caller.
    fn teardown(&mut self) -> Option<String> {
        self.settle_waiters.clear();
        let session = self.session.teardown()?;
        info!("Closing browse session {} on teardown", session.session_id);
        Some(session.session_id)
    }

    fn spawn_open(&self, request: OpenRequest) {
        let backend = self.backend.clone();
        let completion_tx = self.completion_tx.clone();

        tokio::spawn(async move {
            let OpenRequest { generation, target } = request;
            debug!("Opening browse session for remote {} (generation {})", target, generation);
            let result = backend.open_session(&target).await;

            if let Err(mpsc::error::SendError(Completion::SessionOpened {
                result: Ok(session_id),
                ..
            })) = completion_tx.send(Completion::SessionOpened { generation, result })
            {
                // Owner task is gone; nobody else will ever close this session
                warn!(
                    "Browser closed before session {} for remote {} was delivered. Closing orphaned session",
                    session_id, target
                );
                close_quietly(backend.as_ref(), &session_id).await;
            }
        });
    }

    fn spawn_close(&self, session_id: String) {
        let backend = self.backend.clone();
        tokio::spawn(async move {
            close_quietly(backend.as_ref(), &session_id).await;
        });
    }

    fn spawn_list(&self, request: ListingRequest) {
        let backend = self.backend.clone();
        let completion_tx = self.completion_tx.clone();

        tokio::spawn(async move {
            let ListingRequest {
                generation,
                transport,
                path,
            } = request;
            let result = match transport {
                ListingTransport::Session(ref session_id) => {
                    backend.list_via_session(session_id, &path).await
                }
                ListingTransport::Stateless(ref target) => backend.list_stateless(target, &path).await,
            };
            if completion_tx
                .send(Completion::Listed {
                    generation,
                    transport,
                    result,
                })
                .is_err()
            {
                debug!("Browser closed before listing of {:?} was delivered", path);
            }
        });
    }
}

/// Session carried by a completion that can no longer be delivered.
fn undelivered_session(completion: Completion) -> Option<String> {
    match completion {
        Completion::SessionOpened {
            result: Ok(session_id),
            ..
        } => Some(session_id),
        _ => None,
    }
}

/// Close a session, ignoring failures.
async fn close_quietly(backend: &dyn BrowseBackend, session_id: &str) {
    match backend.close_session(session_id).await {
        Ok(()) => debug!("Closed browse session {}", session_id),
        Err(e) => debug!("Closing browse session {} failed (ignored): {}", session_id, e),
    }
}
