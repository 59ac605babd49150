//! Remote directory browser
//!
//! Composition of four state machines, all owned by a single task:
//!
//! - `session`: at most one backend session for the active remote, with
//!   stateless fallback when a session cannot be opened
//! - `navigator`: current relative path and breadcrumbs
//! - `listing`: transport choice, ordering, inline errors
//! - `selection`: copy mode, live selection, exclusion context menu
//!
//! `owner` wires them to the backend and to the host.

pub mod emitter;
pub mod listing;
pub mod navigator;
pub mod owner;
pub mod selection;
pub mod sequencer;
pub mod session;
pub mod types;

pub use emitter::{ExclusionCallback, SelectionReceiver};
pub use owner::{spawn_browser, BrowserController, BrowserHandle, BrowserOptions};
pub use types::{
    BrowseMode, BrowseSession, Breadcrumb, Breadcrumbs, BrowserSnapshot, ContextMenu, CopyMode,
    ExclusionAction, ExclusionKind, SelectionState,
};
