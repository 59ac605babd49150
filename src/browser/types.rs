//! Browser data types

use serde::{Deserialize, Serialize};

use crate::backend::{DirectoryEntry, RemoteTarget};

/// Backend browse session held by the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowseSession {
    pub session_id: String,
    /// Remote the session was opened for; never used for any other remote
    pub owner: RemoteTarget,
}

/// Whether a selection refers to a directory itself or to its contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CopyMode {
    #[default]
    Folder,
    Contents,
}

impl CopyMode {
    pub fn toggled(self) -> Self {
        match self {
            CopyMode::Folder => CopyMode::Contents,
            CopyMode::Contents => CopyMode::Folder,
        }
    }
}

/// Live selection reported to the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub current_path: String,
    pub copy_mode: CopyMode,
}

impl SelectionState {
    pub fn new(current_path: impl Into<String>, copy_mode: CopyMode) -> Self {
        Self {
            current_path: current_path.into(),
            copy_mode,
        }
    }
}

/// Externally visible phase of the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BrowseMode {
    /// No remote assigned
    Idle,
    /// Session open request in flight
    Opening,
    /// Ready with a backend session
    Session,
    /// Ready without a session; listings use the stateless call
    Fallback,
}

/// Visible breadcrumb segment with the path it navigates to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Breadcrumb {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Breadcrumbs {
    /// Leading segments were elided (rendered as an ellipsis)
    pub truncated: bool,
    pub segments: Vec<Breadcrumb>,
}

impl Breadcrumbs {
    pub fn names(&self) -> Vec<&str> {
        self.segments.iter().map(|s| s.name.as_str()).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ExclusionKind {
    /// Literal entry name
    ExactName,
    /// `*.<ext>` for files with an extension
    Extension,
    /// `<name>/**` for directories
    Subtree,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExclusionAction {
    pub kind: ExclusionKind,
    pub pattern: String,
}

/// Right-click menu for one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContextMenu {
    pub entry: DirectoryEntry,
    pub actions: Vec<ExclusionAction>,
}

/// Render state of the browsing panel.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserSnapshot {
    pub target: Option<RemoteTarget>,
    pub mode: BrowseMode,
    pub ready: bool,
    pub session_id: Option<String>,
    pub path: String,
    pub breadcrumbs: Breadcrumbs,
    pub entries: Vec<DirectoryEntry>,
    /// Names of listed entries matched by the host's exclusion patterns
    pub excluded: Vec<String>,
    pub loading: bool,
    /// Inline listing error; entries are empty when set
    pub error: Option<String>,
    pub copy_mode: CopyMode,
    pub context_menu: Option<ContextMenu>,
}

impl BrowserSnapshot {
    pub fn entry_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }
}
