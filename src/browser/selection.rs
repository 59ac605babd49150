//! Copy-mode selection and exclusion patterns

use glob::{MatchOptions, Pattern, PatternError};

use super::types::{ContextMenu, CopyMode, ExclusionAction, ExclusionKind, SelectionState};
use crate::backend::DirectoryEntry;

#[derive(Debug, Default)]
pub struct SelectionModel {
    copy_mode: CopyMode,
    last_emitted: Option<SelectionState>,
    menu: Option<ContextMenu>,
}

impl SelectionModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn copy_mode(&self) -> CopyMode {
        self.copy_mode
    }

    /// Returns whether the mode changed.
    pub fn set_copy_mode(&mut self, mode: CopyMode) -> bool {
        if self.copy_mode == mode {
            return false;
        }
        self.copy_mode = mode;
        true
    }

    pub fn toggle_copy_mode(&mut self) -> CopyMode {
        self.copy_mode = self.copy_mode.toggled();
        self.copy_mode
    }

    /// Selection to emit for `path`, or `None` if the host already has it.
    pub fn take_emission(&mut self, path: &str) -> Option<SelectionState> {
        let state = SelectionState::new(path, self.copy_mode);
        if self.last_emitted.as_ref() == Some(&state) {
            return None;
        }
        self.last_emitted = Some(state.clone());
        Some(state)
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.menu.as_ref()
    }

    pub fn open_menu(&mut self, entry: DirectoryEntry) -> &ContextMenu {
        let actions = exclusion_actions(&entry);
        self.menu.insert(ContextMenu { entry, actions })
    }

    /// Pick action `index` of the open menu, dismissing it.
    pub fn choose(&mut self, index: usize) -> Option<String> {
        let menu = self.menu.as_ref()?;
        let pattern = menu.actions.get(index)?.pattern.clone();
        self.menu = None;
        Some(pattern)
    }

    pub fn dismiss_menu(&mut self) {
        self.menu = None;
    }
}

/// Exclusion actions offered for a right-clicked entry.
pub fn exclusion_actions(entry: &DirectoryEntry) -> Vec<ExclusionAction> {
    let mut actions = vec![ExclusionAction {
        kind: ExclusionKind::ExactName,
        pattern: entry.name.clone(),
    }];

    if entry.is_directory {
        actions.push(ExclusionAction {
            kind: ExclusionKind::Subtree,
            pattern: format!("{}/**", entry.name),
        });
    } else if let Some(ext) = entry.extension() {
        actions.push(ExclusionAction {
            kind: ExclusionKind::Extension,
            pattern: format!("*.{}", ext),
        });
    }

    actions
}

/// Compiled exclusion globs, matched against entry names in the browsed directory.
#[derive(Debug, Default)]
pub struct ExclusionSet {
    patterns: Vec<Pattern>,
    /// `<name>/**` patterns, matched against directory names
    subtrees: Vec<Pattern>,
}

impl ExclusionSet {
    pub fn new<S: AsRef<str>>(patterns: &[S]) -> Result<Self, PatternError> {
        let mut set = Self::default();
        for raw in patterns {
            let raw = raw.as_ref().trim();
            if raw.is_empty() {
                continue;
            }
            match raw.strip_suffix("/**") {
                Some(dir) => set.subtrees.push(Pattern::new(dir)?),
                None => set.patterns.push(Pattern::new(raw)?),
            }
        }
        Ok(set)
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty() && self.subtrees.is_empty()
    }

    pub fn is_excluded(&self, entry: &DirectoryEntry) -> bool {
        let options = MatchOptions {
            case_sensitive: true,
            require_literal_separator: true,
            require_literal_leading_dot: false,
        };
        if self
            .patterns
            .iter()
            .any(|p| p.matches_with(&entry.name, options))
        {
            return true;
        }
        entry.is_directory
            && self
                .subtrees
                .iter()
                .any(|p| p.matches_with(&entry.name, options))
    }

    pub fn excluded_names(&self, entries: &[DirectoryEntry]) -> Vec<String> {
        if self.is_empty() {
            return Vec::new();
        }
        entries
            .iter()
            .filter(|e| self.is_excluded(e))
            .map(|e| e.name.clone())
            .collect()
    }
}
