//! Host-facing outputs
//!
//! - selection updates go to an unbounded channel the host drains
//! - chosen exclusion patterns go to an optional host callback
//!
//! A host that dropped its receiver or registered no callback simply
//! stops receiving; the browser keeps working.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use super::types::SelectionState;

/// Receives exclusion patterns chosen from an entry's context menu.
pub type ExclusionCallback = Arc<dyn Fn(String) + Send + Sync>;

pub type SelectionReceiver = mpsc::UnboundedReceiver<SelectionState>;

pub struct BrowserEmitter {
    selection_tx: mpsc::UnboundedSender<SelectionState>,
    on_exclusion: Option<ExclusionCallback>,
}

impl BrowserEmitter {
    pub fn new(on_exclusion: Option<ExclusionCallback>) -> (Self, SelectionReceiver) {
        let (selection_tx, selection_rx) = mpsc::unbounded_channel();
        (
            Self {
                selection_tx,
                on_exclusion,
            },
            selection_rx,
        )
    }

    pub fn emit_selection(&self, state: SelectionState) {
        debug!(
            "Selection: {:?} ({:?})",
            state.current_path, state.copy_mode
        );
        if self.selection_tx.send(state).is_err() {
            debug!("Selection receiver dropped, skipping");
        }
    }

    /// Returns whether a collaborator received the pattern.
    pub fn emit_exclusion(&self, pattern: String) -> bool {
        match self.on_exclusion {
            Some(ref callback) => {
                debug!("Exclusion requested: {}", pattern);
                callback(pattern);
                true
            }
            None => {
                debug!("No exclusion collaborator, dropping {}", pattern);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::browser::types::CopyMode;
    use parking_lot::Mutex;

    #[test]
    fn test_selection_reaches_receiver() {
        let (emitter, mut rx) = BrowserEmitter::new(None);
        emitter.emit_selection(SelectionState::new("a", CopyMode::Contents));
        assert_eq!(
            rx.try_recv().unwrap(),
            SelectionState::new("a", CopyMode::Contents)
        );
    }

    #[test]
    fn test_emit_without_receiver_is_noop() {
        let (emitter, rx) = BrowserEmitter::new(None);
        drop(rx);
        emitter.emit_selection(SelectionState::new("a", CopyMode::Folder));
        assert!(!emitter.emit_exclusion("*.tmp".to_string()));
    }

    #[test]
    fn test_exclusion_callback() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let (emitter, _rx) = BrowserEmitter::new(Some(Arc::new(move |p: String| sink.lock().push(p))));

        assert!(emitter.emit_exclusion("*.nfo".to_string()));
        assert_eq!(*seen.lock(), vec!["*.nfo".to_string()]);
    }
}
