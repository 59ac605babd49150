//! Current browse path and breadcrumbs
//!
//! Paths are relative to the remote's configured base and always use `/`.
//! The empty string is the root.

use super::types::{Breadcrumb, Breadcrumbs};

/// Number of trailing segments shown before the path is elided.
const VISIBLE_BREADCRUMBS: usize = 2;

#[derive(Debug, Default)]
pub struct PathNavigator {
    current: String,
}

impl PathNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_path(&self) -> &str {
        &self.current
    }

    /// Descend into `segment`. Returns whether the path changed.
    pub fn enter(&mut self, segment: &str) -> bool {
        let segment = segment.trim_matches('/');
        if segment.is_empty() {
            return false;
        }
        self.current = join_relative_path(&self.current, segment);
        true
    }

    /// Drop the last segment; no-op at the root.
    pub fn up(&mut self) -> bool {
        if self.current.is_empty() {
            return false;
        }
        self.current = match self.current.rsplit_once('/') {
            Some((parent, _)) => parent.to_string(),
            None => String::new(),
        };
        true
    }

    /// Return to the root.
    pub fn reset(&mut self) -> bool {
        self.set(String::new())
    }

    /// Jump to an arbitrary path (breadcrumb click).
    pub fn navigate(&mut self, path: &str) -> bool {
        self.set(normalize_path(path))
    }

    pub fn breadcrumbs(&self) -> Breadcrumbs {
        breadcrumbs(&self.current)
    }

    fn set(&mut self, path: String) -> bool {
        if self.current == path {
            return false;
        }
        self.current = path;
        true
    }
}

/// Join a relative base and a child name with `/`.
pub fn join_relative_path(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{}/{}", base, name)
    }
}

/// Collapse empty and `.` segments: `"/a//./b/"` -> `"a/b"`.
pub fn normalize_path(path: &str) -> String {
    path.split('/')
        .filter(|s| !s.is_empty() && *s != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Breadcrumbs for `path`: all segments, or an ellipsis followed by the
/// last two when there are more than two.
pub fn breadcrumbs(path: &str) -> Breadcrumbs {
    let mut segments = Vec::new();
    let mut prefix = String::new();
    for name in path.split('/').filter(|s| !s.is_empty()) {
        prefix = join_relative_path(&prefix, name);
        segments.push(Breadcrumb {
            name: name.to_string(),
            path: prefix.clone(),
        });
    }

    let truncated = segments.len() > VISIBLE_BREADCRUMBS;
    if truncated {
        segments.drain(..segments.len() - VISIBLE_BREADCRUMBS);
    }

    Breadcrumbs {
        truncated,
        segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enter_and_up() {
        let mut nav = PathNavigator::new();
        assert!(nav.enter("media"));
        assert_eq!(nav.current_path(), "media");
        assert!(nav.enter("tv"));
        assert_eq!(nav.current_path(), "media/tv");

        assert!(nav.up());
        assert_eq!(nav.current_path(), "media");
        assert!(nav.up());
        assert_eq!(nav.current_path(), "");
        assert!(!nav.up());
        assert_eq!(nav.current_path(), "");
    }

    #[test]
    fn test_enter_rejects_empty_segment() {
        let mut nav = PathNavigator::new();
        assert!(!nav.enter(""));
        assert!(!nav.enter("/"));
        assert_eq!(nav.current_path(), "");
    }

    #[test]
    fn test_reset_reports_change() {
        let mut nav = PathNavigator::new();
        assert!(!nav.reset());
        nav.enter("a");
        assert!(nav.reset());
        assert_eq!(nav.current_path(), "");
    }

    #[test]
    fn test_navigate_normalizes() {
        let mut nav = PathNavigator::new();
        assert!(nav.navigate("/a//./b/"));
        assert_eq!(nav.current_path(), "a/b");
        assert!(!nav.navigate("a/b"));
    }

    #[test]
    fn test_breadcrumbs() {
        let crumbs = breadcrumbs("a/b/c/d");
        assert!(crumbs.truncated);
        assert_eq!(crumbs.names(), vec!["c", "d"]);
        assert_eq!(crumbs.segments[0].path, "a/b/c");
        assert_eq!(crumbs.segments[1].path, "a/b/c/d");

        let crumbs = breadcrumbs("a/b");
        assert!(!crumbs.truncated);
        assert_eq!(crumbs.names(), vec!["a", "b"]);

        let crumbs = breadcrumbs("");
        assert!(!crumbs.truncated);
        assert!(crumbs.segments.is_empty());
    }

    #[test]
    fn test_breadcrumbs_drop_empty_segments() {
        let crumbs = breadcrumbs("/a//b/");
        assert!(!crumbs.truncated);
        assert_eq!(crumbs.names(), vec!["a", "b"]);
    }
}
