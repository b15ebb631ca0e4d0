//! Backend capability contract and the ordered backend registry.

use std::path::Path;
use std::sync::Arc;

use crate::error::VcsResult;
use crate::types::{Branch, Revision, Tag};

/// Capability set implemented by every supported version control system.
///
/// A backend knows how to build the command line for each operation and
/// how to decode the tool's output into the canonical data model. Decoders
/// are pure functions of their input and never touch the filesystem or
/// spawn processes.
pub trait VcsBackend: Send + Sync {
    /// Executable name, e.g. "git".
    fn name(&self) -> &'static str;

    /// Repository marker directory relative to the root, e.g. ".git".
    fn marker(&self) -> &'static str;

    /// Token naming the most recent revision ("HEAD", "tip", "-1").
    fn head(&self) -> &'static str;

    /// Whether the native history range includes the `since` revision
    /// itself. When true, the facade drops the final parsed record of a
    /// bounded history query.
    fn inclusive_since(&self) -> bool;

    /// Custom repository detection for the given absolute directory.
    ///
    /// The default `None` means "test whether the marker directory
    /// exists". Backends recognizing unusual layouts (e.g. bare
    /// repositories) return `Some(matched)` instead.
    fn probe(&self, _dir: &Path) -> Option<bool> {
        None
    }

    /// Arguments fetching a single revision with its patch.
    fn revision_args(&self, id: &str) -> Vec<String>;

    /// Arguments fetching the log, bounded below by `since` when
    /// non-empty.
    fn history_args(&self, since: &str) -> Vec<String>;

    /// Arguments forcing the working copy to `rev`, discarding local
    /// modifications. An empty `rev` means the latest revision.
    fn checkout_args(&self, rev: &str) -> Vec<String>;

    /// Arguments cloning the working copy at `src` into `dst`.
    fn clone_args(&self, src: &str, dst: &str) -> Vec<String>;

    /// Arguments synchronizing against the configured upstream.
    fn update_args(&self) -> Vec<String>;

    /// Arguments listing branch heads, or `None` when the backend cannot
    /// enumerate branches.
    fn branches_args(&self) -> Option<Vec<String>>;

    /// Arguments listing tags.
    fn tags_args(&self) -> Vec<String>;

    fn parse_revisions(&self, data: &str) -> VcsResult<Vec<Revision>>;
    fn parse_branches(&self, data: &str) -> VcsResult<Vec<Branch>>;
    fn parse_tags(&self, data: &str) -> VcsResult<Vec<Tag>>;
}

/// Ordered collection of backends consulted during repository discovery.
///
/// `register` prepends, so the most recently registered backend wins when
/// several would match the same directory. There is no duplicate detection
/// and no removal; registration order alone decides matches.
#[derive(Clone)]
pub struct Registry {
    backends: Vec<Arc<dyn VcsBackend>>,
}

impl Registry {
    /// An empty registry. Discovery against it always fails.
    pub fn new() -> Self {
        Self {
            backends: Vec::new(),
        }
    }

    /// A registry holding the built-in git, mercurial and bazaar
    /// backends.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(crate::backends::git::Git));
        registry.register(Arc::new(crate::backends::mercurial::Mercurial));
        registry.register(Arc::new(crate::backends::bazaar::Bazaar));
        registry
    }

    /// Add a backend at the front of the match order.
    pub fn register(&mut self, backend: Arc<dyn VcsBackend>) {
        self.backends.insert(0, backend);
    }

    pub(crate) fn backends(&self) -> &[Arc<dyn VcsBackend>] {
        &self.backends
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
