use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use anyvcs::{Branch, Registry, Revision, Tag, VcsBackend, VcsError, VcsResult};

/// Minimal backend recognizing a fixed marker directory. Command and
/// parse methods are never reached by discovery tests.
struct FakeBackend {
    name: &'static str,
    marker: &'static str,
}

impl VcsBackend for FakeBackend {
    fn name(&self) -> &'static str {
        self.name
    }

    fn marker(&self) -> &'static str {
        self.marker
    }

    fn head(&self) -> &'static str {
        "HEAD"
    }

    fn inclusive_since(&self) -> bool {
        false
    }

    fn revision_args(&self, _id: &str) -> Vec<String> {
        Vec::new()
    }

    fn history_args(&self, _since: &str) -> Vec<String> {
        Vec::new()
    }

    fn checkout_args(&self, _rev: &str) -> Vec<String> {
        Vec::new()
    }

    fn clone_args(&self, _src: &str, _dst: &str) -> Vec<String> {
        Vec::new()
    }

    fn update_args(&self) -> Vec<String> {
        Vec::new()
    }

    fn branches_args(&self) -> Option<Vec<String>> {
        None
    }

    fn tags_args(&self) -> Vec<String> {
        Vec::new()
    }

    fn parse_revisions(&self, _data: &str) -> VcsResult<Vec<Revision>> {
        Ok(Vec::new())
    }

    fn parse_branches(&self, _data: &str) -> VcsResult<Vec<Branch>> {
        Ok(Vec::new())
    }

    fn parse_tags(&self, _data: &str) -> VcsResult<Vec<Tag>> {
        Ok(Vec::new())
    }
}

/// Backend with a custom detection predicate instead of a marker test.
struct ProbeBackend;

impl VcsBackend for ProbeBackend {
    fn name(&self) -> &'static str {
        "probed"
    }

    fn marker(&self) -> &'static str {
        ".never-used"
    }

    fn probe(&self, dir: &Path) -> Option<bool> {
        Some(dir.join("PROBE_FILE").is_file())
    }

    fn head(&self) -> &'static str {
        "HEAD"
    }

    fn inclusive_since(&self) -> bool {
        false
    }

    fn revision_args(&self, _id: &str) -> Vec<String> {
        Vec::new()
    }

    fn history_args(&self, _since: &str) -> Vec<String> {
        Vec::new()
    }

    fn checkout_args(&self, _rev: &str) -> Vec<String> {
        Vec::new()
    }

    fn clone_args(&self, _src: &str, _dst: &str) -> Vec<String> {
        Vec::new()
    }

    fn update_args(&self) -> Vec<String> {
        Vec::new()
    }

    fn branches_args(&self) -> Option<Vec<String>> {
        None
    }

    fn tags_args(&self) -> Vec<String> {
        Vec::new()
    }

    fn parse_revisions(&self, _data: &str) -> VcsResult<Vec<Revision>> {
        Ok(Vec::new())
    }

    fn parse_branches(&self, _data: &str) -> VcsResult<Vec<Branch>> {
        Ok(Vec::new())
    }

    fn parse_tags(&self, _data: &str) -> VcsResult<Vec<Tag>> {
        Ok(Vec::new())
    }
}

#[test]
fn discovers_nearest_ancestor_with_marker() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("checkout");
    let nested = root.join("src").join("deep");
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::create_dir_all(&nested).unwrap();

    let repo = Registry::with_defaults().discover(&nested).unwrap();
    assert_eq!(repo.root(), root.canonicalize().unwrap());
    assert_eq!(repo.name(), "git");
}

#[test]
fn nearest_repository_shadows_outer_one() {
    let tmp = TempDir::new().unwrap();
    let outer = tmp.path().join("outer");
    let inner = outer.join("vendor").join("inner");
    fs::create_dir_all(outer.join(".git")).unwrap();
    fs::create_dir_all(inner.join(".hg")).unwrap();

    let repo = Registry::with_defaults().discover(&inner).unwrap();
    assert_eq!(repo.root(), inner.canonicalize().unwrap());
    assert_eq!(repo.name(), "hg");
}

#[test]
fn start_path_may_be_a_file() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("checkout");
    fs::create_dir_all(root.join(".bzr")).unwrap();
    fs::write(root.join("README"), "hi").unwrap();

    let repo = Registry::with_defaults()
        .discover(root.join("README"))
        .unwrap();
    assert_eq!(repo.name(), "bzr");
}

#[test]
fn marker_must_be_a_directory() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("checkout");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join(".git"), "gitdir: elsewhere").unwrap();

    let result = Registry::with_defaults().discover(&root);
    assert!(matches!(result, Err(VcsError::NoRepository(_))));
}

#[test]
fn no_match_up_to_the_root_fails() {
    let tmp = TempDir::new().unwrap();
    let result = Registry::with_defaults().discover(tmp.path());
    assert!(matches!(result, Err(VcsError::NoRepository(_))));
}

#[test]
fn missing_start_path_fails() {
    let result = Registry::with_defaults().discover("/no/such/path/anywhere");
    assert!(matches!(result, Err(VcsError::NoRepository(_))));
}

#[test]
fn discover_at_requires_an_exact_root() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("checkout");
    let nested = root.join("src");
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::create_dir_all(&nested).unwrap();

    let registry = Registry::with_defaults();
    assert!(registry.discover_at(&root).is_ok());
    assert!(matches!(
        registry.discover_at(&nested),
        Err(VcsError::NoRepository(_))
    ));
}

#[test]
fn later_registration_wins_the_same_marker() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("checkout");
    fs::create_dir_all(root.join(".git")).unwrap();

    let mut registry = Registry::with_defaults();
    registry.register(Arc::new(FakeBackend {
        name: "git-replacement",
        marker: ".git",
    }));

    let repo = registry.discover(&root).unwrap();
    assert_eq!(repo.name(), "git-replacement");
}

#[test]
fn registration_order_decides_between_custom_backends() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("checkout");
    fs::create_dir_all(root.join(".shared")).unwrap();

    let mut registry = Registry::new();
    registry.register(Arc::new(FakeBackend {
        name: "first",
        marker: ".shared",
    }));
    registry.register(Arc::new(FakeBackend {
        name: "second",
        marker: ".shared",
    }));

    let repo = registry.discover(&root).unwrap();
    assert_eq!(repo.name(), "second");
}

#[test]
fn probe_predicate_replaces_the_marker_test() {
    let tmp = TempDir::new().unwrap();
    let root = tmp.path().join("checkout");
    fs::create_dir_all(&root).unwrap();
    fs::write(root.join("PROBE_FILE"), "").unwrap();

    let mut registry = Registry::new();
    registry.register(Arc::new(ProbeBackend));

    let repo = registry.discover(&root).unwrap();
    assert_eq!(repo.name(), "probed");

    // The probe answers for itself; the marker directory is ignored.
    let plain = TempDir::new().unwrap();
    fs::create_dir_all(plain.path().join(".never-used")).unwrap();
    assert!(matches!(
        registry.discover(plain.path()),
        Err(VcsError::NoRepository(_))
    ));
}

#[test]
fn empty_registry_never_matches() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir_all(tmp.path().join(".git")).unwrap();
    assert!(matches!(
        Registry::new().discover(tmp.path()),
        Err(VcsError::NoRepository(_))
    ));
}
