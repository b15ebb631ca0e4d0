//! Working copy discovery and the operation facade.

use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use tracing::{debug, warn};

use crate::backend::{Registry, VcsBackend};
use crate::error::{VcsError, VcsResult};
use crate::runner::{CommandOutput, CommandRunner, SystemRunner};
use crate::types::{Branch, Revision, Tag};

impl Registry {
    /// Walk up from `start` until a registered backend recognizes a
    /// directory, and bind a handle at the nearest match.
    pub fn discover<P: AsRef<Path>>(&self, start: P) -> VcsResult<VcsRepo> {
        self.discover_with_runner(start, Arc::new(SystemRunner))
    }

    /// Like [`discover`](Self::discover) with a caller supplied runner.
    pub fn discover_with_runner<P: AsRef<Path>>(
        &self,
        start: P,
        runner: Arc<dyn CommandRunner>,
    ) -> VcsResult<VcsRepo> {
        let start = start.as_ref();
        let mut dir = resolve_start(start)?;
        loop {
            if let Some(backend) = self.match_at(&dir) {
                debug!(root = %dir.display(), vcs = backend.name(), "repository discovered");
                return Ok(VcsRepo::bind(dir, backend, self.clone(), runner));
            }
            match dir.parent() {
                Some(parent) => dir = parent.to_path_buf(),
                None => break,
            }
        }
        Err(VcsError::NoRepository(start.display().to_string()))
    }

    /// Non-walking variant: succeeds only when `dir` itself is the root
    /// of a working copy.
    pub fn discover_at<P: AsRef<Path>>(&self, dir: P) -> VcsResult<VcsRepo> {
        self.discover_at_with_runner(dir, Arc::new(SystemRunner))
    }

    /// Like [`discover_at`](Self::discover_at) with a caller supplied
    /// runner.
    pub fn discover_at_with_runner<P: AsRef<Path>>(
        &self,
        dir: P,
        runner: Arc<dyn CommandRunner>,
    ) -> VcsResult<VcsRepo> {
        let dir = dir.as_ref();
        let abs = resolve_start(dir)?;
        match self.match_at(&abs) {
            Some(backend) => Ok(VcsRepo::bind(abs, backend, self.clone(), runner)),
            None => Err(VcsError::NoRepository(dir.display().to_string())),
        }
    }

    /// First registered backend matching `dir`, in registration order.
    fn match_at(&self, dir: &Path) -> Option<Arc<dyn VcsBackend>> {
        for backend in self.backends() {
            let matched = match backend.probe(dir) {
                Some(result) => result,
                None => dir.join(backend.marker()).is_dir(),
            };
            if matched {
                return Some(backend.clone());
            }
        }
        None
    }
}

fn resolve_start(start: &Path) -> VcsResult<PathBuf> {
    let mut dir = start
        .canonicalize()
        .map_err(|_| VcsError::NoRepository(start.display().to_string()))?;
    if dir.is_file() {
        dir = dir
            .parent()
            .ok_or_else(|| VcsError::NoRepository(start.display().to_string()))?
            .to_path_buf();
    }
    Ok(dir)
}

/// Handle to one discovered working copy.
///
/// The handle is immutable after creation except for the lazily resolved
/// executable path, which is cached on first use. Operations that mutate
/// state only touch the filesystem tree below [`root`](Self::root);
/// nothing is shared between handles.
pub struct VcsRepo {
    root: PathBuf,
    backend: Arc<dyn VcsBackend>,
    registry: Registry,
    runner: Arc<dyn CommandRunner>,
    executable: OnceLock<PathBuf>,
}

impl std::fmt::Debug for VcsRepo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VcsRepo")
            .field("root", &self.root)
            .field("vcs", &self.backend.name())
            .finish()
    }
}

impl VcsRepo {
    fn bind(
        root: PathBuf,
        backend: Arc<dyn VcsBackend>,
        registry: Registry,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            root,
            backend,
            registry,
            runner,
            executable: OnceLock::new(),
        }
    }

    /// Absolute path of the working copy root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Name of the underlying VCS tool ("git", "hg", "bzr").
    pub fn name(&self) -> &'static str {
        self.backend.name()
    }

    /// The most recent revision on the default branch.
    pub fn last(&self) -> VcsResult<Revision> {
        self.revision(self.backend.head())
    }

    /// The revision identified by `id`, which may be a short or a full
    /// identifier.
    pub fn revision(&self, id: &str) -> VcsResult<Revision> {
        let data = self.run(self.backend.revision_args(id))?;
        let mut revs = self.backend.parse_revisions(&data)?;
        if revs.is_empty() {
            return Err(VcsError::MalformedOutput(format!(
                "no revision record in output for {:?}",
                id
            )));
        }
        Ok(revs.remove(0))
    }

    /// All revisions newer than `since`, newest first. An empty `since`
    /// returns the full history.
    ///
    /// Backends whose native range query includes `since` itself have
    /// that final record dropped here, so the bound is exclusive for
    /// every backend.
    pub fn history(&self, since: &str) -> VcsResult<Vec<Revision>> {
        let data = self.run(self.backend.history_args(since))?;
        let mut revs = self.backend.parse_revisions(&data)?;
        if self.backend.inclusive_since() && !since.is_empty() {
            revs.pop();
        }
        Ok(revs)
    }

    /// Discard local modifications and force the working copy to `rev`.
    /// An empty `rev` checks out the latest revision.
    pub fn checkout(&self, rev: &str) -> VcsResult<()> {
        self.run(self.backend.checkout_args(rev))?;
        Ok(())
    }

    /// Clone the working copy into `dest`, then check out `rev` there.
    ///
    /// The destination's parent directory is created first. The returned
    /// handle is independent of this one; any failing stage aborts the
    /// whole operation without cleaning up a partially created
    /// destination.
    pub fn checkout_at<P: AsRef<Path>>(&self, rev: &str, dest: P) -> VcsResult<VcsRepo> {
        let dest = dest.as_ref();
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let args = self.backend.clone_args(
            &self.root.display().to_string(),
            &dest.display().to_string(),
        );
        // Relative destinations resolve against the caller's working
        // directory, so the clone runs without a cwd override.
        self.run_in(args, None)?;
        let repo = self
            .registry
            .discover_at_with_runner(dest, self.runner.clone())?;
        repo.checkout(rev)?;
        Ok(repo)
    }

    /// Pull from the configured upstream.
    pub fn update(&self) -> VcsResult<()> {
        self.run(self.backend.update_args())?;
        Ok(())
    }

    /// All branch heads. Fails with [`VcsError::Unsupported`] for
    /// backends that cannot enumerate branches.
    pub fn branches(&self) -> VcsResult<Vec<Branch>> {
        let args = self
            .backend
            .branches_args()
            .ok_or(VcsError::Unsupported {
                vcs: self.backend.name(),
                operation: "listing branches",
            })?;
        let data = self.run_listing(args)?;
        self.backend.parse_branches(&data)
    }

    /// All tags.
    pub fn tags(&self) -> VcsResult<Vec<Tag>> {
        let data = self.run_listing(self.backend.tags_args())?;
        self.backend.parse_tags(&data)
    }

    fn executable(&self) -> VcsResult<&Path> {
        if let Some(path) = self.executable.get() {
            return Ok(path.as_path());
        }
        let resolved = self
            .runner
            .resolve(self.backend.name())
            .map_err(|_| VcsError::ExecutableNotFound(self.backend.name().to_string()))?;
        Ok(self.executable.get_or_init(|| resolved).as_path())
    }

    fn exec(&self, args: &[String], cwd: Option<&Path>) -> VcsResult<(PathBuf, CommandOutput)> {
        let program = self.executable()?.to_path_buf();
        let output = self.runner.run(&program, args, cwd)?;
        Ok((program, output))
    }

    fn run(&self, args: Vec<String>) -> VcsResult<String> {
        self.run_in(args, Some(&self.root))
    }

    fn run_in(&self, args: Vec<String>, cwd: Option<&Path>) -> VcsResult<String> {
        let (program, output) = self.exec(&args, cwd)?;
        if !output.success {
            return Err(command_failed(&program, &args, cwd, &output));
        }
        Ok(String::from_utf8(output.stdout)?)
    }

    /// Variant of [`run`](Self::run) for ref listings: a non-zero exit
    /// with silent output streams means "no refs of this kind", not a
    /// failure.
    fn run_listing(&self, args: Vec<String>) -> VcsResult<String> {
        let (program, output) = self.exec(&args, Some(&self.root))?;
        if !output.success {
            if output.stdout.is_empty() && output.stderr.is_empty() {
                warn!(
                    vcs = self.backend.name(),
                    args = ?args,
                    "listing command exited non-zero with no output, treating as empty"
                );
                return Ok(String::new());
            }
            return Err(command_failed(&program, &args, Some(&self.root), &output));
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

fn command_failed(
    program: &Path,
    args: &[String],
    cwd: Option<&Path>,
    output: &CommandOutput,
) -> VcsError {
    VcsError::CommandFailed {
        command: format!("{} {}", program.display(), args.join(" ")),
        dir: cwd.map(|p| p.display().to_string()).unwrap_or_default(),
        exit_code: output.status_code.unwrap_or(-1),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    }
}
