//! Scratch repository helpers for unit and integration testing.
//!
//! These create throwaway git/hg/bzr working copies in temporary
//! directories so tests can exercise discovery and the facade against
//! real tools. Callers should guard with [`vcs_available`] and skip when
//! a tool is not installed.

use std::path::{Path, PathBuf};
use std::process::Stdio;

use tempfile::TempDir;
use tokio::process::Command;

type HelperResult<T> = Result<T, Box<dyn std::error::Error>>;

/// Check whether a VCS tool is available on the system.
pub fn vcs_available(name: &str) -> bool {
    std::process::Command::new(name)
        .arg("--version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Options for scratch repository creation.
#[derive(Debug, Clone)]
pub struct ScratchRepoConfig {
    /// Committer name (default: "Test User")
    pub user_name: String,
    /// Committer email (default: "test@example.com")
    pub user_email: String,
    /// Initial branch for `git init -b`; other tools ignore it
    pub git_branch: String,
}

impl ScratchRepoConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the committer name.
    pub fn user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    /// Set the committer email.
    pub fn user_email(mut self, email: impl Into<String>) -> Self {
        self.user_email = email.into();
        self
    }

    /// Set the initial git branch name.
    pub fn git_branch(mut self, branch: impl Into<String>) -> Self {
        self.git_branch = branch.into();
        self
    }

    fn mailbox(&self) -> String {
        format!("{} <{}>", self.user_name, self.user_email)
    }
}

impl Default for ScratchRepoConfig {
    fn default() -> Self {
        Self {
            user_name: "Test User".to_string(),
            user_email: "test@example.com".to_string(),
            git_branch: "master".to_string(),
        }
    }
}

/// A scratch working copy rooted in a temporary directory.
pub struct ScratchRepo {
    /// Keeps the directory alive for the test's duration.
    pub dir: TempDir,
    /// Canonicalized repository root.
    pub path: PathBuf,
    config: ScratchRepoConfig,
}

async fn run_tool(
    program: &str,
    args: &[&str],
    cwd: &Path,
    envs: &[(&str, String)],
) -> HelperResult<String> {
    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (key, value) in envs {
        cmd.env(key, value);
    }
    let output = cmd.output().await?;
    if !output.status.success() {
        return Err(format!(
            "{} {:?} failed: {}",
            program,
            args,
            String::from_utf8_lossy(&output.stderr)
        )
        .into());
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

async fn new_scratch(config: Option<ScratchRepoConfig>) -> HelperResult<ScratchRepo> {
    let config = config.unwrap_or_default();
    let dir = TempDir::new()?;
    let path = dir.path().canonicalize()?;
    Ok(ScratchRepo { dir, path, config })
}

/// Create an empty git repository.
pub async fn create_git_repo(config: Option<ScratchRepoConfig>) -> HelperResult<ScratchRepo> {
    let repo = new_scratch(config).await?;
    run_tool(
        "git",
        &["init", "-b", repo.config.git_branch.as_str()],
        &repo.path,
        &[],
    )
    .await?;
    for (key, value) in [
        ("user.name", repo.config.user_name.clone()),
        ("user.email", repo.config.user_email.clone()),
        ("commit.gpgsign", "false".to_string()),
    ] {
        run_tool("git", &["config", key, value.as_str()], &repo.path, &[]).await?;
    }
    Ok(repo)
}

/// Commit `content` under `filename` and return the commit hash.
pub async fn git_commit(
    repo: &ScratchRepo,
    filename: &str,
    content: &str,
    message: &str,
) -> HelperResult<String> {
    tokio::fs::write(repo.path.join(filename), content).await?;
    run_tool("git", &["add", filename], &repo.path, &[]).await?;
    run_tool("git", &["commit", "-m", message], &repo.path, &[]).await?;
    run_tool("git", &["rev-parse", "HEAD"], &repo.path, &[]).await
}

/// Create an empty mercurial repository.
pub async fn create_hg_repo(config: Option<ScratchRepoConfig>) -> HelperResult<ScratchRepo> {
    let repo = new_scratch(config).await?;
    run_tool("hg", &["init"], &repo.path, &[]).await?;
    Ok(repo)
}

/// Commit `content` under `filename` and return the changeset node.
pub async fn hg_commit(
    repo: &ScratchRepo,
    filename: &str,
    content: &str,
    message: &str,
) -> HelperResult<String> {
    let user = [("HGUSER", repo.config.mailbox())];
    tokio::fs::write(repo.path.join(filename), content).await?;
    run_tool("hg", &["add", filename], &repo.path, &user).await?;
    run_tool("hg", &["commit", "-m", message], &repo.path, &user).await?;
    run_tool(
        "hg",
        &["log", "-l", "1", "--template", "{node}"],
        &repo.path,
        &user,
    )
    .await
}

/// Create an empty bazaar repository.
pub async fn create_bzr_repo(config: Option<ScratchRepoConfig>) -> HelperResult<ScratchRepo> {
    let repo = new_scratch(config).await?;
    let whoami = [("BZR_EMAIL", repo.config.mailbox())];
    run_tool("bzr", &["init"], &repo.path, &whoami).await?;
    Ok(repo)
}

/// Commit `content` under `filename` and return the revision number.
pub async fn bzr_commit(
    repo: &ScratchRepo,
    filename: &str,
    content: &str,
    message: &str,
) -> HelperResult<String> {
    let whoami = [("BZR_EMAIL", repo.config.mailbox())];
    tokio::fs::write(repo.path.join(filename), content).await?;
    run_tool("bzr", &["add", filename], &repo.path, &whoami).await?;
    run_tool("bzr", &["commit", "-m", message], &repo.path, &whoami).await?;
    run_tool("bzr", &["revno"], &repo.path, &whoami).await
}
