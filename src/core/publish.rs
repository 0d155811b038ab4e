//! Publishing - commits the touched site files and pushes them to the remote.
//!
//! The workflow only sees the [`Publisher`] capability. [`GitCli`] implements
//! it by shelling out to the `git` binary in the site root.

use crate::config::{GitConfig, Secret};
use crate::errors::{Error, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Output;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Files to commit together under one message. Paths are repository-relative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeSet {
    pub message: String,
    pub paths: Vec<PathBuf>,
}

/// How far publishing got.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PublishReport {
    /// A commit was created for the change set
    pub committed: bool,
    /// Why the push failed, if it did
    pub push_error: Option<String>,
}

impl PublishReport {
    #[must_use]
    pub const fn pushed(&self) -> bool {
        self.committed && self.push_error.is_none()
    }
}

/// Records a change set in version control and ships it to the remote.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Commits `change`. Push failures are reported, not returned as errors.
    async fn publish(&self, change: &ChangeSet) -> Result<PublishReport>;
}

/// [`Publisher`] backed by the `git` command line.
#[derive(Clone)]
pub struct GitCli {
    repo_root: PathBuf,
    author_name: String,
    author_email: String,
    remote_url: String,
    branch: String,
    secret: Option<Secret>,
}

impl GitCli {
    #[must_use]
    pub fn new(repo_root: impl Into<PathBuf>, git: &GitConfig) -> Self {
        Self {
            repo_root: repo_root.into(),
            author_name: git.author_name.clone(),
            author_email: git.author_email.clone(),
            remote_url: git.remote_url(),
            branch: git.branch.clone(),
            secret: git.token.clone(),
        }
    }

    /// Points the publisher at an explicit remote, e.g. a local bare repository.
    #[must_use]
    pub fn with_remote_url(mut self, remote_url: impl Into<String>) -> Self {
        self.remote_url = remote_url.into();
        self
    }

    #[must_use]
    pub fn repo_root(&self) -> &Path {
        &self.repo_root
    }

    fn redact(&self, text: &str) -> String {
        self.secret
            .as_ref()
            .map_or_else(|| text.to_string(), |secret| secret.redact(text))
    }

    async fn output(&self, args: &[&str]) -> Result<Output> {
        debug!("git {}", self.redact(&args.join(" ")));
        Command::new("git")
            .args(args)
            .current_dir(&self.repo_root)
            .env("GIT_TERMINAL_PROMPT", "0")
            .output()
            .await
            .map_err(|e| Error::Git {
                command: self.describe(args),
                detail: e.to_string(),
            })
    }

    /// Runs git and fails unless it exits successfully.
    async fn run(&self, args: &[&str]) -> Result<Output> {
        let output = self.output(args).await?;
        if output.status.success() {
            Ok(output)
        } else {
            Err(Error::Git {
                command: self.describe(args),
                detail: self.redact(&combined_output(&output)),
            })
        }
    }

    /// Commits whatever is staged. `Ok(false)` when there was nothing to commit.
    async fn commit(&self, message: &str) -> Result<bool> {
        let output = self.output(&["commit", "-m", message]).await?;
        if output.status.success() {
            return Ok(true);
        }
        let text = combined_output(&output);
        if is_nothing_to_commit(&text) {
            return Ok(false);
        }
        Err(Error::Git {
            command: "commit".to_string(),
            detail: self.redact(&text),
        })
    }

    fn describe(&self, args: &[&str]) -> String {
        self.redact(args.first().copied().unwrap_or_default())
    }

    async fn prepare_repository(&self) -> Result<()> {
        self.run(&["init", "--quiet"]).await?;
        self.run(&["config", "user.email", &self.author_email])
            .await?;
        self.run(&["config", "user.name", &self.author_name]).await?;

        if self
            .run(&["remote", "add", "origin", &self.remote_url])
            .await
            .is_err()
        {
            if let Err(e) = self
                .run(&["remote", "set-url", "origin", &self.remote_url])
                .await
            {
                warn!("Git remote setup error: {e}");
            }
        }

        if self.run(&["checkout", &self.branch]).await.is_err() {
            self.run(&["checkout", "-b", &self.branch]).await?;
        }
        Ok(())
    }

    /// Commits unrelated pending changes so the change set gets its own commit.
    async fn commit_pending(&self, change: &ChangeSet) {
        let excludes = change
            .paths
            .iter()
            .map(|p| format!(":(exclude){}", pathspec(p)))
            .collect::<Vec<_>>();
        let mut args = vec!["add", "-A", "--", "."];
        args.extend(excludes.iter().map(String::as_str));

        let result = match self.run(&args).await {
            Ok(_) => self.commit("Staging changes").await,
            Err(e) => Err(e),
        };
        match result {
            Ok(true) => info!("Committed pending changes before publishing"),
            Ok(false) => {}
            Err(e) => warn!("Commit error: {e}"),
        }
    }

    async fn stage(&self, change: &ChangeSet) -> Result<()> {
        for path in &change.paths {
            let spec = pathspec(path);
            if self.repo_root.join(path).exists() {
                self.run(&["add", "--", &spec]).await?;
            } else {
                self.run(&["rm", "--cached", "--ignore-unmatch", "--quiet", "--", &spec])
                    .await?;
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for GitCli {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitCli")
            .field("repo_root", &self.repo_root)
            .field("remote_url", &self.redact(&self.remote_url))
            .field("branch", &self.branch)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl Publisher for GitCli {
    async fn publish(&self, change: &ChangeSet) -> Result<PublishReport> {
        self.prepare_repository().await?;
        self.commit_pending(change).await;

        self.stage(change).await?;
        let committed = self.commit(&change.message).await?;
        if !committed {
            info!("Nothing to commit for {:?}", change.message);
        }

        let push_error = match self
            .run(&["push", "-u", "origin", &self.branch])
            .await
        {
            Ok(_) => {
                info!("Pushed {:?} to origin/{}", change.message, self.branch);
                None
            }
            Err(e) => {
                warn!("Git push error: {e}");
                Some(e.to_string())
            }
        };

        Ok(PublishReport {
            committed,
            push_error,
        })
    }
}

fn pathspec(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

fn combined_output(output: &Output) -> String {
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    format!("{}\n{}", stdout.trim(), stderr.trim())
        .trim()
        .to_string()
}

fn is_nothing_to_commit(text: &str) -> bool {
    text.contains("nothing to commit") || text.contains("nothing added to commit")
}
