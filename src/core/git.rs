//! Local git repository access
//!
//! Two layers are used side by side:
//! - `GitRepository` wraps git2 for discovery and reference resolution
//! - `GitCli` runs read-only `git` subcommands with a timeout and captures stdout

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use git2::Repository;
use once_cell::sync::Lazy;
use regex::Regex;
use tokio::process::Command;

use crate::error::{PrAgentError, Result};

/// Fallback branch names tried when the caller does not name a base
const CONVENTIONAL_BASE_BRANCHES: &[&str] = &["main", "master"];

/// Wrapper for git2 repository lookups
pub struct GitRepository {
    repo: Repository,
}

impl GitRepository {
    /// Discover a git repository from the given path
    pub fn discover<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let repo = Repository::discover(path).map_err(|_| PrAgentError::NotARepository {
            path: path.to_path_buf(),
        })?;
        Ok(Self { repo })
    }

    /// Get the repository root directory
    pub fn root_dir(&self) -> Result<PathBuf> {
        self.repo
            .workdir()
            .map(|p| p.to_path_buf())
            .ok_or_else(|| PrAgentError::NotARepository {
                path: self.repo.path().to_path_buf(),
            })
    }

    /// Whether `reference` names a commit in this repository
    pub fn resolves(&self, reference: &str) -> bool {
        !reference.starts_with('-')
            && self
                .repo
                .revparse_single(reference)
                .and_then(|obj| obj.peel_to_commit())
                .is_ok()
    }

    /// Pick the base reference for a comparison
    ///
    /// An explicit reference must resolve. Without one, the configured default
    /// is tried first, then the conventional primary branch names.
    pub fn resolve_base(&self, requested: Option<&str>, default_branch: &str) -> Result<String> {
        if let Some(reference) = requested.map(str::trim).filter(|r| !r.is_empty()) {
            return if self.resolves(reference) {
                Ok(reference.to_string())
            } else {
                Err(PrAgentError::UnknownReference(reference.to_string()))
            };
        }

        let mut candidates = vec![default_branch];
        for name in CONVENTIONAL_BASE_BRANCHES {
            if !candidates.contains(name) {
                candidates.push(name);
            }
        }

        candidates
            .into_iter()
            .find(|name| self.resolves(name))
            .map(str::to_string)
            .ok_or_else(|| PrAgentError::UnknownReference(default_branch.to_string()))
    }
}

/// Runner for read-only git subcommands
#[derive(Debug, Clone)]
pub struct GitCli {
    program: OsString,
    workdir: PathBuf,
    timeout: Duration,
}

impl GitCli {
    /// Create a runner executing `git` from `workdir`
    pub fn new(workdir: PathBuf, timeout: Duration) -> Self {
        Self {
            program: OsString::from("git"),
            workdir,
            timeout,
        }
    }

    /// Use a different executable instead of `git` on PATH
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Run `git <args>` and return its standard output
    pub async fn run(&self, args: &[&str]) -> Result<String> {
        let command = format!("git {}", args.join(" "));
        tracing::debug!("Running {} in {}", command, self.workdir.display());

        let child = Command::new(&self.program)
            .args(["-c", "core.quotepath=false", "--no-pager"])
            .args(args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("LC_ALL", "C")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| PrAgentError::ToolUnavailable {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        // Dropping the child on timeout kills it.
        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| PrAgentError::ToolUnavailable {
                command: command.clone(),
                reason: format!("timed out after {}s", self.timeout.as_secs_f64()),
            })?
            .map_err(|e| PrAgentError::ToolUnavailable {
                command: command.clone(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_git_failure(&command, stderr.trim(), &self.workdir));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

static NOT_A_REPOSITORY_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)not a git repository")
        .expect("Invalid regex pattern for repository detection")
});

static UNKNOWN_REFERENCE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:ambiguous argument|bad revision|unknown revision)[^']*'([^']+)'")
        .expect("Invalid regex pattern for reference detection")
});

/// Map a failed git invocation onto the error the host should see
pub fn classify_git_failure(command: &str, stderr: &str, workdir: &Path) -> PrAgentError {
    if NOT_A_REPOSITORY_PATTERN.is_match(stderr) {
        return PrAgentError::NotARepository {
            path: workdir.to_path_buf(),
        };
    }

    if let Some(name) = UNKNOWN_REFERENCE_PATTERN
        .captures(stderr)
        .and_then(|caps| caps.get(1))
    {
        // "base..HEAD" ranges name the base first
        let reference = name.as_str().split("..").next().unwrap_or(name.as_str());
        return PrAgentError::UnknownReference(reference.to_string());
    }

    PrAgentError::GitCommand {
        command: command.to_string(),
        stderr: stderr.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_not_a_repository() {
        let err = classify_git_failure(
            "git diff main",
            "fatal: not a git repository (or any of the parent directories): .git",
            Path::new("/tmp/x"),
        );
        assert!(matches!(err, PrAgentError::NotARepository { .. }));
    }

    #[test]
    fn test_classify_ambiguous_argument() {
        let err = classify_git_failure(
            "git diff nope",
            "fatal: ambiguous argument 'nope': unknown revision or path not in the working tree.",
            Path::new("."),
        );
        match err {
            PrAgentError::UnknownReference(name) => assert_eq!(name, "nope"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_bad_revision_range() {
        let err = classify_git_failure(
            "git log nope..HEAD",
            "fatal: bad revision 'nope..HEAD'",
            Path::new("."),
        );
        match err {
            PrAgentError::UnknownReference(name) => assert_eq!(name, "nope"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_classify_other_failure() {
        let err = classify_git_failure("git diff main", "fatal: index file corrupt", Path::new("."));
        assert!(matches!(err, PrAgentError::GitCommand { .. }));
    }

    #[test]
    fn test_discover_outside_repository() {
        let dir = tempfile::tempdir().unwrap();
        let err = GitRepository::discover(dir.path()).err().unwrap();
        assert!(matches!(err, PrAgentError::NotARepository { .. }));
    }

    #[tokio::test]
    async fn test_missing_executable_is_tool_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let git = GitCli::new(dir.path().to_path_buf(), Duration::from_secs(5))
            .with_program("definitely-not-a-real-git-binary");
        let err = git.run(&["status"]).await.unwrap_err();
        assert!(matches!(err, PrAgentError::ToolUnavailable { .. }));
    }
}
