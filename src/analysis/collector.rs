//! Change collection
//!
//! Runs read-only git queries between a base reference and the working
//! tree and folds their output into a `ChangeSummary`.

use std::collections::{BTreeSet, HashMap};
use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::analysis::summary::{
    ChangeSummary, CommitEntry, DiffStats, DiffText, FileChange, FileStatus,
};
use crate::core::config::Config;
use crate::core::git::{GitCli, GitRepository};
use crate::error::Result;

/// Separator placed between hash and subject in log output
const LOG_FIELD_SEPARATOR: char = '\u{1f}';

/// Parameters of one collection request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectRequest {
    /// Comparison point; the configured default branch when `None`
    pub base_ref: Option<String>,
    pub include_diff: bool,
    /// Zero or negative means no diff text
    pub max_diff_lines: i64,
}

impl CollectRequest {
    /// Line cap for diff text, or `None` when no diff text is wanted
    pub fn diff_line_cap(&self) -> Option<usize> {
        if self.include_diff && self.max_diff_lines > 0 {
            usize::try_from(self.max_diff_lines).ok()
        } else {
            None
        }
    }
}

/// Collects change summaries for one working directory
#[derive(Debug, Clone)]
pub struct ChangeCollector {
    workdir: PathBuf,
    default_base: String,
    timeout: Duration,
    git_program: Option<OsString>,
}

impl ChangeCollector {
    pub fn new(workdir: impl Into<PathBuf>, config: &Config) -> Self {
        Self {
            workdir: workdir.into(),
            default_base: config.default_base_branch.clone(),
            timeout: config.git_timeout(),
            git_program: None,
        }
    }

    /// Run a different executable instead of `git` on PATH
    pub fn with_git_program(mut self, program: impl Into<OsString>) -> Self {
        self.git_program = Some(program.into());
        self
    }

    /// Build a summary of the changes between the base and the working tree
    pub async fn collect(&self, request: &CollectRequest) -> Result<ChangeSummary> {
        // The repository handle is not kept across requests.
        let (root, base_ref) = {
            let repo = GitRepository::discover(&self.workdir)?;
            let base = repo.resolve_base(request.base_ref.as_deref(), &self.default_base)?;
            (repo.root_dir()?, base)
        };
        tracing::info!("Collecting changes in {} against {}", root.display(), base_ref);

        let git = self.git_cli(root);
        let base = base_ref.as_str();

        let name_status = git
            .run(&["diff", "--no-color", "--no-ext-diff", "--name-status", "-z", "-M", base, "--"])
            .await?;
        let numstat = git
            .run(&["diff", "--no-color", "--no-ext-diff", "--numstat", "-z", "-M", base, "--"])
            .await?;
        let shortstat = git
            .run(&["diff", "--no-color", "--no-ext-diff", "--shortstat", "-M", base, "--"])
            .await?;

        let range = format!("{base}..HEAD");
        let log = git
            .run(&["log", "--no-color", "--format=%H%x1f%s", range.as_str()])
            .await?;

        let mut summary = ChangeSummary {
            base_ref: base_ref.clone(),
            files_changed: merge_file_changes(parse_name_status(&name_status), parse_numstat(&numstat)),
            commit_log: parse_log(&log),
            stats: parse_shortstat(&shortstat),
            diff: None,
            diff_omitted: None,
        };

        if let Some(cap) = request.diff_line_cap() {
            let diff = git
                .run(&[
                    "diff",
                    "--no-color",
                    "--no-ext-diff",
                    "--src-prefix=a/",
                    "--dst-prefix=b/",
                    "-M",
                    base,
                    "--",
                ])
                .await;
            match diff {
                Ok(full) => {
                    check_consistency(&summary, &full);
                    let text = DiffText::truncate(&full, cap);
                    if text.truncated {
                        tracing::info!(
                            "Diff truncated to {} of {} lines",
                            text.shown_lines,
                            text.total_lines
                        );
                    }
                    summary.diff = Some(text);
                }
                Err(e) => {
                    tracing::warn!("Diff text unavailable, returning file stats only: {}", e);
                    summary.diff_omitted = Some(e.to_string());
                }
            }
        }

        tracing::debug!(
            "Collected {} files, {} commits against {}",
            summary.files_changed.len(),
            summary.commit_log.len(),
            summary.base_ref
        );
        Ok(summary)
    }

    fn git_cli(&self, root: PathBuf) -> GitCli {
        let git = GitCli::new(root, self.timeout);
        match &self.git_program {
            Some(program) => git.with_program(program.clone()),
            None => git,
        }
    }
}

/// Entry from `git diff --name-status -z`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameStatus {
    pub path: String,
    pub old_path: Option<String>,
    pub status: FileStatus,
}

/// Entry from `git diff --numstat -z`; counts are `None` for binary files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NumStat {
    pub path: String,
    pub additions: Option<u64>,
    pub deletions: Option<u64>,
}

/// Parse NUL-separated `--name-status` output
pub fn parse_name_status(output: &str) -> Vec<NameStatus> {
    let mut tokens = output.split('\0').filter(|t| !t.is_empty());
    let mut entries = Vec::new();

    while let Some(code) = tokens.next() {
        let Some(status) = FileStatus::from_code(code) else {
            tracing::warn!("Skipping unknown name-status code '{}'", code);
            continue;
        };

        // Renames and copies are followed by source and destination paths
        if code.starts_with('R') || code.starts_with('C') {
            let (Some(old), Some(new)) = (tokens.next(), tokens.next()) else {
                break;
            };
            entries.push(NameStatus {
                path: new.to_string(),
                old_path: (status == FileStatus::Renamed).then(|| old.to_string()),
                status,
            });
        } else if let Some(path) = tokens.next() {
            entries.push(NameStatus {
                path: path.to_string(),
                old_path: None,
                status,
            });
        }
    }

    entries
}

/// Parse NUL-separated `--numstat` output
pub fn parse_numstat(output: &str) -> Vec<NumStat> {
    let mut tokens = output.split('\0');
    let mut entries = Vec::new();

    while let Some(record) = tokens.next() {
        let record = record.trim_start_matches('\n');
        if record.is_empty() {
            continue;
        }

        let mut fields = record.splitn(3, '\t');
        let (Some(added), Some(deleted)) = (fields.next(), fields.next()) else {
            continue;
        };
        let path = match fields.next() {
            Some(path) if !path.is_empty() => path.to_string(),
            // Empty path field: a rename, followed by source and destination
            _ => {
                let (Some(_old), Some(new)) = (tokens.next(), tokens.next()) else {
                    break;
                };
                new.to_string()
            }
        };

        entries.push(NumStat {
            path,
            additions: added.parse().ok(),
            deletions: deleted.parse().ok(),
        });
    }

    entries
}

/// Join name-status and numstat entries by path, keeping name-status order
pub fn merge_file_changes(statuses: Vec<NameStatus>, stats: Vec<NumStat>) -> Vec<FileChange> {
    let mut counts: HashMap<String, NumStat> =
        stats.into_iter().map(|s| (s.path.clone(), s)).collect();

    let files: Vec<FileChange> = statuses
        .into_iter()
        .map(|entry| {
            let stat = counts.remove(&entry.path);
            let (additions, deletions) = stat
                .as_ref()
                .map(|s| (s.additions, s.deletions))
                .unwrap_or((Some(0), Some(0)));
            FileChange {
                path: entry.path,
                old_path: entry.old_path,
                additions: additions.unwrap_or(0),
                deletions: deletions.unwrap_or(0),
                status: entry.status,
                binary: additions.is_none() || deletions.is_none(),
            }
        })
        .collect();

    if !counts.is_empty() {
        tracing::warn!(
            "Line counts reported for paths missing from the status list: {:?}",
            counts.keys().collect::<Vec<_>>()
        );
    }

    files
}

static FILES_CHANGED_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+) files? changed").expect("Invalid files changed pattern"));
static INSERTIONS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+) insertions?\(\+\)").expect("Invalid insertions pattern"));
static DELETIONS_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+) deletions?\(-\)").expect("Invalid deletions pattern"));

/// Parse the one-line `--shortstat` summary; empty output means no changes
pub fn parse_shortstat(output: &str) -> DiffStats {
    let count = |pattern: &Regex| {
        pattern
            .captures(output)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
            .unwrap_or(0)
    };

    DiffStats {
        files: count(&FILES_CHANGED_PATTERN),
        insertions: count(&INSERTIONS_PATTERN),
        deletions: count(&DELETIONS_PATTERN),
    }
}

/// Parse `--format=%H%x1f%s` log output
pub fn parse_log(output: &str) -> Vec<CommitEntry> {
    output
        .lines()
        .filter_map(|line| {
            let (hash, subject) = line.split_once(LOG_FIELD_SEPARATOR)?;
            let hash = hash.trim();
            (!hash.is_empty()).then(|| CommitEntry {
                hash: hash.to_string(),
                subject: subject.trim().to_string(),
            })
        })
        .collect()
}

/// Destination path named by a `diff --git a/<old> b/<new>` header
pub fn parse_diff_header(line: &str) -> Option<String> {
    let rest = line.strip_prefix("diff --git ")?.strip_prefix("a/")?;

    // Unchanged path: "<p> b/<p>"
    if rest.len() >= 3 && (rest.len() - 3) % 2 == 0 {
        let n = (rest.len() - 3) / 2;
        if rest.is_char_boundary(n) && rest.is_char_boundary(n + 3) {
            let (old, tail) = rest.split_at(n);
            if let Some(new) = tail.strip_prefix(" b/") {
                if old == new {
                    return Some(new.to_string());
                }
            }
        }
    }

    rest.rfind(" b/").map(|idx| rest[idx + 3..].to_string())
}

/// Paths named by the file headers of a unified diff
pub fn diff_paths(diff: &str) -> BTreeSet<String> {
    diff.lines().filter_map(parse_diff_header).collect()
}

/// Log when the diff and the file list disagree about which paths changed
fn check_consistency(summary: &ChangeSummary, full_diff: &str) {
    let in_diff = diff_paths(full_diff);
    let in_files: BTreeSet<String> = summary.paths().map(str::to_string).collect();
    if in_diff != in_files {
        tracing::warn!(
            "Diff and file list disagree: only in diff {:?}, only in file list {:?}",
            in_diff.difference(&in_files).collect::<Vec<_>>(),
            in_files.difference(&in_diff).collect::<Vec<_>>()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_name_status_with_rename() {
        let output = "M\0src/lib.rs\0R087\0old/name.rs\0new/name.rs\0A\0docs/guide.md\0D\0gone.txt\0";
        let entries = parse_name_status(output);
        assert_eq!(entries.len(), 4);
        assert_eq!(entries[0].status, FileStatus::Modified);
        assert_eq!(entries[1].path, "new/name.rs");
        assert_eq!(entries[1].old_path.as_deref(), Some("old/name.rs"));
        assert_eq!(entries[1].status, FileStatus::Renamed);
        assert_eq!(entries[2].status, FileStatus::Added);
        assert_eq!(entries[3].status, FileStatus::Deleted);
    }

    #[test]
    fn test_parse_numstat_with_rename_and_binary() {
        let output = "3\t1\tsrc/lib.rs\0\
                      2\t2\t\0old/name.rs\0new/name.rs\0\
                      -\t-\tlogo.png\0";
        let entries = parse_numstat(output);
        assert_eq!(
            entries,
            vec![
                NumStat {
                    path: "src/lib.rs".into(),
                    additions: Some(3),
                    deletions: Some(1)
                },
                NumStat {
                    path: "new/name.rs".into(),
                    additions: Some(2),
                    deletions: Some(2)
                },
                NumStat {
                    path: "logo.png".into(),
                    additions: None,
                    deletions: None
                },
            ]
        );
    }

    #[test]
    fn test_merge_keeps_status_order() {
        let statuses = parse_name_status("A\0logo.png\0M\0src/lib.rs\0");
        let stats = parse_numstat("3\t1\tsrc/lib.rs\0-\t-\tlogo.png\0");
        let files = merge_file_changes(statuses, stats);
        assert_eq!(files[0].path, "logo.png");
        assert!(files[0].binary);
        assert_eq!(files[0].additions, 0);
        assert_eq!(files[1].path, "src/lib.rs");
        assert_eq!((files[1].additions, files[1].deletions), (3, 1));
        assert!(!files[1].binary);
    }

    #[test]
    fn test_parse_shortstat() {
        let stats = parse_shortstat(" 3 files changed, 10 insertions(+), 2 deletions(-)\n");
        assert_eq!(
            stats,
            DiffStats {
                files: 3,
                insertions: 10,
                deletions: 2
            }
        );

        let stats = parse_shortstat(" 1 file changed, 1 insertion(+)\n");
        assert_eq!(stats.files, 1);
        assert_eq!(stats.insertions, 1);
        assert_eq!(stats.deletions, 0);

        assert_eq!(parse_shortstat(""), DiffStats::default());
    }

    #[test]
    fn test_parse_log() {
        let output = "abc123\u{1f}Fix crash on empty input\n\
                      def456\u{1f}Add parser tests\n\n";
        let commits = parse_log(output);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].hash, "abc123");
        assert_eq!(commits[0].subject, "Fix crash on empty input");
        assert_eq!(commits[1].subject, "Add parser tests");
    }

    #[test]
    fn test_parse_diff_header() {
        assert_eq!(
            parse_diff_header("diff --git a/src/lib.rs b/src/lib.rs").as_deref(),
            Some("src/lib.rs")
        );
        assert_eq!(
            parse_diff_header("diff --git a/dir b/x.txt b/dir b/x.txt").as_deref(),
            Some("dir b/x.txt")
        );
        assert_eq!(
            parse_diff_header("diff --git a/old.rs b/new.rs").as_deref(),
            Some("new.rs")
        );
        assert_eq!(parse_diff_header("+++ b/src/lib.rs"), None);
    }

    #[test]
    fn test_diff_line_cap() {
        let request = CollectRequest {
            base_ref: None,
            include_diff: true,
            max_diff_lines: 5,
        };
        assert_eq!(request.diff_line_cap(), Some(5));

        let request = CollectRequest {
            max_diff_lines: 0,
            ..request.clone()
        };
        assert_eq!(request.diff_line_cap(), None);

        let request = CollectRequest {
            include_diff: true,
            max_diff_lines: -3,
            base_ref: None,
        };
        assert_eq!(request.diff_line_cap(), None);

        let request = CollectRequest {
            include_diff: false,
            max_diff_lines: 100,
            base_ref: None,
        };
        assert_eq!(request.diff_line_cap(), None);
    }
}
