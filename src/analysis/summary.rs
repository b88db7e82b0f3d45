//! Change summary types
//!
//! A `ChangeSummary` is built fresh for every request and never shared.

use serde::{Deserialize, Serialize};

/// How a file changed between the base and the working tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileStatus {
    Added,
    Modified,
    Deleted,
    Renamed,
}

impl FileStatus {
    /// Parse a `--name-status` letter (R and C carry a similarity score)
    pub fn from_code(code: &str) -> Option<Self> {
        match code.chars().next()? {
            'A' | 'C' => Some(FileStatus::Added),
            'M' | 'T' | 'U' => Some(FileStatus::Modified),
            'D' => Some(FileStatus::Deleted),
            'R' => Some(FileStatus::Renamed),
            _ => None,
        }
    }
}

/// One changed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    /// Path relative to the repository root (new path for renames)
    pub path: String,
    /// Previous path, for renames
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_path: Option<String>,
    pub additions: u64,
    pub deletions: u64,
    pub status: FileStatus,
    /// git reported no line counts for this file
    #[serde(default)]
    pub binary: bool,
}

/// A commit present in the working tree but not in the base
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEntry {
    pub hash: String,
    pub subject: String,
}

/// Totals reported by `git diff --shortstat`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffStats {
    pub files: u64,
    pub insertions: u64,
    pub deletions: u64,
}

/// Unified diff text, possibly cut to a line cap
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffText {
    pub text: String,
    /// Lines in the full diff
    pub total_lines: usize,
    /// Lines kept in `text`
    pub shown_lines: usize,
    /// Set when `total_lines` exceeded the cap
    pub truncated: bool,
}

impl DiffText {
    /// Keep at most `max_lines` lines of `full`
    pub fn truncate(full: &str, max_lines: usize) -> Self {
        let total_lines = full.lines().count();
        if total_lines <= max_lines {
            return Self {
                text: full.to_string(),
                total_lines,
                shown_lines: total_lines,
                truncated: false,
            };
        }

        // Line endings are kept as-is, including CRLF
        let text: String = full.split_inclusive('\n').take(max_lines).collect();
        Self {
            text,
            total_lines,
            shown_lines: max_lines,
            truncated: true,
        }
    }
}

/// Normalized view of the changes between a base reference and the working tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeSummary {
    pub base_ref: String,
    #[serde(default)]
    pub files_changed: Vec<FileChange>,
    #[serde(default)]
    pub commit_log: Vec<CommitEntry>,
    #[serde(default)]
    pub stats: DiffStats,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff: Option<DiffText>,
    /// Why requested diff text is missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diff_omitted: Option<String>,
}

impl ChangeSummary {
    /// A summary with no files and no commits
    pub fn empty(base_ref: impl Into<String>) -> Self {
        Self {
            base_ref: base_ref.into(),
            files_changed: Vec::new(),
            commit_log: Vec::new(),
            stats: DiffStats::default(),
            diff: None,
            diff_omitted: None,
        }
    }

    pub fn total_additions(&self) -> u64 {
        self.files_changed.iter().map(|f| f.additions).sum()
    }

    pub fn total_deletions(&self) -> u64 {
        self.files_changed.iter().map(|f| f.deletions).sum()
    }

    /// Changed paths in collection order
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files_changed.iter().map(|f| f.path.as_str())
    }

    /// Diff text, if it was collected
    pub fn diff_text(&self) -> Option<&str> {
        self.diff.as_ref().map(|d| d.text.as_str())
    }

    /// Whether diff text was cut at the line cap
    pub fn is_truncated(&self) -> bool {
        self.diff.as_ref().is_some_and(|d| d.truncated)
    }

    pub fn is_empty(&self) -> bool {
        self.files_changed.is_empty() && self.commit_log.is_empty()
    }
}
