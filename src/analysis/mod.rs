//! Change analysis
//!
//! Collects a normalized summary of the changes between a base reference
//! and the working tree.

pub mod collector;
pub mod summary;

pub use collector::{ChangeCollector, CollectRequest};
pub use summary::{ChangeSummary, CommitEntry, DiffStats, DiffText, FileChange, FileStatus};
