//! PR template catalog and matching
//!
//! This module provides:
//! - The data-driven template catalog
//! - Glob-style path patterns used as signals
//! - Scoring and ranking of templates against a change summary

pub mod catalog;
pub mod matcher;
pub mod pattern;

pub use catalog::{Category, Signals, Template, TemplateCatalog};
pub use matcher::{
    CategoryHintScorer, KeywordScorer, MatchLocation, PathMajorityScorer, SignalMatch,
    SignalScorer, Suggestion, TemplateMatcher,
};
pub use pattern::PathPattern;
