//! Template scoring and ranking
//!
//! Each `SignalScorer` inspects a change summary against one template and
//! reports the signals it found. A template's score is the sum of the
//! reported weights; ranking never looks inside the scorers.

use serde::{Deserialize, Serialize};

use crate::analysis::summary::ChangeSummary;
use crate::templates::catalog::{Category, Template, TemplateCatalog};

/// Weight of a keyword found in a commit subject
pub const SUBJECT_KEYWORD_WEIGHT: f64 = 2.0;
/// Weight of a keyword found in a file path or the diff text
pub const CONTENT_KEYWORD_WEIGHT: f64 = 1.0;
/// Weight of path patterns covering most changed files
pub const PATH_MAJORITY_WEIGHT: f64 = 3.0;
/// Weight of the change type named by the host
pub const HOST_HINT_WEIGHT: f64 = 5.0;

/// Where a signal was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLocation {
    CommitSubject,
    FilePath,
    DiffText,
    PathMajority,
    HostHint,
}

impl MatchLocation {
    fn describe(&self) -> &'static str {
        match self {
            MatchLocation::CommitSubject => "commit subject",
            MatchLocation::FilePath => "file path",
            MatchLocation::DiffText => "diff text",
            MatchLocation::PathMajority => "changed paths",
            MatchLocation::HostHint => "change type",
        }
    }
}

/// One matched signal and what it contributed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalMatch {
    /// Keyword or path pattern that matched
    pub signal: String,
    pub location: MatchLocation,
    pub weight: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl SignalMatch {
    pub fn new(signal: impl Into<String>, location: MatchLocation, weight: f64) -> Self {
        Self {
            signal: signal.into(),
            location,
            weight,
            detail: None,
        }
    }

    fn describe(&self) -> String {
        match &self.detail {
            Some(detail) => format!("{} (+{})", detail, self.weight),
            None => format!(
                "'{}' in {} (+{})",
                self.signal,
                self.location.describe(),
                self.weight
            ),
        }
    }
}

/// A ranked template recommendation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub template_id: String,
    pub category: Category,
    pub score: f64,
    pub rationale: String,
    pub matches: Vec<SignalMatch>,
}

/// A source of evidence that a template fits a change
#[cfg_attr(test, mockall::automock)]
pub trait SignalScorer {
    /// Signals of `template` present in `summary`
    fn evaluate(&self, summary: &ChangeSummary, template: &Template) -> Vec<SignalMatch>;

    /// Sum of the weights of the signals found
    fn score(&self, summary: &ChangeSummary, template: &Template) -> f64 {
        self.evaluate(summary, template)
            .iter()
            .map(|m| m.weight)
            .sum()
    }
}

/// Keywords in commit subjects, file paths and diff text
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordScorer;

impl SignalScorer for KeywordScorer {
    fn evaluate(&self, summary: &ChangeSummary, template: &Template) -> Vec<SignalMatch> {
        let subjects: Vec<String> = summary
            .commit_log
            .iter()
            .map(|c| c.subject.to_lowercase())
            .collect();
        let paths: Vec<String> = summary.paths().map(str::to_lowercase).collect();
        let diff = summary.diff_text().map(str::to_lowercase);

        let mut matches = Vec::new();
        for keyword in &template.signals.keywords {
            let keyword = keyword.to_lowercase();

            if subjects.iter().any(|s| s.contains(&keyword)) {
                matches.push(SignalMatch::new(
                    keyword.clone(),
                    MatchLocation::CommitSubject,
                    SUBJECT_KEYWORD_WEIGHT,
                ));
            }

            // Paths and diff text count once together
            if paths.iter().any(|p| p.contains(&keyword)) {
                matches.push(SignalMatch::new(
                    keyword,
                    MatchLocation::FilePath,
                    CONTENT_KEYWORD_WEIGHT,
                ));
            } else if diff.as_deref().is_some_and(|d| d.contains(&keyword)) {
                matches.push(SignalMatch::new(
                    keyword,
                    MatchLocation::DiffText,
                    CONTENT_KEYWORD_WEIGHT,
                ));
            }
        }
        matches
    }
}

/// Path patterns matching more than half of the changed files
#[derive(Debug, Clone, Copy, Default)]
pub struct PathMajorityScorer;

impl SignalScorer for PathMajorityScorer {
    fn evaluate(&self, summary: &ChangeSummary, template: &Template) -> Vec<SignalMatch> {
        let patterns = &template.signals.path_patterns;
        let total = summary.files_changed.len();
        if patterns.is_empty() || total == 0 {
            return Vec::new();
        }

        let mut hit_patterns: Vec<&str> = Vec::new();
        let mut matched = 0;
        for path in summary.paths() {
            let mut path_matched = false;
            for pattern in patterns.iter().filter(|p| p.matches(path)) {
                path_matched = true;
                if !hit_patterns.contains(&pattern.as_str()) {
                    hit_patterns.push(pattern.as_str());
                }
            }
            if path_matched {
                matched += 1;
            }
        }

        if matched * 2 <= total {
            return Vec::new();
        }

        let signal = hit_patterns.join(", ");
        let detail = format!("{matched}/{total} changed paths match {signal}");
        vec![SignalMatch {
            signal,
            location: MatchLocation::PathMajority,
            weight: PATH_MAJORITY_WEIGHT,
            detail: Some(detail),
        }]
    }
}

/// The change type the host identified, favoring templates of that category
#[derive(Debug, Clone)]
pub struct CategoryHintScorer {
    category: Category,
    hint: String,
}

impl CategoryHintScorer {
    /// `None` when `hint` names no known category
    pub fn parse(hint: &str) -> Option<Self> {
        Category::parse(hint).map(|category| Self {
            category,
            hint: hint.trim().to_string(),
        })
    }

    pub fn category(&self) -> Category {
        self.category
    }
}

impl SignalScorer for CategoryHintScorer {
    fn evaluate(&self, _summary: &ChangeSummary, template: &Template) -> Vec<SignalMatch> {
        if template.category != self.category {
            return Vec::new();
        }
        vec![SignalMatch {
            signal: self.hint.clone(),
            location: MatchLocation::HostHint,
            weight: HOST_HINT_WEIGHT,
            detail: Some(format!(
                "change type '{}' names {}",
                self.hint, self.category
            )),
        }]
    }
}

/// Ranks catalog templates against a change summary
pub struct TemplateMatcher<'a> {
    catalog: &'a TemplateCatalog,
    scorers: Vec<Box<dyn SignalScorer>>,
}

impl<'a> TemplateMatcher<'a> {
    /// Matcher with the keyword and path-majority scorers
    pub fn new(catalog: &'a TemplateCatalog) -> Self {
        Self::with_scorers(
            catalog,
            vec![Box::new(KeywordScorer), Box::new(PathMajorityScorer)],
        )
    }

    pub fn with_scorers(catalog: &'a TemplateCatalog, scorers: Vec<Box<dyn SignalScorer>>) -> Self {
        Self { catalog, scorers }
    }

    /// Also score the host's change type
    pub fn with_hint(mut self, hint: CategoryHintScorer) -> Self {
        self.scorers.push(Box::new(hint));
        self
    }

    /// Every template, best match first
    ///
    /// Ties are broken by category priority, then id. With no matching
    /// signals at all, every template is returned at score 0.
    pub fn suggest(&self, summary: &ChangeSummary) -> Vec<Suggestion> {
        let mut suggestions: Vec<Suggestion> = self
            .catalog
            .templates()
            .iter()
            .map(|template| self.score_template(summary, template))
            .collect();

        suggestions.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.category.priority().cmp(&b.category.priority()))
                .then_with(|| a.template_id.cmp(&b.template_id))
        });

        if let Some(top) = suggestions.first() {
            tracing::debug!(
                "Top suggestion for {}: {} ({})",
                summary.base_ref,
                top.template_id,
                top.score
            );
        }
        suggestions
    }

    /// The single best suggestion, if the catalog has any templates
    pub fn best(&self, summary: &ChangeSummary) -> Option<Suggestion> {
        self.suggest(summary).into_iter().next()
    }

    fn score_template(&self, summary: &ChangeSummary, template: &Template) -> Suggestion {
        let matches: Vec<SignalMatch> = self
            .scorers
            .iter()
            .flat_map(|scorer| scorer.evaluate(summary, template))
            .collect();
        let score = matches.iter().map(|m| m.weight).sum::<f64>().max(0.0);

        Suggestion {
            template_id: template.id.clone(),
            category: template.category,
            score,
            rationale: rationale(&matches),
            matches,
        }
    }
}

fn rationale(matches: &[SignalMatch]) -> String {
    if matches.is_empty() {
        return "No signals matched; offered in catalog priority order.".to_string();
    }
    let parts: Vec<String> = matches.iter().map(SignalMatch::describe).collect();
    format!("Matched {}", parts.join(", "))
}
