//! PR template catalog
//!
//! Each template is one TOML record (id, title, category, signals, content).
//! The records in the repository's `templates/` directory are embedded as
//! the built-in catalog; a configured directory replaces them at startup.

use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PrAgentError, Result};
use crate::templates::pattern::PathPattern;

/// Records compiled into the binary
const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    ("bugfix.toml", include_str!("../../templates/bugfix.toml")),
    ("documentation.toml", include_str!("../../templates/documentation.toml")),
    ("feature.toml", include_str!("../../templates/feature.toml")),
    ("performance.toml", include_str!("../../templates/performance.toml")),
    ("refactor.toml", include_str!("../../templates/refactor.toml")),
    ("security.toml", include_str!("../../templates/security.toml")),
    ("test.toml", include_str!("../../templates/test.toml")),
];

/// Kind of change a template is written for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Category {
    Security,
    Bugfix,
    Feature,
    Performance,
    Refactor,
    Test,
    Documentation,
}

impl Category {
    /// All categories, highest priority first
    pub fn all() -> &'static [Category] {
        &[
            Category::Security,
            Category::Bugfix,
            Category::Feature,
            Category::Performance,
            Category::Refactor,
            Category::Test,
            Category::Documentation,
        ]
    }

    /// Tie-break rank; lower ranks are surfaced first
    pub fn priority(&self) -> usize {
        Category::all()
            .iter()
            .position(|c| c == self)
            .unwrap_or(usize::MAX)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Security => "security",
            Category::Bugfix => "bugfix",
            Category::Feature => "feature",
            Category::Performance => "performance",
            Category::Refactor => "refactor",
            Category::Test => "test",
            Category::Documentation => "documentation",
        }
    }

    /// Parse a category name or one of its common aliases
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "security" | "sec" => Some(Category::Security),
            "bugfix" | "bug" | "fix" | "hotfix" => Some(Category::Bugfix),
            "feature" | "feat" | "enhancement" => Some(Category::Feature),
            "performance" | "perf" | "optimization" => Some(Category::Performance),
            "refactor" | "cleanup" => Some(Category::Refactor),
            "test" | "tests" | "testing" => Some(Category::Test),
            "documentation" | "docs" | "doc" => Some(Category::Documentation),
            _ => None,
        }
    }
}

impl TryFrom<String> for Category {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Category::parse(&value).ok_or_else(|| format!("unknown category '{value}'"))
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Cues that make a template relevant to a change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Signals {
    /// Matched case-insensitively against commit subjects, paths and diff text
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Matched against changed file paths
    #[serde(default)]
    pub path_patterns: Vec<PathPattern>,
}

/// A PR description template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub title: String,
    pub category: Category,
    pub content: String,
    #[serde(default)]
    pub signals: Signals,
}

impl Template {
    /// Parse one TOML record
    pub fn from_toml(source_name: &str, contents: &str) -> Result<Self> {
        let mut template: Template =
            toml::from_str(contents).map_err(|e| PrAgentError::TemplateCatalog {
                source_name: source_name.to_string(),
                reason: e.to_string(),
            })?;

        template.id = template.id.trim().to_string();
        if template.id.is_empty() {
            return Err(PrAgentError::TemplateCatalog {
                source_name: source_name.to_string(),
                reason: "id must not be empty".into(),
            });
        }

        // Keywords are compared lowercased
        let mut seen = HashSet::new();
        template.signals.keywords = template
            .signals
            .keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty() && seen.insert(k.clone()))
            .collect();

        Ok(template)
    }
}

/// Immutable set of templates, ordered by id
#[derive(Debug, Clone)]
pub struct TemplateCatalog {
    templates: Vec<Template>,
    location: String,
}

impl TemplateCatalog {
    /// Load from `dir` when given, otherwise the built-in records
    pub fn load(dir: Option<&Path>) -> Result<Self> {
        let catalog = match dir {
            Some(dir) => Self::load_dir(dir)?,
            None => Self::builtin()?,
        };

        if let Some(warning) = catalog.empty_warning() {
            tracing::warn!("{}", warning);
        } else {
            tracing::info!(
                "Loaded {} templates from {}",
                catalog.len(),
                catalog.location()
            );
        }
        Ok(catalog)
    }

    /// The catalog compiled into the binary
    pub fn builtin() -> Result<Self> {
        let templates = BUILTIN_TEMPLATES
            .iter()
            .map(|(name, contents)| Template::from_toml(name, contents))
            .collect::<Result<Vec<_>>>()?;
        Self::from_templates(templates, "built-in templates")
    }

    /// Read every `*.toml` record in `dir`
    pub fn load_dir(dir: &Path) -> Result<Self> {
        let mut paths = Vec::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "toml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut templates = Vec::with_capacity(paths.len());
        for path in &paths {
            let contents = fs::read_to_string(path)?;
            templates.push(Template::from_toml(&path.display().to_string(), &contents)?);
        }

        Self::from_templates(templates, dir.display().to_string())
    }

    /// Build a catalog from already-parsed templates
    pub fn from_templates(mut templates: Vec<Template>, location: impl Into<String>) -> Result<Self> {
        let location = location.into();
        templates.sort_by(|a, b| a.id.cmp(&b.id));

        if let Some(pair) = templates.windows(2).find(|pair| pair[0].id == pair[1].id) {
            return Err(PrAgentError::TemplateCatalog {
                source_name: location,
                reason: format!("duplicate template id '{}'", pair[0].id),
            });
        }

        Ok(Self {
            templates,
            location,
        })
    }

    /// All templates, ordered by id
    pub fn templates(&self) -> &[Template] {
        &self.templates
    }

    pub fn get(&self, id: &str) -> Option<&Template> {
        self.templates
            .binary_search_by(|t| t.id.as_str().cmp(id))
            .ok()
            .map(|idx| &self.templates[idx])
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Where the templates were loaded from
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The warning to report when there is nothing to list or suggest
    pub fn empty_warning(&self) -> Option<PrAgentError> {
        self.is_empty().then(|| PrAgentError::TemplateCatalogEmpty {
            location: self.location.clone(),
        })
    }
}
