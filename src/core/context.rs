//! Per-process application context
//!
//! Holds the configuration and the template catalog, both loaded once at
//! startup and only read afterwards.

use std::path::PathBuf;

use crate::analysis::{ChangeCollector, ChangeSummary, CollectRequest};
use crate::core::config::Config;
use crate::error::Result;
use crate::templates::{CategoryHintScorer, Suggestion, TemplateCatalog, TemplateMatcher};

pub struct AppContext {
    config: Config,
    workdir: PathBuf,
    catalog: TemplateCatalog,
}

impl AppContext {
    pub fn new(config: Config, workdir: PathBuf, catalog: TemplateCatalog) -> Self {
        Self {
            config,
            workdir,
            catalog,
        }
    }

    /// Load the template catalog named by `config`
    pub fn load(config: Config, workdir: PathBuf) -> Result<Self> {
        let catalog = TemplateCatalog::load(config.templates_dir.as_deref())?;
        Ok(Self::new(config, workdir, catalog))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn catalog(&self) -> &TemplateCatalog {
        &self.catalog
    }

    /// Collector for the working directory this process serves
    pub fn collector(&self) -> ChangeCollector {
        ChangeCollector::new(self.workdir.clone(), &self.config)
    }

    /// Collector for another directory, e.g. one named by the host
    pub fn collector_for(&self, workdir: Option<PathBuf>) -> ChangeCollector {
        match workdir {
            Some(dir) => ChangeCollector::new(dir, &self.config),
            None => self.collector(),
        }
    }

    pub fn matcher(&self) -> TemplateMatcher<'_> {
        TemplateMatcher::new(&self.catalog)
    }

    /// Request using the configured defaults for anything the caller left out
    pub fn collect_request(
        &self,
        base_ref: Option<String>,
        include_diff: bool,
        max_diff_lines: Option<i64>,
    ) -> CollectRequest {
        CollectRequest {
            base_ref,
            include_diff,
            max_diff_lines: max_diff_lines.unwrap_or(self.config.max_diff_lines),
        }
    }

    pub async fn analyze(&self, request: &CollectRequest) -> Result<ChangeSummary> {
        self.collector().collect(request).await
    }

    /// Rank templates, favoring the host's change type when one is given
    pub fn suggest(
        &self,
        summary: &ChangeSummary,
        hint: Option<CategoryHintScorer>,
    ) -> Vec<Suggestion> {
        match hint {
            Some(hint) => self.matcher().with_hint(hint).suggest(summary),
            None => self.matcher().suggest(summary),
        }
    }

    /// Non-fatal conditions to report alongside results
    pub fn warnings(&self) -> Vec<String> {
        self.catalog
            .empty_warning()
            .map(|w| {
                vec![format!(
                    "{}: no templates found in {}",
                    w.kind(),
                    self.catalog.location()
                )]
            })
            .unwrap_or_default()
    }
}
