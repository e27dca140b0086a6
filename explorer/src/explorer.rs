//! Facade consumed by presentation layers (CLI, web UI).
//!
//! Requests arrive as plain field values that may have gone stale since the
//! viewer last looked. Every call replays them through a fresh
//! [`SelectionMachine`] against the live tree, so a value that has vanished
//! is dropped together with everything deeper instead of being trusted.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::artifact::{ArtifactKind, ArtifactStatus};
use crate::core::level::{Level, ViewMode};
use crate::core::resolver::{AggregateArtifact, ArtifactQuery, ArtifactResolver, RunArtifact};
use crate::core::selection::{LevelRules, OptionSet, Selection, SelectionMachine};
use crate::error::SelectionError;
use crate::io::config::ExplorerConfig;
use crate::io::fs_tree::FsTree;
use crate::tree::TreeAccessor;

/// Whether the configured results root is present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RootStatus {
    Available,
    /// The pipeline has not created the root yet. Not fatal: every listing
    /// is empty until it appears.
    NotFound,
}

/// Selection as supplied by a viewer: each field optional, possibly stale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectionRequest {
    pub subject: Option<String>,
    pub method: Option<String>,
    pub contrast: Option<String>,
    pub run_group: Option<String>,
    pub view: Option<ViewMode>,
}

impl SelectionRequest {
    pub fn value(&self, level: Level) -> Option<&str> {
        match level {
            Level::Subject => self.subject.as_deref(),
            Level::Method => self.method.as_deref(),
            Level::Contrast => self.contrast.as_deref(),
            Level::RunGroup => self.run_group.as_deref(),
        }
    }
}

impl From<&Selection> for SelectionRequest {
    fn from(selection: &Selection) -> Self {
        Self {
            subject: selection.subject().map(str::to_string),
            method: selection.method().map(str::to_string),
            contrast: selection.contrast().map(str::to_string),
            run_group: selection.run_group().map(str::to_string),
            view: Some(selection.view_mode()),
        }
    }
}

/// Options for one level together with the selection they were computed for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LevelOptions {
    pub level: Level,
    pub options: OptionSet,
    pub selection: Selection,
}

/// Option discovery and artifact resolution over one results tree.
#[derive(Debug, Clone)]
pub struct Explorer<T> {
    tree: T,
    rules: LevelRules,
    resolver: ArtifactResolver,
}

impl Explorer<FsTree> {
    /// Build a filesystem-backed explorer from a validated config.
    pub fn from_config(cfg: &ExplorerConfig) -> Result<Self> {
        let rules = LevelRules::with_subject_pattern(&cfg.subject_pattern)
            .with_context(|| format!("compile subject_pattern {:?}", cfg.subject_pattern))?;
        Ok(Self::new(
            FsTree::new(&cfg.results_dir),
            rules,
            ArtifactResolver::new(&cfg.image_extension),
        ))
    }
}

impl<T: TreeAccessor> Explorer<T> {
    pub fn new(tree: T, rules: LevelRules, resolver: ArtifactResolver) -> Self {
        Self {
            tree,
            rules,
            resolver,
        }
    }

    pub fn tree(&self) -> &T {
        &self.tree
    }

    pub fn root_status(&self) -> RootStatus {
        if self.tree.exists(&[]) {
            RootStatus::Available
        } else {
            RootStatus::NotFound
        }
    }

    /// A fresh state machine bound to this explorer's rules.
    pub fn machine(&self) -> SelectionMachine {
        SelectionMachine::new(self.rules.clone())
    }

    pub fn get_subjects(&self) -> OptionSet {
        let mut machine = self.machine();
        // The subject level has no shallower levels to be unset.
        machine
            .options_for(&self.tree, Level::Subject)
            .unwrap_or_default()
    }

    /// Replay a request against the live tree, keeping its longest valid
    /// prefix.
    pub fn restore(&self, request: &SelectionRequest) -> Selection {
        self.replay(request).into_selection()
    }

    /// Options for `level` below the (revalidated) request.
    pub fn get_options(
        &self,
        level: Level,
        request: &SelectionRequest,
    ) -> Result<LevelOptions, SelectionError> {
        let machine = self.replay(request);
        let options = machine.peek_options(&self.tree, level)?;
        Ok(LevelOptions {
            level,
            options,
            selection: machine.into_selection(),
        })
    }

    /// Resolve a catalog map for a complete selection in aggregate view.
    pub fn resolve_artifact(
        &self,
        selection: &Selection,
        kind: ArtifactKind,
    ) -> Result<ArtifactStatus, SelectionError> {
        require_view(selection, ViewMode::Aggregate)?;
        let [subject, method, contrast, _] = selection.complete_path()?;
        self.resolve_query(&ArtifactQuery::aggregate([subject, method, contrast], kind))
    }

    /// Resolve the visualization of the selected run (per-run view).
    pub fn resolve_run_artifact(
        &self,
        selection: &Selection,
    ) -> Result<ArtifactStatus, SelectionError> {
        require_view(selection, ViewMode::PerRun)?;
        let [subject, method, contrast, run] = selection.complete_path()?;
        self.resolve_query(&ArtifactQuery::run([subject, method, contrast], run))
    }

    /// Every catalog map of the selected contrast. The combined-total
    /// directory need not exist yet; absent maps come back `Pending`.
    pub fn aggregate_gallery(
        &self,
        selection: &Selection,
    ) -> Result<Vec<AggregateArtifact>, SelectionError> {
        self.aggregate_gallery_at(selection.contrast_path()?)
    }

    /// Every run of the selected contrast with its visualization status.
    pub fn run_gallery(&self, selection: &Selection) -> Result<Vec<RunArtifact>, SelectionError> {
        self.run_gallery_at(selection.contrast_path()?)
    }

    /// Aggregate gallery for an explicit `[subject, method, contrast]`.
    pub fn aggregate_gallery_at(
        &self,
        contrast_path: [&str; 3],
    ) -> Result<Vec<AggregateArtifact>, SelectionError> {
        self.check_subject(contrast_path[0])?;
        self.resolver.aggregate_gallery(&self.tree, contrast_path)
    }

    /// Run gallery for an explicit `[subject, method, contrast]`.
    pub fn run_gallery_at(
        &self,
        contrast_path: [&str; 3],
    ) -> Result<Vec<RunArtifact>, SelectionError> {
        self.check_subject(contrast_path[0])?;
        self.resolver.run_gallery(&self.tree, contrast_path)
    }

    /// Resolve an explicit query without going through a selection.
    ///
    /// The query is held to the same naming rules as option discovery: a
    /// subject outside the subject pattern or a run target that is not a run
    /// directory is rejected rather than resolved.
    pub fn resolve_query(&self, query: &ArtifactQuery) -> Result<ArtifactStatus, SelectionError> {
        self.check_subject(&query.subject)?;
        self.resolver.resolve(&self.tree, query)
    }

    fn check_subject(&self, subject: &str) -> Result<(), SelectionError> {
        self.rules.check(Level::Subject, ViewMode::default(), subject)
    }

    fn replay(&self, request: &SelectionRequest) -> SelectionMachine {
        let mut machine = self.machine();
        if let Some(view) = request.view {
            machine.set_view_mode(view);
        }
        for level in Level::ALL {
            let Some(value) = request.value(level) else {
                break;
            };
            if let Err(err) = machine.set_value(&self.tree, level, value) {
                debug!(error = %err, "dropping stale selection suffix");
                break;
            }
        }
        machine
    }
}

fn require_view(selection: &Selection, expected: ViewMode) -> Result<(), SelectionError> {
    let actual = selection.view_mode();
    if actual != expected {
        return Err(SelectionError::ViewMismatch { expected, actual });
    }
    Ok(())
}
