//! Three-way artifact resolution: Ready, Missing or Pending.

use serde::Serialize;
use tracing::{debug, warn};

use crate::core::artifact::{ArtifactKind, ArtifactStatus, ArtifactTarget, is_run_dir};
use crate::core::level::Level;
use crate::error::{SelectionError, TreeError};
use crate::tree::{TreeAccessor, display_prefix, validate_segment};

/// A single expected artifact below `subject/method/contrast`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactQuery {
    pub subject: String,
    pub method: String,
    pub contrast: String,
    pub target: ArtifactTarget,
}

impl ArtifactQuery {
    pub fn aggregate(contrast_path: [&str; 3], kind: ArtifactKind) -> Self {
        Self::new(contrast_path, ArtifactTarget::Aggregate(kind))
    }

    pub fn run(contrast_path: [&str; 3], run_dir: &str) -> Self {
        Self::new(contrast_path, ArtifactTarget::Run(run_dir.to_string()))
    }

    fn new([subject, method, contrast]: [&str; 3], target: ArtifactTarget) -> Self {
        Self {
            subject: subject.to_string(),
            method: method.to_string(),
            contrast: contrast.to_string(),
            target,
        }
    }

    /// Reject queries that no amount of waiting could make ready: segments
    /// that escape their parent, or a run target that is not a run directory.
    pub fn validate(&self) -> Result<(), SelectionError> {
        validate_contrast_path([&self.subject, &self.method, &self.contrast].map(String::as_str))?;
        if let ArtifactTarget::Run(run) = &self.target {
            check_segment(Level::RunGroup, run)?;
            if !is_run_dir(run) {
                return Err(SelectionError::NotAnOption {
                    level: Level::RunGroup,
                    value: run.clone(),
                });
            }
        }
        Ok(())
    }

    /// Segments of the directory expected to contain the artifact.
    pub fn containing_dir(&self) -> [&str; 4] {
        [
            self.subject.as_str(),
            self.method.as_str(),
            self.contrast.as_str(),
            self.target.group_dir(),
        ]
    }
}

/// One entry of the aggregate gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AggregateArtifact {
    pub kind: ArtifactKind,
    pub label: &'static str,
    #[serde(flatten)]
    pub status: ArtifactStatus,
}

/// One entry of the per-run gallery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunArtifact {
    pub run: String,
    #[serde(flatten)]
    pub status: ArtifactStatus,
}

/// Resolves expected artifacts against the live tree.
#[derive(Debug, Clone)]
pub struct ArtifactResolver {
    extension: String,
}

impl Default for ArtifactResolver {
    fn default() -> Self {
        Self::new("png")
    }
}

impl ArtifactResolver {
    pub fn new(extension: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
        }
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Classify one artifact.
    ///
    /// - containing directory absent: `Pending`
    /// - directory present, file absent: `Missing`
    /// - otherwise `Ready` with the tree's locator
    ///
    /// Malformed queries are rejected before the tree is touched.
    pub fn resolve<T: TreeAccessor + ?Sized>(
        &self,
        tree: &T,
        query: &ArtifactQuery,
    ) -> Result<ArtifactStatus, SelectionError> {
        query.validate()?;
        Ok(self.classify(tree, query))
    }

    fn classify<T: TreeAccessor + ?Sized>(&self, tree: &T, query: &ArtifactQuery) -> ArtifactStatus {
        let dir = query.containing_dir();
        if !tree.exists(&dir) {
            debug!(dir = %display_prefix(&dir), "artifact pending");
            return ArtifactStatus::Pending;
        }
        let file_name = query.target.file_name(&query.contrast, &self.extension);
        if !tree.leaf_exists(&dir, &file_name) {
            debug!(dir = %display_prefix(&dir), file = %file_name, "artifact missing");
            return ArtifactStatus::Missing;
        }
        ArtifactStatus::Ready {
            locator: tree.locate(&dir, &file_name),
        }
    }

    /// Every catalog map for a contrast, in catalog order.
    pub fn aggregate_gallery<T: TreeAccessor + ?Sized>(
        &self,
        tree: &T,
        contrast_path: [&str; 3],
    ) -> Result<Vec<AggregateArtifact>, SelectionError> {
        validate_contrast_path(contrast_path)?;
        Ok(ArtifactKind::CATALOG
            .into_iter()
            .map(|kind| AggregateArtifact {
                kind,
                label: kind.label(),
                status: self.classify(tree, &ArtifactQuery::aggregate(contrast_path, kind)),
            })
            .collect())
    }

    /// Every discovered run of a contrast with its visualization status.
    pub fn run_gallery<T: TreeAccessor + ?Sized>(
        &self,
        tree: &T,
        contrast_path: [&str; 3],
    ) -> Result<Vec<RunArtifact>, SelectionError> {
        validate_contrast_path(contrast_path)?;
        // Discovered names are run directories already.
        Ok(discover_runs(tree, contrast_path)
            .into_iter()
            .map(|run| {
                let status = self.classify(tree, &ArtifactQuery::run(contrast_path, &run));
                RunArtifact { run, status }
            })
            .collect())
    }
}

/// Run directories of a contrast: children whose name contains `run-`,
/// ascending. Anything else is skipped, and an absent contrast has no runs.
pub fn discover_runs<T: TreeAccessor + ?Sized>(tree: &T, contrast_path: [&str; 3]) -> Vec<String> {
    match tree.list_children(&contrast_path) {
        Ok(children) => children.into_iter().filter(|name| is_run_dir(name)).collect(),
        Err(TreeError::NotFound { .. }) => Vec::new(),
        Err(err) => {
            warn!(contrast = %display_prefix(&contrast_path), error = %err, "run discovery failed");
            Vec::new()
        }
    }
}

fn check_segment(level: Level, value: &str) -> Result<(), SelectionError> {
    validate_segment(value).map_err(|_| SelectionError::InvalidSegment {
        level,
        value: value.to_string(),
    })
}

/// Check `[subject, method, contrast]` segment by segment.
pub fn validate_contrast_path(contrast_path: [&str; 3]) -> Result<(), SelectionError> {
    Level::ALL
        .into_iter()
        .zip(contrast_path)
        .try_for_each(|(level, value)| check_segment(level, value))
}
