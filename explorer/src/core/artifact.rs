//! Artifact naming contract shared with the producing pipeline.
//!
//! The directory names and file stems below are matched bit-exactly against
//! what the pipeline writes; they are not configurable.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Run-group directory holding the aggregate (all runs combined) maps.
pub const AGGREGATE_DIR: &str = "combined_total";

/// Substring identifying a per-run directory (e.g. `run-01_dir-ap`).
pub const RUN_MARKER: &str = "run-";

/// Suffix appended to the contrast name for per-run visualizations.
pub const RUN_VIZ_SUFFIX: &str = "_run_viz";

/// Aggregate diagnostic maps, in catalog order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Beta,
    Variance,
    Tstat,
    ZmapFdr,
}

impl ArtifactKind {
    pub const CATALOG: [ArtifactKind; 4] = [
        ArtifactKind::Beta,
        ArtifactKind::Variance,
        ArtifactKind::Tstat,
        ArtifactKind::ZmapFdr,
    ];

    /// File stem written by the pipeline under [`AGGREGATE_DIR`].
    pub fn file_stem(self) -> &'static str {
        match self {
            ArtifactKind::Beta => "TOTAL_01_beta",
            ArtifactKind::Variance => "TOTAL_02_variance",
            ArtifactKind::Tstat => "TOTAL_03_tstat",
            ArtifactKind::ZmapFdr => "TOTAL_05_zmap_FDR",
        }
    }

    pub fn file_name(self, extension: &str) -> String {
        format!("{}.{}", self.file_stem(), extension)
    }

    /// Human-readable caption.
    pub fn label(self) -> &'static str {
        match self {
            ArtifactKind::Beta => "Beta (Effect Size)",
            ArtifactKind::Variance => "Variance (Noise)",
            ArtifactKind::Tstat => "T-Stat (Reliability)",
            ArtifactKind::ZmapFdr => "Z-Map (FDR Corrected)",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Beta => "beta",
            ArtifactKind::Variance => "variance",
            ArtifactKind::Tstat => "tstat",
            ArtifactKind::ZmapFdr => "zmap_fdr",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArtifactKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CATALOG
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                format!("unknown artifact kind '{s}' (expected beta, variance, tstat or zmap_fdr)")
            })
    }
}

/// What to resolve inside a contrast directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactTarget {
    /// A catalog map under [`AGGREGATE_DIR`].
    Aggregate(ArtifactKind),
    /// The visualization inside one run directory.
    Run(String),
}

impl ArtifactTarget {
    /// Run-group directory containing the artifact.
    pub fn group_dir(&self) -> &str {
        match self {
            ArtifactTarget::Aggregate(_) => AGGREGATE_DIR,
            ArtifactTarget::Run(run_dir) => run_dir,
        }
    }

    pub fn file_name(&self, contrast: &str, extension: &str) -> String {
        match self {
            ArtifactTarget::Aggregate(kind) => kind.file_name(extension),
            ArtifactTarget::Run(_) => run_viz_file_name(contrast, extension),
        }
    }
}

/// Three-way classification of an expected artifact.
///
/// `Pending` and `Missing` are deliberately distinct: the first means the
/// pipeline stage has not produced its directory yet, the second is a real
/// gap inside an existing directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ArtifactStatus {
    Ready { locator: PathBuf },
    Missing,
    Pending,
}

impl ArtifactStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, ArtifactStatus::Ready { .. })
    }

    pub fn locator(&self) -> Option<&PathBuf> {
        match self {
            ArtifactStatus::Ready { locator } => Some(locator),
            ArtifactStatus::Missing | ArtifactStatus::Pending => None,
        }
    }
}

/// True if `name` is a per-run directory. Substring match, not prefix.
pub fn is_run_dir(name: &str) -> bool {
    name.contains(RUN_MARKER)
}

/// `<contrast>_run_viz.<extension>`
pub fn run_viz_file_name(contrast: &str, extension: &str) -> String {
    format!("{contrast}{RUN_VIZ_SUFFIX}.{extension}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_file_names_match_pipeline_output() {
        let names: Vec<String> = ArtifactKind::CATALOG
            .iter()
            .map(|kind| kind.file_name("png"))
            .collect();
        assert_eq!(
            names,
            vec![
                "TOTAL_01_beta.png",
                "TOTAL_02_variance.png",
                "TOTAL_03_tstat.png",
                "TOTAL_05_zmap_FDR.png",
            ]
        );
    }

    #[test]
    fn run_dir_match_is_substring_not_prefix() {
        assert!(is_run_dir("run-01_dir-ap"));
        assert!(is_run_dir("sub-run-01"));
        assert!(!is_run_dir("runX"));
        assert!(!is_run_dir("run_01"));
        assert!(!is_run_dir(AGGREGATE_DIR));
    }

    #[test]
    fn run_viz_name_is_keyed_by_contrast() {
        assert_eq!(
            run_viz_file_name("hand_vs_foot", "png"),
            "hand_vs_foot_run_viz.png"
        );
        let target = ArtifactTarget::Run("run-02".to_string());
        assert_eq!(target.group_dir(), "run-02");
        assert_eq!(target.file_name("left", "png"), "left_run_viz.png");
    }

    #[test]
    fn artifact_kind_parses_its_display_form() {
        for kind in ArtifactKind::CATALOG {
            assert_eq!(kind.to_string().parse::<ArtifactKind>(), Ok(kind));
        }
        assert!("zmap_uncorrected".parse::<ArtifactKind>().is_err());
    }

    #[test]
    fn status_serializes_with_tag() {
        let ready = ArtifactStatus::Ready {
            locator: PathBuf::from("a/b.png"),
        };
        assert_eq!(
            serde_json::to_value(&ready).expect("json"),
            serde_json::json!({"status": "ready", "locator": "a/b.png"})
        );
        assert_eq!(
            serde_json::to_value(ArtifactStatus::Pending).expect("json"),
            serde_json::json!({"status": "pending"})
        );
    }
}
