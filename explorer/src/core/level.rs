//! Hierarchy levels and the run-group view mode.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Fixed, ordered levels of the results hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Subject,
    Method,
    Contrast,
    RunGroup,
}

impl Level {
    /// All levels, shallowest first.
    pub const ALL: [Level; 4] = [
        Level::Subject,
        Level::Method,
        Level::Contrast,
        Level::RunGroup,
    ];

    /// Zero-based depth; also the number of shallower levels.
    pub fn depth(self) -> usize {
        match self {
            Level::Subject => 0,
            Level::Method => 1,
            Level::Contrast => 2,
            Level::RunGroup => 3,
        }
    }

    pub fn from_depth(depth: usize) -> Option<Level> {
        Self::ALL.get(depth).copied()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Level::Subject => "subject",
            Level::Method => "method",
            Level::Contrast => "contrast",
            Level::RunGroup => "run_group",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subject" => Ok(Level::Subject),
            "method" => Ok(Level::Method),
            "contrast" => Ok(Level::Contrast),
            "run_group" | "run-group" => Ok(Level::RunGroup),
            other => Err(format!(
                "unknown level '{other}' (expected subject, method, contrast or run_group)"
            )),
        }
    }
}

/// How the run-group level is browsed: the combined total or single runs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewMode {
    #[default]
    Aggregate,
    PerRun,
}

impl ViewMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ViewMode::Aggregate => "aggregate",
            ViewMode::PerRun => "per_run",
        }
    }
}

impl fmt::Display for ViewMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aggregate" | "total" => Ok(ViewMode::Aggregate),
            "per_run" | "per-run" | "run" => Ok(ViewMode::PerRun),
            other => Err(format!(
                "unknown view '{other}' (expected aggregate or per_run)"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levels_are_ordered_by_depth() {
        for (depth, level) in Level::ALL.iter().enumerate() {
            assert_eq!(level.depth(), depth);
            assert_eq!(Level::from_depth(depth), Some(*level));
        }
        assert!(Level::Subject < Level::RunGroup);
        assert_eq!(Level::from_depth(4), None);
    }

    #[test]
    fn level_parses_its_display_form() {
        for level in Level::ALL {
            assert_eq!(level.to_string().parse::<Level>(), Ok(level));
        }
        assert!("session".parse::<Level>().is_err());
    }
}
