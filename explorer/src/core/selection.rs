//! Dependent-selector state machine over the results hierarchy.
//!
//! Each level's options depend on every shallower selection. Options are
//! recomputed from the live tree on every query and never cached, because the
//! pipeline may add or remove directories between two queries.

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::artifact::{AGGREGATE_DIR, is_run_dir};
use crate::core::level::{Level, ViewMode};
use crate::error::SelectionError;
use crate::tree::{TreeAccessor, display_prefix};

/// Available values for one level, sorted ascending with no duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OptionSet(Vec<String>);

impl OptionSet {
    pub fn from_values(mut values: Vec<String>) -> Self {
        values.sort_unstable();
        values.dedup();
        Self(values)
    }

    pub fn empty() -> Self {
        Self(Vec::new())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.0.binary_search_by(|probe| probe.as_str().cmp(value)).is_ok()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a OptionSet {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Per-level narrowing applied on top of the raw directory listing.
#[derive(Debug, Clone, Default)]
pub struct LevelRules {
    /// Root children must match this to count as subjects.
    subject_pattern: Option<Regex>,
}

impl LevelRules {
    pub fn with_subject_pattern(pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            subject_pattern: Some(Regex::new(pattern)?),
        })
    }

    /// Whether `name` would be offered for `level` if it were on disk.
    pub fn check(
        &self,
        level: Level,
        view_mode: ViewMode,
        name: &str,
    ) -> Result<(), SelectionError> {
        if self.admits(level, view_mode, name) {
            return Ok(());
        }
        Err(SelectionError::NotAnOption {
            level,
            value: name.to_string(),
        })
    }

    fn admits(&self, level: Level, view_mode: ViewMode, name: &str) -> bool {
        match level {
            Level::Subject => self
                .subject_pattern
                .as_ref()
                .is_none_or(|pattern| pattern.is_match(name)),
            Level::Method | Level::Contrast => true,
            Level::RunGroup => match view_mode {
                ViewMode::Aggregate => name == AGGREGATE_DIR,
                ViewMode::PerRun => is_run_dir(name),
            },
        }
    }
}

/// Compute the options for `level` below `prefix` from the live tree.
///
/// An absent or empty prefix yields an empty set: no data has been produced
/// for that ancestor yet. Other read failures are logged and degrade the same
/// way.
pub fn compute_options<T: TreeAccessor + ?Sized>(
    tree: &T,
    rules: &LevelRules,
    level: Level,
    prefix: &[&str],
    view_mode: ViewMode,
) -> OptionSet {
    let children = match tree.list_children(prefix) {
        Ok(children) => children,
        Err(err) if err.is_not_found() => {
            debug!(level = %level, prefix = %display_prefix(prefix), "no children yet");
            return OptionSet::empty();
        }
        Err(err) => {
            warn!(level = %level, prefix = %display_prefix(prefix), error = %err, "listing failed");
            return OptionSet::empty();
        }
    };
    let values = children
        .into_iter()
        .filter(|name| rules.admits(level, view_mode, name))
        .collect();
    OptionSet::from_values(values)
}

/// Left-to-right partial assignment of levels plus the run-group view mode.
///
/// Only the [`SelectionMachine`] mutates a selection, so `values` is always a
/// valid prefix: `values[i]` is the value of `Level::ALL[i]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Selection {
    values: Vec<String>,
    view_mode: ViewMode,
}

impl Selection {
    pub fn get(&self, level: Level) -> Option<&str> {
        self.values.get(level.depth()).map(String::as_str)
    }

    pub fn subject(&self) -> Option<&str> {
        self.get(Level::Subject)
    }

    pub fn method(&self) -> Option<&str> {
        self.get(Level::Method)
    }

    pub fn contrast(&self) -> Option<&str> {
        self.get(Level::Contrast)
    }

    pub fn run_group(&self) -> Option<&str> {
        self.get(Level::RunGroup)
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Assigned values, shallowest first.
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Shallowest level without a value, or `None` when complete.
    pub fn first_unset(&self) -> Option<Level> {
        Level::from_depth(self.values.len())
    }

    pub fn is_complete(&self) -> bool {
        self.values.len() == Level::ALL.len()
    }

    /// Values of every level shallower than `level`.
    pub fn prefix_for(&self, level: Level) -> Result<Vec<&str>, SelectionError> {
        if let Some(missing) = self.first_unset().filter(|missing| *missing < level) {
            return Err(SelectionError::ShallowerUnset { level, missing });
        }
        Ok(self.values[..level.depth()]
            .iter()
            .map(String::as_str)
            .collect())
    }

    /// `[subject, method, contrast]`, required by the galleries.
    pub fn contrast_path(&self) -> Result<[&str; 3], SelectionError> {
        match self.values.as_slice() {
            [subject, method, contrast, ..] => Ok([subject, method, contrast].map(String::as_str)),
            _ => Err(SelectionError::Incomplete {
                missing: self.first_unset().unwrap_or(Level::Contrast),
            }),
        }
    }

    /// All four values; only a complete selection may be resolved.
    pub fn complete_path(&self) -> Result<[&str; 4], SelectionError> {
        match self.values.as_slice() {
            [subject, method, contrast, group] => {
                Ok([subject, method, contrast, group].map(String::as_str))
            }
            _ => Err(SelectionError::Incomplete {
                missing: self.first_unset().unwrap_or(Level::RunGroup),
            }),
        }
    }

    fn assign(&mut self, level: Level, value: String) {
        self.values.truncate(level.depth());
        self.values.push(value);
    }

    fn clear_from(&mut self, level: Level) {
        self.values.truncate(level.depth());
    }
}

/// Explicit state object for the dependent selectors.
#[derive(Debug, Clone, Default)]
pub struct SelectionMachine {
    rules: LevelRules,
    selection: Selection,
}

impl SelectionMachine {
    pub fn new(rules: LevelRules) -> Self {
        Self {
            rules,
            selection: Selection::default(),
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn into_selection(self) -> Selection {
        self.selection
    }

    /// Fresh options for `level` given the shallower assignments.
    ///
    /// Every assigned shallower level is rechecked first, shallowest first.
    /// If one of them vanished it is cleared with everything deeper and the
    /// call fails with [`SelectionError::ShallowerUnset`]. If only the level's
    /// own value vanished, that level and every deeper one are cleared and
    /// the fresh options are returned; the caller re-prompts from there.
    pub fn options_for<T: TreeAccessor + ?Sized>(
        &mut self,
        tree: &T,
        level: Level,
    ) -> Result<OptionSet, SelectionError> {
        for &shallower in &Level::ALL[..level.depth()] {
            if self.selection.get(shallower).is_none() {
                break;
            }
            self.prune_level(tree, shallower)?;
        }
        self.prune_level(tree, level)
    }

    /// Options for `level`, clearing its value if it is no longer among them.
    fn prune_level<T: TreeAccessor + ?Sized>(
        &mut self,
        tree: &T,
        level: Level,
    ) -> Result<OptionSet, SelectionError> {
        let options = self.peek_options(tree, level)?;
        if let Some(current) = self.selection.get(level)
            && !options.contains(current)
        {
            debug!(level = %level, value = current, "selected value vanished, clearing");
            self.selection.clear_from(level);
        }
        Ok(options)
    }

    /// Options below the current prefix, leaving the state untouched.
    ///
    /// Shallower values are trusted as assigned; use [`Self::refresh`] or
    /// [`Self::options_for`] to revalidate them.
    pub fn peek_options<T: TreeAccessor + ?Sized>(
        &self,
        tree: &T,
        level: Level,
    ) -> Result<OptionSet, SelectionError> {
        let prefix = self.selection.prefix_for(level)?;
        Ok(compute_options(
            tree,
            &self.rules,
            level,
            &prefix,
            self.selection.view_mode,
        ))
    }

    /// Assign `value` to `level` and clear every deeper level.
    ///
    /// `level` must be the first unset level or an already-set one, and
    /// `value` must be among its current options.
    pub fn set_value<T: TreeAccessor + ?Sized>(
        &mut self,
        tree: &T,
        level: Level,
        value: &str,
    ) -> Result<(), SelectionError> {
        let options = self.peek_options(tree, level)?;
        if !options.contains(value) {
            return Err(SelectionError::NotAnOption {
                level,
                value: value.to_string(),
            });
        }
        debug!(level = %level, value, "selected");
        self.selection.assign(level, value.to_string());
        Ok(())
    }

    /// Switch the run-group view. A change clears the run-group value, whose
    /// options depend on the view.
    pub fn set_view_mode(&mut self, view_mode: ViewMode) {
        if self.selection.view_mode == view_mode {
            return;
        }
        self.selection.view_mode = view_mode;
        self.selection.clear_from(Level::RunGroup);
    }

    /// Clear `level` and everything deeper.
    pub fn clear(&mut self, level: Level) {
        self.selection.clear_from(level);
    }

    /// Re-check every assigned level against the live tree, shallowest first.
    ///
    /// Returns the level that was cleared because its value disappeared, if
    /// any.
    pub fn refresh<T: TreeAccessor + ?Sized>(&mut self, tree: &T) -> Option<Level> {
        for level in Level::ALL {
            if self.selection.get(level).is_none() {
                return None;
            }
            if let Err(err) = self.prune_level(tree, level) {
                debug!(level = %level, error = %err, "cannot revalidate, clearing");
                self.selection.clear_from(level);
                return Some(level);
            }
            if self.selection.get(level).is_none() {
                return Some(level);
            }
        }
        None
    }
}
