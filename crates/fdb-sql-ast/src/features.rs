//! Grammar extension flags.
//!
//! The grammar front-end consults a [`FeatureSet`] before accepting vendor
//! extension productions. Typed node constructors that build such extensions
//! take a [`SessionContext`](crate::context::SessionContext) and refuse the
//! construct with [`Error::FeatureDisabled`] when its flag is off, so the gate
//! holds no matter which entry point built the node.
//!
//! Flags only change through explicit calls: nothing in this crate clears them
//! between statements of a session.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// A named grammar extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Feature {
    /// `GROUPING FOREIGN KEY` and join types on group indexes
    TableGrouping,
    /// `STORAGE_FORMAT` clauses on tables and indexes
    StorageFormat,
    /// `DEFERRABLE` / `INITIALLY DEFERRED` constraint modifiers
    DeferrableConstraints,
    /// `WITH (...)` option bags on indexes
    IndexOptions,
}

impl Feature {
    pub const ALL: [Feature; 4] = [
        Feature::TableGrouping,
        Feature::StorageFormat,
        Feature::DeferrableConstraints,
        Feature::IndexOptions,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Feature::TableGrouping => "TABLE_GROUPING",
            Feature::StorageFormat => "STORAGE_FORMAT",
            Feature::DeferrableConstraints => "DEFERRABLE_CONSTRAINTS",
            Feature::IndexOptions => "INDEX_OPTIONS",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Feature {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Feature::ALL
            .into_iter()
            .find(|feature| feature.name() == s)
            .ok_or_else(|| Error::unknown_feature(s))
    }
}

/// Session-scoped set of enabled features.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FeatureSet {
    enabled: BTreeSet<Feature>,
}

impl FeatureSet {
    /// An empty set: every extension disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every known extension enabled.
    pub fn all() -> Self {
        Self {
            enabled: Feature::ALL.into_iter().collect(),
        }
    }

    /// Enable a feature by name.
    pub fn enable(&mut self, name: &str) -> Result<()> {
        let feature = name.parse()?;
        self.enable_feature(feature);
        Ok(())
    }

    /// Disable a feature by name.
    pub fn disable(&mut self, name: &str) -> Result<()> {
        let feature = name.parse()?;
        self.disable_feature(feature);
        Ok(())
    }

    /// Whether a feature, given by name, is enabled.
    pub fn is_enabled(&self, name: &str) -> Result<bool> {
        let feature: Feature = name.parse()?;
        Ok(self.contains(feature))
    }

    pub fn enable_feature(&mut self, feature: Feature) {
        if self.enabled.insert(feature) {
            debug!(feature = feature.name(), "feature enabled");
        }
    }

    pub fn disable_feature(&mut self, feature: Feature) {
        if self.enabled.remove(&feature) {
            debug!(feature = feature.name(), "feature disabled");
        }
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.enabled.contains(&feature)
    }

    /// Fail with [`Error::FeatureDisabled`] unless `feature` is enabled.
    pub fn require(&self, feature: Feature) -> Result<()> {
        if self.contains(feature) {
            Ok(())
        } else {
            Err(Error::FeatureDisabled(feature))
        }
    }

    /// Disable everything.
    pub fn reset(&mut self) {
        debug!(count = self.enabled.len(), "feature set reset");
        self.enabled.clear();
    }

    /// Enabled features in name order.
    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.enabled.iter().copied()
    }

    /// Apply `+NAME` / `-NAME` override lines in order.
    ///
    /// Blank lines are skipped. Lines are validated before any of them is
    /// applied, so a bad line leaves the set unchanged.
    pub fn apply_overrides<I, S>(&mut self, lines: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut parsed = Vec::new();
        for line in lines {
            let line = line.as_ref().trim();
            if line.is_empty() {
                continue;
            }
            let add = match line.as_bytes()[0] {
                b'+' => true,
                b'-' => false,
                _ => return Err(Error::InvalidFeatureOverride(line.to_string())),
            };
            let feature: Feature = line[1..].parse()?;
            parsed.push((add, feature));
        }
        for (add, feature) in parsed {
            if add {
                self.enable_feature(feature);
            } else {
                self.disable_feature(feature);
            }
        }
        Ok(())
    }
}

impl FromIterator<Feature> for FeatureSet {
    fn from_iter<T: IntoIterator<Item = Feature>>(iter: T) -> Self {
        Self {
            enabled: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enable_disable_by_name() {
        let mut features = FeatureSet::new();
        assert!(!features.is_enabled("TABLE_GROUPING").unwrap());
        features.enable("TABLE_GROUPING").unwrap();
        assert!(features.is_enabled("TABLE_GROUPING").unwrap());
        features.disable("TABLE_GROUPING").unwrap();
        assert!(!features.is_enabled("TABLE_GROUPING").unwrap());
    }

    #[test]
    fn test_unknown_feature() {
        let mut features = FeatureSet::new();
        assert_eq!(
            features.enable("MYSQL_HINTS"),
            Err(Error::UnknownFeature("MYSQL_HINTS".to_string()))
        );
        assert!(matches!(
            features.is_enabled("table_grouping"),
            Err(Error::UnknownFeature(_))
        ));
    }

    #[test]
    fn test_flags_persist_until_reset() {
        let mut features = FeatureSet::new();
        features.enable_feature(Feature::StorageFormat);
        features.enable_feature(Feature::IndexOptions);
        assert!(features.contains(Feature::StorageFormat));
        features.reset();
        assert_eq!(features.iter().count(), 0);
    }

    #[test]
    fn test_apply_overrides() {
        let mut features = FeatureSet::all();
        features
            .apply_overrides(["-TABLE_GROUPING", "", "+TABLE_GROUPING", "-INDEX_OPTIONS"])
            .unwrap();
        assert!(features.contains(Feature::TableGrouping));
        assert!(!features.contains(Feature::IndexOptions));
    }

    #[test]
    fn test_bad_override_leaves_set_unchanged() {
        let mut features = FeatureSet::new();
        let err = features
            .apply_overrides(["+STORAGE_FORMAT", "TABLE_GROUPING"])
            .unwrap_err();
        assert_eq!(
            err,
            Error::InvalidFeatureOverride("TABLE_GROUPING".to_string())
        );
        assert!(!features.contains(Feature::StorageFormat));
    }

    #[test]
    fn test_require() {
        let features: FeatureSet = [Feature::DeferrableConstraints].into_iter().collect();
        assert!(features.require(Feature::DeferrableConstraints).is_ok());
        assert_eq!(
            features.require(Feature::TableGrouping),
            Err(Error::FeatureDisabled(Feature::TableGrouping))
        );
    }
}
