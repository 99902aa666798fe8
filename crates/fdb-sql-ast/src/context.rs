//! Per-session state shared by construction and copying.

use crate::error::Result;
use crate::features::{Feature, FeatureSet};
use crate::nodes::NodeKind;
use serde::Deserialize;

/// Serializable session settings.
///
/// ```
/// use fdb_sql_ast::context::SessionConfig;
///
/// let config = SessionConfig::from_json(r#"{"features": ["TABLE_GROUPING"]}"#).unwrap();
/// assert_eq!(config.max_copy_depth, None);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SessionConfig {
    /// Features enabled when the session starts
    #[serde(default)]
    pub features: Vec<Feature>,
    /// Deepest tree the copy engine will reproduce; unbounded when absent
    #[serde(default)]
    pub max_copy_depth: Option<usize>,
}

impl SessionConfig {
    /// Parse a JSON document. Unknown feature names are rejected.
    pub fn from_json(json: &str) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// State carried alongside one parse session: the feature gate and the
/// copy policy. One context per session; independent sessions share nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    features: FeatureSet,
    max_copy_depth: Option<usize>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::from_config(SessionConfig::default())
    }
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: SessionConfig) -> Self {
        Self {
            features: config.features.into_iter().collect(),
            max_copy_depth: config.max_copy_depth,
        }
    }

    /// A session with the given features enabled.
    pub fn with_features(features: impl IntoIterator<Item = Feature>) -> Self {
        Self {
            features: features.into_iter().collect(),
            ..Self::default()
        }
    }

    pub fn features(&self) -> &FeatureSet {
        &self.features
    }

    pub fn features_mut(&mut self) -> &mut FeatureSet {
        &mut self.features
    }

    pub fn max_copy_depth(&self) -> Option<usize> {
        self.max_copy_depth
    }

    /// Bound deep copies to trees at most `depth` nodes deep.
    pub fn set_max_copy_depth(&mut self, depth: usize) {
        self.max_copy_depth = Some(depth);
    }

    pub fn clear_max_copy_depth(&mut self) {
        self.max_copy_depth = None;
    }

    /// Gate check used by typed constructors.
    pub(crate) fn require(&self, kind: NodeKind, feature: Feature) -> Result<()> {
        self.features.require(feature).map_err(|err| {
            tracing::debug!(%kind, feature = feature.name(), "construct rejected by feature gate");
            err
        })
    }

    pub fn is_enabled(&self, feature: Feature) -> bool {
        self.features.contains(feature)
    }
}

impl From<SessionConfig> for SessionContext {
    fn from(config: SessionConfig) -> Self {
        Self::from_config(config)
    }
}
