use serde::Deserialize;

use crate::types::DEFAULT_MAX_PROPAGATION_DEPTH;

/// Configuration for [`Record::with_config`](crate::Record::with_config).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Defer allocating the dirty state until the first mutation.
    ///
    /// Default: `false` (allocated at construction).
    pub lazy_dirty_state: bool,

    /// Maximum number of ancestors a single change may walk through before
    /// propagation gives up with [`RecordError::PropagationTooDeep`](crate::RecordError).
    ///
    /// Default: 1024.
    pub max_propagation_depth: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            lazy_dirty_state: false,
            max_propagation_depth: DEFAULT_MAX_PROPAGATION_DEPTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults_from_empty_json() {
        let cfg: TrackerConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(cfg, TrackerConfig::default());
    }

    #[test]
    fn test_config_partial_override() {
        let cfg: TrackerConfig = serde_json::from_str(r#"{"lazy_dirty_state": true}"#).unwrap();
        assert!(cfg.lazy_dirty_state);
        assert_eq!(cfg.max_propagation_depth, DEFAULT_MAX_PROPAGATION_DEPTH);
    }
}
