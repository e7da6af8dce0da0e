use serde::{Deserialize, Serialize};

/// Settings the surrounding combiner shares with the aggregation core.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombinerConfig {
    /// Upper bound on the memory held by cached accumulators. `None` means the
    /// cache is bounded by entry count only and memory estimators are optional.
    pub memory_limit_bytes: Option<u64>,
}

impl CombinerConfig {
    pub fn memory_bounded(limit_bytes: u64) -> Self {
        Self {
            memory_limit_bytes: Some(limit_bytes),
        }
    }

    pub fn is_memory_bounded(&self) -> bool {
        self.memory_limit_bytes.is_some()
    }
}
