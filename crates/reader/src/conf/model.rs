//! Model: ReaderConfig.

use serde::{Deserialize, Serialize};

use crate::parser::MAX_LINE_SIZE;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReaderConfig {
    /// Longer candidate lines are rejected before matching
    pub max_line_size: usize,
    /// Region size for logs whose "Heap region size" line was cut off
    pub region_size_kb: Option<u64>,
    pub extra_exclude_markers: Vec<String>,
    pub extra_log_only_markers: Vec<String>,
}

impl Default for ReaderConfig {
    fn default() -> Self {
        Self {
            max_line_size: MAX_LINE_SIZE,
            region_size_kb: None,
            extra_exclude_markers: Vec::new(),
            extra_log_only_markers: Vec::new(),
        }
    }
}
