//! Operational limits applied to every function in the process.

use serde::Serialize;

pub const MAX_INSTANCES: u32 = 10;
pub const REGION: &str = "europe-west4";

/// Deployment policy shared by all registered functions. Identical in both modes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalOptions {
    pub max_instances: u32,
    pub region: String,
}

impl Default for GlobalOptions {
    fn default() -> Self {
        Self {
            max_instances: MAX_INSTANCES,
            region: REGION.to_string(),
        }
    }
}
