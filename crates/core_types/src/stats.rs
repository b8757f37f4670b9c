use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ApiKind;

/// Counters for one `(provider, kind)` pair, persisted in camelCase with the
/// kind under `type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageStat {
    pub provider: String,
    #[serde(rename = "type")]
    pub kind: ApiKind,
    pub success_count: u64,
    pub error_count: u64,
    pub total_requests: u64,
    pub average_response_time: f64,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

impl UsageStat {
    pub fn matches(&self, provider: &str, kind: ApiKind) -> bool {
        self.kind == kind && self.provider == provider
    }
}
