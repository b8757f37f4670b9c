pub mod api_config;
pub mod payload;
pub mod provider;
pub mod stats;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use api_config::{
    ApiConfig, ApiConfigDraft, ConfigSnapshot, ImageApiConfig, ImageApiDraft, TextApiConfig,
    TextApiDraft,
};
pub use payload::{ImageApiPayload, NormalizedPayload, TextApiPayload};
pub use provider::{ImageProvider, ProviderId, TextProvider, UnknownProvider};
pub use stats::UsageStat;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UiLanguage {
    ZhCn,
    EnUs,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ApiKind {
    Text,
    Image,
}

impl ApiKind {
    pub const ALL: [ApiKind; 2] = [ApiKind::Text, ApiKind::Image];

    pub fn as_str(self) -> &'static str {
        match self {
            ApiKind::Text => "text",
            ApiKind::Image => "image",
        }
    }
}

impl fmt::Display for ApiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ApiKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(ApiKind::Text),
            "image" => Ok(ApiKind::Image),
            other => Err(format!("unknown api kind `{other}`")),
        }
    }
}

/// Opaque config identifier. Generated ids look like `text-<uuid>`, but imported
/// snapshots may carry ids of any shape.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct ApiId(String);

impl ApiId {
    pub fn generate(kind: ApiKind) -> Self {
        Self(format!("{kind}-{}", Uuid::new_v4()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ApiId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for ApiId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

impl fmt::Display for ApiId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl ValidationResult {
    pub fn new(errors: Vec<String>, warnings: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}
