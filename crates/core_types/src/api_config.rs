use serde::{Deserialize, Serialize};

use crate::{ApiId, ApiKind, ImageProvider, ProviderId, TextProvider};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextApiConfig {
    pub id: ApiId,
    pub name: String,
    pub provider: TextProvider,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub enable_thinking: bool,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageApiConfig {
    pub id: ApiId,
    pub name: String,
    pub provider: ImageProvider,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

/// Partially filled text config: the shape edited by forms, validated before
/// it is trusted, and used as a patch for updates (unset fields are left alone).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextApiDraft {
    pub name: Option<String>,
    pub provider: Option<TextProvider>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<i64>,
    pub temperature: Option<f64>,
    pub enable_thinking: Option<bool>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageApiDraft {
    pub name: Option<String>,
    pub provider: Option<ImageProvider>,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub model: Option<String>,
    pub aspect_ratio: Option<String>,
    pub resolution: Option<String>,
    pub style: Option<String>,
    pub enabled: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiConfigDraft {
    Text(TextApiDraft),
    Image(ImageApiDraft),
}

impl ApiConfigDraft {
    pub fn kind(&self) -> ApiKind {
        match self {
            ApiConfigDraft::Text(_) => ApiKind::Text,
            ApiConfigDraft::Image(_) => ApiKind::Image,
        }
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// JSON has no NaN or infinity; storing one would not survive export.
fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

impl TextApiConfig {
    /// Returns `None` when the draft has no provider.
    pub fn from_draft(id: ApiId, draft: TextApiDraft) -> Option<Self> {
        let provider = draft.provider?;
        Some(Self {
            id,
            name: draft.name.unwrap_or_default(),
            provider,
            api_key: draft.api_key.unwrap_or_default(),
            base_url: non_blank(draft.base_url),
            model: draft.model.unwrap_or_default(),
            max_tokens: draft.max_tokens,
            temperature: finite(draft.temperature),
            enable_thinking: draft.enable_thinking.unwrap_or(false),
            enabled: draft.enabled.unwrap_or(true),
        })
    }

    pub fn apply(&mut self, patch: TextApiDraft) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(provider) = patch.provider {
            self.provider = provider;
        }
        if let Some(api_key) = patch.api_key {
            self.api_key = api_key;
        }
        if patch.base_url.is_some() {
            self.base_url = non_blank(patch.base_url);
        }
        if let Some(model) = patch.model {
            self.model = model;
        }
        if patch.max_tokens.is_some() {
            self.max_tokens = patch.max_tokens;
        }
        if let Some(temperature) = finite(patch.temperature) {
            self.temperature = Some(temperature);
        }
        if let Some(enable_thinking) = patch.enable_thinking {
            self.enable_thinking = enable_thinking;
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
    }

    pub fn has_secret(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl From<&TextApiConfig> for TextApiDraft {
    fn from(config: &TextApiConfig) -> Self {
        Self {
            name: Some(config.name.clone()),
            provider: Some(config.provider),
            api_key: Some(config.api_key.clone()),
            base_url: config.base_url.clone(),
            model: Some(config.model.clone()),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            enable_thinking: Some(config.enable_thinking),
            enabled: Some(config.enabled),
        }
    }
}

impl ImageApiConfig {
    /// Returns `None` when the draft has no provider.
    pub fn from_draft(id: ApiId, draft: ImageApiDraft) -> Option<Self> {
        let provider = draft.provider?;
        Some(Self {
            id,
            name: draft.name.unwrap_or_default(),
            provider,
            api_key: draft.api_key.unwrap_or_default(),
            base_url: non_blank(draft.base_url),
            model: non_blank(draft.model),
            aspect_ratio: non_blank(draft.aspect_ratio),
            resolution: non_blank(draft.resolution),
            style: non_blank(draft.style),
            enabled: draft.enabled.unwrap_or(true),
        })
    }

    pub fn apply(&mut self, patch: ImageApiDraft) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(provider) = patch.provider {
            self.provider = provider;
        }
        if let Some(api_key) = patch.api_key {
            self.api_key = api_key;
        }
        if patch.base_url.is_some() {
            self.base_url = non_blank(patch.base_url);
        }
        if patch.model.is_some() {
            self.model = non_blank(patch.model);
        }
        if patch.aspect_ratio.is_some() {
            self.aspect_ratio = non_blank(patch.aspect_ratio);
        }
        if patch.resolution.is_some() {
            self.resolution = non_blank(patch.resolution);
        }
        if patch.style.is_some() {
            self.style = non_blank(patch.style);
        }
        if let Some(enabled) = patch.enabled {
            self.enabled = enabled;
        }
    }

    pub fn has_secret(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

impl From<&ImageApiConfig> for ImageApiDraft {
    fn from(config: &ImageApiConfig) -> Self {
        Self {
            name: Some(config.name.clone()),
            provider: Some(config.provider),
            api_key: Some(config.api_key.clone()),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            aspect_ratio: config.aspect_ratio.clone(),
            resolution: config.resolution.clone(),
            style: config.style.clone(),
            enabled: Some(config.enabled),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ApiConfig {
    Text(TextApiConfig),
    Image(ImageApiConfig),
}

impl ApiConfig {
    pub fn id(&self) -> &ApiId {
        match self {
            ApiConfig::Text(config) => &config.id,
            ApiConfig::Image(config) => &config.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ApiConfig::Text(config) => &config.name,
            ApiConfig::Image(config) => &config.name,
        }
    }

    pub fn kind(&self) -> ApiKind {
        match self {
            ApiConfig::Text(_) => ApiKind::Text,
            ApiConfig::Image(_) => ApiKind::Image,
        }
    }

    pub fn provider(&self) -> ProviderId {
        match self {
            ApiConfig::Text(config) => ProviderId::Text(config.provider),
            ApiConfig::Image(config) => ProviderId::Image(config.provider),
        }
    }

    pub fn enabled(&self) -> bool {
        match self {
            ApiConfig::Text(config) => config.enabled,
            ApiConfig::Image(config) => config.enabled,
        }
    }

    pub fn has_secret(&self) -> bool {
        match self {
            ApiConfig::Text(config) => config.has_secret(),
            ApiConfig::Image(config) => config.has_secret(),
        }
    }

    pub fn to_draft(&self) -> ApiConfigDraft {
        match self {
            ApiConfig::Text(config) => ApiConfigDraft::Text(config.into()),
            ApiConfig::Image(config) => ApiConfigDraft::Image(config.into()),
        }
    }
}

/// Serialized form of the whole config collection, used for export/import and
/// for persistence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigSnapshot {
    #[serde(default)]
    pub schema_version: u32,
    #[serde(default)]
    pub text_apis: Vec<TextApiConfig>,
    #[serde(default)]
    pub image_apis: Vec<ImageApiConfig>,
    #[serde(default)]
    pub default_text_api: Option<ApiId>,
    #[serde(default)]
    pub default_image_api: Option<ApiId>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_config() -> TextApiConfig {
        TextApiConfig::from_draft(
            ApiId::from("text-1"),
            TextApiDraft {
                name: Some("Main".to_owned()),
                provider: Some(TextProvider::OpenAi),
                api_key: Some("sk-abc".to_owned()),
                model: Some("gpt-4".to_owned()),
                ..TextApiDraft::default()
            },
        )
        .expect("provider set")
    }

    #[test]
    fn draft_without_provider_is_rejected() {
        assert!(TextApiConfig::from_draft(ApiId::from("x"), TextApiDraft::default()).is_none());
        assert!(ImageApiConfig::from_draft(ApiId::from("y"), ImageApiDraft::default()).is_none());
    }

    #[test]
    fn new_configs_are_enabled_unless_told_otherwise() {
        assert!(text_config().enabled);
        let disabled = ImageApiConfig::from_draft(
            ApiId::from("image-1"),
            ImageApiDraft {
                provider: Some(ImageProvider::Dalle),
                enabled: Some(false),
                ..ImageApiDraft::default()
            },
        )
        .expect("provider set");
        assert!(!disabled.enabled);
    }

    #[test]
    fn patch_only_touches_set_fields() {
        let mut config = text_config();
        config.apply(TextApiDraft {
            name: Some("Renamed".to_owned()),
            base_url: Some("  ".to_owned()),
            temperature: Some(0.3),
            ..TextApiDraft::default()
        });
        assert_eq!(config.name, "Renamed");
        assert_eq!(config.api_key, "sk-abc");
        assert_eq!(config.model, "gpt-4");
        assert_eq!(config.base_url, None);
        assert_eq!(config.temperature, Some(0.3));
        assert_eq!(config.id.as_str(), "text-1");
    }

    #[test]
    fn non_finite_temperature_is_never_stored() {
        let config = TextApiConfig::from_draft(
            ApiId::from("text-2"),
            TextApiDraft {
                provider: Some(TextProvider::Google),
                temperature: Some(f64::NAN),
                ..TextApiDraft::default()
            },
        )
        .expect("provider set");
        assert_eq!(config.temperature, None);

        let mut config = text_config();
        config.apply(TextApiDraft {
            temperature: Some(0.5),
            ..TextApiDraft::default()
        });
        config.apply(TextApiDraft {
            temperature: Some(f64::INFINITY),
            ..TextApiDraft::default()
        });
        assert_eq!(config.temperature, Some(0.5));

        let json = serde_json::to_string(&config).expect("serialize");
        let back: TextApiConfig = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(serde_json::to_string(&back).expect("serialize"), json);
    }

    #[test]
    fn snapshot_uses_camel_case_fields() {
        let snapshot = ConfigSnapshot {
            schema_version: 1,
            text_apis: vec![text_config()],
            ..ConfigSnapshot::default()
        };
        let json = serde_json::to_value(&snapshot).expect("serialize");
        assert_eq!(json["textApis"][0]["apiKey"], "sk-abc");
        assert_eq!(json["textApis"][0]["provider"], "openai");
        assert!(json["defaultTextApi"].is_null());
    }

    #[test]
    fn tagged_config_reports_kind_and_provider() {
        let config = ApiConfig::Text(text_config());
        assert_eq!(config.kind(), ApiKind::Text);
        assert_eq!(config.provider().as_str(), "openai");
        let json = serde_json::to_value(&config).expect("serialize");
        assert_eq!(json["type"], "text");
    }
}
