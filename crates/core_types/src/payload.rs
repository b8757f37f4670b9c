use serde::{Deserialize, Serialize};

use crate::{ImageApiConfig, ImageProvider, TextApiConfig, TextProvider};

/// Request-shaped view of the effective defaults handed to the dispatcher.
/// A missing section means no usable default exists for that kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NormalizedPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_api: Option<TextApiPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_api: Option<ImageApiPayload>,
}

impl NormalizedPayload {
    pub fn is_empty(&self) -> bool {
        self.text_api.is_none() && self.image_api.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextApiPayload {
    pub provider: TextProvider,
    pub api_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    pub enable_thinking: bool,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageApiPayload {
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
    pub enabled: bool,
}

impl From<&TextApiConfig> for TextApiPayload {
    fn from(config: &TextApiConfig) -> Self {
        Self {
            provider: config.provider,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            temperature: config.temperature,
            enable_thinking: config.enable_thinking,
            enabled: true,
        }
    }
}

impl From<&ImageApiConfig> for ImageApiPayload {
    fn from(config: &ImageApiConfig) -> Self {
        Self {
            provider: config.provider,
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            model: config.model.clone(),
            aspect_ratio: config.aspect_ratio.clone(),
            resolution: config.resolution.clone(),
            style: config.style.clone(),
            enabled: true,
        }
    }
}
