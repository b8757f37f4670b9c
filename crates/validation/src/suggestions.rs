use core_types::{ImageProvider, ProviderId, TextProvider};
use serde::Serialize;

/// Recommended starting values for a vendor. Guidance only, never consulted by
/// validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Suggestion {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aspect_ratio: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolution: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub style: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tips: Option<&'static str>,
}

impl Suggestion {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

pub fn suggest(provider: ProviderId) -> Suggestion {
    match provider {
        ProviderId::Text(TextProvider::Google) => Suggestion {
            model: Some("gemini-2.5-flash"),
            max_tokens: Some(8192),
            temperature: Some(0.7),
            tips: Some("gemini-2.5-flash balances quality and cost well"),
            ..Suggestion::default()
        },
        ProviderId::Text(TextProvider::OpenAi) => Suggestion {
            model: Some("gpt-4"),
            max_tokens: Some(4096),
            temperature: Some(0.7),
            tips: Some("GPT-4 gives higher quality at a higher price; gpt-3.5-turbo is cheaper"),
            ..Suggestion::default()
        },
        ProviderId::Text(TextProvider::Anthropic) => Suggestion {
            model: Some("claude-3-sonnet-20240229"),
            max_tokens: Some(4096),
            temperature: Some(0.7),
            tips: Some("Claude is strong at long documents and reasoning"),
            ..Suggestion::default()
        },
        ProviderId::Image(ImageProvider::Google) => Suggestion {
            model: Some("gemini-3-pro-image-preview"),
            aspect_ratio: Some("16:9"),
            resolution: Some("2K"),
            tips: Some("Supports reference images, which keeps slide styles consistent"),
            ..Suggestion::default()
        },
        ProviderId::Image(ImageProvider::Jimeng) => Suggestion {
            model: Some("jimeng-v1"),
            aspect_ratio: Some("16:9"),
            resolution: Some("1024x576"),
            style: Some("realistic"),
            tips: Some("Handles Chinese prompts and local scenes well"),
            ..Suggestion::default()
        },
        ProviderId::Image(ImageProvider::Dalle) => Suggestion {
            model: Some("dall-e-3"),
            resolution: Some("1792x1024"),
            tips: Some("High quality output, no reference image support"),
            ..Suggestion::default()
        },
        ProviderId::Text(TextProvider::Custom)
        | ProviderId::Image(
            ImageProvider::Midjourney | ImageProvider::StableDiffusion | ImageProvider::Custom,
        ) => Suggestion::default(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vendors_have_recommendations() {
        let text = suggest(ProviderId::Text(TextProvider::Google));
        assert_eq!(text.model, Some("gemini-2.5-flash"));
        assert_eq!(text.max_tokens, Some(8192));
        assert!(text.aspect_ratio.is_none());

        let image = suggest(ProviderId::Image(ImageProvider::Jimeng));
        assert_eq!(image.style, Some("realistic"));
        assert!(image.max_tokens.is_none());
    }

    #[test]
    fn unknown_pairs_yield_empty_record() {
        assert!(suggest(ProviderId::Text(TextProvider::Custom)).is_empty());
        assert!(suggest(ProviderId::Image(ImageProvider::Midjourney)).is_empty());
    }
}
