use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ApiKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownProvider {
    pub kind: ApiKind,
    pub value: String,
}

impl fmt::Display for UnknownProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} provider `{}`", self.kind, self.value)
    }
}

impl std::error::Error for UnknownProvider {}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum TextProvider {
    Google,
    OpenAi,
    Anthropic,
    Custom,
}

impl TextProvider {
    pub const ALL: [TextProvider; 4] = [
        TextProvider::Google,
        TextProvider::OpenAi,
        TextProvider::Anthropic,
        TextProvider::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            TextProvider::Google => "google",
            TextProvider::OpenAi => "openai",
            TextProvider::Anthropic => "anthropic",
            TextProvider::Custom => "custom",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            TextProvider::Google => "Google Gemini",
            TextProvider::OpenAi => "OpenAI GPT",
            TextProvider::Anthropic => "Anthropic Claude",
            TextProvider::Custom => "Custom",
        }
    }

    /// Whether the vendor honors the `enable_thinking` request flag.
    pub fn supports_thinking(self) -> bool {
        matches!(self, TextProvider::Anthropic | TextProvider::Google)
    }
}

impl FromStr for TextProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str() == value)
            .ok_or(UnknownProvider {
                kind: ApiKind::Text,
                value,
            })
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "kebab-case")]
pub enum ImageProvider {
    Google,
    Jimeng,
    Midjourney,
    Dalle,
    StableDiffusion,
    Custom,
}

impl ImageProvider {
    pub const ALL: [ImageProvider; 6] = [
        ImageProvider::Google,
        ImageProvider::Jimeng,
        ImageProvider::Midjourney,
        ImageProvider::Dalle,
        ImageProvider::StableDiffusion,
        ImageProvider::Custom,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ImageProvider::Google => "google",
            ImageProvider::Jimeng => "jimeng",
            ImageProvider::Midjourney => "midjourney",
            ImageProvider::Dalle => "dalle",
            ImageProvider::StableDiffusion => "stable-diffusion",
            ImageProvider::Custom => "custom",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ImageProvider::Google => "Google Gemini Image",
            ImageProvider::Jimeng => "Jimeng AI",
            ImageProvider::Midjourney => "Midjourney",
            ImageProvider::Dalle => "DALL-E 3",
            ImageProvider::StableDiffusion => "Stable Diffusion",
            ImageProvider::Custom => "Custom",
        }
    }
}

impl FromStr for ImageProvider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|provider| provider.as_str() == value)
            .ok_or(UnknownProvider {
                kind: ApiKind::Image,
                value,
            })
    }
}

/// A vendor together with the kind it was picked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    Text(TextProvider),
    Image(ImageProvider),
}

impl ProviderId {
    pub fn parse(kind: ApiKind, value: &str) -> Result<Self, UnknownProvider> {
        match kind {
            ApiKind::Text => value.parse().map(ProviderId::Text),
            ApiKind::Image => value.parse().map(ProviderId::Image),
        }
    }

    pub fn kind(self) -> ApiKind {
        match self {
            ProviderId::Text(_) => ApiKind::Text,
            ProviderId::Image(_) => ApiKind::Image,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ProviderId::Text(provider) => provider.as_str(),
            ProviderId::Image(provider) => provider.as_str(),
        }
    }
}

impl fmt::Display for ProviderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
