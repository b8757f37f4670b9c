use core_types::{
    ApiConfigDraft, ImageApiDraft, ImageProvider, ProviderId, TextApiDraft, TextProvider,
};

fn text(
    provider: TextProvider,
    base_url: &str,
    model: &str,
    max_tokens: i64,
    temperature: f64,
) -> ApiConfigDraft {
    ApiConfigDraft::Text(TextApiDraft {
        name: Some(provider.display_name().to_owned()),
        provider: Some(provider),
        base_url: Some(base_url.to_owned()),
        model: Some(model.to_owned()),
        max_tokens: Some(max_tokens),
        temperature: Some(temperature),
        ..TextApiDraft::default()
    })
}

fn image(
    provider: ImageProvider,
    base_url: Option<&str>,
    model: Option<&str>,
    aspect_ratio: Option<&str>,
    resolution: Option<&str>,
    style: Option<&str>,
) -> ApiConfigDraft {
    ApiConfigDraft::Image(ImageApiDraft {
        name: Some(provider.display_name().to_owned()),
        provider: Some(provider),
        base_url: base_url.map(str::to_owned),
        model: model.map(str::to_owned),
        aspect_ratio: aspect_ratio.map(str::to_owned),
        resolution: resolution.map(str::to_owned),
        style: style.map(str::to_owned),
        ..ImageApiDraft::default()
    })
}

/// Prefilled draft for a new config of the given vendor. The secret is left
/// empty for the user to fill in. Custom vendors have no template.
pub fn template(provider: ProviderId) -> Option<ApiConfigDraft> {
    let draft = match provider {
        ProviderId::Text(TextProvider::Google) => text(
            TextProvider::Google,
            "https://generativelanguage.googleapis.com",
            "gemini-2.5-flash",
            8192,
            0.7,
        ),
        ProviderId::Text(TextProvider::OpenAi) => text(
            TextProvider::OpenAi,
            "https://api.openai.com/v1",
            "gpt-4",
            4096,
            0.7,
        ),
        ProviderId::Text(TextProvider::Anthropic) => text(
            TextProvider::Anthropic,
            "https://api.anthropic.com",
            "claude-3-sonnet-20240229",
            4096,
            0.7,
        ),
        ProviderId::Image(ImageProvider::Google) => image(
            ImageProvider::Google,
            None,
            Some("gemini-3-pro-image-preview"),
            Some("16:9"),
            Some("2K"),
            None,
        ),
        ProviderId::Image(ImageProvider::Jimeng) => image(
            ImageProvider::Jimeng,
            Some("https://api.jimeng.ai"),
            Some("jimeng-v1"),
            Some("16:9"),
            Some("1024x576"),
            Some("realistic"),
        ),
        ProviderId::Image(ImageProvider::Dalle) => image(
            ImageProvider::Dalle,
            Some("https://api.openai.com/v1"),
            Some("dall-e-3"),
            None,
            Some("1792x1024"),
            None,
        ),
        ProviderId::Image(ImageProvider::Midjourney) => image(
            ImageProvider::Midjourney,
            Some("https://api.midjourney.com"),
            None,
            Some("16:9"),
            Some("high"),
            Some("v6"),
        ),
        ProviderId::Image(ImageProvider::StableDiffusion) => image(
            ImageProvider::StableDiffusion,
            Some("https://api.stability.ai"),
            Some("stable-diffusion-xl-1024-v1-0"),
            None,
            Some("1024x576"),
            None,
        ),
        ProviderId::Text(TextProvider::Custom) | ProviderId::Image(ImageProvider::Custom) => {
            return None;
        }
    };
    Some(draft)
}
