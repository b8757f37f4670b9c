//! Structural and vendor-specific checks for provider configs.
//!
//! Validation never fails: every problem is reported as an error (blocks the
//! config from becoming an effective default) or a warning (advisory only).
//! Key-shape checks are warnings because vendors change their key formats.

mod suggestions;

use std::sync::LazyLock;

use core_types::{
    ApiConfig, ApiConfigDraft, ImageApiDraft, ImageProvider, TextApiDraft, TextProvider,
    ValidationResult,
};
use i18n::I18n;
use regex::Regex;
use url::Url;

pub use suggestions::{Suggestion, suggest};

pub const MAX_TOKENS_RANGE: std::ops::RangeInclusive<i64> = 1..=100_000;
pub const TEMPERATURE_RANGE: std::ops::RangeInclusive<f64> = 0.0..=2.0;
pub const STANDARD_ASPECT_RATIOS: [&str; 5] = ["16:9", "4:3", "1:1", "3:4", "9:16"];

static RESOLUTION_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([0-9]+x[0-9]+|2K|4K|HD|FHD)$").expect("resolution pattern is valid")
});

static ENGLISH: LazyLock<I18n> = LazyLock::new(I18n::default);

struct Message {
    key: &'static str,
    args: Vec<(&'static str, String)>,
}

impl Message {
    fn plain(key: &'static str) -> Self {
        Self {
            key,
            args: Vec::new(),
        }
    }

    fn key_prefix(vendor: &str, prefix: &str) -> Self {
        Self {
            key: "validation.api_key.prefix",
            args: vec![("vendor", vendor.to_owned()), ("prefix", prefix.to_owned())],
        }
    }

    fn render(&self, i18n: &I18n) -> String {
        let args: Vec<(&str, &str)> = self
            .args
            .iter()
            .map(|(name, value)| (*name, value.as_str()))
            .collect();
        i18n.t_with(self.key, &args)
    }
}

#[derive(Default)]
struct Findings {
    errors: Vec<Message>,
    warnings: Vec<Message>,
}

impl Findings {
    fn error(&mut self, key: &'static str) {
        self.errors.push(Message::plain(key));
    }

    fn warn(&mut self, message: Message) {
        self.warnings.push(message);
    }

    fn into_result(self, i18n: &I18n) -> ValidationResult {
        ValidationResult::new(
            self.errors.iter().map(|m| m.render(i18n)).collect(),
            self.warnings.iter().map(|m| m.render(i18n)).collect(),
        )
    }
}

pub fn validate(draft: &ApiConfigDraft) -> ValidationResult {
    validate_localized(draft, &ENGLISH)
}

pub fn validate_localized(draft: &ApiConfigDraft, i18n: &I18n) -> ValidationResult {
    match draft {
        ApiConfigDraft::Text(draft) => text_findings(draft).into_result(i18n),
        ApiConfigDraft::Image(draft) => image_findings(draft).into_result(i18n),
    }
}

pub fn validate_text(draft: &TextApiDraft) -> ValidationResult {
    text_findings(draft).into_result(&ENGLISH)
}

pub fn validate_image(draft: &ImageApiDraft) -> ValidationResult {
    image_findings(draft).into_result(&ENGLISH)
}

pub fn validate_config(config: &ApiConfig) -> ValidationResult {
    validate(&config.to_draft())
}

fn is_blank(value: Option<&String>) -> bool {
    value.is_none_or(|v| v.trim().is_empty())
}

fn filled(value: Option<&String>) -> Option<&str> {
    value.map(String::as_str).filter(|v| !v.is_empty())
}

fn common_findings(
    findings: &mut Findings,
    name: Option<&String>,
    api_key: Option<&String>,
    has_provider: bool,
) {
    if is_blank(name) {
        findings.error("validation.name.required");
    }
    if is_blank(api_key) {
        findings.error("validation.api_key.required");
    }
    if !has_provider {
        findings.error("validation.provider.required");
    }
}

fn base_url_findings(findings: &mut Findings, base_url: Option<&String>) {
    let Some(raw) = base_url.filter(|v| !v.trim().is_empty()) else {
        return;
    };
    if Url::parse(raw).is_err() {
        findings.error("validation.base_url.invalid");
    }
}

fn key_prefix_findings(
    findings: &mut Findings,
    api_key: Option<&String>,
    vendor: &str,
    prefix: &str,
) {
    let Some(key) = api_key.filter(|k| !k.trim().is_empty()) else {
        return;
    };
    if !key.starts_with(prefix) {
        findings.warn(Message::key_prefix(vendor, prefix));
    }
}

fn text_findings(draft: &TextApiDraft) -> Findings {
    let mut findings = Findings::default();
    common_findings(
        &mut findings,
        draft.name.as_ref(),
        draft.api_key.as_ref(),
        draft.provider.is_some(),
    );

    if is_blank(draft.model.as_ref()) {
        findings.error("validation.model.required");
    }
    if draft
        .max_tokens
        .is_some_and(|max_tokens| !MAX_TOKENS_RANGE.contains(&max_tokens))
    {
        findings.error("validation.max_tokens.range");
    }
    if draft
        .temperature
        .is_some_and(|temperature| !TEMPERATURE_RANGE.contains(&temperature))
    {
        findings.error("validation.temperature.range");
    }

    if let Some(provider) = draft.provider {
        let api_key = draft.api_key.as_ref();
        match provider {
            TextProvider::Google => key_prefix_findings(&mut findings, api_key, "Google", "AI"),
            TextProvider::OpenAi => key_prefix_findings(&mut findings, api_key, "OpenAI", "sk-"),
            TextProvider::Anthropic => {
                key_prefix_findings(&mut findings, api_key, "Anthropic", "sk-ant-")
            }
            TextProvider::Custom => {}
        }
        if draft.enable_thinking == Some(true) && !provider.supports_thinking() {
            findings.warn(Message {
                key: "validation.thinking.unsupported",
                args: vec![("vendor", provider.display_name().to_owned())],
            });
        }
    }

    base_url_findings(&mut findings, draft.base_url.as_ref());
    findings
}

fn image_findings(draft: &ImageApiDraft) -> Findings {
    let mut findings = Findings::default();
    common_findings(
        &mut findings,
        draft.name.as_ref(),
        draft.api_key.as_ref(),
        draft.provider.is_some(),
    );

    if filled(draft.aspect_ratio.as_ref())
        .is_some_and(|ratio| !STANDARD_ASPECT_RATIOS.contains(&ratio))
    {
        findings.warn(Message::plain("validation.aspect_ratio.nonstandard"));
    }
    if filled(draft.resolution.as_ref())
        .is_some_and(|resolution| !RESOLUTION_PATTERN.is_match(resolution))
    {
        findings.warn(Message::plain("validation.resolution.nonstandard"));
    }

    let api_key = draft.api_key.as_ref();
    match draft.provider {
        Some(ImageProvider::Google) => key_prefix_findings(&mut findings, api_key, "Google", "AI"),
        Some(ImageProvider::Dalle) => key_prefix_findings(&mut findings, api_key, "DALL-E", "sk-"),
        Some(ImageProvider::Jimeng) => {
            if filled(draft.base_url.as_ref())
                .is_some_and(|base_url| !base_url.contains("jimeng"))
            {
                findings.warn(Message::plain("validation.base_url.jimeng"));
            }
        }
        _ => {}
    }

    base_url_findings(&mut findings, draft.base_url.as_ref());
    findings
}
