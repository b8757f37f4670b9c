use std::collections::BTreeMap;

use core_types::UiLanguage;

#[derive(Debug, Clone)]
pub struct I18n {
    lang: UiLanguage,
    zh_cn: BTreeMap<&'static str, &'static str>,
    en_us: BTreeMap<&'static str, &'static str>,
}

impl Default for I18n {
    fn default() -> Self {
        Self::new(UiLanguage::EnUs)
    }
}

impl I18n {
    pub fn new(lang: UiLanguage) -> Self {
        Self {
            lang,
            zh_cn: zh_cn_map(),
            en_us: en_us_map(),
        }
    }

    pub fn set_language(&mut self, lang: UiLanguage) {
        self.lang = lang;
    }

    pub fn language(&self) -> UiLanguage {
        self.lang
    }

    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        match self.lang {
            UiLanguage::ZhCn => self
                .zh_cn
                .get(key)
                .copied()
                .or_else(|| self.en_us.get(key).copied())
                .unwrap_or(key),
            UiLanguage::EnUs => self
                .en_us
                .get(key)
                .copied()
                .or_else(|| self.zh_cn.get(key).copied())
                .unwrap_or(key),
        }
    }

    /// Translates `key` and fills `{name}` placeholders from `args`.
    pub fn t_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        args.iter()
            .fold(self.t(key).to_owned(), |text, (name, value)| {
                text.replace(&format!("{{{name}}}"), value)
            })
    }
}

fn zh_cn_map() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("validation.name.required", "API名称不能为空"),
        ("validation.api_key.required", "API密钥不能为空"),
        ("validation.provider.required", "必须选择API提供商"),
        ("validation.model.required", "模型名称不能为空"),
        ("validation.max_tokens.range", "最大Token数应在1-100000之间"),
        ("validation.temperature.range", "温度值应在0-2之间"),
        ("validation.base_url.invalid", "Base URL格式不正确"),
        (
            "validation.aspect_ratio.nonstandard",
            "建议使用标准宽高比：16:9, 4:3, 1:1, 3:4, 9:16",
        ),
        (
            "validation.resolution.nonstandard",
            "分辨率格式应为\"1024x576\"或\"2K\"等标准格式",
        ),
        (
            "validation.api_key.prefix",
            "{vendor} API密钥通常以\"{prefix}\"开头，请确认密钥正确",
        ),
        ("validation.base_url.jimeng", "即梦AI的Base URL应包含\"jimeng\""),
        ("validation.thinking.unsupported", "{vendor} 不支持思考模式，该选项将被忽略"),
        ("stats.recency.never", "从未使用"),
        ("stats.recency.just_now", "刚刚使用"),
        ("stats.recency.hours", "{n}小时前"),
        ("stats.recency.days", "{n}天前"),
        ("stats.recency.long_ago", "很久未使用"),
        ("stats.health.healthy", "运行良好"),
        ("stats.health.degraded", "不稳定"),
        ("stats.health.failing", "频繁失败"),
        ("status.complete", "已完整配置"),
        ("status.text_only", "仅文本API"),
        ("status.image_only", "仅图像API"),
        ("status.none", "未配置API"),
    ])
}

fn en_us_map() -> BTreeMap<&'static str, &'static str> {
    BTreeMap::from([
        ("validation.name.required", "API name must not be empty"),
        ("validation.api_key.required", "API key must not be empty"),
        ("validation.provider.required", "An API provider must be selected"),
        ("validation.model.required", "Model name must not be empty"),
        (
            "validation.max_tokens.range",
            "Max tokens must be between 1 and 100000",
        ),
        ("validation.temperature.range", "Temperature must be between 0 and 2"),
        ("validation.base_url.invalid", "Base URL is not a valid absolute URL"),
        (
            "validation.aspect_ratio.nonstandard",
            "Prefer a standard aspect ratio: 16:9, 4:3, 1:1, 3:4, 9:16",
        ),
        (
            "validation.resolution.nonstandard",
            "Resolution should look like \"1024x576\" or \"2K\"",
        ),
        (
            "validation.api_key.prefix",
            "{vendor} API keys usually start with \"{prefix}\", double-check the key",
        ),
        (
            "validation.base_url.jimeng",
            "Jimeng AI base URL should contain \"jimeng\"",
        ),
        (
            "validation.thinking.unsupported",
            "{vendor} does not support thinking mode, the flag will be ignored",
        ),
        ("stats.recency.never", "never used"),
        ("stats.recency.just_now", "just now"),
        ("stats.recency.hours", "{n} hours ago"),
        ("stats.recency.days", "{n} days ago"),
        ("stats.recency.long_ago", "not used in a long time"),
        ("stats.health.healthy", "healthy"),
        ("stats.health.degraded", "degraded"),
        ("stats.health.failing", "failing"),
        ("status.complete", "Fully configured"),
        ("status.text_only", "Text API only"),
        ("status.image_only", "Image API only"),
        ("status.none", "No API configured"),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_chinese_translation() {
        let i18n = I18n::new(UiLanguage::ZhCn);
        assert_eq!(i18n.t("validation.api_key.required"), "API密钥不能为空");
    }

    #[test]
    fn falls_back_to_key_when_missing() {
        let i18n = I18n::new(UiLanguage::EnUs);
        assert_eq!(i18n.t("not.exists"), "not.exists");
    }

    #[test]
    fn fills_placeholders() {
        let i18n = I18n::default();
        assert_eq!(
            i18n.t_with("stats.recency.hours", &[("n", "3")]),
            "3 hours ago"
        );
    }

    #[test]
    fn catalogues_share_keys() {
        let zh: Vec<_> = zh_cn_map().into_keys().collect();
        let en: Vec<_> = en_us_map().into_keys().collect();
        assert_eq!(zh, en);
    }
}
