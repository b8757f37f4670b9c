use std::path::PathBuf;
use std::sync::Arc;

use config::{ConfigStore, StoreError};
use config_cache::DerivedConfigCache;
use core_types::{
    ApiConfig, ApiConfigDraft, ApiId, ApiKind, NormalizedPayload, UsageStat, ValidationResult,
};
use i18n::I18n;
use kv_store::{FileKvStore, KvStore, default_store_dir_from};
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, info, warn};
use usage_stats::{StatsError, UsageTracker};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Stats(#[from] StatsError),

    #[error("{kind} config `{id}` not found")]
    NotFound { kind: ApiKind, id: ApiId },

    #[error("{kind} config `{id}` is invalid: {}", .errors.join("; "))]
    Invalid {
        kind: ApiKind,
        id: ApiId,
        errors: Vec<String>,
    },
}

/// How many kinds currently have an effective default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigStatus {
    Complete,
    Partial { has_text: bool, has_image: bool },
    None,
}

impl ConfigStatus {
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Complete => "status.complete",
            Self::Partial { has_text: true, .. } => "status.text_only",
            Self::Partial { .. } => "status.image_only",
            Self::None => "status.none",
        }
    }
}

pub struct ApiConfigServiceBuilder {
    pub data_dir: PathBuf,
}

impl ApiConfigServiceBuilder {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn build(self) -> Result<ApiConfigService, ServiceError> {
        let kv = FileKvStore::new(default_store_dir_from(&self.data_dir));
        debug!(path = %kv.path().display(), "opening config store");
        ApiConfigService::load(Arc::new(kv))
    }
}

/// Config store, derived-payload cache and usage tracker behind one handle.
///
/// Mutations run against a copy of the store, persist it, and only then
/// replace the live state and clear the cache, so a failed write leaves
/// nothing half-applied.
#[derive(Clone)]
pub struct ApiConfigService {
    kv: Arc<dyn KvStore>,
    store: Arc<Mutex<ConfigStore>>,
    cache: Arc<DerivedConfigCache>,
    usage: Arc<UsageTracker>,
}

impl ApiConfigService {
    pub fn load(kv: Arc<dyn KvStore>) -> Result<Self, ServiceError> {
        let store = ConfigStore::load(kv.as_ref())?;
        info!(
            text = store.len(ApiKind::Text),
            image = store.len(ApiKind::Image),
            "config store loaded"
        );
        Ok(Self {
            usage: Arc::new(UsageTracker::new(Arc::clone(&kv))),
            kv,
            store: Arc::new(Mutex::new(store)),
            cache: Arc::new(DerivedConfigCache::new()),
        })
    }

    fn mutate<T>(
        &self,
        action: &'static str,
        apply: impl FnOnce(&mut ConfigStore) -> Result<T, ServiceError>,
    ) -> Result<T, ServiceError> {
        let mut store = self.store.lock();
        let mut next = store.clone();
        let out = apply(&mut next)?;
        next.save(self.kv.as_ref())?;
        *store = next;
        self.cache.clear();
        debug!(action, "config change persisted");
        Ok(out)
    }

    pub fn configs(&self, kind: ApiKind) -> Vec<ApiConfig> {
        self.store.lock().configs(kind)
    }

    pub fn get(&self, kind: ApiKind, id: &ApiId) -> Option<ApiConfig> {
        self.store.lock().get(kind, id)
    }

    pub fn default_id(&self, kind: ApiKind) -> Option<ApiId> {
        self.store.lock().default_id(kind).cloned()
    }

    pub fn validate(
        &self,
        kind: ApiKind,
        id: &ApiId,
        i18n: &I18n,
    ) -> Result<ValidationResult, ServiceError> {
        let config = self.get(kind, id).ok_or_else(|| ServiceError::NotFound {
            kind,
            id: id.clone(),
        })?;
        Ok(validation::validate_localized(&config.to_draft(), i18n))
    }

    pub fn add(&self, draft: ApiConfigDraft) -> Result<ApiId, ServiceError> {
        self.mutate("add", |store| Ok(store.add(draft)?))
    }

    /// Merges `patch` into the config. If that config is the current default
    /// and no longer validates, the default pointer is cleared.
    pub fn update(&self, id: &ApiId, patch: ApiConfigDraft) -> Result<(), ServiceError> {
        let kind = patch.kind();
        self.mutate("update", |store| {
            if !store.update(id, patch) {
                return Err(ServiceError::NotFound {
                    kind,
                    id: id.clone(),
                });
            }
            if store.default_id(kind) != Some(id) {
                return Ok(());
            }
            let still_valid = store
                .get(kind, id)
                .is_some_and(|config| validation::validate_config(&config).is_valid);
            if !still_valid {
                warn!(%kind, %id, "default no longer validates, clearing it");
                store.clear_default(kind);
            }
            Ok(())
        })
    }

    pub fn remove(&self, kind: ApiKind, id: &ApiId) -> Result<(), ServiceError> {
        self.mutate("remove", |store| {
            if store.remove(kind, id) {
                Ok(())
            } else {
                Err(ServiceError::NotFound {
                    kind,
                    id: id.clone(),
                })
            }
        })
    }

    /// Returns the new `enabled` value.
    pub fn toggle_enabled(&self, kind: ApiKind, id: &ApiId) -> Result<bool, ServiceError> {
        self.mutate("toggle", |store| {
            store
                .toggle_enabled(kind, id)
                .ok_or_else(|| ServiceError::NotFound {
                    kind,
                    id: id.clone(),
                })
        })
    }

    pub fn set_default(&self, kind: ApiKind, id: &ApiId) -> Result<(), ServiceError> {
        self.mutate("set_default", |store| {
            let config = store.get(kind, id).ok_or_else(|| ServiceError::NotFound {
                kind,
                id: id.clone(),
            })?;
            let result = validation::validate_config(&config);
            if !result.is_valid {
                return Err(ServiceError::Invalid {
                    kind,
                    id: id.clone(),
                    errors: result.errors,
                });
            }
            store.set_default(kind, id);
            Ok(())
        })
    }

    /// Brings every listed config to `enabled`. Configs already in that state
    /// and unknown ids are skipped; returns how many were flipped.
    pub fn set_enabled_many(
        &self,
        kind: ApiKind,
        ids: &[ApiId],
        enabled: bool,
    ) -> Result<usize, ServiceError> {
        self.mutate("set_enabled_many", |store| {
            let mut flipped = 0;
            for id in ids {
                let differs = store
                    .get(kind, id)
                    .is_some_and(|config| config.enabled() != enabled);
                if differs && store.toggle_enabled(kind, id).is_some() {
                    flipped += 1;
                }
            }
            Ok(flipped)
        })
    }

    pub fn remove_many(&self, kind: ApiKind, ids: &[ApiId]) -> Result<usize, ServiceError> {
        self.mutate("remove_many", |store| {
            Ok(ids.iter().filter(|id| store.remove(kind, id)).count())
        })
    }

    pub fn import_json(&self, raw: &str) -> Result<(), ServiceError> {
        self.mutate("import", |store| Ok(store.import_json(raw)?))
    }

    pub fn export_json(&self) -> Result<String, ServiceError> {
        Ok(self.store.lock().export_json()?)
    }

    pub fn effective_default(&self, kind: ApiKind) -> Option<ApiConfig> {
        self.store.lock().effective_default(kind)
    }

    pub fn derived_config(&self) -> Arc<NormalizedPayload> {
        let store = self.store.lock();
        self.cache.get(&store)
    }

    pub fn warm_cache(&self) {
        let store = self.store.lock();
        self.cache.warm(&store);
    }

    pub fn status(&self) -> ConfigStatus {
        let store = self.store.lock();
        let has_text = store.effective_text_default().is_some();
        let has_image = store.effective_image_default().is_some();
        match (has_text, has_image) {
            (true, true) => ConfigStatus::Complete,
            (false, false) => ConfigStatus::None,
            _ => ConfigStatus::Partial {
                has_text,
                has_image,
            },
        }
    }

    pub fn record_usage(
        &self,
        provider: &str,
        kind: ApiKind,
        success: bool,
        response_time_ms: Option<f64>,
    ) -> Result<UsageStat, ServiceError> {
        Ok(self
            .usage
            .record(provider, kind, success, response_time_ms)?)
    }

    pub fn usage_for(&self, provider: &str, kind: ApiKind) -> Option<UsageStat> {
        self.usage.get_for(provider, kind)
    }

    pub fn usage_all(&self) -> Vec<UsageStat> {
        self.usage.all()
    }

    pub fn clear_usage(&self) -> Result<(), ServiceError> {
        Ok(self.usage.clear_all()?)
    }
}

#[cfg(test)]
mod tests {
    use anyhow::bail;
    use core_types::{ImageApiDraft, ImageProvider, TextApiDraft, TextProvider, UiLanguage};
    use kv_store::MemoryKvStore;
    use tempfile::tempdir;

    use super::*;

    fn service() -> (Arc<MemoryKvStore>, ApiConfigService) {
        let kv = Arc::new(MemoryKvStore::new());
        let service = ApiConfigService::load(kv.clone()).expect("load empty");
        (kv, service)
    }

    fn text_draft(name: &str, api_key: &str) -> ApiConfigDraft {
        ApiConfigDraft::Text(TextApiDraft {
            name: Some(name.to_owned()),
            provider: Some(TextProvider::OpenAi),
            api_key: Some(api_key.to_owned()),
            model: Some("gpt-4".to_owned()),
            max_tokens: Some(4096),
            temperature: Some(0.7),
            ..TextApiDraft::default()
        })
    }

    fn image_draft() -> ApiConfigDraft {
        ApiConfigDraft::Image(ImageApiDraft {
            name: Some("Gemini".to_owned()),
            provider: Some(ImageProvider::Google),
            api_key: Some("AIza-image".to_owned()),
            aspect_ratio: Some("16:9".to_owned()),
            resolution: Some("2K".to_owned()),
            ..ImageApiDraft::default()
        })
    }

    #[test]
    fn disabling_the_default_hides_it_until_reenabled() {
        let (_, service) = service();
        let id = service.add(text_draft("Main", "sk-main")).expect("add");
        service.set_default(ApiKind::Text, &id).expect("set default");
        assert!(service.derived_config().text_api.is_some());

        assert!(!service.toggle_enabled(ApiKind::Text, &id).expect("toggle"));
        assert!(service.derived_config().text_api.is_none());
        assert_eq!(service.status(), ConfigStatus::None);

        assert!(service.toggle_enabled(ApiKind::Text, &id).expect("toggle"));
        let payload = service.derived_config();
        assert_eq!(payload.text_api.as_ref().map(|t| t.api_key.as_str()), Some("sk-main"));
    }

    #[test]
    fn mutations_persist_and_clear_the_cache() {
        let (kv, service) = service();
        let id = service.add(text_draft("Main", "sk-main")).expect("add");
        service.set_default(ApiKind::Text, &id).expect("set default");

        let first = service.derived_config();
        assert!(Arc::ptr_eq(&first, &service.derived_config()));

        service
            .update(
                &id,
                ApiConfigDraft::Text(TextApiDraft {
                    name: Some("Renamed".to_owned()),
                    ..TextApiDraft::default()
                }),
            )
            .expect("update");
        assert!(!Arc::ptr_eq(&first, &service.derived_config()));

        let reloaded = ApiConfigService::load(kv).expect("reload");
        assert_eq!(
            reloaded.export_json().expect("export"),
            service.export_json().expect("export")
        );
        assert_eq!(reloaded.default_id(ApiKind::Text), Some(id));
    }

    #[test]
    fn set_default_requires_a_valid_existing_config() {
        let (_, service) = service();
        let keyless = service.add(text_draft("Keyless", "")).expect("add");

        let err = service
            .set_default(ApiKind::Text, &keyless)
            .expect_err("invalid config");
        assert!(matches!(err, ServiceError::Invalid { ref errors, .. } if !errors.is_empty()));
        assert_eq!(service.default_id(ApiKind::Text), None);

        let zh = service
            .validate(ApiKind::Text, &keyless, &I18n::new(UiLanguage::ZhCn))
            .expect("validate");
        assert!(zh.errors.iter().any(|e| e == "API密钥不能为空"));

        let err = service
            .set_default(ApiKind::Image, &keyless)
            .expect_err("wrong kind");
        assert!(matches!(err, ServiceError::NotFound { kind: ApiKind::Image, .. }));
    }

    #[test]
    fn update_that_breaks_the_default_clears_it() {
        let (_, service) = service();
        let id = service.add(text_draft("Main", "sk-main")).expect("add");
        service.set_default(ApiKind::Text, &id).expect("set default");

        service
            .update(
                &id,
                ApiConfigDraft::Text(TextApiDraft {
                    max_tokens: Some(0),
                    ..TextApiDraft::default()
                }),
            )
            .expect("update");
        assert_eq!(service.default_id(ApiKind::Text), None);
        assert!(service.get(ApiKind::Text, &id).is_some());

        let err = service
            .update(&ApiId::from("ghost"), text_draft("x", "y"))
            .expect_err("unknown id");
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[test]
    fn batch_actions_only_touch_what_differs() {
        let (_, service) = service();
        let a = service.add(text_draft("a", "sk-a")).expect("add");
        let b = service.add(text_draft("b", "sk-b")).expect("add");
        let c = service.add(text_draft("c", "sk-c")).expect("add");
        service.toggle_enabled(ApiKind::Text, &b).expect("toggle");

        let ids = [a.clone(), b.clone(), c.clone(), ApiId::from("ghost")];
        assert_eq!(
            service
                .set_enabled_many(ApiKind::Text, &ids, false)
                .expect("disable"),
            2
        );
        assert!(service.configs(ApiKind::Text).iter().all(|c| !c.enabled()));
        assert_eq!(
            service
                .set_enabled_many(ApiKind::Text, &ids, true)
                .expect("enable"),
            3
        );

        assert_eq!(
            service
                .remove_many(ApiKind::Text, &[a, c, ApiId::from("ghost")])
                .expect("remove"),
            2
        );
        let left: Vec<_> = service
            .configs(ApiKind::Text)
            .iter()
            .map(|c| c.id().clone())
            .collect();
        assert_eq!(left, [b]);
    }

    #[test]
    fn status_tracks_effective_defaults() {
        let (_, service) = service();
        assert_eq!(service.status(), ConfigStatus::None);

        let image = service.add(image_draft()).expect("add image");
        service.set_default(ApiKind::Image, &image).expect("default");
        let status = service.status();
        assert_eq!(
            status,
            ConfigStatus::Partial {
                has_text: false,
                has_image: true
            }
        );
        assert_eq!(status.label_key(), "status.image_only");

        let text = service.add(text_draft("Main", "sk-main")).expect("add");
        service.set_default(ApiKind::Text, &text).expect("default");
        assert_eq!(service.status(), ConfigStatus::Complete);

        service.remove(ApiKind::Image, &image).expect("remove");
        assert_eq!(service.status().label_key(), "status.text_only");
    }

    #[test]
    fn failed_import_leaves_state_and_storage_untouched() {
        let (kv, service) = service();
        service.add(text_draft("Main", "sk-main")).expect("add");
        let before = service.export_json().expect("export");
        let persisted = kv.get(config::CONFIG_STORAGE_KEY).expect("read");

        assert!(matches!(
            service.import_json("{ not json"),
            Err(ServiceError::Store(StoreError::Parse(_)))
        ));
        assert_eq!(service.export_json().expect("export"), before);
        assert_eq!(kv.get(config::CONFIG_STORAGE_KEY).expect("read"), persisted);
    }

    struct ReadOnlyKv;

    impl KvStore for ReadOnlyKv {
        fn get(&self, _key: &str) -> anyhow::Result<Option<Vec<u8>>> {
            Ok(None)
        }

        fn set(&self, key: &str, _value: &[u8]) -> anyhow::Result<()> {
            bail!("store is read-only, refusing to write `{key}`")
        }

        fn remove(&self, _key: &str) -> anyhow::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn write_failure_keeps_previous_state() {
        let service = ApiConfigService::load(Arc::new(ReadOnlyKv)).expect("load");
        let err = service
            .add(text_draft("Main", "sk-main"))
            .expect_err("write must fail");
        assert!(matches!(err, ServiceError::Store(StoreError::Storage(_))));
        assert!(service.configs(ApiKind::Text).is_empty());

        assert!(matches!(
            service.record_usage("openai", ApiKind::Text, true, None),
            Err(ServiceError::Stats(StatsError::Storage(_)))
        ));
    }

    #[test]
    fn usage_is_delegated_to_the_tracker() {
        let (_, service) = service();
        service
            .record_usage("openai", ApiKind::Text, true, Some(100.0))
            .expect("record");
        service
            .record_usage("openai", ApiKind::Text, true, Some(300.0))
            .expect("record");

        let stat = service.usage_for("openai", ApiKind::Text).expect("stat");
        assert_eq!(stat.average_response_time, 200.0);
        assert_eq!(service.usage_all().len(), 1);

        service.clear_usage().expect("clear");
        assert!(service.usage_all().is_empty());
    }

    #[test]
    fn builder_opens_a_file_store_under_the_data_dir() {
        let dir = tempdir().expect("tempdir");
        let service = ApiConfigServiceBuilder::new(dir.path().to_path_buf())
            .build()
            .expect("build");
        let id = service.add(image_draft()).expect("add");
        service.set_default(ApiKind::Image, &id).expect("default");
        service.warm_cache();

        let reopened = ApiConfigServiceBuilder::new(dir.path().to_path_buf())
            .build()
            .expect("reopen");
        assert_eq!(reopened.default_id(ApiKind::Image), Some(id));
        assert!(reopened.derived_config().image_api.is_some());
        assert!(dir.path().join("data").join("store.json").exists());
    }
}
