mod templates;

use std::path::PathBuf;

use anyhow::Context;
use core_types::{
    ApiConfig, ApiConfigDraft, ApiId, ApiKind, ConfigSnapshot, ImageApiConfig, TextApiConfig,
};
use indexmap::IndexMap;
use indexmap::map::Entry;
use kv_store::KvStore;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use templates::template;

pub const CURRENT_SCHEMA_VERSION: u32 = 1;
pub const CONFIG_STORAGE_KEY: &str = "api-config";

pub fn default_data_dir() -> anyhow::Result<PathBuf> {
    let mut dir = dirs::config_dir().context("failed to resolve config_dir")?;
    dir.push("apiconf");
    Ok(dir)
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("config draft has no provider selected")]
    MissingProvider,

    #[error("config snapshot is malformed: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("config snapshot lists {kind} config `{id}` more than once")]
    DuplicateId { kind: ApiKind, id: ApiId },

    #[error(
        "config snapshot schema version {0} is newer than supported {max}",
        max = CURRENT_SCHEMA_VERSION
    )]
    UnsupportedVersion(u32),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Owner of the text and image config sequences and their default pointers.
///
/// Every mutating method obliges the caller to clear any derived-config cache
/// built from this store afterwards.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    text_apis: IndexMap<ApiId, TextApiConfig>,
    image_apis: IndexMap<ApiId, ImageApiConfig>,
    default_text_api: Option<ApiId>,
    default_image_api: Option<ApiId>,
}

impl ConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text_apis(&self) -> impl Iterator<Item = &TextApiConfig> {
        self.text_apis.values()
    }

    pub fn image_apis(&self) -> impl Iterator<Item = &ImageApiConfig> {
        self.image_apis.values()
    }

    pub fn configs(&self, kind: ApiKind) -> Vec<ApiConfig> {
        match kind {
            ApiKind::Text => self.text_apis().cloned().map(ApiConfig::Text).collect(),
            ApiKind::Image => self.image_apis().cloned().map(ApiConfig::Image).collect(),
        }
    }

    pub fn len(&self, kind: ApiKind) -> usize {
        match kind {
            ApiKind::Text => self.text_apis.len(),
            ApiKind::Image => self.image_apis.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.text_apis.is_empty() && self.image_apis.is_empty()
    }

    pub fn text(&self, id: &ApiId) -> Option<&TextApiConfig> {
        self.text_apis.get(id)
    }

    pub fn image(&self, id: &ApiId) -> Option<&ImageApiConfig> {
        self.image_apis.get(id)
    }

    pub fn get(&self, kind: ApiKind, id: &ApiId) -> Option<ApiConfig> {
        match kind {
            ApiKind::Text => self.text(id).cloned().map(ApiConfig::Text),
            ApiKind::Image => self.image(id).cloned().map(ApiConfig::Image),
        }
    }

    pub fn contains(&self, kind: ApiKind, id: &ApiId) -> bool {
        match kind {
            ApiKind::Text => self.text_apis.contains_key(id),
            ApiKind::Image => self.image_apis.contains_key(id),
        }
    }

    pub fn default_id(&self, kind: ApiKind) -> Option<&ApiId> {
        match kind {
            ApiKind::Text => self.default_text_api.as_ref(),
            ApiKind::Image => self.default_image_api.as_ref(),
        }
    }

    fn default_slot(&mut self, kind: ApiKind) -> &mut Option<ApiId> {
        match kind {
            ApiKind::Text => &mut self.default_text_api,
            ApiKind::Image => &mut self.default_image_api,
        }
    }

    /// Appends a config under a fresh id. The new entry never becomes the
    /// default on its own.
    pub fn add(&mut self, draft: ApiConfigDraft) -> Result<ApiId, StoreError> {
        let kind = draft.kind();
        let id = ApiId::generate(kind);
        match draft {
            ApiConfigDraft::Text(draft) => {
                let config = TextApiConfig::from_draft(id.clone(), draft)
                    .ok_or(StoreError::MissingProvider)?;
                self.text_apis.insert(id.clone(), config);
            }
            ApiConfigDraft::Image(draft) => {
                let config = ImageApiConfig::from_draft(id.clone(), draft)
                    .ok_or(StoreError::MissingProvider)?;
                self.image_apis.insert(id.clone(), config);
            }
        }
        debug!(%kind, %id, "config added");
        Ok(id)
    }

    /// Merges the set fields of `patch` into the config with `id` in the
    /// patch's kind. Unknown ids are ignored; returns whether anything changed.
    pub fn update(&mut self, id: &ApiId, patch: ApiConfigDraft) -> bool {
        let kind = patch.kind();
        let updated = match patch {
            ApiConfigDraft::Text(patch) => self
                .text_apis
                .get_mut(id)
                .map(|config| config.apply(patch))
                .is_some(),
            ApiConfigDraft::Image(patch) => self
                .image_apis
                .get_mut(id)
                .map(|config| config.apply(patch))
                .is_some(),
        };
        if updated {
            debug!(%kind, %id, "config updated");
        } else {
            debug!(%kind, %id, "update ignored, unknown config");
        }
        updated
    }

    /// Removes the config and clears the default pointer if it referenced it.
    /// No other entry is promoted.
    pub fn remove(&mut self, kind: ApiKind, id: &ApiId) -> bool {
        let removed = match kind {
            ApiKind::Text => self.text_apis.shift_remove(id).is_some(),
            ApiKind::Image => self.image_apis.shift_remove(id).is_some(),
        };
        if !removed {
            return false;
        }

        let slot = self.default_slot(kind);
        if slot.as_ref() == Some(id) {
            *slot = None;
            info!(%kind, %id, "default cleared after removal");
        }
        debug!(%kind, %id, "config removed");
        true
    }

    /// Flips `enabled` and returns the new value. The default pointer is kept
    /// when its config gets disabled; the effective-default read path skips it.
    pub fn toggle_enabled(&mut self, kind: ApiKind, id: &ApiId) -> Option<bool> {
        let enabled = match kind {
            ApiKind::Text => self.text_apis.get_mut(id).map(|config| {
                config.enabled = !config.enabled;
                config.enabled
            }),
            ApiKind::Image => self.image_apis.get_mut(id).map(|config| {
                config.enabled = !config.enabled;
                config.enabled
            }),
        }?;
        debug!(%kind, %id, enabled, "config toggled");
        Some(enabled)
    }

    /// Points the kind's default at `id` if it exists. Validity is the
    /// caller's concern.
    pub fn set_default(&mut self, kind: ApiKind, id: &ApiId) -> bool {
        if !self.contains(kind, id) {
            return false;
        }
        *self.default_slot(kind) = Some(id.clone());
        info!(%kind, %id, "default changed");
        true
    }

    pub fn clear_default(&mut self, kind: ApiKind) -> Option<ApiId> {
        let previous = self.default_slot(kind).take();
        if let Some(id) = previous.as_ref() {
            info!(%kind, %id, "default cleared");
        }
        previous
    }

    pub fn effective_text_default(&self) -> Option<&TextApiConfig> {
        self.default_text_api
            .as_ref()
            .and_then(|id| self.text_apis.get(id))
            .filter(|config| config.enabled && config.has_secret())
    }

    pub fn effective_image_default(&self) -> Option<&ImageApiConfig> {
        self.default_image_api
            .as_ref()
            .and_then(|id| self.image_apis.get(id))
            .filter(|config| config.enabled && config.has_secret())
    }

    /// The pointed-to config only if it exists, is enabled and carries a key.
    pub fn effective_default(&self, kind: ApiKind) -> Option<ApiConfig> {
        match kind {
            ApiKind::Text => self.effective_text_default().cloned().map(ApiConfig::Text),
            ApiKind::Image => self
                .effective_image_default()
                .cloned()
                .map(ApiConfig::Image),
        }
    }

    pub fn export_all(&self) -> ConfigSnapshot {
        ConfigSnapshot {
            schema_version: CURRENT_SCHEMA_VERSION,
            text_apis: self.text_apis().cloned().collect(),
            image_apis: self.image_apis().cloned().collect(),
            default_text_api: self.default_text_api.clone(),
            default_image_api: self.default_image_api.clone(),
        }
    }

    pub fn export_json(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.export_all())?)
    }

    /// Replaces the whole state. On error the current state is left as is.
    /// Imported entries are not validated.
    pub fn import_all(&mut self, snapshot: ConfigSnapshot) -> Result<(), StoreError> {
        let imported = Self::from_snapshot(snapshot)?;
        *self = imported;
        info!(
            text = self.text_apis.len(),
            image = self.image_apis.len(),
            "config snapshot imported"
        );
        Ok(())
    }

    pub fn import_json(&mut self, raw: &str) -> Result<(), StoreError> {
        let snapshot: ConfigSnapshot = serde_json::from_str(raw)?;
        self.import_all(snapshot)
    }

    pub fn from_snapshot(snapshot: ConfigSnapshot) -> Result<Self, StoreError> {
        if snapshot.schema_version > CURRENT_SCHEMA_VERSION {
            return Err(StoreError::UnsupportedVersion(snapshot.schema_version));
        }
        if snapshot.schema_version < CURRENT_SCHEMA_VERSION {
            warn!(
                from = snapshot.schema_version,
                to = CURRENT_SCHEMA_VERSION,
                "migrating config snapshot schema"
            );
        }

        let text_apis = index_by_id(ApiKind::Text, snapshot.text_apis, |c| &c.id)?;
        let image_apis = index_by_id(ApiKind::Image, snapshot.image_apis, |c| &c.id)?;
        let default_text_api = existing_default(ApiKind::Text, snapshot.default_text_api, |id| {
            text_apis.contains_key(id)
        });
        let default_image_api =
            existing_default(ApiKind::Image, snapshot.default_image_api, |id| {
                image_apis.contains_key(id)
            });

        Ok(Self {
            text_apis,
            image_apis,
            default_text_api,
            default_image_api,
        })
    }

    /// Reads the persisted snapshot; a missing entry yields an empty store.
    pub fn load(kv: &dyn KvStore) -> Result<Self, StoreError> {
        let Some(bytes) = kv.get(CONFIG_STORAGE_KEY)? else {
            debug!("no persisted config, starting empty");
            return Ok(Self::new());
        };
        let snapshot: ConfigSnapshot = serde_json::from_slice(&bytes)?;
        Self::from_snapshot(snapshot)
    }

    pub fn save(&self, kv: &dyn KvStore) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(&self.export_all())?;
        kv.set(CONFIG_STORAGE_KEY, &bytes)?;
        Ok(())
    }
}

fn index_by_id<T>(
    kind: ApiKind,
    items: Vec<T>,
    id_of: impl Fn(&T) -> &ApiId,
) -> Result<IndexMap<ApiId, T>, StoreError> {
    let mut map = IndexMap::with_capacity(items.len());
    for item in items {
        match map.entry(id_of(&item).clone()) {
            Entry::Occupied(entry) => {
                return Err(StoreError::DuplicateId {
                    kind,
                    id: entry.key().clone(),
                });
            }
            Entry::Vacant(entry) => {
                entry.insert(item);
            }
        }
    }
    Ok(map)
}

fn existing_default(
    kind: ApiKind,
    id: Option<ApiId>,
    exists: impl Fn(&ApiId) -> bool,
) -> Option<ApiId> {
    match id {
        Some(id) if !exists(&id) => {
            warn!(%kind, %id, "dropping default pointer to missing config");
            None
        }
        other => other,
    }
}
