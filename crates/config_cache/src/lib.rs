//! Memoized request payload built from the effective default configs.
//!
//! The payload is keyed by a SHA-256 fingerprint of `{provider, key tail, model}`
//! per kind, so renames and other cosmetic edits keep the cached value while a
//! vendor swap or key rotation forces a rebuild. The cache has no subscription
//! to the store: callers clear it after every store mutation.

use std::sync::Arc;

use config::ConfigStore;
use core_types::{NormalizedPayload, TextApiConfig};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::{Value, json};
use sha2::{Digest, Sha256};
use tracing::debug;

const NO_DEFAULT: &str = "<none>";
const KEY_TAIL_CHARS: usize = 4;

#[derive(Serialize)]
struct FingerprintPart<'a> {
    provider: &'a str,
    key_tail: String,
    model: Option<&'a str>,
}

fn key_tail(api_key: &str) -> String {
    let tail: Vec<char> = api_key.chars().rev().take(KEY_TAIL_CHARS).collect();
    tail.into_iter().rev().collect()
}

fn part_or_sentinel(part: Option<FingerprintPart<'_>>) -> Value {
    part.map_or_else(|| Value::String(NO_DEFAULT.to_owned()), |part| json!(part))
}

fn text_part(config: &TextApiConfig) -> FingerprintPart<'_> {
    FingerprintPart {
        provider: config.provider.as_str(),
        key_tail: key_tail(&config.api_key),
        model: Some(config.model.as_str()),
    }
}

pub fn fingerprint(store: &ConfigStore) -> String {
    let text = store.effective_text_default().map(text_part);
    let image = store
        .effective_image_default()
        .map(|config| FingerprintPart {
            provider: config.provider.as_str(),
            key_tail: key_tail(&config.api_key),
            model: config.model.as_deref(),
        });

    let doc = json!({
        "text": part_or_sentinel(text),
        "image": part_or_sentinel(image),
    });
    format!("{:x}", Sha256::digest(doc.to_string().as_bytes()))
}

pub fn build_payload(store: &ConfigStore) -> NormalizedPayload {
    NormalizedPayload {
        text_api: store.effective_text_default().map(Into::into),
        image_api: store.effective_image_default().map(Into::into),
    }
}

#[derive(Debug)]
struct CacheEntry {
    fingerprint: String,
    payload: Arc<NormalizedPayload>,
}

/// One slot holding fingerprint and payload together, so neither is ever
/// observed without the other.
#[derive(Debug, Default)]
pub struct DerivedConfigCache {
    slot: Mutex<Option<CacheEntry>>,
}

impl DerivedConfigCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, store: &ConfigStore) -> Arc<NormalizedPayload> {
        let fingerprint = fingerprint(store);
        let mut slot = self.slot.lock();
        if let Some(entry) = slot.as_ref() {
            if entry.fingerprint == fingerprint {
                debug!(%fingerprint, "derived config cache hit");
                return Arc::clone(&entry.payload);
            }
        }

        let payload = Arc::new(build_payload(store));
        debug!(
            %fingerprint,
            text = payload.text_api.is_some(),
            image = payload.image_api.is_some(),
            "derived config rebuilt"
        );
        *slot = Some(CacheEntry {
            fingerprint,
            payload: Arc::clone(&payload),
        });
        payload
    }

    pub fn clear(&self) {
        if self.slot.lock().take().is_some() {
            debug!("derived config cache cleared");
        }
    }

    pub fn warm(&self, store: &ConfigStore) {
        self.get(store);
    }

    pub fn is_warm(&self) -> bool {
        self.slot.lock().is_some()
    }
}
