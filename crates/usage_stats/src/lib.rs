use std::sync::Arc;

use chrono::{DateTime, Utc};
use core_types::{ApiKind, UsageStat};
use i18n::I18n;
use kv_store::KvStore;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::{debug, warn};

pub const STATS_STORAGE_KEY: &str = "api-usage-stats";

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("failed to encode usage stats: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

/// Per `(provider, kind)` request counters kept in the key-value store.
///
/// Reads never fail: absent or unreadable data is treated as an empty
/// collection. Writes happen after every `record` and their errors are
/// returned.
pub struct UsageTracker {
    kv: Arc<dyn KvStore>,
    lock: Mutex<()>,
}

impl UsageTracker {
    pub fn new(kv: Arc<dyn KvStore>) -> Self {
        Self {
            kv,
            lock: Mutex::new(()),
        }
    }

    pub fn record(
        &self,
        provider: &str,
        kind: ApiKind,
        success: bool,
        response_time_ms: Option<f64>,
    ) -> Result<UsageStat, StatsError> {
        self.record_at(provider, kind, success, response_time_ms, Utc::now())
    }

    pub fn record_at(
        &self,
        provider: &str,
        kind: ApiKind,
        success: bool,
        response_time_ms: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<UsageStat, StatsError> {
        let response_time_ms = usable_sample(response_time_ms);
        let _guard = self.lock.lock();
        let mut stats = self.load();

        let updated = match stats.iter_mut().find(|s| s.matches(provider, kind)) {
            Some(stat) => {
                apply_event(stat, success, response_time_ms, now);
                stat.clone()
            }
            None => {
                let stat = first_event(provider, kind, success, response_time_ms, now);
                stats.push(stat.clone());
                stat
            }
        };

        let bytes = serde_json::to_vec(&stats)?;
        self.kv.set(STATS_STORAGE_KEY, &bytes)?;
        debug!(
            provider,
            %kind,
            success,
            total = updated.total_requests,
            "usage recorded"
        );
        Ok(updated)
    }

    pub fn all(&self) -> Vec<UsageStat> {
        let _guard = self.lock.lock();
        self.load()
    }

    pub fn get_for(&self, provider: &str, kind: ApiKind) -> Option<UsageStat> {
        self.all().into_iter().find(|s| s.matches(provider, kind))
    }

    pub fn clear_all(&self) -> Result<(), StatsError> {
        let _guard = self.lock.lock();
        self.kv.remove(STATS_STORAGE_KEY)?;
        debug!("usage stats cleared");
        Ok(())
    }

    fn load(&self) -> Vec<UsageStat> {
        let bytes = match self.kv.get(STATS_STORAGE_KEY) {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "failed to read usage stats, using empty set");
                return Vec::new();
            }
        };
        serde_json::from_slice(&bytes).unwrap_or_else(|err| {
            warn!(error = %err, "stored usage stats are malformed, using empty set");
            Vec::new()
        })
    }
}

/// Non-finite samples would serialize as `null` and make the stored
/// collection unreadable, so they are treated as absent.
fn usable_sample(response_time_ms: Option<f64>) -> Option<f64> {
    match response_time_ms {
        Some(t) if !t.is_finite() || t < 0.0 => {
            warn!(response_time_ms = t, "ignoring unusable response time");
            None
        }
        other => other,
    }
}

fn first_event(
    provider: &str,
    kind: ApiKind,
    success: bool,
    response_time_ms: Option<f64>,
    now: DateTime<Utc>,
) -> UsageStat {
    UsageStat {
        provider: provider.to_owned(),
        kind,
        success_count: u64::from(success),
        error_count: u64::from(!success),
        total_requests: 1,
        average_response_time: response_time_ms.unwrap_or(0.0),
        last_used: Some(now),
    }
}

fn apply_event(
    stat: &mut UsageStat,
    success: bool,
    response_time_ms: Option<f64>,
    now: DateTime<Utc>,
) {
    stat.total_requests += 1;
    if success {
        stat.success_count += 1;
    } else {
        stat.error_count += 1;
    }
    stat.last_used = Some(now);

    if let Some(t) = response_time_ms {
        let n = stat.total_requests as f64;
        stat.average_response_time = (stat.average_response_time * (n - 1.0) + t) / n;
    }
}

/// Percentage of successful requests, 0 for an unused pair.
pub fn success_rate(stat: &UsageStat) -> f64 {
    if stat.total_requests == 0 {
        return 0.0;
    }
    stat.success_count as f64 / stat.total_requests as f64 * 100.0
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recency {
    Never,
    JustNow,
    HoursAgo(i64),
    DaysAgo(i64),
    LongAgo,
}

pub fn recency(stat: &UsageStat, now: DateTime<Utc>) -> Recency {
    let Some(last_used) = stat.last_used else {
        return Recency::Never;
    };

    let hours = (now - last_used).num_milliseconds() as f64 / 3_600_000.0;
    let days = hours / 24.0;
    if hours < 1.0 {
        Recency::JustNow
    } else if hours < 24.0 {
        Recency::HoursAgo(hours.round() as i64)
    } else if days < 7.0 {
        Recency::DaysAgo(days.round() as i64)
    } else {
        Recency::LongAgo
    }
}

pub fn recency_label(recency: &Recency, i18n: &I18n) -> String {
    match recency {
        Recency::Never => i18n.t("stats.recency.never").to_owned(),
        Recency::JustNow => i18n.t("stats.recency.just_now").to_owned(),
        Recency::HoursAgo(n) => {
            let n = n.to_string();
            i18n.t_with("stats.recency.hours", &[("n", n.as_str())])
        }
        Recency::DaysAgo(n) => {
            let n = n.to_string();
            i18n.t_with("stats.recency.days", &[("n", n.as_str())])
        }
        Recency::LongAgo => i18n.t("stats.recency.long_ago").to_owned(),
    }
}

pub fn format_response_time(ms: f64) -> String {
    if ms < 1000.0 {
        format!("{:.0}ms", ms.round())
    } else {
        format!("{:.1}s", ms / 1000.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthLevel {
    Healthy,
    Degraded,
    Failing,
}

impl HealthLevel {
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Healthy => "stats.health.healthy",
            Self::Degraded => "stats.health.degraded",
            Self::Failing => "stats.health.failing",
        }
    }
}

pub fn health_level(success_rate: f64) -> HealthLevel {
    if success_rate >= 90.0 {
        HealthLevel::Healthy
    } else if success_rate >= 70.0 {
        HealthLevel::Degraded
    } else {
        HealthLevel::Failing
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};
    use core_types::UiLanguage;
    use kv_store::MemoryKvStore;

    use super::*;

    fn tracker() -> (Arc<MemoryKvStore>, UsageTracker) {
        let kv = Arc::new(MemoryKvStore::new());
        let tracker = UsageTracker::new(kv.clone());
        (kv, tracker)
    }

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[test]
    fn first_record_creates_the_entry() {
        let (_, tracker) = tracker();
        let stat = tracker
            .record_at("openai", ApiKind::Text, false, None, at(8))
            .expect("record");
        assert_eq!(stat.success_count, 0);
        assert_eq!(stat.error_count, 1);
        assert_eq!(stat.total_requests, 1);
        assert_eq!(stat.average_response_time, 0.0);
        assert_eq!(stat.last_used, Some(at(8)));
    }

    #[test]
    fn average_is_the_running_mean() {
        let (_, tracker) = tracker();
        tracker
            .record_at("openai", ApiKind::Text, true, Some(100.0), at(8))
            .expect("record");
        let stat = tracker
            .record_at("openai", ApiKind::Text, true, Some(300.0), at(9))
            .expect("record");
        assert_eq!(stat.total_requests, 2);
        assert_eq!(stat.average_response_time, 200.0);
        assert_eq!(stat.last_used, Some(at(9)));

        let stat = tracker
            .record_at("openai", ApiKind::Text, false, None, at(10))
            .expect("record");
        assert_eq!(stat.total_requests, 3);
        assert_eq!(stat.error_count, 1);
        assert_eq!(stat.average_response_time, 200.0);
        assert_eq!(stat.total_requests, stat.success_count + stat.error_count);
    }

    #[test]
    fn pairs_are_keyed_by_provider_and_kind() {
        let (_, tracker) = tracker();
        tracker
            .record("google", ApiKind::Text, true, Some(50.0))
            .expect("record");
        tracker
            .record("google", ApiKind::Image, true, Some(900.0))
            .expect("record");

        assert_eq!(tracker.all().len(), 2);
        let image = tracker.get_for("google", ApiKind::Image).expect("image stat");
        assert_eq!(image.average_response_time, 900.0);
        assert!(tracker.get_for("openai", ApiKind::Text).is_none());
    }

    #[test]
    fn persists_in_camel_case_and_clears() {
        let (kv, tracker) = tracker();
        tracker
            .record_at("jimeng", ApiKind::Image, true, Some(1500.0), at(8))
            .expect("record");

        let raw = kv.get(STATS_STORAGE_KEY).expect("read").expect("written");
        let json: serde_json::Value = serde_json::from_slice(&raw).expect("json");
        assert_eq!(json[0]["type"], "image");
        assert_eq!(json[0]["successCount"], 1);
        assert_eq!(json[0]["averageResponseTime"], 1500.0);

        let reopened = UsageTracker::new(kv.clone());
        assert_eq!(reopened.all(), tracker.all());

        tracker.clear_all().expect("clear");
        assert!(tracker.all().is_empty());
        assert_eq!(kv.get(STATS_STORAGE_KEY).expect("read"), None);
    }

    #[test]
    fn unusable_response_times_keep_the_collection_readable() {
        let (kv, tracker) = tracker();
        tracker
            .record("google", ApiKind::Image, true, Some(100.0))
            .expect("record");
        let stat = tracker
            .record("openai", ApiKind::Text, true, Some(f64::INFINITY))
            .expect("record");
        assert_eq!(stat.average_response_time, 0.0);
        let stat = tracker
            .record("openai", ApiKind::Text, false, Some(f64::NAN))
            .expect("record");
        assert_eq!(stat.total_requests, 2);
        assert_eq!(stat.average_response_time, 0.0);
        tracker
            .record("google", ApiKind::Image, true, Some(-5.0))
            .expect("record");

        let raw = kv.get(STATS_STORAGE_KEY).expect("read").expect("written");
        assert!(!String::from_utf8_lossy(&raw).contains("null"));
        assert_eq!(tracker.all().len(), 2);
        let google = tracker.get_for("google", ApiKind::Image).expect("google kept");
        assert_eq!(google.total_requests, 2);
        assert_eq!(google.average_response_time, 100.0);
    }

    #[test]
    fn malformed_data_reads_as_empty() {
        let (kv, tracker) = tracker();
        kv.set(STATS_STORAGE_KEY, b"[{\"provider\": 1}]").expect("write");
        assert!(tracker.all().is_empty());
        assert!(tracker.get_for("openai", ApiKind::Text).is_none());

        let stat = tracker
            .record("openai", ApiKind::Text, true, None)
            .expect("record over garbage");
        assert_eq!(stat.total_requests, 1);
        assert_eq!(tracker.all().len(), 1);
    }

    #[test]
    fn success_rate_and_health() {
        let mut stat = first_event("openai", ApiKind::Text, true, None, at(0));
        stat.total_requests = 0;
        stat.success_count = 0;
        assert_eq!(success_rate(&stat), 0.0);

        stat.total_requests = 10;
        stat.success_count = 9;
        stat.error_count = 1;
        assert_eq!(success_rate(&stat), 90.0);
        assert_eq!(health_level(success_rate(&stat)), HealthLevel::Healthy);
        assert_eq!(health_level(75.0), HealthLevel::Degraded);
        assert_eq!(health_level(69.9), HealthLevel::Failing);
    }

    #[test]
    fn recency_buckets() {
        let mut stat = first_event("openai", ApiKind::Text, true, None, at(0));
        let now = at(0);
        assert_eq!(recency(&stat, now + Duration::minutes(59)), Recency::JustNow);
        assert_eq!(
            recency(&stat, now + Duration::minutes(150)),
            Recency::HoursAgo(3)
        );
        assert_eq!(recency(&stat, now + Duration::hours(36)), Recency::DaysAgo(2));
        assert_eq!(recency(&stat, now + Duration::days(7)), Recency::LongAgo);

        stat.last_used = None;
        assert_eq!(recency(&stat, now), Recency::Never);
    }

    #[test]
    fn labels_and_formatting() {
        let en = I18n::new(UiLanguage::EnUs);
        assert_eq!(recency_label(&Recency::HoursAgo(3), &en), "3 hours ago");
        assert_eq!(recency_label(&Recency::Never, &en), "never used");
        let zh = I18n::new(UiLanguage::ZhCn);
        assert_eq!(recency_label(&Recency::DaysAgo(2), &zh), "2天前");

        assert_eq!(format_response_time(999.4), "999ms");
        assert_eq!(format_response_time(120.0), "120ms");
        assert_eq!(format_response_time(1500.0), "1.5s");
        assert_eq!(HealthLevel::Degraded.label_key(), "stats.health.degraded");
    }
}
