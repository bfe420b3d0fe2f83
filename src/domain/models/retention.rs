//! Tiered retention: one survivor per coarsening time window.
//!
//! Every record is placed in a tier by its age relative to `now` and, within
//! the tier, in a window (hour, day, ISO week, ISO fortnight or month). The
//! newest record of each window survives; all others are deleted. Windows are
//! recomputed on every run, so survivors shift as records age across tier
//! boundaries.

use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;

/// Age band a record falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Hourly,
    Daily,
    Weekly,
    Biweekly,
    Monthly,
}

impl Tier {
    /// Tier for a record of the given age; negative ages count as fresh
    pub fn for_age(age: Duration) -> Self {
        if age < Duration::days(7) {
            Tier::Hourly
        } else if age < Duration::days(30) {
            Tier::Daily
        } else if age < Duration::days(90) {
            Tier::Weekly
        } else if age < Duration::days(365) {
            Tier::Biweekly
        } else {
            Tier::Monthly
        }
    }

    /// Window identifier of `timestamp` within this tier
    pub fn bucket_id(self, timestamp: DateTime<Utc>) -> String {
        match self {
            Tier::Hourly => timestamp.format("%Y-%m-%dT%H").to_string(),
            Tier::Daily => timestamp.format("%Y-%m-%d").to_string(),
            Tier::Weekly => {
                let week = timestamp.iso_week();
                format!("{}-W{:02}", week.year(), week.week())
            }
            Tier::Biweekly => {
                let week = timestamp.iso_week();
                format!("{}-B{:02}", week.year(), week.week().div_ceil(2))
            }
            Tier::Monthly => timestamp.format("%Y-%m").to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Hourly => "hourly",
            Tier::Daily => "daily",
            Tier::Weekly => "weekly",
            Tier::Biweekly => "biweekly",
            Tier::Monthly => "monthly",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The (tier, window) group a record belongs to
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct TierBucketKey {
    pub tier: Tier,
    pub bucket_id: String,
}

impl TierBucketKey {
    pub fn assign(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        let tier = Tier::for_age(now - timestamp);
        Self {
            tier,
            bucket_id: tier.bucket_id(timestamp),
        }
    }
}

impl std::fmt::Display for TierBucketKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.tier, self.bucket_id)
    }
}

/// Input to the selector: an object key or folder prefix with its timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetentionRecord {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub size: u64,
}

impl RetentionRecord {
    pub fn new(id: impl Into<String>, timestamp: DateTime<Utc>, size: u64) -> Self {
        Self {
            id: id.into(),
            timestamp,
            size,
        }
    }
}

/// A kept record and the group it represents
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Survivor {
    #[serde(flatten)]
    pub record: RetentionRecord,
    pub bucket: TierBucketKey,
}

/// Per-tier counters of one selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TierStats {
    pub buckets: usize,
    pub kept: usize,
    pub deleted: usize,
    pub bytes_deleted: u64,
}

/// Outcome of one selection pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RetentionDecision {
    /// Survivors, oldest first
    pub keep: Vec<Survivor>,
    /// Everything else, oldest first
    pub delete: Vec<RetentionRecord>,
    pub tiers: BTreeMap<Tier, TierStats>,
}

impl RetentionDecision {
    pub fn keep_ids(&self) -> HashSet<&str> {
        self.keep.iter().map(|s| s.record.id.as_str()).collect()
    }

    pub fn delete_ids(&self) -> Vec<String> {
        self.delete.iter().map(|r| r.id.clone()).collect()
    }

    pub fn bytes_to_delete(&self) -> u64 {
        self.delete.iter().map(|r| r.size).sum()
    }
}

/// Partition `records` into survivors and deletions relative to `now`.
///
/// Each (tier, window) group keeps its newest record; on equal timestamps the
/// record that came later in the input wins.
pub fn select<I>(records: I, now: DateTime<Utc>) -> RetentionDecision
where
    I: IntoIterator<Item = RetentionRecord>,
{
    let mut records: Vec<RetentionRecord> = records.into_iter().collect();
    // Stable, so equal timestamps keep input order and the later one is seen last.
    records.sort_by_key(|r| r.timestamp);

    let keys: Vec<TierBucketKey> = records
        .iter()
        .map(|r| TierBucketKey::assign(r.timestamp, now))
        .collect();

    let mut survivors: HashMap<&TierBucketKey, usize> = HashMap::with_capacity(keys.len());
    for (idx, key) in keys.iter().enumerate() {
        survivors.insert(key, idx);
    }
    let kept: HashSet<usize> = survivors.values().copied().collect();

    let mut decision = RetentionDecision::default();
    for key in survivors.keys() {
        decision.tiers.entry(key.tier).or_default().buckets += 1;
    }

    for (idx, (record, key)) in records.into_iter().zip(keys).enumerate() {
        let stats = decision.tiers.entry(key.tier).or_default();
        if kept.contains(&idx) {
            stats.kept += 1;
            decision.keep.push(Survivor {
                record,
                bucket: key,
            });
        } else {
            stats.deleted += 1;
            stats.bytes_deleted += record.size;
            decision.delete.push(record);
        }
    }

    decision
}

/// Where a record's timestamp comes from in object mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimestampSource {
    /// The backend's last-modified time
    #[default]
    LastModified,
    /// A date/time embedded in the key
    KeyName,
    /// The key name when it parses, last-modified otherwise
    KeyNameOrLastModified,
}

/// What a retention pass operates on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RetentionTarget {
    /// Every object below the prefix
    Objects { timestamp_source: TimestampSource },
    /// Immediate subfolders whose names carry a timestamp
    Folders,
    /// Folders when any immediate subfolder is timestamped, otherwise objects
    #[default]
    Auto,
}
