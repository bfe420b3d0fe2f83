//! Configuration read from the process environment.
//!
//! Every parser takes a lookup function so tests never touch the real
//! environment. Blank values count as unset.

use crate::{
    app::AppError,
    domain::models::{BucketAllowList, ClientConfig, DEFAULT_REGION},
    ports::storage::MAX_DELETE_KEYS,
    services::DEFAULT_PREFIX_BATCH_SIZE,
};

const ENDPOINT_LISTS: &[&str] = &["S3_ENDPOINT_URLS", "S3_ENDPOINTS", "S3_URLS", "urls"];
const ACCESS_KEY_LISTS: &[&str] = &["S3_ACCESS_KEY_IDS", "S3_ACCESS_KEYS", "s3keys"];
const SECRET_KEY_LISTS: &[&str] = &["S3_SECRET_ACCESS_KEYS", "S3_SECRET_KEYS", "s3accessekys"];
const REGION_LISTS: &[&str] = &["S3_REGIONS"];

const ENDPOINTS: &[&str] = &["S3_ENDPOINT_URL", "S3_ENDPOINT", "S3_URL", "url"];
const ACCESS_KEYS: &[&str] = &["S3_ACCESS_KEY_ID", "S3_ACCESS_KEY", "s3key"];
const SECRET_KEYS: &[&str] = &[
    "S3_SECRET_ACCESS_KEY",
    "S3_SECRET_KEY",
    "s3accesseky",
    "S3_ACCESS_SECRET",
];
const REGIONS: &[&str] = &["S3_REGION", "AWS_REGION", "AWS_DEFAULT_REGION"];

pub const BUCKETS_VAR: &str = "S3_BUCKETS";
pub const DELETE_BATCH_SIZE_VAR: &str = "DELETE_BATCH_SIZE";
pub const PREFIX_BATCH_SIZE_VAR: &str = "PREFIX_BATCH_SIZE";

/// Everything the retention service needs from the environment
#[derive(Debug, Clone)]
pub struct EnvConfig {
    pub clients: Vec<ClientConfig>,
    pub allow_list: BucketAllowList,
    pub delete_batch_size: usize,
    pub prefix_batch_size: usize,
}

impl EnvConfig {
    /// Read from the process environment
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let delete_batch_size = batch_size(&lookup, DELETE_BATCH_SIZE_VAR, MAX_DELETE_KEYS)?;
        if delete_batch_size > MAX_DELETE_KEYS {
            return Err(AppError::Configuration {
                message: format!(
                    "{} must be at most {}, got {}",
                    DELETE_BATCH_SIZE_VAR, MAX_DELETE_KEYS, delete_batch_size
                ),
            });
        }

        Ok(Self {
            clients: client_configs(&lookup),
            allow_list: allow_list(&lookup),
            delete_batch_size,
            prefix_batch_size: batch_size(&lookup, PREFIX_BATCH_SIZE_VAR, DEFAULT_PREFIX_BATCH_SIZE)?,
        })
    }
}

fn single<F>(lookup: &F, names: &[&str]) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    names.iter().find_map(|name| {
        let value = lookup(name)?;
        let value = value.trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

fn list<F>(lookup: &F, names: &[&str]) -> Option<Vec<String>>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = single(lookup, names)?;
    let items: Vec<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    (!items.is_empty()).then_some(items)
}

fn batch_size<F>(lookup: &F, name: &str, default: usize) -> Result<usize, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    match single(lookup, &[name]) {
        None => Ok(default),
        Some(raw) => match raw.parse::<usize>() {
            Ok(0) | Err(_) => Err(AppError::Configuration {
                message: format!("{} must be a positive integer, got '{}'", name, raw),
            }),
            Ok(n) => Ok(n),
        },
    }
}

/// The allow-list from `S3_BUCKETS`; unset means no bucket is allowed
pub fn allow_list<F>(lookup: &F) -> BucketAllowList
where
    F: Fn(&str) -> Option<String>,
{
    lookup(BUCKETS_VAR)
        .map(|raw| BucketAllowList::from_csv(&raw))
        .unwrap_or_default()
}

/// Candidate client configurations, in probe order.
///
/// Comma-separated lists are zipped by index, stopping at the shortest list
/// among those present. When only one list is set, a single candidate is built
/// from its first value. Without any list the singular variables describe one
/// candidate, which falls back to ambient credentials.
pub fn client_configs<F>(lookup: &F) -> Vec<ClientConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let default_region = single(lookup, REGIONS).unwrap_or_else(|| DEFAULT_REGION.to_string());

    let endpoints = list(lookup, ENDPOINT_LISTS);
    let access_keys = list(lookup, ACCESS_KEY_LISTS);
    let secret_keys = list(lookup, SECRET_KEY_LISTS);

    if endpoints.is_none() && access_keys.is_none() && secret_keys.is_none() {
        return vec![ClientConfig {
            endpoint: single(lookup, ENDPOINTS),
            access_key: single(lookup, ACCESS_KEYS),
            secret_key: single(lookup, SECRET_KEYS),
            region: default_region,
        }];
    }

    let regions = list(lookup, REGION_LISTS).unwrap_or_default();
    let present: Vec<usize> = [&endpoints, &access_keys, &secret_keys]
        .into_iter()
        .flatten()
        .map(Vec::len)
        .collect();
    let count = if present.len() > 1 {
        present.into_iter().min().unwrap_or(0)
    } else {
        1
    };

    let nth = |values: &Option<Vec<String>>, idx: usize| {
        values.as_ref().and_then(|v| v.get(idx)).cloned()
    };

    (0..count)
        .map(|idx| ClientConfig {
            endpoint: nth(&endpoints, idx),
            access_key: nth(&access_keys, idx),
            secret_key: nth(&secret_keys, idx),
            region: regions
                .get(idx)
                .cloned()
                .unwrap_or_else(|| default_region.clone()),
        })
        .collect()
}
