use crate::service::RetryPolicy;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_RELATIVE_PATH: &str = ".work24/config.toml";
const CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboxConfig {
    pub version: u32,
    pub store_path: Option<PathBuf>,
    pub busy_timeout: Duration,
    pub retry: RetryPolicy,
    pub stale_after: Duration,
    pub labels: BTreeMap<String, String>,
    pub ndjson_log: Option<PathBuf>,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            store_path: None,
            busy_timeout: Duration::from_millis(5000),
            retry: RetryPolicy::default(),
            stale_after: Duration::from_secs(30),
            labels: BTreeMap::new(),
            ndjson_log: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct RawInboxConfig {
    version: Option<u32>,
    store: Option<RawStoreConfig>,
    retry: Option<RawRetryConfig>,
    cache: Option<RawCacheConfig>,
    labels: Option<BTreeMap<String, String>>,
    log: Option<RawLogConfig>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawStoreConfig {
    path: Option<String>,
    busy_timeout_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRetryConfig {
    max_attempts: Option<u32>,
    base_delay_ms: Option<u64>,
    max_delay_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawCacheConfig {
    stale_after_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawLogConfig {
    ndjson: Option<String>,
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_RELATIVE_PATH)
}

pub fn load_config(root: &Path) -> Result<Option<InboxConfig>> {
    let path = config_path(root);
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("read config {}", path.display()))?;
    let parsed: RawInboxConfig =
        toml::from_str(&raw).with_context(|| format!("parse {}", path.display()))?;
    Ok(Some(validate_config(parsed, root, &path)?))
}

pub fn load_config_or_default(root: &Path) -> Result<InboxConfig> {
    Ok(load_config(root)?.unwrap_or_default())
}

fn validate_config(raw: RawInboxConfig, root: &Path, path: &Path) -> Result<InboxConfig> {
    let version = raw
        .version
        .ok_or_else(|| anyhow::anyhow!("{} missing required `version`", path.display()))?;
    if version != CONFIG_VERSION {
        bail!(
            "{} has unsupported version {version}; expected version = {CONFIG_VERSION}",
            path.display()
        );
    }

    let defaults = InboxConfig::default();

    let (store_path, busy_timeout) = match raw.store {
        None => (None, defaults.busy_timeout),
        Some(store) => (
            sanitize_optional(store.path).map(|p| resolve_path(root, &p)),
            store
                .busy_timeout_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.busy_timeout),
        ),
    };

    let retry = match raw.retry {
        None => defaults.retry,
        Some(r) => validate_retry(r, defaults.retry, path)?,
    };

    let stale_after = raw
        .cache
        .and_then(|c| c.stale_after_secs)
        .map(Duration::from_secs)
        .unwrap_or(defaults.stale_after);

    let mut labels = BTreeMap::new();
    for (key, value) in raw.labels.unwrap_or_default() {
        let key = key.trim().to_string();
        if key.is_empty() {
            bail!("{} has an empty key in `[labels]`", path.display());
        }
        labels.insert(key, value);
    }

    let ndjson_log = raw
        .log
        .and_then(|l| sanitize_optional(l.ndjson))
        .map(|p| resolve_path(root, &p));

    Ok(InboxConfig {
        version,
        store_path,
        busy_timeout,
        retry,
        stale_after,
        labels,
        ndjson_log,
    })
}

fn validate_retry(raw: RawRetryConfig, defaults: RetryPolicy, path: &Path) -> Result<RetryPolicy> {
    let max_attempts = raw.max_attempts.unwrap_or(defaults.max_attempts);
    if max_attempts == 0 {
        bail!("{} has `[retry].max_attempts = 0`; expected at least 1", path.display());
    }
    let base_delay = raw
        .base_delay_ms
        .map(Duration::from_millis)
        .unwrap_or(defaults.base_delay);
    let max_delay = raw
        .max_delay_ms
        .map(Duration::from_millis)
        .unwrap_or(defaults.max_delay);
    if max_delay < base_delay {
        bail!(
            "{} has `[retry].max_delay_ms` below `base_delay_ms`",
            path.display()
        );
    }
    Ok(RetryPolicy {
        max_attempts,
        base_delay,
        max_delay,
    })
}

fn sanitize_optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn resolve_path(root: &Path, raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        path
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_config(root: &Path, body: &str) {
        let path = config_path(root);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, body).unwrap();
    }

    #[test]
    fn missing_file_is_none() {
        let tmp = tempdir().unwrap();
        assert!(load_config(tmp.path()).unwrap().is_none());
        assert_eq!(
            load_config_or_default(tmp.path()).unwrap(),
            InboxConfig::default()
        );
    }

    #[test]
    fn parses_full_config() {
        let tmp = tempdir().unwrap();
        write_config(
            tmp.path(),
            r#"
version = 1
[store]
path = "data/inbox.db"
busy_timeout_ms = 250
[retry]
max_attempts = 5
base_delay_ms = 200
max_delay_ms = 1000
[cache]
stale_after_secs = 5
[labels]
"adminSource.career" = "Job Application"
[log]
ndjson = "/var/log/work24.ndjson"
"#,
        );

        let cfg = load_config(tmp.path()).unwrap().unwrap();
        assert_eq!(cfg.store_path, Some(tmp.path().join("data/inbox.db")));
        assert_eq!(cfg.busy_timeout, Duration::from_millis(250));
        assert_eq!(cfg.retry.max_attempts, 5);
        assert_eq!(cfg.retry.base_delay, Duration::from_millis(200));
        assert_eq!(cfg.retry.max_delay, Duration::from_millis(1000));
        assert_eq!(cfg.stale_after, Duration::from_secs(5));
        assert_eq!(cfg.labels["adminSource.career"], "Job Application");
        assert_eq!(cfg.ndjson_log, Some(PathBuf::from("/var/log/work24.ndjson")));
    }

    #[test]
    fn partial_retry_keeps_defaults() {
        let tmp = tempdir().unwrap();
        write_config(tmp.path(), "version = 1\n[retry]\nmax_attempts = 1\n");
        let cfg = load_config(tmp.path()).unwrap().unwrap();
        assert_eq!(cfg.retry.max_attempts, 1);
        assert_eq!(cfg.retry.base_delay, RetryPolicy::default().base_delay);
        assert_eq!(cfg.busy_timeout, InboxConfig::default().busy_timeout);
    }

    #[test]
    fn rejects_invalid_version() {
        let tmp = tempdir().unwrap();
        write_config(tmp.path(), "version = 2");
        let err = load_config(tmp.path()).unwrap_err();
        assert!(format!("{err}").contains("unsupported version"));

        write_config(tmp.path(), "[store]\npath = \"x.db\"");
        let err = load_config(tmp.path()).unwrap_err();
        assert!(format!("{err}").contains("missing required `version`"));
    }

    #[test]
    fn rejects_bad_retry_settings() {
        let tmp = tempdir().unwrap();
        write_config(tmp.path(), "version = 1\n[retry]\nmax_attempts = 0\n");
        let err = load_config(tmp.path()).unwrap_err();
        assert!(format!("{err}").contains("max_attempts = 0"));

        write_config(
            tmp.path(),
            "version = 1\n[retry]\nbase_delay_ms = 500\nmax_delay_ms = 100\n",
        );
        let err = load_config(tmp.path()).unwrap_err();
        assert!(format!("{err}").contains("below `base_delay_ms`"));
    }

    #[test]
    fn rejects_empty_label_key() {
        let tmp = tempdir().unwrap();
        write_config(tmp.path(), "version = 1\n[labels]\n\" \" = \"x\"\n");
        let err = load_config(tmp.path()).unwrap_err();
        assert!(format!("{err}").contains("empty key"));
    }
}
