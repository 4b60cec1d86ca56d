// Configuration loading and management.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;

use crate::error::CacheError;
use crate::time::{Clock, SystemClock};

pub const PROD: &str = "prod";
pub const DEV: &str = "dev";
#[allow(dead_code)]
pub const TEST: &str = "test";

/// Sweeper tick used when none is configured.
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60 * 60);
pub const DEFAULT_NAME: &str = "cache";

/// Construction options shared by every container.
#[derive(Clone)]
pub struct Options {
    pub name: String,
    pub ttl: Duration,
    pub check_interval: Duration,
    pub clock: Arc<dyn Clock>,
    pub runtime: Option<Handle>,
}

impl Options {
    /// Options with the given TTL, a one hour sweep and the system clock.
    pub fn new(ttl: Duration) -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            ttl,
            check_interval: DEFAULT_CHECK_INTERVAL,
            clock: Arc::new(SystemClock),
            runtime: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn check_interval(mut self, every: Duration) -> Self {
        self.check_interval = every;
        self
    }

    pub fn clock<C: Clock>(mut self, clock: C) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    /// Runtime for the sweeper and detached rebuilds. Defaults to the
    /// runtime the container is constructed in.
    pub fn runtime(mut self, handle: Handle) -> Self {
        self.runtime = Some(handle);
        self
    }

    /// TTL in whole seconds; sub-second remainders are dropped.
    pub fn ttl_secs(&self) -> i64 {
        self.ttl.as_secs() as i64
    }

    /// Checks the options and resolves the runtime handle.
    pub(crate) fn validate(&self) -> Result<Handle, CacheError> {
        if self.check_interval.is_zero() {
            return Err(CacheError::InvalidCheckInterval(self.check_interval));
        }
        match &self.runtime {
            Some(handle) => Ok(handle.clone()),
            None => Handle::try_current().map_err(|_| CacheError::NoRuntime),
        }
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("name", &self.name)
            .field("ttl", &self.ttl)
            .field("check_interval", &self.check_interval)
            .field("runtime", &self.runtime.is_some())
            .finish()
    }
}

/// File-level configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_env")]
    pub env: String,
    pub logs: Option<Logs>,
    #[serde(default)]
    pub caches: BTreeMap<String, CacheConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logs {
    pub level: Option<String>,
}

/// One cache as described in a config file.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(with = "humantime_serde")]
    pub ttl: Duration,
    #[serde(default, with = "humantime_serde")]
    pub check_interval: Option<Duration>,
}

fn default_env() -> String {
    DEV.to_string()
}

impl CacheConfig {
    /// Converts to programmatic options under the given cache name.
    pub fn options(&self, name: &str) -> Options {
        Options::new(self.ttl)
            .name(name)
            .check_interval(self.check_interval.unwrap_or(DEFAULT_CHECK_INTERVAL))
    }

    fn validate(&self, name: &str) -> Result<(), CacheError> {
        if self.ttl.as_secs() == 0 {
            return Err(CacheError::Config(format!(
                "caches.{name}.ttl must be at least 1s, got {:?}",
                self.ttl
            )));
        }
        if let Some(every) = self.check_interval {
            if every.is_zero() {
                return Err(CacheError::InvalidCheckInterval(every));
            }
        }
        Ok(())
    }
}

impl Config {
    /// Loads configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let abs_path = path
            .canonicalize()
            .with_context(|| format!("failed to resolve absolute config filepath: {:?}", path))?;

        let data = std::fs::read_to_string(&abs_path)
            .with_context(|| format!("read config yaml file {:?}", abs_path))?;

        Self::from_yaml_str(&data).with_context(|| format!("load config from {:?}", abs_path))
    }

    /// Parses and validates configuration from a YAML document.
    pub fn from_yaml_str(data: &str) -> Result<Self> {
        let cfg: Config = serde_yaml::from_str(data).context("unmarshal yaml")?;
        for (name, cache) in &cfg.caches {
            cache.validate(name)?;
        }
        Ok(cfg)
    }

    pub fn is_prod(&self) -> bool {
        self.env == PROD
    }

    pub fn log_level(&self) -> &str {
        self.logs
            .as_ref()
            .and_then(|logs| logs.level.as_deref())
            .unwrap_or("info")
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            env: default_env(),
            logs: None,
            caches: BTreeMap::new(),
        }
    }
}

mod test_config;
#[allow(dead_code)]
pub use test_config::new_test_config;
