// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

use crate::error::MonitorError;
use crate::ids::generate_short_id;
use crate::shipper::constants::{
    DEFAULT_BATCH_SIZE, DEFAULT_DELIVERY_TIMEOUT, DEFAULT_FLUSH_INTERVAL,
    DEFAULT_ZSTD_COMPRESSION_LEVEL, MAX_BATCH_SIZE,
};
use reqwest::Url;
use std::env;
use std::time::Duration;

/// Codec applied to a whole batch payload when compression is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Compression {
    #[default]
    Gzip,
    /// zstd with the given compression level.
    Zstd(i32),
}

impl Compression {
    /// Value sent in the `Content-Encoding` header.
    #[must_use]
    pub fn content_encoding(self) -> &'static str {
        match self {
            Compression::Gzip => "gzip",
            Compression::Zstd(_) => "zstd",
        }
    }
}

/// Monitor configuration. Immutable once handed to [`crate::Monitor::init`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Name of the service emitting events. Required.
    pub service: String,
    /// Deployment environment (prod, staging, dev).
    pub env: Option<String>,
    /// Process-level job id. Generated when absent.
    pub job_id: Option<String>,
    /// URL receiving NDJSON batches. When absent events only go to stdout.
    pub ingest_url: Option<String>,
    /// Bearer credential for the ingest endpoint.
    pub api_key: Option<String>,
    /// Events per batch; also sizes the intake queue at twice this value.
    pub batch_size: usize,
    pub flush_interval: Duration,
    /// Upper bound on a single delivery attempt.
    pub delivery_timeout: Duration,
    pub compression_enabled: bool,
    pub compression: Compression,
    /// Skip printing events to stdout.
    pub disable_stdout: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            service: String::new(),
            env: None,
            job_id: None,
            ingest_url: None,
            api_key: None,
            batch_size: DEFAULT_BATCH_SIZE,
            flush_interval: DEFAULT_FLUSH_INTERVAL,
            delivery_timeout: DEFAULT_DELIVERY_TIMEOUT,
            compression_enabled: false,
            compression: Compression::Gzip,
            disable_stdout: false,
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|val| val.trim().to_string())
        .filter(|val| !val.is_empty())
}

fn env_flag(key: &str) -> bool {
    env::var(key)
        .map(|val| matches!(val.trim().to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

impl Config {
    /// Create configuration from environment variables
    pub fn from_env() -> Result<Self, MonitorError> {
        let defaults = Self::default();

        let batch_size = env::var("MONITOR_BATCH_SIZE")
            .ok()
            .and_then(|val| val.trim().parse::<usize>().ok())
            .filter(|size| (1..=MAX_BATCH_SIZE).contains(size))
            .unwrap_or(defaults.batch_size);
        let flush_interval = env::var("MONITOR_FLUSH_INTERVAL_MS")
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
            .filter(|ms| *ms > 0)
            .map_or(defaults.flush_interval, Duration::from_millis);
        let delivery_timeout = env::var("MONITOR_TIMEOUT_SECS")
            .ok()
            .and_then(|val| val.trim().parse::<u64>().ok())
            .filter(|secs| *secs > 0)
            .map_or(defaults.delivery_timeout, Duration::from_secs);

        let compression_level = env::var("MONITOR_COMPRESSION_LEVEL")
            .ok()
            .and_then(|val| val.trim().parse::<i32>().ok())
            .unwrap_or(DEFAULT_ZSTD_COMPRESSION_LEVEL);
        let compression = match env_non_empty("MONITOR_COMPRESSION")
            .map(|val| val.to_lowercase())
            .as_deref()
        {
            None | Some("gzip") => Compression::Gzip,
            Some("zstd") => Compression::Zstd(compression_level),
            Some(other) => {
                return Err(MonitorError::InvalidConfig(format!(
                    "Unknown compression '{other}'. Must be one of: gzip, zstd"
                )))
            }
        };

        let config = Self {
            service: env::var("MONITOR_SERVICE").unwrap_or_default(),
            env: env_non_empty("MONITOR_ENV"),
            job_id: env_non_empty("MONITOR_JOB_ID"),
            ingest_url: env_non_empty("MONITOR_INGEST_URL"),
            api_key: env_non_empty("MONITOR_API_KEY"),
            batch_size,
            flush_interval,
            delivery_timeout,
            compression_enabled: env_flag("MONITOR_GZIP"),
            compression,
            disable_stdout: env_flag("MONITOR_DISABLE_STDOUT"),
        };

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), MonitorError> {
        if self.service.trim().is_empty() {
            return Err(MonitorError::ServiceRequired);
        }

        if self.batch_size > MAX_BATCH_SIZE {
            return Err(MonitorError::InvalidConfig(format!(
                "Batch size {} exceeds the maximum of {MAX_BATCH_SIZE}",
                self.batch_size
            )));
        }

        if let Some(ingest_url) = &self.ingest_url {
            let url = Url::parse(ingest_url).map_err(|e| {
                MonitorError::InvalidConfig(format!("Invalid ingest URL '{ingest_url}': {e}"))
            })?;
            if !matches!(url.scheme(), "http" | "https") {
                return Err(MonitorError::InvalidConfig(format!(
                    "Ingest URL must use http or https, got '{}'",
                    url.scheme()
                )));
            }
        }

        if let Compression::Zstd(level) = self.compression {
            let range = zstd::compression_level_range();
            if !range.contains(&level) {
                return Err(MonitorError::InvalidConfig(format!(
                    "Invalid zstd compression level {level}. Must be within {}..={}",
                    range.start(),
                    range.end()
                )));
            }
        }

        Ok(())
    }

    /// Fills in everything left unset: job id, batch size, interval and timeout.
    #[must_use]
    pub fn with_defaults(mut self) -> Self {
        if self.job_id.as_deref().map_or(true, str::is_empty) {
            self.job_id = Some(generate_short_id());
        }
        if self.env.as_deref() == Some("") {
            self.env = None;
        }
        if self.batch_size == 0 {
            self.batch_size = DEFAULT_BATCH_SIZE;
        }
        if self.flush_interval.is_zero() {
            self.flush_interval = DEFAULT_FLUSH_INTERVAL;
        }
        if self.delivery_timeout.is_zero() {
            self.delivery_timeout = DEFAULT_DELIVERY_TIMEOUT;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn valid_config() -> Config {
        Config {
            service: "test-service".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_requires_service() {
        let config = Config::default();
        assert!(matches!(
            config.validate(),
            Err(MonitorError::ServiceRequired)
        ));
    }

    #[test]
    fn test_blank_service_is_rejected() {
        let config = Config {
            service: "   ".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(MonitorError::ServiceRequired)
        ));
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_ingest_url() {
        let config = Config {
            ingest_url: Some("not a url".to_string()),
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(MonitorError::InvalidConfig(_))
        ));

        let config = Config {
            ingest_url: Some("ftp://collector.local/ingest".to_string()),
            ..valid_config()
        };
        assert!(config.validate().is_err());

        let config = Config {
            ingest_url: Some("https://collector.local/ingest".to_string()),
            ..valid_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_zstd_level() {
        let config = Config {
            compression: Compression::Zstd(1_000),
            ..valid_config()
        };
        assert!(config.validate().is_err());

        let config = Config {
            compression: Compression::Zstd(3),
            ..valid_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_batch_size_bound() {
        let config = Config {
            batch_size: MAX_BATCH_SIZE,
            ..valid_config()
        };
        assert!(config.validate().is_ok());

        let config = Config {
            batch_size: usize::MAX / 4,
            ..valid_config()
        };
        assert!(matches!(
            config.validate(),
            Err(MonitorError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_with_defaults() {
        let config = Config {
            batch_size: 0,
            flush_interval: Duration::ZERO,
            delivery_timeout: Duration::ZERO,
            env: Some(String::new()),
            ..valid_config()
        }
        .with_defaults();

        assert_eq!(config.batch_size, 200);
        assert_eq!(config.flush_interval, Duration::from_secs(1));
        assert_eq!(config.delivery_timeout, Duration::from_secs(30));
        assert_eq!(config.env, None);
        assert!(config.job_id.is_some());
    }

    #[test]
    fn test_with_defaults_keeps_explicit_values() {
        let config = Config {
            job_id: Some("custom-job-id".to_string()),
            batch_size: 10,
            flush_interval: Duration::from_millis(250),
            ..valid_config()
        }
        .with_defaults();

        assert_eq!(config.job_id.as_deref(), Some("custom-job-id"));
        assert_eq!(config.batch_size, 10);
        assert_eq!(config.flush_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_content_encoding() {
        assert_eq!(Compression::Gzip.content_encoding(), "gzip");
        assert_eq!(Compression::Zstd(3).content_encoding(), "zstd");
    }

    const ENV_KEYS: [&str; 12] = [
        "MONITOR_SERVICE",
        "MONITOR_ENV",
        "MONITOR_JOB_ID",
        "MONITOR_INGEST_URL",
        "MONITOR_API_KEY",
        "MONITOR_BATCH_SIZE",
        "MONITOR_FLUSH_INTERVAL_MS",
        "MONITOR_TIMEOUT_SECS",
        "MONITOR_GZIP",
        "MONITOR_COMPRESSION",
        "MONITOR_COMPRESSION_LEVEL",
        "MONITOR_DISABLE_STDOUT",
    ];

    fn clear_env() {
        for key in ENV_KEYS {
            env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_from_env() {
        clear_env();
        env::set_var("MONITOR_SERVICE", "users");
        env::set_var("MONITOR_ENV", "staging");
        env::set_var("MONITOR_INGEST_URL", "http://127.0.0.1:9000/ingest");
        env::set_var("MONITOR_BATCH_SIZE", "50");
        env::set_var("MONITOR_FLUSH_INTERVAL_MS", "not-a-number");
        env::set_var("MONITOR_GZIP", "true");
        env::set_var("MONITOR_COMPRESSION", "zstd");
        env::set_var("MONITOR_COMPRESSION_LEVEL", "6");

        let config = Config::from_env().expect("config from env");
        clear_env();

        assert_eq!(config.service, "users");
        assert_eq!(config.env.as_deref(), Some("staging"));
        assert_eq!(
            config.ingest_url.as_deref(),
            Some("http://127.0.0.1:9000/ingest")
        );
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.flush_interval, Duration::from_secs(1));
        assert!(config.compression_enabled);
        assert_eq!(config.compression, Compression::Zstd(6));
        assert!(!config.disable_stdout);
    }

    #[test]
    #[serial]
    fn test_from_env_missing_service() {
        clear_env();
        assert!(matches!(
            Config::from_env(),
            Err(MonitorError::ServiceRequired)
        ));
    }

    #[test]
    #[serial]
    fn test_from_env_unknown_compression() {
        clear_env();
        env::set_var("MONITOR_SERVICE", "users");
        env::set_var("MONITOR_COMPRESSION", "brotli");

        let result = Config::from_env();
        clear_env();

        assert!(matches!(result, Err(MonitorError::InvalidConfig(_))));
    }

    #[test]
    #[serial]
    fn test_from_env_oversized_batch_size_uses_default() {
        clear_env();
        env::set_var("MONITOR_SERVICE", "users");
        env::set_var("MONITOR_BATCH_SIZE", &(MAX_BATCH_SIZE + 1).to_string());

        let config = Config::from_env().expect("config from env");
        clear_env();

        assert_eq!(config.batch_size, DEFAULT_BATCH_SIZE);
    }
}
