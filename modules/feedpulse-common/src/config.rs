use std::env;
use std::time::Duration;

use tracing::info;

use crate::types::{Platform, Target};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Postgres
    pub database_url: String,

    // Scraping provider
    pub apify_token: String,

    // Topic classification service
    pub classifier_url: String,

    // Scheduling
    pub scrape_limit: u32,
    pub scrape_cycle: Duration,
    pub target_delay: Duration,
    pub notify_cycle: Duration,

    /// When true, a scrape job polls its provider run to completion and
    /// ingests the resulting dataset in-process (single-process deployment
    /// with no public webhook endpoint).
    pub ingest_on_complete: bool,
}

impl Config {
    /// Load configuration from environment variables.
    /// Panics with a clear message if required vars are missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required_env("DATABASE_URL"),
            apify_token: required_env("APIFY_TOKEN"),
            classifier_url: required_env("CLASSIFIER_URL"),
            scrape_limit: parsed_env("SCRAPE_LIMIT", 30),
            scrape_cycle: Duration::from_secs(parsed_env("SCRAPE_CYCLE_SECS", 3600)),
            target_delay: Duration::from_secs(parsed_env("TARGET_DELAY_SECS", 5)),
            notify_cycle: Duration::from_secs(parsed_env("NOTIFY_CYCLE_SECS", 300)),
            ingest_on_complete: env::var("INGEST_ON_COMPLETE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        }
    }

    /// Log the non-secret parts of the config at startup.
    pub fn log_redacted(&self) {
        info!(
            scrape_limit = self.scrape_limit,
            scrape_cycle_secs = self.scrape_cycle.as_secs(),
            target_delay_secs = self.target_delay.as_secs(),
            notify_cycle_secs = self.notify_cycle.as_secs(),
            ingest_on_complete = self.ingest_on_complete,
            "Config loaded"
        );
    }

    /// Which platforms have a target list configured right now.
    pub fn configured_platforms() -> Vec<Platform> {
        [Platform::Instagram, Platform::Facebook, Platform::X]
            .into_iter()
            .filter(|p| env::var(targets_var(*p)).map(|v| !v.trim().is_empty()) == Ok(true))
            .collect()
    }
}

/// Scrape targets for one platform, read fresh from the environment.
///
/// Deliberately NOT part of `Config`: target lists may change between
/// scheduler cycles, so they are re-read at the top of every cycle rather
/// than cached for the process lifetime. A missing or empty var is an empty
/// target list, not an error.
pub fn targets_from_env(platform: Platform, limit: u32) -> Vec<Target> {
    let raw = env::var(targets_var(platform)).unwrap_or_default();
    raw.split(',')
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(|handle| Target {
            platform,
            handle: handle.to_string(),
            limit,
        })
        .collect()
}

fn targets_var(platform: Platform) -> &'static str {
    match platform {
        Platform::Instagram => "INSTAGRAM_TARGETS",
        Platform::Facebook => "FACEBOOK_TARGETS",
        Platform::X => "X_TARGETS",
    }
}

fn required_env(key: &str) -> String {
    env::var(key).unwrap_or_else(|_| panic!("{key} environment variable is required"))
}

fn parsed_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(v) => v
            .parse()
            .unwrap_or_else(|_| panic!("{key} must be a number, got '{v}'")),
        Err(_) => default,
    }
}
