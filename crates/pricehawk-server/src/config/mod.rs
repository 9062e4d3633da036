//! Configuration loading and resolution.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

pub const DB_ENV: &str = "PRICEHAWK_DB";
pub const FETCH_TIMEOUT_ENV: &str = "PRICEHAWK_FETCH_TIMEOUT_MS";
pub const STAGGER_ENV: &str = "PRICEHAWK_STAGGER_MS";

/// Resolve the SQLite database path.
///
/// Order: explicit flag, `PRICEHAWK_DB`, `./.pricehawk/pricehawk.db` when it
/// already exists, then `~/.pricehawk/pricehawk.db`.
pub fn resolve_db_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var(DB_ENV) {
        if !env_path.trim().is_empty() {
            return env_path;
        }
    }

    let cwd_db = PathBuf::from(".pricehawk/pricehawk.db");
    if cwd_db.exists() {
        return cwd_db.display().to_string();
    }

    resolve_default_db_path()
}

fn resolve_default_db_path() -> String {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    format!("{home}/.pricehawk/pricehawk.db")
}

/// Page fetch settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    /// Per-request timeout.
    pub timeout_ms: u64,
    /// Total attempts per page, including the first.
    pub attempts: u32,
    /// Bodies shorter than this many characters count as "no data".
    pub min_page_chars: usize,
    /// Delay before the second side of a comparison is fetched.
    pub stagger_ms: u64,
    /// Base delay between attempts; doubled on each retry.
    pub retry_delay_ms: u64,
    /// Visit the marketplace home page first to pick up session cookies.
    pub seed_cookies: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 20_000,
            attempts: 2,
            min_page_chars: 10_000,
            stagger_ms: 2_000,
            retry_delay_ms: 3_000,
            seed_cookies: true,
        }
    }
}

impl FetchConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(ms) = env_millis(FETCH_TIMEOUT_ENV) {
            config.timeout_ms = ms;
        }
        if let Some(ms) = env_millis(STAGGER_ENV) {
            config.stagger_ms = ms;
        }
        config
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn stagger(&self) -> Duration {
        Duration::from_millis(self.stagger_ms)
    }
}

fn env_millis(name: &str) -> Option<u64> {
    let raw = std::env::var(name).ok()?;
    match raw.trim().parse() {
        Ok(ms) => Some(ms),
        Err(_) => {
            warn!(variable = name, value = %raw, "ignoring non-numeric millisecond override");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_path_wins() {
        assert_eq!(resolve_db_path(Some("/tmp/x.db")), "/tmp/x.db");
    }

    #[test]
    fn test_default_path_shape() {
        assert!(resolve_default_db_path().ends_with("/.pricehawk/pricehawk.db"));
    }

    #[test]
    fn test_fetch_defaults() {
        let config = FetchConfig::default();
        assert_eq!(config.attempts, 2);
        assert_eq!(config.min_page_chars, 10_000);
        assert_eq!(config.stagger(), Duration::from_secs(2));
    }
}
