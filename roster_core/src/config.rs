use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::fs;

static DATA_DIR_NAME: &str = "roster";
static ROSTER_DB_NAME: &str = "roster.sqlite";
static CONFIG_FILE_NAME: &str = "config.json";

// data_dir_path
// |- roster
//    |- roster.sqlite
//    |- config.json

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no data directory available on this platform")]
    NoDataDir,

    #[error("failed to access config file")]
    Io(#[from] std::io::Error),

    #[error("malformed config file")]
    Malformed(#[from] serde_json::Error),

    #[error("session_ttl_hours must be between 1 hour and one year, got {0}")]
    InvalidSessionTtl(i64),
}

/// One year.
const MAX_SESSION_TTL_HOURS: i64 = 24 * 366;

fn default_bind_addr() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_session_cookie() -> String {
    "roster_session".to_string()
}

fn default_session_ttl_hours() -> i64 {
    24 * 7
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RosterConfig {
    /// Connection string handed to sea-orm.
    pub database_url: String,

    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,

    /// Cookie carrying the session token.
    #[serde(default = "default_session_cookie")]
    pub session_cookie: String,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,
}

impl RosterConfig {
    /// Default configuration storing the database inside `data_dir`.
    pub fn new(data_dir: &Path) -> Self {
        let database_path = data_dir.join(ROSTER_DB_NAME);

        RosterConfig {
            database_url: format!("sqlite://{}?mode=rwc", database_path.display()),
            bind_addr: default_bind_addr(),
            session_cookie: default_session_cookie(),
            session_ttl_hours: default_session_ttl_hours(),
        }
    }

    /// Lifetime of newly issued sessions.
    pub fn session_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        if !(1..=MAX_SESSION_TTL_HOURS).contains(&self.session_ttl_hours) {
            return Err(ConfigError::InvalidSessionTtl(self.session_ttl_hours));
        }

        chrono::Duration::try_hours(self.session_ttl_hours)
            .ok_or(ConfigError::InvalidSessionTtl(self.session_ttl_hours))
    }
}

/// Platform data directory for roster, e.g. `~/.local/share/roster`.
pub fn default_data_dir() -> Result<PathBuf, ConfigError> {
    let data_dir = dirs::data_dir().ok_or(ConfigError::NoDataDir)?;
    Ok(data_dir.join(DATA_DIR_NAME))
}

/// Loads `config.json` from `data_dir`, writing a default one first if it doesn't exist.
pub async fn get_or_init(data_dir: Option<PathBuf>) -> Result<RosterConfig, ConfigError> {
    let roster_dir = match data_dir {
        Some(dir) => dir,
        None => default_data_dir()?,
    };
    let config_path = roster_dir.join(CONFIG_FILE_NAME);

    fs::create_dir_all(&roster_dir).await?;

    if fs::try_exists(&config_path).await? {
        let contents = fs::read_to_string(&config_path).await?;
        let config: RosterConfig = serde_json::from_str(&contents)?;
        config.session_ttl()?;
        tracing::debug!(path = %config_path.display(), "loaded config");
        Ok(config)
    } else {
        let config = RosterConfig::new(&roster_dir);

        let json = serde_json::to_string_pretty(&config)?;
        fs::write(&config_path, json).await?;
        tracing::info!(path = %config_path.display(), "wrote default config");

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("roster-config-{name}-{}", uuid::Uuid::now_v7()))
    }

    #[tokio::test]
    async fn test_get_or_init_writes_defaults() {
        let dir = scratch_dir("init");

        let config = get_or_init(Some(dir.clone())).await.unwrap();

        assert!(dir.join(CONFIG_FILE_NAME).exists());
        assert!(config.database_url.ends_with("roster.sqlite?mode=rwc"));
        assert_eq!(config.session_cookie, "roster_session");

        fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_get_or_init_reads_existing_file() {
        let dir = scratch_dir("existing");
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(
            dir.join(CONFIG_FILE_NAME),
            r#"{ "database_url": "sqlite::memory:", "bind_addr": "0.0.0.0:9000" }"#,
        )
        .await
        .unwrap();

        let config = get_or_init(Some(dir.clone())).await.unwrap();

        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.session_ttl_hours, 168);

        fs::remove_dir_all(&dir).await.ok();
    }

    #[tokio::test]
    async fn test_get_or_init_rejects_bad_session_ttl() {
        let dir = scratch_dir("ttl");
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(
            dir.join(CONFIG_FILE_NAME),
            r#"{ "database_url": "sqlite::memory:", "session_ttl_hours": -5 }"#,
        )
        .await
        .unwrap();

        let result = get_or_init(Some(dir.clone())).await;
        assert!(matches!(result, Err(ConfigError::InvalidSessionTtl(-5))));

        fs::remove_dir_all(&dir).await.ok();
    }

    #[test]
    fn test_session_ttl_bounds() {
        let mut config = RosterConfig::new(Path::new("/tmp/roster"));
        assert_eq!(config.session_ttl().unwrap(), chrono::Duration::hours(168));

        config.session_ttl_hours = 0;
        assert!(config.session_ttl().is_err());

        config.session_ttl_hours = i64::MAX;
        assert!(config.session_ttl().is_err());
    }

    #[tokio::test]
    async fn test_malformed_config_is_an_error() {
        let dir = scratch_dir("malformed");
        fs::create_dir_all(&dir).await.unwrap();
        fs::write(dir.join(CONFIG_FILE_NAME), "{ not json").await.unwrap();

        let result = get_or_init(Some(dir.clone())).await;
        assert!(matches!(result, Err(ConfigError::Malformed(_))));

        fs::remove_dir_all(&dir).await.ok();
    }
}
