use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use figment::{
    Figment,
    providers::{Env, Format, Json, Serialized},
};
use salon_backend::BackendConfig;
use salon_core::{RoomId, UserId};
use serde::{Deserialize, Serialize};
use snafu::{ResultExt, Snafu};

pub const CONFIG_DIRECTORY_NAME: &str = "salon";
pub const CONFIG_FILE_NAME: &str = "client.json";
/// Environment variable overriding the configuration file location.
pub const CONFIG_PATH_ENV: &str = "SALON_CONFIG";
pub const ENV_PREFIX: &str = "SALON_";

pub const DEFAULT_MESSAGES_INTERVAL_MS: u64 = 1_500;
pub const DEFAULT_TYPING_INTERVAL_MS: u64 = 1_000;
pub const DEFAULT_ROOMS_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_ROOM_STATE_INTERVAL_MS: u64 = 3_000;
pub const DEFAULT_TYPING_PING_MIN_INTERVAL_MS: u64 = 800;
pub const DEFAULT_NEAR_BOTTOM_THRESHOLD_PX: u32 = 120;

/// Poll periods of every loop, in milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    pub messages_ms: u64,
    pub typing_ms: u64,
    pub rooms_ms: u64,
    pub room_state_ms: u64,
    /// Minimum spacing between two outbound typing pings.
    pub typing_ping_min_interval_ms: u64,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            messages_ms: DEFAULT_MESSAGES_INTERVAL_MS,
            typing_ms: DEFAULT_TYPING_INTERVAL_MS,
            rooms_ms: DEFAULT_ROOMS_INTERVAL_MS,
            room_state_ms: DEFAULT_ROOM_STATE_INTERVAL_MS,
            typing_ping_min_interval_ms: DEFAULT_TYPING_PING_MIN_INTERVAL_MS,
        }
    }
}

impl PollingConfig {
    fn normalized(self) -> Self {
        Self {
            messages_ms: or_default(self.messages_ms, DEFAULT_MESSAGES_INTERVAL_MS),
            typing_ms: or_default(self.typing_ms, DEFAULT_TYPING_INTERVAL_MS),
            rooms_ms: or_default(self.rooms_ms, DEFAULT_ROOMS_INTERVAL_MS),
            room_state_ms: or_default(self.room_state_ms, DEFAULT_ROOM_STATE_INTERVAL_MS),
            typing_ping_min_interval_ms: or_default(
                self.typing_ping_min_interval_ms,
                DEFAULT_TYPING_PING_MIN_INTERVAL_MS,
            ),
        }
    }

    pub fn messages(&self) -> Duration {
        Duration::from_millis(self.messages_ms)
    }

    pub fn typing(&self) -> Duration {
        Duration::from_millis(self.typing_ms)
    }

    pub fn rooms(&self) -> Duration {
        Duration::from_millis(self.rooms_ms)
    }

    pub fn room_state(&self) -> Duration {
        Duration::from_millis(self.room_state_ms)
    }

    pub fn typing_ping_min_interval(&self) -> Duration {
        Duration::from_millis(self.typing_ping_min_interval_ms)
    }
}

fn or_default(value: u64, default: u64) -> u64 {
    if value == 0 { default } else { value }
}

/// Immutable client configuration handed to every engine at construction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub backend: BackendConfig,
    /// Room to join; without one the client shows the room directory.
    pub room_id: Option<RoomId>,
    /// Username of the viewer, used to tell own messages apart.
    pub current_user: Option<String>,
    pub current_user_id: Option<UserId>,
    pub polling: PollingConfig,
    pub near_bottom_threshold_px: u32,
}

impl ClientConfig {
    pub fn normalized(mut self) -> Self {
        self.backend = self.backend.normalized();
        self.current_user = self
            .current_user
            .map(|name| name.trim().to_string())
            .filter(|name| !name.is_empty());
        self.polling = self.polling.normalized();
        if self.near_bottom_threshold_px == 0 {
            self.near_bottom_threshold_px = DEFAULT_NEAR_BOTTOM_THRESHOLD_PX;
        }
        self
    }
}

/// Holds the loaded configuration; the file and `SALON_*` variables are layered over defaults.
pub struct ConfigStore {
    config: Arc<ArcSwap<ClientConfig>>,
    config_path: PathBuf,
}

impl ConfigStore {
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .map(|path| path.join(CONFIG_DIRECTORY_NAME))
            .unwrap_or_else(|| PathBuf::from(".salon"))
    }

    pub fn default_config_path() -> PathBuf {
        std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| Self::default_config_dir().join(CONFIG_FILE_NAME))
    }

    pub fn new(config_path: PathBuf) -> Self {
        let config = Self::load_from(&config_path);
        Self {
            config: Arc::new(ArcSwap::from_pointee(config)),
            config_path,
        }
    }

    pub fn load() -> Self {
        Self::new(Self::default_config_path())
    }

    pub fn config(&self) -> Arc<ClientConfig> {
        self.config.load_full()
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    fn load_from(path: &Path) -> ClientConfig {
        let mut figment = Figment::from(Serialized::defaults(ClientConfig::default()));
        if path.exists() {
            figment = figment.merge(Json::file(path));
        } else {
            tracing::info!("config file not found at {:?}, using defaults", path);
        }
        let figment = figment.merge(
            Env::prefixed(ENV_PREFIX)
                .ignore(&["config"])
                .split("__"),
        );

        Self::extract(figment)
    }

    /// Extracts and normalizes a configuration, falling back to defaults when it is malformed.
    pub fn extract(figment: Figment) -> ClientConfig {
        match figment.extract::<ClientConfig>() {
            Ok(config) => config.normalized(),
            Err(error) => {
                tracing::warn!("failed to parse client config: {}. using defaults", error);
                ClientConfig::default().normalized()
            }
        }
    }

    /// Writes the current configuration to the config path, creating parent directories.
    pub fn persist(&self) -> Result<(), ConfigError> {
        let config = self.config();
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent).context(CreateDirSnafu {
                stage: "create-config-directory",
                path: parent.to_path_buf(),
            })?;
        }

        let content =
            serde_json::to_string_pretty(config.as_ref()).context(SerializeConfigSnafu {
                stage: "serialize-config-json",
            })?;

        let temp_path = self.config_path.with_extension("json.tmp");
        std::fs::write(&temp_path, content).context(WriteFileSnafu {
            stage: "write-temporary-config-file",
            path: temp_path.clone(),
        })?;

        std::fs::rename(&temp_path, &self.config_path).context(RenameTempFileSnafu {
            stage: "rename-temporary-config-file",
            from: temp_path,
            to: self.config_path.clone(),
        })?;

        tracing::info!("saved config to {:?}", self.config_path);
        Ok(())
    }
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum ConfigError {
    #[snafu(display("failed to create config directory at {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize config on `{stage}`: {source}"))]
    SerializeConfig {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write config file at {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display(
        "failed to replace config file from {from:?} to {to:?} on `{stage}`: {source}"
    ))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn figment_with(json: &str) -> Figment {
        Figment::from(Serialized::defaults(ClientConfig::default())).merge(Json::string(json))
    }

    #[test]
    fn defaults_match_poll_periods() {
        let config = ConfigStore::extract(figment_with("{}"));

        assert_eq!(config.polling.messages(), Duration::from_millis(1_500));
        assert_eq!(config.polling.typing(), Duration::from_millis(1_000));
        assert_eq!(config.polling.rooms(), Duration::from_millis(3_000));
        assert_eq!(config.polling.room_state(), Duration::from_millis(3_000));
        assert_eq!(
            config.polling.typing_ping_min_interval(),
            Duration::from_millis(800)
        );
        assert_eq!(config.near_bottom_threshold_px, 120);
        assert_eq!(config.room_id, None);
    }

    #[test]
    fn file_values_are_layered_and_normalized() {
        let config = ConfigStore::extract(figment_with(
            r#"{
                "backend": { "base_url": "https://chat.example.org/", "csrf_token": " t0k " },
                "room_id": 7,
                "current_user": "  alice ",
                "polling": { "messages_ms": 0, "rooms_ms": 5000 }
            }"#,
        ));

        assert_eq!(config.backend.base_url, "https://chat.example.org");
        assert_eq!(config.backend.csrf_token, "t0k");
        assert_eq!(config.room_id, Some(RoomId::new(7)));
        assert_eq!(config.current_user.as_deref(), Some("alice"));
        assert_eq!(config.polling.messages_ms, DEFAULT_MESSAGES_INTERVAL_MS);
        assert_eq!(config.polling.rooms_ms, 5_000);
        assert_eq!(config.polling.typing_ms, DEFAULT_TYPING_INTERVAL_MS);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        let config = ConfigStore::extract(figment_with(r#"{ "room_id": "lobby" }"#));
        assert_eq!(config, ClientConfig::default().normalized());
    }

    #[test]
    fn missing_file_still_loads() {
        let path = std::env::temp_dir().join("salon-missing-config-test/client.json");
        let store = ConfigStore::new(path.clone());

        assert_eq!(store.config_path(), path.as_path());
        assert_eq!(store.config().polling, PollingConfig::default());
    }

    #[test]
    fn persisted_config_is_read_back() {
        let directory = std::env::temp_dir().join(format!(
            "salon-config-test-{}",
            std::process::id()
        ));
        let path = directory.join(CONFIG_FILE_NAME);
        let store = ConfigStore::new(path.clone());
        store.persist().unwrap();

        let reloaded = ConfigStore::extract(
            Figment::from(Serialized::defaults(ClientConfig::default())).merge(Json::file(&path)),
        );
        assert_eq!(reloaded, *store.config());

        std::fs::remove_dir_all(directory).unwrap();
    }
}
