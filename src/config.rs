use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "LIFE_SIM_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "life_sim.toml";

#[derive(Debug, Error)]
#[error("invalid configuration: {0}")]
pub struct ConfigError(#[from] figment::Error);

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub data: DataConfig,
    pub game: GameConfig,
    pub workflow: WorkflowConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// One of error, warn, info, debug, trace. `RUST_LOG` still wins.
    pub log_level: String,
}

/// Locations of the reference data files.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub city_data_path: PathBuf,
    pub talents_data_path: PathBuf,
}

/// Session defaults and limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub initial_age: u32,
    pub initial_stats: i32,
    pub default_city: String,
    pub max_history: usize,
    pub max_stats: i32,
}

/// Coze workflow API settings. The client is only built when the token and
/// all three workflow ids are present.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkflowConfig {
    #[serde(deserialize_with = "optional_text")]
    pub api_token: Option<String>,
    pub base_url: String,
    #[serde(deserialize_with = "optional_text")]
    pub talent_workflow_id: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    pub event_workflow_id: Option<String>,
    #[serde(deserialize_with = "optional_text")]
    pub wechat_workflow_id: Option<String>,
    pub timeout_secs: u64,
    pub use_ai_talents: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            log_level: "info".to_string(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            city_data_path: PathBuf::from("data/cities.json"),
            talents_data_path: PathBuf::from("data/talents.json"),
        }
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            initial_age: 14,
            initial_stats: 10,
            default_city: "北京".to_string(),
            max_history: 30,
            max_stats: 20,
        }
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            api_token: None,
            base_url: "https://api.coze.cn".to_string(),
            talent_workflow_id: None,
            event_workflow_id: None,
            wechat_workflow_id: None,
            timeout_secs: 30,
            use_ai_talents: false,
        }
    }
}

impl WorkflowConfig {
    /// Names of the settings still missing for a usable client.
    pub fn missing_settings(&self) -> Vec<&'static str> {
        [
            ("COZE_API_TOKEN", &self.api_token),
            ("COZE_TALENT_WORKFLOW_ID", &self.talent_workflow_id),
            ("COZE_EVENT_WORKFLOW_ID", &self.event_workflow_id),
            ("COZE_WECHAT_WORKFLOW_ID", &self.wechat_workflow_id),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |v| v.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }
}

impl AppConfig {
    /// Loads defaults, then `life_sim.toml` (or `$LIFE_SIM_CONFIG`), then the environment.
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var_os(CONFIG_PATH_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
        if path.exists() {
            log::info!("Loading config from {}", path.display());
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
        }
        Self::from_figment(Self::figment(&path))
    }

    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed("GAME_").map(|key| format!("game.{}", key.as_str()).into()))
            .merge(Env::prefixed("COZE_").map(|key| format!("workflow.{}", key.as_str()).into()))
            .merge(
                Env::raw()
                    .only(&["CITY_DATA_PATH", "TALENTS_DATA_PATH"])
                    .map(|key| format!("data.{}", key.as_str()).into()),
            )
            .merge(
                Env::raw()
                    .only(&["USE_AI_TALENTS"])
                    .map(|key| format!("workflow.{}", key.as_str()).into()),
            )
            .merge(Env::prefixed("LIFE_SIM_").map(|key| format!("server.{}", key.as_str()).into()))
    }

    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        Ok(figment.extract()?)
    }
}

/// Workflow ids and tokens are long digit strings; the env provider reads
/// those as numbers.
fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Text {
        Str(String),
        Unsigned(u64),
        Signed(i64),
    }

    Ok(Option::<Text>::deserialize(deserializer)?.map(|text| match text {
        Text::Str(value) => value,
        Text::Unsigned(value) => value.to_string(),
        Text::Signed(value) => value.to_string(),
    }))
}
