//! Configuration with layered resolution using figment.
//!
//! Resolution order (highest priority last):
//! 1. User config: `~/.config/sidb-network/config.toml` (XDG) or platform config dir
//! 2. Project config: `.sidb-network.toml`
//! 3. Environment variables: `SIDB_*`
//!
//! Every section has defaults, so an empty configuration is valid.
//!
//! ```toml
//! [neo4j]
//! uri = "bolt://localhost:7687"
//! user = "neo4j"
//! password = "secret"
//!
//! [sync]
//! chunk_size = 1000
//! default_label = "Node"
//!
//! [normalize]
//! separator = ";"
//! placeholder = "Missing"
//! excluded_keys = ["synonyms"]
//! ```

use std::ops::Deref;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Boxed wrapper for figment::Error to reduce Result size on the stack.
#[derive(Debug)]
pub struct ConfigError(Box<figment::Error>);

impl Deref for ConfigError {
    type Target = figment::Error;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.0.source()
    }
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self(Box::new(err))
    }
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub neo4j: Neo4jConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub normalize: NormalizeConfig,
}

/// Neo4j connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    /// Bolt URI, e.g. `bolt://localhost:7687`.
    pub uri: String,
    pub user: String,
    #[serde(default)]
    pub password: Option<String>,
    /// Target database; the server default when unset.
    #[serde(default)]
    pub database: Option<String>,
}

impl Default for Neo4jConfig {
    fn default() -> Self {
        Self {
            uri: "bolt://localhost:7687".to_string(),
            user: "neo4j".to_string(),
            password: None,
            database: None,
        }
    }
}

/// Batch synchronization settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Rows per UNWIND statement.
    pub chunk_size: usize,
    /// Label substituted for nodes without a category.
    pub default_label: String,
    /// Label every node is merged on before its category labels are attached.
    pub base_label: String,
    /// Stop at the first failed batch instead of attempting the rest.
    pub stop_on_error: bool,
}

/// Default rows per batch statement.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            default_label: "Node".to_string(),
            base_label: "Node".to_string(),
            stop_on_error: true,
        }
    }
}

/// Attribute flattening settings shared by every builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    /// Separator used to join list values.
    pub separator: String,
    /// Value stored in place of null or empty values.
    pub placeholder: String,
    /// Source keys dropped while building entities.
    pub excluded_keys: Vec<String>,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        Self {
            separator: ";".to_string(),
            placeholder: "Missing".to_string(),
            excluded_keys: vec!["synonyms".to_string()],
        }
    }
}

impl Config {
    /// Load config with layered resolution (defaults → user → project → env).
    pub fn load() -> Result<Self, ConfigError> {
        Self::figment().extract().map_err(ConfigError::from)
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            // Layer 1: User config (lowest priority)
            .merge(Toml::file(Self::user_config_path()))
            // Layer 2: Project config
            .merge(Toml::file(".sidb-network.toml"))
            // Layer 3: Environment variables (highest priority)
            .merge(Env::prefixed("SIDB_").split("__"))
    }

    /// User config path: ~/.config/sidb-network/config.toml (XDG) or platform config dir.
    fn user_config_path() -> std::path::PathBuf {
        // Prefer XDG config location (~/.config) on all platforms
        if let Some(home) = dirs::home_dir() {
            let xdg_path = home.join(".config").join("sidb-network").join("config.toml");
            if xdg_path.exists() {
                return xdg_path;
            }
        }
        dirs::config_dir()
            .map(|p| p.join("sidb-network").join("config.toml"))
            .unwrap_or_default()
    }
}
