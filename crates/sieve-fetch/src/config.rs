//! Layered configuration system
//!
//! Config is loaded with three layers of precedence (highest wins):
//! 1. Environment variables: `SIEVE_API_ENDPOINT`, `SIEVE_ENTITY_PREFIX`
//! 2. Project-local: `.sieve/config.toml`
//! 3. Global: `~/.sieve/config.toml`

use serde::{Deserialize, Serialize};
use sieve_core::{EntityId, Result, SieveError};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const ENV_API_ENDPOINT: &str = "SIEVE_API_ENDPOINT";
const ENV_ENTITY_PREFIX: &str = "SIEVE_ENTITY_PREFIX";

/// Connection settings for one Wikibase instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WikibaseConfig {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_api_endpoint")]
    pub api_endpoint: String,
    #[serde(default = "default_entity_prefix")]
    pub entity_prefix: String,
    /// Property under which constraints are declared on property entities
    #[serde(default = "default_property_constraint_pid")]
    pub property_constraint_pid: String,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for WikibaseConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            api_endpoint: default_api_endpoint(),
            entity_prefix: default_entity_prefix(),
            property_constraint_pid: default_property_constraint_pid(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

impl WikibaseConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    pub fn property_constraint_id(&self) -> EntityId {
        EntityId::new(self.property_constraint_pid.as_str())
    }
}

fn default_name() -> String {
    "Wikidata".to_string()
}
fn default_api_endpoint() -> String {
    "https://www.wikidata.org/w/api.php".to_string()
}
fn default_entity_prefix() -> String {
    "http://www.wikidata.org/entity/".to_string()
}
fn default_property_constraint_pid() -> String {
    "P2302".to_string()
}
fn default_connect_timeout() -> u64 {
    5
}
fn default_read_timeout() -> u64 {
    30
}
fn default_user_agent() -> String {
    format!("sieve/{}", env!("CARGO_PKG_VERSION"))
}

/// Entity cache bounds
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl(),
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_max_entries() -> usize {
    4096
}
fn default_ttl() -> u64 {
    3600
}

/// Evaluation engine settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default = "default_true")]
    pub parallel: bool,
    /// Rule types to run; all registered rules when absent
    #[serde(default)]
    pub rules: Option<Vec<String>>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            parallel: true,
            rules: None,
        }
    }
}

fn default_true() -> bool {
    true
}

/// Constraint ids used by the built-in rules on Wikidata
fn default_constraints() -> HashMap<String, String> {
    [
        ("difference_within_range_constraint_qid", "Q21510854"),
        ("difference_within_range_constraint_pid", "P2306"),
        ("minimum_value_pid", "P2313"),
        ("maximum_value_pid", "P2312"),
        ("one_of_qualifier_value_property_constraint_qid", "Q52712340"),
        ("property_pid", "P2306"),
        ("item_of_property_constraint_pid", "P2305"),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect()
}

/// Top-level config file structure; every section is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SieveConfigFile {
    #[serde(default)]
    pub wikibase: Option<WikibaseConfig>,
    #[serde(default)]
    pub cache: Option<CacheConfig>,
    #[serde(default)]
    pub engine: Option<EngineConfig>,
    #[serde(default)]
    pub constraints: HashMap<String, String>,
}

/// Resolved configuration with environment variable overrides applied
#[derive(Debug, Clone, PartialEq)]
pub struct SieveConfig {
    pub wikibase: WikibaseConfig,
    pub cache: CacheConfig,
    pub engine: EngineConfig,
    /// Flat rule configuration: key -> entity id
    pub constraints: HashMap<String, String>,
}

impl Default for SieveConfig {
    fn default() -> Self {
        Self {
            wikibase: WikibaseConfig::default(),
            cache: CacheConfig::default(),
            engine: EngineConfig::default(),
            constraints: default_constraints(),
        }
    }
}

impl SieveConfig {
    /// Load config with layered precedence: global < project < env vars
    pub fn load() -> Result<Self> {
        let mut config = SieveConfig::default();

        // Layer 1: Global config (~/.sieve/config.toml)
        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                let global = Self::load_file(&global_path)?;
                Self::merge_into(&mut config, global);
            }
        }

        // Layer 2: Project-local config (.sieve/config.toml)
        let local_path = PathBuf::from(".sieve/config.toml");
        if local_path.exists() {
            let local = Self::load_file(&local_path)?;
            Self::merge_into(&mut config, local);
        }

        // Layer 3: Environment variable overrides
        Self::apply_env_overrides(&mut config);

        Ok(config)
    }

    /// Load config from a specific file path on top of the defaults
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let mut config = SieveConfig::default();
        let file = Self::load_file(path)?;
        Self::merge_into(&mut config, file);
        Self::apply_env_overrides(&mut config);
        Ok(config)
    }

    /// Parse config from a TOML string on top of the defaults (no env overrides)
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: SieveConfigFile = toml::from_str(content)?;
        let mut config = SieveConfig::default();
        Self::merge_into(&mut config, file);
        Ok(config)
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".sieve").join("config.toml"))
    }

    fn load_file(path: &Path) -> Result<SieveConfigFile> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| {
            SieveError::Config(format!("Failed to parse config {}: {}", path.display(), e))
        })
    }

    fn merge_into(base: &mut SieveConfig, overlay: SieveConfigFile) {
        if let Some(wikibase) = overlay.wikibase {
            base.wikibase = wikibase;
        }
        if let Some(cache) = overlay.cache {
            base.cache = cache;
        }
        if let Some(engine) = overlay.engine {
            base.engine = engine;
        }
        for (key, id) in overlay.constraints {
            // An empty id switches the key off
            if id.is_empty() {
                base.constraints.remove(&key);
            } else {
                base.constraints.insert(key, id);
            }
        }
    }

    fn apply_env_overrides(config: &mut SieveConfig) {
        if let Ok(endpoint) = std::env::var(ENV_API_ENDPOINT) {
            config.wikibase.api_endpoint = endpoint;
        }
        if let Ok(prefix) = std::env::var(ENV_ENTITY_PREFIX) {
            config.wikibase.entity_prefix = prefix;
        }
    }
}
