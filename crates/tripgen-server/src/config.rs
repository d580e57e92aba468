use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tripgen_core::generation::{DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
use tripgen_core::storage::DEFAULT_FIRESTORE_BASE_URL;
use tripgen_core::{FirestoreConfig, GeminiConfig, PipelineOptions};

/// Contents of `tripgen.toml`. Every section is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TripgenConfig {
    pub server: ServerConfig,
    pub generation: GenerationConfig,
    pub store: StoreConfig,
    pub pipeline: PipelineConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// HTTP listen address
    pub http_addr: SocketAddr,
    /// Directory holding the embedded database
    pub data_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            data_dir: PathBuf::from("./data"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub model: String,
    pub base_url: String,
    /// Deadline for one generation call
    pub timeout_secs: u64,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// Inline key; the environment variable wins when both are set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            timeout_secs: 60,
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Redb,
    Firestore,
    Memory,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub firestore: FirestoreTomlConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FirestoreTomlConfig {
    pub project_id: Option<String>,
    pub database: String,
    pub collection: String,
    pub base_url: String,
    pub timeout_secs: u64,
    /// Environment variable holding an OAuth2 access token
    pub access_token_env: String,
    /// Environment variable naming an emulator `host:port`
    pub emulator_host_env: String,
}

impl Default for FirestoreTomlConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            database: "(default)".to_string(),
            collection: "trips".to_string(),
            base_url: DEFAULT_FIRESTORE_BASE_URL.to_string(),
            timeout_secs: 30,
            access_token_env: "FIRESTORE_ACCESS_TOKEN".to_string(),
            emulator_host_env: "FIRESTORE_EMULATOR_HOST".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Mark the trip FAILED when generation or extraction fails
    pub record_failures: bool,
}

impl TripgenConfig {
    /// Parse a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Failed to parse {}", path.display()))
    }

    /// Parse a config file, falling back to defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn db_path(&self) -> PathBuf {
        self.server.data_dir.join("tripgen.redb")
    }

    /// Static checks. Returns one message per problem found.
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.generation.model.trim().is_empty() {
            errors.push("[generation] model must not be empty".to_string());
        }
        if self.generation.timeout_secs == 0 {
            errors.push("[generation] timeout_secs must be greater than 0".to_string());
        }
        if self.store.backend == StoreBackend::Firestore {
            if self.store.firestore.project_id.is_none() {
                errors.push(
                    "[store.firestore] project_id is required when backend = \"firestore\""
                        .to_string(),
                );
            }
            if self.store.firestore.timeout_secs == 0 {
                errors.push("[store.firestore] timeout_secs must be greater than 0".to_string());
            }
        }
        errors
    }

    /// Gemini client settings with the API key resolved through `lookup`.
    pub fn gemini_config(&self, lookup: impl Fn(&str) -> Option<String>) -> Result<GeminiConfig> {
        let generation = &self.generation;
        let api_key = lookup(&generation.api_key_env)
            .or_else(|| generation.api_key.clone())
            .filter(|k| !k.trim().is_empty())
            .with_context(|| {
                format!(
                    "Generation API key not found. Set the {} environment variable.",
                    generation.api_key_env
                )
            })?;
        Ok(GeminiConfig::new(api_key)
            .with_model(&generation.model)
            .with_base_url(&generation.base_url)
            .with_timeout(Duration::from_secs(generation.timeout_secs)))
    }

    /// Firestore settings with emulator host and token resolved through `lookup`.
    pub fn firestore_config(
        &self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<FirestoreConfig> {
        let fs = &self.store.firestore;
        let project_id = fs
            .project_id
            .clone()
            .context("[store.firestore] project_id is required")?;
        let config = FirestoreConfig::new(project_id)
            .with_database(&fs.database)
            .with_collection(&fs.collection)
            .with_base_url(&fs.base_url)
            .with_timeout(Duration::from_secs(fs.timeout_secs));

        if let Some(host) = lookup(&fs.emulator_host_env).filter(|h| !h.is_empty()) {
            return Ok(config.with_emulator(&host));
        }
        let token = lookup(&fs.access_token_env).with_context(|| {
            format!(
                "Firestore access token not found. Set {} (or {} for the emulator).",
                fs.access_token_env, fs.emulator_host_env
            )
        })?;
        Ok(config.with_access_token(token))
    }

    pub fn pipeline_options(&self) -> PipelineOptions {
        PipelineOptions {
            record_failures: self.pipeline.record_failures,
        }
    }
}

/// Read a process environment variable.
pub fn env_lookup(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
