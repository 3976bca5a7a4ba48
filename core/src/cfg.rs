use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Identifier used to compute per-app configuration directories.
#[derive(Clone, Copy)]
pub struct AppId {
    /// Reverse-DNS style qualifier, e.g. `"com"`.
    pub qualifier: &'static str,
    /// Organization or vendor name, e.g. `"local"`.
    pub organization: &'static str,
    /// Application name, e.g. `"jobsync"`.
    pub application: &'static str,
}

/// Which transport reconciles jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// Azure Resource Manager over HTTPS.
    #[default]
    Arm,
    /// Local emulator persisted next to the state store.
    Local,
}

/// Cloud environment values the mappers and transports read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Environment {
    /// Default OAuth audience for directory authentication.
    #[serde(default = "default_service_management_endpoint")]
    pub service_management_endpoint: String,
    /// Base URL of the resource manager API.
    #[serde(default = "default_resource_manager_endpoint")]
    pub resource_manager_endpoint: String,
    /// Scheduler API version.
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Name of the env var holding the bearer token.
    #[serde(default = "default_token_env")]
    pub token_env: String,
}

fn default_service_management_endpoint() -> String { "https://management.core.windows.net/".to_string() }
fn default_resource_manager_endpoint() -> String { "https://management.azure.com/".to_string() }
fn default_api_version() -> String { "2016-03-01".to_string() }
fn default_token_env() -> String { "ARM_ACCESS_TOKEN".to_string() }

impl Default for Environment {
    fn default() -> Self {
        Self {
            service_management_endpoint: default_service_management_endpoint(),
            resource_manager_endpoint: default_resource_manager_endpoint(),
            api_version: default_api_version(),
            token_env: default_token_env(),
        }
    }
}

/// Application configuration persisted to `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Tracing level to use if `RUST_LOG` is not set (e.g. `"info"`).
    pub log_level: String,
    /// State store directory; relative paths sit under the app data dir.
    #[serde(default = "default_state_dir")]
    pub state_dir: String,
    /// Transport used when the CLI does not override it.
    #[serde(default)]
    pub backend: Backend,
    /// Subscription new jobs are created in.
    #[serde(default)]
    pub subscription_id: String,
    /// Cloud endpoints.
    #[serde(default)]
    pub environment: Environment,
}

fn default_state_dir() -> String { "state".to_string() }

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            state_dir: default_state_dir(),
            backend: Backend::default(),
            subscription_id: String::new(),
            environment: Environment::default(),
        }
    }
}

fn project_dirs(app: &AppId) -> Result<ProjectDirs> {
    ProjectDirs::from(app.qualifier, app.organization, app.application)
        .ok_or_else(|| anyhow::anyhow!("failed to resolve ProjectDirs"))
}

/// Return the configuration directory for this app, creating it if needed.
pub fn config_dir(app: &AppId) -> Result<PathBuf> {
    let dir = project_dirs(app)?.config_dir().to_path_buf();
    fs::create_dir_all(&dir).with_context(|| format!("create config dir {}", dir.display()))?;
    Ok(dir)
}

/// Resolve `cfg.state_dir` against the app data dir.
pub fn state_dir(app: &AppId, cfg: &Config) -> Result<PathBuf> {
    let p = Path::new(&cfg.state_dir);
    if p.is_absolute() {
        return Ok(p.to_path_buf());
    }
    Ok(project_dirs(app)?.data_dir().join(p))
}

/// Load `config.toml` from the app config dir or create a default one.
pub fn load_or_init(app: &AppId) -> Result<Config> {
    let dir = config_dir(app)?;
    let path = dir.join("config.toml");
    if path.exists() {
        load(&path)
    } else {
        let cfg = Config::default();
        save_config(&path, &cfg)?;
        Ok(cfg)
    }
}

/// Load a config file from an explicit path.
pub fn load(path: &Path) -> Result<Config> {
    let txt = fs::read_to_string(path)
        .with_context(|| format!("read {}", path.display()))?;
    let cfg: Config = toml::from_str(&txt)
        .with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

fn save_config(path: &Path, cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(cfg)?;
    fs::write(path, s).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
