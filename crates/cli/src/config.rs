use once_cell::sync::Lazy;
use querytrail_core::config::DEFAULT_BIG_THRESHOLD;
use querytrail_core::WarehouseConfig;
use querytrail_error::{find_closest_match, ErrorCode, ErrorContext, QueryTrailError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const PROFILE_ENV: &str = "QUERYTRAIL_PROFILE";
pub const CONFIG_ENV: &str = "QUERYTRAIL_CONFIG";
pub const REGION_ENV: &str = "QUERYTRAIL_REGION";
pub const RESULT_LOCATION_ENV: &str = "QUERYTRAIL_RESULT_LOCATION";

pub const DEFAULT_PROFILE: &str = "default";

static ENV_PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{([a-zA-Z_][a-zA-Z0-9_]*)\}").expect("placeholder pattern is valid")
});

/// One profile from `config.yaml`, flattened over the warehouse settings.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct CliConfig {
    #[serde(flatten)]
    pub warehouse: WarehouseConfig,
    #[serde(default = "default_big_threshold")]
    pub big_threshold: i64,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            warehouse: WarehouseConfig::default(),
            big_threshold: default_big_threshold(),
        }
    }
}

fn default_big_threshold() -> i64 {
    DEFAULT_BIG_THRESHOLD
}

#[derive(Serialize, Deserialize, Default)]
pub struct ConfigFile {
    #[serde(default)]
    pub current_profile: Option<String>,
    #[serde(default)]
    pub profiles: HashMap<String, CliConfig>,
}

/// Expand `${VAR}` placeholders from the environment, leaving unknown ones intact.
pub fn expand_env(content: &str) -> String {
    ENV_PLACEHOLDER
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string()
}

/// Read and parse a profile file.
pub fn read_config_file(path: &Path) -> Result<ConfigFile> {
    let raw = fs::read_to_string(path).map_err(|e| {
        QueryTrailError::new(
            ErrorCode::InvalidSetting,
            format!("Failed to read config file {}: {}", path.display(), e),
        )
        .with_context(ErrorContext::Config {
            file_path: Some(path.display().to_string()),
            field: None,
        })
    })?;
    serde_yaml::from_str::<ConfigFile>(&expand_env(&raw)).map_err(|e| {
        QueryTrailError::from(e).with_context(ErrorContext::Config {
            file_path: Some(path.display().to_string()),
            field: None,
        })
    })
}

/// Load configuration based on profile name, environment variables, and config file.
///
/// A profile named explicitly (argument or `QUERYTRAIL_PROFILE`) must exist unless it is
/// `default`; a missing file or an absent implicit profile falls back to built-in defaults.
pub fn load(profile_arg: Option<&str>) -> Result<CliConfig> {
    let config_path = config_path();
    let config_file = if config_path.exists() {
        debug!("Reading config file {}", config_path.display());
        read_config_file(&config_path)?
    } else {
        ConfigFile::default()
    };

    // Priority: Arg > Env > Config File > "default"
    let explicit = profile_arg
        .map(|s| s.to_string())
        .or_else(|| env::var(PROFILE_ENV).ok());
    let is_explicit = explicit.is_some();
    let profile_name = explicit
        .or(config_file.current_profile.clone())
        .unwrap_or_else(|| DEFAULT_PROFILE.to_string());

    let mut config = match config_file.profiles.get(&profile_name) {
        Some(profile) => profile.clone(),
        None if is_explicit && profile_name != DEFAULT_PROFILE => {
            return Err(unknown_profile(&profile_name, &config_file, &config_path));
        }
        None => CliConfig::default(),
    };

    if let Ok(region) = env::var(REGION_ENV) {
        config.warehouse.region = region;
    }
    if let Ok(location) = env::var(RESULT_LOCATION_ENV) {
        config.warehouse.result_location = location;
    }

    Ok(config)
}

fn unknown_profile(name: &str, file: &ConfigFile, path: &Path) -> QueryTrailError {
    let mut known: Vec<String> = file.profiles.keys().cloned().collect();
    known.sort();
    let err = QueryTrailError::new(
        ErrorCode::ProfileNotFound,
        format!("Profile '{}' not found in {}", name, path.display()),
    )
    .with_context(ErrorContext::Config {
        file_path: Some(path.display().to_string()),
        field: Some("profiles".to_string()),
    });
    match find_closest_match(name, &known) {
        Some(candidate) => err.with_hint(format!("Did you mean '{}'?", candidate)),
        None if known.is_empty() => err.with_hint("No profiles are defined"),
        None => err.with_hint(format!("Known profiles: {}", known.join(", "))),
    }
}

pub fn config_path() -> PathBuf {
    if let Ok(path) = env::var(CONFIG_ENV) {
        return PathBuf::from(path);
    }

    // ~/.querytrail/config.yaml
    match dirs::home_dir() {
        Some(home) => home.join(".querytrail").join("config.yaml"),
        None => PathBuf::from(".querytrail/config.yaml"),
    }
}
