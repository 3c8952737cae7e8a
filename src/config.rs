//! Configuration
//!
//! Read-only settings handed to the pipeline at construction time. Loaded
//! from a JSON file, then overridden from the environment.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SvgenError};
use crate::request::ModelId;
use crate::svg::{FragmentPolicy, DEFAULT_MAX_BYTES};

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]{0,254}$").expect("static regex"));

/// Top-level application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub validator: ValidatorConfig,
    pub models: ModelsConfig,
    pub stage: StageConfig,
    pub cortex: CortexConfig,
}

/// Validator limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidatorConfig {
    /// Maximum accepted markup size in bytes
    pub max_bytes: usize,
    /// Enforce the element allowlist
    pub strict_elements: bool,
    /// Span selection when several `<svg>` fragments appear
    pub fragment_policy: FragmentPolicy,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            max_bytes: DEFAULT_MAX_BYTES,
            strict_elements: true,
            fragment_policy: FragmentPolicy::Outermost,
        }
    }
}

/// Models offered to users
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    pub allowed: Vec<ModelId>,
    pub default: ModelId,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            allowed: ModelId::ALL.to_vec(),
            default: ModelId::OpenAiGpt41,
        }
    }
}

impl ModelsConfig {
    pub fn is_allowed(&self, model: ModelId) -> bool {
        self.allowed.contains(&model)
    }
}

/// Where accepted files are written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    /// Stage name
    pub name: String,
    /// Database to qualify the stage with (current database when unset)
    pub database: Option<String>,
    /// Schema to qualify the stage with (current schema when unset)
    pub schema: Option<String>,
    /// Local directory backing stages
    pub root: PathBuf,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            name: "SVG_STAGE".to_string(),
            database: None,
            schema: None,
            root: PathBuf::from("stages"),
        }
    }
}

impl StageConfig {
    /// `DB.SCHEMA.STAGE`, omitting unset parts
    pub fn qualified_name(&self) -> String {
        [self.database.as_deref(), self.schema.as_deref(), Some(self.name.as_str())]
            .into_iter()
            .flatten()
            .filter(|part| !part.is_empty())
            .collect::<Vec<_>>()
            .join(".")
    }

    /// Check every name part is a plain identifier
    pub fn validate(&self) -> Result<()> {
        let parts = [
            ("stage name", Some(self.name.as_str())),
            ("database", self.database.as_deref()),
            ("schema", self.schema.as_deref()),
        ];
        for (label, value) in parts {
            if let Some(value) = value {
                if !IDENTIFIER.is_match(value) {
                    return Err(SvgenError::Config {
                        reason: format!("{} '{}' is not a valid identifier", label, value),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Cortex REST endpoint settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CortexConfig {
    /// Account URL; derived from the account name when unset
    pub base_url: Option<String>,
    pub timeout_ms: u64,
}

impl Default for CortexConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout_ms: 120_000,
        }
    }
}

impl AppConfig {
    /// Load from a JSON file, then apply environment overrides
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| SvgenError::Config {
            reason: format!("cannot read {}: {}", path.display(), e),
        })?;
        let mut config: AppConfig = serde_json::from_str(&content)?;
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = AppConfig::default();
        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `SVGEN_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("SVGEN_MAX_BYTES") {
            self.validator.max_bytes = parse_var("SVGEN_MAX_BYTES", &v)?;
        }
        if let Some(v) = lookup("SVGEN_STRICT") {
            self.validator.strict_elements = parse_var("SVGEN_STRICT", &v)?;
        }
        if let Some(v) = lookup("SVGEN_STAGE") {
            self.stage.name = v;
        }
        if let Some(v) = lookup("SVGEN_STAGE_ROOT") {
            self.stage.root = PathBuf::from(v);
        }
        if let Some(v) = lookup("SVGEN_CORTEX_URL") {
            self.cortex.base_url = Some(v);
        }
        if let Some(v) = lookup("SVGEN_CORTEX_TIMEOUT_MS") {
            self.cortex.timeout_ms = parse_var("SVGEN_CORTEX_TIMEOUT_MS", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.validator.max_bytes == 0 {
            return Err(SvgenError::Config {
                reason: "validator.max_bytes must be positive".to_string(),
            });
        }
        if self.models.allowed.is_empty() {
            return Err(SvgenError::Config {
                reason: "models.allowed must list at least one model".to_string(),
            });
        }
        if !self.models.is_allowed(self.models.default) {
            return Err(SvgenError::Config {
                reason: format!(
                    "default model {} is not in models.allowed",
                    self.models.default
                ),
            });
        }
        self.stage.validate()
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| SvgenError::Config {
        reason: format!("{} has invalid value '{}'", key, value),
    })
}

/// Warehouse connection parameters.
///
/// Owned by the caller and passed to collaborators when they are built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionConfig {
    pub account: String,
    pub user: String,
    pub password: String,
    pub warehouse: String,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub role: Option<String>,
}

impl ConnectionConfig {
    pub const REQUIRED_VARS: &'static [&'static str] = &[
        "SNOWFLAKE_ACCOUNT",
        "SNOWFLAKE_USER",
        "SNOWFLAKE_PASSWORD",
        "SNOWFLAKE_WAREHOUSE",
    ];

    pub const OPTIONAL_VARS: &'static [&'static str] =
        &["SNOWFLAKE_DATABASE", "SNOWFLAKE_SCHEMA", "SNOWFLAKE_ROLE"];

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup. Reports every missing required variable
    /// at once.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let missing: Vec<String> = Self::REQUIRED_VARS
            .iter()
            .copied()
            .filter(|key| get(*key).is_none())
            .map(|key| key.to_string())
            .collect();
        if !missing.is_empty() {
            return Err(SvgenError::MissingEnvironment { vars: missing });
        }

        Ok(Self {
            account: get("SNOWFLAKE_ACCOUNT").unwrap_or_default(),
            user: get("SNOWFLAKE_USER").unwrap_or_default(),
            password: get("SNOWFLAKE_PASSWORD").unwrap_or_default(),
            warehouse: get("SNOWFLAKE_WAREHOUSE").unwrap_or_default(),
            database: get("SNOWFLAKE_DATABASE"),
            schema: get("SNOWFLAKE_SCHEMA"),
            role: get("SNOWFLAKE_ROLE"),
        })
    }

    /// Account URL for REST calls
    pub fn account_url(&self) -> String {
        format!(
            "https://{}.snowflakecomputing.com",
            self.account.to_ascii_lowercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = AppConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.validator.max_bytes, 1024 * 1024);
        assert!(config.validator.strict_elements);
        assert_eq!(config.models.allowed.len(), 4);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"validator": {"max_bytes": 2048}, "stage": {"name": "LOGOS"}}"#)
                .unwrap();
        assert_eq!(config.validator.max_bytes, 2048);
        assert!(config.validator.strict_elements);
        assert_eq!(config.stage.name, "LOGOS");
        assert_eq!(config.cortex.timeout_ms, 120_000);
    }

    #[test]
    fn test_env_overrides() {
        let mut config = AppConfig::default();
        config
            .apply_overrides(lookup(&[("SVGEN_MAX_BYTES", "512"), ("SVGEN_STRICT", "false")]))
            .unwrap();
        assert_eq!(config.validator.max_bytes, 512);
        assert!(!config.validator.strict_elements);

        let err = config
            .apply_overrides(lookup(&[("SVGEN_MAX_BYTES", "lots")]))
            .unwrap_err();
        assert!(err.to_string().contains("SVGEN_MAX_BYTES"));
    }

    #[test]
    fn test_stage_qualified_name() {
        let mut stage = StageConfig::default();
        assert_eq!(stage.qualified_name(), "SVG_STAGE");

        stage.database = Some("ART".to_string());
        stage.schema = Some("PUBLIC".to_string());
        assert_eq!(stage.qualified_name(), "ART.PUBLIC.SVG_STAGE");
        assert!(stage.validate().is_ok());

        stage.name = "bad name; DROP".to_string();
        assert!(stage.validate().is_err());
    }

    #[test]
    fn test_default_model_must_be_allowed() {
        let mut config = AppConfig::default();
        config.models.allowed = vec![ModelId::Claude4Sonnet];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_connection_reports_all_missing_vars() {
        let err = ConnectionConfig::from_lookup(lookup(&[("SNOWFLAKE_ACCOUNT", "acme")]))
            .unwrap_err();
        match err {
            SvgenError::MissingEnvironment { vars } => {
                assert_eq!(
                    vars,
                    vec!["SNOWFLAKE_USER", "SNOWFLAKE_PASSWORD", "SNOWFLAKE_WAREHOUSE"]
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_connection_optional_vars() {
        let conn = ConnectionConfig::from_lookup(lookup(&[
            ("SNOWFLAKE_ACCOUNT", "ACME-XY12"),
            ("SNOWFLAKE_USER", "u"),
            ("SNOWFLAKE_PASSWORD", "p"),
            ("SNOWFLAKE_WAREHOUSE", "wh"),
            ("SNOWFLAKE_ROLE", "artist"),
        ]))
        .unwrap();
        assert_eq!(conn.role.as_deref(), Some("artist"));
        assert!(conn.database.is_none());
        assert_eq!(conn.account_url(), "https://acme-xy12.snowflakecomputing.com");
    }
}
