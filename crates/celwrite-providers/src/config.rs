//! Configuration loading and provider factory.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use celwrite_core::evaluation::ScoringSettings;
use celwrite_core::traits::ScoringProvider;

use crate::anthropic::AnthropicProvider;
use crate::gemini::GeminiProvider;
use crate::mock::MockProvider;
use crate::openai::OpenAiProvider;

/// Configuration for a single scoring provider.
///
/// Note: Custom Debug impl masks API keys to prevent accidental exposure in logs.
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ProviderConfig {
    Gemini {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    OpenAI {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
        #[serde(default)]
        org_id: Option<String>,
    },
    Anthropic {
        #[serde(default)]
        api_key: String,
        #[serde(default)]
        base_url: Option<String>,
    },
    /// Canned replies, no network. `response` overrides the built-in sample.
    Mock {
        #[serde(default)]
        response: Option<String>,
    },
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderConfig::Gemini {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Gemini")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::OpenAI {
                api_key: _,
                base_url,
                org_id,
            } => f
                .debug_struct("OpenAI")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .field("org_id", org_id)
                .finish(),
            ProviderConfig::Anthropic {
                api_key: _,
                base_url,
            } => f
                .debug_struct("Anthropic")
                .field("api_key", &"***")
                .field("base_url", base_url)
                .finish(),
            ProviderConfig::Mock { response } => f
                .debug_struct("Mock")
                .field("response", &response.as_ref().map(|r| r.len()))
                .finish(),
        }
    }
}

/// Top-level celwrite configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CelwriteConfig {
    /// Provider configurations keyed by name.
    #[serde(default)]
    pub providers: HashMap<String, ProviderConfig>,
    #[serde(default = "default_provider")]
    pub default_provider: String,
    #[serde(default = "default_model")]
    pub default_model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Upper bound on one scoring call, in seconds. 0 disables the deadline.
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// Where the draft database lives; platform data dir if unset.
    #[serde(default)]
    pub data_dir: Option<PathBuf>,
    /// Extra TOML question banks (files or directories).
    #[serde(default)]
    pub question_banks: Vec<PathBuf>,
}

fn default_provider() -> String {
    "gemini".to_string()
}
fn default_model() -> String {
    "gemini-3-flash-preview".to_string()
}
fn default_temperature() -> f64 {
    0.7
}
fn default_max_tokens() -> u32 {
    4096
}
fn default_timeout() -> u64 {
    120
}

impl Default for CelwriteConfig {
    fn default() -> Self {
        Self {
            providers: HashMap::new(),
            default_provider: default_provider(),
            default_model: default_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            request_timeout_secs: default_timeout(),
            data_dir: None,
            question_banks: Vec::new(),
        }
    }
}

impl CelwriteConfig {
    /// Scoring settings for `model`, falling back to `default_model`.
    pub fn scoring_settings(&self, model: Option<&str>) -> ScoringSettings {
        ScoringSettings {
            model: model.unwrap_or(&self.default_model).to_string(),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            deadline: (self.request_timeout_secs > 0)
                .then(|| Duration::from_secs(self.request_timeout_secs)),
        }
    }

    /// Look up a provider by name. `gemini` and `mock` work without an
    /// explicit table (gemini then fails later on its missing key).
    pub fn provider(&self, name: &str) -> Option<ProviderConfig> {
        if let Some(config) = self.providers.get(name) {
            return Some(config.clone());
        }
        match name {
            "gemini" => Some(ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
            }),
            "mock" => Some(ProviderConfig::Mock { response: None }),
            _ => None,
        }
    }
}

/// Resolve environment variable references like `${VAR_NAME}` in a string.
fn resolve_env_vars(s: &str) -> String {
    let mut result = s.to_string();
    while let Some(start) = result.find("${") {
        if let Some(end) = result[start..].find('}') {
            let var_name = &result[start + 2..start + end];
            let value = std::env::var(var_name).unwrap_or_default();
            result = format!(
                "{}{}{}",
                &result[..start],
                value,
                &result[start + end + 1..]
            );
        } else {
            break;
        }
    }
    result
}

fn resolve_provider_config(config: &ProviderConfig) -> ProviderConfig {
    let opt = |v: &Option<String>| v.as_ref().map(|s| resolve_env_vars(s));
    match config {
        ProviderConfig::Gemini { api_key, base_url } => ProviderConfig::Gemini {
            api_key: resolve_env_vars(api_key),
            base_url: opt(base_url),
        },
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => ProviderConfig::OpenAI {
            api_key: resolve_env_vars(api_key),
            base_url: opt(base_url),
            org_id: opt(org_id),
        },
        ProviderConfig::Anthropic { api_key, base_url } => ProviderConfig::Anthropic {
            api_key: resolve_env_vars(api_key),
            base_url: opt(base_url),
        },
        ProviderConfig::Mock { response } => ProviderConfig::Mock {
            response: response.clone(),
        },
    }
}

/// Put `key` into the provider named `name`, creating a bare entry if needed.
fn override_key(config: &mut CelwriteConfig, name: &str, key: String) {
    let entry = config
        .providers
        .entry(name.to_string())
        .or_insert_with(|| match name {
            "openai" => ProviderConfig::OpenAI {
                api_key: String::new(),
                base_url: None,
                org_id: None,
            },
            "anthropic" => ProviderConfig::Anthropic {
                api_key: String::new(),
                base_url: None,
            },
            _ => ProviderConfig::Gemini {
                api_key: String::new(),
                base_url: None,
            },
        });
    match entry {
        ProviderConfig::Gemini { api_key, .. }
        | ProviderConfig::OpenAI { api_key, .. }
        | ProviderConfig::Anthropic { api_key, .. } => *api_key = key,
        ProviderConfig::Mock { .. } => {}
    }
}

/// Load configuration from well-known paths.
///
/// Search order:
/// 1. `celwrite.toml` in the current directory
/// 2. `~/.config/celwrite/config.toml`
///
/// Environment variable overrides: `CELWRITE_GEMINI_KEY`,
/// `CELWRITE_OPENAI_KEY`, `CELWRITE_ANTHROPIC_KEY`.
pub fn load_config() -> Result<CelwriteConfig> {
    load_config_from(None)
}

/// Load config from an explicit path, or search the default locations.
pub fn load_config_from(path: Option<&Path>) -> Result<CelwriteConfig> {
    let config_path = match path {
        Some(p) if p.exists() => Some(p.to_path_buf()),
        Some(p) => anyhow::bail!("config file not found: {}", p.display()),
        None => {
            let local = PathBuf::from("celwrite.toml");
            if local.exists() {
                Some(local)
            } else {
                global_config_path().filter(|p| p.exists())
            }
        }
    };

    let mut config = match config_path {
        Some(path) => parse_config_file(&path)?,
        None => CelwriteConfig::default(),
    };

    for (var, name) in [
        ("CELWRITE_GEMINI_KEY", "gemini"),
        ("CELWRITE_OPENAI_KEY", "openai"),
        ("CELWRITE_ANTHROPIC_KEY", "anthropic"),
    ] {
        if let Ok(key) = std::env::var(var) {
            if !key.is_empty() {
                override_key(&mut config, name, key);
            }
        }
    }

    config.providers = config
        .providers
        .iter()
        .map(|(k, v)| (k.clone(), resolve_provider_config(v)))
        .collect();

    Ok(config)
}

fn parse_config_file(path: &Path) -> Result<CelwriteConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config: {}", path.display()))?;
    toml::from_str::<CelwriteConfig>(&content)
        .with_context(|| format!("failed to parse config: {}", path.display()))
}

/// `~/.config/celwrite/config.toml` (or the platform equivalent).
pub fn global_config_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "celwrite")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Create a provider instance from its configuration.
///
/// Fails with [`crate::ProviderError::MissingCredential`] when a networked provider
/// has no key.
pub fn create_provider(
    config: &ProviderConfig,
    timeout_secs: u64,
) -> Result<Arc<dyn ScoringProvider>> {
    let provider: Arc<dyn ScoringProvider> = match config {
        ProviderConfig::Gemini { api_key, base_url } => Arc::new(GeminiProvider::new(
            api_key,
            base_url.clone(),
            timeout_secs,
        )?),
        ProviderConfig::OpenAI {
            api_key,
            base_url,
            org_id,
        } => Arc::new(OpenAiProvider::new(
            api_key,
            base_url.clone(),
            org_id.clone(),
            timeout_secs,
        )?),
        ProviderConfig::Anthropic { api_key, base_url } => Arc::new(AnthropicProvider::new(
            api_key,
            base_url.clone(),
            timeout_secs,
        )?),
        ProviderConfig::Mock { response } => Arc::new(match response {
            Some(r) => MockProvider::with_fixed_response(r),
            None => MockProvider::default(),
        }),
    };
    Ok(provider)
}

/// Build the provider named `name` from `config`.
pub fn provider_by_name(config: &CelwriteConfig, name: &str) -> Result<Arc<dyn ScoringProvider>> {
    let provider_config = config
        .provider(name)
        .ok_or_else(|| anyhow::anyhow!("provider '{name}' is not configured"))?;
    create_provider(&provider_config, config.request_timeout_secs)
        .with_context(|| format!("cannot use provider '{name}'"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_env_vars_basic() {
        std::env::set_var("_CELWRITE_TEST_VAR", "hello");
        assert_eq!(resolve_env_vars("${_CELWRITE_TEST_VAR}"), "hello");
        assert_eq!(
            resolve_env_vars("prefix_${_CELWRITE_TEST_VAR}_suffix"),
            "prefix_hello_suffix"
        );
        std::env::remove_var("_CELWRITE_TEST_VAR");
    }

    #[test]
    fn default_config() {
        let config = CelwriteConfig::default();
        assert_eq!(config.default_provider, "gemini");
        assert_eq!(config.default_model, "gemini-3-flash-preview");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.request_timeout_secs, 120);
    }

    #[test]
    fn parse_provider_config() {
        let toml_str = r#"
default_provider = "openai"
default_model = "gpt-4o"
request_timeout_secs = 0
question_banks = ["banks"]

[providers.gemini]
type = "gemini"
api_key = "g-key"

[providers.openai]
type = "openai"
api_key = "sk-openai"

[providers.offline]
type = "mock"
"#;
        let config: CelwriteConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.providers.len(), 3);
        assert_eq!(config.default_provider, "openai");
        assert!(matches!(
            config.providers.get("offline"),
            Some(ProviderConfig::Mock { response: None })
        ));
        assert!(config.scoring_settings(None).deadline.is_none());
        assert_eq!(config.scoring_settings(Some("gpt-4o-mini")).model, "gpt-4o-mini");
    }

    #[test]
    fn debug_masks_keys() {
        let config = ProviderConfig::Gemini {
            api_key: "super-secret".into(),
            base_url: None,
        };
        let printed = format!("{config:?}");
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("***"));
    }

    #[test]
    fn missing_key_is_an_error_not_a_panic() {
        let config = CelwriteConfig::default();
        let err = provider_by_name(&config, "gemini").err().unwrap();
        assert!(format!("{err:#}").contains("no API key configured for gemini"));
    }

    #[test]
    fn unknown_provider() {
        let config = CelwriteConfig::default();
        assert!(provider_by_name(&config, "cohere").is_err());
        assert!(provider_by_name(&config, "mock").is_ok());
    }

    #[test]
    fn explicit_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("celwrite.toml");
        std::fs::write(&path, "default_model = \"gemini-2.5-pro\"\n").unwrap();
        let config = load_config_from(Some(&path)).unwrap();
        assert_eq!(config.default_model, "gemini-2.5-pro");

        assert!(load_config_from(Some(&dir.path().join("missing.toml"))).is_err());
    }
}
