use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    #[serde(default)]
    pub state: StateConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub models: ModelsConfig,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_base_url(),
            models: ModelsConfig::default(),
        }
    }
}

fn default_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ModelsConfig {
    #[serde(default = "default_text_model")]
    pub text: String,
    #[serde(default = "default_image_model")]
    pub image: String,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            text: default_text_model(),
            image: default_image_model(),
        }
    }
}

fn default_text_model() -> String {
    "gemini-3-flash-preview".to_string()
}
fn default_image_model() -> String {
    "gemini-2.5-flash-image".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct StateConfig {
    #[serde(default = "default_db_path")]
    pub db_path: String,
    #[serde(default = "default_images_dir")]
    pub images_dir: String,
    #[serde(default = "default_history_cap")]
    pub history_cap: usize,
}

impl Default for StateConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            images_dir: default_images_dir(),
            history_cap: default_history_cap(),
        }
    }
}

fn default_db_path() -> String {
    "scenthood.db".to_string()
}
fn default_images_dir() -> String {
    "scenthood_images".to_string()
}
fn default_history_cap() -> usize {
    20
}

impl AppConfig {
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut config: AppConfig = toml::from_str(&content)?;
        config.apply_env();
        Ok(config)
    }

    /// Missing config files are not an error: the defaults plus a
    /// `GEMINI_API_KEY` environment variable are a complete configuration.
    pub fn load_or_default(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            let mut config = AppConfig::default();
            config.apply_env();
            Ok(config)
        }
    }

    fn apply_env(&mut self) {
        if let Ok(key) = std::env::var("GEMINI_API_KEY") {
            if !key.is_empty() {
                self.provider.api_key = key;
            }
        }
    }
}
