use crate::llm::{claude::ClaudeConfig, gemini::GeminiConfig, openai::OpenAiConfig};
use crate::llm::{Connect, Generate, LlmError, ModelClient, ModelInfo, Provider};
use crate::prompt::{Persona, DEFAULT_MAX_HISTORY_TURNS};
use clap::Parser;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_CONFIG_FILE: &str = "doc-chat.toml";
pub const ENV_PREFIX: &str = "DOC_CHAT_";

#[derive(Debug, Parser)]
#[command(name = "doc-chat", version, about = "Chat with a PDF through a hosted LLM")]
pub struct CliArgs {
    /// Path to a TOML settings file (defaults to ./doc-chat.toml when present)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Address to listen on, e.g. 0.0.0.0:8501
    #[arg(long)]
    pub bind: Option<String>,

    /// Assistant wording
    #[arg(long, value_enum)]
    pub persona: Option<Persona>,

    /// Default model as provider/model-id, e.g. gemini/gemini-2.5-flash
    #[arg(long)]
    pub model: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    pub bind_addr: String,
    pub persona: Persona,
    pub default_model: String,
    pub max_history_turns: usize,
    pub max_upload_bytes: usize,
    pub request_timeout_secs: Option<u64>,
    pub log_filter: String,
    pub gemini_api_key: Option<String>,
    pub gemini_base_url: Option<String>,
    pub openai_api_key: Option<String>,
    pub openai_base_url: Option<String>,
    pub claude_api_key: Option<String>,
    pub claude_base_url: Option<String>,
    pub ollama_host: Option<String>,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8501".to_string(),
            persona: Persona::General,
            default_model: "gemini/gemini-2.5-flash".to_string(),
            max_history_turns: DEFAULT_MAX_HISTORY_TURNS,
            max_upload_bytes: 50 * 1024 * 1024,
            request_timeout_secs: None,
            log_filter: "info".to_string(),
            gemini_api_key: None,
            gemini_base_url: None,
            openai_api_key: None,
            openai_base_url: None,
            claude_api_key: None,
            claude_base_url: None,
            ollama_host: None,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Config file not found: {0}")]
    Missing(PathBuf),
    #[error("Invalid configuration: {0}")]
    Invalid(#[from] Box<figment::Error>),
}

/// Load settings from defaults, then the TOML file, then `DOC_CHAT_*` variables,
/// then command-line flags. Later sources win.
pub fn load_settings(args: &CliArgs) -> Result<AppSettings, ConfigError> {
    let mut figment = Figment::from(Serialized::defaults(AppSettings::default()));

    match &args.config {
        Some(path) if !path.exists() => return Err(ConfigError::Missing(path.clone())),
        Some(path) => figment = figment.merge(Toml::file(path)),
        None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
            figment = figment.merge(Toml::file(DEFAULT_CONFIG_FILE))
        }
        None => {}
    }

    figment = figment.merge(Env::prefixed(ENV_PREFIX));

    let mut settings: AppSettings = figment.extract().map_err(Box::new)?;
    if let Some(bind) = &args.bind {
        settings.bind_addr = bind.clone();
    }
    if let Some(persona) = args.persona {
        settings.persona = persona;
    }
    if let Some(model) = &args.model {
        settings.default_model = model.clone();
    }
    Ok(settings)
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl AppSettings {
    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    /// Resolve a provider from a model string like "gemini/...", "openai/...", "claude/...", "ollama/...".
    /// An explicit `api_key` takes precedence over the configured one.
    pub fn resolve_provider(
        &self,
        model: &str,
        api_key: Option<&str>,
    ) -> Result<(Provider, String), LlmError> {
        let api_key = api_key.map(str::trim).filter(|k| !k.is_empty());
        let missing = |name: &str| LlmError::Config(format!("{} API key not configured", name));

        if let Some(model_id) = model.strip_prefix("ollama/") {
            let host = non_empty(&self.ollama_host).unwrap_or("http://localhost:11434");
            Ok((Provider::ollama(host.to_string()), model_id.to_string()))
        } else if let Some(model_id) = model.strip_prefix("claude/") {
            let api_key = api_key
                .or(non_empty(&self.claude_api_key))
                .ok_or_else(|| missing("Claude"))?;
            let base_url = non_empty(&self.claude_base_url).unwrap_or("https://api.anthropic.com");
            Ok((
                Provider::Claude(ClaudeConfig {
                    api_key: api_key.to_string(),
                    base_url: base_url.to_string(),
                }),
                model_id.to_string(),
            ))
        } else if let Some(model_id) = model.strip_prefix("openai/") {
            let api_key = api_key
                .or(non_empty(&self.openai_api_key))
                .ok_or_else(|| missing("OpenAI"))?;
            let base_url = non_empty(&self.openai_base_url).unwrap_or("https://api.openai.com/v1");
            Ok((
                Provider::OpenAi(OpenAiConfig {
                    api_key: api_key.to_string(),
                    base_url: base_url.to_string(),
                }),
                model_id.to_string(),
            ))
        } else {
            let model_id = model.strip_prefix("gemini/").unwrap_or(model);
            let api_key = api_key
                .or(non_empty(&self.gemini_api_key))
                .ok_or_else(|| missing("Gemini"))?;
            let base_url = non_empty(&self.gemini_base_url)
                .unwrap_or("https://generativelanguage.googleapis.com/v1beta");
            Ok((
                Provider::Gemini(GeminiConfig {
                    api_key: api_key.to_string(),
                    base_url: base_url.to_string(),
                }),
                model_id.to_string(),
            ))
        }
    }

    /// Settings for display, with API keys masked.
    pub fn masked(&self) -> BTreeMap<String, String> {
        let mut map = BTreeMap::new();
        let mut put = |key: &str, value: Option<String>| {
            if let Some(value) = value {
                map.insert(key.to_string(), value);
            }
        };
        put("bind_addr", Some(self.bind_addr.clone()));
        put("persona", Some(self.persona.to_string()));
        put("default_model", Some(self.default_model.clone()));
        put("max_history_turns", Some(self.max_history_turns.to_string()));
        put("max_upload_bytes", Some(self.max_upload_bytes.to_string()));
        put(
            "request_timeout_secs",
            self.request_timeout_secs.map(|s| s.to_string()),
        );
        put("gemini_api_key", non_empty(&self.gemini_api_key).map(mask_key));
        put("gemini_base_url", self.gemini_base_url.clone());
        put("openai_api_key", non_empty(&self.openai_api_key).map(mask_key));
        put("openai_base_url", self.openai_base_url.clone());
        put("claude_api_key", non_empty(&self.claude_api_key).map(mask_key));
        put("claude_base_url", self.claude_base_url.clone());
        put("ollama_host", self.ollama_host.clone());
        map
    }

    /// Models the user can pick, given which keys are configured.
    pub fn available_models(&self) -> Vec<ModelInfo> {
        let model = |id: &str, name: &str, provider: &str| ModelInfo {
            id: id.into(),
            name: name.into(),
            provider: provider.into(),
        };
        let mut models = Vec::new();

        if non_empty(&self.gemini_api_key).is_some() {
            models.extend([
                model("gemini/gemini-2.5-flash", "Gemini 2.5 Flash", "Google"),
                model("gemini/gemini-2.5-pro", "Gemini 2.5 Pro", "Google"),
            ]);
        }

        if non_empty(&self.openai_api_key).is_some() {
            models.extend([
                model("openai/gpt-4o", "GPT-4o", "OpenAI"),
                model("openai/gpt-4o-mini", "GPT-4o Mini", "OpenAI"),
                model("openai/gpt-4.1", "GPT-4.1", "OpenAI"),
            ]);
        }

        if non_empty(&self.claude_api_key).is_some() {
            models.extend([
                model("claude/claude-sonnet-4-20250514", "Claude Sonnet 4", "Anthropic"),
                model("claude/claude-haiku-3-5-20241022", "Claude Haiku 3.5", "Anthropic"),
            ]);
        }

        // Local, needs no key.
        models.extend([
            model("ollama/llama3", "Llama 3", "Ollama"),
            model("ollama/qwen2.5", "Qwen 2.5", "Ollama"),
        ]);

        models
    }
}

impl Connect for AppSettings {
    fn connect(&self, model: &str, api_key: Option<&str>) -> Result<Arc<dyn Generate>, LlmError> {
        let (provider, model_id) = self.resolve_provider(model, api_key)?;
        let client = ModelClient::new(provider, model_id, self.request_timeout())?;
        Ok(Arc::new(client))
    }
}

/// Keep the first and last four characters of a secret.
pub fn mask_key(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}
