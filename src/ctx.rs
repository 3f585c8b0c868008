use std::collections::HashMap;
use std::sync::Arc;

use crate::config::{Config, ConfigError};
use crate::llm::{AnthropicClient, Completion, LlmDefaults, LlmRequest};

/// Execution context handed to every step: the completion backend, request
/// defaults, a scratch store and a step log.
pub struct Ctx {
    llm: Option<Arc<dyn Completion>>,
    defaults: LlmDefaults,
    store: HashMap<String, String>,
    log: Vec<String>,
}

impl Ctx {
    /// A context with no completion backend. Useful for purely local steps
    /// such as selection; any `llm().send()` fails until one is attached.
    pub fn new() -> Self {
        Self {
            llm: None,
            defaults: LlmDefaults::default(),
            store: HashMap::new(),
            log: vec![],
        }
    }

    /// Build a context talking to Anthropic with the settings in `config`.
    pub fn from_config(config: &Config) -> Self {
        Self::new()
            .with_llm(AnthropicClient::new(config.api_key.clone()))
            .with_defaults(LlmDefaults {
                model: config.model.clone(),
                max_tokens: LlmDefaults::default().max_tokens,
                timeout: config.timeout,
            })
    }

    /// Shorthand for `Config::from_env()` then [`Ctx::from_config`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::from_config(&Config::from_env()?))
    }

    pub fn with_llm(mut self, backend: impl Completion + 'static) -> Self {
        self.llm = Some(Arc::new(backend));
        self
    }

    /// Share one backend between several contexts.
    pub fn with_shared_llm(mut self, backend: Arc<dyn Completion>) -> Self {
        self.llm = Some(backend);
        self
    }

    pub fn with_defaults(mut self, defaults: LlmDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    pub fn defaults(&self) -> &LlmDefaults {
        &self.defaults
    }

    /// Start a completion request pre-filled with this context's defaults.
    pub fn llm(&self) -> LlmRequest<'_> {
        LlmRequest::new(self.llm.as_deref(), &self.defaults)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.store.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.store.get(key).map(|s| s.as_str())
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.store.remove(key)
    }

    pub fn log(&mut self, msg: impl Into<String>) {
        self.log.push(msg.into());
    }

    pub fn logs(&self) -> &[String] {
        &self.log
    }

    pub fn clear_logs(&mut self) {
        self.log.clear();
    }

    pub fn clear(&mut self) {
        self.store.clear();
        self.log.clear();
    }
}

impl Default for Ctx {
    fn default() -> Self {
        Self::new()
    }
}
