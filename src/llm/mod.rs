//! The text-generation boundary.
//!
//! Stages never talk HTTP directly: they build a [`CompletionRequest`] through
//! [`crate::Ctx::llm`] and hand it to whatever [`Completion`] backend the
//! context carries. Production code uses [`AnthropicClient`]; tests plug in a
//! scripted fake.

mod anthropic;
mod history;

pub use anthropic::AnthropicClient;
pub use history::History;

use serde::Serialize;
use std::time::{Duration, Instant};

use crate::agent::Failure;

/// A text-generation service. Treated as an opaque, non-deterministic
/// function from request to text.
pub trait Completion: Send + Sync {
    fn complete(&self, request: &CompletionRequest) -> Result<String, Failure>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub model: String,
    pub system: Option<String>,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    /// Upper bound for the whole call, connect to last byte.
    pub timeout: Duration,
}

/// Defaults applied to every request built from a [`crate::Ctx`].
#[derive(Debug, Clone, PartialEq)]
pub struct LlmDefaults {
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for LlmDefaults {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: 1024,
            timeout: Duration::from_secs(60),
        }
    }
}

pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Builder returned by [`crate::Ctx::llm`].
///
/// ```rust,no_run
/// # use solution_loop::Ctx;
/// # fn demo(ctx: &Ctx) -> Result<(), solution_loop::Failure> {
/// let answer = ctx
///     .llm()
///     .system("You are terse.")
///     .user("Name one prime number.")
///     .max_tokens(16)
///     .send()?;
/// # Ok(()) }
/// ```
pub struct LlmRequest<'a> {
    backend: Option<&'a dyn Completion>,
    request: CompletionRequest,
}

impl<'a> LlmRequest<'a> {
    pub(crate) fn new(backend: Option<&'a dyn Completion>, defaults: &LlmDefaults) -> Self {
        Self {
            backend,
            request: CompletionRequest {
                model: defaults.model.clone(),
                system: None,
                messages: Vec::new(),
                max_tokens: defaults.max_tokens,
                temperature: None,
                timeout: defaults.timeout,
            },
        }
    }

    pub fn system(mut self, instruction: impl Into<String>) -> Self {
        self.request.system = Some(instruction.into());
        self
    }

    pub fn user(mut self, content: impl Into<String>) -> Self {
        self.request.messages.push(Message::user(content));
        self
    }

    /// Replay earlier turns ahead of whatever is added next.
    pub fn history(mut self, history: &History) -> Self {
        self.request.messages.extend(history.messages());
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.request.model = model.into();
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.request.max_tokens = max_tokens;
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.request.temperature = Some(temperature);
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.request.timeout = timeout;
        self
    }

    pub fn request(&self) -> &CompletionRequest {
        &self.request
    }

    /// Block until the backend answers, fails, or the timeout expires.
    pub fn send(self) -> Result<String, Failure> {
        let backend = self
            .backend
            .ok_or_else(|| Failure::unavailable("no completion backend configured"))?;

        let started = Instant::now();
        let result = backend.complete(&self.request);
        tracing::debug!(
            model = %self.request.model,
            messages = self.request.messages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = result.is_ok(),
            "completion finished"
        );
        result
    }
}
