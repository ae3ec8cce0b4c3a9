//! # Stagehand UI
//!
//! The user-interface contract consumed by the core and handed through the
//! shared context into every plugin implementation. The core never talks to
//! a terminal directly; it emits headers and messages and requests input
//! through this trait, so embedders can swap the console for whatever
//! surface they run under.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use thiserror::Error;

/// UI errors
#[derive(Debug, Error)]
pub enum UiError {
    /// The input source has no more values to give.
    #[error("input stream closed")]
    Closed,
    #[error("input prompt failed: {0}")]
    Prompt(String),
}

/// Options for a single input request.
#[derive(Debug, Clone, Default)]
pub struct InputOpts {
    /// Stable identifier for this input; scriptable UIs key answers on it.
    pub id: String,
    /// Short query shown as the prompt line.
    pub query: String,
    /// Free-form description printed before the prompt.
    pub description: String,
    /// Whether the typed value should be masked.
    pub secret: bool,
}

impl InputOpts {
    /// Create input options with an id and a query.
    pub fn new(id: impl Into<String>, query: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            query: query.into(),
            ..Self::default()
        }
    }

    /// Attach a description printed before the prompt.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Mask the typed value.
    pub fn secret(mut self) -> Self {
        self.secret = true;
        self
    }
}

/// The user-interface capability set.
#[async_trait]
pub trait Ui: Send + Sync {
    /// Print a section header.
    fn header(&self, text: &str);

    /// Print an informational message.
    fn message(&self, text: &str);

    /// Ask the user for a value. Blocks until the user answers.
    async fn input(&self, opts: &InputOpts) -> Result<String, UiError>;
}

/// Interactive console implementation. Headers and messages go to stderr;
/// prompts run on the blocking pool so the runtime stays responsive.
#[derive(Debug, Default)]
pub struct ConsoleUi;

impl ConsoleUi {
    /// Create a new console UI.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Ui for ConsoleUi {
    fn header(&self, text: &str) {
        eprintln!("==> {text}");
    }

    fn message(&self, text: &str) {
        eprintln!("    {text}");
    }

    async fn input(&self, opts: &InputOpts) -> Result<String, UiError> {
        let opts = opts.clone();
        tokio::task::spawn_blocking(move || prompt(&opts))
            .await
            .map_err(|err| UiError::Prompt(err.to_string()))?
    }
}

fn prompt(opts: &InputOpts) -> Result<String, UiError> {
    if !opts.description.is_empty() {
        eprintln!();
        eprintln!("{}", opts.description);
        eprintln!();
    }

    let value = if opts.secret {
        dialoguer::Password::new()
            .with_prompt(opts.query.clone())
            .allow_empty_password(true)
            .interact()
    } else {
        dialoguer::Input::<String>::new()
            .with_prompt(opts.query.clone())
            .allow_empty(true)
            .interact_text()
    };

    value.map_err(|err| UiError::Prompt(err.to_string()))
}

/// Scripted implementation for tests and non-interactive embedding.
/// `input` answers from a fixed queue and all output is recorded.
#[derive(Debug, Default)]
pub struct PlaybackUi {
    inputs: Mutex<VecDeque<String>>,
    transcript: Mutex<Vec<String>>,
}

impl PlaybackUi {
    /// Create a playback UI answering `inputs` in order.
    pub fn new<I, S>(inputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            inputs: Mutex::new(inputs.into_iter().map(Into::into).collect()),
            transcript: Mutex::new(Vec::new()),
        }
    }

    /// Everything printed so far, in order, prefixed with `header:` or
    /// `message:`.
    pub fn transcript(&self) -> Vec<String> {
        self.transcript.lock().unwrap().clone()
    }
}

#[async_trait]
impl Ui for PlaybackUi {
    fn header(&self, text: &str) {
        self.transcript
            .lock()
            .unwrap()
            .push(format!("header: {text}"));
    }

    fn message(&self, text: &str) {
        self.transcript
            .lock()
            .unwrap()
            .push(format!("message: {text}"));
    }

    async fn input(&self, _opts: &InputOpts) -> Result<String, UiError> {
        self.inputs.lock().unwrap().pop_front().ok_or(UiError::Closed)
    }
}
