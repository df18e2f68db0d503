//! Deterministic generation client for tests and offline use.

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{Mutex, Notify};
use tokio::time::{Duration, sleep};

use parley_traits::{GenerationClient, GenerationError, GenerationResult};

const ECHO_PREFIX: &str = "echo: ";

/// Outcome of one scripted call.
#[derive(Debug, Clone)]
pub enum ScriptStepKind {
    Reply(String),
    Fail(GenerationError),
}

/// Scripted step with optional delay and release gate.
#[derive(Debug, Clone)]
pub struct ScriptStep {
    pub delay_ms: u64,
    pub gate: Option<Arc<Notify>>,
    pub kind: ScriptStepKind,
}

impl ScriptStep {
    pub fn reply(content: impl Into<String>) -> Self {
        Self {
            delay_ms: 0,
            gate: None,
            kind: ScriptStepKind::Reply(content.into()),
        }
    }

    pub fn fail(error: GenerationError) -> Self {
        Self {
            delay_ms: 0,
            gate: None,
            kind: ScriptStepKind::Fail(error),
        }
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    /// Hold the step until `gate` is notified.
    pub fn gated(mut self, gate: Arc<Notify>) -> Self {
        self.gate = Some(gate);
        self
    }
}

/// Generation client driven by scripted steps.
///
/// With an empty script it echoes the utterance from the prompt's last
/// `User:` line.
#[derive(Debug, Clone, Default)]
pub struct ScriptedGenerationClient {
    model: String,
    script: Arc<Mutex<VecDeque<ScriptStep>>>,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl ScriptedGenerationClient {
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::new())),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn from_steps(model: impl Into<String>, steps: Vec<ScriptStep>) -> Self {
        Self {
            model: model.into(),
            script: Arc::new(Mutex::new(VecDeque::from(steps))),
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Prompts received so far, in call order.
    pub async fn prompts(&self) -> Vec<String> {
        self.prompts.lock().await.clone()
    }

    async fn next_step(&self) -> Option<ScriptStep> {
        self.script.lock().await.pop_front()
    }

    fn echo(prompt: &str) -> String {
        let utterance = prompt
            .lines()
            .rev()
            .find_map(|line| line.strip_prefix("User: "))
            .unwrap_or(prompt);
        format!("{ECHO_PREFIX}{utterance}")
    }
}

#[async_trait]
impl GenerationClient for ScriptedGenerationClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> GenerationResult<String> {
        self.prompts.lock().await.push(prompt.to_string());

        let Some(step) = self.next_step().await else {
            return Ok(Self::echo(prompt));
        };

        if step.delay_ms > 0 {
            sleep(Duration::from_millis(step.delay_ms)).await;
        }

        if let Some(gate) = step.gate {
            gate.notified().await;
        }

        match step.kind {
            ScriptStepKind::Reply(content) => Ok(content),
            ScriptStepKind::Fail(error) => Err(error),
        }
    }
}
