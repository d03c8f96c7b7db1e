//! [`CliBackend`] — an [`AiBackend`] that shells out to a local AI executable.
//!
//! The prompt is written to the child's standard input; standard output and
//! standard error are captured. Only a successful exit status with a well
//! formed envelope yields an answer.

use std::{path::PathBuf, process::Stdio, time::Duration};

use serde::Deserialize;
use tokio::{io::AsyncWriteExt as _, process::Command};
use tracing::{debug, warn};

use crate::{
  AiBackend,
  envelope::{parse_json_envelope, parse_transcript},
  error::InvokeError,
};

/// Maximum amount of stderr kept in a diagnostic.
const STDERR_SNIPPET: usize = 500;

// ─── Flavor ──────────────────────────────────────────────────────────────────

/// Which executable contract a backend speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CliFlavor {
  /// `gemini --model <m> --output-format json`; JSON envelope.
  Gemini,
  /// `codex exec --model <m> --skip-git-repo-check -`; transcript envelope.
  Codex,
}

impl CliFlavor {
  pub fn name(self) -> &'static str {
    match self {
      Self::Gemini => "gemini",
      Self::Codex => "codex",
    }
  }

  fn args(self, model: &str) -> Vec<String> {
    let args = match self {
      Self::Gemini => vec!["--model", model, "--output-format", "json"],
      Self::Codex => vec!["exec", "--model", model, "--skip-git-repo-check", "-"],
    };
    args.into_iter().map(str::to_owned).collect()
  }

  fn family_prefixes(self) -> &'static [&'static str] {
    match self {
      Self::Gemini => &["gemini"],
      Self::Codex => &["gpt", "codex", "o1", "o3", "o4"],
    }
  }

  fn parse(self, stdout: &str) -> Result<String, InvokeError> {
    let answer = match self {
      Self::Gemini => parse_json_envelope(stdout)?,
      Self::Codex => parse_transcript(stdout)?,
    };
    Ok(answer)
  }
}

// ─── Configuration ───────────────────────────────────────────────────────────

fn default_timeout_secs() -> u64 { 300 }

/// Deserialised from the `[engine.primary]` / `[engine.secondary]` tables.
#[derive(Debug, Clone, Deserialize)]
pub struct CliBackendConfig {
  pub flavor:        CliFlavor,
  /// Path to the executable; a bare name is resolved through `PATH`.
  pub program:       PathBuf,
  pub default_model: String,
  #[serde(default = "default_timeout_secs")]
  pub timeout_secs:  u64,
}

// ─── Backend ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct CliBackend {
  flavor:        CliFlavor,
  program:       PathBuf,
  default_model: String,
  timeout:       Duration,
}

impl CliBackend {
  pub fn new(config: CliBackendConfig) -> Self {
    Self {
      flavor:        config.flavor,
      program:       config.program,
      default_model: config.default_model,
      timeout:       Duration::from_secs(config.timeout_secs),
    }
  }

  async fn exchange(&self, prompt: &str, model: &str) -> Result<String, InvokeError> {
    let mut child = Command::new(&self.program)
      .args(self.flavor.args(model))
      .stdin(Stdio::piped())
      .stdout(Stdio::piped())
      .stderr(Stdio::piped())
      .kill_on_drop(true)
      .spawn()
      .map_err(|source| InvokeError::Spawn {
        program: self.program.display().to_string(),
        source,
      })?;

    let mut stdin = child.stdin.take().ok_or_else(|| {
      InvokeError::Io(std::io::Error::other("child stdin was not captured"))
    })?;

    // Feed stdin while draining the output pipes so a large prompt cannot
    // deadlock against a full stdout buffer.
    let write = async move {
      stdin.write_all(prompt.as_bytes()).await?;
      stdin.shutdown().await
    };
    let exchange = async { tokio::try_join!(write, child.wait_with_output()) };

    let (_, output) = tokio::time::timeout(self.timeout, exchange)
      .await
      .map_err(|_| InvokeError::Timeout(self.timeout))??;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(InvokeError::ExitStatus {
        code:   output.status.code(),
        stderr: stderr.chars().take(STDERR_SNIPPET).collect(),
      });
    }

    self.flavor.parse(&String::from_utf8_lossy(&output.stdout))
  }
}

impl AiBackend for CliBackend {
  fn name(&self) -> &str { self.flavor.name() }

  fn default_model(&self) -> &str { &self.default_model }

  fn owns_model(&self, model: &str) -> bool {
    self
      .flavor
      .family_prefixes()
      .iter()
      .any(|prefix| model.starts_with(prefix))
  }

  async fn invoke(&self, prompt: &str, model: &str) -> Option<String> {
    debug!(backend = self.name(), model, prompt_len = prompt.len(), "invoking AI executable");
    match self.exchange(prompt, model).await {
      Ok(answer) => Some(answer),
      Err(error) => {
        warn!(backend = self.name(), model, %error, "AI invocation produced no result");
        None
      }
    }
  }
}
