//! Subprocess publisher
//!
//! Delegates the remote side effect to an external command, keeping
//! credentials and API plumbing out of the core. The candidate text is
//! piped on stdin; the command prints the external id on stdout and
//! classifies failures through its exit code.

use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::PublisherConfig;
use crate::error::{ConfigError, PublishError, Result};
use crate::publisher::Publisher;

/// Exit code meaning "remote already has this content"
pub const EXIT_DUPLICATE: i32 = 2;
/// Exit code meaning "rate limited, try again later"
pub const EXIT_RATE_LIMITED: i32 = 3;

#[derive(Debug)]
pub struct CommandPublisher {
    argv: Vec<String>,
}

impl CommandPublisher {
    pub fn new(argv: Vec<String>) -> Result<Self> {
        if argv.is_empty() {
            return Err(ConfigError::MissingField("publisher.command".to_string()).into());
        }
        Ok(Self { argv })
    }

    pub fn from_config(config: &PublisherConfig) -> Result<Self> {
        let argv = config
            .command
            .clone()
            .ok_or_else(|| ConfigError::MissingField("publisher.command".to_string()))?;
        Self::new(argv)
    }
}

#[async_trait]
impl Publisher for CommandPublisher {
    async fn publish(&self, text: &str) -> Result<String> {
        let program = &self.argv[0];
        debug!(command = %program, "spawning publisher command");

        let mut child = tokio::process::Command::new(program)
            .args(&self.argv[1..])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| PublishError::Transient(format!("failed to spawn {}: {}", program, e)))?;

        // stdin handle exists because it was just piped
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(text.as_bytes())
                .await
                .map_err(|e| PublishError::Transient(format!("failed to write stdin: {}", e)))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| PublishError::Transient(format!("publisher command failed: {}", e)))?;

        let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();

        match output.status.code() {
            Some(0) => {
                if stdout.is_empty() {
                    Err(PublishError::Transient(
                        "publisher command printed no external id".to_string(),
                    )
                    .into())
                } else {
                    // First stdout line is the id; anything else is noise
                    let id = stdout.lines().next().unwrap_or_default().trim().to_string();
                    Ok(id)
                }
            }
            Some(EXIT_DUPLICATE) => Err(PublishError::DuplicateRejected(or_default(
                stderr,
                "remote reported duplicate content",
            ))
            .into()),
            Some(EXIT_RATE_LIMITED) => {
                Err(PublishError::RateLimited(or_default(stderr, "remote rate limit")).into())
            }
            Some(code) => Err(PublishError::Transient(format!(
                "publisher command exited with {}: {}",
                code,
                or_default(stderr, "no stderr")
            ))
            .into()),
            None => Err(PublishError::Transient(
                "publisher command terminated by signal".to_string(),
            )
            .into()),
        }
    }

    fn name(&self) -> &str {
        "command"
    }
}

fn or_default(message: String, fallback: &str) -> String {
    if message.is_empty() {
        fallback.to_string()
    } else {
        message
    }
}
