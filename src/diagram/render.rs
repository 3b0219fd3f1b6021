//! Renderer seam and the mermaid CLI renderer.

use std::path::PathBuf;
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::RenderError;

/// Turns diagram source into SVG markup, or a syntax error message.
#[async_trait]
pub trait Renderer: Send + Sync {
    async fn render(&self, source: &str) -> Result<String, RenderError>;
}

/// Shells out to the mermaid CLI (`mmdc`), source on stdin, SVG on stdout.
#[derive(Debug, Clone)]
pub struct CommandRenderer {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandRenderer {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: ["-i", "-", "-o", "-", "-e", "svg", "-q"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }

    /// Replace the argument list.
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }
}

impl Default for CommandRenderer {
    fn default() -> Self {
        Self::new("mmdc")
    }
}

#[async_trait]
impl Renderer for CommandRenderer {
    async fn render(&self, source: &str) -> Result<String, RenderError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                RenderError::Unavailable(format!("{}: {}", self.program.display(), e))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            // An early exit closes the pipe; the exit status reports why.
            if let Err(e) = stdin.write_all(source.as_bytes()).await {
                if e.kind() != std::io::ErrorKind::BrokenPipe {
                    return Err(RenderError::Unavailable(e.to_string()));
                }
            }
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| RenderError::Unavailable(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            debug!(status = %output.status, "Diagram renderer rejected source");
            let message = if stderr.is_empty() {
                format!("renderer exited with {}", output.status)
            } else {
                stderr
            };
            return Err(RenderError::Syntax(message));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
