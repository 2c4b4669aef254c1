// src/exec/shell.rs

//! Reference executor that runs a vertex as an OS process.

use std::process::Stdio;

use anyhow::{Context, Result, anyhow, bail};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, error, info, warn};

use crate::exec::executor::{BoxFuture, ExecResult, Executor};
use crate::livelog::LogSink;
use crate::types::VertexConfig;

/// Runs `command[0]` with `command[1..]` as arguments.
///
/// - `params` are exported as additional environment variables.
/// - A `payload` is decoded and written to the child's stdin. With an empty
///   `command`, the payload is run as a script by the `language` interpreter
///   (default `sh`).
/// - Each stdout line goes to the [`LogSink`]; stderr is logged at debug.
/// - `timeout` kills the child and fails the vertex.
/// - A non-zero exit fails the vertex and is also reported on the sink's
///   error channel.
#[derive(Debug, Clone)]
pub struct ShellExecutor {
    default_language: String,
}

impl ShellExecutor {
    pub fn new() -> Self {
        Self {
            default_language: "sh".to_string(),
        }
    }

    /// Interpreter used for payload-only vertices that set no `language`.
    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }
}

impl Default for ShellExecutor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor for ShellExecutor {
    fn execute<'a>(
        &'a self,
        name: &'a str,
        config: &'a VertexConfig,
        log: LogSink,
    ) -> BoxFuture<'a, ExecResult> {
        Box::pin(async move {
            let result = self.run_process(name, config, &log).await;
            if let Err(err) = &result {
                error!(vertex = %name, error = %format!("{err:#}"), "vertex process error");
                log.send_error(anyhow!("vertex '{name}': {err:#}")).await;
            }
            result
        })
    }
}

impl ShellExecutor {
    async fn run_process(&self, name: &str, config: &VertexConfig, log: &LogSink) -> Result<()> {
        let mut cmd = self.build_command(config)?;

        let stdin_bytes = match &config.payload {
            Some(payload) => Some(
                payload
                    .decode()
                    .with_context(|| format!("decoding payload for vertex '{name}'"))?,
            ),
            None => None,
        };

        cmd.envs(config.params.iter().map(|p| (p.name.as_str(), p.value.as_str())))
            .stdin(if stdin_bytes.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        info!(
            vertex = %name,
            command = ?config.command,
            language = ?config.language,
            "starting vertex process"
        );

        let mut child = cmd
            .spawn()
            .with_context(|| format!("spawning process for vertex '{name}'"))?;

        if let (Some(bytes), Some(mut stdin)) = (stdin_bytes, child.stdin.take()) {
            let vertex = name.to_string();
            tokio::spawn(async move {
                if let Err(e) = stdin.write_all(&bytes).await {
                    warn!(vertex = %vertex, error = %e, "failed to write payload to stdin");
                }
                // Dropping stdin closes the pipe so script interpreters see EOF.
            });
        }

        if let Some(stderr) = child.stderr.take() {
            let vertex = name.to_string();
            tokio::spawn(async move {
                let mut segments = BufReader::new(stderr).split(b'\n');
                loop {
                    match segments.next_segment().await {
                        Ok(Some(bytes)) => {
                            debug!(vertex = %vertex, "stderr: {}", output_line(&bytes))
                        }
                        Ok(None) => break,
                        Err(e) => {
                            warn!(vertex = %vertex, error = %e, "failed to read stderr");
                            break;
                        }
                    }
                }
            });
        }

        let stdout = child
            .stdout
            .take()
            .context("child stdout was not captured")?;

        let mut writer = log.writer(name);
        let work = async {
            let mut segments = BufReader::new(stdout).split(b'\n');
            while let Some(bytes) = segments
                .next_segment()
                .await
                .with_context(|| format!("reading stdout of vertex '{name}'"))?
            {
                writer.write(output_line(&bytes)).await;
            }
            child
                .wait()
                .await
                .with_context(|| format!("waiting for process of vertex '{name}'"))
        };

        let status = match config.timeout {
            Some(limit) => {
                let outcome = tokio::time::timeout(limit, work).await;
                match outcome {
                    Ok(status) => status?,
                    Err(_) => {
                        warn!(vertex = %name, ?limit, "vertex timed out; killing process");
                        if let Err(e) = child.kill().await {
                            warn!(vertex = %name, error = %e, "failed to kill timed out process");
                        }
                        bail!("vertex '{name}' timed out after {limit:?}");
                    }
                }
            }
            None => work.await?,
        };

        let code = status.code().unwrap_or(-1);
        info!(
            vertex = %name,
            exit_code = code,
            success = status.success(),
            lines = writer.written(),
            "vertex process exited"
        );

        if !status.success() {
            bail!("process for vertex '{name}' exited with code {code}");
        }

        Ok(())
    }

    fn build_command(&self, config: &VertexConfig) -> Result<Command> {
        match config.command.split_first() {
            Some((program, args)) => {
                let mut cmd = Command::new(program);
                cmd.args(args);
                Ok(cmd)
            }
            None if config.payload.is_some() => {
                let interpreter = config
                    .language
                    .as_deref()
                    .unwrap_or(self.default_language.as_str());
                Ok(Command::new(interpreter))
            }
            None => bail!("vertex has neither a command nor a payload to run"),
        }
    }
}

/// One line of process output, without its `\r`, with invalid UTF-8 replaced.
fn output_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
