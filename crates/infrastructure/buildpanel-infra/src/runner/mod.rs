use std::process::Stdio;
use std::sync::Arc;

use buildpanel_core::{AppId, CommandId, CommandStatus, CommandUpdateEvent, EventSink};
use camino::{Utf8Path, Utf8PathBuf};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tokio::runtime::Handle;
use tracing::{debug, warn};

pub mod decode;
pub mod platform;

use crate::runner::decode::Utf8ChunkDecoder;
use crate::runner::platform::ShellInvocation;

/// Contract violations caught before anything is spawned. Operational failures
/// (spawn errors, non-zero exits) are reported as events instead.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("Script is empty")]
    EmptyScript,
    #[error("Working directory must be absolute: {0}")]
    RelativeWorkingDir(Utf8PathBuf),
}

/// Spawns shell commands and streams their lifecycle into an [`EventSink`].
///
/// Each call to [`ProcessRunner::run`] is independent: there is no queue, no
/// concurrency limit and no cancellation.
pub struct ProcessRunner<E> {
    sink: Arc<E>,
    handle: Handle,
}

impl<E> Clone for ProcessRunner<E> {
    fn clone(&self) -> Self {
        Self {
            sink: self.sink.clone(),
            handle: self.handle.clone(),
        }
    }
}

impl<E: EventSink> ProcessRunner<E> {
    pub fn new(sink: E, handle: Handle) -> Self {
        Self {
            sink: Arc::new(sink),
            handle,
        }
    }

    /// Start `script` in `cwd` and return without waiting for it.
    ///
    /// Emits the `"> script\n"` echo before spawning, then one `Running` event
    /// per chunk of combined stdout/stderr, then exactly one terminal event.
    pub fn run(
        &self,
        app_id: AppId,
        command_id: CommandId,
        cwd: &Utf8Path,
        script: &str,
    ) -> Result<(), RunError> {
        if script.trim().is_empty() {
            return Err(RunError::EmptyScript);
        }
        if !cwd.is_absolute() {
            return Err(RunError::RelativeWorkingDir(cwd.to_owned()));
        }

        let emitter = RunEmitter {
            sink: self.sink.clone(),
            app_id,
            command_id,
        };

        debug!(
            app_id = %emitter.app_id,
            command_id = %emitter.command_id,
            "Running command {:?} in {}",
            script,
            cwd
        );
        emitter.running(format!("> {script}\n"));

        let shell = ShellInvocation::for_script(script);
        let mut cmd = Command::new(shell.program);
        cmd.args(&shell.args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        // Child reaping and pipe I/O need the runtime's reactor.
        let _guard = self.handle.enter();
        let child = match cmd.spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!(
                    app_id = %emitter.app_id,
                    command_id = %emitter.command_id,
                    "Command failed to start: {e}"
                );
                emitter.finish(
                    CommandStatus::Error,
                    format!("\nFailed to start process: {e}\n"),
                );
                return Ok(());
            }
        };

        self.handle.spawn(pump(child, emitter));
        Ok(())
    }
}

struct RunEmitter<E> {
    sink: Arc<E>,
    app_id: AppId,
    command_id: CommandId,
}

impl<E: EventSink> RunEmitter<E> {
    fn running(&self, output: String) {
        self.emit(CommandStatus::Running, output);
    }

    fn finish(&self, status: CommandStatus, output: String) {
        self.emit(status, output);
    }

    fn emit(&self, status: CommandStatus, output: String) {
        self.sink.publish(CommandUpdateEvent::new(
            self.app_id.clone(),
            self.command_id.clone(),
            status,
            output,
        ));
    }
}

struct Pipe<R> {
    reader: Option<R>,
    buf: Vec<u8>,
    decoder: Utf8ChunkDecoder,
}

impl<R: AsyncRead + Unpin> Pipe<R> {
    fn new(reader: Option<R>) -> Self {
        Self {
            reader,
            buf: vec![0; buildpanel_config::READ_BUFFER_BYTES],
            decoder: Utf8ChunkDecoder::new(),
        }
    }

    fn is_open(&self) -> bool {
        self.reader.is_some()
    }

    /// Next decoded chunk. `None` means nothing printable arrived (partial
    /// character, or the pipe just closed with nothing held back).
    async fn next_chunk(&mut self) -> Option<String> {
        let reader = self.reader.as_mut()?;
        let text = match reader.read(&mut self.buf).await {
            Ok(0) => {
                self.reader = None;
                self.decoder.finish()
            }
            Ok(n) => self.decoder.push(&self.buf[..n]),
            Err(e) => {
                warn!("Failed to read command output: {e}");
                self.reader = None;
                self.decoder.finish()
            }
        };
        (!text.is_empty()).then_some(text)
    }
}

async fn pump<E: EventSink>(mut child: Child, emitter: RunEmitter<E>) {
    let mut stdout = Pipe::new(child.stdout.take());
    let mut stderr = Pipe::new(child.stderr.take());

    // Both pipes must hit EOF before the terminal event so no chunk trails it.
    while stdout.is_open() || stderr.is_open() {
        let chunk = tokio::select! {
            chunk = stdout.next_chunk(), if stdout.is_open() => chunk,
            chunk = stderr.next_chunk(), if stderr.is_open() => chunk,
        };
        if let Some(text) = chunk {
            emitter.running(text);
        }
    }

    match child.wait().await {
        Ok(status) => {
            // Killed by a signal: no exit code.
            let code = status.code().unwrap_or(-1);
            let outcome = if code == 0 {
                CommandStatus::Success
            } else {
                CommandStatus::Error
            };
            debug!(
                app_id = %emitter.app_id,
                command_id = %emitter.command_id,
                "Command finished with code {code}. Status: {outcome}"
            );
            emitter.finish(
                outcome,
                format!("\nProcess finished with exit code {code}.\n"),
            );
        }
        Err(e) => {
            warn!(
                app_id = %emitter.app_id,
                command_id = %emitter.command_id,
                "Failed to wait for command: {e}"
            );
            emitter.finish(
                CommandStatus::Error,
                format!("\nFailed to wait for process: {e}\n"),
            );
        }
    }
}
