use crate::errlog::ErrorLogger;
use crate::proc::reader::{join_lines, spawn_reader};
use crate::proc::registry::{KillBounds, ProcessRegistry};
use crate::proc::runner::{ProcessRunner, RunningProcess};
use crate::term::parser::ParsedCommand;
use crate::term::result::CommandResult;
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Sentinel returned when a background spawn fails.
pub const INVALID_ID: i32 = -1;

/// Starts native processes and coordinates foreground or background
/// completion. Spawn failures never escape as errors; they become failed
/// results (foreground) or the invalid-id sentinel (background), and are
/// routed to the error log under EXECUTION.
#[derive(Clone)]
pub struct Launcher {
    runner: Arc<dyn ProcessRunner>,
    registry: ProcessRegistry,
    errors: Arc<ErrorLogger>,
    timeout: Option<Duration>,
    bounds: KillBounds,
}

impl Launcher {
    pub fn new(
        runner: Arc<dyn ProcessRunner>,
        registry: ProcessRegistry,
        errors: Arc<ErrorLogger>,
        timeout: Option<Duration>,
        bounds: KillBounds,
    ) -> Self {
        Self {
            runner,
            registry,
            errors,
            timeout,
            bounds,
        }
    }

    /// Blocks the calling thread until the process exits (or hits the
    /// configured timeout). Readers start before the wait so a child that
    /// fills an output pipe cannot deadlock against us.
    pub fn run_foreground(
        &self,
        command: &ParsedCommand,
        cwd: &Path,
        env: &HashMap<String, String>,
    ) -> CommandResult {
        let start = Instant::now();

        let mut process = match self.runner.spawn(&command.argv, cwd, env) {
            Ok(p) => p,
            Err(e) => {
                let msg = format!("{:#}", e);
                self.errors.log_error("EXECUTION", &msg, None);
                return CommandResult {
                    success: false,
                    stdout: String::new(),
                    stderr: msg,
                    command: command.raw.clone(),
                    duration_ms: start.elapsed().as_millis(),
                };
            }
        };

        let stdout_buf = Arc::new(Mutex::new(Vec::new()));
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));
        let out_reader = process.take_stdout().map(|s| spawn_reader(s, stdout_buf.clone()));
        let err_reader = process.take_stderr().map(|s| spawn_reader(s, stderr_buf.clone()));

        let exit = self.wait_bounded(process.as_mut());

        if let Some(handle) = out_reader {
            handle.join().ok();
        }
        if let Some(handle) = err_reader {
            handle.join().ok();
        }

        let stdout = join_lines(&stdout_buf);
        let mut stderr = join_lines(&stderr_buf);
        let duration_ms = start.elapsed().as_millis();

        match exit {
            Ok(code) => CommandResult {
                success: code == 0,
                stdout,
                stderr,
                command: command.raw.clone(),
                duration_ms,
            },
            Err(msg) => {
                self.errors.log_error("EXECUTION", &msg, None);
                if !stderr.is_empty() {
                    stderr.push('\n');
                }
                stderr.push_str(&msg);
                CommandResult {
                    success: false,
                    stdout,
                    stderr,
                    command: command.raw.clone(),
                    duration_ms,
                }
            }
        }
    }

    /// Spawns without blocking and returns the registry id, or INVALID_ID
    /// when the spawn fails.
    pub fn spawn_background(
        &self,
        command: &ParsedCommand,
        cwd: &Path,
        env: &HashMap<String, String>,
    ) -> i32 {
        let mut process = match self.runner.spawn(&command.argv, cwd, env) {
            Ok(p) => p,
            Err(e) => {
                self.errors.log_info(
                    "EXECUTION",
                    &format!("Background spawn failed for '{}': {:#}", command.raw, e),
                );
                return INVALID_ID;
            }
        };

        let stdout_buf = Arc::new(Mutex::new(Vec::new()));
        let stderr_buf = Arc::new(Mutex::new(Vec::new()));
        if let Some(s) = process.take_stdout() {
            spawn_reader(s, stdout_buf.clone());
        }
        if let Some(s) = process.take_stderr() {
            spawn_reader(s, stderr_buf.clone());
        }

        let id = self
            .registry
            .register(&command.raw, process, stdout_buf, stderr_buf);
        log::info!("Started background process {} ({})", id, command.raw);
        id
    }

    fn wait_bounded(&self, process: &mut dyn RunningProcess) -> Result<i32, String> {
        let Some(timeout) = self.timeout else {
            return process.wait().map_err(|e| format!("{:#}", e));
        };

        match process.wait_timeout(timeout) {
            Ok(Some(code)) => Ok(code),
            Ok(None) => {
                // Out of time: graceful request, then the hard way.
                let _ = process.terminate();
                let mut dead =
                    matches!(process.wait_timeout(self.bounds.grace), Ok(Some(_)));
                if !dead {
                    let _ = process.kill();
                    dead = matches!(process.wait_timeout(self.bounds.force), Ok(Some(_)));
                }
                if !dead {
                    log::warn!("Timed-out process did not confirm termination");
                }
                Err(format!("Command timed out after {}s", timeout.as_secs()))
            }
            Err(e) => Err(format!("{:#}", e)),
        }
    }
}
