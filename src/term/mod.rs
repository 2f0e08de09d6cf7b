pub mod builtins;
pub mod context;
pub mod parser;
pub mod result;


use crate::config::TermConfig;
use crate::errlog::{ErrorEntry, ErrorLogger};
use crate::history::HistoryStore;
use crate::proc::launcher::{INVALID_ID, Launcher};
use crate::proc::registry::{ProcessRegistry, ProcessSnapshot};
use crate::proc::runner::{NativeRunner, ProcessRunner};
use crate::storage::{FileStorage, Storage};
use anyhow::Result;
use self::builtins::{Builtin, register_all_builtins};
use self::context::TermContext;
use self::parser::{ParsedCommand, parse_command_line};
use self::result::CommandResult;
use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Instant;

/// The terminal engine. Failures of every kind come back as values; this
/// boundary never panics or propagates errors to the host.
#[derive(Clone)]
pub struct Terminal {
    ctx: TermContext,
    builtins: Arc<HashMap<&'static str, Box<dyn Builtin>>>,
    launcher: Launcher,
}

impl Terminal {
    pub fn new(config: TermConfig) -> Result<Self> {
        let history_store = FileStorage::new(&config.history_file);
        let error_store = FileStorage::new(&config.error_log_file);
        Self::with_storage(config, Box::new(history_store), Box::new(error_store))
    }

    /// Construction with injected stores, for hosts (and tests) that keep
    /// persistence somewhere other than plain files.
    pub fn with_storage(
        config: TermConfig,
        history_store: Box<dyn Storage>,
        error_store: Box<dyn Storage>,
    ) -> Result<Self> {
        Self::with_runner(config, history_store, error_store, Arc::new(NativeRunner))
    }

    pub fn with_runner(
        config: TermConfig,
        history_store: Box<dyn Storage>,
        error_store: Box<dyn Storage>,
        runner: Arc<dyn ProcessRunner>,
    ) -> Result<Self> {
        let errors = Arc::new(ErrorLogger::new(
            error_store,
            config.error_window,
            config.rotate_bytes(),
        ));
        let history = Arc::new(Mutex::new(HistoryStore::load(
            history_store,
            config.history_limit,
        )?));

        let bounds = config.kill_bounds();
        let registry = ProcessRegistry::new(bounds);
        let launcher = Launcher::new(
            runner,
            registry.clone(),
            errors.clone(),
            config.timeout(),
            bounds,
        );

        let cwd = match &config.cwd {
            Some(dir) => dir.clone(),
            None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };
        let mut env_vars: HashMap<String, String> = env::vars().collect();
        env_vars.extend(config.env.clone());

        let mut builtin_map = HashMap::new();
        register_all_builtins(&mut builtin_map);

        Ok(Self {
            ctx: TermContext {
                cwd,
                env: env_vars,
                history,
                registry,
                errors,
                exit_requested: Arc::new(AtomicBool::new(false)),
            },
            builtins: Arc::new(builtin_map),
            launcher,
        })
    }

    /// Runs a command to completion on the calling thread and records it
    /// in history.
    pub fn execute(&self, line: &str) -> CommandResult {
        let start = Instant::now();

        let parsed = match parse_command_line(line) {
            Ok(parsed) => parsed,
            Err(e) => {
                return CommandResult {
                    success: false,
                    stdout: String::new(),
                    stderr: e.to_string(),
                    command: line.trim().to_string(),
                    duration_ms: start.elapsed().as_millis(),
                };
            }
        };

        let mut result = match self.dispatch_builtin(&parsed) {
            Some(result) => result,
            None => self
                .launcher
                .run_foreground(&parsed, &self.ctx.cwd, &self.ctx.env),
        };
        result.command = parsed.raw.clone();
        result.duration_ms = start.elapsed().as_millis();

        self.ctx.history.lock().unwrap().add(&parsed.raw);
        result
    }

    /// Runs the command on its own OS thread and hands the result to the
    /// callback when it completes.
    pub fn execute_async<F>(&self, line: &str, callback: F) -> JoinHandle<()>
    where
        F: FnOnce(CommandResult) + Send + 'static,
    {
        let engine = self.clone();
        let line = line.to_string();
        thread::spawn(move || callback(engine.execute(&line)))
    }

    /// Launches the command as a tracked background process and returns
    /// its registry id immediately, or the -1 sentinel when it cannot be
    /// started. The command is recorded in history either way, exactly as
    /// a foreground command that fails to spawn still is.
    pub fn execute_background(&self, line: &str) -> i32 {
        let parsed = match parse_command_line(line) {
            Ok(parsed) => parsed,
            Err(_) => return INVALID_ID,
        };
        let id = self
            .launcher
            .spawn_background(&parsed, &self.ctx.cwd, &self.ctx.env);
        self.ctx.history.lock().unwrap().add(&parsed.raw);
        id
    }

    pub fn active_processes(&self) -> Vec<ProcessSnapshot> {
        self.ctx.registry.snapshot()
    }

    /// Captured (stdout, stderr) lines of a tracked background process.
    pub fn process_output(&self, id: i32) -> Option<(Vec<String>, Vec<String>)> {
        self.ctx.registry.output(id)
    }

    pub fn kill(&self, id: i32) -> bool {
        self.ctx.registry.kill(id)
    }

    /// Kills every tracked background process; returns how many confirmed.
    pub fn kill_all(&self) -> usize {
        self.ctx.registry.kill_all()
    }

    pub fn history_entries(&self) -> Vec<String> {
        self.ctx.history.lock().unwrap().entries()
    }

    pub fn recent_errors(&self) -> Vec<ErrorEntry> {
        self.ctx.errors.recent()
    }

    pub fn exit_requested(&self) -> bool {
        self.ctx.exit_requested.load(Ordering::SeqCst)
    }

    fn dispatch_builtin(&self, command: &ParsedCommand) -> Option<CommandResult> {
        let name = command.argv[0].to_lowercase();
        let builtin = self.builtins.get(name.as_str())?;

        // Single-word builtins match the whole command line; only kill
        // takes arguments. "clear now" falls through to the launcher.
        if name != "kill" && command.argv.len() != 1 {
            return None;
        }

        Some(match builtin.execute(&command.argv, &self.ctx) {
            Ok(result) => result,
            Err(e) => {
                let msg = format!("builtin '{}' failed: {:#}", name, e);
                self.ctx.errors.log_error("EXECUTION", &msg, None);
                CommandResult::fail(msg)
            }
        })
    }
}
