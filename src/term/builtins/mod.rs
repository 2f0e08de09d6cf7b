pub mod clear;
pub mod exit;
pub mod help;
pub mod history;
pub mod kill;
pub mod ps;

use crate::term::context::TermContext;
use crate::term::result::CommandResult;
use anyhow::Result;
use std::collections::HashMap;

/// A command answered inside the engine, without spawning a process.
pub trait Builtin: Send + Sync {
    fn execute(&self, args: &[String], ctx: &TermContext) -> Result<CommandResult>;
}

/// Helper to register all built-in commands at once
pub fn register_all_builtins(registry: &mut HashMap<&'static str, Box<dyn Builtin>>) {
    registry.insert("clear", Box::new(clear::ClearCommand));
    registry.insert("exit", Box::new(exit::ExitCommand));
    registry.insert("quit", Box::new(exit::ExitCommand));
    registry.insert("history", Box::new(history::HistoryCommand));
    registry.insert("help", Box::new(help::HelpCommand));
    registry.insert("ps", Box::new(ps::PsCommand));
    registry.insert("kill", Box::new(kill::KillCommand));
}
