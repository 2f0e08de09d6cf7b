// Exit command

use crate::term::builtins::Builtin;
use crate::term::context::TermContext;
use crate::term::result::CommandResult;
use anyhow::Result;
use std::sync::atomic::Ordering;

/// Handles both `exit` and `quit`. The engine never tears the host down
/// itself; it raises the shutdown flag and lets the caller decide.
pub struct ExitCommand;

impl Builtin for ExitCommand {
    fn execute(&self, _args: &[String], ctx: &TermContext) -> Result<CommandResult> {
        ctx.exit_requested.store(true, Ordering::SeqCst);
        Ok(CommandResult::ok(""))
    }
}
