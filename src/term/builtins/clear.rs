// Clear command

use crate::term::builtins::Builtin;
use crate::term::context::TermContext;
use crate::term::result::CommandResult;
use anyhow::Result;

/// Clear the host terminal view. The engine has no screen of its own, so
/// the result carries the ANSI clear sequence for the view to interpret.
pub const CLEAR_SEQUENCE: &str = "\x1b[2J\x1b[1;1H";

pub struct ClearCommand;

impl Builtin for ClearCommand {
    fn execute(&self, _args: &[String], _ctx: &TermContext) -> Result<CommandResult> {
        Ok(CommandResult::ok(CLEAR_SEQUENCE))
    }
}
