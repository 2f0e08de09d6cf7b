// Help command

use crate::term::builtins::Builtin;
use crate::term::context::TermContext;
use crate::term::result::CommandResult;
use anyhow::Result;

const HELP_TEXT: &str = "\
Built-in commands:
  clear        Clear the terminal view
  exit, quit   End the terminal session
  history      Show recent commands (oldest first)
  help         Show this help
  ps           List tracked background processes
  kill <id>    Terminate a background process by id

Append & to run a command in the background.
Anything else is executed as an external command.";

pub struct HelpCommand;

impl Builtin for HelpCommand {
    fn execute(&self, _args: &[String], _ctx: &TermContext) -> Result<CommandResult> {
        Ok(CommandResult::ok(HELP_TEXT))
    }
}
