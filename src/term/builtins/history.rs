// History command

use crate::term::builtins::Builtin;
use crate::term::context::TermContext;
use crate::term::result::CommandResult;
use anyhow::Result;

pub struct HistoryCommand;

impl Builtin for HistoryCommand {
    fn execute(&self, _args: &[String], ctx: &TermContext) -> Result<CommandResult> {
        let history = ctx.history.lock().unwrap();
        let rendered = history
            .entries()
            .iter()
            .enumerate()
            .map(|(i, cmd)| format!("{:>4}  {}", i + 1, cmd))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(CommandResult::ok(rendered))
    }
}
