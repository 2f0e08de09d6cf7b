// Ps command

use crate::term::builtins::Builtin;
use crate::term::context::TermContext;
use crate::term::result::CommandResult;
use anyhow::Result;

pub struct PsCommand;

impl Builtin for PsCommand {
    fn execute(&self, _args: &[String], ctx: &TermContext) -> Result<CommandResult> {
        let mut lines = vec![format!("{:>4}  {:>8}  {}", "ID", "ELAPSED", "COMMAND")];
        for snapshot in ctx.registry.snapshot() {
            lines.push(format!(
                "{:>4}  {:>7}s  {}",
                snapshot.id, snapshot.elapsed_secs, snapshot.command
            ));
        }
        Ok(CommandResult::ok(lines.join("\n")))
    }
}
