// Kill command

use crate::term::builtins::Builtin;
use crate::term::context::TermContext;
use crate::term::result::CommandResult;
use anyhow::Result;

const USAGE: &str = "usage: kill <id>";

pub struct KillCommand;

impl Builtin for KillCommand {
    fn execute(&self, args: &[String], ctx: &TermContext) -> Result<CommandResult> {
        // args[0] is "kill". args[1] is the process id.
        let Some(id_arg) = args.get(1) else {
            return Ok(CommandResult::fail(USAGE));
        };
        let Ok(id) = id_arg.parse::<i32>() else {
            return Ok(CommandResult::fail(format!(
                "{} (got '{}', expected an integer)",
                USAGE, id_arg
            )));
        };

        if ctx.registry.kill(id) {
            Ok(CommandResult::ok(format!("Process {} terminated", id)))
        } else {
            Ok(CommandResult::fail(format!(
                "Could not terminate process {}: unknown id or termination unconfirmed",
                id
            )))
        }
    }
}
