/// Outcome of one executed command, builtin or spawned. For spawned
/// processes `success` mirrors a zero exit code; builtins define their own
/// success. The engine fills `command` and `duration_ms` when the result
/// crosses its boundary.
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub command: String,
    pub duration_ms: u128,
}

impl CommandResult {
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            ..Default::default()
        }
    }

    pub fn fail(stderr: impl Into<String>) -> Self {
        Self {
            success: false,
            stderr: stderr.into(),
            ..Default::default()
        }
    }
}
