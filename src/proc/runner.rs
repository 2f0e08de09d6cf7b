use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

/// A spawned native process. `terminate` asks nicely (SIGTERM on unix),
/// `kill` does not.
pub trait RunningProcess: Send + std::fmt::Debug {
    fn pid(&self) -> u32;
    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>>;
    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>>;
    fn wait(&mut self) -> Result<i32>;
    fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<i32>>;
    fn try_wait(&mut self) -> Result<Option<i32>>;
    fn terminate(&mut self) -> Result<()>;
    fn kill(&mut self) -> Result<()>;
}

/// Spawning capability. The engine only ever talks to this port, so hosts
/// with their own process mechanism can substitute it.
pub trait ProcessRunner: Send + Sync {
    fn spawn(
        &self,
        argv: &[String],
        cwd: &Path,
        env: &HashMap<String, String>,
    ) -> Result<Box<dyn RunningProcess>>;
}

pub struct NativeRunner;

impl ProcessRunner for NativeRunner {
    fn spawn(
        &self,
        argv: &[String],
        cwd: &Path,
        env: &HashMap<String, String>,
    ) -> Result<Box<dyn RunningProcess>> {
        if argv.is_empty() {
            bail!("Nothing to execute");
        }
        let program = &argv[0];

        let mut cmd = Command::new(program);
        cmd.args(&argv[1..]);
        cmd.current_dir(cwd);

        // The context environment is the source of truth
        cmd.env_clear();
        cmd.envs(env);

        cmd.stdin(Stdio::null());
        cmd.stdout(Stdio::piped());
        cmd.stderr(Stdio::piped());

        match cmd.spawn() {
            Ok(child) => Ok(Box::new(NativeProcess { child })),
            Err(e) => {
                if which::which(program).is_err() {
                    bail!("{}: command not found", program);
                }
                Err(e).with_context(|| format!("Failed to execute command: {}", program))
            }
        }
    }
}

#[derive(Debug)]
struct NativeProcess {
    child: Child,
}

impl RunningProcess for NativeProcess {
    fn pid(&self) -> u32 {
        self.child.id()
    }

    fn take_stdout(&mut self) -> Option<Box<dyn Read + Send>> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as Box<dyn Read + Send>)
    }

    fn take_stderr(&mut self) -> Option<Box<dyn Read + Send>> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as Box<dyn Read + Send>)
    }

    fn wait(&mut self) -> Result<i32> {
        let status = self.child.wait().context("Failed to wait for process")?;
        Ok(status.code().unwrap_or(1))
    }

    fn wait_timeout(&mut self, timeout: Duration) -> Result<Option<i32>> {
        let status = self
            .child
            .wait_timeout(timeout)
            .context("Failed to wait for process")?;
        Ok(status.map(|s| s.code().unwrap_or(1)))
    }

    fn try_wait(&mut self) -> Result<Option<i32>> {
        let status = self.child.try_wait().context("Failed to poll process")?;
        Ok(status.map(|s| s.code().unwrap_or(1)))
    }

    fn terminate(&mut self) -> Result<()> {
        #[cfg(unix)]
        {
            // SIGTERM first for graceful shutdown; kill() escalates later.
            let pid = self.child.id() as i32;
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
            Ok(())
        }
        #[cfg(not(unix))]
        {
            self.kill()
        }
    }

    fn kill(&mut self) -> Result<()> {
        match self.child.kill() {
            Ok(()) => Ok(()),
            // Already exited
            Err(e) if e.kind() == std::io::ErrorKind::InvalidInput => Ok(()),
            Err(e) => Err(e).context("Failed to kill process"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env;
    use std::io::Read;

    fn argv(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|s| s.to_string()).collect()
    }

    fn base_env() -> HashMap<String, String> {
        env::vars().collect()
    }

    #[test]
    fn test_spawn_unknown_command_fails() {
        let runner = NativeRunner;
        let err = runner
            .spawn(
                &argv(&["pavterm_test_no_such_binary"]),
                &env::current_dir().unwrap(),
                &base_env(),
            )
            .unwrap_err();
        assert!(err.to_string().contains("command not found"));
    }

    #[test]
    fn test_spawn_empty_argv_fails() {
        let runner = NativeRunner;
        assert!(
            runner
                .spawn(&[], &env::current_dir().unwrap(), &base_env())
                .is_err()
        );
    }

    #[test]
    fn test_wait_and_capture() {
        if cfg!(unix) {
            let runner = NativeRunner;
            let mut process = runner
                .spawn(
                    &argv(&["echo", "hello"]),
                    &env::current_dir().unwrap(),
                    &base_env(),
                )
                .unwrap();
            let mut out = String::new();
            process
                .take_stdout()
                .unwrap()
                .read_to_string(&mut out)
                .unwrap();
            assert_eq!(process.wait().unwrap(), 0);
            assert_eq!(out.trim(), "hello");
        }
    }

    #[test]
    fn test_nonzero_exit_code() {
        if cfg!(unix) {
            let runner = NativeRunner;
            let mut process = runner
                .spawn(
                    &argv(&["sh", "-c", "exit 3"]),
                    &env::current_dir().unwrap(),
                    &base_env(),
                )
                .unwrap();
            assert_eq!(process.wait().unwrap(), 3);
        }
    }

    #[test]
    fn test_terminate_then_wait() {
        if cfg!(unix) {
            let runner = NativeRunner;
            let mut process = runner
                .spawn(
                    &argv(&["sleep", "30"]),
                    &env::current_dir().unwrap(),
                    &base_env(),
                )
                .unwrap();
            process.terminate().unwrap();
            let code = process.wait_timeout(Duration::from_secs(3)).unwrap();
            assert!(code.is_some());
        }
    }
}
