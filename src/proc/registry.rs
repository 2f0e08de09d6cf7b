use crate::proc::runner::RunningProcess;
use chrono::{DateTime, Local};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Wait bounds for the graceful-then-forced termination sequence.
#[derive(Debug, Clone, Copy)]
pub struct KillBounds {
    pub grace: Duration,
    pub force: Duration,
}

impl Default for KillBounds {
    fn default() -> Self {
        Self {
            grace: Duration::from_secs(3),
            force: Duration::from_secs(1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProcessState {
    Running,
    Terminating,
    Terminated,
}

/// In-memory record of a tracked background process. Owned by the registry
/// from launch until removal; the reader threads only hold clones of the
/// output buffer handles.
pub struct ProcessHandle {
    pub id: i32,
    pub command: String,
    pub started_at: DateTime<Local>,
    started: Instant,
    state: ProcessState,
    process: Box<dyn RunningProcess>,
    stdout: Arc<Mutex<Vec<String>>>,
    stderr: Arc<Mutex<Vec<String>>>,
}

/// Owned copy of a handle's visible fields. Queries never expose the live
/// handle.
#[derive(Debug, Clone)]
pub struct ProcessSnapshot {
    pub id: i32,
    pub command: String,
    pub started_at: DateTime<Local>,
    pub elapsed_secs: u64,
    pub running: bool,
}

#[derive(Clone)]
pub struct ProcessRegistry {
    inner: Arc<Mutex<HashMap<i32, ProcessHandle>>>,
    next_id: Arc<AtomicI32>,
    bounds: KillBounds,
}

impl ProcessRegistry {
    pub fn new(bounds: KillBounds) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            next_id: Arc::new(AtomicI32::new(1)),
            bounds,
        }
    }

    /// Registers a freshly spawned process and returns its id. Ids are
    /// unique and strictly increasing in registration order.
    pub fn register(
        &self,
        command: &str,
        process: Box<dyn RunningProcess>,
        stdout: Arc<Mutex<Vec<String>>>,
        stderr: Arc<Mutex<Vec<String>>>,
    ) -> i32 {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let handle = ProcessHandle {
            id,
            command: command.to_string(),
            started_at: Local::now(),
            started: Instant::now(),
            state: ProcessState::Running,
            process,
            stdout,
            stderr,
        };
        self.inner.lock().unwrap().insert(id, handle);
        id
    }

    /// Snapshot of the live handles, oldest id first. Handles whose process
    /// has exited are reaped here, so cleanup happens on query.
    pub fn snapshot(&self) -> Vec<ProcessSnapshot> {
        let mut map = self.inner.lock().unwrap();

        let mut dead = Vec::new();
        for (id, handle) in map.iter_mut() {
            if let Ok(Some(_)) = handle.process.try_wait() {
                handle.state = ProcessState::Terminated;
                dead.push(*id);
            }
        }
        for id in dead {
            map.remove(&id);
        }

        let mut list: Vec<ProcessSnapshot> = map
            .values()
            .map(|h| ProcessSnapshot {
                id: h.id,
                command: h.command.clone(),
                started_at: h.started_at,
                elapsed_secs: h.started.elapsed().as_secs(),
                running: h.state == ProcessState::Running,
            })
            .collect();
        list.sort_by_key(|s| s.id);
        list
    }

    /// Captured output of a tracked process so far: (stdout, stderr) lines.
    pub fn output(&self, id: i32) -> Option<(Vec<String>, Vec<String>)> {
        let map = self.inner.lock().unwrap();
        let handle = map.get(&id)?;
        Some((
            handle.stdout.lock().unwrap().clone(),
            handle.stderr.lock().unwrap().clone(),
        ))
    }

    /// Terminates a tracked process: graceful request, bounded wait,
    /// forced kill, shorter bounded wait. The handle leaves the table as
    /// soon as termination is underway; the return value is true only when
    /// an exit was actually observed within the bounds. Unknown ids return
    /// false.
    pub fn kill(&self, id: i32) -> bool {
        let handle = self.inner.lock().unwrap().remove(&id);
        let Some(mut handle) = handle else {
            return false;
        };

        handle.state = ProcessState::Terminating;
        if let Err(e) = handle.process.terminate() {
            log::warn!("Failed to request termination of process {}: {}", id, e);
        }

        let mut confirmed = matches!(handle.process.wait_timeout(self.bounds.grace), Ok(Some(_)));
        if !confirmed {
            if let Err(e) = handle.process.kill() {
                log::warn!("Failed to kill process {}: {}", id, e);
            }
            confirmed = matches!(handle.process.wait_timeout(self.bounds.force), Ok(Some(_)));
        }

        handle.state = ProcessState::Terminated;
        if confirmed {
            log::info!("Process {} ({}) terminated", id, handle.command);
        } else {
            log::warn!(
                "Process {} ({}) did not confirm termination in time",
                id,
                handle.command
            );
        }
        confirmed
    }

    /// Kills every tracked process; returns how many confirmed exit.
    pub fn kill_all(&self) -> usize {
        let ids: Vec<i32> = self.inner.lock().unwrap().keys().copied().collect();
        ids.into_iter().filter(|id| self.kill(*id)).count()
    }

    pub fn len(&self) -> usize {
        self.inner.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().unwrap().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proc::reader::spawn_reader;
    use crate::proc::runner::{NativeRunner, ProcessRunner};
    use std::env;

    fn registry() -> ProcessRegistry {
        ProcessRegistry::new(KillBounds::default())
    }

    fn spawn_tracked(reg: &ProcessRegistry, parts: &[&str]) -> i32 {
        let argv: Vec<String> = parts.iter().map(|s| s.to_string()).collect();
        let vars: HashMap<String, String> = env::vars().collect();
        let mut process = NativeRunner
            .spawn(&argv, &env::current_dir().unwrap(), &vars)
            .unwrap();
        let stdout = Arc::new(Mutex::new(Vec::new()));
        let stderr = Arc::new(Mutex::new(Vec::new()));
        if let Some(s) = process.take_stdout() {
            spawn_reader(s, stdout.clone());
        }
        if let Some(s) = process.take_stderr() {
            spawn_reader(s, stderr.clone());
        }
        reg.register(&parts.join(" "), process, stdout, stderr)
    }

    #[test]
    fn test_kill_unknown_id_is_false() {
        let reg = registry();
        assert!(!reg.kill(424242));
    }

    #[test]
    fn test_ids_strictly_increase() {
        if cfg!(unix) {
            let reg = registry();
            let a = spawn_tracked(&reg, &["sleep", "5"]);
            let b = spawn_tracked(&reg, &["sleep", "5"]);
            let c = spawn_tracked(&reg, &["sleep", "5"]);
            assert!(a < b && b < c);
            reg.kill_all();
        }
    }

    #[test]
    fn test_kill_removes_handle() {
        if cfg!(unix) {
            let reg = registry();
            let id = spawn_tracked(&reg, &["sleep", "30"]);
            assert_eq!(reg.snapshot().len(), 1);
            assert!(reg.kill(id));
            assert!(reg.snapshot().is_empty());
            assert!(!reg.kill(id));
        }
    }

    #[test]
    fn test_exited_process_reaped_on_query() {
        if cfg!(unix) {
            let reg = registry();
            spawn_tracked(&reg, &["true"]);
            let deadline = Instant::now() + Duration::from_secs(2);
            loop {
                if reg.snapshot().is_empty() {
                    break;
                }
                assert!(Instant::now() < deadline, "process never reaped");
                std::thread::sleep(Duration::from_millis(20));
            }
        }
    }

    #[test]
    fn test_output_captured() {
        if cfg!(unix) {
            let reg = registry();
            let id = spawn_tracked(&reg, &["sh", "-c", "echo captured; sleep 2"]);
            let deadline = Instant::now() + Duration::from_secs(2);
            loop {
                let (out, _) = reg.output(id).expect("handle present");
                if out.iter().any(|l| l.contains("captured")) {
                    break;
                }
                assert!(Instant::now() < deadline, "output never captured");
                std::thread::sleep(Duration::from_millis(20));
            }
            reg.kill(id);
        }
    }
}
