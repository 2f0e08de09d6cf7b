use crate::errlog::ErrorLogger;
use crate::history::HistoryStore;
use crate::proc::registry::ProcessRegistry;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

/// Shared engine state handed to builtins. Cheap to clone; everything
/// mutable sits behind shared handles.
#[derive(Clone)]
pub struct TermContext {
    pub cwd: PathBuf,
    pub env: HashMap<String, String>,
    pub history: Arc<Mutex<HistoryStore>>,
    pub registry: ProcessRegistry,
    pub errors: Arc<ErrorLogger>,
    pub exit_requested: Arc<AtomicBool>,
}
