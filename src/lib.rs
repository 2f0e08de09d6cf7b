//! Embeddable command-execution terminal: foreground and tracked
//! background processes, built-in commands, persistent history, and
//! heuristic failure diagnosis.

pub mod classify;
pub mod config;
pub mod errlog;
pub mod history;
pub mod proc;
pub mod storage;
pub mod term;

pub use classify::{ErrorAnalysis, analyze, suggest_solutions};
pub use config::{TermConfig, load_config};
pub use errlog::ErrorEntry;
pub use proc::registry::ProcessSnapshot;
pub use term::Terminal;
pub use term::result::CommandResult;
