mod cli;

use anyhow::Result;
use clap::Parser;
use cli::Cli;
use colored::*;
use log::info;
use pavterm::{CommandResult, Terminal, load_config};
use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = load_config(&cli.config_dir)?;
    if cli.cwd.is_some() {
        config.cwd = cli.cwd;
    }

    let terminal = Terminal::new(config)?;

    if let Some(command) = cli.command {
        let result = terminal.execute(&command);
        print_result(&result);
        std::process::exit(if result.success { 0 } else { 1 });
    }

    let interrupted = Arc::new(AtomicBool::new(false));
    {
        let flag = interrupted.clone();
        ctrlc::set_handler(move || flag.store(true, Ordering::SeqCst))?;
    }

    let stdin = io::stdin();
    let mut line = String::new();
    loop {
        if terminal.exit_requested() || interrupted.load(Ordering::SeqCst) {
            break;
        }

        print!("{} ", "pterm>".cyan().bold());
        io::stdout().flush()?;

        line.clear();
        if stdin.lock().read_line(&mut line)? == 0 {
            // EOF
            break;
        }
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        // Trailing & launches a tracked background process
        if let Some(stripped) = input.strip_suffix('&') {
            let id = terminal.execute_background(stripped.trim());
            if id < 0 {
                eprintln!("{} Failed to start background process.", "❌".red());
            } else {
                println!("[{}] started", id);
            }
            continue;
        }

        let result = terminal.execute(input);
        print_result(&result);
    }

    let killed = terminal.kill_all();
    if killed > 0 {
        info!("Stopped {} background process(es) on exit", killed);
    }

    Ok(())
}

fn print_result(result: &CommandResult) {
    if !result.stdout.is_empty() {
        println!("{}", result.stdout);
    }
    if !result.stderr.is_empty() {
        eprintln!("{}", result.stderr.red());
    }
    if !result.success {
        let suggestions = pavterm::suggest_solutions(&result.stderr);
        if !suggestions.is_empty() {
            eprintln!("{}", "Hints:".yellow());
            for suggestion in suggestions {
                eprintln!("  - {}", suggestion);
            }
        }
    }
}
