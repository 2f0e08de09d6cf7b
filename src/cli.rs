use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pterm", version, about = "Pavterm: Embeddable Command Terminal")]
pub struct Cli {
    /// Working directory for executed commands
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Directory holding pterm.toml and .env
    #[arg(long, default_value = ".")]
    pub config_dir: PathBuf,

    /// Execute a single command and exit
    #[arg(short = 'c', long = "command")]
    pub command: Option<String>,
}
