use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// File-backed construction-site task tracker with weekly PCP reports.
/// Data lives in ~/.obra unless --data-dir or OBRA_DATA_DIR says otherwise.
#[derive(Parser)]
#[command(name = "obra", version, about = "Construction-site task tracking and PCP reporting")]
pub struct Cli {
    /// Directory holding obra databases and config.json.
    #[arg(long, global = true, env = "OBRA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Obra (construction site) to work on. Defaults to config's default_obra.
    #[arg(long, global = true, env = "OBRA_ID")]
    pub obra: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}
