use clap::Parser;
use std::path::PathBuf;

/// Headless driver for the waveshelf session, for scripted runs and
/// integration debugging.
#[derive(Parser, Debug)]
#[command(name = "waveshelf")]
#[command(about = "Virtual file manager core, driven by JSON scripts")]
pub struct Cli {
    /// JSON script of session commands to execute.
    pub script: PathBuf,

    /// Optional JSON config overriding default timings.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Pretty-print snapshot output.
    #[arg(short, long)]
    pub pretty: bool,
}
