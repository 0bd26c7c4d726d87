use clap::Parser;
use waveshelf::cli::Cli;
use waveshelf::config::Config;
use waveshelf::error::Result;
use waveshelf::script;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logger only if WAVESHELF_LOG environment variable is set
    if let Ok(log_file) = std::env::var("WAVESHELF_LOG") {
        env_logger::Builder::new()
            .target(env_logger::Target::Pipe(Box::new(
                std::fs::OpenOptions::new()
                    .create(true)
                    .append(true)
                    .open(&log_file)
                    .expect("Failed to open log file"),
            )))
            .filter_level(log::LevelFilter::Debug)
            .init();

        log::info!("Waveshelf starting up");
    }

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };

    let commands = script::load_script(&cli.script)?;
    log::info!("running script with {} commands", commands.len());
    let snapshots = script::run_script(commands, config).await?;

    for snapshot in snapshots {
        let line = if cli.pretty {
            serde_json::to_string_pretty(&snapshot)?
        } else {
            serde_json::to_string(&snapshot)?
        };
        println!("{}", line);
    }

    Ok(())
}
