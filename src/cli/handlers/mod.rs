use crate::cli::commands::Cli;
use crate::io::config_io;
use crate::tui;

/// Resolve the data directory and config, then run the UI until it quits
pub fn launch(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    let data_dir = cli.resolved_data_dir()?;
    let config_path = cli
        .config
        .unwrap_or_else(|| config_io::config_path(&data_dir));
    let config = config_io::read_config(&config_path)?;
    tui::run(&data_dir, config)
}
