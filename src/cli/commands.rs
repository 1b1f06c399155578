use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "tl", about = concat!("tl v", env!("CARGO_PKG_VERSION"), " - a task list for the terminal"), version)]
pub struct Cli {
    /// Directory holding the task storage file and recovery log
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<PathBuf>,

    /// Config file to read (defaults to config.toml in the data directory)
    #[arg(short = 'c', long = "config")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// The data directory, falling back to the platform data dir
    pub fn resolved_data_dir(&self) -> Result<PathBuf, String> {
        if let Some(dir) = &self.data_dir {
            return Ok(dir.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join("tasklist"))
            .ok_or_else(|| "no data directory on this platform; pass --data-dir".to_string())
    }
}
