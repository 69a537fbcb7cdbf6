use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to the JSON configuration file.
    #[arg(long, default_value = "config.json")]
    pub config: String,

    /// Directory that receives one `<title>.txt` per subsection.
    #[arg(long, default_value = "download")]
    pub out: String,

    /// Overwrite subtitle files that already exist (ORed with the config flag).
    #[arg(long)]
    pub redownload: bool,

    /// Only print the enumerated subsections; download nothing.
    #[arg(long)]
    pub list: bool,

    /// Enable debug logging for this crate (overridden by `RUST_LOG`).
    #[arg(long, short)]
    pub verbose: bool,
}
