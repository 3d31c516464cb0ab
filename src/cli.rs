use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "provisor")]
#[command(version)]
#[command(about = "Interactive provisioner for a Debian workstation", long_about = None)]
pub struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long)]
    pub quiet: bool,

    /// Package manifest to use instead of the configured one
    #[arg(long, env = "PROVISOR_MANIFEST")]
    pub manifest: Option<PathBuf>,

    /// Settings file to use instead of `<config dir>/config.toml`
    #[arg(long)]
    pub config: Option<PathBuf>,
}
