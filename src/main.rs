mod actions;
mod cli;
mod config;
mod navigator;
mod paths;
mod progress;
mod prompt;
mod runner;
mod sudo;
mod ui;

use actionkit::{ExecutionContext, Fetcher, HttpTransport, SudoProvider};
use anyhow::{Context as _, Result};
use clap::Parser;
use cli::Cli;
use config::Config;
use manifest::Manifest;
use navigator::{Menus, Navigator};
use progress::{Spinner, UiProgress};
use prompt::DialoguerInput;
use runner::{SystemHost, SystemRunner};
use sudo::SudoContext;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let config_path = match cli.config {
        Some(path) => path,
        None => paths::config_file()?,
    };
    let config = Config::load(&config_path)?;

    let manifest_path = config.manifest_path(cli.manifest.as_deref())?;
    let manifest = Manifest::load(&manifest_path)
        .with_context(|| format!("Failed to load package list: {}", manifest_path.display()))?;
    log::info!(
        "loaded {} section(s) from {}",
        manifest.len(),
        manifest_path.display()
    );

    let home = paths::home_dir()?;
    let menus = Menus {
        packages: actions::package_menu(&config),
        external: actions::external_menu(&config),
        settings: actions::settings_menu(&config, &home),
    };

    let spinner = Spinner::new();
    let sudo = SudoContext::detect(spinner.clone());
    if sudo.is_none() {
        ui::warn("sudo not found; options that need root will fail");
    }
    let fetcher = Fetcher::new(Box::new(HttpTransport::new(config.fetch_timeout())))
        .with_retry(config.retry());
    let mut input = DialoguerInput::new(spinner.clone());
    let mut progress = UiProgress::new(spinner);

    let ctx = ExecutionContext {
        selected: Vec::new(),
        runner: &SystemRunner,
        sudo: sudo.as_ref().map(|s| s as &dyn SudoProvider),
        host: &SystemHost,
        input: &mut input,
        progress: &mut progress,
        fetcher: &fetcher,
        work_dir: std::env::temp_dir(),
    };

    let mut navigator = Navigator::new(&menus, &manifest, ctx);
    navigator.run();
    log::debug!(
        "{} menu(s) shown, {} run(s) executed",
        navigator.shown().len(),
        navigator.reports().len()
    );
    Ok(())
}
