mod commands;

use clap::{Parser, Subcommand};
use colored::Colorize;
use commands::{
    bindings, edit, patch, render, save, BindingsArgs, EditArgs, PatchArgs, RenderArgs, SaveArgs,
};
use livecanvas_workspace::Config;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// LiveCanvas CLI - render, inspect and edit slide components
#[derive(Parser, Debug)]
#[command(name = "livecanvas")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Debug logging (overrides RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory containing livecanvas.config.json
    #[arg(long, global = true, default_value = ".")]
    config_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a component and list its editable elements
    Render(RenderArgs),

    /// List elements bound to data fields
    Bindings(BindingsArgs),

    /// Rewrite one element's style, src or text
    Patch(PatchArgs),

    /// Ask the generation service to edit a page's code or data
    Edit(EditArgs),

    /// Push local source and data for a page
    Save(SaveArgs),
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match Config::load(&cli.config_dir) {
        Ok(config) => {
            tracing::debug!(api_base_url = %config.api_base_url, "configuration loaded");
            match cli.command {
                Command::Render(args) => render(args, &config).await,
                Command::Bindings(args) => bindings(args),
                Command::Patch(args) => patch(args),
                Command::Edit(args) => edit(args, &config).await,
                Command::Save(args) => save(args, &config).await,
            }
        }
        Err(err) => Err(err.into()),
    };

    if let Err(err) = result {
        eprintln!();
        eprintln!("{} {}", "Error:".red().bold(), err);
        eprintln!();
        std::process::exit(1);
    }
}
