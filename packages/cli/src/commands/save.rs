use super::{read_data, read_source};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use livecanvas_editor::EditSession;
use livecanvas_workspace::{open_page, save_page, Config, HttpGateway};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Debug, Args)]
pub struct SaveArgs {
    /// Remote page id
    pub page_id: String,

    /// New component source
    #[arg(short, long)]
    pub source: Option<PathBuf>,

    /// New data context (JSON file)
    #[arg(short, long)]
    pub data: Option<PathBuf>,
}

pub async fn save(args: SaveArgs, config: &Config) -> Result<()> {
    if args.source.is_none() && args.data.is_none() {
        return Err(anyhow!("Nothing to save; pass --source and/or --data"));
    }

    let gateway = HttpGateway::from_config(config)?;
    let page = open_page(&gateway, &args.page_id).await?;
    let mut session = EditSession::for_page(page, config.session_config())?;

    let now = Instant::now();
    if let Some(path) = &args.source {
        session.replace_source(read_source(path)?, now)?;
    }
    if args.data.is_some() {
        session.replace_data(read_data(args.data.as_deref())?, now)?;
    }

    if !session.is_dirty() {
        println!("  {} {} already up to date", "·".dimmed(), args.page_id);
        return Ok(());
    }

    let summary = save_page(&gateway, &mut session).await?;
    println!(
        "  {} saved {} (code: {}, data: {})",
        "✓".green(),
        args.page_id,
        summary.code,
        summary.data
    );
    Ok(())
}
