use anyhow::Result;
use clap::{Args, ValueEnum};
use colored::Colorize;
use livecanvas_editor::EditSession;
use livecanvas_workspace::{open_page, save_page, Config, EditMode, HttpGateway, Orchestrator};
use std::sync::Arc;
use std::time::Instant;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ModeArg {
    /// Rewrite the component source
    Code,
    /// Rewrite the data context
    Data,
}

impl From<ModeArg> for EditMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Code => EditMode::Code,
            ModeArg::Data => EditMode::Data,
        }
    }
}

#[derive(Debug, Args)]
pub struct EditArgs {
    /// Remote page id
    pub page_id: String,

    /// What the request may change
    #[arg(short, long, value_enum, default_value = "code")]
    pub mode: ModeArg,

    /// The change to make, in plain language
    #[arg(short, long)]
    pub prompt: String,

    /// Extra context for code edits (e.g. an image URL)
    #[arg(long)]
    pub attachment: Option<String>,

    /// Save the result once generated
    #[arg(long)]
    pub save: bool,
}

pub async fn edit(args: EditArgs, config: &Config) -> Result<()> {
    let gateway = Arc::new(HttpGateway::from_config(config)?);
    let page = open_page(gateway.as_ref(), &args.page_id).await?;
    let mut session = EditSession::for_page(page, config.session_config())?;
    let orchestrator = Orchestrator::new(gateway.clone());

    let mode = EditMode::from(args.mode);
    println!("✨ {} {} edit for {}", "Requesting".green().bold(), mode, args.page_id);
    let summary = orchestrator
        .edit(mode, &mut session, &args.prompt, args.attachment, Instant::now())
        .await?;
    println!("   {}", summary);

    if !args.save {
        match mode {
            EditMode::Code => println!("{}", session.source()),
            EditMode::Data => println!("{}", serde_json::to_string_pretty(session.data())?),
        }
        println!("{}", "Not saved; rerun with --save to keep it".yellow());
        return Ok(());
    }

    save_page(gateway.as_ref(), &mut session).await?;
    println!("  {} saved {}", "✓".green(), args.page_id);
    Ok(())
}
