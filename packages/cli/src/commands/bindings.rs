use super::{read_data, read_source};
use anyhow::Result;
use clap::Args;
use colored::Colorize;
use livecanvas_editor::extract_bindings;
use livecanvas_evaluator::evaluator::display_value;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct BindingsArgs {
    /// Component source file
    pub input: PathBuf,

    /// Data context to show current values from (JSON file)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Print the table as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn bindings(args: BindingsArgs) -> Result<()> {
    let source = read_source(&args.input)?;
    let data = read_data(args.data.as_deref())?;
    let bindings = extract_bindings(&source);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&bindings)?);
        return Ok(());
    }

    if bindings.is_empty() {
        println!("{}", "No data-bound elements".yellow());
        return Ok(());
    }

    println!("🔗 {} bound elements", bindings.len());
    for binding in &bindings {
        let value = match data.get(&binding.field) {
            Some(value) => display_value(value),
            None => "(missing)".dimmed().to_string(),
        };
        println!(
            "  {:>3} {:<20} {}",
            binding.element_ordinal,
            format!("data.{}", binding.field).cyan(),
            value
        );
    }
    Ok(())
}
