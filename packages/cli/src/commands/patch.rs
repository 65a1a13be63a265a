use super::{file_label, read_data, read_source};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use livecanvas_editor::{patch_with_data, PropertyChanges};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct PatchArgs {
    /// Component source file
    pub input: PathBuf,

    /// Ordinal of the element to change (see `livecanvas render`)
    #[arg(short, long)]
    pub ordinal: usize,

    /// Style value to set, e.g. `--set left=50px` (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_style_pair)]
    pub styles: Vec<(String, String)>,

    /// Replacement text content
    #[arg(long)]
    pub text: Option<String>,

    /// Replacement image src
    #[arg(long)]
    pub src: Option<String>,

    /// Data context receiving edits to bound fields (JSON file)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Write results back instead of printing the source
    #[arg(short, long)]
    pub write: bool,
}

fn parse_style_pair(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{}'", raw)),
    }
}

pub fn patch(args: PatchArgs) -> Result<()> {
    let source = read_source(&args.input)?;

    let mut changes = PropertyChanges::new();
    for (key, value) in &args.styles {
        changes.set_style(key.as_str(), value.as_str());
    }
    changes.src = args.src.clone();
    changes.text = args.text.clone();
    if changes.is_empty() {
        return Err(anyhow!("Nothing to change; pass --set, --text or --src"));
    }

    let mut data = read_data(args.data.as_deref())?;
    let outcome = patch_with_data(&source, args.ordinal, &changes, &data);
    for diagnostic in &outcome.diagnostics {
        eprintln!("  {} {}", "⚠".yellow(), diagnostic);
    }

    for edit in &outcome.data_edits {
        eprintln!(
            "  {} data.{} = \"{}\"",
            "→".cyan(),
            edit.field,
            edit.value
        );
        data = livecanvas_editor::bindings::set_field(&data, &edit.field, &edit.value);
    }

    if !args.write {
        print!("{}", outcome.source);
        return Ok(());
    }

    if outcome.changed {
        fs::write(&args.input, &outcome.source)?;
        println!("  {} {}", "✓".green(), file_label(&args.input));
    } else {
        println!("  {} {} unchanged", "·".dimmed(), file_label(&args.input));
    }

    if !outcome.data_edits.is_empty() {
        match &args.data {
            Some(path) => {
                fs::write(path, serde_json::to_string_pretty(&data)?)?;
                println!("  {} {}", "✓".green(), file_label(path));
            }
            None => eprintln!(
                "  {} bound fields changed but no --data file was given",
                "⚠".yellow()
            ),
        }
    }
    Ok(())
}
