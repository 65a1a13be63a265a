use super::{file_label, read_data, read_source};
use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use livecanvas_evaluator::{EditableElement, EvalError, Evaluator, SandboxHandle, SandboxMessage, Viewport};
use livecanvas_parser::preprocess;
use livecanvas_workspace::Config;
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct RenderArgs {
    /// Component source file
    pub input: PathBuf,

    /// Data context (JSON file)
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Viewport width (overrides config)
    #[arg(long)]
    pub width: Option<f64>,

    /// Viewport height (overrides config)
    #[arg(long)]
    pub height: Option<f64>,

    /// Print the mounted elements as JSON
    #[arg(long)]
    pub json: bool,
}

pub async fn render(args: RenderArgs, config: &Config) -> Result<()> {
    let source = read_source(&args.input)?;
    let data = read_data(args.data.as_deref())?;
    let viewport = Viewport {
        width: args.width.unwrap_or(config.viewport.width),
        height: args.height.unwrap_or(config.viewport.height),
    };
    let page_id = args.input.display().to_string();

    let mut sandbox = SandboxHandle::spawn(&page_id, viewport);
    sandbox.mount(&source, &data).await?;
    let reply = sandbox.recv().await;
    sandbox.shutdown().await;

    match reply {
        Some(SandboxMessage::Mounted {
            component,
            elements,
        }) => {
            if args.json {
                println!("{}", serde_json::to_string_pretty(&elements)?);
            } else {
                print_elements(&component, &elements);
            }
            Ok(())
        }
        Some(SandboxMessage::Diagnostic { message, stack }) => {
            eprintln!("{} {}", "✗".red(), message.red().bold());
            for line in &stack {
                eprintln!("    {}", line.dimmed());
            }
            print_report(&args.input, &source, &page_id, viewport);
            Err(anyhow!("{} did not render", file_label(&args.input)))
        }
        Some(other) => Err(anyhow!("Unexpected sandbox reply: {:?}", other.kind())),
        None => Err(anyhow!("Sandbox closed before replying")),
    }
}

fn print_elements(component: &str, elements: &[EditableElement]) {
    println!(
        "🖼  {} {} ({} editable elements)",
        "Rendered".green().bold(),
        component.bold(),
        elements.len()
    );
    for element in elements {
        let g = &element.geometry;
        let detail = match (&element.data_binding_key, &element.content, &element.src) {
            (Some(field), _, _) => format!("{{data.{}}}", field).cyan().to_string(),
            (None, _, Some(src)) => format!("src={}", src).yellow().to_string(),
            (None, Some(content), None) => format!("\"{}\"", content),
            (None, None, None) => String::new(),
        };
        println!(
            "  {:>3} {:<10} {:<14} {:>7.1},{:<7.1} {:>7.1}x{:<7.1} {}",
            element.ordinal_index,
            format!("<{}>", element.tag),
            element.element_id.dimmed(),
            g.left,
            g.top,
            g.width,
            g.height,
            detail
        );
    }
}

/// Source excerpt for parse failures
fn print_report(input: &std::path::Path, source: &str, page_id: &str, viewport: Viewport) {
    let evaluator = Evaluator::new(page_id).with_viewport(viewport);
    if let Err(EvalError::Parse(err)) = evaluator.evaluate(source, &serde_json::json!({})) {
        let module = preprocess(source);
        eprintln!();
        eprintln!("{}", err.report(&file_label(input), &module.body));
    }
}
