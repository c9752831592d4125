//! CLI tool for resolving presentation specs into slide render plans.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};
use slideplan_core::{
    ContentBag, LayoutDefaults, LayoutId, LayoutRegistry, LayoutSelector, Planner, PlannerConfig,
    RequiredPolicy,
};
use slideplan_pptx::TemplateInspector;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

/// Resolve presentation specs against a layout catalog.
#[derive(Parser, Debug)]
#[command(name = "slideplan")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Layout catalog JSON (default: built-in catalog)
    #[arg(long, global = true, conflicts_with = "template")]
    layouts: Option<PathBuf>,

    /// Read the layout catalog from a .pptx template's slide layouts
    #[arg(long, global = true)]
    template: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve a spec into render plans
    Plan {
        /// Spec file (JSON, or Markdown for .md files); "-" reads stdin
        spec: String,

        /// Layout used when a requested layout does not exist
        #[arg(long)]
        default_layout: Option<LayoutId>,

        /// Layout for title slides produced by the outline and free-text paths
        #[arg(long)]
        title_layout: Option<LayoutId>,

        /// Layout for section slides produced by the outline path
        #[arg(long)]
        section_layout: Option<LayoutId>,

        /// Layout for body slides produced by the outline and free-text paths
        #[arg(long)]
        body_layout: Option<LayoutId>,

        /// What to do with slides whose required placeholders stay empty (ignore, warn, skip)
        #[arg(long, default_value = "ignore")]
        required_policy: RequiredPolicy,

        /// Write the plans to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List layouts matching any of the given features
    Layouts {
        /// Feature: a semantic name, structure tag or placeholder purpose
        #[arg(short, long = "feature")]
        features: Vec<String>,
    },

    /// Show one layout and its placeholder summary
    Layout {
        id: LayoutId,
    },

    /// Rank layouts for a piece of content
    Recommend {
        /// Content as a JSON object of fields, or plain text; "-" reads stdin
        content: String,

        /// Number of layouts to show
        #[arg(long, default_value = "3")]
        top: usize,
    },

    /// Print the loaded layout catalog as JSON
    Catalog,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    if args.verbose {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug")).init();
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }

    let registry = load_registry(&args)?;
    log::debug!("Loaded {} layouts", registry.len());

    match args.command {
        Command::Plan {
            ref spec,
            default_layout,
            title_layout,
            section_layout,
            body_layout,
            required_policy,
            ref output,
        } => {
            let mut defaults = LayoutDefaults::default();
            if let Some(id) = default_layout {
                defaults = defaults.with_fallback(id);
            }
            if let Some(id) = title_layout {
                defaults = defaults.with_title(id);
            }
            if let Some(id) = section_layout {
                defaults = defaults.with_section(id);
            }
            if let Some(id) = body_layout {
                defaults = defaults.with_body(id);
            }

            let config = PlannerConfig::new()
                .with_defaults(defaults)
                .with_required_policy(required_policy);
            let planner = Planner::new(&registry, config)?;

            let spec = read_spec(spec)?;
            let resolution = planner.resolve(&spec)?;

            if args.verbose {
                eprintln!(
                    "Resolved {} slides ({} warnings)",
                    resolution.plans.len(),
                    resolution.warnings.len()
                );
            }
            for warning in &resolution.warnings {
                log::warn!("{:?}", warning);
            }

            let rendered = serde_json::to_string_pretty(&resolution)?;
            match output {
                Some(path) => {
                    write_output(path, &rendered)?;
                    if args.verbose {
                        eprintln!("Written to: {}", path.display());
                    }
                }
                None => println!("{}", rendered),
            }
        }
        Command::Layouts { ref features } => {
            let matches = registry.query(features.as_slice());
            if matches.is_empty() {
                eprintln!("No layouts match {:?}", features);
            }
            for layout in matches {
                println!(
                    "{:>3}  {:<32} {:<18} {} placeholders",
                    layout.id,
                    layout.semantic_name,
                    layout.structure.as_str(),
                    layout.placeholders.len()
                );
            }
        }
        Command::Layout { id } => {
            print_json(&layout_report(&registry, id)?)?;
        }
        Command::Recommend { ref content, top } => {
            let content = read_content(content)?;
            let selector = LayoutSelector::new();

            if args.verbose {
                eprintln!("{:#?}", selector.analyze(&content));
            }

            let recommendations = selector.recommend(&registry, &content, top);
            for rec in &recommendations {
                let name = registry
                    .get(rec.layout_id)
                    .map(|l| l.semantic_name.as_str())
                    .unwrap_or("?");
                println!(
                    "{:>3}  {:<32} {:>5.1}  {}",
                    rec.layout_id, name, rec.score, rec.reason
                );
            }
        }
        Command::Catalog => {
            println!("{}", registry.to_json_pretty()?);
        }
    }

    Ok(())
}

/// Load the layout catalog from a template, a catalog file or the built-in set.
fn load_registry(args: &Args) -> Result<LayoutRegistry> {
    if let Some(path) = &args.template {
        log::debug!("Inspecting template {}", path.display());
        let layouts = TemplateInspector::new()
            .inspect_path(path)
            .with_context(|| format!("Failed to read template {}", path.display()))?;
        return Ok(LayoutRegistry::new(layouts)?);
    }

    if let Some(path) = &args.layouts {
        return LayoutRegistry::from_path(path)
            .with_context(|| format!("Failed to load layout catalog {}", path.display()));
    }

    Ok(LayoutRegistry::builtin()?)
}

/// Read a spec. Markdown files become an outline spec; other text that is
/// not JSON is taken as a free-text description. A `.json` file, or input
/// that opens like a JSON object or array, must parse.
fn read_spec(source: &str) -> Result<Value> {
    let text = read_source(source)?;

    let extension = Path::new(source)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("md") | Some("markdown") => return Ok(json!({ "markdown": text })),
        Some("json") => {
            return serde_json::from_str(&text)
                .with_context(|| format!("Failed to parse {} as JSON", source));
        }
        _ => {}
    }

    if text.trim_start().starts_with(['{', '[']) {
        return serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse {} as JSON", source));
    }

    Ok(serde_json::from_str(&text).unwrap_or_else(|e| {
        log::debug!("Spec is not JSON ({}), treating it as a description", e);
        Value::String(text)
    }))
}

/// The `layout` command's report: the descriptor and its placeholder summary.
fn layout_report(registry: &LayoutRegistry, id: LayoutId) -> Result<Value> {
    let layout = registry.get(id)?;
    let summary = registry.summary(id)?;
    Ok(json!({
        "layout": layout,
        "summary": summary,
    }))
}

/// Read recommendation input: a JSON object of fields, or plain text as `content`.
fn read_content(source: &str) -> Result<ContentBag> {
    let text = read_source(source)?;

    match serde_json::from_str::<Value>(&text) {
        Ok(Value::Object(object)) => Ok(ContentBag::from_json_object(&object)),
        Ok(_) => bail!("Content JSON must be an object of fields"),
        Err(_) => {
            let mut bag = ContentBag::new();
            bag.insert("content", text.trim());
            Ok(bag)
        }
    }
}

/// Read a file, or stdin for "-".
fn read_source(source: &str) -> Result<String> {
    if source == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }

    fs::read_to_string(source).with_context(|| format!("Failed to read {}", source))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Write output to file.
fn write_output(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory {}", parent.display()))?;
        }
    }

    let mut file = fs::File::create(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;
    file.write_all(content.as_bytes())
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}
