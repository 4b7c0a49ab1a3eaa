//! contents - table of contents generator
//!
//! Outlines Markdown files, renders them to HTML with a linked table of
//! contents, and replays scroll positions against the scroll tracker.

#![deny(unsafe_code)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, TocFormat};
use contents::document::escape_html;
use contents::settings::SETTINGS_FILE;
use contents::{
    markdown, pipeline, toc_markdown, Contents, Event, EventName, Host, Settings, StaticHost,
    TimerQueue,
};
use std::path::{Path, PathBuf};
use std::rc::Rc;

/// Main entry point for the contents CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    if cli.verbose {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Info)
            .init();
    } else {
        env_logger::Builder::from_default_env()
            .filter_level(log::LevelFilter::Warn)
            .init();
    }

    match cli.command {
        Commands::Toc {
            inputs,
            format,
            config,
            no_unique_ids,
        } => {
            handle_toc_command(inputs, format, config, no_unique_ids)?;
        }

        Commands::Render {
            input,
            output,
            config,
        } => {
            handle_render_command(input, output, config)?;
        }

        Commands::Track {
            input,
            positions,
            height,
            config,
        } => {
            handle_track_command(input, positions, height, config)?;
        }
    }

    Ok(())
}

/// Load the settings file given on the command line, or ./contents.toml
fn load_settings(config: Option<PathBuf>) -> Result<Settings> {
    match config {
        Some(path) => Settings::load(&path)
            .with_context(|| format!("Failed to load settings from {}", path.display())),
        None => Settings::load_or_default(Path::new(SETTINGS_FILE))
            .with_context(|| format!("Failed to load {}", SETTINGS_FILE)),
    }
}

fn read_markdown(input: &Path) -> Result<String> {
    std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))
}

/// Handle the toc command
fn handle_toc_command(
    inputs: Vec<PathBuf>,
    format: TocFormat,
    config: Option<PathBuf>,
    no_unique_ids: bool,
) -> Result<()> {
    let mut settings = load_settings(config)?;
    if no_unique_ids {
        settings.output.unique_ids = false;
    }

    let paths = pipeline::discover(&inputs);
    if paths.is_empty() {
        anyhow::bail!("No markdown files found");
    }

    let sources = pipeline::load_sources(&paths).context("Failed to load sources")?;
    let outlined =
        pipeline::build_outlines(sources, &settings).context("Failed to build outlines")?;
    let titled = outlined.len() > 1;

    for doc in &outlined {
        match format {
            TocFormat::Markdown => {
                if titled {
                    println!("<!-- {} -->", doc.path.display());
                }
                print!("{}", toc_markdown::to_markdown(&doc.outline));
            }
            TocFormat::Html => {
                println!(
                    "<nav data-source=\"{}\">",
                    escape_html(&doc.path.display().to_string())
                );
                print!("{}", doc.document.to_html(doc.list));
                println!("</nav>");
            }
        }
    }

    Ok(())
}

/// Handle the render command
fn handle_render_command(input: PathBuf, output: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let settings = load_settings(config)?;
    let mut doc = markdown::parse(&read_markdown(&input)?);

    let host = Rc::new(StaticHost::from_document(
        &doc,
        settings.tracker.window_height,
    ));
    let timers = TimerQueue::new();
    let outline_config = settings.to_config(&doc)?;
    let contents = Contents::with_options(
        &mut doc,
        outline_config,
        host,
        &timers,
        settings.tracker_options(),
    )
    .with_context(|| format!("Failed to outline {}", input.display()))?;

    let title = contents
        .tree()
        .articles()
        .next()
        .map(|article| article.name.trim().to_string())
        .or_else(|| {
            input
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
        })
        .unwrap_or_default();

    let root = doc.root();
    let nav = doc.create_element("nav");
    doc.set_attribute(nav, "class", "contents");
    doc.append_child(nav, contents.list());
    let first = doc.children(root).first().copied();
    doc.insert_before(root, nav, first);

    let page = format!(
        "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n{}</html>\n",
        escape_html(&title),
        doc.to_html(root)
    );

    std::fs::write(&output, page)
        .with_context(|| format!("Failed to write {}", output.display()))?;

    println!(
        "✓ Rendered {} with {} contents entries to {}",
        input.display(),
        contents.tree().len(),
        output.display()
    );

    Ok(())
}

/// Handle the track command
fn handle_track_command(
    input: PathBuf,
    positions: Vec<f64>,
    height: Option<f64>,
    config: Option<PathBuf>,
) -> Result<()> {
    let settings = load_settings(config)?;
    let options = settings.tracker_options();
    let mut doc = markdown::parse(&read_markdown(&input)?);

    let host = Rc::new(StaticHost::from_document(
        &doc,
        height.unwrap_or(settings.tracker.window_height),
    ));
    let timers = TimerQueue::new();
    let outline_config = settings.to_config(&doc)?;
    let contents = Contents::with_options(
        &mut doc,
        outline_config,
        Rc::clone(&host) as Rc<dyn Host>,
        &timers,
        options,
    )
    .with_context(|| format!("Failed to outline {}", input.display()))?;

    if contents.tree().is_empty() {
        anyhow::bail!("{} has no headings to track", input.display());
    }

    contents
        .event_bus()
        .subscribe(EventName::Change, |event| {
            if let Event::Change(change) = event {
                let previous = change
                    .previous
                    .as_ref()
                    .map(|entry| format!("#{}", entry.article.id))
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "{:>4}  {} (#{})  previous: {}",
                    change.current.index,
                    change.current.article.name.trim(),
                    change.current.article.id,
                    previous
                );
            }
        });

    timers
        .advance(options.bootstrap_delay)
        .context("Scroll tracker bootstrap failed")?;

    for y in positions {
        log::info!("Scrolling to {}", y);
        host.scroll_to(y);
        contents.host_scrolled()?;
        timers.advance(options.throttle)?;
    }

    timers.run_until_idle()?;

    Ok(())
}
