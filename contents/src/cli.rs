//! Command-line interface definitions for contents

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Output format for the toc command
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum TocFormat {
    /// Nested Markdown list of links
    #[default]
    Markdown,
    /// Nested HTML ordered list
    Html,
}

/// CLI structure for the contents application
#[derive(Parser)]
#[command(name = "contents")]
#[command(version)]
#[command(about = "Table of contents generator with scroll tracking", long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for contents
#[derive(Subcommand)]
pub enum Commands {
    /// Print the table of contents of Markdown files
    Toc {
        /// Markdown files or directories (defaults to current directory)
        #[arg(value_name = "PATH", default_value = ".")]
        inputs: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: TocFormat,

        /// Settings file (defaults to ./contents.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Keep repeated ids across files instead of suffixing them
        #[arg(long)]
        no_unique_ids: bool,
    },

    /// Render a Markdown file to HTML with a linked table of contents
    Render {
        /// Markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Output HTML file
        #[arg(short, long, default_value = "output.html")]
        output: PathBuf,

        /// Settings file (defaults to ./contents.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Replay scroll positions and print the active article for each
    Track {
        /// Markdown file
        #[arg(value_name = "FILE")]
        input: PathBuf,

        /// Scroll positions to visit, in order
        #[arg(short = 's', long = "scroll", value_name = "Y", num_args = 1.., required = true)]
        positions: Vec<f64>,

        /// Viewport height (overrides the settings file)
        #[arg(long)]
        height: Option<f64>,

        /// Settings file (defaults to ./contents.toml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}
