/*
 * main.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! htempl CLI - Main entry point

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod process;

use process::{ProcessConfig, Processor};

/// Render htempl documents (YAML metadata + template) to output files
#[derive(Parser)]
#[command(name = "htempl")]
#[command(version)]
#[command(about = "Render templates with a leading YAML metadata block", long_about = None)]
struct Cli {
    /// Destination directory
    #[arg(long, default_value = ".")]
    dest: PathBuf,

    /// Source directory to walk
    #[arg(long)]
    src: Option<PathBuf>,

    /// Suffix of source files
    #[arg(long = "srcsuffix", default_value = "htempl")]
    src_suffix: String,

    /// Suffix of generated files
    #[arg(long = "destsuffix", default_value = "html")]
    dest_suffix: String,

    /// Escaping applied to interpolated values
    #[arg(long, value_enum, default_value_t = Escape::Html)]
    escape: Escape,

    /// Render missing fields as empty instead of failing
    #[arg(long)]
    lenient: bool,

    /// Verbose debugging output
    #[arg(short, long)]
    verbose: bool,

    /// Files to process in addition to the source directory
    files: Vec<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Escape {
    Html,
    None,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let default_filter = if cli.verbose {
        "htempl=debug"
    } else {
        "htempl=info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ProcessConfig {
        dest: cli.dest,
        src: cli.src,
        src_suffix: cli.src_suffix,
        dest_suffix: cli.dest_suffix,
        options: htempl::CompileOptions {
            escape: match cli.escape {
                Escape::Html => htempl::EscapeMode::Html,
                Escape::None => htempl::EscapeMode::None,
            },
            undefined: if cli.lenient {
                htempl::UndefinedMode::Lenient
            } else {
                htempl::UndefinedMode::Strict
            },
            ..Default::default()
        },
    };

    let processor = Processor::new(config);
    processor.process_src_dir()?;
    for file in &cli.files {
        processor.process_file(file)?;
    }
    Ok(())
}
