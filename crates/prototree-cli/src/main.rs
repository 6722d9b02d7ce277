//! protoc-gen-prototree
//!
//! A protoc plugin that assembles the request into a cross-referenced
//! descriptor tree and writes it back out, one file per file to generate:
//!
//! ```text
//! protoc --prototree_out=format=text,include_imports:out/ -I proto proto/*.proto
//! ```
//!
//! Run by hand, `--request` reads a saved `CodeGeneratorRequest` instead of
//! stdin and `--summary` prints a coloured overview of the tree to stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod dump;
mod summary;

#[derive(Parser)]
#[command(name = "protoc-gen-prototree")]
#[command(
    author,
    version,
    about = "protoc plugin that dumps the assembled descriptor tree"
)]
struct Cli {
    /// Read the serialized CodeGeneratorRequest from a file instead of stdin.
    #[arg(long)]
    request: Option<PathBuf>,

    /// Write the serialized CodeGeneratorResponse to a file instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Print a coloured summary of the assembled tree to stderr.
    #[arg(long)]
    summary: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let input: Box<dyn Read> = match &cli.request {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("failed to open {}", path.display()))?,
        )),
        None => Box::new(io::stdin().lock()),
    };
    let output: Box<dyn Write> = match &cli.out {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("failed to create {}", path.display()))?,
        )),
        None => Box::new(io::stdout().lock()),
    };

    let set = prototree_core::plugin::run(input, output, &dump::TreeDump)
        .context("failed to assemble the code generator request")?;
    tracing::debug!(files = set.len(), "wrote code generator response");

    if cli.summary {
        summary::print(&set);
    }
    Ok(())
}

/// stdout carries the protoc response, so logs go to stderr.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}
