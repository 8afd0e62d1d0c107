//! Offline bulk export - writes the archive to disk instead of serving it
//!
//! Usage:
//!   cargo run --bin bulk-export -- <out.zip> <project>[,<project>...] [--flatten] [--formats po,mo]
//!
//! Required environment variables:
//! - CATALOG_URL (postgres:// URL or path to a JSON catalog)
//!
//! Optional: the same EXPORT_* / FILE_LOCALE / GP_TABLE_PREFIX settings as the server

use anyhow::{bail, Context, Result};
use gp_bulk_export::catalog;
use gp_bulk_export::config::Config;
use gp_bulk_export::export::{run_export, ExportRequest};
use gp_bulk_export::request::{parse_project_list, select_formats};
use tracing::info;

fn print_usage() {
    eprintln!("Usage: bulk-export <out.zip> <project>[,<project>...] [--flatten] [--formats po,mo]");
}

struct Args {
    output: String,
    projects: Vec<String>,
    flatten: bool,
    formats: Option<String>,
}

fn parse_args(args: &[String]) -> Result<Args> {
    let mut positional = Vec::new();
    let mut flatten = false;
    let mut formats = None;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--flatten" => flatten = true,
            "--formats" => {
                formats = Some(iter.next().context("--formats needs a value")?.clone());
            }
            other if other.starts_with("--") => bail!("Unknown option: {}", other),
            other => positional.push(other.to_string()),
        }
    }

    if positional.len() != 2 {
        bail!("Expected an output file and a project list");
    }

    Ok(Args {
        output: positional[0].clone(),
        projects: parse_project_list(&positional[1]),
        flatten,
        formats,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gp_bulk_export=info".parse()?),
        )
        .init();

    let raw: Vec<String> = std::env::args().collect();
    if raw.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }
    let args = match parse_args(&raw) {
        Ok(args) => args,
        Err(e) => {
            eprintln!("{}", e);
            print_usage();
            std::process::exit(1);
        }
    };

    let config = Config::from_env()?;
    let source = catalog::connect(&config).await?;

    let request = ExportRequest {
        projects: args.projects,
        flatten: args.flatten,
        formats: select_formats(&config.export_formats, args.formats.as_deref())?,
    };
    let archive = run_export(source.as_ref(), &config, request).await?;

    std::fs::write(&args.output, &archive.bytes)
        .context(format!("Failed to write {}", args.output))?;

    info!(
        "✓ Wrote {} files to {} ({} bytes)",
        archive.file_count,
        args.output,
        archive.bytes.len()
    );

    Ok(())
}
