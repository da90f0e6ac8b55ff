//! invoicekit - name, parse, group and merge tax-invoice PDFs.
//!
//! Command-line front end for the `invoicekit` library.

mod cli;

use clap::Parser;
use log::{LevelFilter, debug, info};
use serde_json::json;
use std::path::{Path, PathBuf};
use std::process;

use crate::cli::{Cli, Command, MergeArgs, NameArgs, ParseArgs, RecapArgs, TotalsArgs};
use invoicekit::cancel::CancellationToken;
use invoicekit::config::OverwriteMode;
use invoicekit::download::{
    DownloadDispatcher, DownloadOutcome, DownloadQueue, DownloadRequest, InvoiceRegistry,
};
use invoicekit::error::{InvoiceKitError, Result};
use invoicekit::grouping::Grouper;
use invoicekit::invoice::{InvoiceRecord, InvoiceTotals};
use invoicekit::merge::InputFile;
use invoicekit::output::{OutputFormatter, display_merge_result, display_plan, display_totals};
use invoicekit::report::{recap_bytes, recap_filename};
use invoicekit::utils::{UniqueNames, resolve_output_path};

#[tokio::main]
async fn main() {
    // Parse CLI arguments
    let cli = Cli::parse();

    env_logger::Builder::new()
        .filter_level(log_level(&cli))
        .parse_default_env()
        .init();

    // Run the application and handle errors
    if let Err(err) = run(cli).await {
        eprintln!("Error: {err}");
        process::exit(err.exit_code());
    }
}

/// Log level implied by the verbosity flags. `RUST_LOG` still overrides it.
fn log_level(cli: &Cli) -> LevelFilter {
    if cli.verbose {
        LevelFilter::Debug
    } else if cli.quiet {
        LevelFilter::Error
    } else {
        LevelFilter::Warn
    }
}

/// Main application logic.
async fn run(cli: Cli) -> Result<()> {
    let formatter = OutputFormatter::new(cli.quiet, cli.verbose);

    match cli.command {
        Command::Merge(ref args) => run_merge(args, cli.verbose, cli.quiet, &formatter).await,
        Command::Name(ref args) => run_name(args, &formatter).await,
        Command::Parse(ref args) => run_parse(args),
        Command::Totals(ref args) => run_totals(args, &formatter).await,
        Command::Recap(ref args) => run_recap(args, &formatter).await,
    }
}

/// `invoicekit merge`: group inputs and write one PDF or one zip archive.
async fn run_merge(
    args: &MergeArgs,
    verbose: bool,
    quiet: bool,
    formatter: &OutputFormatter,
) -> Result<()> {
    let mut inputs = expand_inputs(&args.inputs)?;
    if let Some(ref list) = args.input_list {
        inputs.extend(read_input_list(list).await?);
    }

    let config = args.to_config(inputs, verbose, quiet)?;
    let merger = config.merger()?;

    formatter.info(&format!(
        "{} v{}: pattern {}",
        invoicekit::NAME,
        invoicekit::VERSION,
        merger.pattern().as_str()
    ));

    let mut files = Vec::with_capacity(config.inputs.len());
    for path in &config.inputs {
        debug!("Reading {}", path.display());
        files.push(InputFile::from_path(path).await?);
    }

    // Dry run mode - stop here
    if config.dry_run {
        let plan = merger.plan(files)?;
        display_plan(formatter, &plan);
        formatter.success("Dry run completed successfully");
        formatter.info("  Run without --dry-run to write the merged output");
        return Ok(());
    }

    let cancel = CancellationToken::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Interrupted, cancelling after the current group");
                cancel.cancel();
            }
        })
    };

    formatter.info("Merging documents...");
    let result = merger.merge(files, &cancel).await;
    ctrl_c.abort();
    let result = result?;

    display_merge_result(formatter, &result);

    let (name, bytes) = result.output.into_parts();
    tokio::fs::create_dir_all(&config.output_dir).await?;
    let path = resolve_output_path(&config.output_dir.join(&name), config.overwrite_mode)?;
    tokio::fs::write(&path, bytes).await?;

    formatter.success(&format!("Wrote {}", path.display()));
    Ok(())
}

/// `invoicekit name`: copy downloads under generated names.
async fn run_name(args: &NameArgs, formatter: &OutputFormatter) -> Result<()> {
    args.validate()?;

    let naming = args.naming.to_naming_config()?;
    let pattern = naming.compile()?;

    let records: Vec<InvoiceRecord> = read_json(&args.records).await?;
    let mut registry = InvoiceRegistry::new();
    let registered = registry.register(records);
    formatter.info(&format!("Loaded {registered} invoice record(s)"));

    // Collisions within the batch are resolved up front, collisions with
    // files already on disk by the dispatcher.
    let mut names = UniqueNames::new();
    let mut requests = Vec::new();
    for path in expand_inputs(&args.inputs)? {
        let original = file_name(&path)?;
        let mut request = DownloadRequest::named(
            path.to_string_lossy(),
            &original,
            &registry,
            &pattern,
        );
        request.filename = names.claim(&request.filename);
        formatter.detail(&original, &request.filename);
        requests.push(request);
    }

    if args.dry_run {
        formatter.success("Dry run completed successfully");
        return Ok(());
    }

    tokio::fs::create_dir_all(&args.output_dir).await?;
    let dispatcher = CopyDispatcher {
        output_dir: args.output_dir.clone(),
    };
    let outcomes = DownloadQueue::with_concurrency(args.jobs)
        .run(requests, &dispatcher, &CancellationToken::new())
        .await;

    let mut copied = 0;
    for outcome in &outcomes {
        match outcome {
            DownloadOutcome::Started { .. } => copied += 1,
            DownloadOutcome::Failed { filename, reason } => {
                formatter.warning(&format!("{filename}: {reason}"))
            }
            DownloadOutcome::Cancelled { filename } => {
                formatter.warning(&format!("{filename}: cancelled"))
            }
        }
    }

    formatter.success(&format!(
        "Copied {copied} of {} file(s) to {}",
        outcomes.len(),
        args.output_dir.display()
    ));
    Ok(())
}

/// `invoicekit parse`: print metadata and group of each filename as JSON.
fn run_parse(args: &ParseArgs) -> Result<()> {
    let naming = args.naming.to_naming_config()?;
    let pattern = naming.compile()?;
    let grouper = Grouper::new(&pattern, &naming.group_keys);

    for filename in &args.filenames {
        let line = json!({
            "filename": filename,
            "metadata": pattern.parse(filename),
            "group": grouper.assign(filename),
        });
        println!("{}", serde_json::to_string(&line)?);
    }
    Ok(())
}

/// `invoicekit totals`: sum DPP and PPN over scraped records.
async fn run_totals(args: &TotalsArgs, formatter: &OutputFormatter) -> Result<()> {
    let records: Vec<InvoiceRecord> = read_json(&args.records).await?;
    let totals: InvoiceTotals = records.iter().collect();

    if args.json {
        let value = json!({
            "count": totals.count,
            "dpp": totals.dpp,
            "ppn": totals.ppn,
            "total": totals.total(),
            "average": totals.average(),
        });
        println!("{}", serde_json::to_string_pretty(&value)?);
    } else {
        display_totals(formatter, &totals);
    }
    Ok(())
}

/// `invoicekit recap`: write the CSV recap of scraped records.
async fn run_recap(args: &RecapArgs, formatter: &OutputFormatter) -> Result<()> {
    let records: Vec<InvoiceRecord> = read_json(&args.records).await?;
    let bytes = recap_bytes(&records)?;

    let name = args.name.clone().unwrap_or_else(recap_filename);
    tokio::fs::create_dir_all(&args.output_dir).await?;
    let path = resolve_output_path(&args.output_dir.join(name), OverwriteMode::Uniquify)?;
    tokio::fs::write(&path, bytes).await?;

    formatter.success(&format!(
        "Wrote recap of {} invoice(s) to {}",
        records.len(),
        path.display()
    ));
    Ok(())
}

/// Copies local files into a directory. Request URLs are source paths.
struct CopyDispatcher {
    output_dir: PathBuf,
}

impl DownloadDispatcher for CopyDispatcher {
    async fn dispatch(&self, request: &DownloadRequest) -> Result<()> {
        let target = resolve_output_path(
            &self.output_dir.join(&request.filename),
            OverwriteMode::Uniquify,
        )?;
        tokio::fs::copy(&request.url, &target)
            .await
            .map_err(|e| InvoiceKitError::dispatch(&request.filename, e.to_string()))?;
        debug!("Copied {} -> {}", request.url, target.display());
        Ok(())
    }
}

/// Expand glob patterns among `inputs`, keeping plain paths as given.
///
/// Matches of one pattern are sorted; a pattern matching nothing is an
/// error.
fn expand_inputs(inputs: &[String]) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();
    for input in inputs {
        if !input.contains(['*', '?', '[']) {
            paths.push(PathBuf::from(input));
            continue;
        }

        let entries = glob::glob(input).map_err(|e| {
            InvoiceKitError::invalid_config(format!("Invalid glob pattern '{input}': {e}"))
        })?;
        let mut matched: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
        if matched.is_empty() {
            return Err(InvoiceKitError::file_not_found(PathBuf::from(input)));
        }
        matched.sort();
        paths.extend(matched);
    }
    Ok(paths)
}

/// Read input paths from a file, one per line.
///
/// Lines starting with '#' are treated as comments and ignored. Empty lines
/// are skipped.
async fn read_input_list(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.exists() {
        return Err(InvoiceKitError::file_not_found(path.to_path_buf()));
    }
    let text = tokio::fs::read_to_string(path).await?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(PathBuf::from)
        .collect())
}

async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(InvoiceKitError::file_not_found(path.to_path_buf()));
    }
    let text = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&text)?)
}

fn file_name(path: &Path) -> Result<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| InvoiceKitError::invalid_config(format!("Not a file: {}", path.display())))
}
