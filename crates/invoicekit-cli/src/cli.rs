//! CLI argument parsing for invoicekit.
//!
//! This module defines the command-line interface structure using `clap`.
//! It is also compiled by the build script to render the man page, so it
//! only depends on `clap`, `std` and the library.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use invoicekit::config::{Config, NamingConfig, OverwriteMode};
use invoicekit::download::DEFAULT_MAX_CONCURRENCY;
use invoicekit::error::{InvoiceKitError, Result};

/// Name, parse, group and merge tax-invoice PDFs by filename pattern.
///
/// Filenames are generated from and parsed back into invoice metadata with a
/// pattern such as `{mmyy}-{npwp}-{invoice}`. Merging groups the inputs by
/// the pattern's metadata and writes one PDF, or a zip of one PDF per group.
#[derive(Parser, Debug)]
#[command(name = "invoicekit")]
#[command(version)]
#[command(about = "Name, parse, group and merge tax-invoice PDFs", long_about = None)]
#[command(author)]
#[command(arg_required_else_help = true)]
pub struct Cli {
    /// Verbose output - show per-group details and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress all non-error output
    ///
    /// Only errors and warnings will be printed.
    /// Useful for scripts and automation.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Group PDF files by filename metadata and merge each group
    ///
    /// With one group (unparseable files aside) the result is a single PDF
    /// named after the group. With several groups the result is a zip
    /// archive holding one PDF per group.
    ///
    /// Examples:
    ///   invoicekit merge *.pdf -o merged/
    ///   invoicekit merge --group-by npwp 1125-*.pdf
    Merge(MergeArgs),

    /// Copy PDFs under names generated from scraped invoice records
    ///
    /// Files whose names start with `OutputTaxInvoice-` and contain a
    /// registered invoice number are renamed with the pattern; other files
    /// keep their names.
    Name(NameArgs),

    /// Parse filenames into metadata and print it as JSON
    Parse(ParseArgs),

    /// Sum DPP and PPN over scraped invoice records
    Totals(TotalsArgs),

    /// Write a CSV recap of scraped invoice records
    ///
    /// Columns: No Faktur, Masa Pajak, Tanggal, DPP, PPN.
    ///
    /// Examples:
    ///   invoicekit recap invoices.json -o reports/
    Recap(RecapArgs),
}

/// Pattern and grouping options shared by subcommands.
#[derive(Args, Debug, Default, Clone)]
pub struct NamingArgs {
    /// Naming settings file (JSON)
    ///
    /// Flags given on the command line override values from the file.
    #[arg(long, value_name = "FILE", env = "INVOICEKIT_CONFIG")]
    pub naming_config: Option<PathBuf>,

    /// Filename pattern, e.g. `{mmyy}-{npwp}-{invoice}`
    #[arg(short, long, value_name = "PATTERN")]
    pub pattern: Option<String>,

    /// Placeholder to group by (repeatable)
    ///
    /// Defaults to every placeholder of the pattern except `invoice`.
    #[arg(short, long = "group-by", value_name = "KEY")]
    pub group_by: Vec<String>,

    /// Match pattern literals and values case-sensitively
    #[arg(long)]
    pub case_sensitive: bool,

    /// Prefix for timestamped output names
    #[arg(long, value_name = "PREFIX")]
    pub prefix: Option<String>,
}

impl NamingArgs {
    /// Resolve naming settings: file (or defaults), then flag overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file cannot be loaded or the
    /// resulting settings are invalid.
    pub fn to_naming_config(&self) -> Result<NamingConfig> {
        let mut naming = match self.naming_config {
            Some(ref path) => NamingConfig::load(path)?,
            None => NamingConfig::default(),
        };

        if self.case_sensitive {
            naming.case_sensitive = true;
        }

        if let Some(ref pattern) = self.pattern {
            naming.set_pattern(pattern)?;
        }

        if !self.group_by.is_empty() {
            naming.group_keys = self.group_by.clone();
        }

        if let Some(ref prefix) = self.prefix {
            naming.output_prefix = prefix.clone();
        }

        naming
            .validate()
            .map_err(|e| InvoiceKitError::invalid_config(format!("{e:#}")))?;

        Ok(naming)
    }
}

/// Arguments of `invoicekit merge`.
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Input PDF files or glob patterns
    #[arg(value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Read additional input paths from a file (one path per line)
    ///
    /// Empty lines and lines starting with '#' are ignored.
    #[arg(long, value_name = "FILE")]
    pub input_list: Option<PathBuf>,

    /// Directory the merged PDF or zip archive is written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Dry run - show the grouping without merging
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Overwrite an existing output file
    ///
    /// By default a free `name (N).ext` is chosen instead.
    #[arg(short, long)]
    pub force: bool,

    /// Never overwrite an existing output file, fail instead
    #[arg(long, conflicts_with = "force")]
    pub no_clobber: bool,

    /// Do not compress streams in merged documents
    #[arg(long)]
    pub no_compress: bool,

    #[command(flatten)]
    pub naming: NamingArgs,
}

impl MergeArgs {
    /// Overwrite mode implied by the flags.
    pub fn overwrite_mode(&self) -> OverwriteMode {
        if self.force {
            OverwriteMode::Force
        } else if self.no_clobber {
            OverwriteMode::NoClobber
        } else {
            OverwriteMode::Uniquify
        }
    }

    /// Convert arguments and resolved input paths into a validated Config.
    ///
    /// # Errors
    ///
    /// Returns an error if the naming settings are invalid or the
    /// configuration fails validation.
    pub fn to_config(&self, inputs: Vec<PathBuf>, verbose: bool, quiet: bool) -> Result<Config> {
        let config = Config {
            inputs,
            output_dir: self.output_dir.clone(),
            naming: self.naming.to_naming_config()?,
            dry_run: self.dry_run,
            verbose,
            quiet,
            overwrite_mode: self.overwrite_mode(),
            compress: !self.no_compress,
        };

        config.validate().map_err(|e| {
            InvoiceKitError::invalid_config(format!("Configuration validation failed: {e:#}"))
        })?;

        Ok(config)
    }
}

/// Arguments of `invoicekit name`.
#[derive(Args, Debug)]
pub struct NameArgs {
    /// Scraped invoice records (JSON array)
    #[arg(short, long, value_name = "FILE")]
    pub records: PathBuf,

    /// Downloaded PDF files or glob patterns
    #[arg(required = true, value_name = "FILE")]
    pub inputs: Vec<String>,

    /// Directory the renamed copies are written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Number of copies in flight
    #[arg(short, long, value_name = "N", default_value_t = DEFAULT_MAX_CONCURRENCY)]
    pub jobs: usize,

    /// Dry run - print the new names without copying
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    #[command(flatten)]
    pub naming: NamingArgs,
}

impl NameArgs {
    /// Validate arguments that clap cannot check.
    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(InvoiceKitError::invalid_config(
                "Number of jobs must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Arguments of `invoicekit parse`.
#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Filenames to parse (need not exist)
    #[arg(required = true, value_name = "NAME")]
    pub filenames: Vec<String>,

    #[command(flatten)]
    pub naming: NamingArgs,
}

/// Arguments of `invoicekit totals`.
#[derive(Args, Debug)]
pub struct TotalsArgs {
    /// Scraped invoice records (JSON array)
    #[arg(value_name = "FILE")]
    pub records: PathBuf,

    /// Print totals as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments of `invoicekit recap`.
#[derive(Args, Debug)]
pub struct RecapArgs {
    /// Scraped invoice records (JSON array)
    #[arg(value_name = "FILE")]
    pub records: PathBuf,

    /// Directory the recap is written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// File name of the recap [default: CoreTax_Rekap_<date>_<time>.csv]
    #[arg(long, value_name = "NAME")]
    pub name: Option<String>,
}
