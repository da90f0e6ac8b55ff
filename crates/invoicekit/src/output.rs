//! User-facing output.
//!
//! Library code logs through `log`; the command-line front end reports to
//! the user through [`OutputFormatter`], which honors quiet and verbose
//! modes and colors messages on a terminal.
//!
//! # Examples
//!
//! ```
//! use invoicekit::output::OutputFormatter;
//!
//! let formatter = OutputFormatter::new(false, false);
//! formatter.info("Merging 4 file(s)");
//! formatter.success("Wrote 1125-111.pdf");
//! ```

use std::io::IsTerminal;

use crate::config::Config;
use crate::invoice::InvoiceTotals;
use crate::merge::{GroupOutcome, MergePlan, MergeResult, OutputMode};

/// Level of output message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    /// Informational message.
    Info,
    /// Success message.
    Success,
    /// Warning message.
    Warning,
    /// Error message.
    Error,
    /// Debug/verbose message.
    Debug,
}

impl MessageLevel {
    fn prefix(self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Success => "✓ ",
            Self::Warning => "⚠ ",
            Self::Error => "✗ ",
            Self::Debug => "→ ",
        }
    }

    fn color(self) -> &'static str {
        match self {
            Self::Info => "",
            Self::Success => "\x1b[32m",
            Self::Warning => "\x1b[33m",
            Self::Error => "\x1b[31m",
            Self::Debug => "\x1b[36m",
        }
    }
}

/// Output formatter with configurable verbosity.
#[derive(Debug, Clone)]
pub struct OutputFormatter {
    quiet: bool,
    verbose: bool,
    colored: bool,
}

impl OutputFormatter {
    /// Create a new output formatter.
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self {
            quiet,
            verbose,
            colored: std::io::stdout().is_terminal() && std::env::var("TERM").is_ok(),
        }
    }

    /// Create a formatter from configuration.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.quiet, config.verbose)
    }

    /// Create a quiet formatter (only warnings and errors).
    pub fn quiet() -> Self {
        Self::new(true, false)
    }

    /// Print an informational message. Suppressed in quiet mode.
    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{}", self.render(MessageLevel::Info, message));
        }
    }

    /// Print a success message. Suppressed in quiet mode.
    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{}", self.render(MessageLevel::Success, message));
        }
    }

    /// Print a warning to stderr. Always displayed.
    pub fn warning(&self, message: &str) {
        eprintln!("{}", self.render(MessageLevel::Warning, message));
    }

    /// Print an error to stderr. Always displayed.
    pub fn error(&self, message: &str) {
        eprintln!("{}", self.render(MessageLevel::Error, message));
    }

    /// Print a message only in verbose mode.
    pub fn debug(&self, message: &str) {
        if self.verbose {
            println!("{}", self.render(MessageLevel::Debug, message));
        }
    }

    /// Print a labelled value. Suppressed in quiet mode.
    pub fn detail(&self, label: &str, value: &str) {
        if !self.quiet {
            println!("  {label}: {value}");
        }
    }

    /// Whether verbose output is shown.
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    /// Whether quiet mode is enabled.
    pub fn is_quiet(&self) -> bool {
        self.quiet
    }

    /// Format a message for `level`.
    pub fn render(&self, level: MessageLevel, message: &str) -> String {
        let prefix = level.prefix();
        let color = level.color();
        if self.colored && !color.is_empty() {
            format!("{color}{prefix}{message}\x1b[0m")
        } else {
            format!("{prefix}{message}")
        }
    }
}

impl Default for OutputFormatter {
    fn default() -> Self {
        Self::new(false, false)
    }
}

/// Show how a dry run would group the inputs.
pub fn display_plan(formatter: &OutputFormatter, plan: &MergePlan) {
    let mode = match plan.mode {
        OutputMode::Single => "single document",
        OutputMode::Multi => "zip archive",
    };
    formatter.info(&format!(
        "{} file(s) in {} group(s), output: {mode}",
        plan.file_count(),
        plan.groups.len()
    ));

    for group in &plan.groups {
        formatter.info(&format!("{} -> {}", group.key, group.output_name));
        for file in &group.files {
            formatter.detail("file", &file.name);
        }
    }
}

/// Show the per-group outcome and statistics of a run.
pub fn display_merge_result(formatter: &OutputFormatter, result: &MergeResult) {
    for group in &result.summary.groups {
        match &group.outcome {
            GroupOutcome::Merged {
                output_name,
                page_count,
            } => formatter.debug(&format!(
                "{}: {} file(s), {page_count} page(s) -> {output_name}",
                group.key,
                group.files.len()
            )),
            GroupOutcome::Failed { reason } => {
                formatter.warning(&format!("Group {} failed: {reason}", group.key))
            }
        }
    }

    let stats = &result.statistics;
    formatter.info(&format!(
        "Merged {} group(s), {} failed; {} file(s) merged, {} skipped",
        stats.groups_merged, stats.groups_failed, stats.files_merged, stats.files_skipped
    ));
    formatter.detail("Pages", &stats.total_pages.to_string());
    formatter.detail("Input size", &stats.format_input_size());
    formatter.detail("Output size", &stats.format_output_size());
    formatter.detail("Time", &format!("{:.2}s", stats.merge_time.as_secs_f64()));
}

/// Show invoice totals.
pub fn display_totals(formatter: &OutputFormatter, totals: &InvoiceTotals) {
    formatter.info(&format!("{} invoice(s)", totals.count));
    formatter.detail("DPP", &format!("{:.2}", totals.dpp));
    formatter.detail("PPN", &format!("{:.2}", totals.ppn));
    formatter.detail("Total", &format!("{:.2}", totals.total()));
    formatter.detail("Average", &format!("{:.2}", totals.average()));
}
