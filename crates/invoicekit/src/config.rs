//! Configuration module for invoicekit.
//!
//! Two layers:
//! - [`NamingConfig`]: the user's naming settings (pattern, grouping keys,
//!   case sensitivity, output prefix), persisted as JSON
//! - [`Config`]: a validated merge run built from CLI arguments

use std::path::{Path, PathBuf};
use std::str::FromStr;

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};

use crate::error::{InvoiceKitError, Result};
use crate::grouping::default_group_keys;
use crate::io::LopdfCodec;
use crate::merge::{DEFAULT_OUTPUT_PREFIX, Merger};
use crate::pattern::{Pattern, PatternOptions};

/// Pattern used when none is configured.
pub const DEFAULT_PATTERN: &str = "{mmyy}-{npwp}-{invoice}";

/// Naming settings shared by download naming and merging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Filename pattern.
    pub pattern: String,

    /// Placeholders to group by. Empty means every placeholder except
    /// `invoice`.
    pub group_keys: Vec<String>,

    /// Match literals and values case-sensitively.
    pub case_sensitive: bool,

    /// Prefix for timestamped output names.
    pub output_prefix: String,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            group_keys: Vec::new(),
            case_sensitive: false,
            output_prefix: DEFAULT_OUTPUT_PREFIX.to_string(),
        }
    }
}

impl NamingConfig {
    /// Pattern options implied by this configuration.
    pub fn pattern_options(&self) -> PatternOptions {
        PatternOptions {
            case_insensitive: !self.case_sensitive,
        }
    }

    /// Compile the configured pattern.
    pub fn compile(&self) -> Result<Pattern> {
        Pattern::compile_with(&self.pattern, self.pattern_options())
    }

    /// Replace the pattern.
    ///
    /// The new pattern must compile; otherwise the current pattern stays
    /// active and the error is returned. On success the grouping keys are
    /// reset to the new pattern's defaults.
    pub fn set_pattern(&mut self, raw: &str) -> Result<Pattern> {
        let pattern = Pattern::compile_with(raw, self.pattern_options())?;
        self.pattern = raw.to_string();
        self.group_keys = default_group_keys(&pattern);
        Ok(pattern)
    }

    /// Load settings from a JSON file. Missing fields take their defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(InvoiceKitError::file_not_found(path.to_path_buf()));
        }
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    /// Save settings as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = serde_json::to_string_pretty(self)?;
        std::fs::write(path, text)?;
        Ok(())
    }

    /// Validate the settings.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The pattern does not compile
    /// - A grouping key is not a placeholder of the pattern
    /// - The output prefix is blank
    pub fn validate(&self) -> anyhow::Result<()> {
        let pattern = self
            .compile()
            .with_context(|| format!("Invalid pattern in configuration: {}", self.pattern))?;

        for key in &self.group_keys {
            if !pattern.placeholders().contains(key) {
                bail!("Grouping key '{key}' is not a placeholder of {}", self.pattern);
            }
        }

        if self.output_prefix.trim().is_empty() {
            bail!("Output prefix cannot be empty");
        }

        Ok(())
    }
}

/// Output file overwrite behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OverwriteMode {
    /// Pick a free `name (N).ext` (default).
    #[default]
    Uniquify,
    /// Always overwrite.
    Force,
    /// Never overwrite, error if the file exists.
    NoClobber,
}

impl FromStr for OverwriteMode {
    type Err = InvoiceKitError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "uniquify" => Ok(Self::Uniquify),
            "force" => Ok(Self::Force),
            "no-clobber" | "noclobber" => Ok(Self::NoClobber),
            _ => Err(InvoiceKitError::invalid_config(format!(
                "Invalid overwrite mode: {s}. Must be one of: uniquify, force, no-clobber"
            ))),
        }
    }
}

/// Complete configuration for a merge run.
///
/// This structure contains all settings needed to perform a merge,
/// derived and validated from CLI arguments.
#[derive(Debug, Clone)]
pub struct Config {
    /// Input PDF file paths.
    pub inputs: Vec<PathBuf>,

    /// Directory the artifact is written to.
    pub output_dir: PathBuf,

    /// Naming settings.
    pub naming: NamingConfig,

    /// Plan the run without merging.
    pub dry_run: bool,

    /// Verbose output mode.
    pub verbose: bool,

    /// Quiet mode - suppress non-error output.
    pub quiet: bool,

    /// File overwrite behavior.
    pub overwrite_mode: OverwriteMode,

    /// Compress streams in merged documents.
    pub compress: bool,
}

impl Config {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Fewer than two input files are specified
    /// - Verbose and quiet modes are both enabled
    /// - The naming settings are invalid
    /// - The output directory is an input file
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.inputs.len() < 2 {
            bail!(
                "At least 2 input files are required, got {}",
                self.inputs.len()
            );
        }

        if self.verbose && self.quiet {
            bail!("Cannot use both --verbose and --quiet");
        }

        self.naming.validate()?;

        if self.inputs.iter().any(|input| input == &self.output_dir) {
            bail!(
                "Output directory cannot be an input file: {}",
                self.output_dir.display()
            );
        }

        Ok(())
    }

    /// Build the merger for this run.
    pub fn merger(&self) -> Result<Merger> {
        let codec = if self.compress {
            LopdfCodec::new()
        } else {
            LopdfCodec::without_compression()
        };
        Ok(Merger::from_config(&self.naming)?.with_codec(codec))
    }

    /// Check if output should be displayed.
    pub fn should_print(&self) -> bool {
        !self.quiet || self.dry_run
    }
}
