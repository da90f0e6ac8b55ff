//! Merge session state machine.
//!
//! ```text
//! Idle -> Collecting -> Merging -> Succeeded -> Idle
//!                               -> Failed    -> Idle
//! ```

use log::debug;

use crate::cancel::CancellationToken;
use crate::error::{InvoiceKitError, Result};
use crate::io::{DocumentCodec, LopdfCodec};
use crate::merge::summary::MergeResult;
use crate::merge::{InputFile, Merger};

/// Where a session currently is.
#[derive(Debug)]
pub enum MergeState {
    /// No files collected.
    Idle,
    /// Files are being collected.
    Collecting(Vec<InputFile>),
    /// A merge is running.
    Merging,
    /// The last merge produced output that has not been taken yet.
    Succeeded(MergeResult),
    /// The last merge failed.
    Failed(String),
}

impl MergeState {
    /// Short name of the state.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Collecting(_) => "collecting",
            Self::Merging => "merging",
            Self::Succeeded(_) => "succeeded",
            Self::Failed(_) => "failed",
        }
    }
}

/// Drives one merger through repeated collect and merge cycles.
#[derive(Debug)]
pub struct MergeSession<C = LopdfCodec> {
    merger: Merger<C>,
    state: MergeState,
}

impl<C: DocumentCodec> MergeSession<C> {
    /// Create an idle session.
    pub fn new(merger: Merger<C>) -> Self {
        Self {
            merger,
            state: MergeState::Idle,
        }
    }

    /// Current state.
    pub fn state(&self) -> &MergeState {
        &self.state
    }

    /// Files collected so far.
    pub fn files(&self) -> &[InputFile] {
        match &self.state {
            MergeState::Collecting(files) => files,
            _ => &[],
        }
    }

    /// Add a file.
    ///
    /// Only allowed while idle or collecting.
    pub fn add_file(&mut self, file: InputFile) -> Result<()> {
        match &mut self.state {
            MergeState::Idle => {
                self.state = MergeState::Collecting(vec![file]);
                Ok(())
            }
            MergeState::Collecting(files) => {
                files.push(file);
                Ok(())
            }
            other => Err(invalid_transition("add files", other)),
        }
    }

    /// Remove the file at `index`. The session goes back to idle when the
    /// last file is removed.
    pub fn remove_file(&mut self, index: usize) -> Option<InputFile> {
        let MergeState::Collecting(files) = &mut self.state else {
            return None;
        };
        if index >= files.len() {
            return None;
        }

        let removed = files.remove(index);
        if files.is_empty() {
            self.state = MergeState::Idle;
        }
        Some(removed)
    }

    /// Merge the collected files.
    ///
    /// On success the session holds the output until [`take_output`] is
    /// called. On failure it records the reason and returns the error.
    ///
    /// [`take_output`]: Self::take_output
    pub async fn run(&mut self, cancel: &CancellationToken) -> Result<()> {
        let files = match std::mem::replace(&mut self.state, MergeState::Merging) {
            MergeState::Collecting(files) => files,
            MergeState::Idle => {
                self.state = MergeState::Idle;
                return Err(InvoiceKitError::NoFilesToMerge);
            }
            other => {
                let err = invalid_transition("start a merge", &other);
                self.state = other;
                return Err(err);
            }
        };

        debug!("Session merging {} file(s)", files.len());
        match self.merger.merge(files, cancel).await {
            Ok(result) => {
                self.state = MergeState::Succeeded(result);
                Ok(())
            }
            Err(e) => {
                self.state = MergeState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    /// Take the output of a successful merge and return to idle.
    pub fn take_output(&mut self) -> Option<MergeResult> {
        match std::mem::replace(&mut self.state, MergeState::Idle) {
            MergeState::Succeeded(result) => Some(result),
            other => {
                self.state = other;
                None
            }
        }
    }

    /// Clear collected files or a failure and return to idle.
    pub fn reset(&mut self) {
        if !matches!(self.state, MergeState::Merging) {
            self.state = MergeState::Idle;
        }
    }
}

fn invalid_transition(action: &str, state: &MergeState) -> InvoiceKitError {
    InvoiceKitError::other(format!("Cannot {action} while {}", state.name()))
}
