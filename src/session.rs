//! Per-conversation mutable state.
//!
//! The session is owned by the boundary layer (CLI, console, or web
//! server) and passed into the workflow — never global state. It tracks
//! the repository path, the analysis state machine, the assembled
//! context, the vector index, and the running transcript.
//!
//! State machine: `Uninitialized → PathSet → Analyzing → Ready`. A
//! failure during analysis returns to `PathSet` so analysis can be
//! retried; setting a new repository path from any state discards the
//! index and context tied to the old path.

use anyhow::{bail, Result};
use chrono::Utc;
use std::path::{Path, PathBuf};

use crate::index::VectorIndex;
use crate::models::{Speaker, TranscriptEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Uninitialized,
    PathSet,
    Analyzing,
    Ready,
}

pub struct Session {
    phase: SessionPhase,
    repo_path: Option<PathBuf>,
    context: String,
    transcript: Vec<TranscriptEntry>,
    index: Option<VectorIndex>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            phase: SessionPhase::Uninitialized,
            repo_path: None,
            context: String::new(),
            transcript: Vec::new(),
            index: None,
        }
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn repo_path(&self) -> Option<&Path> {
        self.repo_path.as_deref()
    }

    pub fn analysis_complete(&self) -> bool {
        self.phase == SessionPhase::Ready
    }

    pub fn context(&self) -> &str {
        &self.context
    }

    pub fn index(&self) -> Option<&VectorIndex> {
        self.index.as_ref()
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    /// Set (or switch) the repository path.
    ///
    /// Any index and context built for a previous path are invalidated;
    /// old and new repository content are never merged. The transcript
    /// itself is kept — it belongs to the conversation, not the path.
    pub fn set_repo_path(&mut self, path: PathBuf) -> Result<()> {
        if path.as_os_str().is_empty() {
            bail!("Repository path must not be empty");
        }
        self.repo_path = Some(path);
        self.index = None;
        self.context.clear();
        self.phase = SessionPhase::PathSet;
        Ok(())
    }

    /// Enter the `Analyzing` phase. Requires a path to have been set.
    pub fn begin_analysis(&mut self) -> Result<()> {
        match self.phase {
            SessionPhase::PathSet | SessionPhase::Ready => {
                self.phase = SessionPhase::Analyzing;
                Ok(())
            }
            SessionPhase::Analyzing => bail!("Analysis already in progress"),
            SessionPhase::Uninitialized => bail!("Repository path is not set"),
        }
    }

    /// Leave `Analyzing` without completing; analysis can be retried.
    pub fn abort_analysis(&mut self) {
        if self.phase == SessionPhase::Analyzing {
            self.phase = SessionPhase::PathSet;
        }
    }

    /// Install the analysis results and enter `Ready`.
    pub fn complete_analysis(&mut self, context: String, index: VectorIndex) {
        self.context = context;
        self.index = Some(index);
        self.phase = SessionPhase::Ready;
    }

    /// Adopt an index restored from disk, marking the session ready for
    /// question answering without a fresh analysis pass.
    pub fn restore_index(&mut self, index: VectorIndex) {
        self.context.clear();
        self.index = Some(index);
        self.phase = SessionPhase::Ready;
    }

    /// Append to the transcript. The transcript grows monotonically for
    /// the life of the session.
    pub fn record(&mut self, speaker: Speaker, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry {
            speaker,
            text: text.into(),
            at: Utc::now(),
        });
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}
