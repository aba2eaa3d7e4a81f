//! Repository-analysis and question-answering workflow.
//!
//! [`Assistant`] orchestrates the whole pipeline: load documents, build
//! the vector index, assemble the flat context, summarize, and answer
//! follow-up questions by retrieval + generation. The two external
//! collaborators — text generation and embedding — enter through trait
//! objects so the boundary layer can wire in the real runtime or a test
//! stub.
//!
//! Fixed user-facing messages for the degraded paths live here as
//! constants; callers and tests match on them verbatim.

use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::Config;
use crate::embedding::EmbeddingClient;
use crate::index::{build_index, VectorIndex};
use crate::loader::load_documents;
use crate::models::{Document, Speaker};
use crate::prompt::PromptTemplates;
use crate::runtime::TextGenerator;
use crate::session::Session;

pub const MSG_NO_DOCUMENTS: &str = "No matching documents found.";
pub const MSG_ANALYSIS_COMPLETE: &str =
    "Repository analysis complete. You can now ask questions!";
pub const MSG_ANALYZE_FIRST: &str =
    "Repository analysis not complete. Please analyze the repository first.";
pub const MSG_NO_INDEX: &str = "No index available. Please analyze a repository first.";
pub const MSG_NO_RELEVANT: &str = "No relevant documents found for your question.";

pub struct Assistant {
    config: Config,
    templates: PromptTemplates,
    generator: Box<dyn TextGenerator>,
    embedder: Box<dyn EmbeddingClient>,
    session: Session,
}

impl Assistant {
    pub fn new(
        config: Config,
        generator: Box<dyn TextGenerator>,
        embedder: Box<dyn EmbeddingClient>,
    ) -> Self {
        Self {
            config,
            templates: PromptTemplates::default(),
            generator,
            embedder,
            session: Session::new(),
        }
    }

    pub fn with_templates(mut self, templates: PromptTemplates) -> Self {
        self.templates = templates;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set (or switch) the repository to analyze, discarding any state
    /// built for a previous path.
    pub fn set_repo_path(&mut self, path: PathBuf) -> Result<()> {
        self.session.set_repo_path(path)
    }

    /// Run the full analysis pipeline for the current repository path.
    ///
    /// On success the session enters `Ready` and the summary file has
    /// been written. Any failure returns the session to `PathSet` so the
    /// analysis can be retried.
    pub async fn analyze(&mut self) -> Result<String> {
        let repo_path = match self.session.repo_path() {
            Some(path) => path.to_path_buf(),
            None => bail!("Repository path is not set"),
        };

        self.session.begin_analysis()?;
        match self.run_analysis(&repo_path).await {
            Ok(message) => Ok(message),
            Err(e) => {
                self.session.abort_analysis();
                Err(e)
            }
        }
    }

    async fn run_analysis(&mut self, repo_path: &Path) -> Result<String> {
        info!("loading documents from {}", repo_path.display());
        let docs = load_documents(repo_path, &self.config.loader)?;
        if docs.is_empty() {
            // reportable outcome, not an error; the runtime is never invoked
            self.session.abort_analysis();
            return Ok(MSG_NO_DOCUMENTS.to_string());
        }
        info!("loaded {} documents", docs.len());

        let index = build_index(
            &docs,
            self.embedder.as_ref(),
            self.config.chunking.chunk_size,
            self.config.chunking.chunk_overlap,
        )
        .await?;

        let context = assemble_context(&docs);

        let prompt = self.templates.render_summary(&context);
        let summary = self
            .generator
            .generate(&prompt)
            .await
            .context("Summary generation failed")?;

        // persistence failures are reported but do not revert completion
        self.write_summary(&summary);
        if let Err(e) = index.save(&self.config.output.index_dir) {
            warn!("failed to persist index: {:#}", e);
        }

        self.session.complete_analysis(context, index);
        Ok(MSG_ANALYSIS_COMPLETE.to_string())
    }

    fn write_summary(&self, summary: &str) {
        let path = &self.config.output.summary_path;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    warn!("failed to create summary dir {}: {}", parent.display(), e);
                    return;
                }
            }
        }
        match std::fs::write(path, summary) {
            Ok(()) => info!("summary written to {}", path.display()),
            Err(e) => warn!("failed to write summary to {}: {}", path.display(), e),
        }
    }

    /// Restore the index persisted by a previous analysis, if one exists.
    ///
    /// Returns `false` when nothing is persisted; a corrupt persisted
    /// index is an error.
    pub fn restore_persisted_index(&mut self) -> Result<bool> {
        let dir = &self.config.output.index_dir;
        if !dir.exists() {
            return Ok(false);
        }
        let index = VectorIndex::load(dir)?;
        self.session.restore_index(index);
        Ok(true)
    }

    /// Answer a question against the analyzed repository.
    ///
    /// Infallible by contract: precondition violations and internal
    /// failures come back as fixed user-facing strings rather than
    /// errors, so a bad question can never crash the session.
    pub async fn ask(&mut self, query: &str) -> String {
        if !self.session.analysis_complete() {
            return MSG_ANALYZE_FIRST.to_string();
        }
        let index_empty = match self.session.index() {
            Some(index) => index.is_empty(),
            None => true,
        };
        if index_empty {
            return MSG_NO_INDEX.to_string();
        }

        let answer = match self.answer(query).await {
            Ok(answer) => answer,
            Err(e) => {
                warn!("failed to answer question: {:#}", e);
                format!("Error answering question: {:#}", e)
            }
        };

        self.session.record(Speaker::User, query);
        self.session.record(Speaker::Assistant, answer.clone());
        answer
    }

    async fn answer(&self, query: &str) -> Result<String> {
        let query_vec = self
            .embedder
            .embed(&[query.to_string()])
            .await
            .context("Failed to embed question")?
            .into_iter()
            .next()
            .ok_or_else(|| anyhow::anyhow!("Empty embedding response"))?;

        let index = self
            .session
            .index()
            .ok_or_else(|| anyhow::anyhow!("Index unavailable"))?;

        let hits = index.search(&query_vec, self.config.retrieval.top_k);
        if hits.is_empty() {
            // never call the model with empty context
            return Ok(MSG_NO_RELEVANT.to_string());
        }

        let context = hits
            .iter()
            .map(|hit| hit.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let prompt = self.templates.render_question(&context, query);
        self.generator
            .generate(&prompt)
            .await
            .context("Answer generation failed")
    }
}

/// Concatenate document contents into the flat context blob handed to the
/// summarizer.
fn assemble_context(docs: &[Document]) -> String {
    docs.iter()
        .map(|doc| doc.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n")
}
