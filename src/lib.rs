//! # repo-chat
//!
//! Chat with your repository: local ingestion, summarization, and
//! retrieval-augmented question answering over a locally hosted model
//! runtime (Ollama).
//!
//! ## Pipeline
//!
//! ```text
//! ┌──────────┐   ┌───────────────┐   ┌──────────────┐
//! │  Loader  │──▶│ Chunk + Embed │──▶│ Vector Index │
//! │ (files)  │   │   (Ollama)    │   │  (in-proc)   │
//! └──────────┘   └───────────────┘   └──────┬───────┘
//!                                           │
//!        ┌──────────────┐                   │
//!        │  Summarizer  │◀── context ───────┤
//!        │ RepoSummary  │                   ▼
//!        └──────────────┘            ┌─────────────┐
//!                                    │  Q&A (ask)  │
//!                                    └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! rchat analyze ./my-repo       # load, index, write RepoSummary.md
//! rchat ask "how is auth done?" # answer against the persisted index
//! rchat chat                    # interactive console session
//! rchat serve                   # web UI
//! rchat status                  # runtime health + model availability
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration with env overrides |
//! | [`models`] | Core data types |
//! | [`loader`] | Repository file loading |
//! | [`chunk`] | Overlapping-window text chunking |
//! | [`embedding`] | Embedding client boundary + vector helpers |
//! | [`index`] | In-process vector index with persistence |
//! | [`prompt`] | Summary and question prompt templates |
//! | [`runtime`] | Model runtime boundary and supervision |
//! | [`session`] | Per-conversation state machine |
//! | [`assistant`] | Workflow orchestration |
//! | [`server`] | Web UI |
//! | [`console`] | Console chat |

pub mod assistant;
pub mod chunk;
pub mod config;
pub mod console;
pub mod embedding;
pub mod index;
pub mod loader;
pub mod models;
pub mod prompt;
pub mod runtime;
pub mod server;
pub mod session;
