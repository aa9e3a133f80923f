//! # macro-core
//!
//! Core abstractions shared by the macro event analyzer crates.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     EmbeddingProvider                       │
//! │  ┌─────────────────┐            ┌────────────────────────┐  │
//! │  │  HashEmbedder   │            │  remote (macro-runtime)│  │
//! │  │  (offline, pure)│            │  timeout-bounded HTTP  │  │
//! │  └─────────────────┘            └────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! The `EmbeddingProvider` trait lets classifiers switch between the
//! deterministic local strategy and a remote service without code changes.

pub mod error;
pub mod local;
pub mod provider;

pub use error::{ErrorKind, MacroError, Result};
pub use local::HashEmbedder;
pub use provider::{Embedding, EmbeddingProvider, ProviderInfo, cosine_similarity};
