// crates/sponsormatch-providers/src/lib.rs
// ============================================================================
// Module: SponsorMatch Providers
// Description: Concrete adapters for the core's capability traits.
// Purpose: Give a deployment something to run against without committing the
//   core to any particular vector database, embedding service, or transport.
// Dependencies: sponsormatch-core, reqwest, serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! Three adapters: an in-process, brute-force [`VectorIndex`] suitable for a
//! single-node deployment or tests; a deterministic, network-free
//! [`EmbeddingProvider`] for local development and CI; and an HTTP-backed
//! [`EmbeddingProvider`] for a real embedding service, hardened against SSRF
//! the way an outbound evidence provider must be.
//!
//! [`VectorIndex`]: sponsormatch_core::interfaces::VectorIndex
//! [`EmbeddingProvider`]: sponsormatch_core::interfaces::EmbeddingProvider

pub mod http_embedding;
pub mod inprocess_index;
pub mod local_embedding;

pub use http_embedding::HttpEmbeddingProvider;
pub use http_embedding::HttpEmbeddingProviderConfig;
pub use inprocess_index::InProcessVectorIndex;
pub use local_embedding::LocalEmbeddingProvider;
pub use local_embedding::DEFAULT_EMBEDDING_DIMENSION;
