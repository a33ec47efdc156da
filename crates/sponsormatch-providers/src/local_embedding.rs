// crates/sponsormatch-providers/src/local_embedding.rs
// ============================================================================
// Module: Local Embedding Provider
// Description: A deterministic, network-free EmbeddingProvider.
// Purpose: Let local development, tests, and CI run the match pipeline
//   without a real embedding service.
// Dependencies: sponsormatch-core, sha2
// ============================================================================

//! ## Overview
//! A feature-hashed bag-of-words embedding: each lowercased token is hashed
//! into one of [`DEFAULT_EMBEDDING_DIMENSION`] buckets and accumulated, then
//! the vector is L2-normalized. Deterministic and order-independent in its
//! tokens; two calls with the same text always produce the same vector.

use sha2::Digest;
use sha2::Sha256;

use sponsormatch_core::error::MatchError;
use sponsormatch_core::interfaces::EmbeddingProvider;

/// Dimensionality of vectors produced by [`LocalEmbeddingProvider`].
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 256;

/// Deterministic, network-free [`EmbeddingProvider`] over feature-hashed
/// bag-of-words vectors.
///
/// # Invariants
/// - `embed` never fails; it returns a zero vector for empty input.
/// - Two calls with the same text and the same `dimension` always return
///   the same vector.
#[derive(Debug, Clone, Copy)]
pub struct LocalEmbeddingProvider {
    dimension: usize,
}

impl LocalEmbeddingProvider {
    /// Creates a provider producing vectors of [`DEFAULT_EMBEDDING_DIMENSION`].
    #[must_use]
    pub const fn new() -> Self {
        Self { dimension: DEFAULT_EMBEDDING_DIMENSION }
    }

    /// Creates a provider producing vectors of `dimension` buckets.
    #[must_use]
    pub const fn with_dimension(dimension: usize) -> Self {
        Self { dimension }
    }
}

impl Default for LocalEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EmbeddingProvider for LocalEmbeddingProvider {
    fn embed(&self, text: &str) -> Result<Vec<f32>, MatchError> {
        if self.dimension == 0 {
            return Err(MatchError::InvalidInput("embedding dimension must be positive".into()));
        }
        let mut buckets = vec![0.0_f32; self.dimension];
        for token in text.to_lowercase().split_whitespace() {
            let bucket = token_bucket(token, self.dimension);
            buckets[bucket] += 1.0;
        }
        let norm: f32 = buckets.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut buckets {
                *value /= norm;
            }
        }
        Ok(buckets)
    }
}

fn token_bucket(token: &str, dimension: usize) -> usize {
    let digest = Sha256::digest(token.as_bytes());
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[0..8]);
    let hashed = u64::from_be_bytes(bytes);
    usize::try_from(hashed % u64::try_from(dimension).unwrap_or(u64::MAX)).unwrap_or(0)
}
