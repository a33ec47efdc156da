// crates/sponsormatch-providers/tests/proptest_http_embedding.rs
// ============================================================================
// Module: HTTP Embedding Provider Property-Based Tests
// Description: Fuzz-like checks for endpoint validation and private-network
//   policy enforcement.
// Purpose: Ensure malformed or disallowed embedding endpoints fail closed
//   without panicking.
// ============================================================================

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    reason = "Test-only assertions and helpers are permitted."
)]

use proptest::prelude::*;
use sponsormatch_core::error::ErrorKind;
use sponsormatch_providers::HttpEmbeddingProvider;
use sponsormatch_providers::HttpEmbeddingProviderConfig;

fn config(endpoint: &str) -> HttpEmbeddingProviderConfig {
    HttpEmbeddingProviderConfig {
        endpoint: endpoint.to_string(),
        allow_http: false,
        timeout_ms: 50,
        max_response_bytes: 1024,
        allow_private_networks: false,
        user_agent: "proptest-agent".to_string(),
    }
}

proptest! {
    /// An arbitrary non-URL string is always rejected, never panics.
    #[test]
    fn arbitrary_strings_never_panic_and_never_construct(raw in ".{0,64}") {
        let result = HttpEmbeddingProvider::new(config(&raw));
        prop_assert!(result.is_err() || raw.starts_with("https://"));
    }

    /// A loopback-literal host is rejected by default regardless of port or path.
    #[test]
    fn loopback_literal_is_always_rejected_by_default(port in 1_u16..=65535, path in "[a-z/]{0,16}") {
        let endpoint = format!("https://127.0.0.1:{port}/{path}");
        let err = HttpEmbeddingProvider::new(config(&endpoint)).expect_err("loopback is rejected");
        prop_assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }

    /// Cleartext endpoints are always rejected unless allow_http is set, for
    /// any well-formed host.
    #[test]
    fn cleartext_is_rejected_without_opt_in(host in "[a-z][a-z0-9-]{1,20}\\.example") {
        let endpoint = format!("http://{host}/embed");
        let err = HttpEmbeddingProvider::new(config(&endpoint)).expect_err("plain http is rejected");
        prop_assert_eq!(err.kind(), ErrorKind::InvalidInput);
    }
}
