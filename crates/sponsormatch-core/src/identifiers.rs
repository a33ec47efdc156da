// crates/sponsormatch-core/src/identifiers.rs
// ============================================================================
// Module: SponsorMatch Identifiers
// Description: Canonical opaque identifiers for creatives, campaigns,
//   advertisers, requests, and matches.
// Purpose: Provide strongly typed, serializable identifiers with stable wire
//   forms and non-empty construction invariants.
// Dependencies: serde, uuid
// ============================================================================

//! ## Overview
//! Identifiers used throughout the match pipeline. All catalog identifiers
//! (creative, campaign, advertiser) are opaque, non-empty strings supplied by
//! the catalog; request and match identifiers are minted by the core itself.
//!
//! Invariants:
//! - Catalog identifiers are never empty.
//! - [`MatchId`] is deterministic within a request: `uuid5(request_id, creative_id)`.

use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

/// Namespace used to derive deterministic match identifiers via UUID v5.
///
/// Fixed so that `match_id` derivation is stable across process restarts.
const MATCH_ID_NAMESPACE: Uuid = Uuid::from_bytes([
    0x6d, 0x61, 0x74, 0x63, 0x68, 0x2d, 0x6e, 0x73, 0x70, 0x2d, 0x73, 0x70, 0x6f, 0x6e, 0x73, 0x6f,
]);

macro_rules! string_identifier {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        ///
        /// # Invariants
        /// - Opaque UTF-8 string; never empty.
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier.
            ///
            /// # Panics
            ///
            /// Panics if `id` is empty. Catalog and request boundaries must
            /// validate non-emptiness before constructing this type.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                let id = id.into();
                assert!(!id.is_empty(), concat!(stringify!($name), " must not be empty"));
                Self(id)
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns true if `id` would be a valid (non-empty) identifier.
            #[must_use]
            pub fn is_valid(id: &str) -> bool {
                !id.is_empty()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

string_identifier!(CreativeId, "Identifier of a single creative within a campaign.");
string_identifier!(CampaignId, "Identifier of a campaign owning one or more creatives.");
string_identifier!(AdvertiserId, "Identifier of the advertiser owning one or more campaigns.");

/// Per-request identifier minted at the start of the match pipeline.
///
/// # Invariants
/// - Generated fresh for every `match` call (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestId(Uuid);

impl RequestId {
    /// Mints a fresh, random request identifier.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wraps an existing UUID as a request identifier.
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Opaque, per-candidate, per-request identifier resolving back to an audit trace.
///
/// # Invariants
/// - Deterministic within a request: `MatchId::derive(request_id, creative_id)`
///   always returns the same value for the same pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MatchId(Uuid);

impl MatchId {
    /// Derives a match identifier deterministically from a request id and a
    /// creative id, per `spec` property 2 (`match_id == uuid5(request_id, creative_id)`).
    #[must_use]
    pub fn derive(request_id: RequestId, creative_id: &CreativeId) -> Self {
        let name = format!("{request_id}:{creative_id}");
        Self(Uuid::new_v5(&MATCH_ID_NAMESPACE, name.as_bytes()))
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_identifier_round_trips_through_display() {
        let id = CreativeId::new("creative-1");
        assert_eq!(id.as_str(), "creative-1");
        assert_eq!(id.to_string(), "creative-1");
    }

    #[test]
    #[should_panic(expected = "CreativeId must not be empty")]
    fn string_identifier_rejects_empty() {
        let _ = CreativeId::new("");
    }

    #[test]
    fn match_id_is_deterministic_within_a_request() {
        let request_id = RequestId::generate();
        let creative_id = CreativeId::new("creative-1");
        let a = MatchId::derive(request_id, &creative_id);
        let b = MatchId::derive(request_id, &creative_id);
        assert_eq!(a, b);
    }

    #[test]
    fn match_id_differs_across_requests() {
        let creative_id = CreativeId::new("creative-1");
        let a = MatchId::derive(RequestId::generate(), &creative_id);
        let b = MatchId::derive(RequestId::generate(), &creative_id);
        assert_ne!(a, b);
    }
}
