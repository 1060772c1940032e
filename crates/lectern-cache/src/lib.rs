//! Fingerprinted TTL response cache for the lectern classroom client.
//!
//! Sits between the API client and the network: successful fetches are
//! stored under a deterministic request fingerprint with a per-resource
//! TTL, and later identical requests are answered locally until the entry
//! expires.

mod cache;
mod error;
mod fingerprint;

pub use cache::{CacheStats, ResponseCache};
pub use error::{CacheError, Result};
pub use fingerprint::Fingerprint;
