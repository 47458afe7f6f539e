//! KGX Common Library
#![deny(clippy::unwrap_used, clippy::expect_used)]
//!
//! Shared graph types, digests, and error handling for the KGX loader workspace.
//!
//! # Overview
//!
//! - **Types**: the canonical [`Node`](types::Node) and [`Edge`](types::Edge)
//!   records every loader emits
//! - **Error Handling**: [`KgxError`] and the [`Result`] alias
//! - **Checksums**: SHA-256 digests for group keys and input file fingerprints
//! - **Logging**: `tracing` subscriber setup shared by the binaries
//!
//! # Example
//!
//! ```no_run
//! use kgx_common::checksum::digest_str;
//! use kgx_common::types::ChecksumAlgorithm;
//!
//! let key = digest_str("HGNC:777|WD:P2293|UMLS:C009", ChecksumAlgorithm::Sha256);
//! assert_eq!(key.len(), 64);
//! ```

pub mod checksum;
pub mod error;
pub mod logging;
pub mod types;

// Re-export commonly used types
pub use error::{KgxError, Result};
pub use types::{Edge, EdgeProperties, Node};
