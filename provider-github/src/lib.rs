//! # GitHub Provider
//!
//! Implements `VersionedBlobStore` on top of the GitHub repository contents
//! API.
//!
//! ## Overview
//!
//! The collection lives in one file of a repository branch. Reads return the
//! base64-decoded file together with its blob `sha`; writes commit new
//! content and must present the `sha` they were based on, which gives
//! optimistic concurrency for free.

pub mod connector;
pub mod error;
pub mod types;

pub use connector::GitHubContentsConnector;
pub use error::{GitHubError, Result};
