//! Basename tooling.
//!
//! Two pipelines share the hashing primitives in [`hash`]:
//!
//! - the namehash converter turns CSV handles into registry nodes
//!   (`handle` -> `handle.base.eth` -> namehash), optionally dropping
//!   nodes the on-chain registry reports as unowned;
//! - the batch-renewal generator turns plain-text names into
//!   `(token id, duration)` rows, with optional exclusion and
//!   deduplication stages.

pub mod config;
pub mod converter;
pub mod error;
pub mod hash;
pub mod input;
pub mod interrupt;
pub mod output;
pub mod registry;
pub mod renewal;

pub use error::{Error, Result};
