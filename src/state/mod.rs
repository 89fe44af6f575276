//! State management module
//!
//! This module handles the in-memory application state:
//! - Image records and the match set of the last search (data.rs)
//! - Path-string helpers shared by the workflows (paths.rs)
//!
//! Nothing here is persisted; HALO's database is the source of truth.

pub mod data;
pub mod paths;

pub use data::{ImageRecord, MatchSet};
