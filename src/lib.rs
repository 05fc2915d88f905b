//! cairn - signature-validated build artifact cache
//!
//! Restores cached dependency directories before a buildpack build and saves
//! them afterwards, keyed by the runtime signature that produced them.

pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod project;
pub mod ui;

pub use error::{CairnError, CairnResult};
