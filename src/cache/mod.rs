//! Build artifact cache
//!
//! Persists selected workspace directories between builds and decides, once
//! per build, whether the previous generation may be restored.
//!
//! # Cache Status
//!
//! | Status | Restore | Description |
//! |--------|---------|-------------|
//! | valid | yes | Store populated by the current signature |
//! | no-cache | no | Store empty or never written |
//! | new-version | no | Store written by a different signature |
//! | invalidated | no | Forced: flag, caching disabled, format bump |
//!
//! A non-valid cache is never removed before the build runs. The store is
//! cleared unconditionally at save time, then refilled, then signed.

pub mod lifecycle;
pub mod select;
pub mod signature;
pub mod status;
pub mod store;
pub mod transfer;

pub use lifecycle::{AfterBuild, BeforeBuild, CacheLifecycle};
pub use select::{cache_directories, select_directories, CacheDirectories, CachePath};
pub use signature::{Signature, SignatureStore};
pub use status::{CacheReport, CacheStatus, Invalidation};
pub use store::CacheStore;
pub use transfer::{summarize_tree, tree_digest, SkipReason, TransferOutcome, TreeSummary};
