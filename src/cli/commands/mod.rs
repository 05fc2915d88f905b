//! CLI command implementations

pub mod build;
pub mod config;
pub mod directories;
pub mod info;
pub mod status;
pub mod transfer;

pub use build::{after_build, before_build};
pub use config::execute as config;
pub use directories::execute as dirs;
pub use info::execute as info;
pub use status::execute as status;
pub use transfer::{clear, restore, save, sign};

use crate::cache::CacheLifecycle;
use crate::cli::args::{Locations, SignatureArgs};
use crate::config::Config;
use crate::error::{CairnError, CairnResult};

/// Run blocking filesystem work off the async runtime
pub(crate) async fn run_blocking<T, F>(work: F) -> CairnResult<T>
where
    F: FnOnce() -> CairnResult<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| CairnError::Internal(format!("cache task failed: {}", e)))?
}

/// Bind the cache engine to the command's locations and signature
pub(crate) fn lifecycle(
    locations: &Locations,
    signature: Option<&SignatureArgs>,
    config: &Config,
) -> CairnResult<CacheLifecycle> {
    CacheLifecycle::load(
        &locations.workspace,
        &locations.store,
        &config.cache,
        signature.and_then(|s| s.signature.as_deref()),
    )
}
