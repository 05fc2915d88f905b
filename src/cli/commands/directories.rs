//! Dirs command - list declared cache directories

use crate::cache::{cache_directories, select_directories};
use crate::cli::args::DirsArgs;
use crate::config::Config;
use crate::error::{CairnError, CairnResult};
use crate::project::ProjectConfig;

/// Execute the dirs command
///
/// Prints one path per line. Without `--resolved` nothing is printed when the
/// project declares no directories, leaving the default to the caller.
pub async fn execute(args: DirsArgs, config: &Config) -> CairnResult<()> {
    if !args.workspace.is_dir() {
        return Err(CairnError::WorkspaceNotFound(args.workspace));
    }
    let project = ProjectConfig::load(&args.workspace)?;

    if args.resolved {
        let selection = select_directories(&project, &config.cache.default_directory)?;
        for path in &selection {
            println!("{}", path);
        }
    } else {
        for path in cache_directories(&project) {
            println!("{}", path);
        }
    }

    Ok(())
}
