//! Individual cache operations: restore, save, clear, sign

use super::{lifecycle, run_blocking};
use crate::cache::{CacheDirectories, CacheLifecycle, CacheStore, TransferOutcome};
use crate::cli::args::{ClearArgs, SignArgs, TransferArgs};
use crate::config::Config;
use crate::error::CairnResult;
use crate::ui::{self, TransferProgress, UiContext};
use tracing::debug;

/// Explicit paths if given, otherwise the project's selection
fn directories(engine: &CacheLifecycle, paths: &[String]) -> CairnResult<CacheDirectories> {
    if paths.is_empty() {
        engine.directories()
    } else {
        CacheDirectories::from_paths(paths)
    }
}

fn print_outcomes(ctx: &UiContext, outcomes: &[TransferOutcome]) {
    for outcome in outcomes {
        ui::outcome(ctx, outcome);
    }
}

/// Execute the restore command
pub async fn restore(args: TransferArgs, config: &Config) -> CairnResult<()> {
    let ctx = UiContext::detect();
    let engine = lifecycle(&args.locations, None, config)?;
    let selection = directories(&engine, &args.paths)?;

    ui::section(&ctx, "Restoring cache directories");
    let progress = TransferProgress::start(&ctx, "Restoring cache");
    let outcomes = run_blocking(move || engine.restore(&selection)).await?;
    progress.finish();

    print_outcomes(&ctx, &outcomes);
    Ok(())
}

/// Execute the save command
pub async fn save(args: TransferArgs, config: &Config) -> CairnResult<()> {
    let ctx = UiContext::detect();
    let engine = lifecycle(&args.locations, None, config)?;
    let selection = directories(&engine, &args.paths)?;

    ui::section(&ctx, "Caching directories");
    let progress = TransferProgress::start(&ctx, "Saving cache");
    let outcomes = run_blocking(move || engine.save(&selection)).await?;
    progress.finish();

    print_outcomes(&ctx, &outcomes);
    Ok(())
}

/// Execute the clear command
pub async fn clear(args: ClearArgs, config: &Config) -> CairnResult<()> {
    let ctx = UiContext::detect().with_auto_yes(args.yes);
    let store = CacheStore::from_config(&args.locations.store, &config.cache)?;

    let prompt = format!("Remove everything cached in {}?", store.root().display());
    if !ui::confirm(&ctx, &prompt, true).await? {
        ui::remark(&ctx, "Aborted.");
        return Ok(());
    }

    debug!("Clearing cache store {}", store.root().display());
    let root = store.root().display().to_string();
    run_blocking(move || store.clear()).await?;
    ui::step_ok_detail(&ctx, "Cache cleared", &root);
    Ok(())
}

/// Execute the sign command
pub async fn sign(args: SignArgs, config: &Config) -> CairnResult<()> {
    let ctx = UiContext::detect();
    let engine = lifecycle(&args.locations, Some(&args.signature), config)?;
    let signature = engine.signature().to_string();

    run_blocking(move || engine.save_signature()).await?;
    ui::step_ok_detail(&ctx, "Saved cache signature", &signature);
    Ok(())
}
