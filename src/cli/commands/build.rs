//! Lifecycle commands invoked by the buildpack around the build

use super::{lifecycle, run_blocking};
use crate::cli::args::{AfterBuildArgs, BeforeBuildArgs};
use crate::config::Config;
use crate::error::CairnResult;
use crate::ui::{self, TransferProgress, UiContext};

/// Execute the before-build command
///
/// Cache misses are reported and exit successfully; the build proceeds cold.
pub async fn before_build(args: BeforeBuildArgs, config: &Config) -> CairnResult<()> {
    let ctx = UiContext::detect();
    let engine = lifecycle(&args.locations, Some(&args.signature), config)?;
    let invalidate = args.invalidate;

    ui::section(&ctx, "Restoring cache");
    let progress = TransferProgress::start(&ctx, "Restoring cache");
    let result = run_blocking(move || engine.before_build(invalidate)).await?;
    progress.finish();

    if !result.report.status.is_valid() {
        ui::step_info(
            &ctx,
            &format!(
                "Skipping cache restore ({}): {}",
                result.report.status, result.report.reason
            ),
        );
        return Ok(());
    }

    ui::step_info(&ctx, "Loading cached directories:");
    for outcome in &result.restored {
        ui::outcome(&ctx, outcome);
    }
    Ok(())
}

/// Execute the after-build command
pub async fn after_build(args: AfterBuildArgs, config: &Config) -> CairnResult<()> {
    let ctx = UiContext::detect();
    let engine = lifecycle(&args.locations, Some(&args.signature), config)?;

    ui::section(&ctx, "Caching build");
    let progress = TransferProgress::start(&ctx, "Saving cache");
    let result = run_blocking(move || engine.after_build()).await?;
    progress.finish();

    ui::step_info(&ctx, "Saving cache directories:");
    for outcome in &result.saved {
        ui::outcome(&ctx, outcome);
    }
    ui::step_ok_detail(&ctx, "Cache signature", result.signature.as_str());
    Ok(())
}
