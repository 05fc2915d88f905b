//! Status command - report whether the cache can be restored

use super::{lifecycle, run_blocking};
use crate::cli::args::{OutputFormat, StatusArgs};
use crate::config::Config;
use crate::error::CairnResult;
use crate::ui::{self, UiContext};
use serde::Serialize;

#[derive(Serialize)]
struct StatusJson {
    status: String,
    reason: String,
    signature: String,
}

/// Execute the status command
pub async fn execute(args: StatusArgs, config: &Config) -> CairnResult<()> {
    let engine = lifecycle(&args.locations, Some(&args.signature), config)?;
    let invalidate = args.invalidate;

    let (engine, report) = run_blocking(move || {
        let report = engine.status(invalidate)?;
        Ok((engine, report))
    })
    .await?;

    match args.format {
        OutputFormat::Json => {
            let json = StatusJson {
                status: report.status.to_string(),
                reason: report.reason,
                signature: engine.signature().to_string(),
            };
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text => {
            let ctx = UiContext::detect();
            ui::section(&ctx, "Cache status");
            ui::key_value_status(
                &ctx,
                "status",
                report.status.as_label(),
                report.status.is_valid(),
            );
            ui::key_value(&ctx, "reason", &report.reason);
            ui::key_value(&ctx, "signature", engine.signature().as_str());
        }
    }

    Ok(())
}
