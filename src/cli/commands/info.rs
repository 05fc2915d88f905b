//! Info command - show what the cache store holds

use super::run_blocking;
use crate::cache::{summarize_tree, CacheStore, TreeSummary};
use crate::cli::args::{InfoArgs, OutputFormat};
use crate::config::Config;
use crate::error::{CairnError, CairnResult};
use crate::ui::{self, UiContext};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs;

/// Format bytes as human-readable size (e.g., "1.5 GB")
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.1} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[derive(Debug, Serialize)]
struct EntryInfo {
    name: String,
    #[serde(flatten)]
    summary: TreeSummary,
}

#[derive(Debug, Serialize)]
struct StoreInfo {
    root: String,
    signature: Option<String>,
    format_version: Option<u32>,
    signed_at: Option<DateTime<Utc>>,
    entries: Vec<EntryInfo>,
}

fn inspect(store: &CacheStore) -> CairnResult<StoreInfo> {
    let signatures = store.signatures();
    let signature = signatures.read_signature()?.map(|s| s.to_string());
    let format_version = signatures.read_format()?.flatten();

    let signed_at = match fs::metadata(signatures.signature_path()) {
        Ok(meta) => meta.modified().ok().map(DateTime::<Utc>::from),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => {
            return Err(CairnError::io(
                format!("inspecting {}", signatures.signature_path().display()),
                e,
            ))
        }
    };

    let mut entries = Vec::new();
    for name in store.entry_names()? {
        let summary = summarize_tree(&store.entries_dir().join(&name))?;
        entries.push(EntryInfo { name, summary });
    }

    Ok(StoreInfo {
        root: store.root().display().to_string(),
        signature,
        format_version,
        signed_at,
        entries,
    })
}

/// Execute the info command
pub async fn execute(args: InfoArgs, config: &Config) -> CairnResult<()> {
    let store = CacheStore::from_config(&args.store, &config.cache)?;
    let info = run_blocking(move || inspect(&store)).await?;

    if args.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&info)?);
        return Ok(());
    }

    let ctx = UiContext::detect();
    ui::section(&ctx, "Cache store");
    ui::key_value(&ctx, "root", &info.root);
    ui::key_value_status(
        &ctx,
        "signature",
        info.signature.as_deref().unwrap_or("(none)"),
        info.signature.is_some(),
    );
    if let Some(format_version) = info.format_version {
        ui::key_value(&ctx, "format", &format_version.to_string());
    }
    if let Some(signed_at) = info.signed_at {
        ui::key_value(&ctx, "signed", &signed_at.format("%Y-%m-%d %H:%M:%S UTC").to_string());
    }

    if info.entries.is_empty() {
        ui::remark(&ctx, "No cached directories.");
        return Ok(());
    }

    let total: u64 = info.entries.iter().map(|e| e.summary.bytes).sum();
    ui::section(&ctx, &format!("Cached directories ({})", format_bytes(total)));
    for entry in &info.entries {
        ui::step_ok_detail(
            &ctx,
            &entry.name,
            &format!(
                "{} files, {}, sha256 {}",
                entry.summary.files,
                format_bytes(entry.summary.bytes),
                &entry.summary.digest[..12]
            ),
        );
    }

    Ok(())
}
