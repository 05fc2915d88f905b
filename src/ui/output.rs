//! Output functions for consistent build log formatting

use super::context::UiContext;
use crate::cache::TransferOutcome;
use console::{style, Style};

/// Indentation used for step lines under a `----->` section header
const STEP_INDENT: &str = "       ";

/// Display a section header
pub fn section(ctx: &UiContext, title: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::info(style(title).bold()).ok();
    } else {
        println!("-----> {}", title);
    }
}

/// Display a success step
pub fn step_ok(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(message).ok();
    } else {
        println!("{}{}", STEP_INDENT, message);
    }
}

/// Display a success step with detail
pub fn step_ok_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::success(format!("{} ({})", message, style(detail).dim())).ok();
    } else {
        println!("{}{} ({})", STEP_INDENT, message, detail);
    }
}

/// Display a warning step
pub fn step_warn(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(message).ok();
    } else {
        println!("{}{} {}", STEP_INDENT, style("!").yellow(), message);
    }
}

/// Display a warning step with hint
pub fn step_warn_hint(ctx: &UiContext, message: &str, hint: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::warning(format!("{} - {}", message, style(hint).dim())).ok();
    } else {
        println!("{}{} {} - {}", STEP_INDENT, style("!").yellow(), message, hint);
    }
}

/// Display an error step with detail
pub fn step_error_detail(ctx: &UiContext, message: &str, detail: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::error(format!("{}: {}", message, style(detail).red())).ok();
    } else {
        eprintln!("{}{}: {}", STEP_INDENT, message, detail);
    }
}

/// Display an info step
pub fn step_info(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::info(message).ok();
    } else {
        println!("{}{}", STEP_INDENT, message);
    }
}

/// Display one transfer result (`- node_modules`, `- vendor (nothing to cache)`)
pub fn outcome(ctx: &UiContext, outcome: &TransferOutcome) {
    let line = outcome.to_string();
    if ctx.use_fancy_output() {
        if outcome.is_copied() {
            cliclack::log::success(line).ok();
        } else {
            cliclack::log::remark(style(line).dim()).ok();
        }
    } else {
        println!("{}{}", STEP_INDENT, line);
    }
}

/// Display a remark/hint
pub fn remark(ctx: &UiContext, message: &str) {
    if ctx.use_fancy_output() {
        cliclack::log::remark(message).ok();
    } else {
        println!("{}{}", STEP_INDENT, style(message).dim());
    }
}

/// Print styled key-value pair
pub fn key_value(ctx: &UiContext, key: &str, value: &str) {
    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value);
    } else {
        println!("{}{}: {}", STEP_INDENT, key, value);
    }
}

/// Print styled key-value with status color
pub fn key_value_status(ctx: &UiContext, key: &str, value: &str, ok: bool) {
    let value_style = if ok {
        Style::new().green()
    } else {
        Style::new().yellow()
    };

    if ctx.use_fancy_output() {
        println!("  {}: {}", style(key).dim(), value_style.apply_to(value));
    } else {
        println!("{}{}: {}", STEP_INDENT, key, value);
    }
}
