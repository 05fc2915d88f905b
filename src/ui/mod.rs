//! Console output for cache commands
//!
//! Interactive terminals get `cliclack` styling and `indicatif` spinners.
//! Build logs (no TTY, CI or buildpack environment) get the plain
//! `-----> Section` / indented step format buildpack output uses.

mod context;
mod output;
mod progress;
mod prompts;

pub use context::UiContext;
pub use output::{
    key_value, key_value_status, outcome, remark, section, step_error_detail, step_info,
    step_ok, step_ok_detail, step_warn, step_warn_hint,
};
pub use progress::TransferProgress;
pub use prompts::confirm;
