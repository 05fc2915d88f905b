//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{CairnError, CairnResult};
use crate::ui::{self, UiContext};

/// Keys accepted by `config set`
const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "cache.enabled",
    "cache.format_version",
    "cache.namespace",
    "cache.default_directory",
];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    config: &Config,
    manager: &ConfigManager,
) -> CairnResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> CairnResult<()> {
    println!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> CairnResult<()> {
    let ctx = UiContext::detect();
    let path = manager.path();

    if path.exists() && !force {
        ui::step_warn_hint(
            &ctx,
            &format!("Config already exists at {}", path.display()),
            "Use --force to overwrite",
        );
        return Ok(());
    }

    manager.save(&Config::default()).await?;
    ui::step_ok_detail(&ctx, "Configuration initialized", &path.display().to_string());

    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> CairnResult<()> {
    let ctx = UiContext::detect();
    let mut config = config.clone();

    if let Err(e) = apply(&mut config, key, value) {
        ui::step_error_detail(&ctx, "Cannot set config value", &e.to_string());
        ui::remark(&ctx, &format!("Valid keys: {}", VALID_KEYS.join(", ")));
        return Err(e);
    }

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

/// Apply a dotted key assignment to a config
fn apply(config: &mut Config, key: &str, value: &str) -> CairnResult<()> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(CairnError::User(format!(
                    "Invalid log format: {}. Use text or json",
                    value
                )))
            }
        },
        ["cache", "enabled"] => config.cache.enabled = parse_bool(value)?,
        ["cache", "format_version"] => config.cache.format_version = parse_u32(value)?,
        ["cache", "namespace"] => config.cache.namespace = value.to_string(),
        ["cache", "default_directory"] => config.cache.default_directory = value.to_string(),
        _ => return Err(CairnError::User(format!("Unknown config key: {}", key))),
    }

    Ok(())
}

fn parse_bool(value: &str) -> CairnResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(CairnError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_u32(value: &str) -> CairnResult<u32> {
    value
        .parse()
        .map_err(|_| CairnError::User(format!("Invalid number: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn apply_known_keys() {
        let mut config = Config::default();
        apply(&mut config, "cache.enabled", "no").unwrap();
        apply(&mut config, "cache.format_version", "4").unwrap();
        apply(&mut config, "general.log_format", "json").unwrap();

        assert!(!config.cache.enabled);
        assert_eq!(config.cache.format_version, 4);
        assert!(config.general.json_logs());
    }

    #[test]
    fn apply_rejects_unknown_key() {
        let mut config = Config::default();
        let err = apply(&mut config, "cache.size", "10").unwrap_err();
        assert!(err.to_string().contains("Unknown config key"));
    }

    #[test]
    fn apply_rejects_bad_values() {
        let mut config = Config::default();
        assert!(apply(&mut config, "cache.enabled", "maybe").is_err());
        assert!(apply(&mut config, "cache.format_version", "-1").is_err());
        assert!(apply(&mut config, "general.log_format", "xml").is_err());
    }

    #[test]
    fn valid_keys_are_all_settable() {
        for key in VALID_KEYS {
            let mut config = Config::default();
            let value = match *key {
                "cache.enabled" => "true",
                "cache.format_version" => "2",
                "general.log_format" => "text",
                _ => "value",
            };
            apply(&mut config, key, value).unwrap();
        }
    }
}
