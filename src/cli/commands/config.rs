//! Config command - show or edit configuration

use crate::cli::args::{ConfigAction, ConfigArgs};
use crate::config::{Config, ConfigManager};
use crate::error::{ResolveError, ResolveResult};
use crate::ui::{self, UiContext};

const VALID_KEYS: &[&str] = &[
    "general.log_format",
    "repository.root",
    "resolution.max_concurrent_artifacts",
    "resolution.checksums",
];

/// Execute the config command
pub async fn execute(
    args: ConfigArgs,
    manager: &ConfigManager,
    config: &Config,
) -> ResolveResult<()> {
    match args.action {
        None | Some(ConfigAction::Show) => show_config(config)?,
        Some(ConfigAction::Path) => show_path(manager),
        Some(ConfigAction::Init { force }) => init_config(manager, force).await?,
        Some(ConfigAction::Set { key, value }) => set_value(manager, config, &key, &value).await?,
    }

    Ok(())
}

fn show_config(config: &Config) -> ResolveResult<()> {
    let toml = toml::to_string_pretty(config)?;
    println!("{}", toml);
    Ok(())
}

fn show_path(manager: &ConfigManager) {
    println!("{}", manager.path().display());
}

async fn init_config(manager: &ConfigManager, force: bool) -> ResolveResult<()> {
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

    ui::step_ok_detail(
        &ctx,
        "Configuration initialized",
        &path.display().to_string(),
    );

    Ok(())
}

async fn set_value(
    manager: &ConfigManager,
    config: &Config,
    key: &str,
    value: &str,
) -> ResolveResult<()> {
    let ctx = UiContext::detect();
    let config = apply(config.clone(), key, value)?;

    manager.save(&config).await?;
    ui::step_ok(&ctx, &format!("Set {} = {}", key, value));

    Ok(())
}

/// Set a dot-separated key on a copy of the configuration
fn apply(mut config: Config, key: &str, value: &str) -> ResolveResult<Config> {
    let parts: Vec<&str> = key.split('.').collect();

    match parts.as_slice() {
        ["general", "log_format"] => match value {
            "text" | "json" => config.general.log_format = value.to_string(),
            _ => {
                return Err(ResolveError::User(format!(
                    "Invalid log format: {}. Use text/json",
                    value
                )))
            }
        },
        ["repository", "root"] => config.repository.root = value.into(),
        ["resolution", "max_concurrent_artifacts"] => {
            config.resolution.max_concurrent_artifacts = parse_usize(value)?
        }
        ["resolution", "checksums"] => config.resolution.checksums = parse_bool(value)?,
        ["artifact_types", extension, attribute] => {
            config
                .artifact_types
                .entry((*extension).to_string())
                .or_default()
                .insert((*attribute).to_string(), value.to_string());
        }
        _ => {
            return Err(ResolveError::User(format!(
                "Unknown config key: {} (valid keys: {}, artifact_types.<ext>.<attribute>)",
                key,
                VALID_KEYS.join(", ")
            )))
        }
    }

    Ok(config)
}

fn parse_bool(value: &str) -> ResolveResult<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ResolveError::User(format!(
            "Invalid boolean value: {}. Use true/false",
            value
        ))),
    }
}

fn parse_usize(value: &str) -> ResolveResult<usize> {
    value
        .parse()
        .map_err(|_| ResolveError::User(format!("Invalid number: {}", value)))
}
