//! Application configuration: config file defaults layered under CLI flags.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use teams_inventory_core::graph::{CONNECT_TIMEOUT_SECS, DEFAULT_BASE_URL, READ_TIMEOUT_SECS};
use teams_inventory_core::pacing::DEFAULT_TEAM_DELAY;
use teams_inventory_core::walker::{ExtractionMode, WalkOptions};

use crate::cli::Args;

/// Environment variables checked for the bearer token, in order.
const TOKEN_VARS: &[&str] = &["ACCESS_TOKEN", "MS_ACCESS_TOKEN"];

const MAX_TEAM_DELAY_MS: u64 = 60_000;

/// Values read from `config.toml`; every field is optional.
#[derive(Debug, Clone, Default)]
pub struct FileConfig {
    /// Graph API base URL.
    pub base_url: Option<String>,
    /// Output file for notebook runs.
    pub notebooks_output: Option<PathBuf>,
    /// Output file for planner runs.
    pub planner_output: Option<PathBuf>,
    /// Output file for task export runs.
    pub tasks_output: Option<PathBuf>,
    /// Pre-fetched team list.
    pub teams_file: Option<PathBuf>,
    /// Pause between teams in milliseconds.
    pub team_delay_ms: Option<u64>,
    /// Keep going after a rejected token.
    pub continue_on_auth_error: Option<bool>,
    /// HTTP connect timeout in seconds.
    pub connect_timeout_secs: Option<u64>,
    /// HTTP read timeout in seconds.
    pub read_timeout_secs: Option<u64>,
    /// Default verbosity mode.
    pub verbosity: Option<VerbositySetting>,
}

impl FileConfig {
    /// Validates config values against runtime and CLI constraints.
    pub fn validate(&self) -> Result<()> {
        if let Some(delay) = self.team_delay_ms
            && delay > MAX_TEAM_DELAY_MS
        {
            bail!(
                "Invalid config value for `team_delay_ms`: {delay}. Expected range: 0..={MAX_TEAM_DELAY_MS}"
            );
        }
        if let Some(base_url) = &self.base_url
            && url::Url::parse(base_url).is_err()
        {
            bail!("Invalid config value for `base_url`: '{base_url}' is not a URL");
        }
        validate_timeout_secs("connect_timeout_secs", self.connect_timeout_secs)?;
        validate_timeout_secs("read_timeout_secs", self.read_timeout_secs)?;
        Ok(())
    }
}

fn validate_timeout_secs(field: &str, value: Option<u64>) -> Result<()> {
    let Some(value) = value else {
        return Ok(());
    };
    if !(1..=3600).contains(&value) {
        bail!("Invalid config value for `{field}`: {value}. Expected range: 1..=3600");
    }
    Ok(())
}

/// Supported config verbosity labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerbositySetting {
    Default,
    Verbose,
    Quiet,
    Debug,
}

/// Resolves default config path.
///
/// Priority:
/// 1. `$XDG_CONFIG_HOME/teams-inventory/config.toml`
/// 2. `$HOME/.config/teams-inventory/config.toml`
#[must_use]
pub fn resolve_default_config_path() -> Option<PathBuf> {
    if let Some(xdg_config_home) = env_var_non_empty_os("XDG_CONFIG_HOME") {
        return Some(
            PathBuf::from(xdg_config_home)
                .join("teams-inventory")
                .join("config.toml"),
        );
    }

    let home = env_var_non_empty_os("HOME")?;
    Some(
        PathBuf::from(home)
            .join(".config")
            .join("teams-inventory")
            .join("config.toml"),
    )
}

fn env_var_non_empty_os(name: &str) -> Option<std::ffi::OsString> {
    let value = env::var_os(name)?;
    if value.is_empty() { None } else { Some(value) }
}

/// Loads config from the default path if present.
pub fn load_default_file_config() -> Result<Option<FileConfig>> {
    let Some(path) = resolve_default_config_path() else {
        return Ok(None);
    };
    if !path.exists() {
        return Ok(None);
    }
    load_file_config(&path).map(Some)
}

fn load_file_config(path: &Path) -> Result<FileConfig> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
    parse_config_str(&raw)
        .with_context(|| format!("Failed to parse config file '{}'", path.display()))
}

fn parse_config_str(raw: &str) -> Result<FileConfig> {
    let mut cfg = FileConfig::default();
    for (line_index, raw_line) in raw.lines().enumerate() {
        let line = strip_inline_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let Some((raw_key, raw_value)) = line.split_once('=') else {
            bail!(
                "Invalid config syntax on line {}: expected key = value",
                line_index + 1
            );
        };

        let key = raw_key.trim();
        let value = raw_value.trim();
        let line_number = line_index + 1;
        let context = || format!("Invalid `{key}` value on line {line_number}");

        match key {
            "base_url" => {
                cfg.base_url = Some(parse_string_literal(value).with_context(context)?);
            }
            "notebooks_output" => {
                cfg.notebooks_output =
                    Some(PathBuf::from(parse_string_literal(value).with_context(context)?));
            }
            "planner_output" => {
                cfg.planner_output =
                    Some(PathBuf::from(parse_string_literal(value).with_context(context)?));
            }
            "tasks_output" => {
                cfg.tasks_output =
                    Some(PathBuf::from(parse_string_literal(value).with_context(context)?));
            }
            "teams_file" => {
                cfg.teams_file =
                    Some(PathBuf::from(parse_string_literal(value).with_context(context)?));
            }
            "team_delay_ms" => {
                cfg.team_delay_ms = Some(parse_integer_u64(value).with_context(context)?);
            }
            "continue_on_auth_error" => {
                cfg.continue_on_auth_error = Some(parse_boolean(value).with_context(context)?);
            }
            "connect_timeout_secs" => {
                cfg.connect_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "read_timeout_secs" => {
                cfg.read_timeout_secs = Some(parse_integer_u64(value).with_context(context)?);
            }
            "verbosity" => {
                let parsed = parse_string_literal(value).with_context(context)?;
                cfg.verbosity = Some(parse_verbosity(&parsed).with_context(|| {
                    format!("Invalid `verbosity` value '{parsed}' on line {line_number}")
                })?);
            }
            unknown => {
                bail!("Unknown configuration key: '{unknown}' on line {line_number}");
            }
        }
    }
    cfg.validate()?;
    Ok(cfg)
}

fn strip_inline_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

fn parse_string_literal(raw_value: &str) -> Result<String> {
    if raw_value.len() < 2 || !raw_value.starts_with('"') || !raw_value.ends_with('"') {
        bail!("Expected double-quoted string");
    }
    Ok(raw_value[1..raw_value.len() - 1].to_string())
}

fn parse_integer_u64(raw_value: &str) -> Result<u64> {
    let token = raw_value.trim();
    if token.is_empty() {
        bail!("Expected integer value");
    }
    let value = token.parse::<i128>()?;
    if value < 0 {
        bail!("Expected non-negative integer");
    }
    u64::try_from(value).map_err(|_| anyhow::anyhow!("Integer value out of range for u64"))
}

fn parse_verbosity(value: &str) -> Result<VerbositySetting> {
    match value {
        "default" => Ok(VerbositySetting::Default),
        "verbose" => Ok(VerbositySetting::Verbose),
        "quiet" => Ok(VerbositySetting::Quiet),
        "debug" => Ok(VerbositySetting::Debug),
        _ => bail!("Expected one of: default, verbose, quiet, debug"),
    }
}

fn parse_boolean(raw_value: &str) -> Result<bool> {
    match raw_value.trim() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => bail!("Expected 'true' or 'false'"),
    }
}

/// Effective settings for one run.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub mode: ExtractionMode,
    pub base_url: String,
    pub output: PathBuf,
    pub teams_file: Option<PathBuf>,
    pub team_delay: Duration,
    pub connect_timeout_secs: u64,
    pub read_timeout_secs: u64,
    pub walk: WalkOptions,
    /// Log level used when `RUST_LOG` is unset.
    pub default_log_level: &'static str,
}

/// Merges CLI flags over config file values over built-in defaults.
#[must_use]
pub fn resolve_settings(args: &Args, config: Option<&FileConfig>) -> RunSettings {
    let file = config.cloned().unwrap_or_default();
    let mode = args.command.mode();

    let configured_output = match mode {
        ExtractionMode::Notebooks => file.notebooks_output,
        ExtractionMode::Planner => file.planner_output,
        ExtractionMode::Tasks => file.tasks_output,
    };
    let team_delay = args
        .team_delay_ms
        .or(file.team_delay_ms)
        .map_or(DEFAULT_TEAM_DELAY, Duration::from_millis);

    RunSettings {
        mode,
        base_url: args
            .base_url
            .clone()
            .or(file.base_url)
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        output: args
            .output
            .clone()
            .or(configured_output)
            .unwrap_or_else(|| PathBuf::from(mode.default_output())),
        teams_file: args.teams_file.clone().or(file.teams_file),
        team_delay,
        connect_timeout_secs: file.connect_timeout_secs.unwrap_or(CONNECT_TIMEOUT_SECS),
        read_timeout_secs: file.read_timeout_secs.unwrap_or(READ_TIMEOUT_SECS),
        walk: WalkOptions {
            team_filter: args.teams.clone(),
            continue_on_auth_error: args.continue_on_auth_error
                || file.continue_on_auth_error.unwrap_or(false),
            plan_ids: args.command.plan_ids().to_vec(),
        },
        default_log_level: default_log_level(args.verbose, args.quiet, file.verbosity),
    }
}

// Priority: quiet flag > verbose flag > config verbosity > info
fn default_log_level(verbose: u8, quiet: bool, configured: Option<VerbositySetting>) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => {}
        1 => return "debug",
        _ => return "trace",
    }
    match configured {
        Some(VerbositySetting::Quiet) => "error",
        Some(VerbositySetting::Verbose) => "debug",
        Some(VerbositySetting::Debug) => "trace",
        Some(VerbositySetting::Default) | None => "info",
    }
}

/// Reads the bearer token after loading `.env` from the working directory.
pub fn read_access_token() -> Result<String> {
    let _ = dotenvy::dotenv();
    token_from(|name| env::var(name).ok())
}

fn token_from(lookup: impl Fn(&str) -> Option<String>) -> Result<String> {
    TOKEN_VARS
        .iter()
        .find_map(|name| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        })
        .with_context(|| {
            format!(
                "No access token found. Set {} (or put it in a .env file)",
                TOKEN_VARS.join(" or ")
            )
        })
}
