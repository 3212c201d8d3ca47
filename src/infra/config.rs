use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cli::{AppContext, InitArgs, OutputFormat};
use crate::core::winner::SelectionParams;
use crate::infra::columns::ColumnPatterns;

/// Config files looked up in the working directory, first hit wins
pub const CONFIG_FILES: [&str; 4] = ["cannibal.toml", "cannibal.yaml", "cannibal.json", ".cannibal.toml"];

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config
{
    /// Decision rule settings
    pub analysis: SelectionParams,

    /// Header substrings used to locate report columns
    pub columns: ColumnPatterns,

    /// Default output settings
    pub output: OutputConfig,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig
{
    pub format: OutputFormat,
    pub output_dir: Option<PathBuf>,
}

impl Default for OutputConfig
{
    fn default() -> Self
    {
        Self { format: OutputFormat::Text, output_dir: None }
    }
}

/// Load layered configuration: an explicit file (or the first of
/// [`CONFIG_FILES`] present), then `CANNIBAL_` environment variables with
/// `__` separating nested keys, e.g. `CANNIBAL_ANALYSIS__MIN_ORDERS=3`.
pub fn load_config(explicit: Option<&Path>) -> Result<Config>
{
    let mut builder = config::Config::builder();

    match explicit
    {
        Some(path) =>
        {
            if !path.exists()
            {
                anyhow::bail!("Config file not found: {}", path.display());
            }
            builder = builder.add_source(config::File::from(path));
        }
        None =>
        {
            for path in &CONFIG_FILES
            {
                if Path::new(path).exists()
                {
                    debug!(path = *path, "using config file");
                    builder = builder.add_source(config::File::with_name(path));
                    break;
                }
            }
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("CANNIBAL")
            .prefix_separator("_")
            .separator("__")
            .try_parsing(true),
    );

    let cfg = builder
        .build()
        .context("Failed to load configuration")?;
    let parsed: Config = cfg
        .try_deserialize()
        .context("Failed to parse configuration")?;

    Ok(parsed)
}

pub fn init(
    args: InitArgs,
    ctx: &AppContext,
) -> Result<()>
{
    let config_path = args
        .path
        .join("cannibal.toml");

    if config_path.exists() && !args.force
    {
        anyhow::bail!(
            "Config file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    let config = Config::default();
    let toml_string =
        toml::to_string_pretty(&config).context("Failed to serialize default config")?;

    if ctx.dry_run
    {
        if !ctx.quiet
        {
            println!("DRY RUN: Would write {}:\n{}", config_path.display(), toml_string);
        }
        return Ok(());
    }

    std::fs::write(&config_path, toml_string).context("Failed to write config file")?;

    if !ctx.quiet
    {
        println!("Created config file at {}", config_path.display());
    }
    Ok(())
}
