use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueHint, builder::BoolishValueParser};

/// Command-line arguments for the favicons binary.
#[derive(Debug, Parser)]
#[command(
    name = "favicons",
    version,
    about = "Generate favicons, touch icons and tiles for a site"
)]
pub struct CliArgs {
    /// Optional path to a configuration file.
    #[arg(
        long = "config-file",
        env = "FAVICONS_CONFIG_FILE",
        value_name = "PATH",
        global = true
    )]
    pub config_file: Option<PathBuf>,

    #[command(flatten)]
    pub overrides: Overrides,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand, Clone)]
pub enum Command {
    /// Treat the start page as published: refresh settings and regenerate icons.
    Publish,
    /// Remove generated icons, keeping the favicons folder.
    Clean,
    /// Remove generated icons and the favicons folder.
    Delete,
    /// Print the resolved favicon settings as JSON.
    Settings,
    /// Render browserconfig.xml.
    Browserconfig(DocumentArgs),
    /// Render manifest.json.
    Manifest(DocumentArgs),
}

#[derive(Debug, Args, Default, Clone)]
pub struct DocumentArgs {
    /// Write the document to FILE instead of stdout.
    #[arg(long = "out", value_name = "FILE", value_hint = ValueHint::FilePath)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args, Default, Clone)]
pub struct Overrides {
    /// Override the base log level (trace|debug|info|warn|error).
    #[arg(long = "log-level", value_name = "LEVEL", global = true)]
    pub log_level: Option<String>,

    /// Toggle JSON logging.
    #[arg(
        long = "log-json",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub log_json: Option<bool>,

    /// Override the site content file.
    #[arg(
        long = "site-file",
        value_name = "PATH",
        value_hint = ValueHint::FilePath,
        global = true
    )]
    pub site_file: Option<PathBuf>,

    /// Override the directory blobs are stored under.
    #[arg(
        long = "output-root",
        value_name = "PATH",
        value_hint = ValueHint::DirPath,
        global = true
    )]
    pub output_root: Option<PathBuf>,

    /// Override the number of variants resized concurrently.
    #[arg(long = "pipeline-concurrency", value_name = "COUNT", global = true)]
    pub pipeline_concurrency: Option<u64>,

    /// Override the regeneration timeout.
    #[arg(long = "pipeline-timeout-seconds", value_name = "SECONDS", global = true)]
    pub pipeline_timeout_seconds: Option<u64>,

    /// Override the resampling filter (nearest|triangle|catmull-rom|gaussian|lanczos3).
    #[arg(long = "resize-filter", value_name = "FILTER", global = true)]
    pub resize_filter: Option<String>,

    /// Toggle the settings cache.
    #[arg(
        long = "cache-enabled",
        value_name = "BOOL",
        value_parser = BoolishValueParser::new(),
        global = true
    )]
    pub cache_enabled: Option<bool>,
}
