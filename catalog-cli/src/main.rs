//! Catalog CLI: terminal console for the model catalog.
//!
//! Lists and filters models and MCP servers, shows catalog sources and
//! manages source configurations through the catalog BFF.

mod commands;
mod render;

use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Browse and filter the model catalog
#[derive(Parser, Debug)]
#[command(name = "catalog", version, about, long_about = None)]
struct Cli {
    /// Workspace directory (for `.catalog/config.toml`)
    #[arg(short, long, default_value = ".")]
    workspace: PathBuf,

    /// Override the BFF base URL
    #[arg(long)]
    base_url: Option<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-essential output
    #[arg(short, long)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Filter flags shared by the list commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct FilterArgs {
    /// Filter as KEY=VALUE, repeatable (e.g. provider="Red Hat", max_latency=300)
    #[arg(short, long = "filter", value_name = "KEY=VALUE")]
    pub filters: Vec<String>,

    /// Latency field the threshold applies to, e.g. ttft_p90 (remembered)
    #[arg(long, value_name = "METRIC_PERCENTILE")]
    pub latency_field: Option<String>,

    /// Latency threshold in milliseconds for the selected latency field
    #[arg(long, value_name = "MS")]
    pub latency: Option<f64>,
}

/// Paging, sorting and output flags shared by the list commands.
#[derive(clap::Args, Debug, Clone, Default)]
pub(crate) struct ListArgs {
    /// Free-text search
    #[arg(short, long)]
    pub search: Option<String>,

    /// Page size
    #[arg(long)]
    pub page_size: Option<u32>,

    /// Continue from a previous page
    #[arg(long)]
    pub page_token: Option<String>,

    /// Sort by column field
    #[arg(long, value_name = "COLUMN")]
    pub sort: Option<String>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    pub desc: bool,

    /// Print the composed query string instead of sending a request
    #[arg(long)]
    pub dry_run: bool,

    /// Print the raw JSON response
    #[arg(long, conflicts_with = "dry_run")]
    pub json: bool,
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum Commands {
    /// List catalog models
    Models {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        list: ListArgs,
        /// Catalog source id (defaults to the preferred source)
        #[arg(long)]
        source: Option<String>,
        /// Source label scope ("All" for every source)
        #[arg(long)]
        label: Option<String>,
    },
    /// List MCP servers
    Mcp {
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        list: ListArgs,
    },
    /// Show the values and ranges each filter accepts
    FilterOptions {
        /// Restrict to one source
        #[arg(long, conflicts_with = "mcp")]
        source: Option<String>,
        /// MCP server filters instead of model filters
        #[arg(long)]
        mcp: bool,
    },
    /// List catalog sources and manage favorites
    Sources {
        /// Add or remove a favorite source
        #[arg(long, value_name = "ID")]
        favorite: Option<String>,
        /// Make a source the default for `models`
        #[arg(long, value_name = "ID", conflicts_with = "clear_preferred")]
        prefer: Option<String>,
        /// Forget the preferred source
        #[arg(long)]
        clear_preferred: bool,
    },
    /// Manage catalog source configurations
    SourceConfigs {
        #[command(subcommand)]
        action: SourceConfigAction,
    },
    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum SourceConfigAction {
    /// List source configurations
    List,
    /// Show one source configuration
    Show { id: String },
    /// Add a source
    Create {
        /// Source id
        #[arg(long)]
        id: String,
        /// Display name
        #[arg(long)]
        name: String,
        /// Source type: yaml or hf
        #[arg(long = "type", value_name = "TYPE")]
        source_type: String,
        /// Catalog YAML file for yaml sources
        #[arg(long)]
        yaml_file: Option<PathBuf>,
        /// Hugging Face organization for hf sources
        #[arg(long)]
        organization: Option<String>,
        /// Environment variable holding the Hugging Face API key
        #[arg(long)]
        api_key_env: Option<String>,
        /// Label, repeatable
        #[arg(long = "label")]
        labels: Vec<String>,
        /// Create the source disabled
        #[arg(long)]
        disabled: bool,
    },
    /// Change a source
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long, conflicts_with = "disable")]
        enable: bool,
        #[arg(long)]
        disable: bool,
        /// Replace labels, repeatable
        #[arg(long = "label")]
        labels: Vec<String>,
        /// Replace included model patterns, repeatable
        #[arg(long = "include")]
        included: Vec<String>,
        /// Replace excluded model patterns, repeatable
        #[arg(long = "exclude")]
        excluded: Vec<String>,
    },
    /// Delete sources; default sources cannot be deleted
    Delete {
        ids: Vec<String>,
        /// Delete every source that is not a default source
        #[arg(long, conflicts_with = "ids")]
        all_custom: bool,
    },
}

#[derive(clap::Subcommand, Debug)]
pub(crate) enum ConfigAction {
    /// Create a default `.catalog/config.toml` in the workspace
    Init,
    /// Show the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();

    let workspace = cli
        .workspace
        .canonicalize()
        .unwrap_or_else(|_| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")));

    let config = catalog_core::config::load_config(Some(&workspace), None)?;

    // Set up tracing: human-readable stderr + JSON file logging
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_filter(EnvFilter::new(filter));

    let mut _guard = None;
    let json_layer = match config.logging.log_dir().filter(|_| config.logging.file_logging) {
        Some(log_dir) if std::fs::create_dir_all(&log_dir).is_ok() => {
            let file_appender = tracing_appender::rolling::daily(&log_dir, "catalog.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            _guard = Some(guard);
            Some(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(non_blocking)
                    .with_filter(EnvFilter::new("debug")),
            )
        }
        _ => None,
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    commands::handle_command(cli.command, &workspace, config, cli.base_url).await
}
