//! `BdcConn` CLI - Command-line interface for the `BdcConn` controller manager
//!
//! Provides commands for listing, registering, inspecting, and removing
//! cluster controllers from the persisted configuration.

use std::fmt::Write as _;
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use bdcconn_core::config::ControllerConfigManager;
use bdcconn_core::tree::{ControllerRegistry, TreeNode};

/// `BdcConn` command-line interface for managing cluster controllers
#[derive(Parser)]
#[command(name = "bdcconn-cli")]
#[command(author, version, about = "BdcConn command-line interface")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the configuration directory
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands
#[derive(Subcommand)]
pub enum Commands {
    /// List all controllers
    #[command(about = "List all registered controllers")]
    List {
        /// Output format for the controller list
        #[arg(short, long, default_value = "table", value_enum)]
        format: OutputFormat,
    },

    /// Register a new controller
    #[command(about = "Register a controller, or update it if the URL and username already exist")]
    Add {
        /// Controller management URL (e.g. https://host:30080)
        #[arg(short, long)]
        url: String,

        /// Username to authenticate with
        #[arg(short = 'U', long)]
        username: String,

        /// Password; omit to be prompted on first use
        #[arg(short, long)]
        password: Option<String>,

        /// Remember the password in the configuration file
        #[arg(short, long)]
        remember: bool,
    },

    /// Remove a controller
    #[command(about = "Remove a controller from the configuration")]
    Delete {
        /// Controller management URL
        #[arg(short, long)]
        url: String,

        /// Username the controller was registered under
        #[arg(short = 'U', long)]
        username: String,
    },

    /// Show controller details
    #[command(about = "Show controller details")]
    Show {
        /// Controller management URL
        #[arg(short, long)]
        url: String,

        /// Username the controller was registered under
        #[arg(short = 'U', long)]
        username: String,
    },
}

/// Output format for the list command
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    Table,
    /// Output as JSON
    Json,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match config_manager(cli.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(e.exit_code());
        }
    };

    let result = match cli.command {
        Commands::List { format } => cmd_list(&config, format),
        Commands::Add {
            url,
            username,
            password,
            remember,
        } => cmd_add(&config, &url, &username, password.as_deref(), remember),
        Commands::Delete { url, username } => cmd_delete(&config, &url, &username),
        Commands::Show { url, username } => cmd_show(&config, &url, &username),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(e.exit_code());
    }
}

fn config_manager(config: Option<PathBuf>) -> Result<ControllerConfigManager, CliError> {
    match config {
        Some(dir) => Ok(ControllerConfigManager::with_config_dir(dir)),
        None => ControllerConfigManager::new()
            .map_err(|e| CliError::Config(format!("Failed to initialize config: {e}"))),
    }
}

fn load_registry(config: &ControllerConfigManager) -> Result<ControllerRegistry, CliError> {
    let mut registry = ControllerRegistry::new();
    registry
        .load_saved_controllers(config)
        .map_err(|e| CliError::Config(format!("Failed to load controllers: {e}")))?;
    Ok(registry)
}

/// List controllers command handler
fn cmd_list(config: &ControllerConfigManager, format: OutputFormat) -> Result<(), CliError> {
    let registry = load_registry(config)?;
    let controllers: Vec<&TreeNode> = registry
        .get_children(None)
        .into_iter()
        .filter(|n| n.as_controller().is_some())
        .collect();

    match format {
        OutputFormat::Table => println!("{}", format_table(&controllers)),
        OutputFormat::Json => println!("{}", format_json(&controllers)?),
    }
    Ok(())
}

/// Format controllers as a table string
#[must_use]
pub fn format_table(controllers: &[&TreeNode]) -> String {
    if controllers.is_empty() {
        return "No controllers registered.".to_string();
    }

    let states: Vec<_> = controllers
        .iter()
        .filter_map(|n| n.as_controller())
        .collect();

    let url_width = states.iter().map(|s| s.url.len()).max().unwrap_or(3).max(3);
    let user_width = states
        .iter()
        .map(|s| s.username.len())
        .max()
        .unwrap_or(8)
        .max(8);
    let remembered_width = 10;

    let mut output = String::new();
    let _ = writeln!(
        output,
        "{:<url_width$}  {:<user_width$}  {:<remembered_width$}",
        "URL", "USERNAME", "REMEMBERED"
    );
    let _ = writeln!(
        output,
        "{:-<url_width$}  {:-<user_width$}  {:-<remembered_width$}",
        "", "", ""
    );
    for state in &states {
        let remembered = if state.remember_password { "yes" } else { "no" };
        let _ = writeln!(
            output,
            "{:<url_width$}  {:<user_width$}  {:<remembered_width$}",
            state.url, state.username, remembered
        );
    }
    output.trim_end().to_string()
}

/// Format controllers as a JSON string
///
/// # Errors
///
/// Returns `CliError::Config` if JSON serialization fails.
pub fn format_json(controllers: &[&TreeNode]) -> Result<String, CliError> {
    let output: Vec<ControllerOutput> = controllers
        .iter()
        .filter_map(|n| n.as_controller().map(|s| (*n, s)))
        .map(|(node, state)| ControllerOutput {
            url: state.url.clone(),
            username: state.username.clone(),
            label: node.label.clone(),
            remembered: state.remember_password,
        })
        .collect();
    serde_json::to_string_pretty(&output)
        .map_err(|e| CliError::Config(format!("Failed to serialize to JSON: {e}")))
}

/// Controller summary for CLI output
///
/// Passwords never appear in the output, only whether one is remembered.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ControllerOutput {
    pub url: String,
    pub username: String,
    pub label: String,
    pub remembered: bool,
}

/// Add controller command handler
fn cmd_add(
    config: &ControllerConfigManager,
    url: &str,
    username: &str,
    password: Option<&str>,
    remember: bool,
) -> Result<(), CliError> {
    if url.is_empty() || username.is_empty() {
        return Err(CliError::Config(
            "URL and username must not be empty".to_string(),
        ));
    }
    if remember && password.is_none() {
        return Err(CliError::Config(
            "--remember requires a password".to_string(),
        ));
    }

    let mut registry = load_registry(config)?;
    let existed = registry.controller_by_key(url, username).is_some();
    registry.add_controller(url, username, password, remember, None);
    registry
        .save_controllers(config)
        .map_err(|e| CliError::Config(format!("Failed to save controllers: {e}")))?;

    if existed {
        println!("Updated controller {url} ({username})");
    } else {
        println!("Added controller {url} ({username})");
    }
    Ok(())
}

/// Delete controller command handler
fn cmd_delete(
    config: &ControllerConfigManager,
    url: &str,
    username: &str,
) -> Result<(), CliError> {
    let mut registry = load_registry(config)?;
    let removed = registry
        .delete_controller(url, username)
        .ok_or_else(|| CliError::ControllerNotFound(format!("{url} ({username})")))?;
    registry
        .save_controllers(config)
        .map_err(|e| CliError::Config(format!("Failed to save controllers: {e}")))?;

    println!("Deleted controller {} ({})", removed.url, removed.username);
    Ok(())
}

/// Show controller details command handler
fn cmd_show(config: &ControllerConfigManager, url: &str, username: &str) -> Result<(), CliError> {
    let registry = load_registry(config)?;
    let id = registry
        .controller_by_key(url, username)
        .ok_or_else(|| CliError::ControllerNotFound(format!("{url} ({username})")))?;
    let node = registry
        .node(id)
        .ok_or_else(|| CliError::ControllerNotFound(format!("{url} ({username})")))?;
    let state = node
        .as_controller()
        .ok_or_else(|| CliError::ControllerNotFound(format!("{url} ({username})")))?;

    println!("Controller Details:");
    println!("  Label:      {}", node.label);
    println!("  URL:        {}", state.url);
    println!("  Username:   {}", state.username);
    println!(
        "  Password:   {}",
        if state.password.is_some() {
            "set"
        } else {
            "not set"
        }
    );
    println!(
        "  Remembered: {}",
        if state.remember_password { "yes" } else { "no" }
    );
    Ok(())
}

/// Exit codes for CLI operations
pub mod exit_codes {
    /// Success - operation completed successfully
    pub const SUCCESS: i32 = 0;
    /// General error - configuration or validation errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Controller lookup failure
    pub const NOT_FOUND: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Controller not found
    #[error("Controller not found: {0}")]
    ControllerNotFound(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Returns the appropriate exit code for this error type
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::ControllerNotFound(_) => exit_codes::NOT_FOUND,
            Self::Config(_) | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
