// crates/storage-gate-cli/src/main.rs
// ============================================================================
// Module: Storage Gate CLI Entry Point
// Description: Command dispatcher for the storage resource proxy.
// Purpose: Load configuration, wire collaborators, and run the server.
// Dependencies: clap, storage-gate-config, storage-gate-providers,
//               storage-gate-server, tokio.
// ============================================================================

//! ## Overview
//! The `storage-gate` binary exposes two subcommands: `serve` starts the
//! HTTP proxy over the configured marketplace and identity collaborators,
//! and `check-config` loads and validates the configuration without
//! serving. Collaborator selection follows the configuration: an identity
//! API URL selects the authenticated resolver; its absence selects the
//! deterministic mock resolver in the configured mode.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt::Write as _;
use std::io::Write;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use clap::Subcommand;
use storage_gate_config::StorageGateConfig;
use storage_gate_providers::IdentityResolver;
use storage_gate_providers::MarketplaceClient;
use storage_gate_providers::MockGroupIdResolver;
use storage_gate_server::AuditSink;
use storage_gate_server::ResourceBackend;
use storage_gate_server::ServerState;
use storage_gate_server::StderrAuditSink;
use storage_gate_server::serve;
use thiserror::Error;

// ============================================================================
// SECTION: CLI Definition
// ============================================================================

/// Top-level command-line interface.
#[derive(Parser, Debug)]
#[command(
    name = "storage-gate",
    version,
    about = "Storage resource proxy mapping marketplace allocations to a quota hierarchy"
)]
struct Cli {
    /// Path to the configuration file (overrides `STORAGE_GATE_CONFIG`).
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP proxy server.
    Serve,
    /// Load and validate the configuration, then print a summary.
    CheckConfig,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Terminal CLI error carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    let config = StorageGateConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("configuration error: {err}")))?;

    match cli.command {
        Commands::Serve => run_serve(config).await,
        Commands::CheckConfig => run_check_config(&config),
    }
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Starts the HTTP proxy over the configured collaborators.
async fn run_serve(config: StorageGateConfig) -> CliResult<ExitCode> {
    let bind: SocketAddr = config
        .server
        .bind
        .parse()
        .map_err(|err| CliError::new(format!("invalid bind address '{}': {err}", config.server.bind)))?;

    let backend = build_backend(&config)?;
    let state = Arc::new(ServerState::new(
        backend,
        config.storage_systems.clone(),
        Arc::new(StderrAuditSink) as Arc<dyn AuditSink>,
    ));

    write_stderr_line(&format!("storage-gate: listening on {bind}"))
        .map_err(|err| CliError::new(format!("failed to write to stderr: {err}")))?;
    serve(state, bind)
        .await
        .map_err(|err| CliError::new(err.to_string()))?;
    Ok(ExitCode::SUCCESS)
}

/// Wires the batch backend from configuration.
///
/// The marketplace client is constructed twice because the orchestrator
/// owns its record source and customer directory separately.
fn build_backend(config: &StorageGateConfig) -> CliResult<Arc<dyn ResourceBackend>> {
    let records = MarketplaceClient::new(&config.marketplace)
        .map_err(|err| CliError::new(err.to_string()))?;
    let customers = MarketplaceClient::new(&config.marketplace)
        .map_err(|err| CliError::new(err.to_string()))?;
    let settings = config.backend.quota_settings();
    let file_system = config.backend.storage_file_system.clone();

    let backend: Arc<dyn ResourceBackend> = if config.identity.api_url.is_some() {
        let resolver = IdentityResolver::new(&config.identity)
            .map_err(|err| CliError::new(err.to_string()))?;
        Arc::new(storage_gate_core::Orchestrator::new(
            records, customers, resolver, settings, file_system,
        ))
    } else {
        let resolver = MockGroupIdResolver::new(config.identity.mode);
        Arc::new(storage_gate_core::Orchestrator::new(
            records, customers, resolver, settings, file_system,
        ))
    };
    Ok(backend)
}

// ============================================================================
// SECTION: Check-Config Command
// ============================================================================

/// Validates the configuration and prints a summary.
fn run_check_config(config: &StorageGateConfig) -> CliResult<ExitCode> {
    write_stdout_line(&render_summary(config))
        .map_err(|err| CliError::new(format!("failed to write to stdout: {err}")))?;
    Ok(ExitCode::SUCCESS)
}

/// Renders the configuration summary for `check-config`.
fn render_summary(config: &StorageGateConfig) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "configuration ok");
    let _ = writeln!(out, "  bind: {}", config.server.bind);
    let _ = writeln!(out, "  marketplace: {}", config.marketplace.api_url);
    let identity = match config.identity.api_url.as_deref() {
        Some(url) => format!("{url} ({:?} mode)", config.identity.mode),
        None => format!("mock resolver ({:?} mode)", config.identity.mode),
    };
    let _ = writeln!(out, "  identity: {identity}");
    let _ = writeln!(
        out,
        "  backend: {} (inodes {} x [{}, {}])",
        config.backend.storage_file_system,
        config.backend.inode_base_multiplier,
        config.backend.inode_soft_coefficient,
        config.backend.inode_hard_coefficient
    );
    let _ = writeln!(out, "  storage systems:");
    for (system, offering) in &config.storage_systems {
        let _ = writeln!(out, "    {system} -> {offering}");
    }
    out
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
