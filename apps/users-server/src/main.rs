use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use runtime::{AppConfig, CliArgs, DatabaseConfig, ModuleCtx, StoreBackend};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use api_ingress::ApiIngress;
use users_info::UsersInfo;

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

/// Users Server - CRUD API for user records
#[derive(Parser)]
#[command(name = "users-server")]
#[command(about = "Users Server - CRUD API for user records")]
#[command(version = "0.1.0")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port for HTTP server (overrides config)
    #[arg(short, long)]
    port: Option<u16>,

    /// Print current configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Log verbosity level (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Keep users in memory instead of the configured database
    #[arg(long)]
    mock: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the server
    Run,
    /// Check configuration
    Check,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let args = CliArgs {
        config: cli.config.as_ref().map(|p| p.to_string_lossy().to_string()),
        port: cli.port,
        print_config: cli.print_config,
        verbose: cli.verbose,
        mock: cli.mock,
    };

    // Load configuration (normalized home_dir is applied inside)
    let mut config = AppConfig::load_or_default(cli.config.as_deref())?;
    config.apply_cli_overrides(&args);

    let logging_config = config.logging.clone().unwrap_or_default();
    runtime::logging::init_logging_from_config(&logging_config, Path::new(&config.server.home_dir));
    tracing::info!("Users Server starting");

    if cli.print_config {
        println!("{}", config.to_yaml()?);
        return Ok(());
    }

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run_server(config, args).await,
        Commands::Check => check_config(config, &args),
    }
}

async fn connect_db(db_config: &DatabaseConfig, home_dir: &Path) -> Result<DatabaseConnection> {
    let dsn = db_config.sqlite_dsn(home_dir, true)?;
    let busy_timeout = db_config.busy_timeout();

    let mut opts = ConnectOptions::new(dsn.clone());
    opts.max_connections(db_config.max_conns())
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false)
        .map_sqlx_sqlite_opts(move |o| o.busy_timeout(busy_timeout));

    tracing::info!("Connecting to database: {}", dsn);
    Database::connect(opts)
        .await
        .with_context(|| format!("Failed to connect to database '{dsn}'"))
}

async fn resolve_bind_addr(host: &str, port: u16) -> Result<SocketAddr> {
    tokio::net::lookup_host((host, port))
        .await
        .with_context(|| format!("Invalid bind address '{host}:{port}'"))?
        .next()
        .ok_or_else(|| anyhow!("Invalid bind address '{host}:{port}': no addresses resolved"))
}

async fn run_server(config: AppConfig, args: CliArgs) -> Result<()> {
    tracing::info!("Initializing modules...");

    let mut ctx = ModuleCtx::new(Arc::new(config.clone()), CancellationToken::new());

    match config.store_backend(args.mock) {
        StoreBackend::Sqlite(db_config) => {
            let home_dir = Path::new(&config.server.home_dir);
            ctx = ctx.with_db(connect_db(db_config, home_dir).await?);
        }
        StoreBackend::Memory if args.mock => {
            tracing::info!("--mock given, using the in-memory store")
        }
        StoreBackend::Memory => {
            tracing::warn!("No database configuration found, keeping users in memory")
        }
    }

    let users = UsersInfo::new();
    users.init(&ctx).await?;

    let ingress = ApiIngress::new(
        Default::default(),
        api_ingress::request_timeout(config.server.timeout_sec),
    );
    ingress.init(&ctx)?;

    let router = ingress.build_router(users.register_rest(axum::Router::new())?);
    let addr = resolve_bind_addr(&config.server.host, config.server.port).await?;

    // Signals cancel the token every module was handed
    let cancel = ctx.cancellation_token().clone();
    tokio::spawn(runtime::shutdown::cancel_on_signal(cancel.clone()));

    ingress.serve(addr, router, cancel).await?;
    tracing::info!("Users Server stopped");
    Ok(())
}

fn check_config(config: AppConfig, args: &CliArgs) -> Result<()> {
    tracing::info!("Checking configuration...");

    if let StoreBackend::Sqlite(db_config) = config.store_backend(args.mock) {
        db_config.sqlite_dsn(Path::new(&config.server.home_dir), false)?;
    }

    tracing::info!("Configuration is valid");
    println!("Configuration check passed");
    println!("Server config:");
    println!("{}", config.to_yaml()?);

    Ok(())
}
