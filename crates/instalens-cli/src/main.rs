use clap::{Parser, Subcommand};
use instalens_core::AppConfig;
use instalens_refresh::{run_sweep_tick, Refresher, SweepOutcome};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "instalens-cli")]
#[command(about = "Instalens profile refresh command line interface")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Fetch a profile, refreshing it first when the stored copy is stale
    Profile {
        /// Instagram username
        handle: String,

        /// Refresh even when the stored copy is still fresh
        #[arg(long)]
        force: bool,
    },
    /// Run one background sweep tick against the oldest stored profile
    Sweep,
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("instalens-cli: no command given, see --help");
        return Ok(());
    };

    let config = instalens_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let pool = connect(&config).await?;
    match command {
        Commands::Db {
            command: DbCommands::Ping,
        } => {
            instalens_db::health_check(&pool).await?;
            println!("database ok");
        }
        Commands::Db {
            command: DbCommands::Migrate,
        } => {
            instalens_db::run_migrations(&pool).await?;
            println!("migrations applied");
        }
        Commands::Profile { handle, force } => {
            let refresher = build_refresher(&config, pool).await?;
            run_profile(&refresher, &handle, force).await?;
        }
        Commands::Sweep => {
            let refresher = build_refresher(&config, pool).await?;
            run_sweep(&refresher).await?;
        }
    }

    Ok(())
}

async fn connect(config: &AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = instalens_db::PoolConfig::from_app_config(config);
    let pool = instalens_db::connect_pool(&config.database_url, pool_config).await?;
    Ok(pool)
}

async fn build_refresher(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<Refresher> {
    instalens_db::run_migrations(&pool).await?;
    Ok(instalens_refresh::build_refresher(config, pool)?)
}

async fn run_profile(refresher: &Refresher, handle: &str, force: bool) -> anyhow::Result<()> {
    let served = refresher.get_profile_detailed(handle, force).await?;
    tracing::info!(handle, origin = %served.origin, "profile served");
    println!("{}", serde_json::to_string_pretty(&served.record)?);
    Ok(())
}

async fn run_sweep(refresher: &Refresher) -> anyhow::Result<()> {
    match run_sweep_tick(refresher).await {
        SweepOutcome::Idle => println!("sweep: no stored profiles"),
        SweepOutcome::Completed { handle, origin } => {
            println!("sweep: {handle} served from {origin}");
        }
        SweepOutcome::Failed { handle, reason } => {
            let handle = handle.as_deref().unwrap_or("<none>");
            anyhow::bail!("sweep failed for {handle}: {reason}");
        }
    }
    Ok(())
}
