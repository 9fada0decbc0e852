mod inspect;
mod sync;
mod trackers;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Debug, Parser)]
#[command(name = "followtrack-cli")]
#[command(about = "Operator commands for the follow tracker")]
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
    /// Run one sync pass over every active tracker
    Sync {
        /// Work on an in-memory copy of the trackers and only log notifications
        #[arg(long)]
        dry_run: bool,
    },
    /// Fetch, normalize, and classify a profile
    Profile { username: String },
    /// Print every account a profile follows
    Following {
        username: String,
        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },
    /// Start tracking a profile for an owner
    Track {
        #[arg(long)]
        owner: Uuid,
        username: String,
        /// Where change notifications go
        #[arg(long)]
        notify: String,
    },
    /// Stop tracking (soft delete)
    Untrack {
        #[arg(long)]
        owner: Uuid,
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Apply pending migrations
    Migrate,
    /// Check database connectivity
    Ping,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("followtrack-cli: no command given, see --help");
        return Ok(());
    };

    let config = followtrack_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    match command {
        Commands::Db { command } => {
            let pool = connect(&config).await?;
            match command {
                DbCommands::Migrate => {
                    let applied = followtrack_db::run_migrations(&pool).await?;
                    println!("applied {applied} migration(s)");
                }
                DbCommands::Ping => {
                    followtrack_db::health_check(&pool).await?;
                    println!("database ok");
                }
            }
        }
        Commands::Sync { dry_run } => {
            let pool = connect(&config).await?;
            sync::run_sync(&pool, &config, dry_run).await?;
        }
        Commands::Profile { username } => {
            inspect::run_profile(&config, &username).await?;
        }
        Commands::Following {
            username,
            max_pages,
        } => {
            inspect::run_following(&config, &username, max_pages).await?;
        }
        Commands::Track {
            owner,
            username,
            notify,
        } => {
            let pool = connect(&config).await?;
            trackers::run_track(&pool, &config, owner, &username, &notify).await?;
        }
        Commands::Untrack { owner, id } => {
            let pool = connect(&config).await?;
            trackers::run_untrack(&pool, &config, owner, id).await?;
        }
    }

    Ok(())
}

async fn connect(config: &followtrack_core::AppConfig) -> anyhow::Result<sqlx::PgPool> {
    let pool_config = followtrack_db::PoolConfig::from_app_config(config);
    Ok(followtrack_db::connect_pool(&config.database_url, pool_config).await?)
}
