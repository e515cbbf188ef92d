use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use registrar::{api, auth, db};

#[derive(Parser)]
#[command(name = "registrar")]
#[command(about = "University records and enrollment server")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the registrar server
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Database file (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,

        /// Load demo accounts and catalog data into an empty database
        #[arg(long)]
        seed: bool,
    },
    /// Apply pending schema migrations and exit
    Migrate {
        /// Database file (defaults to the platform data directory)
        #[arg(long)]
        db: Option<PathBuf>,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "registrar=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve { port, db, seed }) => serve(port, db, seed).await?,
        Some(Commands::Migrate { db }) => {
            let db = open_database(db)?;
            db.migrate()?;
            tracing::info!("Migrations applied");
        }
        // Default: serve on the standard port
        None => serve(3000, None, false).await?,
    }

    Ok(())
}

async fn serve(port: u16, db_path: Option<PathBuf>, seed: bool) -> anyhow::Result<()> {
    tracing::info!("Starting registrar server on port {}", port);

    let db = open_database(db_path)?;
    db.migrate()?;

    if seed {
        if db.seed_demo()? {
            tracing::info!("Demo data loaded (admin 99999, student 10001, instructor 20001)");
        } else {
            tracing::debug!("Database already has accounts, skipping demo data");
        }
    }

    let auth = auth::AuthService::from_env();
    let app = api::create_router(db, auth);

    let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
    tracing::info!("Registrar server listening on http://127.0.0.1:{}", port);

    axum::serve(listener, app).await?;
    Ok(())
}

fn open_database(path: Option<PathBuf>) -> anyhow::Result<db::Database> {
    match path {
        Some(path) => db::Database::open(path),
        None => db::Database::open_default(),
    }
}
