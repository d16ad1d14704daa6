use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use cvfolio::auth::AuthManager;
use cvfolio::config::AppConfig;
use cvfolio::core::Language;
use cvfolio::cv::{CvRepository, CvSnapshot, render_print_html};
use cvfolio::storage::{LocalObjectStore, MemoryDocumentStore};
use cvfolio::web::{AppState, build_router};
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "cvfolio")]
#[command(about = "Bilingual CV/portfolio backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Render the print-ready CV from the data directory
    Export {
        #[arg(long, default_value = "fr")]
        lang: String,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a bcrypt hash for CVFOLIO_ADMIN_PASSWORD_HASH (reads the password from stdin)
    HashPassword,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to load application configuration")?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::Export { lang, out } => export(config, &lang, out).await,
        Command::HashPassword => hash_password(),
    }
}

async fn serve(config: AppConfig) -> Result<()> {
    let store = MemoryDocumentStore::open(&config.data_dir, config.durability)
        .with_context(|| format!("failed to open store in {}", config.data_dir.display()))?;
    let store = Arc::new(store);
    let repo = CvRepository::new(store.clone());

    let auth = AuthManager::new(
        config.admin_user.clone(),
        config.admin_password_hash()?,
        config.session_ttl(),
    );
    let objects = LocalObjectStore::new(config.uploads_dir.clone(), config.uploads_url())
        .max_bytes(config.max_upload_bytes);

    let state = AppState::new(repo, Arc::new(auth), Arc::new(objects))
        .track_stats(config.track_stats)
        .uploads_dir(config.uploads_dir.clone())
        .cors_origin(config.cors_origin.clone());

    let janitor = state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(60));
        loop {
            interval.tick().await;
            janitor.purge_expired_sessions().await;
        }
    });

    let app = build_router(state);

    let addr = config.address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind to {addr}"))?;

    info!(
        address = %addr,
        durability = ?config.durability,
        admin = %config.admin_user,
        collections = ?store.collection_names().await,
        "cvfolio started"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    store
        .checkpoint()
        .await
        .context("failed to write the final snapshot")?;
    info!("cvfolio stopped");

    Ok(())
}

async fn export(config: AppConfig, lang: &str, out: Option<PathBuf>) -> Result<()> {
    let lang: Language = lang.parse()?;
    let store = MemoryDocumentStore::open(&config.data_dir, config.durability)
        .with_context(|| format!("failed to open store in {}", config.data_dir.display()))?;
    let repo = CvRepository::new(Arc::new(store));

    let data = repo.load_cv().await?;
    let cv = CvSnapshot::flatten(&data, lang)
        .ok_or_else(|| anyhow!("nothing to export: no personal info has been saved yet"))?;
    let html = render_print_html(&cv, &repo.theme().await);

    match out {
        Some(path) => {
            std::fs::write(&path, html)
                .with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), %lang, "CV exported");
        }
        None => io::stdout().write_all(html.as_bytes())?,
    }
    Ok(())
}

fn hash_password() -> Result<()> {
    let mut password = String::new();
    io::stdin()
        .lock()
        .read_line(&mut password)
        .context("failed to read password from stdin")?;
    let password = password.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(anyhow!("password must not be empty"));
    }
    println!("{}", AuthManager::hash_password(password)?);
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("cvfolio=debug,tower_http=info")),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!(error = %err, "unable to install Ctrl+C signal handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!(error = %err, "unable to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
