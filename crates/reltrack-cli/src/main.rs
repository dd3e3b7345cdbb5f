use anyhow::Context;
use clap::Parser;
use reltrack_api::GatewayClient;
use reltrack_cache::CacheManager;
use reltrack_core::{
    format_release_date, Config, Controller, GraphQlBackend, Message, Notice, Repository,
    ToastQueue, TrackerBackend,
};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "reltrack")]
#[command(version, about = "Keep an eye on GitHub releases from the terminal", long_about = None)]
struct Cli {
    /// GraphQL endpoint of the tracker backend
    #[arg(long, global = true, env = "RELTRACK_ENDPOINT")]
    endpoint: Option<String>,

    /// Config file (default: <config dir>/reltrack/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand, Debug, PartialEq)]
enum Commands {
    /// Open the interactive tracker (default)
    Tui,
    /// List tracked repositories, newest first
    List,
    /// Show repository details
    Show {
        /// Repository name (owner/repo)
        name: String,
    },
    /// Start tracking a repository
    Add {
        /// Repository name (owner/repo)
        name: String,
    },
    /// Mark a release as seen
    Seen {
        /// Release ID
        release_id: String,
    },
    /// Ask the backend to re-fetch repositories from GitHub
    Refresh {
        /// Repository names (owner/repo)
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let interactive = matches!(cli.command, None | Some(Commands::Tui));

    // Logs would scribble over the TUI, so they go to a file there
    init_logging(interactive);

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    }
    .with_endpoint(cli.endpoint.clone());

    tracing::info!("Using backend at {}", config.gateway.endpoint);

    let client = GatewayClient::with_user_agent(&config.gateway.endpoint, &config.gateway.user_agent)
        .context("Failed to build HTTP client")?;
    let cache = Arc::new(CacheManager::in_memory().context("Failed to open response cache")?);
    let backend = Arc::new(GraphQlBackend::new(client, cache));

    match cli.command.unwrap_or(Commands::Tui) {
        Commands::Tui => {
            let toasts = ToastQueue::new(Duration::from_millis(config.ui.notification_timeout_ms));
            let app = reltrack_tui::App::new(toasts);
            reltrack_tui::run_tui(app, backend, config.ui.mouse_enabled).await?;
        }
        Commands::List => {
            let mut controller = Controller::new(backend);
            controller.dispatch(Message::Init).await;

            let query = &controller.state().repositories;
            if let Some(e) = &query.error {
                anyhow::bail!("Error fetching repositories: {}", e);
            }
            if query.data.is_empty() {
                println!("No repositories tracked yet.");
            }
            for repo in controller.state().repositories_newest_first() {
                println!("{}", list_row(repo));
            }
        }
        Commands::Show { name } => {
            let mut controller = Controller::new(backend);
            controller.dispatch(Message::SelectRequested(name.clone())).await;

            let details = &controller.state().details;
            if let Some(e) = &details.error {
                anyhow::bail!("Error fetching details for {}: {}", name, e);
            }
            let Some(repo) = &details.data else {
                anyhow::bail!("No details found for {}", name);
            };

            println!("{}", repo.name);
            println!("Stars: {}", repo.stars);
            println!("Forks: {}", repo.forks);
            if let Some(release) = &repo.latest_release {
                println!(
                    "Latest Release: {} ({})",
                    release.version,
                    format_release_date(release.published_at.as_deref())
                );
                println!("Release Notes:");
                println!("{}", release.release_notes.as_deref().unwrap_or_default());
            }
        }
        Commands::Add { name } => {
            let mut controller = Controller::new(backend);
            controller.dispatch(Message::SearchChanged(name)).await;
            controller.dispatch(Message::AddRequested).await;
            report(controller.take_notices(), "Nothing to add: repository name is blank")?;
        }
        Commands::Seen { release_id } => {
            let mut controller = Controller::new(backend);
            controller.dispatch(Message::MarkSeenRequested(release_id)).await;
            report(controller.take_notices(), "Nothing happened")?;
        }
        Commands::Refresh { names } => {
            let refreshed = backend.refresh_repositories(&names).await?;
            if refreshed {
                println!("Refresh scheduled for {} repositories", names.len());
            } else {
                anyhow::bail!("Backend declined to refresh {}", names.join(", "));
            }
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
        }
    }

    Ok(())
}

/// Print notices; the first error becomes the process error
fn report(notices: Vec<Notice>, when_empty: &str) -> anyhow::Result<()> {
    if notices.is_empty() {
        anyhow::bail!("{}", when_empty);
    }

    for notice in &notices {
        if notice.is_error() {
            anyhow::bail!("{}", notice.message);
        }
        println!("{}", notice.message);
    }
    Ok(())
}

fn list_row(repo: &Repository) -> String {
    let (date, seen) = match &repo.latest_release {
        Some(release) => (
            format_release_date(release.published_at.as_deref()),
            if release.seen { "seen" } else { "new" },
        ),
        None => (String::new(), ""),
    };

    format!(
        "{:<6} {:<40} {:<16} {:<18} {}",
        repo.id,
        repo.name,
        repo.release_badge(),
        date,
        seen
    )
}

fn init_logging(interactive: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| "reltrack=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    if !interactive {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
        return;
    }

    match open_log_file() {
        Some(file) => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
            .init(),
        // No writable log location - stay quiet rather than draw over the UI
        None => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::sink))
            .init(),
    }
}

fn open_log_file() -> Option<std::fs::File> {
    let dir = dirs::data_local_dir()?.join("reltrack");
    std::fs::create_dir_all(&dir).ok()?;

    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("reltrack.log"))
        .ok()
}
