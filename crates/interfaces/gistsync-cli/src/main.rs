use anyhow::Context;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use gistsync_cli::settings::{self, SettingsManager};
use gistsync_cli::{commands, resolve_dir, RemoteArgs};
use gistsync_config::{API_URL_ENV, TOKEN_ENV};
use std::sync::atomic::Ordering;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about = "Keep local directories in sync with GitHub gists")]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    #[arg(long, global = true, env = TOKEN_ENV, hide_env_values = true)]
    token: Option<String>,
    #[arg(long, global = true, env = API_URL_ENV)]
    api_url: Option<String>,
    #[arg(short, long, global = true, help = "Directories processed at once by batch commands")]
    jobs: Option<usize>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Pull a gist (id, url, or keyword) into ./<gist id>
    Init { query: String },
    /// Pull every gist of the account into ./<gist id>
    #[command(name = "init-all")]
    InitAll,
    /// Push or pull whichever side changed
    Sync { dir: Option<Utf8PathBuf> },
    /// Upload the directory, creating a gist when it is not synced yet
    Push {
        dir: Option<Utf8PathBuf>,
        #[arg(long, help = "Create the gist as public")]
        public: bool,
    },
    /// Overwrite the directory with the gist content
    Pull { dir: Option<Utf8PathBuf> },
    /// Report what changed without transferring anything
    Check { dir: Option<Utf8PathBuf> },
    Setup {
        #[command(subcommand)]
        command: SetupCommands,
    },
}

#[derive(Subcommand)]
enum SetupCommands {
    /// Save the default access token
    Token { value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let default_level = if cli.verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("Failed to install logger")?;

    let settings = SettingsManager::new()?;

    if let Commands::Setup {
        command: SetupCommands::Token { value },
    } = &cli.command
    {
        return settings::handle_setup_token(&settings, value);
    }

    let remote = RemoteArgs {
        token: cli.token,
        api_url: cli.api_url,
        jobs: cli.jobs,
    };
    let engine = remote.engine(&settings)?;

    let cancel = engine.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, stopping after the current file");
            cancel.store(true, Ordering::Relaxed);
        }
    });

    match cli.command {
        Commands::Init { query } => {
            let cwd = resolve_dir(None)?;
            commands::cmd_init(&engine, &cwd, &query).await?;
        }
        Commands::InitAll => {
            let cwd = resolve_dir(None)?;
            commands::cmd_init_all(&engine, &cwd).await?;
        }
        Commands::Sync { dir } => {
            commands::cmd_sync(&engine, &resolve_dir(dir)?).await?;
        }
        Commands::Push { dir, public } => {
            commands::cmd_push(&engine, &resolve_dir(dir)?, public).await?;
        }
        Commands::Pull { dir } => {
            commands::cmd_pull(&engine, &resolve_dir(dir)?).await?;
        }
        Commands::Check { dir } => {
            commands::cmd_check(&engine, &resolve_dir(dir)?).await?;
        }
        Commands::Setup { .. } => {}
    }

    Ok(())
}
