use anyhow::{bail, Context};
use buildpanel_app_core::LogLevel;
use buildpanel_cli::picker::PromptPicker;
use buildpanel_cli::{apps, commands, current_dir, Session};
use buildpanel_core::CommandStatus;
use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use tokio::runtime::Handle;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    #[arg(short, long, global = true)]
    verbose: bool,
    /// Store apps, settings and logs here instead of the platform data directory
    #[arg(long, global = true, env = "BUILDPANEL_CONFIG_DIR")]
    config_dir: Option<Utf8PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage registered project directories
    App {
        #[command(subcommand)]
        command: AppCommands,
    },
    /// Run a command and stream its output
    Run {
        app: String,
        #[arg(help = "Command id, name or script")]
        command: String,
    },
    /// Print the last recorded output of a command
    Show { app: String, command: String },
    Settings {
        #[arg(long)]
        auto_save_log: Option<bool>,
    },
    /// Print today's log file
    Logs {
        #[arg(long = "level", help = "Only keep lines at this level (repeatable)")]
        levels: Vec<LogLevel>,
    },
    Docs {
        file: String,
        #[arg(long)]
        docs_dir: Option<Utf8PathBuf>,
    },
}

#[derive(Subcommand)]
enum AppCommands {
    List,
    Add {
        #[arg(long, help = "Defaults to the directory name")]
        name: Option<String>,
        #[arg(long, help = "Prompted for when omitted")]
        path: Option<Utf8PathBuf>,
    },
    Remove {
        #[arg(help = "App id or name")]
        app: String,
    },
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
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install the tracing subscriber")?;

    let open = || Session::open(cli.config_dir.as_deref(), Handle::current());

    match &cli.command {
        Commands::App { command } => {
            let mut session = open()?;
            match command {
                AppCommands::List => apps::handle_list(&session)?,
                AppCommands::Add { name, path } => {
                    let mut picker = PromptPicker::stdin(current_dir()?);
                    apps::handle_add(&mut session, name.clone(), path.clone(), &mut picker)?;
                }
                AppCommands::Remove { app } => apps::handle_remove(&mut session, app)?,
            }
        }
        Commands::Run { app, command } => {
            let mut session = open()?;
            let status = commands::cmd_run(&mut session, app, command).await?;
            if status == CommandStatus::Error {
                bail!("'{command}' for '{app}' failed");
            }
        }
        Commands::Show { app, command } => commands::cmd_show(&open()?, app, command)?,
        Commands::Settings { auto_save_log } => {
            commands::cmd_settings(&mut open()?, *auto_save_log)?;
        }
        Commands::Logs { levels } => commands::cmd_logs(&open()?.persistence, levels)?,
        Commands::Docs { file, docs_dir } => commands::cmd_docs(file, docs_dir.clone())?,
    }

    Ok(())
}
