//! PermToggle - permission group toggle reconciliation
//! 
//! Command-line entry point: loads configuration, initializes logging and
//! runs a show or toggle command against a catalog snapshot.

use std::path::{Path, PathBuf};

use anyhow::Result;
use clap::{ArgGroup, Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use permtoggle::commands::{render_screen, Resolution, ShowCommand, ToggleCommand, ToggleTarget};
use permtoggle::core::{AppConfig, LoggingConfig, PermToggleError, APP_NAME, VERSION};

#[derive(Parser)]
#[command(name = "permtoggle", version, about = "Permission group toggle reconciliation")]
struct Cli {
    /// Configuration file (defaults to the per-user config directory)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Expose dangerous platform permissions as individual switches
    #[arg(long, global = true)]
    strict: bool,

    #[command(subcommand)]
    command: CliCommand,
}

#[derive(Subcommand)]
enum CliCommand {
    /// Print the permissions screen of an app
    Show {
        /// Catalog snapshot (JSON)
        #[arg(long)]
        catalog: PathBuf,
        /// Package name of the app
        #[arg(long)]
        app: String,
    },
    /// Toggle a permission group or a single permission
    #[command(group(ArgGroup::new("target").required(true).args(["group", "permission"])))]
    #[command(group(ArgGroup::new("state").required(true).args(["grant", "revoke"])))]
    Toggle {
        #[arg(long)]
        catalog: PathBuf,
        #[arg(long)]
        app: String,
        #[arg(long)]
        group: Option<String>,
        #[arg(long)]
        permission: Option<String>,
        #[arg(long)]
        grant: bool,
        #[arg(long)]
        revoke: bool,
        /// Accept confirmation prompts instead of cancelling them
        #[arg(long, short = 'y')]
        yes: bool,
    },
}

/// Main entry point
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let (mut config, fallback) = load_config(cli.config.as_deref()).await?;
    init_logging(&config.logging)?;
    if let Some(reason) = fallback {
        warn!("Falling back to default configuration: {}", reason);
    }
    if cli.strict {
        config.toggles.strict_mode = true;
    }

    info!("{} v{} starting...", APP_NAME, VERSION);

    if let Err(err) = run(cli.command, &config) {
        match err.downcast_ref::<PermToggleError>() {
            Some(err) => {
                error!("{}", err);
                eprintln!("{}", err.user_message());
                std::process::exit(1);
            }
            None => return Err(err),
        }
    }

    Ok(())
}

/// Dispatch a subcommand
fn run(command: CliCommand, config: &AppConfig) -> Result<()> {
    match command {
        CliCommand::Show { catalog, app } => {
            let screen = ShowCommand { catalog, app }.execute(&config.toggles)?;
            print!("{}", render_screen(&screen));
        }
        CliCommand::Toggle { catalog, app, group, permission, grant, revoke: _, yes } => {
            let target = match (group, permission) {
                (Some(group), _) => ToggleTarget::Group(group),
                (None, Some(permission)) => ToggleTarget::Permission(permission),
                (None, None) => anyhow::bail!("--group or --permission is required"),
            };

            let report = ToggleCommand { catalog, app, target, grant, confirm: yes }
                .execute(&config.toggles)?;

            println!("{:?}", report.response);
            match &report.resolution {
                Resolution::NotPrompted => {}
                Resolution::Confirmed(result) => println!("confirmed: {:?}", result),
                Resolution::Cancelled(restore) => {
                    println!("cancelled: {} restored to {}", restore.key, restore.checked)
                }
            }
            println!("toggled: {:?}", report.toggled);
            print!("{}", render_screen(&report.screen));
        }
    }

    Ok(())
}

/// Load configuration from `path`, or from the default location.
///
/// A broken default config is not fatal; the reason is returned so it can be
/// logged once logging is up.
async fn load_config(path: Option<&Path>) -> Result<(AppConfig, Option<String>)> {
    match path {
        Some(path) => Ok((AppConfig::load_from(path).await?, None)),
        None => match AppConfig::load().await {
            Ok(config) => Ok((config, None)),
            Err(e) => Ok((AppConfig::default(), Some(e.to_string()))),
        },
    }
}

/// Initialize logging; RUST_LOG takes precedence over the configured level
fn init_logging(logging: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(logging.with_file)
        .with_line_number(logging.with_file)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}
