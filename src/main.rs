#![forbid(unsafe_code)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info, Level as TraceLevel};
use tracing_subscriber::FmtSubscriber;

use notepin::capabilities::AppVersion;
use notepin::config::SettingsFile;
use notepin::constants;
use notepin::guest::Guest;
use notepin::host::{self, HostRuntime};
use notepin::ipc::{self, HostListener};
use notepin::settings::{self, SettingChange};

#[derive(Parser, Debug)]
#[command(name = "notepin", version, about = "Overlay notes host and settings client")]
struct Cli {
    /// Host socket path (defaults to $XDG_RUNTIME_DIR/notepin/host.sock)
    #[arg(long, global = true, env = constants::ipc::SOCKET_ENV)]
    socket: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the host process
    Host {
        /// Settings file (defaults to <config_dir>/notepin/settings.json)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    #[command(flatten)]
    Guest(GuestCommand),
}

#[derive(Subcommand, Debug)]
enum GuestCommand {
    /// Print the host version
    Version,
    /// Show or hide the overlay
    ToggleOverlay,
    /// Ask the host to quit
    Quit,
    /// Show a message through the host
    Message { text: String },
    /// Preview an overlay transparency without saving it
    PreviewTransparency {
        #[arg(allow_hyphen_values = true)]
        value: f64,
    },
    PauseHotkey,
    ResumeHotkey,
    /// Read or edit the persisted settings
    #[command(subcommand)]
    Settings(SettingsCommand),
}

#[derive(Subcommand, Debug)]
enum SettingsCommand {
    /// Print the current settings
    Show,
    /// Edit settings, e.g. `set Theme=Dark Transparency=0.8 --save`
    Set {
        #[arg(required = true, value_name = "FIELD=VALUE")]
        edits: Vec<String>,
        /// Persist the edits instead of only previewing them
        #[arg(long)]
        save: bool,
    },
}

fn init_tracing() -> Result<()> {
    // Parse log level from environment variable
    let log_level = match std::env::var("LOG_LEVEL")
        .unwrap_or_else(|_| "info".to_string())
        .to_lowercase()
        .as_str()
    {
        "trace" => TraceLevel::TRACE,
        "debug" => TraceLevel::DEBUG,
        "warn" => TraceLevel::WARN,
        "error" => TraceLevel::ERROR,
        _ => TraceLevel::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn socket_path(cli: &Cli) -> Result<PathBuf> {
    match &cli.socket {
        Some(path) => Ok(path.clone()),
        None => ipc::default_socket_path(),
    }
}

async fn run_host(socket: PathBuf, config: Option<PathBuf>) -> Result<()> {
    let file = SettingsFile::new(config.unwrap_or_else(SettingsFile::default_path));
    let runtime = Arc::new(HostRuntime::headless(file));
    let listener = HostListener::bind_to(socket)?;

    let state = Arc::clone(runtime.state());
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received Ctrl+C");
                state.request_shutdown();
            }
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C"),
        }
    });

    host::server::serve(Arc::clone(&runtime), listener).await?;
    runtime.state().release_resources();
    Ok(())
}

async fn run_settings(guest: &Guest, command: SettingsCommand) -> Result<()> {
    let store = guest.store();
    store.load().await;
    if let Some(e) = store.state().load_error {
        bail!("Failed to load settings: {e}");
    }

    match command {
        SettingsCommand::Show => {
            println!("{}", serde_json::to_string_pretty(&store.current())?);
        }
        SettingsCommand::Set { edits, save } => {
            for edit in &edits {
                let (field, value) = edit
                    .split_once('=')
                    .with_context(|| format!("Expected FIELD=VALUE, got '{edit}'"))?;
                let change = SettingChange::parse(field, value)?;
                if !store.set_field(change) {
                    info!(field, "Value unchanged");
                }
            }
            store.preview_settled().await;
            println!("{}", serde_json::to_string_pretty(&store.current())?);

            if !store.has_changes() {
                println!("No changes");
            } else if save {
                if !store.save().await {
                    let reason = store.state().last_save_error.unwrap_or_default();
                    bail!("Failed to save settings: {reason}");
                }
                println!("Saved");
            } else {
                println!("Changes discarded (use --save to persist)");
                store.cancel().await;
            }
        }
    }
    Ok(())
}

async fn run_guest(socket: PathBuf, command: GuestCommand) -> Result<()> {
    let guest = Guest::connect(&socket).await;
    let app = guest.app();
    match command {
        GuestCommand::Version => {
            let version = app.get_version().await;
            println!("{} ({})", version, AppVersion::parse(&version));
        }
        GuestCommand::ToggleOverlay => app.toggle_overlay().await?,
        GuestCommand::Quit => app.quit_application().await?,
        GuestCommand::Message { text } => app.show_message(&text).await?,
        GuestCommand::PreviewTransparency { value } => {
            app.update_transparency_preview(settings::clamp_transparency(value)).await
        }
        GuestCommand::PauseHotkey => app.pause_hotkey().await,
        GuestCommand::ResumeHotkey => app.resume_hotkey().await,
        GuestCommand::Settings(command) => run_settings(&guest, command).await?,
    }
    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let socket = socket_path(&cli)?;

    match cli.command {
        Command::Host { config } => run_host(socket, config).await,
        Command::Guest(command) => run_guest(socket, command).await,
    }
}
