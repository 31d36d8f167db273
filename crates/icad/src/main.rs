// # icad - ICA shopping-list daemon
//
// The icad daemon is a thin shell over ica-core and ica-api:
// 1. Reading configuration from environment variables
// 2. Validating the credentials against the remote
// 3. Setting up the to-do service (first refresh)
// 4. Feeding it commands read from stdin until SIGINT/SIGTERM
//
// ## Configuration
//
// - `ICA_PERSONAL_ID`: Personal id number (required)
// - `ICA_PIN`: PIN code (required)
// - `ICA_RECIPE_COUNT`: Random recipes to fetch (default 5)
// - `ICA_UPDATE_INTERVAL_SECS`: Seconds between refreshes (default 60)
// - `ICA_BASE_URL`: API base URL (default https://handla.api.ica.se/api/)
// - `ICA_ENTRY_ID`: Prefix of the to-do list unique ids (default "ica")
// - `ICA_LOG_LEVEL`: trace, debug, info, warn, error (default info)
//
// ## Commands (one per line on stdin)
//
// ```text
// show
// refresh
// add <list_id> <product name>
// check <list_id> <uid>
// uncheck <list_id> <uid>
// remove <list_id> <uid> [<uid>...]
// move <list_id> <uid> [<previous_uid>]
// create-list <title>
// delete-list <offline_id>
// ```
//
// ## Example
//
// ```bash
// export ICA_PERSONAL_ID=199001011234
// export ICA_PIN=1234
//
// echo show | icad
// ```

use anyhow::{Context, Result};
use ica_core::{
    Credentials, IcaConfig, ShoppingListCoordinator, TodoCommand, TodoItemStatus, TodoService,
};
use std::env;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, oneshot};
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown
/// - 1: Configuration, credential or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum IcadExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or setup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<IcadExitCode> for ExitCode {
    fn from(code: IcadExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    personal_id: String,
    pin: String,
    recipe_count: Option<u32>,
    update_interval_secs: Option<u64>,
    base_url: Option<String>,
    entry_id: String,
    log_level: String,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("personal_id", &self.personal_id)
            .field("pin", &"<REDACTED>")
            .field("recipe_count", &self.recipe_count)
            .field("update_interval_secs", &self.update_interval_secs)
            .field("base_url", &self.base_url)
            .field("entry_id", &self.entry_id)
            .finish()
    }
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Ok(Self {
            personal_id: env::var("ICA_PERSONAL_ID").context("ICA_PERSONAL_ID is not set")?,
            pin: env::var("ICA_PIN").context("ICA_PIN is not set")?,
            recipe_count: parse_var("ICA_RECIPE_COUNT")?,
            update_interval_secs: parse_var("ICA_UPDATE_INTERVAL_SECS")?,
            base_url: env::var("ICA_BASE_URL").ok(),
            entry_id: env::var("ICA_ENTRY_ID").unwrap_or_else(|_| "ica".to_string()),
            log_level: env::var("ICA_LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        })
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.pin.chars().any(|c| !c.is_ascii_digit()) {
            anyhow::bail!("ICA_PIN must contain digits only");
        }

        if let Some(interval) = self.update_interval_secs
            && !(10..=86400).contains(&interval)
        {
            anyhow::bail!(
                "ICA_UPDATE_INTERVAL_SECS must be between 10 and 86400 seconds. Got: {}",
                interval
            );
        }

        if self.entry_id.trim().is_empty() {
            anyhow::bail!("ICA_ENTRY_ID cannot be empty");
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "ICA_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        self.ica_config().validate()?;
        Ok(())
    }

    fn ica_config(&self) -> IcaConfig {
        let mut config = IcaConfig::new(Credentials::new(&self.personal_id, &self.pin));
        if let Some(count) = self.recipe_count {
            config.recipe_count = count;
        }
        if let Some(secs) = self.update_interval_secs {
            config.coordinator.update_interval_secs = secs;
        }
        if let Some(ref url) = self.base_url {
            config.base_url = url.clone();
        }
        config
    }
}

/// Parse an optional numeric variable, rejecting malformed values
fn parse_var<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .with_context(|| format!("{} is not a valid number: '{}'", name, value)),
        Err(_) => Ok(None),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return IcadExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return IcadExitCode::ConfigError.into();
    }

    // Initialize tracing
    let log_level = match config.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return IcadExitCode::ConfigError.into();
    }

    info!("Starting icad daemon");
    debug!("Configuration loaded: {:?}", config);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return IcadExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        let ica_config = config.ica_config();

        let api = match ica_api::validate_setup(&ica_config).await {
            Ok(api) => api,
            Err(e) => {
                error!("Setup failed: {}", e);
                return IcadExitCode::ConfigError;
            }
        };

        let coordinator = match ShoppingListCoordinator::new(Box::new(api), &ica_config) {
            Ok((coordinator, event_rx)) => {
                tokio::spawn(log_events(event_rx));
                coordinator
            }
            Err(e) => {
                error!("Failed to create coordinator: {}", e);
                return IcadExitCode::ConfigError;
            }
        };

        if let Err(e) = run_daemon(coordinator, &config.entry_id).await {
            error!("Daemon error: {:#}", e);
            IcadExitCode::RuntimeError
        } else {
            IcadExitCode::CleanShutdown
        }
    });

    result.into()
}

/// Run the daemon
async fn run_daemon(coordinator: ShoppingListCoordinator, entry_id: &str) -> Result<()> {
    let mut service = TodoService::setup(coordinator, entry_id)
        .await
        .context("First refresh failed")?;

    for entity in service.entities() {
        info!("To-do list '{}' ({})", entity.name(), entity.unique_id());
    }

    let (command_tx, command_rx) = mpsc::channel(16);
    tokio::spawn(read_commands(command_tx));

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    tokio::spawn(async move {
        match wait_for_shutdown().await {
            Ok(signal) => info!("Received shutdown signal: {}", signal),
            Err(e) => error!("Shutdown error: {}", e),
        }
        let _ = shutdown_tx.send(());
    });

    service
        .run_with_shutdown(command_rx, Some(shutdown_rx))
        .await?;

    info!("Shutting down daemon");
    Ok(())
}

/// Forward parsed stdin lines to the service until EOF
async fn read_commands(commands: mpsc::Sender<TodoCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        match lines.next_line().await {
            Ok(Some(line)) if line.trim().is_empty() => continue,
            Ok(Some(line)) => match parse_command(&line) {
                Ok(command) => {
                    if commands.send(command).await.is_err() {
                        break;
                    }
                }
                Err(e) => warn!("{}", e),
            },
            Ok(None) => {
                debug!("stdin closed, no more commands");
                break;
            }
            Err(e) => {
                error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }
}

async fn log_events(mut event_rx: mpsc::Receiver<ica_core::CoordinatorEvent>) {
    while let Some(event) = event_rx.recv().await {
        debug!("Coordinator event: {:?}", event);
    }
}

/// Parse one command line
fn parse_command(line: &str) -> Result<TodoCommand> {
    let mut words = line.split_whitespace();
    let verb = words.next().unwrap_or_default();
    let rest: Vec<&str> = words.collect();

    let list_id = |rest: &[&str]| -> Result<i64> {
        rest.first()
            .with_context(|| format!("'{}' needs a list id", verb))?
            .parse()
            .with_context(|| format!("'{}' needs a numeric list id", verb))
    };
    let word = |rest: &[&str], i: usize, what: &str| -> Result<String> {
        rest.get(i)
            .map(|s| s.to_string())
            .with_context(|| format!("'{}' needs {}", verb, what))
    };

    let command = match verb {
        "show" => TodoCommand::Show,
        "refresh" => TodoCommand::Refresh,
        "add" => {
            let summary = rest.get(1..).unwrap_or_default().join(" ");
            if summary.is_empty() {
                anyhow::bail!("'add' needs a product name");
            }
            TodoCommand::CreateItem {
                list_id: list_id(&rest)?,
                summary,
            }
        }
        "check" | "uncheck" => TodoCommand::UpdateItem {
            list_id: list_id(&rest)?,
            uid: word(&rest, 1, "an item uid")?,
            status: TodoItemStatus::from_checked(verb == "check"),
        },
        "remove" => {
            let uids: Vec<String> = rest.iter().skip(1).map(|s| s.to_string()).collect();
            if uids.is_empty() {
                anyhow::bail!("'remove' needs at least one item uid");
            }
            TodoCommand::DeleteItems {
                list_id: list_id(&rest)?,
                uids,
            }
        }
        "move" => TodoCommand::MoveItem {
            list_id: list_id(&rest)?,
            uid: word(&rest, 1, "an item uid")?,
            previous_uid: rest.get(2).map(|s| s.to_string()),
        },
        "create-list" => {
            if rest.is_empty() {
                anyhow::bail!("'create-list' needs a title");
            }
            TodoCommand::CreateList {
                title: rest.join(" "),
                comment: String::new(),
                store_sorting: true,
            }
        }
        "delete-list" => TodoCommand::DeleteList {
            offline_id: word(&rest, 0, "a list offline id")?,
        },
        other => anyhow::bail!("Unknown command '{}'", other),
    };
    Ok(command)
}

/// Wait for shutdown signals (SIGTERM, SIGINT)
///
/// # Returns
///
/// Returns the name of the signal received
#[cfg(unix)]
async fn wait_for_shutdown() -> Result<&'static str> {
    let mut sigterm = signal(SignalKind::terminate())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGTERM handler: {}", e))?;
    let mut sigint = signal(SignalKind::interrupt())
        .map_err(|e| anyhow::anyhow!("Failed to setup SIGINT handler: {}", e))?;

    Ok(tokio::select! {
        _ = sigterm.recv() => "SIGTERM",
        _ = sigint.recv() => "SIGINT",
    })
}

/// Wait for shutdown signals (SIGINT only)
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
async fn wait_for_shutdown() -> Result<&'static str> {
    tokio::signal::ctrl_c()
        .await
        .map_err(|e| anyhow::anyhow!("Failed to wait for CTRL-C: {}", e))?;
    Ok("SIGINT")
}
