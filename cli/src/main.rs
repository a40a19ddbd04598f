mod replay;

use std::fs;
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use infopc::{ConfigError, Identity, RouteTable, SessionState};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("failed to read {path}: {source}")]
    Read { path: PathBuf, source: std::io::Error },
    #[error("invalid route table: {0}")]
    Routes(#[from] ConfigError),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("--email requires --user")]
    EmailWithoutUser,
    #[error("redirects did not settle at {0}")]
    RedirectLoop(String),
}

#[derive(Parser, Debug)]
#[command(name = "infopc-cli", about = "Inspect InfoPC session and route-guard decisions")]
struct Cli {
    /// JSON route table; defaults to the built-in table.
    #[arg(long, global = true, env = "INFOPC_ROUTES")]
    routes: Option<PathBuf>,

    /// Log store activity to stderr.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Evaluate one navigation request.
    Decide {
        #[arg(long)]
        path: String,
        /// Signed-in user id; omit for a signed-out session.
        #[arg(long)]
        user: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Evaluate before the first provider notification.
        #[arg(long, conflicts_with = "user")]
        pending: bool,
    },
    /// Run a JSON step script through a live session store.
    Replay { script: PathBuf },
}

#[derive(Debug, Serialize)]
struct DecideReport {
    path: String,
    state: SessionState,
    outcome: infopc::Outcome,
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    let cli = Cli::parse();
    let level = if cli.verbose { tracing::Level::DEBUG } else { tracing::Level::WARN };
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_max_level(level).init();

    let routes = load_routes(cli.routes.as_deref())?;
    match cli.command {
        Command::Decide { path, user, email, pending } => run_decide(&routes, path, user, email, pending),
        Command::Replay { script } => run_replay(&routes, &script).await,
    }
}

fn load_routes(path: Option<&Path>) -> Result<RouteTable, CliError> {
    let Some(path) = path else {
        return Ok(RouteTable::default());
    };
    let raw = read_file(path)?;
    Ok(RouteTable::from_json_str(&raw)?)
}

fn read_file(path: &Path) -> Result<String, CliError> {
    fs::read_to_string(path).map_err(|source| CliError::Read { path: path.to_owned(), source })
}

fn session_from_args(user: Option<String>, email: Option<String>, pending: bool) -> Result<SessionState, CliError> {
    if pending {
        return Ok(SessionState::pending());
    }
    let identity = match (user, email) {
        (Some(id), Some(email)) => Some(Identity::new(id).with_display_address(email)),
        (Some(id), None) => Some(Identity::new(id)),
        (None, Some(_)) => return Err(CliError::EmailWithoutUser),
        (None, None) => None,
    };
    Ok(SessionState::resolved(identity))
}

fn run_decide(
    routes: &RouteTable,
    path: String,
    user: Option<String>,
    email: Option<String>,
    pending: bool,
) -> Result<(), CliError> {
    let state = session_from_args(user, email, pending)?;
    let outcome = routes.decide(&state, &path);
    let report = DecideReport { path, state, outcome };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

async fn run_replay(routes: &RouteTable, script: &Path) -> Result<(), CliError> {
    let raw = read_file(script)?;
    let steps = replay::parse_steps(&raw)?;
    for report in replay::run(routes, steps).await? {
        println!("{}", serde_json::to_string(&report)?);
    }
    Ok(())
}
