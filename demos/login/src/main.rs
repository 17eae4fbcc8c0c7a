//! Login - form-dispatch demo
//!
//! Fills the login form from the command line (or replays intents from a
//! JSON-lines file), submits it and waits for the outcome. The rendered form
//! goes to stdout after every change; logs go to stderr.
//!
//! # Usage
//!
//! ```sh
//! # Submit credentials to a local backend
//! cargo run -p login-demo -- --email a@b.com --password secret1
//!
//! # Replay a recorded session, logging every intent except keystrokes
//! cargo run -p login-demo -- --intents session.jsonl --log-intents --log-exclude FieldChange
//!
//! # From stdin
//! echo '{"kind":"FormSubmit"}' | cargo run -p login-demo -- --intents -
//! ```

use std::io::{self, BufRead, BufReader};
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use form_dispatch::{ConfigError, Navigator, StoreHandle, SubmissionStatus, navigation};
use thiserror::Error;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt};

use login_demo::api::HttpTransport;
use login_demo::config::Args;
use login_demo::intent::LoginIntent;
use login_demo::render::render;
use login_demo::state::AppState;
use login_demo::store_builder;

#[derive(Debug, Error)]
enum AppError {
    #[error("invalid store configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("could not build HTTP client: {0}")]
    Http(#[from] reqwest::Error),

    #[error("could not read intents from {path}: {source}")]
    Read { path: String, source: io::Error },

    #[error("{path}:{line}: {source}")]
    Parse {
        path: String,
        line: usize,
        source: serde_json::Error,
    },

    #[error("nothing to do: pass --email/--password or --intents")]
    NoInput,

    #[error("no outcome after {0}s")]
    Timeout(u64),
}

/// Logs to stderr so stdout only carries the rendered form
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_level(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}

/// Prints route changes instead of switching screens
struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&mut self, route: &str) {
        println!("→ navigating to {route}");
    }
}

fn read_intents(path: &str) -> Result<Vec<LoginIntent>, AppError> {
    let read_err = |source: io::Error| AppError::Read {
        path: path.to_string(),
        source,
    };
    let reader: Box<dyn BufRead> = if path == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        Box::new(BufReader::new(std::fs::File::open(path).map_err(read_err)?))
    };

    let mut intents = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.map_err(read_err)?;
        if line.trim().is_empty() {
            continue;
        }
        let intent = LoginIntent::from_json(&line).map_err(|source| AppError::Parse {
            path: path.to_string(),
            line: index + 1,
            source,
        })?;
        intents.push(intent);
    }
    Ok(intents)
}

fn input_intents(args: &Args) -> Result<Vec<LoginIntent>, AppError> {
    if let Some(path) = &args.intents {
        return read_intents(&path.to_string_lossy());
    }
    if args.email.is_none() && args.password.is_none() {
        return Err(AppError::NoInput);
    }

    let mut intents = Vec::new();
    if let Some(email) = &args.email {
        intents.push(LoginIntent::field("email", email.as_str()));
    }
    if let Some(password) = &args.password {
        intents.push(LoginIntent::field("password", password.as_str()));
    }
    intents.push(LoginIntent::FormSubmit);
    Ok(intents)
}

async fn run(args: Args) -> Result<ExitCode, AppError> {
    let intents = input_intents(&args)?;
    let config = args.store_config();

    let transport = Arc::new(HttpTransport::new(&args.endpoint, config.timeout)?);
    tracing::info!(endpoint = %transport.endpoint(), policy = ?config.policy, "starting");

    let logger = config.intent_logger();
    let intent_log = logger.log();
    let mut store = store_builder(&config, transport, logger)?.build();

    store.subscribe(|state: &Arc<AppState>, _: &StoreHandle<AppState, LoginIntent>| {
        println!("{}", render(state));
    });
    store.subscribe(navigation::on_success(
        AppState::login_form,
        LogNavigator,
        args.success_route.clone(),
    ));

    println!("{}", render(store.state()));

    for intent in intents {
        if let Err(error) = store.dispatch(intent) {
            tracing::warn!(%error, "intent dropped");
        }
    }

    tokio::time::timeout(args.outcome_limit(), store.run_until(|s| !s.login.is_submitting()))
        .await
        .map_err(|_| AppError::Timeout(args.timeout_secs))?;

    if let Some(log) = intent_log.filter(|_| args.log_intents) {
        for entry in log.lock().entries() {
            eprintln!(
                "#{:<3} {:>7} {}{}",
                entry.sequence,
                entry.elapsed_display(),
                entry.summary,
                match entry.state_changed {
                    Some(true) => "",
                    Some(false) => " (no change)",
                    None => " (aborted)",
                }
            );
        }
    }

    Ok(match store.state().login.status() {
        SubmissionStatus::Failed(_) => ExitCode::from(2),
        _ => ExitCode::SUCCESS,
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing();

    match run(args).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(%error, "login demo failed");
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}
