//! BankEase CLI - sign in to a BankEase backend from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password may also come from BANKEASE_PASSWORD)
//! bankease login -u alice -p secret1
//!
//! # Create an account and sign straight in
//! bankease register -u alice -e alice@example.com -p secret1 --login
//!
//! # Show the signed-in account
//! bankease whoami
//!
//! # Backend health and local session summary
//! bankease status
//!
//! # Sign out
//! bankease logout
//! ```
//!
//! The session survives between invocations in a JSON file under the state
//! directory (see `--state-dir`).

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use bankease_session::SessionConfig;
use bankease_session::config::parse_api_url;
use bankease_session::forms::{LoginForm, RegisterForm};
use bankease_session::notify::NOTICE_TARGET;

mod commands;

#[derive(Parser)]
#[command(name = "bankease")]
#[command(author, version, about = "BankEase account client")]
struct Cli {
    /// Backend base URL (overrides `BANKEASE_API_URL`)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Directory holding the session file (overrides `BANKEASE_STATE_DIR`)
    #[arg(long, global = true)]
    state_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long, env = "BANKEASE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "BANKEASE_PASSWORD", hide_env_values = true)]
        password: String,

        /// Password confirmation (defaults to the password)
        #[arg(long)]
        confirm: Option<String>,

        /// Sign in once the account exists
        #[arg(long)]
        login: bool,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in account
    Whoami,
    /// Show backend health and the local session
    Status,
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SessionConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    sentry_event_kind(*metadata.level(), metadata.target())
}

/// User-facing notices are already shown to the user; they only give context.
fn sentry_event_kind(level: tracing::Level, target: &str) -> sentry_tracing::EventFilter {
    if target == NOTICE_TARGET {
        return sentry_tracing::EventFilter::Breadcrumb;
    }

    match level {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    // .env may carry BANKEASE_PASSWORD, so load it before parsing arguments
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = SessionConfig::from_env();

    // Sentry must be initialized before the tracing subscriber
    let sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        "bankease_cli=info,bankease_session=info,bankease::notice=info".into()
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        drop(sentry_guard);
        std::process::exit(1);
    }
}

async fn run(cli: Cli, mut config: SessionConfig) -> Result<(), Box<dyn std::error::Error>> {
    if let Some(url) = cli.api_url {
        config.api_url = parse_api_url(&url)?;
    }
    if let Some(dir) = cli.state_dir {
        config.state_dir = Some(dir);
    }

    let context = commands::Context::new(&config)?;

    let result = match cli.command {
        Commands::Login { username, password } => {
            commands::auth::login(&context, &LoginForm { username, password }).await
        }
        Commands::Register {
            username,
            email,
            password,
            confirm,
            login,
        } => {
            let form = RegisterForm {
                confirm_password: confirm.unwrap_or_else(|| password.clone()),
                username,
                email,
                password,
            };
            commands::auth::register(&context, &form, login).await
        }
        Commands::Logout => {
            commands::auth::logout(&context);
            Ok(())
        }
        Commands::Whoami => {
            commands::auth::whoami(&context).await;
            Ok(())
        }
        Commands::Status => commands::status::show(&context).await,
    };

    // Let the backend hear about a sign-out before the process exits
    context.session.drain_background().await;

    result?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "bankease",
            "whoami",
            "--api-url",
            "https://api.bankease.example",
            "--state-dir",
            "/tmp/bankease",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Whoami));
        assert_eq!(cli.api_url.as_deref(), Some("https://api.bankease.example"));
        assert_eq!(cli.state_dir, Some(PathBuf::from("/tmp/bankease")));
    }

    #[test]
    fn test_notices_stay_out_of_sentry_events() {
        assert_eq!(
            sentry_event_kind(tracing::Level::WARN, NOTICE_TARGET).bits(),
            sentry_tracing::EventFilter::Breadcrumb.bits()
        );
        assert_eq!(
            sentry_event_kind(tracing::Level::WARN, "bankease_session::store").bits(),
            sentry_tracing::EventFilter::Event.bits()
        );
        assert_eq!(
            sentry_event_kind(tracing::Level::TRACE, "bankease_session::store").bits(),
            sentry_tracing::EventFilter::Ignore.bits()
        );
    }

    #[test]
    fn test_register_flags() {
        let cli = Cli::try_parse_from([
            "bankease",
            "register",
            "-u",
            "alice",
            "-e",
            "alice@example.com",
            "-p",
            "secret1",
            "--login",
        ])
        .unwrap();

        match cli.command {
            Commands::Register {
                username,
                confirm,
                login,
                ..
            } => {
                assert_eq!(username, "alice");
                assert!(confirm.is_none());
                assert!(login);
            }
            _ => panic!("expected register"),
        }
    }
}
