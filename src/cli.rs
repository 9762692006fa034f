use clap::{Args, Parser, Subcommand};
use housing_alerts::auth::{AuthState, Role};
use housing_alerts::config::{self, FileConfig};
use std::net::SocketAddr;
use std::path::PathBuf;
use time::Duration;

const DEFAULT_BIND: ([u8; 4], u16) = ([127, 0, 0, 1], 5000);

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(config::AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::AuthKey) = cli.command {
        let code = run_auth_key();
        return RunOutcome::Exit(code);
    }

    let file = match cli.config.as_deref() {
        Some(path) => match FileConfig::load(path) {
            Ok(file) => file,
            Err(err) => {
                eprintln!("error: {err}");
                return RunOutcome::Exit(2);
            }
        },
        None => FileConfig::default(),
    };

    let config = match resolve_config(&cli, file) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("error: {err}");
            return RunOutcome::Exit(2);
        }
    };

    if let Some(Command::IssueToken(args)) = cli.command {
        let code = run_issue_token(&config, args);
        return RunOutcome::Exit(code);
    }

    RunOutcome::Serve(config)
}

#[derive(Parser, Debug)]
#[command(
    name = "housing-alerts",
    version,
    about = "Saved-search alerts and notifications for student housing listings"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, global = true, env = "HOUSING_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "HOUSING_BIND")]
    bind: Option<SocketAddr>,
    #[arg(long, global = true, env = "HOUSING_APP_NAME")]
    app_name: Option<String>,
    #[arg(long, global = true, env = "HOUSING_AUTH_KEY")]
    auth_key: Option<String>,
    #[arg(long, global = true, env = "HOUSING_AUTH_TOKEN_TTL")]
    auth_token_ttl: Option<String>,
    #[arg(long, env = "HOUSING_DATA_FILE")]
    data_file: Option<PathBuf>,
    #[arg(long, env = "HOUSING_FANOUT_QUEUE_CAPACITY")]
    fanout_queue_capacity: Option<usize>,
    #[arg(long, env = "HOUSING_RETENTION_SWEEP_INTERVAL")]
    retention_sweep_interval: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a freshly generated signing key.
    AuthKey,
    /// Print a bearer token for a user.
    IssueToken(IssueTokenArgs),
}

#[derive(Args, Debug)]
struct IssueTokenArgs {
    #[arg(long)]
    user: String,
    #[arg(long, value_enum, default_value = "student")]
    role: Role,
}

fn run_auth_key() -> i32 {
    let secret = match housing_alerts::auth::generate_auth_key() {
        Ok(secret) => secret,
        Err(err) => {
            eprintln!("failed to generate auth key: {err}");
            return 1;
        }
    };
    println!("{secret}");
    0
}

fn run_issue_token(config: &config::AppConfig, args: IssueTokenArgs) -> i32 {
    let token = AuthState::from_config(config).and_then(|auth| auth.issue_token(&args.user, args.role));
    match token {
        Ok(token) => {
            println!("{token}");
            0
        }
        Err(err) => {
            eprintln!("failed to issue token: {err}");
            1
        }
    }
}

fn resolve_config(cli: &Cli, file: FileConfig) -> Result<config::AppConfig, String> {
    let auth_key = cli
        .auth_key
        .clone()
        .or(file.auth_key)
        .ok_or("an auth key is required (--auth-key, HOUSING_AUTH_KEY or auth_key in the config file)")?;
    let auth_key = auth_key.trim();
    if auth_key.is_empty() {
        return Err("auth key cannot be empty".to_string());
    }

    let token_ttl = match cli.auth_token_ttl.as_deref().or(file.auth_token_ttl.as_deref()) {
        Some(raw) => parse_duration(raw, "auth token ttl")?,
        None => default_auth_token_ttl(),
    };

    let retention_sweep_interval = match cli
        .retention_sweep_interval
        .as_deref()
        .or(file.retention_sweep_interval.as_deref())
    {
        Some(raw) => parse_duration(raw, "retention sweep interval")?
            .try_into()
            .map_err(|_| "retention sweep interval is out of range".to_string())?,
        None => housing_alerts::notifications::retention::DEFAULT_SWEEP_INTERVAL,
    };

    let fanout_queue_capacity = cli
        .fanout_queue_capacity
        .or(file.fanout_queue_capacity)
        .unwrap_or(housing_alerts::alerts::worker::DEFAULT_QUEUE_CAPACITY);
    if fanout_queue_capacity == 0 {
        return Err("fan-out queue capacity must be greater than 0".to_string());
    }

    let app_name = cli
        .app_name
        .clone()
        .or(file.app_name)
        .map(|name| name.trim().to_string())
        .unwrap_or_else(|| config::DEFAULT_APP_NAME.to_string());
    if app_name.is_empty() {
        return Err("app name cannot be empty".to_string());
    }

    Ok(config::AppConfig {
        bind: cli
            .bind
            .or(file.bind)
            .unwrap_or_else(|| SocketAddr::from(DEFAULT_BIND)),
        app_name,
        auth: config::AuthConfig {
            key: auth_key.to_string(),
            token_ttl,
        },
        data_file: cli.data_file.clone().or(file.data_file),
        fanout_queue_capacity,
        retention_sweep_interval,
    })
}

fn default_auth_token_ttl() -> Duration {
    Duration::days(30)
}

fn parse_duration(raw: &str, what: &str) -> Result<Duration, String> {
    let value = raw.trim();
    if value.is_empty() {
        return Err(format!("{what} cannot be empty"));
    }

    let (amount, unit) = match value.chars().last() {
        Some(ch) if ch.is_ascii_alphabetic() => {
            (&value[..value.len() - 1], ch.to_ascii_lowercase())
        }
        _ => (value, 's'),
    };

    let amount: i64 = amount
        .parse()
        .map_err(|_| format!("invalid {what} '{value}'; expected <number>[s|m|h|d]"))?;

    if amount <= 0 {
        return Err(format!("{what} must be greater than 0"));
    }

    match unit {
        's' => Ok(Duration::seconds(amount)),
        'm' => Ok(Duration::minutes(amount)),
        'h' => Ok(Duration::hours(amount)),
        'd' => Ok(Duration::days(amount)),
        _ => Err(format!(
            "invalid {what} '{value}'; expected <number>[s|m|h|d]"
        )),
    }
}
