use std::process::ExitCode;
use std::sync::Arc;

use tracing::{error, info};

use stowage::{Config, Database, OutboxNotifier, PolicyEngine, PolicyOptions, Role};

const USAGE: &str = "usage: stowage <user_id> [owner|admin|user]";

fn parse_args(args: &[String]) -> Result<(i64, Role), String> {
    let user_id = args
        .first()
        .ok_or_else(|| USAGE.to_string())?
        .parse::<i64>()
        .map_err(|e| format!("invalid user id: {e}"))?;
    let role = match args.get(1) {
        Some(role) => role.parse::<Role>()?,
        None => Role::User,
    };
    Ok((user_id, role))
}

async fn run(config: &Config, user_id: i64, role: Role) -> stowage::Result<String> {
    let db = Database::open(&config.database.path).await?;
    let options = PolicyOptions::from_config(&config.policy)?;
    let notifier = Arc::new(OutboxNotifier::new(db.clone()));
    let engine = PolicyEngine::with_database_settings(db, notifier, options);

    let summary = engine.remaining_summary(user_id, role).await?;
    serde_json::to_string_pretty(&summary)
        .map_err(|e| stowage::StowageError::Validation(e.to_string()))
}

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let (user_id, role) = match parse_args(&args) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("{e}");
            eprintln!("{USAGE}");
            return ExitCode::from(2);
        }
    };

    // Load configuration
    let config = match Config::load_with_env("stowage.toml") {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load stowage.toml: {e}");
            eprintln!("Using default configuration.");
            let mut config = Config::default();
            config.apply_env_overrides();
            config
        }
    };
    if let Err(e) = config.validate() {
        eprintln!("Invalid configuration: {e}");
        return ExitCode::FAILURE;
    }

    // Initialize logging
    if let Err(e) = stowage::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        stowage::logging::init_console_only(&config.logging.level);
    }

    info!(user_id, role = %role, "Computing remaining allowance");
    match run(&config, user_id, role).await {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to compute summary: {}", e);
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}
