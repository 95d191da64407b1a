//! First-run setup: creates `.env.local` from `env.example`, checks the
//! required settings and runs the migrations as a connectivity check.

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use crm_web::{config, Config};
use database::Database;

const TEMPLATE: &str = "env.example";
const LOCAL_ENV: &str = ".env.local";

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    match run().await {
        Ok(config) => {
            println!();
            println!("Setup complete. Next steps:");
            println!("  1. cargo run -p crm-web --bin crm-web");
            println!("  2. Open http://{} and create an account", config.addr);
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("Setup failed: {}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<Config, String> {
    if Path::new(LOCAL_ENV).exists() {
        println!("{} already exists, keeping it", LOCAL_ENV);
    } else {
        if !Path::new(TEMPLATE).exists() {
            return Err(format!("{} not found; run from the repository root", TEMPLATE));
        }
        fs::copy(TEMPLATE, LOCAL_ENV).map_err(|e| format!("could not create {}: {}", LOCAL_ENV, e))?;
        println!("Created {} from {}; edit it with your values", LOCAL_ENV, TEMPLATE);
    }

    config::load_env_files();
    let config = Config::from_env().map_err(|e| e.to_string())?;
    println!("Configuration found (database: {})", config.database_url);

    let db = Database::connect(&config.database_url)
        .await
        .map_err(|e| format!("could not connect to the database: {}", e))?;
    db.migrate()
        .await
        .map_err(|e| format!("could not run migrations: {}", e))?;
    db.close().await;
    println!("Database reachable and schema up to date");

    Ok(config)
}
