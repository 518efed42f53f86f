use std::process;

use skimmer::{commands, logging, Command, Config, Database, State};

/// Environment variable overriding the config file location.
const CONFIG_ENV: &str = "SKIMMER_CONFIG";

/// Default config file, read from the working directory.
const CONFIG_FILE: &str = "skimmer.toml";

#[tokio::main]
async fn main() {
    let config_path = std::env::var(CONFIG_ENV).unwrap_or_else(|_| CONFIG_FILE.to_string());
    let config = match Config::load(&config_path) {
        Ok(config) => config,
        // First run: no config file yet; register/login will create it
        Err(_) => Config::default_at(&config_path),
    };

    if let Err(e) = logging::init(&config.logging) {
        eprintln!("failed to initialize logging: {e}");
        logging::init_console_only(&config.logging.level);
    }

    let registry = match commands::default_registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let command = match Command::parse(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(_) => {
            eprintln!("usage: skimmer <command> [args...]");
            eprintln!("commands: {}", registry.verbs().join(", "));
            process::exit(1);
        }
    };

    let db = match Database::open(&config.database.path).await {
        Ok(db) => db,
        Err(e) => {
            eprintln!("error: {e}");
            process::exit(1);
        }
    };

    let mut state = State { db, config };
    if let Err(e) = registry.run(&mut state, command).await {
        eprintln!("error: {e}");
        process::exit(1);
    }
}
