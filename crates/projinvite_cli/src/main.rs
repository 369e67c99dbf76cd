//! Terminal rendition of the invitation form.
//!
//! # Responsibility
//! - Prompt for one email per line and print the submission outcome.
//! - Load configuration and logging once at startup.

use log::{error, info};
use projinvite_core::{
    build_service, default_log_level, init_logging, resolve_config_path, AppConfig,
    ConfiguredInviteService,
};
use std::io::{self, BufRead, Write};
use std::path::Path;

const LOG_DIR_ENV: &str = "PROJINVITE_LOG_DIR";

fn main() {
    if let Ok(log_dir) = std::env::var(LOG_DIR_ENV) {
        if let Err(err) = init_logging(default_log_level(), &log_dir) {
            eprintln!("logging disabled: {err}");
        }
    }

    let service = match load_service(&resolve_config_path()) {
        Ok(service) => service,
        Err(message) => {
            eprintln!("Invitation service is not configured: {message}");
            return;
        }
    };

    println!("Project Invitation System");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("Enter your email address: ");
        if io::stdout().flush().is_err() {
            return;
        }
        let Some(Ok(line)) = lines.next() else {
            println!();
            info!("event=cli_exit module=cli status=ok reason=eof");
            return;
        };

        match service.submit(&line) {
            Ok(receipt) => println!("{}", receipt.user_message()),
            Err(err) => println!("{}", err.user_message()),
        }
    }
}

/// Loads the config at `path` and wires the service, logging the outcome.
fn load_service(path: &Path) -> Result<ConfiguredInviteService, String> {
    let config = AppConfig::load(path).map_err(|err| {
        error!(
            "event=cli_startup module=cli status=error stage=config path={} error={}",
            path.display(),
            err
        );
        err.to_string()
    })?;
    let service = build_service(&config).map_err(|err| {
        error!("event=cli_startup module=cli status=error stage=wiring error={err}");
        err.to_string()
    })?;
    info!(
        "event=cli_startup module=cli status=ok backend={}",
        service.repo().backend()
    );
    Ok(service)
}
