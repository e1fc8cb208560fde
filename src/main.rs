//! TarangIO daemon entry point
//!
//! Loads the TOML configuration, sets up logging and runs the monitoring
//! application until Ctrl-C.

use std::env;
use std::path::Path;

use tarang_io::app::MonitorApp;
use tarang_io::config::AppConfig;
use tarang_io::error::Result;

/// Parse config path from command line arguments.
///
/// Supports:
/// - `tarang-io <path>` (positional)
/// - `tarang-io --config <path>` (flag-based)
/// - `tarang-io -c <path>` (short flag)
///
/// Defaults to `/etc/tarang-io.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    // Default path
    "/etc/tarang-io.toml".to_string()
}

fn main() -> Result<()> {
    // Config comes before the logger so the file can choose log level and
    // destination; a broken file still reaches the console through main's
    // error return
    let config_path = parse_config_path();
    let have_config = Path::new(&config_path).exists();
    let config = if have_config {
        AppConfig::from_file(&config_path)?
    } else {
        AppConfig::default()
    };

    let target = match config.logging.output.as_str() {
        "stdout" => env_logger::Target::Stdout,
        _ => env_logger::Target::Stderr,
    };
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.as_str()),
    )
    .target(target)
    .init();

    log::info!("TarangIO v{} starting...", env!("CARGO_PKG_VERSION"));
    if have_config {
        log::info!("Using config: {}", config_path);
    } else {
        log::warn!("No config at {}, using built-in defaults", config_path);
    }

    let mut app = MonitorApp::new(&config)?;
    app.run()?;

    log::info!("TarangIO stopped");
    Ok(())
}
