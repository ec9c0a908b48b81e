use std::fs::File;
use std::path::Path;

use simplelog::{ColorChoice, CombinedLogger, LevelFilter, TermLogger, TerminalMode, WriteLogger};

use crate::error::AppError;

/// Installs the global logger.
///
/// Without a log file this is `env_logger` at `info` (override with `RUST_LOG`). With one,
/// info goes to the terminal and debug and above to the file.
pub fn init(log_file: Option<&Path>) -> Result<(), AppError> {
    let Some(path) = log_file else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).try_init()?;
        return Ok(());
    };
    let cfg = simplelog::Config::default();
    CombinedLogger::init(vec![
        TermLogger::new(LevelFilter::Info, cfg.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(LevelFilter::Debug, cfg, File::create(path)?),
    ])?;
    Ok(())
}
