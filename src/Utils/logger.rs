//! Logger backend for the `log` macros used across the crate.
use log::{LevelFilter, info};
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::File;
use std::path::Path;

fn config() -> Config {
    ConfigBuilder::new()
        .set_time_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Error)
        .build()
}

/// Logs to the terminal at `level`. Returns false when a logger was installed already, in
/// which case the existing one stays in place.
pub fn init_logger(level: LevelFilter) -> bool {
    let installed = TermLogger::init(level, config(), TerminalMode::Mixed, ColorChoice::Auto).is_ok();
    if installed {
        info!("logger initialised at level {}", level);
    }
    installed
}

/// Logs to the terminal and, at `file_level`, to a file.
pub fn init_logger_with_file<P: AsRef<Path>>(
    level: LevelFilter,
    file_level: LevelFilter,
    path: P,
) -> std::io::Result<bool> {
    let file = File::create(path.as_ref())?;
    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(level, config(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(file_level, config(), file),
    ];
    let installed = CombinedLogger::init(loggers).is_ok();
    if installed {
        info!("logging to {}", path.as_ref().display());
    }
    Ok(installed)
}
