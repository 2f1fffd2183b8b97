use std::fs::File;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoggerError {
    #[error("failed to create log file {path:?}: {source}")]
    LogFile {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("logger already initialized: {0}")]
    Init(#[from] log::SetLoggerError),
}

/// Log to the terminal at `filter_level`, and additionally to `logfile` when
/// one is given.
pub fn init_logger(filter_level: log::LevelFilter, logfile: Option<&Path>) -> Result<(), LoggerError> {
    let mut loggers: Vec<Box<dyn simplelog::SharedLogger>> = vec![simplelog::TermLogger::new(
        filter_level,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    ) as Box<dyn simplelog::SharedLogger>];

    if let Some(path) = logfile {
        let file = File::create(path).map_err(|source| LoggerError::LogFile {
            source,
            path: path.to_path_buf(),
        })?;
        loggers.push(simplelog::WriteLogger::new(
            filter_level,
            simplelog::Config::default(),
            file,
        ));
    }

    simplelog::CombinedLogger::init(loggers)?;
    Ok(())
}
