use anyhow::Result;
use log::LevelFilter;
use std::path::Path;

pub fn validate_directory<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.exists() {
        anyhow::bail!("Directory does not exist: {}", path.display());
    }
    if !path.is_dir() {
        anyhow::bail!("Not a directory: {}", path.display());
    }
    Ok(())
}

pub fn validate_file<P: AsRef<Path>>(path: P) -> Result<()> {
    let path = path.as_ref();
    if !path.is_file() {
        anyhow::bail!("File does not exist: {}", path.display());
    }
    Ok(())
}

/// Number of cores used when neither the CLI nor the config sets one.
pub fn default_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Map the `-v` count to a log level: none is info, one is debug, more is trace.
pub fn verbosity_filter(count: u8) -> LevelFilter {
    match count {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
