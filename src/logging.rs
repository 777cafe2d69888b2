use log::LevelFilter;

pub fn parse_level(level: &str) -> LevelFilter {
    match level.trim().to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

/// Installs the global logger at `level`. `RUST_LOG` directives still apply on top.
pub fn init(level: &str) -> Result<(), log::SetLoggerError> {
    env_logger::Builder::new()
        .filter_level(parse_level(level))
        .parse_default_env()
        .format_timestamp_secs()
        .try_init()?;

    log::info!("Logging initialized at level: {level}");
    Ok(())
}
