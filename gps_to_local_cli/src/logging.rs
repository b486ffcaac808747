use log::LevelFilter;

/// Logs to stderr so stdout stays free for published messages. `LOG_LEVEL`
/// overrides the level picked from `--verbose`.
pub fn initialize(verbose: bool) {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    env_logger::Builder::new()
        .format_timestamp(None)
        .format_target(false)
        .filter_level(level)
        .parse_env("LOG_LEVEL")
        .init();
}
