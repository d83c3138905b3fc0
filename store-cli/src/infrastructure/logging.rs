use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Уровень логов с учётом `-v`: каждый флаг поднимает его на ступень
/// (info, debug, trace). Без флагов действует настроенный уровень.
pub(crate) fn log_level(verbose: u8, configured: &str) -> &str {
    match verbose {
        0 => configured,
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Логи идут в stderr, чтобы не мешать выводу команд.
///
/// `level` принимает и директивы `EnvFilter`, например `store_client=debug`.
pub(crate) fn init_logging(level: &str) -> Result<()> {
    let filter =
        EnvFilter::try_new(level).map_err(|e| anyhow!("invalid log level {level:?}: {e}"))?;

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(())
}
