use anyhow::{anyhow, Result};
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt as tsfmt;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry;
use tracing_subscriber::util::SubscriberInitExt;

fn level_for(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}

pub fn init_tracing(verbose: u8, quiet: bool) -> Result<()> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(level_for(verbose, quiet).into())
        .from_env_lossy();

    let stderr_layer = tsfmt::layer()
        .with_writer(std::io::stderr)
        .with_level(true)
        .with_target(false)
        .compact();

    registry()
        .with(env_filter)
        .with(stderr_layer)
        .try_init()
        .map_err(|err| anyhow!("ログ初期化に失敗しました: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quiet_overrides_verbosity() {
        assert_eq!(level_for(3, true), LevelFilter::ERROR);
    }

    #[test]
    fn verbosity_steps_up() {
        assert_eq!(level_for(0, false), LevelFilter::INFO);
        assert_eq!(level_for(1, false), LevelFilter::DEBUG);
        assert_eq!(level_for(5, false), LevelFilter::TRACE);
    }
}
