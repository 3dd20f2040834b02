//! tracing subscriber setup

use std::{fs::File, sync::Mutex};

use anyhow::Context;
use gnf::config::LoggingConfig;
use tracing_subscriber::{fmt, fmt::writer::MakeWriterExt, EnvFilter};

/// Install the global subscriber: stderr, plus a plain-text copy in `log_file` when set.
///
/// `RUST_LOG` directives refine the configured level.
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let level = config.level_filter()?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    match &config.log_file {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("cannot create log file {}", path.display()))?;
            fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::io::stderr.and(Mutex::new(file)))
                .init();
        }
        None => {
            fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}
