use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::prelude::*;

use super::{RegistryError, RegistryResult};

/// Where a command sends its events.
#[derive(Debug, Clone, Copy)]
pub enum LogTarget<'a> {
    /// JSON lines appended to a run's `logs.ndjson`; defaults to `info`.
    RunFile(&'a Path),
    /// Human-readable lines on stderr; defaults to `warn`.
    Stderr,
}

/// Install the global subscriber; `RUST_LOG` overrides the default level.
pub fn init_logging(target: LogTarget<'_>) -> RegistryResult<()> {
    let registry = tracing_subscriber::registry();
    let installed = match target {
        LogTarget::RunFile(path) => {
            let file = Arc::new(OpenOptions::new().create(true).append(true).open(path)?);
            let layer = tracing_subscriber::fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_writer(move || RunLog(Arc::clone(&file)));
            registry.with(filter("info")).with(layer).try_init()
        }
        LogTarget::Stderr => {
            let layer = tracing_subscriber::fmt::layer()
                .with_timer(UtcTime::rfc_3339())
                .with_writer(io::stderr);
            registry.with(filter("warn")).with(layer).try_init()
        }
    };
    installed.map_err(|err| RegistryError::Logging(err.to_string()))
}

fn filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Shared append handle; `&File` writes need no lock.
struct RunLog(Arc<File>);

impl Write for RunLog {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.0).flush()
    }
}
