//! Opt-in logging for the shim.
//!
//! Silent unless `RFWD_LOG` is set. Log lines go to `RFWD_LOG_FILE` when
//! given, otherwise to stderr through [`RawWriter`] so they never re-enter
//! the interposed `write` on fd 2.

use std::fs::OpenOptions;
use std::io;
use std::sync::Mutex;

use rfwd_core::config::{LOG_FILE_VAR, LOG_FILTER_VAR};
use rfwd_core::ShimConfig;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::EnvFilter;

use crate::diag::{self, RawWriter};

/// Install the global subscriber described by `config`.
///
/// Problems are reported once through [`diag::report`] and leave the shim
/// running without logs.
pub fn init(config: &ShimConfig) {
    let Some(directive) = config.log_filter.as_deref() else {
        return;
    };

    let filter = match EnvFilter::try_new(directive) {
        Ok(filter) => filter,
        Err(e) => {
            diag::report(&format!("ignoring {}={:?}: {}", LOG_FILTER_VAR, directive, e));
            return;
        }
    };

    let writer = match make_writer(config) {
        Ok(writer) => writer,
        Err(e) => {
            diag::report(&format!("cannot open {}: {}", LOG_FILE_VAR, e));
            return;
        }
    };

    // A host that already installed a subscriber keeps it
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .try_init();
}

fn make_writer(config: &ShimConfig) -> io::Result<BoxMakeWriter> {
    match &config.log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Ok(BoxMakeWriter::new(Mutex::new(file)))
        }
        None => Ok(BoxMakeWriter::new(RawWriter::stderr)),
    }
}
