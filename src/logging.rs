// Logging setup - tracing to stderr, filtered by RUST_LOG
//
// stdout is reserved for command output. While the TUI owns the terminal,
// events are dropped instead of being written over the alternate screen.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing_subscriber::fmt::writer::{EitherWriter, MakeWriter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static STDERR_QUIET: AtomicBool = AtomicBool::new(false);

pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "correlatives=debug,warn"
    } else {
        "correlatives=warn"
    }
}

/// Stderr, or a sink while a [`QuietStderr`] guard is alive
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrWriter;

impl<'a> MakeWriter<'a> for StderrWriter {
    type Writer = EitherWriter<io::Stderr, io::Sink>;

    fn make_writer(&'a self) -> Self::Writer {
        if stderr_is_quiet() {
            EitherWriter::B(io::sink())
        } else {
            EitherWriter::A(io::stderr())
        }
    }
}

/// Keeps log output off the terminal until dropped
#[derive(Debug)]
pub struct QuietStderr {
    previous: bool,
}

impl Drop for QuietStderr {
    fn drop(&mut self) {
        STDERR_QUIET.store(self.previous, Ordering::SeqCst);
    }
}

pub fn quiet_stderr() -> QuietStderr {
    QuietStderr {
        previous: STDERR_QUIET.swap(true, Ordering::SeqCst),
    }
}

pub fn stderr_is_quiet() -> bool {
    STDERR_QUIET.load(Ordering::SeqCst)
}

pub fn init_logger(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(StderrWriter)
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}
