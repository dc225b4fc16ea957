//! Shared tracing/logging initialization.
//!
//! The tunnel runner and the CloudFront updater may live in different
//! processes whose output ends up in one terminal. Every line is emitted
//! inside a root `process{label=...}` span so the origin of a line is visible
//! in the merged stream.

use std::fmt;
use std::io::IsTerminal;

use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Fixed set of labels a log line can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessLabel {
    /// The CLI process itself (config, orchestration).
    Main,
    /// The tunnel runner and the ngrok agent output.
    Tunnel,
    /// The CloudFront updater, in-process or as a worker.
    CloudFront,
}

impl ProcessLabel {
    pub const ALL: [Self; 3] = [Self::Main, Self::Tunnel, Self::CloudFront];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Main => "nctl",
            Self::Tunnel => "tunnel",
            Self::CloudFront => "cloudfront",
        }
    }

    /// A root span tagging everything recorded inside it with this label.
    ///
    /// The span has no parent, so a label never nests under another one.
    pub fn span(self) -> tracing::Span {
        tracing::info_span!(parent: None, "process", label = self.as_str())
    }
}

impl fmt::Display for ProcessLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging settings for one process.
#[derive(Debug, Clone, Copy)]
pub struct LogConfig {
    pub debug: bool,
    pub log_json: bool,
    pub process: ProcessLabel,
}

impl LogConfig {
    pub const fn new(debug: bool, log_json: bool, process: ProcessLabel) -> Self {
        Self {
            debug,
            log_json,
            process,
        }
    }

    /// Filter used when `RUST_LOG` is not set.
    pub fn default_filter(&self) -> String {
        let level = if self.debug { "debug" } else { "info" };
        format!("nctl={level},nctl_core={level}")
    }
}

/// Build a subscriber writing to `writer`.
///
/// `init_tracing` installs this globally; tests use it with an in-memory
/// writer.
pub fn build_subscriber<W>(
    config: &LogConfig,
    filter: EnvFilter,
    ansi: bool,
    writer: W,
) -> Box<dyn tracing::Subscriber + Send + Sync + 'static>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        Box::new(registry.with(tracing_subscriber::fmt::layer().json().with_writer(writer)))
    } else {
        Box::new(
            registry.with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(ansi)
                    .with_writer(writer),
            ),
        )
    }
}

/// Initialise the global tracing subscriber, logging to stderr.
///
/// stdout is kept clean: the worker process uses it to hand results back to
/// its parent.
pub fn init_tracing(config: &LogConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_filter()));
    let ansi = std::io::stderr().is_terminal();
    build_subscriber(config, filter, ansi, std::io::stderr).init();
}
