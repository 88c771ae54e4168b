use clap::ValueEnum;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Output format for log lines
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Single-line human readable output
    Compact,
    /// One JSON object per line, for log shippers
    Json,
}

fn default_filter(verbose: bool) -> EnvFilter {
    let directives = if verbose {
        "bookshelf_core=debug,bookshelf_server=debug,info"
    } else {
        "bookshelf_core=info,bookshelf_server=info"
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives))
}

/// Install the global subscriber; `RUST_LOG` overrides the default filter
pub fn init(verbose: bool, format: LogFormat) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    let registry = tracing_subscriber::registry().with(default_filter(verbose));

    match format {
        LogFormat::Compact => registry.with(fmt_layer.compact()).init(),
        LogFormat::Json => registry.with(fmt_layer.json()).init(),
    }
}
