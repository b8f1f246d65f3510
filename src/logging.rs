use std::fs;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes tracing with a console layer plus a JSON file layer.
///
/// File logs rotate daily under `logs/`; console output stays human
/// readable. `RUST_LOG` overrides the default `info` level for this crate.
pub fn init_logging() {
    let _ = fs::create_dir_all("logs");

    let file_appender = tracing_appender::rolling::daily("logs", "splitter.log");
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);
    let console_layer = fmt::layer().with_target(false).with_writer(std::io::stdout);

    tracing_subscriber::registry()
        .with(
            EnvFilter::from_default_env()
                .add_directive("multiline_splitter=info".parse().unwrap()),
        )
        .with(file_layer)
        .with(console_layer)
        .init();

    // The guard must outlive main so file logs are flushed on exit.
    std::mem::forget(guard);
}
