// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use super::{DisplayPreference, TracingConfig};
use miette::IntoDiagnostic as _;
use tracing_subscriber::{Layer, layer::SubscriberExt as _, registry::LookupSpan,
                         util::SubscriberInitExt as _};

/// Type alias for a boxed layer.
pub type DynLayer<S> = dyn Layer<S> + Send + Sync + 'static;

/// Avoid gnarly type annotations by using a macro to create the `fmt` layer.
macro_rules! create_fmt {
    () => {
        tracing_subscriber::fmt::layer()
            .with_thread_names(true)
            .with_target(false)
    };
}

/// Returns the display layer for `tracing_config`, with its level filter applied. This
/// does not initialize the tracing system, see [`try_initialize_logging_global()`].
pub fn create_display_layer<S>(tracing_config: TracingConfig) -> Box<DynLayer<S>>
where
    S: tracing_core::Subscriber,
    for<'a> S: LookupSpan<'a>,
{
    let level_filter = tracing_config.get_level_filter();
    let fmt_layer = create_fmt!();
    match tracing_config.display_preference {
        DisplayPreference::Stdout => Box::new(
            fmt_layer
                .with_writer(std::io::stdout)
                .with_filter(level_filter),
        ),
        DisplayPreference::Stderr => Box::new(
            fmt_layer
                .with_writer(std::io::stderr)
                .with_filter(level_filter),
        ),
        DisplayPreference::TestWriter => Box::new(
            fmt_layer
                .with_writer(tracing_subscriber::fmt::TestWriter::new())
                .with_filter(level_filter),
        ),
    }
}

/// Installs the global default subscriber described by `tracing_config`.
///
/// # Errors
///
/// Returns an error if a global default subscriber has already been installed.
pub fn try_initialize_logging_global(tracing_config: TracingConfig) -> miette::Result<()> {
    tracing_subscriber::registry()
        .with(create_display_layer(tracing_config))
        .try_init()
        .into_diagnostic()
}

/// Same as [`try_initialize_logging_global()`], but silently keeps whatever subscriber
/// is already installed. Meant for tests, where many tests race to install one.
pub fn initialize_logging_global_once(tracing_config: TracingConfig) {
    let _unused = try_initialize_logging_global(tracing_config);
}
