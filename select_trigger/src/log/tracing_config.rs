// Copyright (c) 2024-2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use tracing_core::LevelFilter;

/// Where (and how verbosely) the [`tracing`] output of a process that owns a [`Trigger`]
/// goes. Pass this to [`try_initialize_logging_global()`].
///
/// [`Trigger`]: crate::Trigger
/// [`try_initialize_logging_global()`]: super::try_initialize_logging_global
#[derive(Debug, Clone, Copy)]
pub struct TracingConfig {
    pub display_preference: DisplayPreference,
    pub level: tracing::Level,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayPreference {
    Stdout,
    Stderr,
    /// Routes output through libtest's capture, so it only shows up for failing tests.
    TestWriter,
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self {
            display_preference: DisplayPreference::Stderr,
            level: tracing::Level::INFO,
        }
    }
}

impl TracingConfig {
    #[must_use]
    pub fn new_display(display_preference: DisplayPreference) -> Self {
        Self {
            display_preference,
            level: tracing::Level::DEBUG,
        }
    }

    #[must_use]
    pub fn new_for_tests() -> Self { Self::new_display(DisplayPreference::TestWriter) }

    #[must_use]
    pub fn get_level_filter(&self) -> LevelFilter { LevelFilter::from_level(self.level) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_level_filter_follows_level() {
        let config = TracingConfig {
            display_preference: DisplayPreference::Stdout,
            level: tracing::Level::WARN,
        };
        assert_eq!(config.get_level_filter(), LevelFilter::WARN);
    }

    #[test]
    fn test_defaults() {
        let config = TracingConfig::default();
        assert_eq!(config.display_preference, DisplayPreference::Stderr);
        assert_eq!(config.get_level_filter(), LevelFilter::INFO);
        assert_eq!(
            TracingConfig::new_for_tests().display_preference,
            DisplayPreference::TestWriter
        );
    }
}
