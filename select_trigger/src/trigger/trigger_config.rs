// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use crate::{LoopbackPortRange, SignalChannelKind};

/// Read size used when draining wakeup bytes (`8_192` bytes).
pub const DEFAULT_DRAIN_BUFFER_SIZE: usize = 8_192;

/// Construction-time settings for a [`Trigger`].
///
/// [`Default`] is what [`Trigger::new()`] uses: the platform's channel kind, the default
/// loopback port range, and an 8 KiB drain buffer.
///
/// [`Trigger::new()`]: super::Trigger::new
/// [`Trigger`]: super::Trigger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TriggerConfig {
    pub channel_kind: SignalChannelKind,
    pub loopback_ports: LoopbackPortRange,
    /// Clamped to at least `1` byte.
    pub drain_buffer_size: usize,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            channel_kind: SignalChannelKind::platform_default(),
            loopback_ports: LoopbackPortRange::default(),
            drain_buffer_size: DEFAULT_DRAIN_BUFFER_SIZE,
        }
    }
}

impl TriggerConfig {
    #[must_use]
    pub fn with_channel_kind(mut self, channel_kind: SignalChannelKind) -> Self {
        self.channel_kind = channel_kind;
        self
    }

    #[must_use]
    pub fn with_loopback_ports(mut self, loopback_ports: LoopbackPortRange) -> Self {
        self.loopback_ports = loopback_ports;
        self
    }

    #[must_use]
    pub fn with_drain_buffer_size(mut self, drain_buffer_size: usize) -> Self {
        self.drain_buffer_size = drain_buffer_size;
        self
    }

    pub(crate) fn effective_drain_buffer_size(&self) -> usize { self.drain_buffer_size.max(1) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_default() {
        let config = TriggerConfig::default();
        assert_eq!(config.channel_kind, SignalChannelKind::platform_default());
        assert_eq!(config.loopback_ports, LoopbackPortRange::default());
        assert_eq!(config.drain_buffer_size, 8_192);
    }

    #[test]
    fn test_drain_buffer_never_empty() {
        let config = TriggerConfig::default().with_drain_buffer_size(0);
        assert_eq!(config.effective_drain_buffer_size(), 1);
    }

    #[test]
    fn test_builders() {
        let ports = LoopbackPortRange {
            first_port: 30_000,
            port_count: 5,
        };
        let config = TriggerConfig::default()
            .with_channel_kind(SignalChannelKind::Loopback)
            .with_loopback_ports(ports);
        assert_eq!(config.channel_kind, SignalChannelKind::Loopback);
        assert_eq!(config.loopback_ports, ports);
    }
}
