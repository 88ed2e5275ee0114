// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

use strum::IntoEnumIterator as _;
use strum_macros::{Display, EnumIter};

/// Which flavor of [`SignalChannel`] backs a [`Trigger`].
///
/// This is a capability decision, not a user preference: use [`platform_default()`]
/// unless you are testing the other variant on a platform that supports both.
///
/// [`SignalChannel`]: super::SignalChannel
/// [`Trigger`]: crate::Trigger
/// [`platform_default()`]: Self::platform_default
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumIter)]
pub enum SignalChannelKind {
    /// Unidirectional OS pipe. Unix only.
    #[strum(serialize = "pipe")]
    Pipe,
    /// TCP socket pair over the loopback interface.
    #[strum(serialize = "loopback")]
    Loopback,
}

impl SignalChannelKind {
    /// Pipe where the readiness wait accepts any file descriptor (unix), loopback
    /// sockets everywhere else.
    #[must_use]
    pub const fn platform_default() -> Self {
        if cfg!(unix) { Self::Pipe } else { Self::Loopback }
    }

    #[must_use]
    pub const fn is_supported(self) -> bool {
        match self {
            Self::Pipe => cfg!(unix),
            Self::Loopback => true,
        }
    }

    /// All variants that can be constructed on this platform.
    pub fn supported() -> impl Iterator<Item = Self> { Self::iter().filter(|it| it.is_supported()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display() {
        assert_eq!(SignalChannelKind::Pipe.to_string(), "pipe");
        assert_eq!(SignalChannelKind::Loopback.to_string(), "loopback");
    }

    #[test]
    fn test_platform_default_is_supported() {
        assert!(SignalChannelKind::platform_default().is_supported());
        assert!(SignalChannelKind::Loopback.is_supported());
    }

    #[cfg(unix)]
    #[test]
    fn test_unix_supports_both() {
        assert_eq!(SignalChannelKind::platform_default(), SignalChannelKind::Pipe);
        assert_eq!(
            SignalChannelKind::supported().collect::<Vec<_>>(),
            vec![SignalChannelKind::Pipe, SignalChannelKind::Loopback]
        );
    }
}
