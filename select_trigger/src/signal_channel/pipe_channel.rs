// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words cloexec

use super::{SignalChannel, SignalChannelKind, SignalReader, SignalWriter};
use crate::TriggerError;

/// Factory for the self-pipe flavor of [`SignalChannel`].
///
/// [`mio::unix::pipe::new()`] hands back both ends already non-blocking and
/// close-on-exec. Both ends are created together and, since they only live inside the
/// returned [`SignalChannel`], they are released together.
#[derive(Debug, Clone, Copy)]
pub struct PipeSignalChannel;

impl PipeSignalChannel {
    /// # Errors
    ///
    /// Returns [`TriggerError::ResourceExhausted`] if the OS cannot allocate the pipe
    /// (typically the per-process file descriptor limit).
    pub fn create() -> Result<SignalChannel, TriggerError> {
        let (sender, receiver) =
            mio::unix::pipe::new().map_err(|source| TriggerError::ResourceExhausted {
                kind: SignalChannelKind::Pipe,
                source,
            })?;

        Ok(SignalChannel {
            reader: SignalReader::Pipe(receiver),
            writer: SignalWriter::Pipe(sender),
        })
    }
}
