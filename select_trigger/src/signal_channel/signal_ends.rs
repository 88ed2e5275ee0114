// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words EINTR wakeup

use super::{DrainReadError, SignalChannelKind};
use mio::{Interest, Registry, Token, event::Source};
use std::io::{self, ErrorKind, Read, Write};

/// The byte written for every pull. Its value is insignificant, only its arrival is.
pub const WAKEUP_BYTE: u8 = b'x';

/// Read end of a [`SignalChannel`]. Owned by the loop thread and registered with the
/// loop's [`Registry`] as a normal readable [`Source`].
///
/// Always non-blocking, as [`mio`] requires of registered sources.
///
/// [`SignalChannel`]: super::SignalChannel
#[derive(Debug)]
pub enum SignalReader {
    #[cfg(unix)]
    Pipe(mio::unix::pipe::Receiver),
    Loopback(mio::net::TcpStream),
}

/// Write end of a [`SignalChannel`]. Shared by every producer thread, never read.
///
/// [`SignalChannel`]: super::SignalChannel
#[derive(Debug)]
pub enum SignalWriter {
    /// Non-blocking pipe sender.
    #[cfg(unix)]
    Pipe(mio::unix::pipe::Sender),
    /// Blocking, no-delay TCP socket.
    Loopback(std::net::TcpStream),
}

/// What a single [`SignalReader::drain()`] call found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrainOutcome {
    pub bytes_drained: usize,
    /// The write end is gone (read returned `0`).
    pub peer_closed: bool,
}

impl SignalReader {
    #[must_use]
    pub fn kind(&self) -> SignalChannelKind {
        match self {
            #[cfg(unix)]
            Self::Pipe(_) => SignalChannelKind::Pipe,
            Self::Loopback(_) => SignalChannelKind::Loopback,
        }
    }

    /// Reads and discards everything currently available, until the channel would
    /// block. [`mio`] readiness is edge triggered, so stopping early would lose the
    /// wakeup for bytes left behind.
    ///
    /// `buf` is scratch space and must not be empty.
    ///
    /// # Errors
    ///
    /// Returns [`DrainReadError`] for any read error other than [`WouldBlock`] (done) or
    /// [`Interrupted`] (retried).
    ///
    /// [`Interrupted`]: ErrorKind::Interrupted
    /// [`WouldBlock`]: ErrorKind::WouldBlock
    pub fn drain(&mut self, buf: &mut [u8]) -> Result<DrainOutcome, DrainReadError> {
        debug_assert!(!buf.is_empty());
        let kind = self.kind();
        match self {
            #[cfg(unix)]
            Self::Pipe(receiver) => drain_until_would_block(receiver, buf, kind),
            Self::Loopback(stream) => drain_until_would_block(stream, buf, kind),
        }
    }
}

fn drain_until_would_block(
    reader: &mut impl Read,
    buf: &mut [u8],
    kind: SignalChannelKind,
) -> Result<DrainOutcome, DrainReadError> {
    let mut outcome = DrainOutcome::default();
    loop {
        match reader.read(buf) {
            Ok(0) => {
                outcome.peer_closed = true;
                return Ok(outcome);
            }
            Ok(n) => outcome.bytes_drained += n,
            Err(ref e) if e.kind() == ErrorKind::WouldBlock => return Ok(outcome),
            // EINTR - retry.
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
            Err(source) => {
                return Err(DrainReadError {
                    kind,
                    bytes_drained: outcome.bytes_drained,
                    source,
                });
            }
        }
    }
}

impl Source for SignalReader {
    fn register(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> io::Result<()> {
        match self {
            #[cfg(unix)]
            Self::Pipe(receiver) => receiver.register(registry, token, interests),
            Self::Loopback(stream) => stream.register(registry, token, interests),
        }
    }

    fn reregister(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> io::Result<()> {
        match self {
            #[cfg(unix)]
            Self::Pipe(receiver) => receiver.reregister(registry, token, interests),
            Self::Loopback(stream) => stream.reregister(registry, token, interests),
        }
    }

    fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        match self {
            #[cfg(unix)]
            Self::Pipe(receiver) => receiver.deregister(registry),
            Self::Loopback(stream) => stream.deregister(registry),
        }
    }
}

impl SignalWriter {
    #[must_use]
    pub fn kind(&self) -> SignalChannelKind {
        match self {
            #[cfg(unix)]
            Self::Pipe(_) => SignalChannelKind::Pipe,
            Self::Loopback(_) => SignalChannelKind::Loopback,
        }
    }

    /// Writes one [`WAKEUP_BYTE`]. Takes `&self` so any number of producers can share
    /// one writer.
    ///
    /// A full channel ([`WouldBlock`]) counts as success: it is full of unread wakeups,
    /// so the loop is going to wake regardless.
    ///
    /// # Errors
    ///
    /// Returns the underlying I/O error for anything else (e.g. the read end is gone).
    ///
    /// [`WouldBlock`]: ErrorKind::WouldBlock
    pub fn write_byte(&self) -> io::Result<()> {
        loop {
            let result = match self {
                #[cfg(unix)]
                Self::Pipe(sender) => write_wakeup_byte(sender),
                Self::Loopback(stream) => write_wakeup_byte(stream),
            };
            match result {
                Ok(_) => return Ok(()),
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => return Ok(()),
                // EINTR - retry.
                Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
    }
}

fn write_wakeup_byte(mut writer: impl Write) -> io::Result<usize> { writer.write(&[WAKEUP_BYTE]) }
