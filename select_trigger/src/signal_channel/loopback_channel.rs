// Copyright (c) 2025 R3BL LLC. Licensed under Apache License, Version 2.0.

// cspell:words nodelay Nagle

use super::{SignalChannel, SignalChannelKind, SignalReader, SignalWriter};
use crate::{DEBUG_TRIGGER_SHOW_WAKEUPS, TriggerError};
use std::{io::{self, ErrorKind},
          net::{Ipv4Addr, SocketAddr, TcpListener},
          sync::atomic::{AtomicUsize, Ordering}};

/// First port tried when binding the loopback listener.
pub const DEFAULT_LOOPBACK_FIRST_PORT: u16 = 19_950;

/// Number of consecutive ports (starting at [`DEFAULT_LOOPBACK_FIRST_PORT`]) tried before
/// giving up with [`TriggerError::BindExhausted`].
pub const DEFAULT_LOOPBACK_PORT_COUNT: u16 = 50;

/// Process-wide rotation through the candidate range. Every candidate tried advances it
/// by one, so consecutive channels start their search at different ports.
static PORT_OFFSET: AtomicUsize = AtomicUsize::new(0);

/// Bounded range of ports the loopback listener may bind to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopbackPortRange {
    pub first_port: u16,
    pub port_count: u16,
}

impl Default for LoopbackPortRange {
    fn default() -> Self {
        Self {
            first_port: DEFAULT_LOOPBACK_FIRST_PORT,
            port_count: DEFAULT_LOOPBACK_PORT_COUNT,
        }
    }
}

impl LoopbackPortRange {
    /// Port at `offset` (wrapped into the range), or [`None`] if the range is empty or
    /// runs past `u16::MAX`.
    #[must_use]
    pub fn candidate_port(&self, offset: usize) -> Option<u16> {
        if self.port_count == 0 {
            return None;
        }
        let wrapped = offset % usize::from(self.port_count);
        u16::try_from(usize::from(self.first_port) + wrapped).ok()
    }
}

/// Factory for the loopback flavor of [`SignalChannel`]: a connected TCP socket pair on
/// `127.0.0.1`, for platforms whose readiness wait only accepts sockets.
///
/// # Handshake
///
/// ```text
/// listener = bind(127.0.0.1:<candidate>)      retry across the range
///      │
/// writer   = connect(listener) non-blocking    "in progress" is fine
///      │     + TCP_NODELAY
/// reader   = listener.accept()                 peer must be `writer`
///      │
/// drop(listener)
/// writer   → blocking mode,  reader → non-blocking (registered with mio)
/// ```
///
/// Nagle buffering is disabled on the writer since a wakeup byte must go out right away
/// rather than wait to be coalesced.
#[derive(Debug, Clone, Copy)]
pub struct LoopbackSignalChannel;

impl LoopbackSignalChannel {
    /// # Errors
    ///
    /// - [`TriggerError::BindExhausted`] if every port in `ports` is taken.
    /// - [`TriggerError::ResourceExhausted`] if a socket cannot be created.
    /// - [`TriggerError::LoopbackHandshake`] if accept or socket mode changes fail.
    pub fn create(ports: LoopbackPortRange) -> Result<SignalChannel, TriggerError> {
        let (listener, listener_addr) = bind_listener(ports)?;

        // mio creates the socket and issues a non-blocking connect in one step; the
        // handshake completes once the listener accepts below.
        let connecting = mio::net::TcpStream::connect(listener_addr).map_err(|source| {
            TriggerError::ResourceExhausted {
                kind: SignalChannelKind::Loopback,
                source,
            }
        })?;
        connecting
            .set_nodelay(true)
            .map_err(TriggerError::LoopbackHandshake)?;
        let writer_addr = connecting
            .local_addr()
            .map_err(TriggerError::LoopbackHandshake)?;

        let accepted = accept_from(&listener, writer_addr)?;
        drop(listener);

        let writer = into_std_stream(connecting);
        writer
            .set_nonblocking(false)
            .map_err(TriggerError::LoopbackHandshake)?;
        accepted
            .set_nonblocking(true)
            .map_err(TriggerError::LoopbackHandshake)?;

        DEBUG_TRIGGER_SHOW_WAKEUPS.then(|| {
            tracing::debug!(
                message = "loopback signal channel connected",
                listener = %listener_addr,
                writer = %writer_addr
            );
        });

        Ok(SignalChannel {
            reader: SignalReader::Loopback(mio::net::TcpStream::from_std(accepted)),
            writer: SignalWriter::Loopback(writer),
        })
    }
}

fn bind_listener(ports: LoopbackPortRange) -> Result<(TcpListener, SocketAddr), TriggerError> {
    let mut last_error: Option<io::Error> = None;

    for _ in 0..ports.port_count {
        let offset = PORT_OFFSET.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        let Some(port) = ports.candidate_port(offset) else {
            continue;
        };
        let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, port));
        match TcpListener::bind(addr) {
            Ok(listener) => return Ok((listener, addr)),
            Err(err) => {
                DEBUG_TRIGGER_SHOW_WAKEUPS.then(|| {
                    tracing::debug!(
                        message = "loopback port unavailable, trying next",
                        port,
                        error = ?err
                    );
                });
                last_error = Some(err);
            }
        }
    }

    Err(TriggerError::BindExhausted {
        first_port: ports.first_port,
        port_count: ports.port_count,
        last_error,
    })
}

/// Accepts until the connection from `expected_peer` shows up. Anything else that
/// raced onto the listener is dropped.
fn accept_from(
    listener: &TcpListener,
    expected_peer: SocketAddr,
) -> Result<std::net::TcpStream, TriggerError> {
    loop {
        match listener.accept() {
            Ok((stream, peer)) if peer == expected_peer => return Ok(stream),
            Ok((_stranger, peer)) => {
                tracing::warn!(
                    message = "dropping unexpected connection to trigger listener",
                    peer = %peer,
                    expected = %expected_peer
                );
            }
            Err(ref e) if e.kind() == ErrorKind::Interrupted => {}
            Err(e) => return Err(TriggerError::LoopbackHandshake(e)),
        }
    }
}

#[cfg(unix)]
fn into_std_stream(stream: mio::net::TcpStream) -> std::net::TcpStream {
    std::net::TcpStream::from(std::os::fd::OwnedFd::from(stream))
}

#[cfg(windows)]
fn into_std_stream(stream: mio::net::TcpStream) -> std::net::TcpStream {
    std::net::TcpStream::from(std::os::windows::io::OwnedSocket::from(stream))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mio::{Events, Interest, Poll, Token};
    use pretty_assertions::assert_eq;
    use serial_test::serial;
    use std::time::Duration;

    #[test]
    fn test_candidate_port_wraps_within_range() {
        let range = LoopbackPortRange {
            first_port: 100,
            port_count: 3,
        };
        assert_eq!(range.candidate_port(0), Some(100));
        assert_eq!(range.candidate_port(2), Some(102));
        assert_eq!(range.candidate_port(3), Some(100));
        assert_eq!(range.candidate_port(7), Some(101));
    }

    #[test]
    fn test_candidate_port_empty_or_overflowing_range() {
        let empty = LoopbackPortRange {
            first_port: 100,
            port_count: 0,
        };
        assert_eq!(empty.candidate_port(0), None);

        let overflowing = LoopbackPortRange {
            first_port: u16::MAX,
            port_count: 2,
        };
        assert_eq!(overflowing.candidate_port(0), Some(u16::MAX));
        assert_eq!(overflowing.candidate_port(1), None);
    }

    #[test]
    fn test_default_range() {
        assert_eq!(
            LoopbackPortRange::default(),
            LoopbackPortRange {
                first_port: 19_950,
                port_count: 50,
            }
        );
    }

    #[test]
    #[serial]
    fn test_create_and_signal() {
        let (mut reader, writer) = LoopbackSignalChannel::create(LoopbackPortRange::default())
            .unwrap()
            .into_split();
        assert_eq!(reader.kind(), SignalChannelKind::Loopback);
        assert_eq!(writer.kind(), SignalChannelKind::Loopback);

        let mut poll = Poll::new().unwrap();
        poll.registry()
            .register(&mut reader, Token(7), Interest::READABLE)
            .unwrap();
        writer.write_byte().unwrap();

        let mut events = Events::with_capacity(4);
        poll.poll(&mut events, Some(Duration::from_secs(5))).unwrap();
        assert!(events.iter().any(|it| it.token() == Token(7) && it.is_readable()));

        let mut buf = [0u8; 64];
        let outcome = reader.drain(&mut buf).unwrap();
        assert_eq!(outcome.bytes_drained, 1);
        assert!(!outcome.peer_closed);
    }

    #[test]
    #[serial]
    fn test_bind_exhausted_when_only_candidate_is_taken() {
        let squatter = TcpListener::bind((Ipv4Addr::LOCALHOST, 0)).unwrap();
        let taken_port = squatter.local_addr().unwrap().port();

        let result = LoopbackSignalChannel::create(LoopbackPortRange {
            first_port: taken_port,
            port_count: 1,
        });

        match result {
            Err(TriggerError::BindExhausted {
                first_port,
                port_count,
                last_error,
            }) => {
                assert_eq!(first_port, taken_port);
                assert_eq!(port_count, 1);
                assert!(last_error.is_some());
            }
            other => panic!("expected BindExhausted, got {other:?}"),
        }
    }

    #[test]
    fn test_bind_exhausted_for_empty_range() {
        let result = LoopbackSignalChannel::create(LoopbackPortRange {
            first_port: DEFAULT_LOOPBACK_FIRST_PORT,
            port_count: 0,
        });
        assert!(matches!(
            result,
            Err(TriggerError::BindExhausted {
                last_error: None,
                ..
            })
        ));
    }
}
