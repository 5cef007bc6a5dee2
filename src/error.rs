//! Error types for every layer of a diagnostics dump.
//!
//! Each layer owns an enum; the dump driver wraps the lower layers in
//! [`DumpError`] so callers can tell transport failures, framing corruption
//! and kernel-reported errors apart.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Failure of the underlying netlink socket.
#[derive(Debug, Error)]
pub enum SocketError {
    /// A syscall returned an error.
    #[error("{context} failed: {source}")]
    Io {
        /// Syscall that failed.
        context: &'static str,
        /// Underlying OS error.
        source: io::Error,
    },

    /// `sendmsg()` accepted fewer bytes than the request holds.
    #[error("short send: sent {sent} of {expected} bytes")]
    ShortSend {
        /// Bytes accepted by the kernel.
        sent: usize,
        /// Bytes in the request.
        expected: usize,
    },

    /// The datagram did not fit in the receive buffer.
    #[error("datagram of {len} bytes truncated by {capacity}-byte receive buffer")]
    Truncated {
        /// Real length of the datagram.
        len: usize,
        /// Size of the caller's buffer.
        capacity: usize,
    },

    /// `recv()` returned zero bytes.
    #[error("recv() returned an empty datagram")]
    EmptyDatagram,
}

impl SocketError {
    pub(crate) fn last_os_error(context: &'static str) -> Self {
        Self::Io {
            context,
            source: io::Error::last_os_error(),
        }
    }

    /// The `io::ErrorKind` closest to this failure.
    #[must_use]
    pub fn kind(&self) -> io::ErrorKind {
        match self {
            Self::Io { source, .. } => source.kind(),
            Self::ShortSend { .. } => io::ErrorKind::WriteZero,
            Self::Truncated { .. } => io::ErrorKind::InvalidData,
            Self::EmptyDatagram => io::ErrorKind::UnexpectedEof,
        }
    }
}

/// Inconsistent length field or undecodable record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MessageError {
    /// Envelope declares a length smaller than its own header.
    #[error("invalid message length {len} at offset {offset} (minimum is {min})")]
    LengthTooSmall {
        /// Declared length.
        len: usize,
        /// Offset of the envelope in the datagram.
        offset: usize,
        /// Header size.
        min: usize,
    },

    /// Envelope declares more bytes than remain in the datagram.
    #[error("message length {len} exceeds buffer (offset={offset}, buffer={buffer})")]
    LengthExceedsBuffer {
        /// Declared length.
        len: usize,
        /// Offset of the envelope in the datagram.
        offset: usize,
        /// Valid bytes in the datagram.
        buffer: usize,
    },

    /// Payload is shorter than the fixed structure it must hold.
    #[error("{what} payload too small: {len} bytes (need {need})")]
    PayloadTooSmall {
        /// Structure being decoded.
        what: &'static str,
        /// Bytes available.
        len: usize,
        /// Bytes required.
        need: usize,
    },

    /// Attribute declares a length smaller than its own header.
    #[error("invalid attribute length {len} at offset {offset}")]
    AttributeTooSmall {
        /// Declared length.
        len: usize,
        /// Offset of the attribute in the record tail.
        offset: usize,
    },

    /// Attribute declares more bytes than remain in the record.
    #[error("attribute length {len} exceeds record (offset={offset}, remaining={remaining})")]
    AttributeExceedsRecord {
        /// Declared length.
        len: usize,
        /// Offset of the attribute in the record tail.
        offset: usize,
        /// Bytes left in the record tail.
        remaining: usize,
    },

    /// Record is for an address family this crate does not decode.
    #[error("unsupported address family {family}")]
    UnsupportedFamily {
        /// `idiag_family` of the record.
        family: u8,
    },
}

/// Failure of a whole dump.
#[derive(Debug, Error)]
pub enum DumpError {
    /// Sending or receiving failed.
    #[error("transport error: {0}")]
    Transport(#[from] SocketError),

    /// A datagram was malformed.
    #[error("framing error: {0}")]
    Framing(#[from] MessageError),

    /// The kernel answered with an error envelope.
    #[error("kernel reported error {errno}: {}", describe_errno(.errno))]
    Protocol {
        /// Negative errno as sent by the kernel.
        errno: i32,
    },
}

impl DumpError {
    /// Raw kernel error code, if the kernel reported one.
    #[must_use]
    pub const fn errno(&self) -> Option<i32> {
        match self {
            Self::Protocol { errno } => Some(*errno),
            _ => None,
        }
    }

    /// Whether the kernel refused the dump for lack of privilege.
    #[must_use]
    pub fn is_permission_denied(&self) -> bool {
        match self {
            Self::Protocol { errno } => *errno == -libc::EACCES || *errno == -libc::EPERM,
            Self::Transport(e) => e.kind() == io::ErrorKind::PermissionDenied,
            Self::Framing(_) => false,
        }
    }
}

fn describe_errno(errno: &i32) -> io::Error {
    io::Error::from_raw_os_error(errno.wrapping_neg())
}

/// `tcp_info` attribute could not be interpreted.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TcpInfoError {
    /// Value shorter than the fields present on every kernel.
    #[error("tcp_info buffer too small: {len} bytes (minimum {min} for basic fields)")]
    TooSmall {
        /// Bytes available.
        len: usize,
        /// Bytes required.
        min: usize,
    },
}

/// Invalid configuration value.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// An environment variable could not be parsed.
    #[error("invalid value {value:?} for {var}: {reason}")]
    InvalidEnv {
        /// Variable name.
        var: &'static str,
        /// Raw value.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Receive buffer cannot hold a single envelope header.
    #[error("receive buffer of {size} bytes is smaller than a netlink header ({min} bytes)")]
    BufferTooSmall {
        /// Configured size.
        size: usize,
        /// Minimum usable size.
        min: usize,
    },
}

/// Could not switch into a network namespace.
#[derive(Debug, Error)]
pub enum NamespaceError {
    /// The namespace link could not be opened.
    #[error("failed to open netns link {path}: {source}")]
    Open {
        /// Path of the namespace link.
        path: PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// `setns(CLONE_NEWNET)` was refused.
    #[error("failed to switch to netns {path}: {source}")]
    Setns {
        /// Path of the namespace link.
        path: PathBuf,
        /// Errno returned by the kernel.
        source: nix::errno::Errno,
    },
}
