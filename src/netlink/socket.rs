//! Netlink socket management
//!
//! [`DiagTransport`] is the seam between the dump driver and the kernel: one
//! request out, datagrams in. [`NetlinkSocket`] implements it over a real
//! `AF_NETLINK` socket and closes the descriptor on drop.
//!
//! The socket sees the network namespace the thread was in when it was
//! created, so switch namespaces first (see [`crate::netns`]).
//!
//! ```no_run
//! use tcpcensus::netlink::socket::NetlinkSocket;
//!
//! {
//!     let socket = NetlinkSocket::new()?;  // Socket opened here
//!     // ... dump ...
//! }  // Socket closed here
//! # Ok::<(), tcpcensus::error::SocketError>(())
//! ```

use crate::error::SocketError;

/// Send/receive primitives the dump driver needs
///
/// Implementations must preserve datagram boundaries: one `receive` call
/// returns exactly one datagram.
pub trait DiagTransport {
    /// Send one request made of `segments`, back to back, in one operation
    ///
    /// # Errors
    ///
    /// Any failure or short write is fatal; implementations do not retry.
    fn send(&mut self, segments: &[&[u8]]) -> Result<(), SocketError>;

    /// Block for the next datagram and copy it into `buffer`
    ///
    /// Returns the datagram length.
    ///
    /// # Errors
    ///
    /// Returns `SocketError::Truncated` if the datagram is longer than
    /// `buffer` rather than handing back a cut-off prefix.
    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, SocketError>;
}

impl<T: DiagTransport + ?Sized> DiagTransport for &mut T {
    fn send(&mut self, segments: &[&[u8]]) -> Result<(), SocketError> {
        (**self).send(segments)
    }

    fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, SocketError> {
        (**self).receive(buffer)
    }
}

#[cfg(all(target_os = "linux", feature = "netlink"))]
pub use linux::NetlinkSocket;

#[cfg(all(target_os = "linux", feature = "netlink"))]
mod linux {
    use std::os::fd::{AsFd, AsRawFd, BorrowedFd, FromRawFd, OwnedFd};

    use tracing::{debug, trace};

    use super::DiagTransport;
    use crate::error::SocketError;

    /// `NETLINK_INET_DIAG` and `NETLINK_SOCK_DIAG` are the same protocol
    const NETLINK_INET_DIAG: libc::c_int = libc::NETLINK_SOCK_DIAG;

    /// Netlink socket wrapper with automatic cleanup
    ///
    /// The descriptor lives in an `OwnedFd`, so it is closed exactly once,
    /// on every exit path.
    #[derive(Debug)]
    pub struct NetlinkSocket {
        fd: OwnedFd,
    }

    impl NetlinkSocket {
        /// Create a datagram `AF_NETLINK` socket for `INET_DIAG`
        ///
        /// # Errors
        ///
        /// Returns `SocketError` if `socket()` or `bind()` fails.
        pub fn new() -> Result<Self, SocketError> {
            // SAFETY: socket() takes no pointers; the result is checked below.
            let raw = unsafe {
                libc::socket(
                    libc::AF_NETLINK,
                    libc::SOCK_DGRAM | libc::SOCK_CLOEXEC,
                    NETLINK_INET_DIAG,
                )
            };
            if raw < 0 {
                return Err(SocketError::last_os_error("socket()"));
            }
            // SAFETY: raw is a freshly created descriptor owned by nobody else.
            let fd = unsafe { OwnedFd::from_raw_fd(raw) };

            // Bind with nl_pid = 0 so the kernel assigns our port id
            let addr = kernel_addr();
            // SAFETY: addr is a valid sockaddr_nl and the length matches it.
            let ret = unsafe {
                libc::bind(
                    fd.as_raw_fd(),
                    std::ptr::from_ref(&addr).cast::<libc::sockaddr>(),
                    sockaddr_nl_len(),
                )
            };
            if ret < 0 {
                return Err(SocketError::last_os_error("bind()"));
            }

            debug!(fd = fd.as_raw_fd(), "opened NETLINK_INET_DIAG socket");
            Ok(Self { fd })
        }

        /// Create the socket and set `SO_RCVBUF`
        ///
        /// A bigger kernel-side buffer keeps large dumps from overrunning.
        ///
        /// # Errors
        ///
        /// Returns `SocketError` if creation or `setsockopt()` fails.
        pub fn with_receive_buffer(rcvbuf: u32) -> Result<Self, SocketError> {
            let socket = Self::new()?;
            let size = libc::c_int::try_from(rcvbuf).unwrap_or(libc::c_int::MAX);
            // SAFETY: size is a live c_int and the length matches it.
            let ret = unsafe {
                libc::setsockopt(
                    socket.fd.as_raw_fd(),
                    libc::SOL_SOCKET,
                    libc::SO_RCVBUF,
                    std::ptr::from_ref(&size).cast::<libc::c_void>(),
                    size_of::<libc::c_int>() as libc::socklen_t,
                )
            };
            if ret < 0 {
                return Err(SocketError::last_os_error("setsockopt(SO_RCVBUF)"));
            }
            Ok(socket)
        }
    }

    impl AsFd for NetlinkSocket {
        fn as_fd(&self) -> BorrowedFd<'_> {
            self.fd.as_fd()
        }
    }

    impl DiagTransport for NetlinkSocket {
        fn send(&mut self, segments: &[&[u8]]) -> Result<(), SocketError> {
            let mut addr = kernel_addr();
            let mut iov: Vec<libc::iovec> = segments
                .iter()
                .map(|seg| libc::iovec {
                    iov_base: seg.as_ptr().cast_mut().cast::<libc::c_void>(),
                    iov_len: seg.len(),
                })
                .collect();
            let expected: usize = segments.iter().map(|seg| seg.len()).sum();

            // SAFETY: msghdr is plain data; all-zero is a valid empty value.
            let mut msg: libc::msghdr = unsafe { std::mem::zeroed() };
            msg.msg_name = std::ptr::from_mut(&mut addr).cast::<libc::c_void>();
            msg.msg_namelen = sockaddr_nl_len();
            msg.msg_iov = iov.as_mut_ptr();
            msg.msg_iovlen = iov.len() as _;

            // SAFETY: msg points at addr and iov, both alive for this call; each
            // iovec describes a borrowed slice the kernel only reads.
            let ret = unsafe { libc::sendmsg(self.fd.as_raw_fd(), &msg, 0) };
            if ret < 0 {
                return Err(SocketError::last_os_error("sendmsg()"));
            }

            let sent = ret.unsigned_abs();
            if sent != expected {
                return Err(SocketError::ShortSend { sent, expected });
            }
            trace!(bytes = sent, "request sent");
            Ok(())
        }

        fn receive(&mut self, buffer: &mut [u8]) -> Result<usize, SocketError> {
            // MSG_TRUNC makes recv() report the real datagram length even
            // when it did not fit.
            // SAFETY: buffer is valid for buffer.len() writable bytes.
            let ret = unsafe {
                libc::recv(
                    self.fd.as_raw_fd(),
                    buffer.as_mut_ptr().cast::<libc::c_void>(),
                    buffer.len(),
                    libc::MSG_TRUNC,
                )
            };
            if ret < 0 {
                return Err(SocketError::last_os_error("recv()"));
            }

            let len = ret.unsigned_abs();
            if len == 0 {
                return Err(SocketError::EmptyDatagram);
            }
            if len > buffer.len() {
                return Err(SocketError::Truncated {
                    len,
                    capacity: buffer.len(),
                });
            }
            trace!(bytes = len, "datagram received");
            Ok(len)
        }
    }

    /// Address of the kernel (nl_pid 0, no multicast groups)
    fn kernel_addr() -> libc::sockaddr_nl {
        // SAFETY: sockaddr_nl is plain data; all-zero is valid.
        let mut addr: libc::sockaddr_nl = unsafe { std::mem::zeroed() };
        addr.nl_family = libc::AF_NETLINK as libc::sa_family_t;
        addr.nl_pid = 0;
        addr.nl_groups = 0;
        addr
    }

    const fn sockaddr_nl_len() -> libc::socklen_t {
        size_of::<libc::sockaddr_nl>() as libc::socklen_t
    }
}

// ============================================================================
// TESTS
// ============================================================================
