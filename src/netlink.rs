//! Netlink `INET_DIAG` implementation
//!
//! Native Linux netlink communication for listing TCP sockets. One dump
//! request goes out, the kernel streams back `inet_diag_msg` records until
//! `NLMSG_DONE`.
//!
//! # Layout
//!
//! - `structures`: sizes, byte offsets and constants of the kernel structs
//! - `message`: request encoding, envelope and attribute scanning
//! - `socket`: the [`DiagTransport`] seam and the real `AF_NETLINK` socket
//! - `inet_diag`: record decoding and the dump driver
//! - `tcp_info`: interpretation of the `INET_DIAG_INFO` attribute
//!
//! Everything except the socket itself is plain byte handling and compiles
//! on any target, so the protocol code can be tested off Linux.

// ============================================================================
// SUBMODULE DECLARATIONS
// ============================================================================

pub mod inet_diag; // Record decoding and dump driver
pub mod message; // Request construction, envelope/attribute parsing
pub mod socket; // Transport trait; NetlinkSocket needs Linux and the netlink feature
pub mod structures; // Kernel structure layout
pub mod tcp_info; // tcp_info parsing

// ============================================================================
// PUBLIC RE-EXPORTS
// ============================================================================

pub use inet_diag::{AttributeBlock, ConnectionRecord, DumpDriver, DumpResult, DumpState};
pub use message::{DiagRequest, DumpFilter, build_inet_diag_request};
#[cfg(all(target_os = "linux", feature = "netlink"))]
pub use socket::NetlinkSocket;
pub use socket::DiagTransport;
pub use tcp_info::{TcpInfo, TcpInfoBasic, TcpInfoExtended};
