// ============================================================================
// TCP CENSUS LIBRARY
// ============================================================================
// Lists the TCP sockets of a network namespace by asking the kernel directly
// over netlink INET_DIAG, the same interface `ss` uses.
//
// === FLOW ===
// 1. Optionally switch the thread into a network namespace (netns)
// 2. Open a NETLINK_INET_DIAG socket (netlink::socket)
// 3. Send one SOCK_DIAG_BY_FAMILY dump request (netlink::message)
// 4. Decode inet_diag_msg records until NLMSG_DONE (netlink::inet_diag)
//
// Only IPv4 records are decoded; everything else is counted and skipped.

// === MODULE DECLARATIONS ===
pub mod config;
pub mod error;
pub mod netlink;
#[cfg(target_os = "linux")]
pub mod netns;

pub use config::DumpConfig;
pub use error::{ConfigError, DumpError, MessageError, NamespaceError, SocketError, TcpInfoError};
pub use netlink::{ConnectionRecord, DumpDriver, DumpFilter, DumpResult};

// === NETLINK ENTRY POINT (Linux + netlink feature) ===
#[cfg(all(target_os = "linux", feature = "netlink"))]
use std::path::Path;

#[cfg(all(target_os = "linux", feature = "netlink"))]
use netlink::NetlinkSocket;

/// Failure of [`census`]: either the namespace switch or the dump itself
#[cfg(all(target_os = "linux", feature = "netlink"))]
#[derive(Debug, thiserror::Error)]
pub enum CensusError {
    /// The namespace link could not be opened or entered.
    #[error(transparent)]
    Namespace(#[from] NamespaceError),

    /// The netlink socket could not be created or configured.
    #[error(transparent)]
    Socket(#[from] SocketError),

    /// The dump itself failed.
    #[error(transparent)]
    Dump(#[from] DumpError),
}

/// Dump the TCP sockets matching `config` in the current namespace, or in
/// the namespace behind `netns` if one is given
///
/// The namespace switch applies to the calling thread and is not undone.
///
/// # Errors
///
/// Returns `CensusError` if the namespace cannot be entered, the socket
/// cannot be opened, or the dump fails.
#[cfg(all(target_os = "linux", feature = "netlink"))]
pub fn census(netns: Option<&Path>, config: &DumpConfig) -> Result<DumpResult, CensusError> {
    if let Some(path) = netns {
        netns::enter_network_namespace(path)?;
    }

    let socket = match config.socket_rcvbuf {
        Some(size) => NetlinkSocket::with_receive_buffer(size)?,
        None => NetlinkSocket::new()?,
    };

    let mut driver = DumpDriver::from_config(socket, config);
    Ok(driver.run(&config.filter())?)
}
