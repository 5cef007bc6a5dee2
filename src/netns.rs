//! Network namespace switching.
//!
//! A netlink socket reports the sockets of the namespace it was created in,
//! so the switch has to happen before [`crate::netlink::socket::NetlinkSocket`]
//! is opened.

use std::fs::File;
use std::path::Path;

use nix::sched::{CloneFlags, setns};

use crate::error::NamespaceError;

/// Move the calling thread into the network namespace behind `path`
///
/// `path` is a namespace link such as `/proc/<pid>/ns/net` or
/// `/var/run/netns/<name>`. The link is closed before returning; the thread
/// stays in the namespace.
///
/// # Errors
///
/// Returns `NamespaceError::Open` if the link cannot be opened and
/// `NamespaceError::Setns` if the kernel refuses the switch (not a
/// namespace, or missing `CAP_SYS_ADMIN`).
pub fn enter_network_namespace(path: &Path) -> Result<(), NamespaceError> {
    let link = File::open(path).map_err(|source| NamespaceError::Open {
        path: path.to_path_buf(),
        source,
    })?;

    setns(&link, CloneFlags::CLONE_NEWNET).map_err(|source| NamespaceError::Setns {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "entered network namespace");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_link() {
        let err = enter_network_namespace(Path::new("/nonexistent/ns/net")).unwrap_err();
        assert!(matches!(err, NamespaceError::Open { .. }));
    }

    #[test]
    fn test_regular_file_is_not_a_namespace() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let err = enter_network_namespace(file.path()).unwrap_err();
        assert!(matches!(err, NamespaceError::Setns { .. }), "{err}");
    }
}
