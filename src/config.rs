//! Dump configuration.
//!
//! Defaults match a plain `ESTABLISHED`-only census. Each field can be
//! overridden through a `TCPCENSUS_*` environment variable; command-line
//! flags are applied on top by the binary.

use std::env;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::netlink::inet_diag::DEFAULT_RECV_BUFFER;
use crate::netlink::message::DumpFilter;
use crate::netlink::structures::{NLMSG_HDRLEN, TCP_ESTABLISHED, state_bit};

pub const ENV_RECV_BUFFER: &str = "TCPCENSUS_RECV_BUFFER";
pub const ENV_SOCKET_RCVBUF: &str = "TCPCENSUS_SOCKET_RCVBUF";
pub const ENV_SEQUENCE: &str = "TCPCENSUS_SEQUENCE";
pub const ENV_STATES: &str = "TCPCENSUS_STATES";
pub const ENV_EXTENSIONS: &str = "TCPCENSUS_EXTENSIONS";

/// Kernel-side receive buffer requested by default
pub const DEFAULT_SOCKET_RCVBUF: u32 = 32768;

/// Settings for one dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpConfig {
    /// Size of the user-space buffer each datagram is received into.
    pub recv_buffer_size: usize,
    /// `SO_RCVBUF` to request, or `None` to keep the system default.
    pub socket_rcvbuf: Option<u32>,
    /// Sequence number stamped on the request.
    pub sequence: u32,
    /// `idiag_states` bitmask.
    pub states: u32,
    /// `idiag_ext` bitmask.
    pub extensions: u8,
}

impl Default for DumpConfig {
    fn default() -> Self {
        Self {
            recv_buffer_size: DEFAULT_RECV_BUFFER,
            socket_rcvbuf: Some(DEFAULT_SOCKET_RCVBUF),
            sequence: 1,
            states: state_bit(TCP_ESTABLISHED),
            extensions: 0,
        }
    }
}

impl DumpConfig {
    /// Defaults overridden by whatever `TCPCENSUS_*` variables are set.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable does not parse or the result
    /// fails [`DumpConfig::validate`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| env::var(var).ok())
    }

    /// Same as [`DumpConfig::from_env`] with an explicit variable source.
    ///
    /// # Errors
    ///
    /// See [`DumpConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let mut config = Self::default();
        if let Some(v) = parse_var(&lookup, ENV_RECV_BUFFER)? {
            config.recv_buffer_size = v;
        }
        if let Some(v) = parse_var::<u32, _>(&lookup, ENV_SOCKET_RCVBUF)? {
            config.socket_rcvbuf = (v != 0).then_some(v);
        }
        if let Some(v) = parse_var(&lookup, ENV_SEQUENCE)? {
            config.sequence = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_STATES)? {
            config.states = v;
        }
        if let Some(v) = parse_var(&lookup, ENV_EXTENSIONS)? {
            config.extensions = v;
        }
        config.validate()?;
        Ok(config)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::BufferTooSmall` if the receive buffer cannot
    /// hold a netlink header.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.recv_buffer_size < NLMSG_HDRLEN {
            return Err(ConfigError::BufferTooSmall {
                size: self.recv_buffer_size,
                min: NLMSG_HDRLEN,
            });
        }
        Ok(())
    }

    /// IPv4 TCP filter carrying the configured states and extensions.
    #[must_use]
    pub const fn filter(&self) -> DumpFilter {
        DumpFilter::tcp_established()
            .states(self.states)
            .extensions(self.extensions)
    }
}

/// Parse a variable as decimal or `0x`-prefixed hex.
fn parse_var<T, F>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    T: FromStr + TryFrom<u64>,
    <T as FromStr>::Err: std::fmt::Display,
    F: Fn(&'static str) -> Option<String>,
{
    let Some(raw) = lookup(var) else {
        return Ok(None);
    };
    let value = raw.trim();
    let invalid = |reason: String| ConfigError::InvalidEnv {
        var,
        value: raw.clone(),
        reason,
    };

    if let Some(hex) = value.strip_prefix("0x").or_else(|| value.strip_prefix("0X")) {
        let wide = u64::from_str_radix(hex, 16).map_err(|e| invalid(e.to_string()))?;
        return T::try_from(wide)
            .map(Some)
            .map_err(|_| invalid("out of range".to_string()));
    }
    value.parse().map(Some).map_err(|e: <T as FromStr>::Err| invalid(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, (*v).to_string())).collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = DumpConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, DumpConfig::default());
        assert_eq!(config.states, 1 << 1);
        assert_eq!(config.recv_buffer_size, 32768);
        assert_eq!(config.filter(), DumpFilter::tcp_established());
    }

    #[test]
    fn test_overrides() {
        let config = DumpConfig::from_lookup(lookup_from(&[
            (ENV_RECV_BUFFER, "8192"),
            (ENV_SOCKET_RCVBUF, "0"),
            (ENV_SEQUENCE, "77"),
            (ENV_STATES, "0xFFFFFFFF"),
            (ENV_EXTENSIONS, "2"),
        ]))
        .unwrap();

        assert_eq!(config.recv_buffer_size, 8192);
        assert_eq!(config.socket_rcvbuf, None);
        assert_eq!(config.sequence, 77);
        assert_eq!(config.states, u32::MAX);
        assert_eq!(config.filter().extensions, 2);
    }

    #[test]
    fn test_invalid_value() {
        let err = DumpConfig::from_lookup(lookup_from(&[(ENV_SEQUENCE, "abc")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_SEQUENCE, .. }));

        let err = DumpConfig::from_lookup(lookup_from(&[(ENV_EXTENSIONS, "0x100")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidEnv { var: ENV_EXTENSIONS, .. }));
    }

    #[test]
    fn test_buffer_too_small() {
        let err = DumpConfig::from_lookup(lookup_from(&[(ENV_RECV_BUFFER, "8")])).unwrap_err();
        assert_eq!(err, ConfigError::BufferTooSmall { size: 8, min: 16 });
    }

    #[test]
    fn test_json_round_trip_with_missing_fields() {
        let config: DumpConfig = serde_json::from_str(r#"{"sequence": 9}"#).unwrap();
        assert_eq!(config.sequence, 9);
        assert_eq!(config.recv_buffer_size, DEFAULT_RECV_BUFFER);
    }
}
