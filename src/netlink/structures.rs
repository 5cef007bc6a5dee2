//! Wire layout for the Netlink `INET_DIAG` protocol
//!
//! Layouts are described as byte offsets rather than `repr(C)` overlays:
//! every field is read and written explicitly with a stated byte order.
//! Netlink headers and kernel counters are in host byte order, IP addresses
//! and ports are in network byte order (big-endian).

// NETLINK MESSAGE HEADER

/// Size of `struct nlmsghdr` on the wire
pub const NLMSG_HDRLEN: usize = 16;

/// Netlink message header (16 bytes)
///
/// ```text
/// 0      4        6         8       12      16
/// ┌──────┬────────┬─────────┬───────┬───────┐
/// │ len  │ type   │ flags   │ seq   │ pid   │
/// └──────┴────────┴─────────┴───────┴───────┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NlMsgHdr {
    pub nlmsg_len: u32,
    pub nlmsg_type: u16,
    pub nlmsg_flags: u16,
    pub nlmsg_seq: u32,
    pub nlmsg_pid: u32,
}

impl NlMsgHdr {
    /// Serialize header in host byte order
    #[must_use]
    pub fn to_bytes(&self) -> [u8; NLMSG_HDRLEN] {
        let mut out = [0u8; NLMSG_HDRLEN];
        out[0..4].copy_from_slice(&self.nlmsg_len.to_ne_bytes());
        out[4..6].copy_from_slice(&self.nlmsg_type.to_ne_bytes());
        out[6..8].copy_from_slice(&self.nlmsg_flags.to_ne_bytes());
        out[8..12].copy_from_slice(&self.nlmsg_seq.to_ne_bytes());
        out[12..16].copy_from_slice(&self.nlmsg_pid.to_ne_bytes());
        out
    }

    /// Read a header from the start of `data`
    ///
    /// Returns `None` when fewer than [`NLMSG_HDRLEN`] bytes are available.
    #[must_use]
    pub fn from_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < NLMSG_HDRLEN {
            return None;
        }
        Some(Self {
            nlmsg_len: read_u32_ne(data, 0),
            nlmsg_type: read_u16_ne(data, 4),
            nlmsg_flags: read_u16_ne(data, 6),
            nlmsg_seq: read_u32_ne(data, 8),
            nlmsg_pid: read_u32_ne(data, 12),
        })
    }
}

// SOCKET IDENTIFICATION

/// Size of `struct inet_diag_sockid`
pub const INET_DIAG_SOCKID_LEN: usize = 48;

/// Offsets inside `struct inet_diag_sockid`
pub mod sockid {
    pub const SPORT: usize = 0; // __be16
    pub const DPORT: usize = 2; // __be16
    pub const SRC: usize = 4; // __be32[4]
    pub const DST: usize = 20; // __be32[4]
    pub const IF: usize = 36; // u32
    pub const COOKIE: usize = 40; // u32[2]
}

// INET_DIAG REQUEST

/// Size of `struct inet_diag_req_v2`
pub const INET_DIAG_REQ_V2_LEN: usize = 56;

/// Offsets inside `struct inet_diag_req_v2`
pub mod req {
    pub const FAMILY: usize = 0;
    pub const PROTOCOL: usize = 1;
    pub const EXT: usize = 2;
    pub const PAD: usize = 3;
    pub const STATES: usize = 4;
    pub const ID: usize = 8;
}

// INET_DIAG RESPONSE

/// Size of `struct inet_diag_msg`
pub const INET_DIAG_MSG_LEN: usize = 72;

/// Offsets inside `struct inet_diag_msg`
pub mod msg {
    pub const FAMILY: usize = 0;
    pub const STATE: usize = 1;
    pub const TIMER: usize = 2;
    pub const RETRANS: usize = 3;
    pub const ID: usize = 4;
    pub const EXPIRES: usize = 52;
    pub const RQUEUE: usize = 56;
    pub const WQUEUE: usize = 60;
    pub const UID: usize = 64;
    pub const INODE: usize = 68;
}

// ROUTING ATTRIBUTE HEADER

/// Size of `struct rtattr` (rta_len: u16, rta_type: u16)
pub const RTA_HDRLEN: usize = 4;

// CONSTANTS

// Netlink message types
pub const NLMSG_NOOP: u16 = 1;
pub const NLMSG_ERROR: u16 = 2;
pub const NLMSG_DONE: u16 = 3;
pub const NLMSG_OVERRUN: u16 = 4;
pub const SOCK_DIAG_BY_FAMILY: u16 = 20;

// Netlink flags
pub const NLM_F_REQUEST: u16 = 1;
pub const NLM_F_MULTI: u16 = 2;
pub const NLM_F_ACK: u16 = 4;
pub const NLM_F_ECHO: u16 = 8;
pub const NLM_F_DUMP_INTR: u16 = 16;
pub const NLM_F_DUMP_FILTERED: u16 = 32;

// Request flags
pub const NLM_F_ROOT: u16 = 0x100;
pub const NLM_F_MATCH: u16 = 0x200;
pub const NLM_F_DUMP: u16 = NLM_F_ROOT | NLM_F_MATCH;

// Address families
pub const AF_INET: u8 = 2;
pub const AF_INET6: u8 = 10;

// Protocol numbers
pub const IPPROTO_TCP: u8 = 6;

// TCP states
pub const TCP_ESTABLISHED: u8 = 1;
pub const TCP_SYN_SENT: u8 = 2;
pub const TCP_SYN_RECV: u8 = 3;
pub const TCP_FIN_WAIT1: u8 = 4;
pub const TCP_FIN_WAIT2: u8 = 5;
pub const TCP_TIME_WAIT: u8 = 6;
pub const TCP_CLOSE: u8 = 7;
pub const TCP_CLOSE_WAIT: u8 = 8;
pub const TCP_LAST_ACK: u8 = 9;
pub const TCP_LISTEN: u8 = 10;
pub const TCP_CLOSING: u8 = 11;
pub const TCP_NEW_SYN_RECV: u8 = 12;

/// Bitmask selecting every TCP state
pub const TCPF_ALL: u32 = u32::MAX;

// INET_DIAG attributes
pub const INET_DIAG_NONE: u16 = 0;
pub const INET_DIAG_MEMINFO: u16 = 1;
pub const INET_DIAG_INFO: u16 = 2;
pub const INET_DIAG_VEGASINFO: u16 = 3;
pub const INET_DIAG_CONG: u16 = 4;
pub const INET_DIAG_TOS: u16 = 5;
pub const INET_DIAG_TCLASS: u16 = 6;
pub const INET_DIAG_SKMEMINFO: u16 = 7;
pub const INET_DIAG_SHUTDOWN: u16 = 8;

// HELPER FUNCTIONS

/// Align length to 4-byte boundary
#[must_use]
pub const fn nlmsg_align(len: usize) -> usize {
    (len + 3) & !3
}

/// Calculate Netlink message length
#[must_use]
pub const fn nlmsg_length(payload_len: usize) -> u32 {
    (NLMSG_HDRLEN + payload_len) as u32
}

/// Calculate space needed for Netlink message
#[must_use]
pub const fn nlmsg_space(payload_len: usize) -> usize {
    nlmsg_align(NLMSG_HDRLEN + payload_len)
}

/// Align attribute length to 4-byte boundary
#[must_use]
pub const fn rta_align(len: usize) -> usize {
    (len + 3) & !3
}

/// Bit to set in `idiag_ext` to request attribute `ext`
#[must_use]
pub const fn ext_bit(ext: u16) -> u8 {
    if ext == INET_DIAG_NONE || ext > 8 {
        0
    } else {
        1 << (ext - 1)
    }
}

/// Bit to set in `idiag_states` to select TCP state `state`
#[must_use]
pub const fn state_bit(state: u8) -> u32 {
    if state >= 32 { 0 } else { 1 << state }
}

/// Human-readable name of a kernel TCP state
#[must_use]
pub const fn tcp_state_name(state: u8) -> &'static str {
    match state {
        TCP_ESTABLISHED => "ESTABLISHED",
        TCP_SYN_SENT => "SYN_SENT",
        TCP_SYN_RECV => "SYN_RECV",
        TCP_FIN_WAIT1 => "FIN_WAIT1",
        TCP_FIN_WAIT2 => "FIN_WAIT2",
        TCP_TIME_WAIT => "TIME_WAIT",
        TCP_CLOSE => "CLOSE",
        TCP_CLOSE_WAIT => "CLOSE_WAIT",
        TCP_LAST_ACK => "LAST_ACK",
        TCP_LISTEN => "LISTEN",
        TCP_CLOSING => "CLOSING",
        TCP_NEW_SYN_RECV => "NEW_SYN_RECV",
        _ => "UNKNOWN",
    }
}

// BYTE READERS
//
// Callers validate lengths first; these index directly.

#[inline]
pub(crate) fn read_u16_ne(data: &[u8], at: usize) -> u16 {
    u16::from_ne_bytes([data[at], data[at + 1]])
}

#[inline]
pub(crate) fn read_u16_be(data: &[u8], at: usize) -> u16 {
    u16::from_be_bytes([data[at], data[at + 1]])
}

#[inline]
pub(crate) fn read_u32_ne(data: &[u8], at: usize) -> u32 {
    u32::from_ne_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

#[inline]
pub(crate) fn read_i32_ne(data: &[u8], at: usize) -> i32 {
    i32::from_ne_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

#[inline]
pub(crate) fn read_u64_ne(data: &[u8], at: usize) -> u64 {
    let mut raw = [0u8; 8];
    raw.copy_from_slice(&data[at..at + 8]);
    u64::from_ne_bytes(raw)
}

// TESTS

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_sizes() {
        assert_eq!(NLMSG_HDRLEN, 16);
        assert_eq!(INET_DIAG_SOCKID_LEN, 48);
        assert_eq!(INET_DIAG_REQ_V2_LEN, req::ID + INET_DIAG_SOCKID_LEN);
        assert_eq!(INET_DIAG_MSG_LEN, msg::INODE + 4);
        assert_eq!(msg::EXPIRES, msg::ID + INET_DIAG_SOCKID_LEN);
    }

    #[test]
    fn test_alignment() {
        assert_eq!(nlmsg_align(0), 0);
        assert_eq!(nlmsg_align(1), 4);
        assert_eq!(nlmsg_align(2), 4);
        assert_eq!(nlmsg_align(3), 4);
        assert_eq!(nlmsg_align(4), 4);
        assert_eq!(nlmsg_align(5), 8);
        assert_eq!(nlmsg_align(72), 72);
        assert_eq!(nlmsg_align(73), 76);
        assert_eq!(rta_align(6), 8);
    }

    #[test]
    fn test_message_length() {
        assert_eq!(nlmsg_length(INET_DIAG_REQ_V2_LEN), 72);
        assert_eq!(nlmsg_space(INET_DIAG_REQ_V2_LEN), 72);
    }

    #[test]
    fn test_header_bytes() {
        let hdr = NlMsgHdr {
            nlmsg_len: 72,
            nlmsg_type: SOCK_DIAG_BY_FAMILY,
            nlmsg_flags: NLM_F_REQUEST | NLM_F_DUMP,
            nlmsg_seq: 7,
            nlmsg_pid: 0,
        };
        let bytes = hdr.to_bytes();
        assert_eq!(&bytes[0..4], &72u32.to_ne_bytes());
        assert_eq!(&bytes[4..6], &20u16.to_ne_bytes());
        assert_eq!(NlMsgHdr::from_bytes(&bytes), Some(hdr));
        assert_eq!(NlMsgHdr::from_bytes(&bytes[..15]), None);
    }

    #[test]
    fn test_ext_and_state_bits() {
        assert_eq!(ext_bit(INET_DIAG_INFO), 0b10);
        assert_eq!(ext_bit(INET_DIAG_MEMINFO), 0b1);
        assert_eq!(ext_bit(INET_DIAG_NONE), 0);
        assert_eq!(state_bit(TCP_ESTABLISHED), 0b10);
        assert_eq!(state_bit(TCP_LISTEN), 1 << 10);
    }

    #[test]
    fn test_state_names() {
        assert_eq!(tcp_state_name(TCP_ESTABLISHED), "ESTABLISHED");
        assert_eq!(tcp_state_name(TCP_TIME_WAIT), "TIME_WAIT");
        assert_eq!(tcp_state_name(TCP_LISTEN), "LISTEN");
        assert_eq!(tcp_state_name(0), "UNKNOWN");
        assert_eq!(tcp_state_name(99), "UNKNOWN");
    }
}
