//! High-level INET_DIAG dump API
//!
//! This module is the glue that ties the protocol pieces together:
//! 1. Builds a dump request from a [`DumpFilter`]
//! 2. Sends it through a [`DiagTransport`]
//! 3. Receives datagrams until `NLMSG_DONE`
//! 4. Decodes each `inet_diag_msg` into an owned [`ConnectionRecord`]
//!
//! ## Driver States
//!
//! ```text
//! Idle ──send──▶ RequestSent ──recv──▶ AwaitingData ──DONE──▶ Done
//!                     │                  │  ▲    │
//!                     │                  └──┘    │
//!                     └──────────┬───────────────┘
//!                                ▼
//!                             Failed   (transport, framing or kernel error)
//! ```
//!
//! Nothing is retried. A failed dump returns its error and no records; the
//! caller re-runs the whole dump if it wants another attempt. Every run
//! stamps a fresh sequence number, so replies still queued from an aborted
//! run are skipped instead of being taken for the new dump's.

use std::net::{Ipv4Addr, SocketAddrV4};

use serde::Serialize;
use tracing::{debug, info, trace, warn};

use crate::config::DumpConfig;
use crate::error::{DumpError, MessageError, TcpInfoError};
use crate::netlink::message::{
    Attributes, DumpFilter, EnvelopeKind, Envelopes, build_inet_diag_request,
};
use crate::netlink::socket::DiagTransport;
use crate::netlink::structures::{
    self, AF_INET, INET_DIAG_INFO, INET_DIAG_MSG_LEN, read_u16_be, read_u32_ne, sockid,
    tcp_state_name,
};
use crate::netlink::tcp_info::{TcpInfo, parse_tcp_info};

/// Receive buffer size used when none is configured
pub const DEFAULT_RECV_BUFFER: usize = 32768;

// ============================================================================
// DATA STRUCTURES
// ============================================================================

/// One TLV attribute copied out of a record
///
/// Duplicated kinds are kept in arrival order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AttributeBlock {
    pub kind: u16,
    pub value: Vec<u8>,
}

/// One IPv4 socket as reported by the kernel
///
/// All numeric fields are in host byte order. The record owns its data and
/// never points into the receive buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionRecord {
    pub family: u8,
    /// Kernel TCP state (1 = ESTABLISHED)
    pub state: u8,
    pub timer: u8,
    pub retrans: u8,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
    pub sport: u16,
    pub dport: u16,
    pub interface: u32,
    pub cookie: u64,
    pub expires: u32,
    /// Bytes waiting in the receive queue
    pub rqueue: u32,
    /// Bytes waiting in the send queue
    pub wqueue: u32,
    pub uid: u32,
    pub inode: u32,
    pub attributes: Vec<AttributeBlock>,
}

impl ConnectionRecord {
    #[must_use]
    pub const fn source(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.src, self.sport)
    }

    #[must_use]
    pub const fn destination(&self) -> SocketAddrV4 {
        SocketAddrV4::new(self.dst, self.dport)
    }

    #[must_use]
    pub const fn state_name(&self) -> &'static str {
        tcp_state_name(self.state)
    }

    /// First attribute of the given kind
    #[must_use]
    pub fn attribute(&self, kind: u16) -> Option<&AttributeBlock> {
        self.attributes.iter().find(|attr| attr.kind == kind)
    }

    /// Decode the `INET_DIAG_INFO` attribute, if the kernel sent one
    ///
    /// # Errors
    ///
    /// Returns `TcpInfoError` if the attribute is present but too short.
    pub fn tcp_info(&self) -> Result<Option<TcpInfo>, TcpInfoError> {
        self.attribute(INET_DIAG_INFO)
            .map(|attr| parse_tcp_info(&attr.value))
            .transpose()
    }
}

/// Everything one dump produced, in arrival order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DumpResult {
    pub records: Vec<ConnectionRecord>,
    /// Records skipped because they were not `AF_INET`
    pub skipped_unsupported: usize,
    /// Kernel set `NLM_F_DUMP_INTR`: the socket table changed mid-dump
    pub interrupted: bool,
}

// ============================================================================
// RECORD DECODING
// ============================================================================

/// Decode one `inet_diag_msg` and its attributes
///
/// ```text
/// 0 family │ 1 state │ 2 timer │ 3 retrans
/// 4  sport (be16) │ 6 dport (be16)
/// 8  src[16]      │ 24 dst[16]       (IPv4 uses the first 4 bytes)
/// 40 if │ 44 cookie[2]
/// 52 expires │ 56 rqueue │ 60 wqueue │ 64 uid │ 68 inode
/// 72 rtattr...
/// ```
///
/// # Errors
///
/// - `MessageError::PayloadTooSmall` if fewer than 72 bytes are present
/// - `MessageError::UnsupportedFamily` for anything but `AF_INET`
/// - attribute framing errors from [`Attributes`]
pub fn decode_record(payload: &[u8]) -> Result<ConnectionRecord, MessageError> {
    if payload.len() < INET_DIAG_MSG_LEN {
        return Err(MessageError::PayloadTooSmall {
            what: "inet_diag_msg",
            len: payload.len(),
            need: INET_DIAG_MSG_LEN,
        });
    }

    let family = payload[structures::msg::FAMILY];
    if family != AF_INET {
        return Err(MessageError::UnsupportedFamily { family });
    }

    let id = structures::msg::ID;
    let ipv4_at = |at: usize| {
        Ipv4Addr::new(payload[at], payload[at + 1], payload[at + 2], payload[at + 3])
    };
    let cookie = u64::from(read_u32_ne(payload, id + sockid::COOKIE))
        | (u64::from(read_u32_ne(payload, id + sockid::COOKIE + 4)) << 32);

    let attributes = Attributes::new(&payload[INET_DIAG_MSG_LEN..])
        .map(|attr| {
            attr.map(|a| AttributeBlock {
                kind: a.kind,
                value: a.value.to_vec(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ConnectionRecord {
        family,
        state: payload[structures::msg::STATE],
        timer: payload[structures::msg::TIMER],
        retrans: payload[structures::msg::RETRANS],
        src: ipv4_at(id + sockid::SRC),
        dst: ipv4_at(id + sockid::DST),
        sport: read_u16_be(payload, id + sockid::SPORT),
        dport: read_u16_be(payload, id + sockid::DPORT),
        interface: read_u32_ne(payload, id + sockid::IF),
        cookie,
        expires: read_u32_ne(payload, structures::msg::EXPIRES),
        rqueue: read_u32_ne(payload, structures::msg::RQUEUE),
        wqueue: read_u32_ne(payload, structures::msg::WQUEUE),
        uid: read_u32_ne(payload, structures::msg::UID),
        inode: read_u32_ne(payload, structures::msg::INODE),
        attributes,
    })
}

/// Walk one datagram, appending decoded records to `result`
///
/// Returns `Ok(true)` once `NLMSG_DONE` is seen; envelopes after it are
/// ignored. Envelopes carrying another sequence number are skipped.
///
/// # Errors
///
/// Framing errors, undecodable records and non-zero error envelopes abort
/// the pass.
pub fn process_datagram(
    datagram: &[u8],
    seq: u32,
    result: &mut DumpResult,
) -> Result<bool, DumpError> {
    for envelope in Envelopes::new(datagram) {
        let envelope = envelope?;

        if envelope.header.nlmsg_seq != seq {
            warn!(
                expected = seq,
                got = envelope.header.nlmsg_seq,
                "skipping envelope from another exchange"
            );
            continue;
        }
        if envelope.dump_interrupted() {
            result.interrupted = true;
        }

        match envelope.kind {
            EnvelopeKind::Done => return Ok(true),
            EnvelopeKind::Error => {
                let errno = envelope.error_code()?;
                if errno == 0 {
                    debug!("acknowledgement received");
                    continue;
                }
                return Err(DumpError::Protocol { errno });
            }
            EnvelopeKind::Data => match decode_record(envelope.payload) {
                Ok(record) => result.records.push(record),
                Err(MessageError::UnsupportedFamily { family }) => {
                    debug!(family, "skipping record of unsupported family");
                    result.skipped_unsupported += 1;
                }
                Err(e) => return Err(e.into()),
            },
            EnvelopeKind::Other(kind) => {
                warn!(kind, "skipping unknown netlink message type");
            }
        }
    }
    Ok(false)
}

// ============================================================================
// DUMP DRIVER
// ============================================================================

/// Where a dump currently is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpState {
    Idle,
    RequestSent,
    AwaitingData,
    Done,
    Failed,
}

/// Runs dumps over a transport, reusing one receive buffer
///
/// # Example
///
/// ```no_run
/// use tcpcensus::netlink::inet_diag::DumpDriver;
/// use tcpcensus::netlink::message::DumpFilter;
/// use tcpcensus::netlink::socket::NetlinkSocket;
///
/// let mut driver = DumpDriver::new(NetlinkSocket::new()?);
/// let result = driver.run(&DumpFilter::tcp_established())?;
/// for record in &result.records {
///     println!("{} -> {} inode {}", record.source(), record.destination(), record.inode);
/// }
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct DumpDriver<T> {
    transport: T,
    buffer: Vec<u8>,
    seq: u32,
    state: DumpState,
}

impl<T: DiagTransport> DumpDriver<T> {
    #[must_use]
    pub fn new(transport: T) -> Self {
        Self::with_buffer_size(transport, DEFAULT_RECV_BUFFER)
    }

    /// Driver with a receive buffer of `size` bytes
    ///
    /// Datagrams larger than the buffer fail the dump with
    /// `SocketError::Truncated`.
    #[must_use]
    pub fn with_buffer_size(transport: T, size: usize) -> Self {
        Self {
            transport,
            buffer: vec![0u8; size],
            seq: 1,
            state: DumpState::Idle,
        }
    }

    #[must_use]
    pub fn from_config(transport: T, config: &DumpConfig) -> Self {
        Self::with_buffer_size(transport, config.recv_buffer_size).sequence(config.sequence)
    }

    /// Sequence number stamped on the next request
    ///
    /// Each later run uses the following number, wrapping at `u32::MAX`.
    #[must_use]
    pub fn sequence(mut self, seq: u32) -> Self {
        self.seq = seq;
        self
    }

    #[must_use]
    pub const fn state(&self) -> DumpState {
        self.state
    }

    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Send the dump request and collect every record until `NLMSG_DONE`
    ///
    /// # Errors
    ///
    /// - `DumpError::Transport` if sending or receiving fails
    /// - `DumpError::Framing` if a datagram or record is malformed
    /// - `DumpError::Protocol` if the kernel answers with an error
    pub fn run(&mut self, filter: &DumpFilter) -> Result<DumpResult, DumpError> {
        self.state = DumpState::Idle;
        match self.exchange(filter) {
            Ok(result) => {
                self.state = DumpState::Done;
                info!(
                    records = result.records.len(),
                    skipped = result.skipped_unsupported,
                    interrupted = result.interrupted,
                    "dump complete"
                );
                Ok(result)
            }
            Err(e) => {
                self.state = DumpState::Failed;
                Err(e)
            }
        }
    }

    fn exchange(&mut self, filter: &DumpFilter) -> Result<DumpResult, DumpError> {
        let seq = self.seq;
        self.seq = self.seq.wrapping_add(1);

        let request = build_inet_diag_request(filter, seq);
        self.transport.send(&request.segments())?;
        self.state = DumpState::RequestSent;
        debug!(
            seq,
            family = filter.family,
            states = filter.states,
            ext = filter.extensions,
            "dump request sent"
        );

        let mut result = DumpResult::default();
        loop {
            let len = self.receive_datagram()?;
            if process_datagram(&self.buffer[..len], seq, &mut result)? {
                return Ok(result);
            }
        }
    }

    fn receive_datagram(&mut self) -> Result<usize, DumpError> {
        let len = self.transport.receive(&mut self.buffer)?;
        self.state = DumpState::AwaitingData;
        trace!(bytes = len, "processing datagram");
        Ok(len)
    }
}

// ============================================================================
// TESTS
// ============================================================================
