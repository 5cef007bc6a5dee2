//! Netlink message construction and parsing
//!
//! This module builds the `SOCK_DIAG_BY_FAMILY` dump request and splits
//! response datagrams into envelopes and attribute lists.
//!
//! ## Message Format
//!
//! ```text
//! ┌─────────────────────────────┐
//! │ NlMsgHdr (16 bytes)         │  ← Netlink header (metadata)
//! ├─────────────────────────────┤
//! │ Payload (variable bytes)    │  ← Protocol-specific data
//! ├─────────────────────────────┤
//! │ Padding (0-3 bytes)         │  ← Align to 4-byte boundary
//! └─────────────────────────────┘
//! ```
//!
//! One datagram holds any number of these back to back. The kernel pads every
//! envelope to a 4-byte boundary, so the next envelope starts at
//! `offset + nlmsg_align(nlmsg_len)`, never at `offset + nlmsg_len`.
//!
//! Parsing never casts the buffer to a structure. Both iterators borrow the
//! datagram and hand out sub-slices; anything that must outlive the datagram
//! is copied by the record decoder.

use std::net::SocketAddrV4;

use crate::error::MessageError;
use crate::netlink::structures::*;

// ============================================================================
// MESSAGE CONSTRUCTION
// ============================================================================

/// Which sockets a dump should return
///
/// The filter is serialized verbatim; the kernel validates it and reports
/// nonsense (an unknown family, say) as an error envelope.
///
/// # Example
///
/// ```
/// use std::net::{Ipv4Addr, SocketAddrV4};
/// use tcpcensus::netlink::message::DumpFilter;
/// use tcpcensus::netlink::structures::INET_DIAG_INFO;
///
/// let filter = DumpFilter::tcp_established()
///     .destination(SocketAddrV4::new(Ipv4Addr::new(10, 0, 2, 101), 5201))
///     .with_extension(INET_DIAG_INFO);
/// assert_eq!(filter.extensions, 0b10);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpFilter {
    /// `sdiag_family`
    pub family: u8,
    /// `sdiag_protocol`
    pub protocol: u8,
    /// `idiag_ext` bitmask of requested attributes
    pub extensions: u8,
    /// `idiag_states` bitmask (bit N selects TCP state N)
    pub states: u32,
    /// Local address and port
    pub source: Option<SocketAddrV4>,
    /// Remote address and port
    pub destination: Option<SocketAddrV4>,
    /// Interface index, 0 for any
    pub interface: u32,
    /// Kernel socket cookie, 0 for any
    pub cookie: u64,
}

impl DumpFilter {
    /// IPv4 TCP sockets in `ESTABLISHED` state, no attributes
    #[must_use]
    pub const fn tcp_established() -> Self {
        Self {
            family: AF_INET,
            protocol: IPPROTO_TCP,
            extensions: 0,
            states: state_bit(TCP_ESTABLISHED),
            source: None,
            destination: None,
            interface: 0,
            cookie: 0,
        }
    }

    #[must_use]
    pub const fn states(mut self, states: u32) -> Self {
        self.states = states;
        self
    }

    /// Ask the kernel to attach attribute `ext` (e.g. `INET_DIAG_INFO`)
    #[must_use]
    pub const fn with_extension(mut self, ext: u16) -> Self {
        self.extensions |= ext_bit(ext);
        self
    }

    #[must_use]
    pub const fn extensions(mut self, mask: u8) -> Self {
        self.extensions = mask;
        self
    }

    #[must_use]
    pub const fn source(mut self, addr: SocketAddrV4) -> Self {
        self.source = Some(addr);
        self
    }

    #[must_use]
    pub const fn destination(mut self, addr: SocketAddrV4) -> Self {
        self.destination = Some(addr);
        self
    }

    #[must_use]
    pub const fn interface(mut self, index: u32) -> Self {
        self.interface = index;
        self
    }

    #[must_use]
    pub const fn cookie(mut self, cookie: u64) -> Self {
        self.cookie = cookie;
        self
    }

    /// Serialize as `struct inet_diag_req_v2`
    #[must_use]
    pub fn to_bytes(&self) -> [u8; INET_DIAG_REQ_V2_LEN] {
        let mut out = [0u8; INET_DIAG_REQ_V2_LEN];
        out[req::FAMILY] = self.family;
        out[req::PROTOCOL] = self.protocol;
        out[req::EXT] = self.extensions;
        out[req::PAD] = 0;
        out[req::STATES..req::STATES + 4].copy_from_slice(&self.states.to_ne_bytes());

        let id = &mut out[req::ID..req::ID + INET_DIAG_SOCKID_LEN];
        if let Some(src) = self.source {
            id[sockid::SPORT..sockid::SPORT + 2].copy_from_slice(&src.port().to_be_bytes());
            id[sockid::SRC..sockid::SRC + 4].copy_from_slice(&src.ip().octets());
        }
        if let Some(dst) = self.destination {
            id[sockid::DPORT..sockid::DPORT + 2].copy_from_slice(&dst.port().to_be_bytes());
            id[sockid::DST..sockid::DST + 4].copy_from_slice(&dst.ip().octets());
        }
        id[sockid::IF..sockid::IF + 4].copy_from_slice(&self.interface.to_ne_bytes());

        // Kernel reassembles the cookie as cookie[0] | cookie[1] << 32
        let low = (self.cookie & 0xFFFF_FFFF) as u32;
        let high = (self.cookie >> 32) as u32;
        id[sockid::COOKIE..sockid::COOKIE + 4].copy_from_slice(&low.to_ne_bytes());
        id[sockid::COOKIE + 4..sockid::COOKIE + 8].copy_from_slice(&high.to_ne_bytes());
        out
    }
}

impl Default for DumpFilter {
    fn default() -> Self {
        Self::tcp_established()
    }
}

/// Serialized dump request, kept as two segments for a scatter-gather send
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagRequest {
    header: [u8; NLMSG_HDRLEN],
    payload: [u8; INET_DIAG_REQ_V2_LEN],
    seq: u32,
}

impl DiagRequest {
    #[must_use]
    pub const fn header(&self) -> &[u8] {
        &self.header
    }

    #[must_use]
    pub const fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Header and payload, in transmission order
    #[must_use]
    pub fn segments(&self) -> [&[u8]; 2] {
        [&self.header, &self.payload]
    }

    #[must_use]
    pub const fn sequence(&self) -> u32 {
        self.seq
    }

    /// Total bytes on the wire
    #[must_use]
    pub const fn len(&self) -> usize {
        NLMSG_HDRLEN + INET_DIAG_REQ_V2_LEN
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Contiguous copy of the request
    #[must_use]
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buffer = Vec::with_capacity(nlmsg_space(INET_DIAG_REQ_V2_LEN));
        buffer.extend_from_slice(&self.header);
        buffer.extend_from_slice(&self.payload);
        buffer
    }
}

/// Build complete INET_DIAG dump request
///
/// ```text
/// ┌─────────────────────────────┐
/// │ NlMsgHdr (16 bytes)         │  ← len=72, type=SOCK_DIAG_BY_FAMILY,
/// │                             │    flags=REQUEST|DUMP
/// ├─────────────────────────────┤
/// │ InetDiagReqV2 (56 bytes)    │  ← filter
/// └─────────────────────────────┘
/// ```
///
/// 72 is already a multiple of 4, so no padding follows.
#[must_use]
pub fn build_inet_diag_request(filter: &DumpFilter, seq: u32) -> DiagRequest {
    let nlh = NlMsgHdr {
        nlmsg_len: nlmsg_length(INET_DIAG_REQ_V2_LEN),
        nlmsg_type: SOCK_DIAG_BY_FAMILY,
        nlmsg_flags: NLM_F_REQUEST | NLM_F_DUMP,
        nlmsg_seq: seq,
        nlmsg_pid: 0, // Kernel fills in the sender
    };

    DiagRequest {
        header: nlh.to_bytes(),
        payload: filter.to_bytes(),
        seq,
    }
}

// ============================================================================
// ENVELOPE DEMULTIPLEXING
// ============================================================================

/// What an envelope carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeKind {
    /// `SOCK_DIAG_BY_FAMILY`: one socket record
    Data,
    /// `NLMSG_ERROR`: errno (0 is an acknowledgement)
    Error,
    /// `NLMSG_DONE`: end of the dump
    Done,
    /// Any other type (`NLMSG_NOOP`, `NLMSG_OVERRUN`, ...)
    Other(u16),
}

impl EnvelopeKind {
    #[must_use]
    pub const fn classify(nlmsg_type: u16) -> Self {
        match nlmsg_type {
            SOCK_DIAG_BY_FAMILY => Self::Data,
            NLMSG_ERROR => Self::Error,
            NLMSG_DONE => Self::Done,
            other => Self::Other(other),
        }
    }
}

/// One framed message inside a datagram
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Envelope<'a> {
    pub header: NlMsgHdr,
    pub kind: EnvelopeKind,
    /// Bytes between the header and `nlmsg_len`
    pub payload: &'a [u8],
}

impl Envelope<'_> {
    /// Signed errno carried by an error envelope
    ///
    /// The kernel sends it negated (`-EACCES`); 0 means acknowledgement.
    ///
    /// # Errors
    ///
    /// Returns `MessageError::PayloadTooSmall` when the payload cannot hold
    /// the 4-byte code.
    pub fn error_code(&self) -> Result<i32, MessageError> {
        if self.payload.len() < 4 {
            return Err(MessageError::PayloadTooSmall {
                what: "nlmsgerr",
                len: self.payload.len(),
                need: 4,
            });
        }
        Ok(read_i32_ne(self.payload, 0))
    }

    /// Whether the kernel flagged the dump as inconsistent
    #[must_use]
    pub const fn dump_interrupted(&self) -> bool {
        self.header.nlmsg_flags & NLM_F_DUMP_INTR != 0
    }
}

/// Lazy walk over the envelopes of one datagram
///
/// Stops cleanly once fewer than [`NLMSG_HDRLEN`] bytes remain. A length
/// field that is too small or runs past the datagram yields one
/// `Err(MessageError)` and ends the walk; nothing after it is returned.
#[derive(Debug, Clone)]
pub struct Envelopes<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Envelopes<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }

    /// Bytes consumed so far (aligned)
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }
}

impl<'a> Iterator for Envelopes<'a> {
    type Item = Result<Envelope<'a>, MessageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let rest = &self.data[self.offset..];
        let header = NlMsgHdr::from_bytes(rest)?;
        let msg_len = header.nlmsg_len as usize;

        if msg_len < NLMSG_HDRLEN {
            self.failed = true;
            return Some(Err(MessageError::LengthTooSmall {
                len: msg_len,
                offset: self.offset,
                min: NLMSG_HDRLEN,
            }));
        }
        if msg_len > rest.len() {
            self.failed = true;
            return Some(Err(MessageError::LengthExceedsBuffer {
                len: msg_len,
                offset: self.offset,
                buffer: self.data.len(),
            }));
        }

        let envelope = Envelope {
            header,
            kind: EnvelopeKind::classify(header.nlmsg_type),
            payload: &rest[NLMSG_HDRLEN..msg_len],
        };

        // The last envelope of a datagram may legally omit its padding
        self.offset = (self.offset + nlmsg_align(msg_len)).min(self.data.len());
        Some(Ok(envelope))
    }
}

impl std::iter::FusedIterator for Envelopes<'_> {}

// ============================================================================
// ATTRIBUTE SCANNING
// ============================================================================

/// One `rtattr` entry, borrowed from the record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attribute<'a> {
    pub kind: u16,
    pub value: &'a [u8],
}

/// Lazy walk over TLV attributes following a fixed record
///
/// ```text
/// ┌────────────────┐
/// │ rta_len: u16   │ ← includes this 4-byte header
/// │ rta_type: u16  │
/// ├────────────────┤
/// │ value          │ ← rta_len - 4 bytes
/// ├────────────────┤
/// │ padding        │ ← to 4-byte boundary
/// └────────────────┘
/// ```
///
/// Types are not interpreted. A zero or undersized length, or one running
/// past the tail, yields a single `Err` and ends the walk; attributes already
/// yielded stay valid.
#[derive(Debug, Clone)]
pub struct Attributes<'a> {
    data: &'a [u8],
    offset: usize,
    failed: bool,
}

impl<'a> Attributes<'a> {
    #[must_use]
    pub const fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            offset: 0,
            failed: false,
        }
    }
}

impl<'a> Iterator for Attributes<'a> {
    type Item = Result<Attribute<'a>, MessageError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let rest = &self.data[self.offset..];
        if rest.len() < RTA_HDRLEN {
            return None;
        }

        let attr_len = read_u16_ne(rest, 0) as usize;
        let kind = read_u16_ne(rest, 2);

        if attr_len < RTA_HDRLEN {
            self.failed = true;
            return Some(Err(MessageError::AttributeTooSmall {
                len: attr_len,
                offset: self.offset,
            }));
        }
        if attr_len > rest.len() {
            self.failed = true;
            return Some(Err(MessageError::AttributeExceedsRecord {
                len: attr_len,
                offset: self.offset,
                remaining: rest.len(),
            }));
        }

        let attribute = Attribute {
            kind,
            value: &rest[RTA_HDRLEN..attr_len],
        };
        self.offset = (self.offset + rta_align(attr_len)).min(self.data.len());
        Some(Ok(attribute))
    }
}

impl std::iter::FusedIterator for Attributes<'_> {}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn envelope(nlmsg_type: u16, payload: &[u8]) -> Vec<u8> {
        let hdr = NlMsgHdr {
            nlmsg_len: nlmsg_length(payload.len()),
            nlmsg_type,
            nlmsg_flags: NLM_F_MULTI,
            nlmsg_seq: 1,
            nlmsg_pid: 0,
        };
        let mut out = hdr.to_bytes().to_vec();
        out.extend_from_slice(payload);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    fn attribute(kind: u16, value: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&((RTA_HDRLEN + value.len()) as u16).to_ne_bytes());
        out.extend_from_slice(&kind.to_ne_bytes());
        out.extend_from_slice(value);
        while out.len() % 4 != 0 {
            out.push(0);
        }
        out
    }

    #[test]
    fn test_build_request() {
        let filter = DumpFilter::tcp_established();
        let request = build_inet_diag_request(&filter, 12345);

        assert_eq!(request.len(), NLMSG_HDRLEN + INET_DIAG_REQ_V2_LEN);
        assert_eq!(request.to_bytes().len(), 72);
        assert_eq!(request.to_bytes().len() % 4, 0);

        let nlh = NlMsgHdr::from_bytes(request.header()).unwrap();
        assert_eq!(nlh.nlmsg_len as usize, request.len());
        assert_eq!(nlh.nlmsg_type, SOCK_DIAG_BY_FAMILY);
        assert_eq!(nlh.nlmsg_seq, 12345);
        assert_eq!(nlh.nlmsg_flags, NLM_F_REQUEST | NLM_F_DUMP);
        assert_eq!(request.sequence(), 12345);
    }

    #[test]
    fn test_request_length_matches_for_any_filter() {
        let filters = [
            DumpFilter::tcp_established(),
            DumpFilter::tcp_established().states(TCPF_ALL),
            DumpFilter::tcp_established()
                .with_extension(INET_DIAG_INFO)
                .source(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 80))
                .cookie(u64::MAX),
        ];
        for filter in filters {
            let request = build_inet_diag_request(&filter, 1);
            let bytes = request.to_bytes();
            let declared = NlMsgHdr::from_bytes(&bytes).unwrap().nlmsg_len as usize;
            assert_eq!(bytes.len(), NLMSG_HDRLEN + INET_DIAG_REQ_V2_LEN);
            assert_eq!(declared, bytes.len());
        }
    }

    #[test]
    fn test_filter_layout() {
        let filter = DumpFilter::tcp_established()
            .with_extension(INET_DIAG_INFO)
            .source(SocketAddrV4::new(Ipv4Addr::new(192, 168, 1, 100), 8080))
            .destination(SocketAddrV4::new(Ipv4Addr::new(10, 0, 1, 5), 5000))
            .interface(3)
            .cookie(0x0000_0001_0000_0002);
        let bytes = filter.to_bytes();

        assert_eq!(bytes[req::FAMILY], AF_INET);
        assert_eq!(bytes[req::PROTOCOL], IPPROTO_TCP);
        assert_eq!(bytes[req::EXT], 0b10);
        assert_eq!(bytes[req::PAD], 0);
        assert_eq!(read_u32_ne(&bytes, req::STATES), 1 << TCP_ESTABLISHED);

        let id = req::ID;
        assert_eq!(&bytes[id + sockid::SPORT..id + sockid::SPORT + 2], &[0x1F, 0x90]);
        assert_eq!(&bytes[id + sockid::DPORT..id + sockid::DPORT + 2], &[0x13, 0x88]);
        assert_eq!(&bytes[id + sockid::SRC..id + sockid::SRC + 4], &[192, 168, 1, 100]);
        assert_eq!(&bytes[id + sockid::DST..id + sockid::DST + 4], &[10, 0, 1, 5]);
        assert_eq!(read_u32_ne(&bytes, id + sockid::IF), 3);
        assert_eq!(read_u32_ne(&bytes, id + sockid::COOKIE), 2);
        assert_eq!(read_u32_ne(&bytes, id + sockid::COOKIE + 4), 1);
    }

    #[test]
    fn test_dump_all_filter_is_zeroed() {
        let bytes = DumpFilter::tcp_established().to_bytes();
        assert!(bytes[req::ID..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_parse_done_message() {
        let data = envelope(NLMSG_DONE, &0i32.to_ne_bytes());
        let envelopes: Vec<_> = Envelopes::new(&data).collect::<Result<_, _>>().unwrap();

        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].kind, EnvelopeKind::Done);
    }

    #[test]
    fn test_envelopes_back_to_back() {
        let mut data = Vec::new();
        data.extend(envelope(SOCK_DIAG_BY_FAMILY, &[1u8; 72]));
        data.extend(envelope(SOCK_DIAG_BY_FAMILY, &[2u8; 73])); // padded to 76
        data.extend(envelope(NLMSG_NOOP, &[]));
        data.extend(envelope(NLMSG_DONE, &[0u8; 4]));

        let mut walk = Envelopes::new(&data);
        let kinds: Vec<_> = walk.by_ref().map(|e| e.unwrap().kind).collect();

        assert_eq!(
            kinds,
            vec![
                EnvelopeKind::Data,
                EnvelopeKind::Data,
                EnvelopeKind::Other(NLMSG_NOOP),
                EnvelopeKind::Done
            ]
        );
        assert_eq!(walk.offset(), data.len());
    }

    #[test]
    fn test_padding_is_skipped() {
        let mut data = Vec::new();
        data.extend(envelope(SOCK_DIAG_BY_FAMILY, &[0xAA; 5]));
        data.extend(envelope(SOCK_DIAG_BY_FAMILY, &[0xBB; 3]));

        let payloads: Vec<_> = Envelopes::new(&data).map(|e| e.unwrap().payload).collect();
        assert_eq!(payloads, vec![&[0xAAu8; 5][..], &[0xBBu8; 3][..]]);
    }

    #[test]
    fn test_truncated_tail_is_framing_error() {
        let mut data = envelope(SOCK_DIAG_BY_FAMILY, &[0u8; 72]);
        let mut tail = envelope(SOCK_DIAG_BY_FAMILY, &[0u8; 72]);
        tail.truncate(40);
        data.extend(tail);

        let results: Vec<_> = Envelopes::new(&data).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1],
            Err(MessageError::LengthExceedsBuffer {
                len: 88,
                offset: 88,
                buffer: 128
            })
        );
    }

    #[test]
    fn test_undersized_length_is_framing_error() {
        let mut data = envelope(SOCK_DIAG_BY_FAMILY, &[0u8; 8]);
        data[0..4].copy_from_slice(&8u32.to_ne_bytes());

        let mut walk = Envelopes::new(&data);
        assert!(matches!(
            walk.next(),
            Some(Err(MessageError::LengthTooSmall { len: 8, .. }))
        ));
        assert!(walk.next().is_none());
    }

    #[test]
    fn test_short_remainder_ends_walk() {
        let mut data = envelope(NLMSG_DONE, &[]);
        data.extend_from_slice(&[0u8; 8]);
        assert_eq!(Envelopes::new(&data).count(), 1);
        assert_eq!(Envelopes::new(&[]).count(), 0);
    }

    #[test]
    fn test_error_code() {
        let data = envelope(NLMSG_ERROR, &(-2i32).to_ne_bytes());
        let env = Envelopes::new(&data).next().unwrap().unwrap();
        assert_eq!(env.kind, EnvelopeKind::Error);
        assert_eq!(env.error_code(), Ok(-2));

        let short = envelope(NLMSG_ERROR, &[0xFF, 0xFF]);
        let env = Envelopes::new(&short).next().unwrap().unwrap();
        assert!(env.error_code().is_err());
    }

    #[test]
    fn test_parse_attributes_empty() {
        assert_eq!(Attributes::new(&[]).count(), 0);
    }

    #[test]
    fn test_parse_attributes_single() {
        let data = attribute(INET_DIAG_INFO, &[0xAA, 0xBB, 0xCC, 0xDD]);
        let attrs: Vec<_> = Attributes::new(&data).collect::<Result<_, _>>().unwrap();

        assert_eq!(attrs.len(), 1);
        assert_eq!(attrs[0].kind, INET_DIAG_INFO);
        assert_eq!(attrs[0].value, &[0xAA, 0xBB, 0xCC, 0xDD]);
    }

    #[test]
    fn test_parse_attributes_padding_and_duplicates() {
        let mut data = attribute(2, &[0x11, 0x22]);
        data.extend(attribute(4, b"cubic\0"));
        data.extend(attribute(2, &[0x33]));

        let attrs: Vec<_> = Attributes::new(&data).map(|a| a.unwrap()).collect();
        assert_eq!(attrs.len(), 3);
        assert_eq!(attrs[0].value, &[0x11, 0x22]);
        assert_eq!(attrs[1].value, b"cubic\0");
        assert_eq!((attrs[2].kind, attrs[2].value), (2, &[0x33][..]));
    }

    #[test]
    fn test_rescan_is_stable() {
        let mut data = attribute(7, &[1, 2, 3, 4, 5, 6, 7, 8]);
        data.extend(attribute(99, &[9]));

        let first: Vec<_> = Attributes::new(&data).collect();
        let second: Vec<_> = Attributes::new(&data).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_length_attribute_aborts_scan() {
        let mut data = attribute(5, &[1]);
        data.extend_from_slice(&[0, 0, 8, 0, 0xEE, 0xEE, 0xEE, 0xEE]);
        data.extend(attribute(6, &[2]));

        let results: Vec<_> = Attributes::new(&data).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].as_ref().unwrap().kind, 5);
        assert_eq!(
            results[1],
            Err(MessageError::AttributeTooSmall { len: 0, offset: 8 })
        );
    }

    #[test]
    fn test_oversized_attribute_aborts_scan() {
        let mut data = attribute(2, &[0u8; 8]);
        data[0..2].copy_from_slice(&64u16.to_ne_bytes());

        let results: Vec<_> = Attributes::new(&data).collect();
        assert_eq!(results.len(), 1);
        assert!(matches!(
            results[0],
            Err(MessageError::AttributeExceedsRecord { len: 64, .. })
        ));
    }
}
