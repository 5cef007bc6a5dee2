//! TCP info parsing with kernel version compatibility
//!
//! Interprets the `INET_DIAG_INFO` attribute the kernel attaches when the
//! request sets `1 << (INET_DIAG_INFO - 1)` in `idiag_ext`.
//!
//! ## Kernel Version Challenge
//!
//! `struct tcp_info` has grown over time:
//! - Kernel 3.10: 104 bytes of fields every kernel has
//! - Kernel 4.2+: pacing, byte counters, min_rtt, delivery rate
//! - Kernel 4.19+: bytes_sent, bytes_retrans, dsack_dups, ...
//!
//! The kernel copies `min(sizeof(tcp_info), attribute space)`, so we parse
//! the basic block when present and then as many extended fields as the
//! value holds. Every field is read at a fixed offset in host byte order.

use serde::Serialize;
use tracing::trace;

use crate::error::TcpInfoError;
use crate::netlink::structures::{read_u32_ne, read_u64_ne};

/// Bytes up to and including `tcpi_total_retrans`
pub const TCP_INFO_BASIC_LEN: usize = 104;

/// Basic tcp_info fields (kernel 3.10+)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TcpInfoBasic {
    // === State and options (8 bytes) ===
    pub tcpi_state: u8,
    pub tcpi_ca_state: u8,
    pub tcpi_retransmits: u8,
    pub tcpi_probes: u8,
    pub tcpi_backoff: u8,
    pub tcpi_options: u8,
    pub tcpi_snd_wscale: u8, // snd_wscale (bits 0-3) + rcv_wscale (bits 4-7)
    pub tcpi_delivery_rate_app_limited: u8,

    // === Timeouts ===
    pub tcpi_rto: u32, // usec
    pub tcpi_ato: u32, // usec

    // === MSS ===
    pub tcpi_snd_mss: u32,
    pub tcpi_rcv_mss: u32,

    // === Packet counts ===
    pub tcpi_unacked: u32,
    pub tcpi_sacked: u32,
    pub tcpi_lost: u32,
    pub tcpi_retrans: u32,
    pub tcpi_fackets: u32,

    // === Times (ms) ===
    pub tcpi_last_data_sent: u32,
    pub tcpi_last_ack_sent: u32,
    pub tcpi_last_data_recv: u32,
    pub tcpi_last_ack_recv: u32,

    // === Core metrics ===
    pub tcpi_pmtu: u32,
    pub tcpi_rcv_ssthresh: u32,
    pub tcpi_rtt: u32,    // usec
    pub tcpi_rttvar: u32, // usec
    pub tcpi_snd_ssthresh: u32,
    pub tcpi_snd_cwnd: u32,
    pub tcpi_advmss: u32,
    pub tcpi_reordering: u32,
    pub tcpi_rcv_rtt: u32,
    pub tcpi_rcv_space: u32,

    pub tcpi_total_retrans: u32,
}

/// Extended tcp_info fields (kernel 4.2+)
///
/// Fields beyond the end of the attribute value stay 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TcpInfoExtended {
    pub tcpi_pacing_rate: u64,
    pub tcpi_max_pacing_rate: u64,
    pub tcpi_bytes_acked: u64,
    pub tcpi_bytes_received: u64,
    pub tcpi_segs_out: u32,
    pub tcpi_segs_in: u32,
    pub tcpi_notsent_bytes: u32,
    pub tcpi_min_rtt: u32,
    pub tcpi_data_segs_in: u32,
    pub tcpi_data_segs_out: u32,
    pub tcpi_delivery_rate: u64,
    pub tcpi_busy_time: u64,
    pub tcpi_rwnd_limited: u64,
    pub tcpi_sndbuf_limited: u64,
    pub tcpi_delivered: u32,
    pub tcpi_delivered_ce: u32,
    pub tcpi_bytes_sent: u64,
    pub tcpi_bytes_retrans: u64,
    pub tcpi_dsack_dups: u32,
    pub tcpi_reord_seen: u32,
    pub tcpi_rcv_ooopack: u32,
    pub tcpi_snd_wnd: u32,
}

/// Complete tcp_info: basic block plus whatever extended fields were sent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TcpInfo {
    pub basic: TcpInfoBasic,
    pub extended: Option<TcpInfoExtended>,
}

impl TcpInfo {
    /// Smoothed RTT in milliseconds
    #[must_use]
    pub fn rtt_ms(&self) -> f64 {
        f64::from(self.basic.tcpi_rtt) / 1000.0
    }

    /// Minimum RTT seen in milliseconds (kernel 4.6+)
    #[must_use]
    pub fn min_rtt_ms(&self) -> Option<f64> {
        self.extended
            .as_ref()
            .filter(|ext| ext.tcpi_min_rtt != 0)
            .map(|ext| f64::from(ext.tcpi_min_rtt) / 1000.0)
    }

    #[must_use]
    pub const fn congestion_window(&self) -> u32 {
        self.basic.tcpi_snd_cwnd
    }
}

/// Parse tcp_info from attribute bytes
///
/// # Errors
///
/// Returns `TcpInfoError::TooSmall` if the value holds fewer than
/// [`TCP_INFO_BASIC_LEN`] bytes.
pub fn parse_tcp_info(data: &[u8]) -> Result<TcpInfo, TcpInfoError> {
    if data.len() < TCP_INFO_BASIC_LEN {
        return Err(TcpInfoError::TooSmall {
            len: data.len(),
            min: TCP_INFO_BASIC_LEN,
        });
    }

    let u32_at = |index: usize| read_u32_ne(data, 8 + index * 4);
    let basic = TcpInfoBasic {
        tcpi_state: data[0],
        tcpi_ca_state: data[1],
        tcpi_retransmits: data[2],
        tcpi_probes: data[3],
        tcpi_backoff: data[4],
        tcpi_options: data[5],
        tcpi_snd_wscale: data[6],
        tcpi_delivery_rate_app_limited: data[7],
        tcpi_rto: u32_at(0),
        tcpi_ato: u32_at(1),
        tcpi_snd_mss: u32_at(2),
        tcpi_rcv_mss: u32_at(3),
        tcpi_unacked: u32_at(4),
        tcpi_sacked: u32_at(5),
        tcpi_lost: u32_at(6),
        tcpi_retrans: u32_at(7),
        tcpi_fackets: u32_at(8),
        tcpi_last_data_sent: u32_at(9),
        tcpi_last_ack_sent: u32_at(10),
        tcpi_last_data_recv: u32_at(11),
        tcpi_last_ack_recv: u32_at(12),
        tcpi_pmtu: u32_at(13),
        tcpi_rcv_ssthresh: u32_at(14),
        tcpi_rtt: u32_at(15),
        tcpi_rttvar: u32_at(16),
        tcpi_snd_ssthresh: u32_at(17),
        tcpi_snd_cwnd: u32_at(18),
        tcpi_advmss: u32_at(19),
        tcpi_reordering: u32_at(20),
        tcpi_rcv_rtt: u32_at(21),
        tcpi_rcv_space: u32_at(22),
        tcpi_total_retrans: u32_at(23),
    };

    let extended = if data.len() > TCP_INFO_BASIC_LEN {
        Some(parse_extended_fields(&data[TCP_INFO_BASIC_LEN..]))
    } else {
        None
    };

    Ok(TcpInfo { basic, extended })
}

/// Read extended fields in kernel order
///
/// Older kernels send fewer fields; everything read before the first one
/// that does not fit is kept, the rest stay zero.
fn parse_extended_fields(data: &[u8]) -> TcpInfoExtended {
    let mut ext = TcpInfoExtended::default();
    let mut reader = FieldReader { data, offset: 0 };
    if read_extended_fields(&mut reader, &mut ext).is_none() {
        trace!(
            len = data.len(),
            read = reader.offset,
            "tcp_info ends before the last extended field"
        );
    }
    ext
}

fn read_extended_fields(reader: &mut FieldReader<'_>, ext: &mut TcpInfoExtended) -> Option<()> {
    ext.tcpi_pacing_rate = reader.u64()?;
    ext.tcpi_max_pacing_rate = reader.u64()?;
    ext.tcpi_bytes_acked = reader.u64()?;
    ext.tcpi_bytes_received = reader.u64()?;
    ext.tcpi_segs_out = reader.u32()?;
    ext.tcpi_segs_in = reader.u32()?;
    ext.tcpi_notsent_bytes = reader.u32()?;
    ext.tcpi_min_rtt = reader.u32()?;
    ext.tcpi_data_segs_in = reader.u32()?;
    ext.tcpi_data_segs_out = reader.u32()?;
    ext.tcpi_delivery_rate = reader.u64()?;
    ext.tcpi_busy_time = reader.u64()?;
    ext.tcpi_rwnd_limited = reader.u64()?;
    ext.tcpi_sndbuf_limited = reader.u64()?;
    ext.tcpi_delivered = reader.u32()?;
    ext.tcpi_delivered_ce = reader.u32()?;
    ext.tcpi_bytes_sent = reader.u64()?;
    ext.tcpi_bytes_retrans = reader.u64()?;
    ext.tcpi_dsack_dups = reader.u32()?;
    ext.tcpi_reord_seen = reader.u32()?;
    ext.tcpi_rcv_ooopack = reader.u32()?;
    ext.tcpi_snd_wnd = reader.u32()?;
    Some(())
}

/// Sequential reader; `None` once the next field would run past the end
struct FieldReader<'a> {
    data: &'a [u8],
    offset: usize,
}

impl FieldReader<'_> {
    fn u32(&mut self) -> Option<u32> {
        if self.offset + 4 > self.data.len() {
            return None;
        }
        let value = read_u32_ne(self.data, self.offset);
        self.offset += 4;
        Some(value)
    }

    fn u64(&mut self) -> Option<u64> {
        if self.offset + 8 > self.data.len() {
            return None;
        }
        let value = read_u64_ne(self.data, self.offset);
        self.offset += 8;
        Some(value)
    }
}

// ============================================================================
// TESTS
// ============================================================================
