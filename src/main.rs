// ============================================================================
// TCP Census - Main Entry Point
// ============================================================================
//
// Switches into a network namespace, dumps its TCP sockets over netlink
// INET_DIAG and prints one block per socket (or JSON with --json).
//
//   tcpcensus /var/run/netns/blue
//   tcpcensus /proc/1234/ns/net --all-states --info
//
// Diagnostics go to stderr through tracing; set RUST_LOG=debug to see the
// request and datagram flow.
//
// ============================================================================

use std::fmt::Write as _;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use tracing::warn;

use tcpcensus::netlink::TcpInfo;
use tcpcensus::netlink::structures::{INET_DIAG_INFO, TCPF_ALL, ext_bit};
use tcpcensus::{ConnectionRecord, DumpConfig, DumpResult, census};

// ============================================================================
// COMPILE-TIME FEATURE VALIDATION
// ============================================================================

#[cfg(not(target_os = "linux"))]
compile_error!("tcpcensus queries the Linux kernel over netlink and only builds on Linux");

#[cfg(all(target_os = "linux", not(feature = "netlink")))]
compile_error!(
    "The netlink transport is disabled!\n\
     \n\
     'netlink' is the default feature; do not build with --no-default-features."
);

// ============================================================================
// COMMAND LINE
// ============================================================================

/// List the TCP sockets of a network namespace via netlink `INET_DIAG`
#[derive(Parser, Debug)]
#[command(name = "tcpcensus", version, about)]
struct Cli {
    /// Network namespace link, e.g. /var/run/netns/NAME or /proc/PID/ns/net
    netns: PathBuf,

    /// Report sockets in every TCP state, not only ESTABLISHED
    #[arg(long)]
    all_states: bool,

    /// Request tcp_info and print RTT and congestion window
    #[arg(long)]
    info: bool,

    /// Print the census as JSON
    #[arg(long)]
    json: bool,

    /// Receive buffer size in bytes (overrides TCPCENSUS_RECV_BUFFER)
    #[arg(long, value_name = "BYTES")]
    buffer_size: Option<usize>,
}

impl Cli {
    /// Environment configuration with command-line flags applied on top
    fn config(&self) -> anyhow::Result<DumpConfig> {
        let mut config = DumpConfig::from_env().context("invalid TCPCENSUS_* environment")?;
        if self.all_states {
            config.states = TCPF_ALL;
        }
        if self.info {
            config.extensions |= ext_bit(INET_DIAG_INFO);
        }
        if let Some(size) = self.buffer_size {
            config.recv_buffer_size = size;
        }
        config.validate().context("invalid --buffer-size")?;
        Ok(config)
    }
}

// ============================================================================
// RENDERING
// ============================================================================

#[derive(Serialize)]
struct RecordView {
    state: &'static str,
    src: String,
    sport: u16,
    dst: String,
    dport: u16,
    inode: u32,
    uid: u32,
    rqueue: u32,
    wqueue: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    tcp_info: Option<TcpInfo>,
}

impl RecordView {
    fn new(record: &ConnectionRecord) -> Self {
        let tcp_info = record.tcp_info().unwrap_or_else(|e| {
            warn!(inode = record.inode, error = %e, "ignoring undecodable tcp_info");
            None
        });
        Self {
            state: record.state_name(),
            src: record.src.to_string(),
            sport: record.sport,
            dst: record.dst.to_string(),
            dport: record.dport,
            inode: record.inode,
            uid: record.uid,
            rqueue: record.rqueue,
            wqueue: record.wqueue,
            tcp_info,
        }
    }

    fn block(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "=================================");
        let _ = writeln!(out, "sport  : {}", self.sport);
        let _ = writeln!(out, "dport  : {}", self.dport);
        let _ = writeln!(out, "src ip : {}", self.src);
        let _ = writeln!(out, "dst ip : {}", self.dst);
        let _ = writeln!(out, "inode  : {}", self.inode);
        let _ = writeln!(out, "state  : {}", self.state);
        if let Some(info) = &self.tcp_info {
            let _ = writeln!(out, "rtt    : {:.3} ms", info.rtt_ms());
            let _ = writeln!(out, "cwnd   : {}", info.congestion_window());
        }
        out
    }
}

#[derive(Serialize)]
struct CensusView {
    records: Vec<RecordView>,
    skipped_unsupported: usize,
    interrupted: bool,
}

fn render(result: &DumpResult, json: bool) -> anyhow::Result<String> {
    let records: Vec<RecordView> = result.records.iter().map(RecordView::new).collect();

    if json {
        let view = CensusView {
            records,
            skipped_unsupported: result.skipped_unsupported,
            interrupted: result.interrupted,
        };
        let mut text = serde_json::to_string_pretty(&view).context("failed to encode JSON")?;
        text.push('\n');
        return Ok(text);
    }

    Ok(records.iter().map(RecordView::block).collect())
}

// ============================================================================
// MAIN
// ============================================================================

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;

    let result = census(Some(&cli.netns), &config)
        .with_context(|| format!("census of {} failed", cli.netns.display()))?;

    if result.interrupted {
        warn!("socket table changed during the dump; the census may be inconsistent");
    }
    if result.skipped_unsupported > 0 {
        warn!(
            skipped = result.skipped_unsupported,
            "skipped records of unsupported address families"
        );
    }

    print!("{}", render(&result, cli.json)?);
    Ok(())
}
