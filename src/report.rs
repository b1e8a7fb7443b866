//! What a campaign tells the user, and where it goes.

use std::fmt;
use std::net::Ipv4Addr;

use colored::*;

use crate::campaign::Statistics;
use crate::session::ProbeResult;

#[derive(Debug, Clone, PartialEq)]
pub enum Report {
    ResolutionFailed { host: String, error: String },
    Contacting { host: String, address: Ipv4Addr, bytes: usize },
    Reply { address: Ipv4Addr, result: ProbeResult },
    Timeout { timeout_ms: u128 },
    ChecksumError,
    TransportError { error: String },
    PermissionDenied { error: String },
    Summary { address: Ipv4Addr, statistics: Statistics },
}

impl Report {
    /// The report as plain text, one entry per output line.
    pub fn lines(&self) -> Vec<String> {
        match self {
            Report::ResolutionFailed { host, error } => vec![
                error.clone(),
                format!("Could not find host {}.", host),
                "Please check name and try again.".to_string(),
            ],
            Report::Contacting { host, address, bytes } => {
                vec![format!("Contacting {} [{}] with {} bytes of data", host, address, bytes)]
            }
            Report::Reply { address, result } => {
                let h = &result.response_header;
                vec![format!(
                    "Reply from {} in {:.2}ms: type={} code={} checksum={} id={} seq={}",
                    address, result.round_trip_time_ms, h.message_type, h.code, h.checksum, h.identifier,
                    h.sequence_number
                )]
            }
            Report::Timeout { timeout_ms } => vec![format!("Request timed out after {}ms", timeout_ms)],
            Report::ChecksumError => vec!["Checksum Error: computed checksum mismatch".to_string()],
            Report::TransportError { error } => vec![format!("Transport error: {}", error)],
            Report::PermissionDenied { error } => vec![
                format!("Permission denied: {}", error),
                "NB: raw ICMP sockets usually require root or CAP_NET_RAW; skipping remaining probes".to_string(),
            ],
            Report::Summary { address, statistics: s } => {
                let mut lines = vec![
                    format!("Ping statistics for {}:", address),
                    format!(
                        "\tPackets: Sent = {}, Received = {}, Lost = {} ({}% loss)",
                        s.sent, s.received, s.lost, s.loss_pct
                    ),
                ];
                if let Some(rtt) = &s.rtt {
                    lines.push("Approximate round trip times in milli-seconds:".to_string());
                    lines.push(format!(
                        "\tMinimum = {}ms, Maximum = {}ms, Average = {}ms",
                        rtt.min_ms, rtt.max_ms, rtt.avg_ms
                    ));
                }
                lines
            }
        }
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lines().join("\n"))
    }
}

/// Receives every report a campaign produces, in order.
pub trait Sink {
    fn report(&mut self, report: &Report);
}

impl<F: FnMut(&Report)> Sink for F {
    fn report(&mut self, report: &Report) {
        self(report)
    }
}

impl Sink for Vec<Report> {
    fn report(&mut self, report: &Report) {
        self.push(report.clone());
    }
}

/// Writes reports to standard output, styled for a terminal.
#[derive(Debug, Default)]
pub struct StdoutSink;

impl Sink for StdoutSink {
    fn report(&mut self, report: &Report) {
        match report {
            Report::ResolutionFailed { .. } => {
                for line in report.lines() {
                    println!("{}", line.red());
                }
            }
            Report::Contacting { host, address, bytes } => {
                println!("{} {} [{}] with {} bytes of data", "Contacting".cyan(), host.bold(), address, bytes);
            }
            Report::Reply { address, result } => {
                let h = &result.response_header;
                print!("Reply from {} in {}ms: ",
                    address.to_string().yellow(), format!("{:.2}", result.round_trip_time_ms).bold());
                println!("type={} code={} checksum={} id={} seq={}",
                    h.message_type, h.code, h.checksum, h.identifier, h.sequence_number.to_string().bold());
            }
            Report::Timeout { .. } | Report::ChecksumError | Report::TransportError { .. } => {
                println!("{}", report.to_string().red());
            }
            Report::PermissionDenied { .. } => {
                for line in report.lines() {
                    println!("{}", line.red().bold());
                }
            }
            Report::Summary { address, statistics: s } => {
                println!("{} {} {} {}", "===".yellow(), address.to_string().bold(), "ping statistics".cyan(), "===".yellow());
                println!("\tPackets: Sent = {}, Received = {}, Lost = {} ({}% loss)",
                    s.sent.to_string().bold(), s.received.to_string().bold(),
                    s.lost.to_string().red().bold(), s.loss_pct.to_string().bold());
                if let Some(rtt) = &s.rtt {
                    println!("Approximate round trip times in milli-seconds:");
                    println!("\tMinimum = {}ms, Maximum = {}ms, Average = {}ms",
                        rtt.min_ms.to_string().bold(), rtt.max_ms.to_string().bold(), rtt.avg_ms.to_string().bold());
                }
            }
        }
    }
}
