use std::net::Ipv4Addr;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use rand::random;

use crate::config::PingConfig;
use crate::error::PingError;
use crate::packet::PROBE_DATAGRAM_LEN;
use crate::report::{Report, Sink};
use crate::session::{self, Destination, ProbeOutcome};
use crate::transport::{Network, RawNetwork};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Resolving,
    Resolved,
    ResolutionFailed,
    ProbingLoop,
    Reporting,
    Done,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RttSummary {
    pub min_ms: i64,
    pub max_ms: i64,
    pub avg_ms: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Statistics {
    pub sent: u32,
    pub received: u32,
    pub lost: u32,
    pub loss_pct: f64,
    /// Present only when at least one reply arrived.
    pub rtt: Option<RttSummary>,
}

impl Statistics {
    pub fn from_samples(sent: u32, round_trip_times: &[f64]) -> Self {
        let received = round_trip_times.len() as u32;
        let lost = sent.saturating_sub(received);
        let loss_pct = if sent == 0 {
            0.0
        } else {
            (lost as f64 / sent as f64 * 100.0 * 100.0).round() / 100.0
        };

        let rtt = if round_trip_times.is_empty() {
            None
        } else {
            let min = round_trip_times.iter().cloned().fold(f64::INFINITY, f64::min);
            let max = round_trip_times.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
            let avg = round_trip_times.iter().sum::<f64>() / round_trip_times.len() as f64;
            Some(RttSummary {
                min_ms: min.round() as i64,
                max_ms: max.round() as i64,
                avg_ms: avg.round() as i64,
            })
        };

        Statistics { sent, received, lost, loss_pct, rtt }
    }
}

/// What a finished campaign leaves behind besides its report lines.
#[derive(Debug, Clone, PartialEq)]
pub struct CampaignReport {
    pub host: String,
    /// `None` when the host never resolved.
    pub address: Option<Ipv4Addr>,
    /// `None` when no probe was attempted.
    pub statistics: Option<Statistics>,
    /// True when a denied socket cut the probe sequence short.
    pub aborted: bool,
}

/// A bounded run of echo probes against one host. Probes run one after
/// another, each on its own freshly opened socket.
#[derive(Debug, Clone, Copy)]
pub struct Campaign {
    timeout: Duration,
    count: u16,
    interval: Duration,
    identifier: u16, // Used as 'identifier' word to match echo requests/replies
}

impl Campaign {
    pub fn new(timeout: Duration, count: u16) -> Self {
        Campaign { timeout, count, interval: Duration::from_millis(0), identifier: random::<u16>() }
    }

    pub fn from_config(config: &PingConfig) -> Self {
        Campaign::new(config.timeout, config.count).with_interval(config.interval)
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_identifier(mut self, identifier: u16) -> Self {
        self.identifier = identifier;
        self
    }

    pub fn identifier(&self) -> u16 {
        self.identifier
    }

    pub fn run<N, S>(&self, host: &str, network: &N, sink: &mut S) -> CampaignReport
    where
        N: Network + ?Sized,
        S: Sink + ?Sized,
    {
        let mut phase = Phase::Idle;
        let mut advance = |next: Phase| {
            debug!("{}: {:?} -> {:?}", host, phase, next);
            phase = next;
        };

        advance(Phase::Resolving);
        let address = match network.resolve(host) {
            Ok(address) => address,
            Err(source) => {
                advance(Phase::ResolutionFailed);
                let error = PingError::Resolution { host: host.to_string(), source };
                sink.report(&Report::ResolutionFailed { host: host.to_string(), error: error.to_string() });
                advance(Phase::Done);
                return CampaignReport { host: host.to_string(), address: None, statistics: None, aborted: false };
            }
        };

        advance(Phase::Resolved);
        let destination = Destination { host: host.to_string(), address };
        sink.report(&Report::Contacting { host: host.to_string(), address, bytes: PROBE_DATAGRAM_LEN });

        advance(Phase::ProbingLoop);
        let mut round_trip_times = Vec::new();
        let mut sent = 0u32;
        let mut aborted = false;

        for sequence_number in 0..self.count {
            if sequence_number > 0 && self.interval > Duration::from_millis(0) {
                thread::sleep(self.interval);
            }

            sent += 1;
            let outcome = self.probe(network, &destination, sequence_number);

            match outcome {
                ProbeOutcome::Reply(result) => {
                    round_trip_times.push(result.round_trip_time_ms);
                    sink.report(&Report::Reply { address, result });
                }
                ProbeOutcome::Timeout => {
                    sink.report(&Report::Timeout { timeout_ms: self.timeout.as_millis() });
                }
                ProbeOutcome::ChecksumMismatch => {
                    sink.report(&Report::ChecksumError);
                }
                ProbeOutcome::Transport(e) if e.is_fatal() => {
                    warn!("{}: {}, skipping remaining probes", host, e);
                    sink.report(&Report::PermissionDenied { error: e.to_string() });
                    aborted = true;
                    break;
                }
                ProbeOutcome::Transport(e) => {
                    sink.report(&Report::TransportError { error: e.to_string() });
                }
            }
        }

        advance(Phase::Reporting);
        let statistics = Statistics::from_samples(sent, &round_trip_times);
        sink.report(&Report::Summary { address, statistics: statistics.clone() });
        advance(Phase::Done);

        CampaignReport { host: host.to_string(), address: Some(address), statistics: Some(statistics), aborted }
    }

    // The socket lives exactly as long as this call
    fn probe<N: Network + ?Sized>(&self, network: &N, destination: &Destination, sequence_number: u16) -> ProbeOutcome {
        match network.open(self.timeout) {
            Ok(mut socket) => {
                session::send_and_receive(&mut socket, destination, self.identifier, sequence_number, self.timeout)
            }
            Err(e) => ProbeOutcome::from_error(PingError::from_io(e)),
        }
    }
}

/// Pings `host` over the system's raw sockets, reporting to `sink`.
pub fn run<S: Sink + ?Sized>(host: &str, timeout_ms: u64, probe_count: u16, sink: &mut S) -> CampaignReport {
    Campaign::new(Duration::from_millis(timeout_ms), probe_count).run(host, &RawNetwork, sink)
}
