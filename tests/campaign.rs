use std::cell::Cell;
use std::collections::VecDeque;
use std::io;
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::time::Duration;

use pingkit::packet::{decode_header, ECHO_REQUEST, IPV4_HEADER_LEN};
use pingkit::{Campaign, EchoSocket, Network, Report, RttSummary};

#[derive(Clone, Copy, PartialEq)]
enum Behaviour {
    /// Hands back exactly what was sent, behind an IPv4 header.
    Loopback,
    /// Never answers.
    Silent,
    /// Echoes, but damages the checksum of one sequence number.
    CorruptSequence(u16),
    /// Answers with datagrams too short to hold an ICMP header.
    Truncated,
}

struct FakeNetwork {
    behaviour: Behaviour,
    resolves: bool,
    /// Sockets that may be opened before the kernel starts refusing them.
    allowed_opens: usize,
    opened: Rc<Cell<usize>>,
    closed: Rc<Cell<usize>>,
}

impl FakeNetwork {
    fn new(behaviour: Behaviour) -> Self {
        FakeNetwork {
            behaviour,
            resolves: true,
            allowed_opens: usize::MAX,
            opened: Rc::new(Cell::new(0)),
            closed: Rc::new(Cell::new(0)),
        }
    }
}

struct FakeSocket {
    behaviour: Behaviour,
    inbox: VecDeque<Vec<u8>>,
    closed: Rc<Cell<usize>>,
}

impl Network for FakeNetwork {
    type Socket = FakeSocket;

    fn resolve(&self, host: &str) -> io::Result<Ipv4Addr> {
        if self.resolves {
            Ok(Ipv4Addr::new(192, 0, 2, 7))
        } else {
            Err(io::Error::new(io::ErrorKind::NotFound, format!("unknown host {}", host)))
        }
    }

    fn open(&self, _timeout: Duration) -> io::Result<FakeSocket> {
        if self.opened.get() >= self.allowed_opens {
            return Err(io::Error::new(io::ErrorKind::PermissionDenied, "Operation not permitted"));
        }
        self.opened.set(self.opened.get() + 1);

        Ok(FakeSocket { behaviour: self.behaviour, inbox: VecDeque::new(), closed: self.closed.clone() })
    }
}

impl EchoSocket for FakeSocket {
    fn set_read_timeout(&mut self, _timeout: Duration) -> io::Result<()> {
        Ok(())
    }

    fn send_to(&mut self, packet: &[u8], _destination: Ipv4Addr) -> io::Result<usize> {
        let mut datagram = vec![0u8; IPV4_HEADER_LEN];
        datagram[0] = 0x45;
        datagram.extend_from_slice(packet);

        let sequence = decode_header(packet).unwrap().sequence_number;
        match self.behaviour {
            Behaviour::Loopback => self.inbox.push_back(datagram),
            Behaviour::Silent => {}
            Behaviour::CorruptSequence(bad) => {
                if sequence == bad {
                    datagram[IPV4_HEADER_LEN + 4] ^= 0x5A;
                }
                self.inbox.push_back(datagram);
            }
            Behaviour::Truncated => self.inbox.push_back(datagram[..IPV4_HEADER_LEN + 3].to_vec()),
        }

        Ok(packet.len())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inbox.pop_front() {
            Some(datagram) => {
                buf[..datagram.len()].copy_from_slice(&datagram);
                Ok(datagram.len())
            }
            None => Err(io::Error::new(io::ErrorKind::WouldBlock, "Resource temporarily unavailable")),
        }
    }
}

impl Drop for FakeSocket {
    fn drop(&mut self) {
        self.closed.set(self.closed.get() + 1);
    }
}

fn run(network: &FakeNetwork, timeout_ms: u64, count: u16) -> (pingkit::CampaignReport, Vec<Report>) {
    let mut reports: Vec<Report> = Vec::new();
    let outcome = Campaign::new(Duration::from_millis(timeout_ms), count)
        .with_identifier(0x1F2E)
        .run("target.test", network, &mut reports);
    (outcome, reports)
}

#[test]
fn loopback_answers_every_probe() {
    let network = FakeNetwork::new(Behaviour::Loopback);
    let (outcome, reports) = run(&network, 1000, 4);

    let stats = outcome.statistics.unwrap();
    assert_eq!(stats.sent, 4);
    assert_eq!(stats.received, 4);
    assert_eq!(stats.lost, 0);
    assert_eq!(stats.loss_pct, 0.0);
    assert!(stats.rtt.is_some());
    assert!(!outcome.aborted);
    assert_eq!(outcome.address, Some(Ipv4Addr::new(192, 0, 2, 7)));

    let replies: Vec<_> = reports
        .iter()
        .filter_map(|r| match r {
            Report::Reply { result, .. } => Some(result),
            _ => None,
        })
        .collect();
    assert_eq!(replies.len(), 4);
    for (seq, result) in replies.iter().enumerate() {
        assert!(result.round_trip_time_ms >= 0.0);
        assert_eq!(result.response_header.sequence_number, seq as u16);
        assert_eq!(result.response_header.identifier, 0x1F2E);
        assert_eq!(result.response_header.type_code(), ECHO_REQUEST);
    }

    assert_eq!(
        reports[0],
        Report::Contacting { host: "target.test".to_string(), address: Ipv4Addr::new(192, 0, 2, 7), bytes: 36 }
    );
    assert_eq!(network.opened.get(), 4);
    assert_eq!(network.closed.get(), 4);
}

#[test]
fn silent_network_loses_everything() {
    let network = FakeNetwork::new(Behaviour::Silent);
    let (outcome, reports) = run(&network, 50, 3);

    let stats = outcome.statistics.clone().unwrap();
    assert_eq!((stats.sent, stats.received, stats.lost), (3, 0, 3));
    assert_eq!(stats.loss_pct, 100.0);
    assert_eq!(stats.rtt, None);

    let timeouts = reports.iter().filter(|r| **r == Report::Timeout { timeout_ms: 50 }).count();
    assert_eq!(timeouts, 3);

    let lines: Vec<String> = reports.iter().flat_map(|r| r.lines()).collect();
    assert!(lines.iter().any(|l| l == "Request timed out after 50ms"));
    assert!(!lines.iter().any(|l| l.contains("round trip times")));
    assert_eq!(network.closed.get(), 3);
}

#[test]
fn corrupted_reply_is_a_loss_and_the_campaign_continues() {
    let network = FakeNetwork::new(Behaviour::CorruptSequence(1));
    let (outcome, reports) = run(&network, 1000, 3);

    assert!(matches!(reports[1], Report::Reply { .. }));
    assert_eq!(reports[2], Report::ChecksumError);
    assert!(matches!(reports[3], Report::Reply { .. }));
    assert!(matches!(reports[4], Report::Summary { .. }));

    let stats = outcome.statistics.unwrap();
    assert_eq!((stats.sent, stats.received, stats.lost), (3, 2, 1));
    assert_eq!(stats.loss_pct, 33.33);
}

#[test]
fn unresolvable_host_sends_nothing() {
    let mut network = FakeNetwork::new(Behaviour::Loopback);
    network.resolves = false;

    let mut lines = Vec::new();
    let outcome = Campaign::new(Duration::from_millis(100), 4)
        .run("nowhere.invalid", &network, &mut |r: &Report| lines.extend(r.lines()));

    assert_eq!(network.opened.get(), 0);
    assert_eq!(outcome.address, None);
    assert_eq!(outcome.statistics, None);
    assert_eq!(lines.len(), 3);
    assert!(lines[0].contains("nowhere.invalid"));
    assert_eq!(lines[1], "Could not find host nowhere.invalid.");
    assert_eq!(lines[2], "Please check name and try again.");
}

#[test]
fn permission_denied_aborts_remaining_probes() {
    let mut network = FakeNetwork::new(Behaviour::Loopback);
    network.allowed_opens = 1;

    let (outcome, reports) = run(&network, 1000, 4);

    assert!(outcome.aborted);
    assert_eq!(reports.len(), 4);
    assert!(matches!(reports[1], Report::Reply { .. }));
    assert!(matches!(reports[2], Report::PermissionDenied { .. }));

    let stats = outcome.statistics.unwrap();
    assert_eq!((stats.sent, stats.received, stats.lost), (2, 1, 1));
    assert_eq!(stats.loss_pct, 50.0);
    assert!(stats.rtt.is_some());
    assert_eq!(network.closed.get(), 1);
}

#[test]
fn denied_first_probe_reports_no_rtt() {
    let mut network = FakeNetwork::new(Behaviour::Loopback);
    network.allowed_opens = 0;

    let (outcome, reports) = run(&network, 1000, 4);

    let lines = reports[1].lines();
    assert!(lines[0].starts_with("Permission denied"));
    assert!(lines[1].contains("root"));

    let stats = outcome.statistics.unwrap();
    assert_eq!((stats.sent, stats.received, stats.lost), (1, 0, 1));
    assert_eq!(stats.rtt, None);
}

#[test]
fn malformed_replies_are_transport_errors() {
    let network = FakeNetwork::new(Behaviour::Truncated);
    let (outcome, reports) = run(&network, 1000, 2);

    let errors: Vec<_> = reports
        .iter()
        .filter(|r| matches!(r, Report::TransportError { .. }))
        .collect();
    assert_eq!(errors.len(), 2);
    assert!(errors[0].to_string().starts_with("Transport error: malformed packet"));
    assert!(!outcome.aborted);
    assert_eq!(outcome.statistics.unwrap().received, 0);
}

#[test]
fn rtt_summary_is_rounded() {
    let stats = pingkit::Statistics::from_samples(4, &[0.4, 0.6, 1.5, 2.49]);
    assert_eq!(stats.rtt, Some(RttSummary { min_ms: 0, max_ms: 2, avg_ms: 1 }));
}
