use std::net::Ipv4Addr;
use std::time::{Duration, Instant};

use log::trace;

use crate::error::{PingError, Result};
use crate::packet::{self, IcmpMessage, ICMP_HEADER_LEN};
use crate::transport::EchoSocket;
use crate::{checksum, clock};

const RECV_BUFFER_LEN: usize = 4096;

/// A host name together with the address it resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub host: String,
    pub address: Ipv4Addr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProbeResult {
    pub round_trip_time_ms: f64,
    pub response_header: IcmpMessage,
}

/// How one echo exchange ended. Timeouts and corrupt replies are ordinary
/// network conditions, so they are variants rather than errors.
#[derive(Debug)]
pub enum ProbeOutcome {
    Reply(ProbeResult),
    Timeout,
    ChecksumMismatch,
    Transport(PingError),
}

impl ProbeOutcome {
    pub fn from_error(e: PingError) -> Self {
        match e {
            PingError::Timeout => ProbeOutcome::Timeout,
            PingError::Checksum => ProbeOutcome::ChecksumMismatch,
            other => ProbeOutcome::Transport(other),
        }
    }
}

/// Sends one echo request and waits up to `timeout` for the matching reply.
pub fn send_and_receive<S: EchoSocket + ?Sized>(
    socket: &mut S,
    destination: &Destination,
    client_identifier: u16,
    sequence_number: u16,
    timeout: Duration,
) -> ProbeOutcome {
    match exchange(socket, destination, client_identifier, sequence_number, timeout) {
        Ok(result) => ProbeOutcome::Reply(result),
        Err(e) => ProbeOutcome::from_error(e),
    }
}

fn exchange<S: EchoSocket + ?Sized>(
    socket: &mut S,
    destination: &Destination,
    client_identifier: u16,
    sequence_number: u16,
    timeout: Duration,
) -> Result<ProbeResult> {
    let request = packet::build_echo_request(client_identifier, sequence_number, clock::this_instant())?;
    socket.send_to(&request, destination.address)?;

    let deadline = Instant::now() + timeout;
    let mut buf = [0u8; RECV_BUFFER_LEN];

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining == Duration::from_secs(0) {
            return Err(PingError::Timeout);
        }

        socket.set_read_timeout(remaining)?;
        let len = socket.recv(&mut buf)?;
        let received_at = clock::this_instant();

        // The IPv4 header precedes the ICMP message
        let message = packet::strip_ipv4_header(&buf[..len])?;
        checksum::verify(message)?;

        let header = packet::decode_header(message)?;
        if header.identifier != client_identifier || header.sequence_number != sequence_number {
            trace!(
                "skipping ICMP message id={} seq={} while waiting for id={} seq={}",
                header.identifier,
                header.sequence_number,
                client_identifier,
                sequence_number
            );
            continue;
        }

        let sent_at = packet::decode_timestamp(&message[ICMP_HEADER_LEN..])?;

        return Ok(ProbeResult {
            round_trip_time_ms: clock::elapsed_ms(sent_at, received_at),
            response_header: header,
        });
    }
}
