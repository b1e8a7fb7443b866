use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::checksum;
use crate::error::{PingError, Result};

/// The kernel hands raw ICMPv4 sockets the whole datagram, IPv4 header included.
pub const IPV4_HEADER_LEN: usize = 20;
pub const ICMP_HEADER_LEN: usize = 8;
pub const TIMESTAMP_LEN: usize = 8;

/// Bytes on the wire for one probe, as the kernel will account for it.
pub const PROBE_DATAGRAM_LEN: usize = IPV4_HEADER_LEN + ICMP_HEADER_LEN + TIMESTAMP_LEN;

// See RFC 792. The order of the fields *is* significant.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpMessage {
    pub message_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence_number: u16,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IcmpTypeCode {
    pub message_type: u8,
    pub code: u8,
}

pub const ECHO_REQUEST: IcmpTypeCode = IcmpTypeCode { message_type: 8, code: 0 };
pub const ECHO_REPLY: IcmpTypeCode = IcmpTypeCode { message_type: 0, code: 0 };

impl IcmpMessage {
    pub fn type_code(&self) -> IcmpTypeCode {
        IcmpTypeCode { message_type: self.message_type, code: self.code }
    }
}

// ICMP uses network byte order and fixed width fields
fn coder() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
        .allow_trailing_bytes()
}

pub fn encode_header(
    message_type: u8,
    code: u8,
    checksum: u16,
    identifier: u16,
    sequence_number: u16,
) -> Result<[u8; ICMP_HEADER_LEN]> {
    let message = IcmpMessage { message_type, code, checksum, identifier, sequence_number };

    let mut header = [0u8; ICMP_HEADER_LEN];
    coder().serialize_into(&mut header[..], &message)?;
    Ok(header)
}

pub fn decode_header(buf: &[u8]) -> Result<IcmpMessage> {
    if buf.len() < ICMP_HEADER_LEN {
        return Err(PingError::MalformedPacket { len: buf.len() });
    }

    Ok(coder().deserialize(&buf[..ICMP_HEADER_LEN])?)
}

pub fn encode_timestamp(timestamp: f64) -> Result<[u8; TIMESTAMP_LEN]> {
    let mut payload = [0u8; TIMESTAMP_LEN];
    coder().serialize_into(&mut payload[..], &timestamp)?;
    Ok(payload)
}

pub fn decode_timestamp(payload: &[u8]) -> Result<f64> {
    if payload.len() < TIMESTAMP_LEN {
        return Err(PingError::MalformedPacket { len: payload.len() });
    }

    Ok(coder().deserialize(&payload[..TIMESTAMP_LEN])?)
}

/// Builds a complete echo request. The checksum covers header and payload with
/// the checksum field zeroed, so the header is packed twice.
pub fn build_echo_request(identifier: u16, sequence_number: u16, timestamp: f64) -> Result<Vec<u8>> {
    let payload = encode_timestamp(timestamp)?;
    let header = |sum| {
        encode_header(ECHO_REQUEST.message_type, ECHO_REQUEST.code, sum, identifier, sequence_number)
    };

    let mut packet = Vec::with_capacity(ICMP_HEADER_LEN + TIMESTAMP_LEN);
    packet.extend_from_slice(&header(0)?);
    packet.extend_from_slice(&payload);

    let sum = checksum::compute(&packet, 0);
    packet[..ICMP_HEADER_LEN].copy_from_slice(&header(sum)?);
    Ok(packet)
}

/// Isolates the ICMP message inside a received IPv4 datagram.
pub fn strip_ipv4_header(datagram: &[u8]) -> Result<&[u8]> {
    if datagram.len() < IPV4_HEADER_LEN + ICMP_HEADER_LEN {
        return Err(PingError::MalformedPacket { len: datagram.len() });
    }

    Ok(&datagram[IPV4_HEADER_LEN..])
}
