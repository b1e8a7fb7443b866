//! Internet checksum (RFC 1071).

use crate::error::{PingError, Result};

/// One's complement of the one's complement sum of `data` taken as big endian
/// words, plus `seed`. An odd trailing byte is padded with a zero byte.
pub fn compute(data: &[u8], seed: u16) -> u16 {
    let mut sum = sum_be_words(data) + seed as u64;
    while sum >> 16 != 0 {
        sum = (sum >> 16) + (sum & 0xFFFF);
    }

    !(sum as u16) // The checksum field should be the ones complement of the sum
}

/// A received message (checksum field included as received) must sum to zero.
pub fn verify(message: &[u8]) -> Result<()> {
    match compute(message, 0) {
        0 => Ok(()),
        _ => Err(PingError::Checksum),
    }
}

/// Sum all words (16 bit chunks) in the given data. Each word is treated as
/// big endian.
fn sum_be_words(data: &[u8]) -> u64 {
    data.chunks(2)
        .map(|word| match *word {
            [wh] => u16::from_be_bytes([wh, 0]),
            [wh, wl] => u16::from_be_bytes([wh, wl]),
            _ => unreachable!(),
        })
        .map(u64::from)
        .sum()
}
