//! Cyclic redundancy check by mod-2 long division over individual bits.

use std::fmt;
use std::str::FromStr;

use crate::error::{PingError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BitString(Vec<bool>);

impl BitString {
    pub fn zeros(len: usize) -> Self {
        BitString(vec![false; len])
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bits(&self) -> &[bool] {
        &self.0
    }

    pub fn concat(&self, other: &BitString) -> BitString {
        let mut bits = self.0.clone();
        bits.extend_from_slice(&other.0);
        BitString(bits)
    }

    fn xor_at(&mut self, other: &BitString, offset: usize) {
        for (k, &bit) in other.0.iter().enumerate() {
            self.0[offset + k] ^= bit;
        }
    }
}

impl FromStr for BitString {
    type Err = PingError;

    fn from_str(s: &str) -> Result<Self> {
        s.chars()
            .map(|c| match c {
                '0' => Ok(false),
                '1' => Ok(true),
                other => Err(PingError::InvalidBits(other)),
            })
            .collect::<Result<Vec<bool>>>()
            .map(BitString)
    }
}

impl fmt::Display for BitString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &bit in &self.0 {
            f.write_str(if bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

/// Divides `data` (already padded or carrying its check bits) by `generator`
/// and returns the trailing `generator.len() - 1` bits.
pub fn remainder(data: &BitString, generator: &BitString) -> Result<BitString> {
    if generator.len() < 2 {
        return Err(PingError::InvalidConfig("CRC generator needs at least 2 bits".into()));
    }
    if data.len() < generator.len() {
        return Err(PingError::InvalidConfig("CRC data is shorter than the generator".into()));
    }

    let mut work = data.clone();
    for i in 0..=(data.len() - generator.len()) {
        if work.0[i] {
            work.xor_at(generator, i);
        }
    }

    Ok(BitString(work.0[data.len() - generator.len() + 1..].to_vec()))
}

/// The check bits to append to `data`.
pub fn encode(data: &BitString, generator: &BitString) -> Result<BitString> {
    let padding = BitString::zeros(generator.len().saturating_sub(1));
    remainder(&data.concat(&padding), generator)
}

/// True when `codeword` (data followed by its check bits) divides evenly.
pub fn check(codeword: &BitString, generator: &BitString) -> Result<bool> {
    Ok(remainder(codeword, generator)?.0.iter().all(|&bit| !bit))
}
