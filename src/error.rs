use std::io;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PingError>;

#[derive(Error, Debug)]
pub enum PingError {
    #[error("could not resolve {host}: {source}")]
    Resolution {
        host: String,
        #[source]
        source: io::Error,
    },

    #[error("computed checksum mismatch")]
    Checksum,

    #[error("timed out waiting for reply")]
    Timeout,

    #[error("malformed packet ({len} bytes)")]
    MalformedPacket { len: usize },

    #[error("codec error: {0}")]
    Codec(#[from] bincode::Error),

    #[error("operation not permitted: {0}")]
    PermissionDenied(#[source] io::Error),

    #[error("I/O error: {0}")]
    Io(#[source] io::Error),

    #[error("invalid bit '{0}', expected '0' or '1'")]
    InvalidBits(char),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl PingError {
    /// Classify an OS-level socket error.
    pub fn from_io(e: io::Error) -> Self {
        match e.kind() {
            io::ErrorKind::PermissionDenied => PingError::PermissionDenied(e),
            io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => PingError::Timeout,
            _ => PingError::Io(e),
        }
    }

    /// Only a denied raw socket ends a campaign early.
    pub fn is_fatal(&self) -> bool {
        matches!(self, PingError::PermissionDenied(_))
    }
}

impl From<io::Error> for PingError {
    fn from(e: io::Error) -> Self {
        PingError::from_io(e)
    }
}
