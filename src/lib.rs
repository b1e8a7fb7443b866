//! ICMP echo ("ping") over raw IPv4 sockets, plus the small pieces it is built
//! from: the Internet checksum, the echo packet codec, and a bit-level CRC.

pub mod campaign;
pub mod checksum;
pub mod clock;
pub mod config;
pub mod crc;
pub mod error;
pub mod packet;
pub mod report;
pub mod session;
pub mod transport;

pub use campaign::{Campaign, CampaignReport, RttSummary, Statistics};
pub use error::{PingError, Result};
pub use report::{Report, Sink, StdoutSink};
pub use session::{Destination, ProbeOutcome, ProbeResult};
pub use transport::{EchoSocket, Network, RawNetwork};
