use std::time::Duration;

use clap::{App, AppSettings, Arg, ArgMatches};

use crate::error::{PingError, Result};

pub const DEFAULT_TIMEOUT_MS: u64 = 1000;
pub const DEFAULT_COUNT: u16 = 4;

#[derive(Debug, Clone, PartialEq)]
pub struct PingConfig {
    pub hosts: Vec<String>,
    pub timeout: Duration,
    pub count: u16,
    pub interval: Duration,
    pub parallel: bool,
}

impl Default for PingConfig {
    fn default() -> Self {
        PingConfig {
            hosts: Vec::new(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            count: DEFAULT_COUNT,
            interval: Duration::from_millis(0),
            parallel: false,
        }
    }
}

pub fn app() -> App<'static, 'static> {
    App::new("pingkit")
        .setting(AppSettings::ColoredHelp)
        .version("v0.1")
        .about("Sends ICMP echo requests to each host and summarises the replies.")
        .arg(Arg::with_name("HOST")
            .help("Hostname or IPv4 address")
            .required(true)
            .multiple(true)
            .index(1))
        .arg(Arg::with_name("timeout")
            .help("How long to wait for each reply, in ms or as a duration like 2s (Default 1000)")
            .short("w")
            .long("timeout")
            .takes_value(true))
        .arg(Arg::with_name("count")
            .help("Number of echo requests to send (Default 4)")
            .short("c")
            .long("count")
            .takes_value(true))
        .arg(Arg::with_name("interval")
            .help("How long to wait in between probes (Default 0)")
            .short("i")
            .long("interval")
            .takes_value(true))
        .arg(Arg::with_name("parallel")
            .help("Ping all hosts at once, one thread per host")
            .short("p")
            .long("parallel"))
}

impl PingConfig {
    pub fn from_matches(matches: &ArgMatches) -> Result<Self> {
        let defaults = PingConfig::default();

        let hosts: Vec<String> = matches
            .values_of("HOST")
            .map(|hosts| hosts.map(String::from).collect())
            .unwrap_or_default();
        if hosts.is_empty() {
            return Err(PingError::InvalidConfig("at least one host is required".into()));
        }

        let timeout = match matches.value_of("timeout") {
            Some(t) => parse_duration(t)?,
            None => defaults.timeout,
        };
        if timeout == Duration::from_millis(0) {
            return Err(PingError::InvalidConfig("timeout must be greater than zero".into()));
        }

        let count = match matches.value_of("count") {
            Some(c) => c
                .parse::<u16>()
                .map_err(|e| PingError::InvalidConfig(format!("invalid count '{}': {}", c, e)))?,
            None => defaults.count,
        };
        if count == 0 {
            return Err(PingError::InvalidConfig("count must be at least 1".into()));
        }

        let interval = match matches.value_of("interval") {
            Some(i) => parse_duration(i)?,
            None => defaults.interval,
        };

        Ok(PingConfig {
            hosts,
            timeout,
            count,
            interval,
            parallel: matches.is_present("parallel"),
        })
    }
}

/// A bare number is milliseconds, anything else goes through humantime (ex: 1s, 400ms, 1m).
pub fn parse_duration(value: &str) -> Result<Duration> {
    if let Ok(ms) = value.parse::<u64>() {
        return Ok(Duration::from_millis(ms));
    }

    humantime::parse_duration(value)
        .map_err(|e| PingError::InvalidConfig(format!("invalid duration '{}': {}", value, e)))
}
