use std::process;
use std::sync::mpsc;
use std::thread;

use colored::*;
use log::debug;

use pingkit::config::{self, PingConfig};
use pingkit::{Campaign, CampaignReport, RawNetwork, Report, Sink, StdoutSink};

fn main() {
    env_logger::Builder::from_default_env().format_timestamp_millis().init();

    let matches = config::app().get_matches();
    let config = match PingConfig::from_matches(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            process::exit(2);
        }
    };
    debug!("{:?}", config);

    let outcomes = if config.parallel {
        run_parallel(&config)
    } else {
        run_sequential(&config)
    };

    // Like ping(8), fail when some host never answered
    let answered = outcomes
        .iter()
        .all(|o| o.statistics.as_ref().map_or(false, |s| s.received > 0));
    if !answered {
        process::exit(1);
    }
}

fn run_sequential(config: &PingConfig) -> Vec<CampaignReport> {
    let mut sink = StdoutSink;

    config.hosts.iter().map(|host| {
        let outcome = Campaign::from_config(config).run(host, &RawNetwork, &mut sink);
        println!(); // Blank line between hosts
        outcome
    }).collect()
}

// One thread per host. Each campaign buffers its reports so the output for a
// host is printed as one block, in argument order.
fn run_parallel(config: &PingConfig) -> Vec<CampaignReport> {
    let (tx, rx) = mpsc::channel();

    for (index, host) in config.hosts.iter().cloned().enumerate() {
        let tx = tx.clone();
        let campaign = Campaign::from_config(config);

        thread::spawn(move || {
            let mut reports: Vec<Report> = Vec::new();
            let outcome = campaign.run(&host, &RawNetwork, &mut reports);
            // The receiver lives until every sender is gone
            let _ = tx.send((index, reports, outcome));
        });
    }
    drop(tx);

    let mut finished: Vec<_> = rx.iter().collect();
    finished.sort_by_key(|(index, _, _)| *index);

    let mut sink = StdoutSink;
    finished.into_iter().map(|(_, reports, outcome)| {
        for report in &reports {
            sink.report(report);
        }
        println!();
        outcome
    }).collect()
}
