#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

mod output;

use anyhow::Context;
use clap::{ArgAction, Parser};
use pcap_conversations_lib::config::DEFAULT_RECORD_SEPARATOR;
use pcap_conversations_lib::{Config, analyze_file};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Reassembles HTTP request/response conversations from a packet capture
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// pcap/pcapng file to analyze
    file: PathBuf,

    /// Port of the HTTP service; decides which side is the request
    #[arg(short, long, default_value_t = 80)]
    port: u16,

    /// Port counted as DNS traffic
    #[arg(long, default_value_t = 53)]
    dns_port: u16,

    /// Print the report as formatted JSON
    #[arg(short, long, action = ArgAction::SetTrue)]
    json: bool,
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new("info"));
    // stdout carries the report
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(env_filter)
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();

    let args = Args::parse();
    let config = Config::new(args.port, args.dns_port, DEFAULT_RECORD_SEPARATOR)
        .context("Invalid arguments")?;

    let report = analyze_file(&args.file, &config)
        .with_context(|| format!("Failed to analyze {}", args.file.display()))?;
    info!(
        conversations = report.conversations.len(),
        "Analysis finished"
    );

    if args.json {
        println!("{}", output::report_as_json(&report)?);
    } else {
        print!("{}", output::ReportView(&report));
    }
    Ok(())
}
