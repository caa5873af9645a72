//! # shm-reader
//!
//! Dump the time-series records of a producer-owned shared memory segment.
//!
//! ```bash
//! # Print the header and every record of /test_shm
//! shm-reader
//!
//! # A single record, as JSON
//! shm-reader /sensor_feed --index 4 --json
//!
//! # Accept inconsistent headers, with debug logging
//! shm-reader /sensor_feed --lenient -v
//! ```

use clap::Parser;
use shmseries_core::{AttachOptions, Record, SegmentReader, Validation};
use tracing::{error, Level};
use tracing_subscriber::EnvFilter;

/// Read-only dump of a shared memory time-series segment
#[derive(Parser, Debug)]
#[command(name = "shm-reader")]
#[command(version)]
#[command(about = "Dump the records of a shared memory time-series segment")]
struct Args {
    /// Segment name
    #[arg(env = "SHM_SEGMENT", default_value = "/test_shm")]
    segment: String,

    /// Read a single record instead of the whole buffer
    #[arg(short, long, allow_negative_numbers = true)]
    index: Option<i64>,

    /// Accept headers that fail validation
    #[arg(long)]
    lenient: bool,

    /// Print records as JSON lines
    #[arg(long)]
    json: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn attach_options(&self) -> AttachOptions {
        let validation = if self.lenient {
            Validation::Lenient
        } else {
            Validation::Strict
        };
        AttachOptions::new().validation(validation)
    }
}

fn main() {
    let args = Args::parse();
    setup_tracing(&args);

    if let Err(e) = run(&args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut reader = SegmentReader::attach_with(&args.segment, args.attach_options())?;

    let result = dump(&reader, args);
    reader.detach();
    result
}

fn dump(reader: &SegmentReader, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let header = reader.header().ok_or("reader detached")?;

    if args.json {
        println!("{}", serde_json::to_string(header)?);
    } else {
        println!(
            "Header - n: {}, start_ts: {}, interval: {}, limit: {}",
            header.n, header.start_ts, header.interval, header.limit
        );
    }

    match args.index {
        Some(index) => print_record(index, &reader.read(index)?, args.json)?,
        None => {
            for (i, record) in reader.records()?.enumerate() {
                print_record(i as i64, &record?, args.json)?;
            }
        }
    }
    Ok(())
}

fn print_record(index: i64, record: &Record, json: bool) -> Result<(), serde_json::Error> {
    if json {
        println!("{}", serde_json::to_string(record)?);
    } else {
        println!("Index {}: {{ts: {}, v: {}}}", index, record.ts, record.v);
    }
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments.
fn setup_tracing(args: &Args) {
    let level = if args.verbose { Level::DEBUG } else { Level::INFO };

    let filter = EnvFilter::from_default_env().add_directive(level.into());

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    }
}
