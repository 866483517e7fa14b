use std::error::Error;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Parser;
use etwdecode::{assemble_event, decode_provider_payload, Payload, Provider, RecordHeader};
use log::debug;

/// Decodes the raw payload of a single kernel trace event and prints it,
/// together with the record header, as JSON.
#[derive(Parser, Debug)]
struct Opt {
    /// Provider GUID, or one of `image`, `perfinfo`, `thread`, `process`
    #[clap(long = "provider")]
    provider: Provider,
    #[clap(long = "opcode")]
    opcode: u8,
    /// Version of the event layout
    #[clap(long = "version")]
    event_version: u8,
    /// The payload was written by a 32-bit process
    #[clap(long = "32-bit")]
    is_32_bit: bool,
    #[clap(long = "timestamp", default_value_t = 0)]
    timestamp: u64,
    #[clap(long = "pid", default_value_t = 0)]
    process_id: u32,
    #[clap(long = "tid", default_value_t = 0)]
    thread_id: u32,
    #[clap(long = "cpu", default_value_t = 0)]
    processor_number: u16,
    /// Print the event on a single line
    #[clap(long = "compact")]
    compact: bool,
    /// File holding the payload bytes, exactly as they were recorded
    payload_file: PathBuf,
}

fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    env_logger::init();

    let opt = Opt::parse();

    let payload = std::fs::read(&opt.payload_file)?;
    debug!(
        "decoding {} bytes from {} as {} opcode {} version {}",
        payload.len(),
        opt.payload_file.display(),
        opt.provider,
        opt.opcode,
        opt.event_version
    );

    let header = RecordHeader {
        provider_id: opt.provider.id().to_string(),
        version: opt.event_version,
        opcode: opt.opcode,
        is_64_bit: !opt.is_32_bit,
        process_id: opt.process_id,
        thread_id: opt.thread_id,
        processor_number: opt.processor_number,
        timestamp: opt.timestamp,
    };

    let decoded = decode_provider_payload(
        opt.provider,
        header.version,
        header.opcode,
        header.is_64_bit,
        &payload,
    )?;

    let event = match decoded {
        Payload::Decoded { name, fields } => {
            assemble_event(&header, opt.provider.name(), name, fields)
        }
        Payload::Unsupported { name } => {
            return Err(format!(
                "{} events of provider {} are recognized but not decoded",
                name, opt.provider
            )
            .into());
        }
    };

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if opt.compact {
        serde_json::to_writer(&mut out, &event)?;
    } else {
        serde_json::to_writer_pretty(&mut out, &event)?;
    }
    writeln!(out)?;
    out.flush()?;

    Ok(())
}
