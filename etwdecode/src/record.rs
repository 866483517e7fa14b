//! Turns raw trace records into `Event`s.
//!
//! A record whose payload cannot be decoded is dropped. Records of opcodes
//! that are recognized but not decoded are skipped. Neither stops parsing of
//! the following records.

use crate::error::DecodeError;
use crate::event::Event;
use crate::providers::{decode_provider_payload, Payload, Provider};
use etwvalue::{StructValue, Value};
use log::{debug, trace, warn};

/// The fixed part of a trace record, as delivered by the trace session.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordHeader {
    pub provider_id: String,
    pub version: u8,
    pub opcode: u8,
    pub is_64_bit: bool,
    pub process_id: u32,
    pub thread_id: u32,
    pub processor_number: u16,
    pub timestamp: u64,
}

#[derive(Clone, Debug)]
pub struct RawRecord<'a> {
    pub header: RecordHeader,
    pub payload: &'a [u8],
}

/// Wraps a decoded payload together with the record header fields.
pub fn assemble_event(
    header: &RecordHeader,
    category: &str,
    operation: &str,
    content: StructValue,
) -> Event {
    let mut event = StructValue::new();

    // The names are distinct, so none of these can fail.
    let _ = event.add_field("timestamp", header.timestamp);
    let _ = event.add_field("process_id", header.process_id);
    let _ = event.add_field("thread_id", header.thread_id);
    let _ = event.add_field("processor_number", header.processor_number);
    let _ = event.add_field("category", Value::string(category));
    let _ = event.add_field("operation", Value::string(operation));
    let _ = event.add_field("content", content);

    Event::new(header.timestamp, event.into())
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub delivered: u64,
    pub unsupported: u64,
    pub dropped: u64,
}

impl ParseStats {
    pub fn total(&self) -> u64 {
        self.delivered + self.unsupported + self.dropped
    }
}

#[derive(Debug, Default)]
pub struct RecordParser {
    stats: ParseStats,
}

impl RecordParser {
    pub fn new() -> RecordParser {
        RecordParser::default()
    }

    pub fn stats(&self) -> ParseStats {
        self.stats
    }

    /// Decodes one record and hands the resulting event to `observer`.
    ///
    /// `observer` is called at most once, before this function returns.
    pub fn parse_record(&mut self, record: &RawRecord<'_>, observer: &mut dyn FnMut(Event)) {
        let header = &record.header;

        let decoded = Provider::from_id(&header.provider_id)
            .ok_or_else(|| DecodeError::UnknownProvider(header.provider_id.clone()))
            .and_then(|provider| {
                decode_provider_payload(
                    provider,
                    header.version,
                    header.opcode,
                    header.is_64_bit,
                    record.payload,
                )
                .map(|payload| (provider, payload))
            });

        match decoded {
            Ok((provider, Payload::Decoded { name, fields })) => {
                trace!("{}/{} at {}", provider, name, header.timestamp);
                self.stats.delivered += 1;
                observer(assemble_event(header, provider.name(), name, fields));
            }
            Ok((_, Payload::Unsupported { name })) => {
                debug!(
                    "skipping {} record of provider {} (opcode {})",
                    name, header.provider_id, header.opcode
                );
                self.stats.unsupported += 1;
            }
            Err(e) => {
                warn!(
                    "dropping record of provider {} (opcode {}, version {}, {} payload bytes): {}",
                    header.provider_id,
                    header.opcode,
                    header.version,
                    record.payload.len(),
                    e
                );
                self.stats.dropped += 1;
            }
        }
    }

    pub fn parse_records<'a, I>(&mut self, records: I, observer: &mut dyn FnMut(Event)) -> ParseStats
    where
        I: IntoIterator<Item = RawRecord<'a>>,
    {
        for record in records {
            self.parse_record(&record, observer);
        }
        self.stats
    }
}
