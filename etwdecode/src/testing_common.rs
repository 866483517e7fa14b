//! Helpers for building raw payloads in tests.

use crate::event::Event;
use crate::providers::{image, perfinfo, process, thread, Provider};
use crate::record::{RawRecord, RecordHeader, RecordParser};
use etwvalue::Value;

/// Writes fields in the same host-order wire format the decoders read.
#[derive(Clone, Debug)]
pub struct PayloadBuilder {
    is_64_bit: bool,
    bytes: Vec<u8>,
}

impl PayloadBuilder {
    pub fn new(is_64_bit: bool) -> PayloadBuilder {
        PayloadBuilder {
            is_64_bit,
            bytes: Vec::new(),
        }
    }

    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn bool(self, v: bool) -> Self {
        self.bytes(&[v as u8])
    }

    pub fn i8(self, v: i8) -> Self {
        self.bytes(&v.to_ne_bytes())
    }

    pub fn u8(self, v: u8) -> Self {
        self.bytes(&[v])
    }

    pub fn i16(self, v: i16) -> Self {
        self.bytes(&v.to_ne_bytes())
    }

    pub fn u16(self, v: u16) -> Self {
        self.bytes(&v.to_ne_bytes())
    }

    pub fn i32(self, v: i32) -> Self {
        self.bytes(&v.to_ne_bytes())
    }

    pub fn u32(self, v: u32) -> Self {
        self.bytes(&v.to_ne_bytes())
    }

    pub fn i64(self, v: i64) -> Self {
        self.bytes(&v.to_ne_bytes())
    }

    pub fn u64(self, v: u64) -> Self {
        self.bytes(&v.to_ne_bytes())
    }

    /// A pointer-sized value: 8 bytes for 64-bit payloads, 4 bytes otherwise.
    pub fn pointer(self, v: u64) -> Self {
        if self.is_64_bit {
            self.u64(v)
        } else {
            assert!(v <= u32::MAX as u64, "{:#x} does not fit a 32-bit pointer", v);
            self.u32(v as u32)
        }
    }

    /// NUL-terminated narrow string.
    pub fn cstring(self, s: &str) -> Self {
        self.bytes(s.as_bytes()).u8(0)
    }

    /// NUL-terminated string of 2-byte code units.
    pub fn w16string(self, s: &str) -> Self {
        let mut builder = self;
        for unit in s.encode_utf16() {
            builder = builder.u16(unit);
        }
        builder.u16(0)
    }

    /// A security identifier in the layout `decode_sid` expects. `sid` holds
    /// the SID proper, starting with its revision byte.
    pub fn sid(self, psid: u64, attributes: u32, sid: &[u8]) -> Self {
        let is_64_bit = self.is_64_bit;
        let builder = self.pointer(psid).u32(attributes);
        let builder = if is_64_bit { builder.u32(0) } else { builder };
        builder.bytes(sid)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

// S-1-5-18
const LOCAL_SYSTEM_SID: [u8; 12] = [1, 1, 0, 0, 0, 0, 0, 5, 18, 0, 0, 0];

struct TestRecord {
    provider: Provider,
    version: u8,
    opcode: u8,
    payload: Vec<u8>,
    operation: Option<&'static str>,
}

fn test_records(is_64_bit: bool) -> Vec<TestRecord> {
    let record = |provider, version, opcode, payload: PayloadBuilder, operation| TestRecord {
        provider,
        version,
        opcode,
        payload: payload.into_bytes(),
        operation,
    };
    let p = || PayloadBuilder::new(is_64_bit);

    let mut records = vec![
        record(
            Provider::Process,
            4,
            process::DC_START,
            p().pointer(0x1000)
                .u32(4)
                .u32(0)
                .u32(0)
                .i32(0)
                .pointer(0x1A_D000)
                .u32(0)
                .sid(0, 0, &LOCAL_SYSTEM_SID)
                .cstring("System")
                .w16string("")
                .w16string("")
                .w16string(""),
            Some("DCStart"),
        ),
        record(
            Provider::Thread,
            3,
            thread::DC_START,
            p().u32(4)
                .u32(8)
                .pointer(1)
                .pointer(2)
                .pointer(3)
                .pointer(4)
                .pointer(5)
                .pointer(6)
                .pointer(7)
                .u32(0)
                .u8(0)
                .u8(0)
                .u8(0)
                .u8(0),
            Some("DCStart"),
        ),
        record(
            Provider::Image,
            3,
            image::LOAD,
            p().pointer(0x7FF8_0000)
                .pointer(0x1_F000)
                .u32(4)
                .u32(0)
                .u32(0)
                .u8(0)
                .u8(0)
                .u16(0)
                .pointer(0x7FF8_0000)
                .u32(0)
                .u32(0)
                .u32(0)
                .u32(0)
                .w16string("\\SystemRoot\\System32\\ntoskrnl.exe"),
            Some("Load"),
        ),
        record(
            Provider::Thread,
            2,
            thread::CSWITCH,
            p().u32(8).u32(0).bytes(&[0; 8]).u32(1).u32(0),
            Some("CSwitch"),
        ),
        record(
            Provider::PerfInfo,
            2,
            perfinfo::SAMPLE_PROF,
            p().pointer(0x7FF8_0040).u32(8).u16(1).u16(0),
            Some("SampleProf"),
        ),
        // Truncated, dropped.
        record(
            Provider::PerfInfo,
            2,
            perfinfo::SYSCALL_EXIT,
            p().u16(0),
            None,
        ),
        // Recognized, skipped.
        record(Provider::Thread, 2, thread::AUTO_BOOST_SET_FLOOR, p().u64(0), None),
        // Trailing garbage, dropped.
        record(
            Provider::Thread,
            2,
            thread::THREAD_SET_NAME,
            p().u32(4).u32(8).w16string("idle").u8(0xFF),
            None,
        ),
    ];

    if is_64_bit {
        records.push(record(
            Provider::PerfInfo,
            2,
            perfinfo::DPC,
            p().u64(10).pointer(0xFFFF_F800_0000_1000),
            Some("DPC"),
        ));
    }

    records
}

/// Encodes a mixed stream of records for every provider, runs it through a
/// `RecordParser` and checks that exactly the well-formed records come out,
/// in order and with their header fields attached.
pub fn run_end_to_end_parse_test(is_64_bit: bool) {
    let records = test_records(is_64_bit);

    let raw_records = records.iter().enumerate().map(|(index, record)| RawRecord {
        header: RecordHeader {
            provider_id: record.provider.id().to_uppercase(),
            version: record.version,
            opcode: record.opcode,
            is_64_bit,
            process_id: 4,
            thread_id: 8,
            processor_number: (index % 4) as u16,
            timestamp: 1_000 + index as u64,
        },
        payload: &record.payload,
    });

    let mut events: Vec<Event> = Vec::new();
    let mut parser = RecordParser::new();
    let stats = parser.parse_records(raw_records, &mut |event: Event| events.push(event));

    let expected: Vec<(u64, &str, &str)> = records
        .iter()
        .enumerate()
        .filter_map(|(index, record)| {
            record
                .operation
                .map(|operation| (1_000 + index as u64, record.provider.name(), operation))
        })
        .collect();

    assert_eq!(stats.delivered, expected.len() as u64);
    assert_eq!(stats.unsupported, 1);
    assert_eq!(stats.dropped, 2);
    assert_eq!(stats.total(), records.len() as u64);
    assert_eq!(events.len(), expected.len());

    for (event, &(timestamp, category, operation)) in events.iter().zip(&expected) {
        assert_eq!(event.timestamp(), timestamp);

        let fields = event.payload().cast_struct();
        assert_eq!(fields.field_as_ulong("timestamp"), Some(timestamp));
        assert_eq!(fields.field_as_uint("process_id"), Some(4));
        assert_eq!(fields.field_as_string("category"), Some(category));
        assert_eq!(fields.field_as_string("operation"), Some(operation));

        let content = fields.get_field("content").unwrap().cast_struct();
        assert!(!content.is_empty());

        // No 64-bit pointers in 32-bit records.
        if !is_64_bit {
            assert!(content.iter().all(|(_, value)| !matches!(value, Value::ULong(_))));
        }
    }
}
