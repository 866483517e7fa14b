//! This crate decodes the binary payloads of Windows kernel trace events into
//! [`etwvalue`] trees.
//!
//! # Decoding a payload
//!
//! A payload is identified by its provider, opcode and version, and by the
//! pointer width of the process that emitted it. [`decode_payload()`] picks
//! the matching layout and decodes it field by field with a [`Decoder`]:
//!
//! ```
//! use etwdecode::{decode_payload, Payload};
//!
//! // A 64-bit SysClExit event carrying an NTSTATUS.
//! let payload = 0xC000_0005u32.to_ne_bytes();
//! let decoded = decode_payload("ce1dbfb4-137e-4da6-87b0-3f59aa102cbc", 2, 52, true, &payload)
//!     .unwrap();
//!
//! assert_eq!(decoded.name(), "SysClExit");
//! assert_eq!(decoded.fields().unwrap().field_as_uint("SysCallNtStatus"), Some(0xC000_0005));
//! ```
//!
//! A layout only succeeds if it consumes the whole payload. Bytes left over
//! mean the wrong layout was picked, and are reported as an error.
//!
//! # Parsing records
//!
//! [`RecordParser`] adds the record header to each decoded payload and hands
//! the resulting [`Event`] to an observer. Records that fail to decode are
//! dropped and logged through the `log` facade; this crate never installs a
//! logger itself.
//!
//! [`etwvalue`]: ../etwvalue/index.html
//! [`decode_payload()`]: providers/fn.decode_payload.html
//! [`Decoder`]: decoder/struct.Decoder.html
//! [`RecordParser`]: record/struct.RecordParser.html
//! [`Event`]: event/struct.Event.html

pub mod decoder;
pub mod error;
pub mod event;
pub mod fields;
pub mod providers;
pub mod record;

pub mod testing_common;

pub use crate::decoder::{Decoder, Scalar, WCHAR_SIZE};
pub use crate::error::{DecodeError, Result};
pub use crate::event::Event;
pub use crate::providers::{decode_payload, decode_provider_payload, Payload, Provider};
pub use crate::record::{assemble_event, ParseStats, RawRecord, RecordHeader, RecordParser};
