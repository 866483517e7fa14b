//! Payload layouts of the kernel trace providers.
//!
//! A payload is selected by four keys:
//!
//! 1. the provider id, which picks one of the submodules,
//! 2. the opcode, which picks the kind of event within the provider,
//! 3. the version, checked against an explicit list for each opcode since
//!    layouts do not evolve monotonically between versions,
//! 4. the pointer width of the process that produced the event.
//!
//! Each layout is an ordered list of fields. Decoding stops at the first field
//! that fails, and a payload is only accepted if the layout consumed every
//! byte of it.

use crate::decoder::Decoder;
use crate::error::{DecodeError, Result};
use crate::fields::{decode_field, decode_sid, decode_uinteger, FieldType};
use etwvalue::StructValue;
use std::fmt;
use std::str::FromStr;

pub mod image;
pub mod perfinfo;
pub mod process;
pub mod thread;

#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum Provider {
    Image,
    PerfInfo,
    Thread,
    Process,
}

impl Provider {
    pub const ALL: [Provider; 4] = [
        Provider::Image,
        Provider::PerfInfo,
        Provider::Thread,
        Provider::Process,
    ];

    /// The provider GUID, in lowercase without braces.
    pub fn id(self) -> &'static str {
        match self {
            Provider::Image => "2cb15d1d-5fc1-11d2-abe1-00a0c911f518",
            Provider::PerfInfo => "ce1dbfb4-137e-4da6-87b0-3f59aa102cbc",
            Provider::Thread => "3d6fa8d1-fe05-11d0-9dda-00c04fd7ba7c",
            Provider::Process => "3d6fa8d0-fe05-11d0-9dda-00c04fd7ba7c",
        }
    }

    /// The category name used for events of this provider.
    pub fn name(self) -> &'static str {
        match self {
            Provider::Image => "Image",
            Provider::PerfInfo => "PerfInfo",
            Provider::Thread => "Thread",
            Provider::Process => "Process",
        }
    }

    /// Looks a provider up by GUID. The comparison ignores case and
    /// surrounding braces.
    pub fn from_id(id: &str) -> Option<Provider> {
        let id = id.trim_start_matches('{').trim_end_matches('}');
        Provider::ALL
            .iter()
            .copied()
            .find(|p| p.id().eq_ignore_ascii_case(id))
    }

    pub fn from_name(name: &str) -> Option<Provider> {
        Provider::ALL
            .iter()
            .copied()
            .find(|p| p.name().eq_ignore_ascii_case(name))
    }

    pub fn decode(
        self,
        version: u8,
        opcode: u8,
        is_64_bit: bool,
        decoder: &mut Decoder<'_>,
    ) -> Result<Payload> {
        match self {
            Provider::Image => image::decode(opcode, version, is_64_bit, decoder),
            Provider::PerfInfo => perfinfo::decode(opcode, version, is_64_bit, decoder),
            Provider::Thread => thread::decode(opcode, version, is_64_bit, decoder),
            Provider::Process => process::decode(opcode, version, is_64_bit, decoder),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accepts either a provider GUID or a provider name.
impl FromStr for Provider {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Provider> {
        Provider::from_id(s)
            .or_else(|| Provider::from_name(s))
            .ok_or_else(|| DecodeError::UnknownProvider(s.to_string()))
    }
}

/// The outcome of decoding one payload.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Decoded {
        name: &'static str,
        fields: StructValue,
    },
    /// The opcode is known but its layout is not decoded. The payload bytes
    /// were not looked at.
    Unsupported { name: &'static str },
}

impl Payload {
    pub fn name(&self) -> &'static str {
        match *self {
            Payload::Decoded { name, .. } | Payload::Unsupported { name } => name,
        }
    }

    pub fn is_decoded(&self) -> bool {
        matches!(self, Payload::Decoded { .. })
    }

    pub fn fields(&self) -> Option<&StructValue> {
        match self {
            Payload::Decoded { fields, .. } => Some(fields),
            Payload::Unsupported { .. } => None,
        }
    }
}

/// Decodes the payload of one event.
///
/// Fails if the provider, opcode or version is unknown, if a field cannot be
/// decoded, or if bytes are left over once all fields of the layout have been
/// decoded.
pub fn decode_payload(
    provider_id: &str,
    version: u8,
    opcode: u8,
    is_64_bit: bool,
    payload: &[u8],
) -> Result<Payload> {
    let provider = Provider::from_id(provider_id)
        .ok_or_else(|| DecodeError::UnknownProvider(provider_id.to_string()))?;
    decode_provider_payload(provider, version, opcode, is_64_bit, payload)
}

pub fn decode_provider_payload(
    provider: Provider,
    version: u8,
    opcode: u8,
    is_64_bit: bool,
    payload: &[u8],
) -> Result<Payload> {
    let mut decoder = Decoder::new(payload);
    let decoded = provider.decode(version, opcode, is_64_bit, &mut decoder)?;

    if decoded.is_decoded() && !decoder.is_empty() {
        return Err(DecodeError::ResidualBytes {
            remaining: decoder.remaining_bytes(),
        });
    }

    Ok(decoded)
}

/// Accumulates the fields of one layout.
pub(crate) struct Fields<'d, 'a> {
    decoder: &'d mut Decoder<'a>,
    is_64_bit: bool,
    fields: StructValue,
}

impl<'d, 'a> Fields<'d, 'a> {
    pub(crate) fn new(decoder: &'d mut Decoder<'a>, is_64_bit: bool) -> Self {
        Fields {
            decoder,
            is_64_bit,
            fields: StructValue::new(),
        }
    }

    pub(crate) fn field<T: FieldType>(&mut self, name: &str) -> Result<&mut Self> {
        decode_field::<T>(name, self.decoder, &mut self.fields)?;
        Ok(self)
    }

    pub(crate) fn pointer(&mut self, name: &str) -> Result<&mut Self> {
        decode_uinteger(name, self.is_64_bit, self.decoder, &mut self.fields)?;
        Ok(self)
    }

    pub(crate) fn pointers(&mut self, names: &[&str]) -> Result<&mut Self> {
        for name in names {
            self.pointer(name)?;
        }
        Ok(self)
    }

    pub(crate) fn sid(&mut self, name: &str) -> Result<&mut Self> {
        decode_sid(name, self.is_64_bit, self.decoder, &mut self.fields)?;
        Ok(self)
    }

    pub(crate) fn finish(self, name: &'static str) -> Payload {
        Payload::Decoded {
            name,
            fields: self.fields,
        }
    }
}

/// Identifies the layout being decoded, for error reporting.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Layout {
    pub provider: &'static str,
    pub opcode: u8,
    pub version: u8,
}

impl Layout {
    pub(crate) fn unknown_opcode(self) -> DecodeError {
        DecodeError::UnknownOpcode {
            provider: self.provider,
            opcode: self.opcode,
        }
    }

    pub(crate) fn unsupported_version(self) -> DecodeError {
        DecodeError::UnsupportedVersion {
            provider: self.provider,
            opcode: self.opcode,
            version: self.version,
        }
    }

    pub(crate) fn require_version(self, allowed: &[u8]) -> Result<()> {
        if allowed.contains(&self.version) {
            Ok(())
        } else {
            Err(self.unsupported_version())
        }
    }

    pub(crate) fn require_64_bit(self, is_64_bit: bool) -> Result<()> {
        if is_64_bit {
            Ok(())
        } else {
            Err(DecodeError::Requires64Bit {
                provider: self.provider,
                opcode: self.opcode,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing_common::PayloadBuilder;

    #[test]
    fn provider_lookup_by_id() {
        assert_eq!(
            Provider::from_id("2cb15d1d-5fc1-11d2-abe1-00a0c911f518"),
            Some(Provider::Image)
        );
        assert_eq!(
            Provider::from_id("{3D6FA8D0-FE05-11D0-9DDA-00C04FD7BA7C}"),
            Some(Provider::Process)
        );
        assert_eq!(Provider::from_id("3d6fa8d2-fe05-11d0-9dda-00c04fd7ba7c"), None);
        assert_eq!(Provider::from_id("Image"), None);
    }

    #[test]
    fn provider_from_str_accepts_names_and_ids() {
        assert_eq!("perfinfo".parse::<Provider>(), Ok(Provider::PerfInfo));
        assert_eq!("Thread".parse::<Provider>(), Ok(Provider::Thread));
        assert_eq!(
            "ce1dbfb4-137e-4da6-87b0-3f59aa102cbc".parse::<Provider>(),
            Ok(Provider::PerfInfo)
        );
        assert_eq!(
            "DiskIo".parse::<Provider>(),
            Err(DecodeError::UnknownProvider("DiskIo".to_string()))
        );
    }

    #[test]
    fn unknown_provider_is_rejected() {
        assert_eq!(
            decode_payload("00000000-0000-0000-0000-000000000000", 2, 10, true, &[]),
            Err(DecodeError::UnknownProvider(
                "00000000-0000-0000-0000-000000000000".to_string()
            ))
        );
    }

    #[test]
    fn trailing_bytes_fail_the_payload() {
        let payload = PayloadBuilder::new(true)
            .u32(1) // NewThreadId
            .u32(2) // OldThreadId
            .bytes(&[0; 8])
            .u32(3) // NewThreadWaitTime
            .u32(0) // Reserved
            .into_bytes();

        let decoded =
            decode_provider_payload(Provider::Thread, 2, thread::CSWITCH, true, &payload).unwrap();
        assert_eq!(decoded.name(), "CSwitch");

        let mut padded = payload;
        padded.push(0);
        assert_eq!(
            decode_provider_payload(Provider::Thread, 2, thread::CSWITCH, true, &padded),
            Err(DecodeError::ResidualBytes { remaining: 1 })
        );
    }

    #[test]
    fn unsupported_opcode_ignores_payload_bytes() {
        let decoded =
            decode_provider_payload(Provider::Process, 2, process::TERMINATE, true, &[1, 2, 3])
                .unwrap();
        assert_eq!(decoded, Payload::Unsupported { name: "Terminate" });
        assert!(decoded.fields().is_none());
    }
}
