//! Helpers that decode one named field into a `StructValue`.
//!
//! A helper either adds exactly one field and advances the decoder past it,
//! or fails without touching the decoder or the struct.

use crate::decoder::{Decoder, Scalar};
use crate::error::{DecodeError, Result};
use etwvalue::{StructValue, Value};

/// Something that can be decoded as the value of a single field.
pub trait FieldType {
    fn decode_value(decoder: &mut Decoder<'_>) -> Result<Value>;
}

macro_rules! impl_field_type_for_scalar {
    ($($ty:ty),*) => {
        $(
            impl FieldType for $ty {
                #[inline]
                fn decode_value(decoder: &mut Decoder<'_>) -> Result<Value> {
                    decoder.decode::<$ty>()
                }
            }
        )*
    };
}

impl_field_type_for_scalar!(bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

/// NUL-terminated narrow string.
pub enum NarrowString {}

/// NUL-terminated string of host wide characters.
pub enum WideString {}

/// NUL-terminated string of 2-byte code units.
pub enum W16String {}

impl FieldType for NarrowString {
    fn decode_value(decoder: &mut Decoder<'_>) -> Result<Value> {
        decoder.decode_string()
    }
}

impl FieldType for WideString {
    fn decode_value(decoder: &mut Decoder<'_>) -> Result<Value> {
        decoder.decode_wstring()
    }
}

impl FieldType for W16String {
    fn decode_value(decoder: &mut Decoder<'_>) -> Result<Value> {
        decoder.decode_w16_string()
    }
}

fn ensure_absent(name: &str, fields: &StructValue) -> Result<()> {
    if fields.has_field(name) {
        Err(DecodeError::DuplicateField(name.to_string()))
    } else {
        Ok(())
    }
}

fn insert(name: &str, value: Value, fields: &mut StructValue) -> Result<()> {
    fields
        .add_field(name, value)
        .map_err(|_| DecodeError::DuplicateField(name.to_string()))
}

pub fn decode_field<T: FieldType>(
    name: &str,
    decoder: &mut Decoder<'_>,
    fields: &mut StructValue,
) -> Result<()> {
    ensure_absent(name, fields)?;
    let value = T::decode_value(decoder)?;
    insert(name, value, fields)
}

pub fn decode_array_field<T: Scalar>(
    name: &str,
    length: usize,
    decoder: &mut Decoder<'_>,
    fields: &mut StructValue,
) -> Result<()> {
    ensure_absent(name, fields)?;
    let array = decoder.decode_array::<T>(length)?;
    insert(name, array.into(), fields)
}

/// Decodes a pointer-sized unsigned integer: a `ULong` for 64-bit payloads,
/// a `UInt` otherwise.
pub fn decode_uinteger(
    name: &str,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
    fields: &mut StructValue,
) -> Result<()> {
    if is_64_bit {
        decode_field::<u64>(name, decoder, fields)
    } else {
        decode_field::<u32>(name, decoder, fields)
    }
}

/// Decodes a security identifier as a nested struct with the fields `PSid`,
/// `Attributes` and `Sid`.
///
/// Layout: a pointer-sized `PSid`, a 4-byte `Attributes`, 4 bytes of padding
/// on 64-bit payloads, then the SID itself: a revision byte, a sub-authority
/// count byte, a 6-byte identifier authority and 4 bytes per sub-authority.
pub fn decode_sid(
    name: &str,
    is_64_bit: bool,
    decoder: &mut Decoder<'_>,
    fields: &mut StructValue,
) -> Result<()> {
    ensure_absent(name, fields)?;

    // Work on a copy so that a failure halfway through leaves `decoder` as is.
    let mut scratch = decoder.clone();
    let mut sid = StructValue::new();

    decode_uinteger("PSid", is_64_bit, &mut scratch, &mut sid)?;
    decode_field::<u32>("Attributes", &mut scratch, &mut sid)?;
    if is_64_bit {
        scratch.skip(4)?;
    }

    let sub_authority_count = scratch.lookup(1) as usize;
    decode_array_field::<u8>("Sid", 4 * sub_authority_count + 8, &mut scratch, &mut sid)?;

    *decoder = scratch;
    insert(name, sid.into(), fields)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing_common::PayloadBuilder;
    use etwvalue::ArrayValue;

    #[test]
    fn decode_scalar_and_string_fields() {
        let payload = PayloadBuilder::new(true)
            .u32(1234)
            .i8(-3)
            .cstring("svchost.exe")
            .w16string("C:\\Windows")
            .into_bytes();
        let mut decoder = Decoder::new(&payload);
        let mut fields = StructValue::new();

        decode_field::<u32>("ProcessId", &mut decoder, &mut fields).unwrap();
        decode_field::<i8>("WaitMode", &mut decoder, &mut fields).unwrap();
        decode_field::<NarrowString>("ImageFileName", &mut decoder, &mut fields).unwrap();
        decode_field::<W16String>("Directory", &mut decoder, &mut fields).unwrap();

        assert!(decoder.is_empty());
        assert_eq!(fields.get_field("ProcessId"), Some(&Value::UInt(1234)));
        assert_eq!(fields.get_field("WaitMode"), Some(&Value::Char(-3)));
        assert_eq!(
            fields.get_field("ImageFileName"),
            Some(&Value::string("svchost.exe"))
        );
        assert_eq!(
            fields.get_field("Directory"),
            Some(&Value::wstring("C:\\Windows"))
        );
    }

    #[test]
    fn duplicate_field_does_not_consume() {
        let payload = 7u32.to_ne_bytes();
        let mut decoder = Decoder::new(&payload);
        let mut fields = StructValue::new();
        fields.add_field("ProcessId", 1u32).unwrap();

        assert_eq!(
            decode_field::<u32>("ProcessId", &mut decoder, &mut fields),
            Err(DecodeError::DuplicateField("ProcessId".to_string()))
        );
        assert_eq!(decoder.position(), 0);
        assert_eq!(fields.field_as_uint("ProcessId"), Some(1));
    }

    #[test]
    fn failed_field_leaves_struct_untouched() {
        let payload = [1u8, 2];
        let mut decoder = Decoder::new(&payload);
        let mut fields = StructValue::new();

        assert!(decode_field::<u32>("ProcessId", &mut decoder, &mut fields).is_err());
        assert!(decode_array_field::<u16>("Data", 2, &mut decoder, &mut fields).is_err());
        assert!(fields.is_empty());
        assert_eq!(decoder.position(), 0);
    }

    #[test]
    fn decode_array_field_of_bytes() {
        let payload = [9u8, 8, 7];
        let mut decoder = Decoder::new(&payload);
        let mut fields = StructValue::new();

        decode_array_field::<u8>("Bytes", 3, &mut decoder, &mut fields).unwrap();

        let mut expected = ArrayValue::new();
        expected.append_all(&[9u8, 8, 7]);
        assert_eq!(fields.get_field("Bytes"), Some(&Value::Array(expected)));
    }

    #[test]
    fn decode_uinteger_depends_on_pointer_width() {
        let payload = PayloadBuilder::new(false).u32(0xFFFF_0000).into_bytes();
        let mut decoder = Decoder::new(&payload);
        let mut fields = StructValue::new();
        decode_uinteger("Base", false, &mut decoder, &mut fields).unwrap();
        assert_eq!(fields.get_field("Base"), Some(&Value::UInt(0xFFFF_0000)));

        let payload = PayloadBuilder::new(true).u64(0xFFFF_F800_0000_0000).into_bytes();
        let mut decoder = Decoder::new(&payload);
        let mut fields = StructValue::new();
        decode_uinteger("Base", true, &mut decoder, &mut fields).unwrap();
        assert_eq!(
            fields.get_field("Base"),
            Some(&Value::ULong(0xFFFF_F800_0000_0000))
        );
        assert!(decoder.is_empty());
    }

    // S-1-5-21-1-2-3-1001
    const USER_SID: [u8; 28] = [
        1, 5, 0, 0, 0, 0, 0, 5, 21, 0, 0, 0, 1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 0xE9, 3, 0, 0,
    ];

    #[test]
    fn decode_sid_64_bit() {
        let payload = PayloadBuilder::new(true)
            .sid(0xFFFF_A000_1234_5678, 0x10, &USER_SID)
            .u8(0xCC)
            .into_bytes();
        assert_eq!(payload.len(), 8 + 4 + 4 + 28 + 1);

        let mut decoder = Decoder::new(&payload);
        let mut fields = StructValue::new();
        decode_sid("UserSID", true, &mut decoder, &mut fields).unwrap();
        assert_eq!(decoder.remaining_bytes(), 1);

        let sid = fields.get_field("UserSID").unwrap().cast_struct();
        assert_eq!(sid.field_as_ulong("PSid"), Some(0xFFFF_A000_1234_5678));
        assert_eq!(sid.field_as_uint("Attributes"), Some(0x10));

        let mut expected = ArrayValue::new();
        expected.append_all(&USER_SID);
        assert_eq!(sid.get_field("Sid"), Some(&Value::Array(expected)));
    }

    #[test]
    fn decode_sid_32_bit_has_no_padding() {
        let payload = PayloadBuilder::new(false)
            .sid(0x0012_3456, 0, &USER_SID)
            .into_bytes();
        assert_eq!(payload.len(), 4 + 4 + 28);

        let mut decoder = Decoder::new(&payload);
        let mut fields = StructValue::new();
        decode_sid("UserSID", false, &mut decoder, &mut fields).unwrap();
        assert!(decoder.is_empty());

        let sid = fields.get_field("UserSID").unwrap().cast_struct();
        assert_eq!(sid.get_field("PSid"), Some(&Value::UInt(0x0012_3456)));
        assert_eq!(sid.get_field("Sid").unwrap().cast_array().len(), 28);
    }

    #[test]
    fn truncated_sid_consumes_nothing() {
        let payload = PayloadBuilder::new(true)
            .sid(1, 0, &USER_SID)
            .into_bytes();
        let truncated = &payload[..payload.len() - 1];

        let mut decoder = Decoder::new(truncated);
        let mut fields = StructValue::new();
        assert!(decode_sid("UserSID", true, &mut decoder, &mut fields).is_err());
        assert_eq!(decoder.position(), 0);
        assert!(fields.is_empty());
    }
}
