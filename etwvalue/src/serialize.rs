use crate::array::ArrayValue;
use crate::structure::StructValue;
use crate::value::Value;
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Bool(v) => serializer.serialize_bool(*v),
            Value::Char(v) => serializer.serialize_i8(*v),
            Value::UChar(v) => serializer.serialize_u8(*v),
            Value::Short(v) => serializer.serialize_i16(*v),
            Value::UShort(v) => serializer.serialize_u16(*v),
            Value::Int(v) => serializer.serialize_i32(*v),
            Value::UInt(v) => serializer.serialize_u32(*v),
            Value::Long(v) => serializer.serialize_i64(*v),
            Value::ULong(v) => serializer.serialize_u64(*v),
            Value::Float(v) => serializer.serialize_f32(*v),
            Value::Double(v) => serializer.serialize_f64(*v),
            Value::String(s) | Value::WString(s) => serializer.serialize_str(s),
            Value::Struct(s) => s.serialize(serializer),
            Value::Array(a) => a.serialize(serializer),
        }
    }
}

// Fields are emitted in insertion order.
impl Serialize for StructValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.field_count()))?;
        for (name, value) in self.iter() {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

impl Serialize for ArrayValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.len()))?;
        for element in self {
            seq.serialize_element(element)?;
        }
        seq.end()
    }
}
