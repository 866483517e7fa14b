use crate::array::ArrayValue;
use crate::convert::FromValue;
use crate::structure::StructValue;
use std::convert::TryFrom;
use std::fmt;

/// The tag of a [`Value`]. The tag of a value is fixed when it is created.
#[derive(Clone, Copy, Eq, PartialEq, Hash, Debug)]
pub enum ValueType {
    Bool,
    Char,
    UChar,
    Short,
    UShort,
    Int,
    UInt,
    Long,
    ULong,
    Float,
    Double,
    String,
    WString,
    Struct,
    Array,
}

impl ValueType {
    pub fn is_scalar(self) -> bool {
        !self.is_aggregate()
    }

    pub fn is_aggregate(self) -> bool {
        matches!(self, ValueType::Struct | ValueType::Array)
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            ValueType::Char
                | ValueType::UChar
                | ValueType::Short
                | ValueType::UShort
                | ValueType::Int
                | ValueType::UInt
                | ValueType::Long
                | ValueType::ULong
        )
    }

    pub fn is_signed(self) -> bool {
        matches!(
            self,
            ValueType::Char
                | ValueType::Short
                | ValueType::Int
                | ValueType::Long
                | ValueType::Float
                | ValueType::Double
        )
    }

    pub fn is_floating(self) -> bool {
        matches!(self, ValueType::Float | ValueType::Double)
    }

    pub fn is_string(self) -> bool {
        matches!(self, ValueType::String | ValueType::WString)
    }

    pub fn name(self) -> &'static str {
        match self {
            ValueType::Bool => "bool",
            ValueType::Char => "char",
            ValueType::UChar => "uchar",
            ValueType::Short => "short",
            ValueType::UShort => "ushort",
            ValueType::Int => "int",
            ValueType::UInt => "uint",
            ValueType::Long => "long",
            ValueType::ULong => "ulong",
            ValueType::Float => "float",
            ValueType::Double => "double",
            ValueType::String => "string",
            ValueType::WString => "wstring",
            ValueType::Struct => "struct",
            ValueType::Array => "array",
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded field.
///
/// Both string variants hold Rust strings; they differ in the encoding they
/// were decoded from (narrow bytes vs. wide code units) and are never equal to
/// each other.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Bool(bool),
    Char(i8),
    UChar(u8),
    Short(i16),
    UShort(u16),
    Int(i32),
    UInt(u32),
    Long(i64),
    ULong(u64),
    Float(f32),
    Double(f64),
    String(String),
    WString(String),
    Struct(StructValue),
    Array(ArrayValue),
}

/// An integer promoted to the widest representation of its signedness, so
/// that range checks never truncate before comparing.
#[derive(Clone, Copy, Debug)]
pub(crate) enum WideInteger {
    Signed(i64),
    Unsigned(u64),
}

// Largest magnitude an integer may have and still be exactly representable
// as an `f64`.
const MAX_EXACT_F64_INTEGER: u64 = 1 << 53;

impl Value {
    pub fn string(s: impl Into<String>) -> Value {
        Value::String(s.into())
    }

    pub fn wstring(s: impl Into<String>) -> Value {
        Value::WString(s.into())
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Bool(_) => ValueType::Bool,
            Value::Char(_) => ValueType::Char,
            Value::UChar(_) => ValueType::UChar,
            Value::Short(_) => ValueType::Short,
            Value::UShort(_) => ValueType::UShort,
            Value::Int(_) => ValueType::Int,
            Value::UInt(_) => ValueType::UInt,
            Value::Long(_) => ValueType::Long,
            Value::ULong(_) => ValueType::ULong,
            Value::Float(_) => ValueType::Float,
            Value::Double(_) => ValueType::Double,
            Value::String(_) => ValueType::String,
            Value::WString(_) => ValueType::WString,
            Value::Struct(_) => ValueType::Struct,
            Value::Array(_) => ValueType::Array,
        }
    }

    pub fn instance_of(&self, value_type: ValueType) -> bool {
        self.value_type() == value_type
    }

    pub fn is_scalar(&self) -> bool {
        self.value_type().is_scalar()
    }

    pub fn is_aggregate(&self) -> bool {
        self.value_type().is_aggregate()
    }

    pub fn is_integer(&self) -> bool {
        self.value_type().is_integer()
    }

    pub fn is_signed(&self) -> bool {
        self.value_type().is_signed()
    }

    pub fn is_floating(&self) -> bool {
        self.value_type().is_floating()
    }

    pub fn as_struct(&self) -> Option<&StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_struct_mut(&mut self) -> Option<&mut StructValue> {
        match self {
            Value::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut ArrayValue> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Unchecked cast to a struct. Callers must check the type with
    /// `instance_of` first; a mismatch is a bug in the caller.
    pub fn cast_struct(&self) -> &StructValue {
        debug_assert!(self.instance_of(ValueType::Struct));
        match self {
            Value::Struct(s) => s,
            other => panic!("cast of {} value to struct", other.value_type()),
        }
    }

    /// Unchecked cast to an array, see `cast_struct`.
    pub fn cast_array(&self) -> &ArrayValue {
        debug_assert!(self.instance_of(ValueType::Array));
        match self {
            Value::Array(a) => a,
            other => panic!("cast of {} value to array", other.value_type()),
        }
    }

    pub(crate) fn wide_integer(&self) -> Option<WideInteger> {
        Some(match *self {
            Value::Char(v) => WideInteger::Signed(v.into()),
            Value::Short(v) => WideInteger::Signed(v.into()),
            Value::Int(v) => WideInteger::Signed(v.into()),
            Value::Long(v) => WideInteger::Signed(v),
            Value::UChar(v) => WideInteger::Unsigned(v.into()),
            Value::UShort(v) => WideInteger::Unsigned(v.into()),
            Value::UInt(v) => WideInteger::Unsigned(v.into()),
            Value::ULong(v) => WideInteger::Unsigned(v),
            _ => return None,
        })
    }

    /// Converts the value to `T` if it can be represented without loss.
    pub fn get_as<T: FromValue>(&self) -> Option<T> {
        T::from_value(self)
    }

    pub fn as_int(&self) -> Option<i32> {
        self.get_as()
    }

    pub fn as_uint(&self) -> Option<u32> {
        self.get_as()
    }

    pub fn as_long(&self) -> Option<i64> {
        self.get_as()
    }

    pub fn as_ulong(&self) -> Option<u64> {
        self.get_as()
    }

    pub fn as_floating(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(v.into()),
            Value::Double(v) => Some(v),
            _ => match self.wide_integer()? {
                WideInteger::Signed(v) if v.unsigned_abs() <= MAX_EXACT_F64_INTEGER => {
                    Some(v as f64)
                }
                WideInteger::Unsigned(v) if v <= MAX_EXACT_F64_INTEGER => Some(v as f64),
                _ => None,
            },
        }
    }

    /// Returns the content of a narrow string. Wide strings are only accepted
    /// when every character fits in a single narrow byte.
    pub fn as_string(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            Value::WString(s) if s.is_ascii() => Some(s),
            _ => None,
        }
    }

    pub fn as_wstring(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::WString(s) => Some(s),
            _ => None,
        }
    }
}

impl TryFrom<Value> for StructValue {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Struct(s) => Ok(s),
            other => Err(other),
        }
    }
}

impl TryFrom<Value> for ArrayValue {
    type Error = Value;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(a) => Ok(a),
            other => Err(other),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(v: $ty) -> Value {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => Char,
    u8 => UChar,
    i16 => Short,
    u16 => UShort,
    i32 => Int,
    u32 => UInt,
    i64 => Long,
    u64 => ULong,
    f32 => Float,
    f64 => Double,
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Value {
        Value::Struct(s)
    }
}

impl From<ArrayValue> for Value {
    fn from(a: ArrayValue) -> Value {
        Value::Array(a)
    }
}
