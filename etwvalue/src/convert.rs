use crate::value::{Value, WideInteger};
use std::convert::TryFrom;

/// Lossless conversion out of a [`Value`].
///
/// `from_value` returns `None` whenever the value has an incompatible type or
/// does not fit into `Self`. Integer targets accept any integer variant whose
/// value lies within `Self::MIN..=Self::MAX`.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! impl_from_value_for_integer {
    ($($ty:ty),*) => {
        $(
            impl FromValue for $ty {
                fn from_value(value: &Value) -> Option<$ty> {
                    match value.wide_integer()? {
                        WideInteger::Signed(v) => <$ty>::try_from(v).ok(),
                        WideInteger::Unsigned(v) => <$ty>::try_from(v).ok(),
                    }
                }
            }
        )*
    };
}

impl_from_value_for_integer!(i8, u8, i16, u16, i32, u32, i64, u64);

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<bool> {
        match *value {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<f64> {
        value.as_floating()
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<String> {
        value.as_string().map(str::to_owned)
    }
}
