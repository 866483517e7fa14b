//! This crate provides the typed value tree that decoded trace event payloads
//! are represented with.
//!
//! # The value tree
//!
//! A [`Value`] is one of a closed set of variants: scalars (`bool`, signed and
//! unsigned integers from 8 to 64 bits, `f32`, `f64`), narrow and wide strings,
//! and two aggregates: [`ArrayValue`] (an ordered sequence) and
//! [`StructValue`] (ordered named fields with lookup by name).
//!
//! Aggregates exclusively own their children, so a decoded payload is a plain
//! tree that is dropped depth-first together with its root.
//!
//! Numeric accessors such as [`Value::as_int()`] only succeed when the stored
//! value can be represented in the requested type without loss:
//!
//! ```
//! use etwvalue::Value;
//!
//! assert_eq!(Value::from(0x7FFF_FFFFu64).as_int(), Some(0x7FFF_FFFF));
//! assert_eq!(Value::from(u64::MAX).as_int(), None);
//! assert_eq!(Value::from(-1i8).as_uint(), None);
//! ```
//!
//! [`Value`]: enum.Value.html
//! [`ArrayValue`]: struct.ArrayValue.html
//! [`StructValue`]: struct.StructValue.html
//! [`Value::as_int()`]: enum.Value.html#method.as_int

mod array;
mod convert;
mod serialize;
mod structure;
mod value;

pub use crate::array::ArrayValue;
pub use crate::convert::FromValue;
pub use crate::structure::StructValue;
pub use crate::value::{Value, ValueType};
