use crate::convert::FromValue;
use crate::value::Value;
use std::ops::Index;
use std::slice;

/// An ordered sequence of values. The array owns its elements.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArrayValue {
    elements: Vec<Value>,
}

impl ArrayValue {
    pub fn new() -> ArrayValue {
        ArrayValue::default()
    }

    pub fn with_capacity(capacity: usize) -> ArrayValue {
        ArrayValue {
            elements: Vec::with_capacity(capacity),
        }
    }

    pub fn append(&mut self, value: impl Into<Value>) {
        self.elements.push(value.into());
    }

    /// Appends a batch of scalars of the same type.
    pub fn append_all<T>(&mut self, values: &[T])
    where
        T: Copy + Into<Value>,
    {
        self.elements.reserve(values.len());
        self.elements.extend(values.iter().map(|&v| v.into()));
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.elements.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut Value> {
        self.elements.get_mut(index)
    }

    pub fn iter(&self) -> slice::Iter<'_, Value> {
        self.elements.iter()
    }

    /// Converts the element at `index`, see [`FromValue`]. Returns `None` if
    /// there is no such element or it does not convert losslessly.
    pub fn element_as<T: FromValue>(&self, index: usize) -> Option<T> {
        self.get(index).and_then(T::from_value)
    }

    pub fn element_as_int(&self, index: usize) -> Option<i32> {
        self.element_as(index)
    }

    pub fn element_as_uint(&self, index: usize) -> Option<u32> {
        self.element_as(index)
    }

    pub fn element_as_long(&self, index: usize) -> Option<i64> {
        self.element_as(index)
    }

    pub fn element_as_ulong(&self, index: usize) -> Option<u64> {
        self.element_as(index)
    }

    pub fn element_as_string(&self, index: usize) -> Option<&str> {
        self.get(index).and_then(Value::as_string)
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.elements
    }
}

impl Index<usize> for ArrayValue {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        &self.elements[index]
    }
}

impl From<Vec<Value>> for ArrayValue {
    fn from(elements: Vec<Value>) -> ArrayValue {
        ArrayValue { elements }
    }
}

impl std::iter::FromIterator<Value> for ArrayValue {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> ArrayValue {
        ArrayValue {
            elements: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ArrayValue {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.into_iter()
    }
}

impl<'a> IntoIterator for &'a ArrayValue {
    type Item = &'a Value;
    type IntoIter = slice::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.elements.iter()
    }
}
