use crate::convert::FromValue;
use crate::value::Value;
use rustc_hash::FxHashMap;

/// Named fields in insertion order, with lookup by name.
///
/// Field names are unique. Equality compares fields pairwise in insertion
/// order, so two structs holding the same fields in a different order are
/// not equal.
#[derive(Clone, Debug, Default)]
pub struct StructValue {
    fields: Vec<(String, Value)>,
    index: FxHashMap<String, usize>,
}

impl StructValue {
    pub fn new() -> StructValue {
        StructValue::default()
    }

    /// Adds a field at the end of the struct.
    ///
    /// If a field called `name` already exists the struct is left untouched
    /// and the rejected value is handed back in `Err`.
    pub fn add_field(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Result<(), Value> {
        let name = name.into();
        let value = value.into();

        if self.index.contains_key(&name) {
            return Err(value);
        }

        self.index.insert(name.clone(), self.fields.len());
        self.fields.push((name, value));
        Ok(())
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn get_field(&self, name: &str) -> Option<&Value> {
        self.index.get(name).map(|&i| &self.fields[i].1)
    }

    pub fn get_field_mut(&mut self, name: &str) -> Option<&mut Value> {
        match self.index.get(name) {
            Some(&i) => Some(&mut self.fields[i].1),
            None => None,
        }
    }

    pub fn field_count(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> + '_ {
        self.fields.iter().map(|(name, value)| (&name[..], value))
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.iter().map(|(name, _)| &name[..])
    }

    pub fn field_as<T: FromValue>(&self, name: &str) -> Option<T> {
        self.get_field(name).and_then(T::from_value)
    }

    pub fn field_as_int(&self, name: &str) -> Option<i32> {
        self.field_as(name)
    }

    pub fn field_as_uint(&self, name: &str) -> Option<u32> {
        self.field_as(name)
    }

    pub fn field_as_long(&self, name: &str) -> Option<i64> {
        self.field_as(name)
    }

    pub fn field_as_ulong(&self, name: &str) -> Option<u64> {
        self.field_as(name)
    }

    pub fn field_as_string(&self, name: &str) -> Option<&str> {
        self.get_field(name).and_then(Value::as_string)
    }

    pub fn field_as_wstring(&self, name: &str) -> Option<&str> {
        self.get_field(name).and_then(Value::as_wstring)
    }

    pub fn into_fields(self) -> Vec<(String, Value)> {
        self.fields
    }
}

impl PartialEq for StructValue {
    fn eq(&self, other: &StructValue) -> bool {
        // The index is derived from `fields`, no need to compare it.
        self.fields == other.fields
    }
}
