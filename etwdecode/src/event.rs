use etwvalue::Value;
use serde::Serialize;

/// One decoded trace event: the time it was recorded and the decoded payload
/// tree.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Event {
    timestamp: u64,
    payload: Value,
}

impl Event {
    pub fn new(timestamp: u64, payload: Value) -> Event {
        Event { timestamp, payload }
    }

    pub fn timestamp(&self) -> u64 {
        self.timestamp
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn into_payload(self) -> Value {
        self.payload
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use etwvalue::StructValue;
    use serde_json::json;

    #[test]
    fn event_keeps_timestamp_and_payload() {
        let mut fields = StructValue::new();
        fields.add_field("field", 12u32).unwrap();
        let event = Event::new(42, fields.into());

        assert_eq!(event.timestamp(), 42);
        assert_eq!(event.payload().cast_struct().field_as_uint("field"), Some(12));
        assert_eq!(
            serde_json::to_value(&event).unwrap(),
            json!({ "timestamp": 42, "payload": { "field": 12 } })
        );

        let payload = event.into_payload();
        assert!(payload.is_aggregate());
    }
}
