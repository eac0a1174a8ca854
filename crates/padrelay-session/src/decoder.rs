use padrelay_layout::StateRecord;

use crate::error::{Result, SessionError};

/// Turns a verified frame payload into a state record.
pub trait RecordDecoder: Send + Sync {
    fn decode(&self, payload: &[u8]) -> Result<StateRecord>;
}

/// Decodes JSON objects keyed by field wire name.
///
/// Surrounding whitespace is ignored, so newline-terminated producers work
/// unchanged. Missing and `null` keys decode as zero.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRecordDecoder;

impl RecordDecoder for JsonRecordDecoder {
    fn decode(&self, payload: &[u8]) -> Result<StateRecord> {
        // serde would also accept a positional array for a struct.
        if payload.trim_ascii_start().first() != Some(&b'{') {
            return Err(SessionError::RecordDecode(
                "expected a JSON object".to_string(),
            ));
        }
        serde_json::from_slice(payload).map_err(|err| SessionError::RecordDecode(err.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use padrelay_layout::Field;

    use super::*;

    #[test]
    fn decodes_newline_terminated_object() {
        let record = JsonRecordDecoder
            .decode(b"{\"N\":1,\"LjoyX\":200,\"dY\":-1,\"ts\":42}\n")
            .unwrap();
        assert_eq!(record.get(Field::North), 1);
        assert_eq!(record.get(Field::LeftX), 200);
        assert_eq!(record.dpad_y, -1);
        assert_eq!(record.timestamp, 42);
    }

    #[test]
    fn empty_object_is_idle_record() {
        let record = JsonRecordDecoder.decode(b"  {}  ").unwrap();
        assert_eq!(record, StateRecord::default());
    }

    #[test]
    fn null_fields_are_idle() {
        let record = JsonRecordDecoder.decode(br#"{"N":null,"RT":7}"#).unwrap();
        assert_eq!(record, StateRecord::default().with(Field::RightTrigger, 7));
    }

    #[test]
    fn rejects_non_objects() {
        let payloads: [&[u8]; 4] = [b"", b"[1,2,3]", b"null", b"\"N\""];
        for payload in payloads {
            assert!(matches!(
                JsonRecordDecoder.decode(payload),
                Err(SessionError::RecordDecode(_))
            ));
        }
    }

    #[test]
    fn rejects_out_of_range_and_garbage() {
        assert!(JsonRecordDecoder.decode(br#"{"RT":300}"#).is_err());
        assert!(JsonRecordDecoder.decode(br#"{"RT":1"#).is_err());
        assert!(JsonRecordDecoder.decode(br#"{"RT":1} trailing"#).is_err());
    }
}
