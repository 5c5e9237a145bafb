//! Human-readable macro format (.gdr.json)
//!
//! Same logical content as the binary format, encoded with serde_json.

use crate::replay::binary::CodecError;
use crate::replay::types::Macro;

/// Encode a macro as pretty-printed JSON
pub fn to_json_bytes(m: &Macro) -> Result<Vec<u8>, CodecError> {
    Ok(serde_json::to_vec_pretty(m)?)
}

/// Decode a macro from JSON
pub fn from_json_slice(bytes: &[u8]) -> Result<Macro, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::replay::types::{InputEvent, PlayerPosition, PositionFix};

    #[test]
    fn test_json_roundtrip() {
        let mut m = Macro {
            author: "tester".to_string(),
            ..Macro::default()
        };
        m.push_input(InputEvent::new(12, 1, false, true));
        m.push_input(InputEvent::new(40, 1, false, false));
        m.push_fix(PositionFix {
            frame: 20,
            player1: PlayerPosition::at(50.0, 105.0),
            player2: PlayerPosition::default(),
        });

        let bytes = to_json_bytes(&m).unwrap();
        let text = String::from_utf8(bytes.clone()).unwrap();
        assert!(text.contains("\"author\": \"tester\""));

        let parsed = from_json_slice(&bytes).unwrap();
        assert_eq!(parsed, m);
    }

    #[test]
    fn test_json_missing_fields_default() {
        let parsed = from_json_slice(br#"{"inputs":[{"frame":3,"button":1,"player2":false,"hold":true}]}"#)
            .unwrap();
        assert_eq!(parsed.inputs.len(), 1);
        assert_eq!(parsed.frame_rate, 240.0);
    }

    #[test]
    fn test_json_invalid() {
        assert!(matches!(
            from_json_slice(b"not json"),
            Err(CodecError::Json(_))
        ));
    }
}
