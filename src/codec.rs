//! Bidirectional value normalization for engines without a binary column
//! type.
//!
//! Outgoing binary parameters are replaced by a tagged lowercase-hex text
//! value; incoming text values carrying the tag are decoded back into bytes.
//! Everything else passes through untouched, so the engine's native
//! primitives keep their exact representation.

use crate::types::SqlValue;

/// Marker prefix that distinguishes hex-encoded binary payloads from
/// ordinary text. Application text that happens to start with this prefix
/// will be misread as binary on the way back out; this is a documented
/// limitation of the tagging protocol, not a guarded case.
pub const BLOB_MARKER: &str = "bin!";

/// Encode a single outgoing parameter value.
///
/// `Blob` becomes marker-prefixed lowercase hex text; every other variant is
/// returned unchanged. Never fails.
#[must_use]
pub fn encode_value(value: &SqlValue) -> SqlValue {
    match value {
        SqlValue::Blob(bytes) => SqlValue::Text(format!("{BLOB_MARKER}{}", hex::encode(bytes))),
        other => other.clone(),
    }
}

/// Encode an ordered parameter list for the engine. Order is preserved; an
/// empty slice yields an empty vec.
#[must_use]
pub fn encode_params(params: &[SqlValue]) -> Vec<SqlValue> {
    params.iter().map(encode_value).collect()
}

/// Decode a single value pulled from a result row.
///
/// Text beginning with [`BLOB_MARKER`] has the marker stripped and the
/// remainder hex-decoded into `Blob`. Non-text values and non-matching text
/// pass through unchanged. A marker-prefixed value whose remainder is not
/// valid hex is left as text rather than failing the row.
#[must_use]
pub fn decode_value(value: SqlValue) -> SqlValue {
    match value {
        SqlValue::Text(text) => match text.strip_prefix(BLOB_MARKER) {
            Some(payload) => match hex::decode(payload) {
                Ok(bytes) => SqlValue::Blob(bytes),
                Err(_) => SqlValue::Text(text),
            },
            None => SqlValue::Text(text),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blob_round_trips_byte_for_byte() {
        let cases: Vec<Vec<u8>> = vec![
            vec![],
            vec![0x00],
            vec![0xff, 0x00, 0xab, 0x10],
            (0u8..=255).collect(),
        ];
        for bytes in cases {
            let encoded = encode_value(&SqlValue::Blob(bytes.clone()));
            assert!(matches!(&encoded, SqlValue::Text(t) if t.starts_with(BLOB_MARKER)));
            assert_eq!(decode_value(encoded), SqlValue::Blob(bytes));
        }
    }

    #[test]
    fn blob_encoding_is_lowercase_hex() {
        let encoded = encode_value(&SqlValue::Blob(vec![0xde, 0xad, 0xbe, 0xef]));
        assert_eq!(encoded, SqlValue::Text("bin!deadbeef".to_string()));
    }

    #[test]
    fn non_blob_values_are_identity_both_ways() {
        let values = vec![
            SqlValue::Int(42),
            SqlValue::Float(1.5),
            SqlValue::Text("hello".to_string()),
            SqlValue::Bool(true),
            SqlValue::Null,
        ];
        for value in values {
            assert_eq!(encode_value(&value), value);
            assert_eq!(decode_value(value.clone()), value);
        }
    }

    #[test]
    fn encode_params_preserves_order() {
        let params = vec![
            SqlValue::Int(1),
            SqlValue::Blob(vec![0x01]),
            SqlValue::Text("x".to_string()),
        ];
        let encoded = encode_params(&params);
        assert_eq!(encoded[0], SqlValue::Int(1));
        assert_eq!(encoded[1], SqlValue::Text("bin!01".to_string()));
        assert_eq!(encoded[2], SqlValue::Text("x".to_string()));
    }

    #[test]
    fn decode_tolerates_malformed_hex_after_marker() {
        let odd = SqlValue::Text("bin!abc".to_string());
        assert_eq!(decode_value(odd.clone()), odd);
        let junk = SqlValue::Text("bin!zz".to_string());
        assert_eq!(decode_value(junk.clone()), junk);
    }

    #[test]
    fn marker_collision_is_a_known_limitation() {
        // Legitimate text that looks like a tagged payload decodes as binary.
        let collided = SqlValue::Text("bin!00".to_string());
        assert_eq!(decode_value(collided), SqlValue::Blob(vec![0x00]));
    }
}
