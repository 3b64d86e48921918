//! Payload framing for the execution protocol.
//!
//! A payload is an ordered sequence of elements, each JSON-serialized,
//! base64-encoded and framed as `<decimal length>:<base64>`:
//!
//! ```text
//! 12:eyJhIjoxfQ==44:eyJuYW1lIjoic2l0ZS5pbnN0YWxsIiwiYXJncyI6e319
//! ```
//!
//! Decoding is positional: `decode(payload, offset, count)` walks the frames
//! and only base64/JSON-decodes the requested window. Skipped frames are
//! never decoded, which is what allows a receiver to materialize element 0
//! (the Control), act on it, and only then decode element 1 (the Job).

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("frame {index}: missing length prefix")]
    MissingLength { index: usize },
    #[error("frame {index}: invalid length prefix: {prefix:?}")]
    InvalidLength { index: usize, prefix: String },
    #[error("frame {index}: payload truncated, need {need} more bytes")]
    Truncated { index: usize, need: usize },
    #[error("requested frames {offset}..{end}, payload has {frames}")]
    OutOfBounds {
        offset: usize,
        end: usize,
        frames: usize,
    },
    #[error("frame {index}: {source}")]
    Base64 {
        index: usize,
        source: base64::DecodeError,
    },
    #[error("frame {index}: {source}")]
    Json {
        index: usize,
        source: serde_json::Error,
    },
    #[error("control map has an invalid shape: {0}")]
    ControlShape(serde_json::Error),
}

/// Encode a sequence of values into a single payload string.
pub fn encode(parts: &[Value]) -> Result<String, ProtocolError> {
    let mut payload = String::new();
    for (index, part) in parts.iter().enumerate() {
        let json = serde_json::to_vec(part).map_err(|source| ProtocolError::Json { index, source })?;
        let encoded = STANDARD.encode(json);
        payload.push_str(&encoded.len().to_string());
        payload.push(':');
        payload.push_str(&encoded);
    }
    Ok(payload)
}

/// Decode `count` frames starting at `offset`, skipping earlier frames
/// without decoding them.
pub fn decode(payload: &str, offset: usize, count: usize) -> Result<Vec<Value>, ProtocolError> {
    let mut values = Vec::with_capacity(count);
    let mut rest = payload;
    let mut index = 0;

    while index < offset + count {
        if rest.is_empty() {
            return Err(ProtocolError::OutOfBounds {
                offset,
                end: offset + count,
                frames: index,
            });
        }
        let (frame, remainder) = next_frame(rest, index)?;
        if index >= offset {
            let bytes = STANDARD
                .decode(frame)
                .map_err(|source| ProtocolError::Base64 { index, source })?;
            let value =
                serde_json::from_slice(&bytes).map_err(|source| ProtocolError::Json { index, source })?;
            values.push(value);
        }
        rest = remainder;
        index += 1;
    }

    Ok(values)
}

/// Split the next `<len>:<data>` frame off the front of `input`.
fn next_frame(input: &str, index: usize) -> Result<(&str, &str), ProtocolError> {
    let colon = input
        .find(':')
        .ok_or(ProtocolError::MissingLength { index })?;
    let prefix = &input[..colon];
    let len: usize = prefix.parse().map_err(|_| ProtocolError::InvalidLength {
        index,
        prefix: prefix.to_string(),
    })?;

    let body = &input[colon + 1..];
    if body.len() < len {
        return Err(ProtocolError::Truncated {
            index,
            need: len - body.len(),
        });
    }
    Ok((&body[..len], &body[len..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn round_trips_two_elements() {
        let parts = vec![json!({"rootDir": "/tmp/site"}), json!({"name": "site.install"})];
        let payload = encode(&parts).unwrap();

        let decoded = decode(&payload, 0, 2).unwrap();
        assert_eq!(decoded, parts);
    }

    #[test]
    fn decodes_a_single_frame_by_position() {
        let parts = vec![json!(1), json!("two"), json!([3])];
        let payload = encode(&parts).unwrap();

        assert_eq!(decode(&payload, 0, 1).unwrap(), vec![json!(1)]);
        assert_eq!(decode(&payload, 1, 1).unwrap(), vec![json!("two")]);
        assert_eq!(decode(&payload, 2, 1).unwrap(), vec![json!([3])]);
    }

    #[test]
    fn skipped_frames_are_not_decoded() {
        // Frame 0 is valid, frame 1 is garbage that would fail base64
        // decoding. Decoding only frame 0 must still succeed.
        let valid = encode(&[json!({"ok": true})]).unwrap();
        let payload = format!("{valid}8:!!!!!!!!");

        assert_eq!(decode(&payload, 0, 1).unwrap(), vec![json!({"ok": true})]);
        assert!(matches!(
            decode(&payload, 1, 1),
            Err(ProtocolError::Base64 { index: 1, .. })
        ));
    }

    #[test]
    fn rejects_truncated_payloads() {
        let payload = encode(&[json!("hello")]).unwrap();
        let cut = &payload[..payload.len() - 3];

        assert!(matches!(
            decode(cut, 0, 1),
            Err(ProtocolError::Truncated { index: 0, .. })
        ));
    }

    #[test]
    fn rejects_out_of_bounds_offsets() {
        let payload = encode(&[json!(1)]).unwrap();

        assert!(matches!(
            decode(&payload, 1, 1),
            Err(ProtocolError::OutOfBounds { frames: 1, .. })
        ));
    }

    #[test]
    fn rejects_missing_length_prefix() {
        assert!(matches!(
            decode("no-colon-here", 0, 1),
            Err(ProtocolError::InvalidLength { .. }) | Err(ProtocolError::MissingLength { .. })
        ));
    }
}
