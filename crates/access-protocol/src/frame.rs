//! Extracting one JSON value from the front of a receive buffer.
//!
//! Device responses arrive over a byte stream and may be followed by
//! trailing bytes or the start of the next message. The first value must
//! begin the buffer (after whitespace) with `{` or `[`; objects and arrays
//! are self-delimiting, so whatever follows the closing bracket is left alone.

use serde_json::Value;

/// The first complete JSON object or array in `buffer`, or `None` if the
/// buffer does not start with one or it is not yet complete.
pub fn extract_json_frame(buffer: &str) -> Option<Value> {
    let rest = buffer.trim_start();
    if !rest.starts_with(['{', '[']) {
        return None;
    }
    match serde_json::Deserializer::from_str(rest).into_iter::<Value>().next()? {
        Ok(value) => Some(value),
        Err(e) => {
            if !e.is_eof() {
                tracing::debug!(error = %e, "discarding malformed frame");
            }
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn object_with_trailing_bytes() {
        let v = extract_json_frame(r#"{"error":0,"response":[1,2]}\0\0garbage"#).unwrap();
        assert_eq!(v, json!({"error": 0, "response": [1, 2]}));
    }

    #[test]
    fn array_frame() {
        assert_eq!(extract_json_frame("[1,[2,3]] [4]").unwrap(), json!([1, [2, 3]]));
    }

    #[test]
    fn leading_whitespace_allowed() {
        assert_eq!(extract_json_frame("  \n{}").unwrap(), json!({}));
    }

    #[test]
    fn brackets_in_strings_ignored() {
        let v = extract_json_frame(r#"{"a":"}{\"]"}tail"#).unwrap();
        assert_eq!(v, json!({"a": "}{\"]"}));
    }

    #[test]
    fn incomplete_or_foreign_input() {
        assert_eq!(extract_json_frame(""), None);
        assert_eq!(extract_json_frame(r#"{"a":1"#), None);
        assert_eq!(extract_json_frame("ok {}"), None);
        assert_eq!(extract_json_frame("{]"), None);
    }

    #[test]
    fn frame_completes_as_bytes_arrive() {
        let full = r#"[{"policy_id":"AA","action":"action#1"}]"#;
        for cut in 1..full.len() {
            assert_eq!(extract_json_frame(&full[..cut]), None, "prefix of {cut} bytes");
        }
        assert!(extract_json_frame(full).is_some());
    }
}
