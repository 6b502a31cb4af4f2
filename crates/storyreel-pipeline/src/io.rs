//! One-message stdin/stdout plumbing.
//!
//! Every stage consumes exactly one JSON document on stdin and emits
//! exactly one on stdout. Logs go to stderr, so stdout stays a single
//! parseable message for the next stage.

use std::io::{Read, Write};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StageResult;

/// Read the stage's single input message from stdin.
pub fn read_message<T: DeserializeOwned>() -> StageResult<T> {
    read_from(std::io::stdin().lock())
}

/// Write the stage's single output message to stdout.
pub fn write_message<T: Serialize>(message: &T) -> StageResult<()> {
    write_to(std::io::stdout().lock(), message)
}

fn read_from<R: Read, T: DeserializeOwned>(mut reader: R) -> StageResult<T> {
    let mut raw = String::new();
    reader.read_to_string(&mut raw)?;
    Ok(serde_json::from_str(&raw)?)
}

fn write_to<W: Write, T: Serialize>(mut writer: W, message: &T) -> StageResult<()> {
    serde_json::to_writer_pretty(&mut writer, message)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    #[test]
    fn test_read_from_parses_one_document() {
        let input = br#"{ "status": "success", "count": 2 }"#;
        let value: Value = read_from(&input[..]).unwrap();
        assert_eq!(value["count"], 2);
    }

    #[test]
    fn test_read_from_tolerates_trailing_newline() {
        let input = b"{ \"status\": \"success\" }\n";
        let value: Value = read_from(&input[..]).unwrap();
        assert_eq!(value["status"], "success");
    }

    #[test]
    fn test_read_from_rejects_invalid_json() {
        let input = b"not json";
        let result: StageResult<Value> = read_from(&input[..]);
        assert!(result.is_err());
    }

    #[test]
    fn test_write_to_emits_pretty_json_with_newline() {
        let mut out = Vec::new();
        write_to(&mut out, &json!({ "status": "success" })).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.ends_with('\n'));
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back["status"], "success");
    }
}
