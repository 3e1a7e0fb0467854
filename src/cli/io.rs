//! JSON I/O handling for CLI
//!
//! - Input: one JSON object per line (serve mode)
//! - Output: one JSON object per line on stdout
//! - UTF-8 only
//!
//! Responses are `{"status":"ok","data":...}` or
//! `{"status":"error","code":...,"message":...}`.

use std::io::{BufRead, Write};

use serde_json::Value;

use super::errors::{CliError, CliResult};

/// Iterates JSON request lines from `input`, skipping blank lines
pub fn read_requests<R: BufRead>(input: R) -> impl Iterator<Item = CliResult<Value>> {
    input
        .lines()
        .filter(|line| !matches!(line, Ok(l) if l.trim().is_empty()))
        .map(|line| {
            let line = line.map_err(CliError::from)?;
            serde_json::from_str(&line)
                .map_err(|e| CliError::invalid_request(format!("Malformed JSON: {}", e)))
        })
}

/// Write a success response to `out`
pub fn write_response_to<W: Write>(out: &mut W, data: Value) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "ok",
        "data": data
    });

    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}

/// Write an error response to `out`
pub fn write_error_to<W: Write>(out: &mut W, code: &str, message: &str) -> CliResult<()> {
    let response = serde_json::json!({
        "status": "error",
        "code": code,
        "message": message
    });

    serde_json::to_writer(&mut *out, &response)?;
    writeln!(out)?;
    out.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_read_requests_skips_blank_lines() {
        let input = "{\"op\":\"stats\"}\n\n   \n{\"op\":\"clear\"}\n";
        let requests: Vec<Value> = read_requests(input.as_bytes())
            .collect::<CliResult<_>>()
            .unwrap();
        assert_eq!(requests, vec![json!({"op": "stats"}), json!({"op": "clear"})]);
    }

    #[test]
    fn test_read_requests_reports_bad_json() {
        let mut requests = read_requests("not json\n".as_bytes());
        let err = requests.next().unwrap().unwrap_err();
        assert_eq!(err.code_str(), "CATALOG_CLI_INVALID_REQUEST");
    }

    #[test]
    fn test_response_shapes() {
        let mut out = Vec::new();
        write_response_to(&mut out, json!({"count": 1})).unwrap();
        write_error_to(&mut out, "CODE", "broken").unwrap();

        let text = String::from_utf8(out).unwrap();
        let lines: Vec<Value> = text
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        assert_eq!(lines[0], json!({"status": "ok", "data": {"count": 1}}));
        assert_eq!(
            lines[1],
            json!({"status": "error", "code": "CODE", "message": "broken"})
        );
    }
}
