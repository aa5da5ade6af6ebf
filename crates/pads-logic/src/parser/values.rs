//! Token splitting and tolerant numeric readers.
//!
//! PADS exports are loosely typed: a field that should be numeric may be
//! garbled or missing. Readers here never fail; they fall back to zero and
//! report the problem.

use crate::report::{Reporter, Severity};

/// Split a line on whitespace. A double-quoted run is one token, returned
/// without its quotes; an unterminated quote runs to end of line.
pub fn tokenize(line: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let bytes = line.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
            continue;
        }
        if bytes[i] == b'"' {
            let start = i + 1;
            let end = line[start..]
                .find('"')
                .map(|off| start + off)
                .unwrap_or(line.len());
            tokens.push(&line[start..end]);
            i = end + 1;
        } else {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() {
                i += 1;
            }
            tokens.push(&line[start..i]);
        }
    }

    tokens
}

/// Split `"name" rest...` (or `name rest...`) into name and trimmed rest.
pub fn split_name_value(line: &str) -> (&str, &str) {
    let line = line.trim();
    if let Some(after) = line.strip_prefix('"') {
        match after.find('"') {
            Some(end) => (&after[..end], after[end + 1..].trim()),
            None => (after, ""),
        }
    } else {
        match line.find(char::is_whitespace) {
            Some(end) => (&line[..end], line[end..].trim()),
            None => (line, ""),
        }
    }
}

/// Strip one pair of surrounding double quotes, if present.
pub fn unquote(s: &str) -> &str {
    let s = s.trim();
    s.strip_prefix('"')
        .and_then(|inner| inner.strip_suffix('"'))
        .unwrap_or(s)
}

/// True if the token reads as a finite number (integer or decimal).
pub fn is_numeric(token: &str) -> bool {
    token.parse::<f64>().is_ok_and(f64::is_finite)
}

/// Parse an integer token. Decimal tokens are truncated; anything else
/// yields 0 and a warning naming `field` and the 1-based line number.
pub fn read_int(token: &str, field: &str, line_idx: usize, reporter: &mut dyn Reporter) -> i64 {
    if let Ok(v) = token.parse::<i64>() {
        return v;
    }
    if let Ok(v) = token.parse::<f64>() {
        if v.is_finite() {
            return v as i64;
        }
    }
    reporter.report(
        &format!(
            "line {}: invalid integer '{token}' for {field}, using 0",
            line_idx + 1
        ),
        Severity::Warning,
    );
    0
}

/// Parse a float token, falling back to 0.0 with a warning.
pub fn read_float(token: &str, field: &str, line_idx: usize, reporter: &mut dyn Reporter) -> f64 {
    match token.parse::<f64>() {
        Ok(v) if v.is_finite() => v,
        _ => {
            reporter.report(
                &format!(
                    "line {}: invalid number '{token}' for {field}, using 0.0",
                    line_idx + 1
                ),
                Severity::Warning,
            );
            0.0
        }
    }
}
