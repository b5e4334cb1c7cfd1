//! Properties file codec
//!
//! Reads and writes the `key=value` text format used by the properties-file
//! layer and by configuration snapshots. Supports:
//! - `key=value`, `key: value` and `key value`
//! - Comments starting with `#` or `!`
//! - Backslash line continuation
//! - Escapes `\t \n \r \f \uXXXX`, and `\<c>` for any other character

use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::Path;

use tserve_core::{Result, TsError};

/// Parse properties text into a sorted map. Later duplicates win.
pub fn parse(contents: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    for line in logical_lines(contents) {
        let (key, value) = split_entry(&line);
        entries.insert(unescape(key), unescape(value));
    }
    entries
}

/// Read and parse a properties file
pub fn load(path: &Path) -> Result<BTreeMap<String, String>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        TsError::config(format!(
            "unable to read properties file {}: {e}",
            path.display()
        ))
    })?;
    Ok(parse(&contents))
}

/// Serialize entries so that `parse` yields the same map back
pub fn to_string<'a, I>(entries: I, header: Option<&str>) -> String
where
    I: IntoIterator<Item = (&'a String, &'a String)>,
{
    let mut out = String::new();
    if let Some(header) = header {
        for line in header.lines() {
            let _ = writeln!(out, "# {line}");
        }
    }
    for (key, value) in entries {
        let _ = writeln!(out, "{}={}", escape(key, true), escape(value, false));
    }
    out
}

/// Join continued physical lines, dropping blanks and comments.
fn logical_lines(contents: &str) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut continuing = false;

    for raw in contents.lines() {
        let line = raw.trim_start();
        if !continuing && (line.is_empty() || line.starts_with('#') || line.starts_with('!')) {
            continue;
        }

        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            current.push_str(&line[..line.len() - 1]);
            continuing = true;
        } else {
            current.push_str(line);
            lines.push(std::mem::take(&mut current));
            continuing = false;
        }
    }
    if continuing && !current.is_empty() {
        lines.push(current);
    }
    lines
}

/// Split a logical line into its raw (still escaped) key and value.
fn split_entry(line: &str) -> (&str, &str) {
    let mut escaped = false;
    let mut key_end = line.len();
    let mut separator = None;

    for (idx, c) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match c {
            '\\' => escaped = true,
            '=' | ':' => {
                key_end = idx;
                separator = Some(c);
                break;
            }
            c if c.is_whitespace() => {
                key_end = idx;
                separator = Some(c);
                break;
            }
            _ => {}
        }
    }

    let key = &line[..key_end];
    let Some(separator) = separator else {
        return (key, "");
    };

    let mut rest = line[key_end + separator.len_utf8()..].trim_start();
    if separator.is_whitespace() {
        if let Some(stripped) = rest.strip_prefix(&['=', ':'][..]) {
            rest = stripped.trim_start();
        }
    }
    (key, rest)
}

fn unescape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{000c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push('u');
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}

fn escape(value: &str, is_key: bool) -> String {
    let mut out = String::with_capacity(value.len());
    for (idx, c) in value.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\u{000c}' => out.push_str("\\f"),
            '=' | ':' | '#' | '!' if is_key => {
                out.push('\\');
                out.push(c);
            }
            ' ' if is_key || idx == 0 => out.push_str("\\ "),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_separators_and_comments() {
        let contents = r"
            # comment
            ! also a comment
            inference_address=http://0.0.0.0:8080
            keystore : src/test/resources/keystore.pem
            job_queue_size 50
            empty=
            bare
        ";
        let props = parse(contents);

        assert_eq!(props["inference_address"], "http://0.0.0.0:8080");
        assert_eq!(props["keystore"], "src/test/resources/keystore.pem");
        assert_eq!(props["job_queue_size"], "50");
        assert_eq!(props["empty"], "");
        assert_eq!(props["bare"], "");
        assert_eq!(props.len(), 5);
    }

    #[test]
    fn test_parse_continuation_lines() {
        let contents = "models={\\\n  \"noop\": {\\\n    \"1.0\": {\"batchSize\": 4}\\\n  }\\\n}\n";
        let props = parse(contents);
        assert_eq!(props["models"], "{\"noop\": {\"1.0\": {\"batchSize\": 4}}}");
    }

    #[test]
    fn test_parse_escapes() {
        let props = parse("a\\=b=c\\:d\nunicode=\\u00e9t\\u00e9\npath=C:\\\\models\n");
        assert_eq!(props["a=b"], "c:d");
        assert_eq!(props["unicode"], "été");
        assert_eq!(props["path"], "C:\\models");
    }

    #[test]
    fn test_last_duplicate_wins() {
        let props = parse("batch=1\nbatch=2\n");
        assert_eq!(props["batch"], "2");
    }

    #[test]
    fn test_serialize_round_trip() {
        let mut entries = BTreeMap::new();
        entries.insert("plain".to_string(), "value".to_string());
        entries.insert("with space".to_string(), " leading space".to_string());
        entries.insert("multi".to_string(), "line one\nline two\\".to_string());
        entries.insert("#hash".to_string(), "x=y:z".to_string());
        entries.insert("empty".to_string(), String::new());

        let text = to_string(&entries, Some("tserve snapshot"));
        assert!(text.starts_with("# tserve snapshot\n"));
        assert_eq!(parse(&text), entries);
    }
}
