//! Parser for the INI-style configuration format.

use super::errors::FormatError;
use super::types::{ConfigNode, ConfigValue, Scalar};

/// Parse configuration text into a node tree.
///
/// Keys before the first `[section]` header belong to the root node. A
/// header that names an existing section continues it; duplicate keys keep
/// the last value.
///
/// # Errors
///
/// Returns a [`FormatError`] naming the first offending line.
pub fn parse(source: &str) -> Result<ConfigNode, FormatError> {
    let source = source.strip_prefix('\u{feff}').unwrap_or(source);
    let mut root = ConfigNode::new();
    let mut current: Option<String> = None;

    for (idx, raw) in source.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();

        if line.is_empty() || is_comment(line) {
            continue;
        }

        if let Some(rest) = line.strip_prefix('[') {
            let name = parse_section_header(rest, line_no)?;
            root.section_mut(&name);
            current = Some(name);
            continue;
        }

        let (key, value) = parse_assignment(line, line_no)?;
        let target = match &current {
            Some(name) => root.section_mut(name),
            None => &mut root,
        };
        target.insert(key, ConfigValue::Scalar(value));
    }

    Ok(root)
}

fn is_comment(text: &str) -> bool {
    text.starts_with(';') || text.starts_with('#')
}

fn parse_section_header(rest: &str, line_no: usize) -> Result<String, FormatError> {
    let close = rest
        .find(']')
        .ok_or_else(|| FormatError::new(line_no, "unterminated section header"))?;

    let name = rest[..close].trim();
    if name.is_empty() {
        return Err(FormatError::new(line_no, "empty section name"));
    }

    expect_trailing_comment(&rest[close + 1..], line_no)?;
    Ok(name.to_string())
}

fn parse_assignment(line: &str, line_no: usize) -> Result<(String, Scalar), FormatError> {
    let eq = line
        .find('=')
        .ok_or_else(|| FormatError::new(line_no, "expected 'key = value'"))?;

    let key = line[..eq].trim();
    if key.is_empty() {
        return Err(FormatError::new(line_no, "empty key"));
    }
    if key.contains(['[', ']']) {
        return Err(FormatError::new(
            line_no,
            format!("unsupported array key '{}'", key),
        ));
    }

    let value = parse_value(line[eq + 1..].trim(), line_no)?;
    Ok((key.to_string(), value))
}

fn parse_value(text: &str, line_no: usize) -> Result<Scalar, FormatError> {
    if let Some(rest) = text.strip_prefix('"') {
        let (value, remainder) = parse_double_quoted(rest, line_no)?;
        expect_trailing_comment(remainder, line_no)?;
        return Ok(Scalar::String(value));
    }

    if let Some(rest) = text.strip_prefix('\'') {
        let close = rest
            .find('\'')
            .ok_or_else(|| FormatError::new(line_no, "unterminated quoted value"))?;
        expect_trailing_comment(&rest[close + 1..], line_no)?;
        return Ok(Scalar::String(rest[..close].to_string()));
    }

    let bare = match text.find(';') {
        Some(idx) => &text[..idx],
        None => text,
    };
    Ok(Scalar::infer(bare))
}

/// Returns the unescaped string and whatever follows the closing quote.
fn parse_double_quoted(rest: &str, line_no: usize) -> Result<(String, &str), FormatError> {
    let mut value = String::new();
    let mut chars = rest.char_indices();

    while let Some((idx, c)) = chars.next() {
        match c {
            '"' => return Ok((value, &rest[idx + 1..])),
            '\\' => match chars.next() {
                Some((_, '"')) => value.push('"'),
                Some((_, '\\')) => value.push('\\'),
                Some((_, 'n')) => value.push('\n'),
                Some((_, other)) => {
                    value.push('\\');
                    value.push(other);
                }
                None => value.push('\\'),
            },
            _ => value.push(c),
        }
    }

    Err(FormatError::new(line_no, "unterminated quoted value"))
}

fn expect_trailing_comment(remainder: &str, line_no: usize) -> Result<(), FormatError> {
    let remainder = remainder.trim();
    if remainder.is_empty() || is_comment(remainder) {
        Ok(())
    } else {
        Err(FormatError::new(
            line_no,
            format!("unexpected trailing text '{}'", remainder),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scalar(node: &ConfigNode, key: &str) -> Scalar {
        match node.get(key) {
            Some(ConfigValue::Scalar(value)) => value.clone(),
            other => panic!("expected scalar at '{}', got {:?}", key, other),
        }
    }

    fn section<'a>(node: &'a ConfigNode, key: &str) -> &'a ConfigNode {
        match node.get(key) {
            Some(ConfigValue::Section(section)) => section,
            other => panic!("expected section at '{}', got {:?}", key, other),
        }
    }

    #[test]
    fn test_parse_sections_and_root_keys() {
        let node = parse(
            r#"
; global settings
name = "app"

[db]
host = "localhost"
port = 5432

[features]
beta = on
"#,
        )
        .unwrap();

        assert_eq!(scalar(&node, "name"), Scalar::from("app"));
        let db = section(&node, "db");
        assert_eq!(scalar(db, "host"), Scalar::from("localhost"));
        assert_eq!(scalar(db, "port"), Scalar::Int(5432));
        assert_eq!(scalar(section(&node, "features"), "beta"), Scalar::Bool(true));
    }

    #[test]
    fn test_parse_typed_scalars() {
        let node = parse("a = 1\nb = 1.5\nc = false\nd = hello world\ne = \"42\"\nf =\n").unwrap();

        assert_eq!(scalar(&node, "a"), Scalar::Int(1));
        assert_eq!(scalar(&node, "b"), Scalar::Float(1.5));
        assert_eq!(scalar(&node, "c"), Scalar::Bool(false));
        assert_eq!(scalar(&node, "d"), Scalar::from("hello world"));
        // quoted values are never inferred
        assert_eq!(scalar(&node, "e"), Scalar::from("42"));
        assert_eq!(scalar(&node, "f"), Scalar::from(""));
    }

    #[test]
    fn test_parse_quoting_and_comments() {
        let node = parse(
            "a = \"say \\\"hi\\\"\" ; greeting\nb = 'C:\\path'\nc = 10 ; ten\nd = \"x;y\"\n",
        )
        .unwrap();

        assert_eq!(scalar(&node, "a"), Scalar::from("say \"hi\""));
        assert_eq!(scalar(&node, "b"), Scalar::from("C:\\path"));
        assert_eq!(scalar(&node, "c"), Scalar::Int(10));
        assert_eq!(scalar(&node, "d"), Scalar::from("x;y"));
    }

    #[test]
    fn test_reopened_section_continues() {
        let node = parse("[db]\nhost = a\n[cache]\nttl = 5\n[db]\nport = 1\n").unwrap();

        let db = section(&node, "db");
        assert_eq!(db.len(), 2);
        assert_eq!(node.len(), 2);
    }

    #[test]
    fn test_duplicate_key_last_wins() {
        let node = parse("port = 1\nport = 2\n").unwrap();
        assert_eq!(scalar(&node, "port"), Scalar::Int(2));
        assert_eq!(node.len(), 1);
    }

    #[test]
    fn test_parse_errors_report_line() {
        let err = parse("a = 1\nthis is not valid\n").unwrap_err();
        assert_eq!(err.line, 2);

        let err = parse("[db\nhost = x\n").unwrap_err();
        assert_eq!(err.line, 1);
        assert!(err.message.contains("unterminated section"));

        let err = parse("[ ]\n").unwrap_err();
        assert!(err.message.contains("empty section"));

        let err = parse("= 5\n").unwrap_err();
        assert!(err.message.contains("empty key"));

        let err = parse("a = \"open\n").unwrap_err();
        assert!(err.message.contains("unterminated quoted"));

        let err = parse("list[] = 1\n").unwrap_err();
        assert!(err.message.contains("array key"));

        let err = parse("a = \"x\" y\n").unwrap_err();
        assert!(err.message.contains("trailing text"));
    }

    #[test]
    fn test_parse_empty_source() {
        assert!(parse("").unwrap().is_empty());
        assert!(parse("\u{feff}; only a comment\n").unwrap().is_empty());
    }
}
