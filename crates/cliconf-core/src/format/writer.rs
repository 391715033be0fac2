//! Writer for the INI-style configuration format.

use super::types::{ConfigNode, ConfigValue, Scalar};

/// Serialize a node tree to configuration text.
///
/// Scalars of a node are written before its sections so that a reload
/// attributes every key to the node it came from. Strings are always
/// quoted; numbers and booleans are written bare.
pub fn serialize(node: &ConfigNode) -> String {
    let mut out = String::new();
    write_node(&mut out, node);
    out
}

fn write_node(out: &mut String, node: &ConfigNode) {
    for (key, value) in node.iter() {
        if let ConfigValue::Scalar(scalar) = value {
            out.push_str(key);
            out.push_str(" = ");
            out.push_str(&format_scalar(scalar));
            out.push('\n');
        }
    }

    for (key, value) in node.iter() {
        if let ConfigValue::Section(section) = value {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push('[');
            out.push_str(key);
            out.push_str("]\n");
            write_node(out, section);
        }
    }
}

fn format_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Bool(value) => value.to_string(),
        Scalar::Int(value) => value.to_string(),
        Scalar::Float(value) if value.is_finite() => format!("{:?}", value),
        Scalar::Float(value) => quote(&value.to_string()),
        Scalar::String(value) => quote(value),
    }
}

fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '"' => quoted.push_str("\\\""),
            '\\' => quoted.push_str("\\\\"),
            '\n' => quoted.push_str("\\n"),
            _ => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::parse;

    #[test]
    fn test_serialize_layout() {
        let mut node = ConfigNode::new();
        node.section_mut("db").insert("host", Scalar::from("local"));
        node.insert("name", Scalar::from("app"));
        node.section_mut("db").insert("port", Scalar::Int(5432));

        assert_eq!(
            serialize(&node),
            "name = \"app\"\n\n[db]\nhost = \"local\"\nport = 5432\n"
        );
    }

    #[test]
    fn test_serialize_scalar_forms() {
        let mut node = ConfigNode::new();
        node.insert("b", Scalar::Bool(true));
        node.insert("f", Scalar::Float(2.0));
        node.insert("s", Scalar::from("12"));
        node.insert("q", Scalar::from("a \"b\" \\ c"));

        assert_eq!(
            serialize(&node),
            "b = true\nf = 2.0\ns = \"12\"\nq = \"a \\\"b\\\" \\\\ c\"\n"
        );
    }

    #[test]
    fn test_serialized_text_parses_back() {
        let mut node = ConfigNode::new();
        node.insert("flag", Scalar::Bool(false));
        node.insert("count", Scalar::Int(-3));
        node.insert("ratio", Scalar::Float(0.25));
        node.insert("big", Scalar::Float(1e20));
        node.insert("text", Scalar::from("line one\nline two; \"quoted\""));
        node.insert("numeric_text", Scalar::from("007"));
        node.section_mut("db").insert("host", Scalar::from("localhost"));

        let reparsed = parse(&serialize(&node)).unwrap();
        assert_eq!(reparsed, node);
    }

    #[test]
    fn test_serialize_empty() {
        assert_eq!(serialize(&ConfigNode::new()), "");
    }
}
