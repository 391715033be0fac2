//! Value types shared by the text format and the collection layer.

use serde::Serialize;
use std::fmt;

/// A typed leaf value.
///
/// The type is decided once, when the value is parsed or constructed, and
/// never re-inferred afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

impl Scalar {
    /// Infer a typed scalar from unquoted text, the same way the parser does.
    pub fn infer(text: &str) -> Scalar {
        let text = text.trim();
        match text.to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" => return Scalar::Bool(true),
            "false" | "off" | "no" | "none" => return Scalar::Bool(false),
            "null" | "" => return Scalar::String(String::new()),
            _ => {}
        }

        if is_integer_literal(text)
            && let Ok(value) = text.parse::<i64>()
        {
            return Scalar::Int(value);
        }

        if is_float_literal(text)
            && let Ok(value) = text.parse::<f64>()
        {
            return Scalar::Float(value);
        }

        Scalar::String(text.to_string())
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Scalar::Bool(_) => "bool",
            Scalar::Int(_) => "int",
            Scalar::Float(_) => "float",
            Scalar::String(_) => "string",
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Scalar::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Scalar::Int(value) => Some(*value),
            _ => None,
        }
    }

    /// Floats, and integers widened to float.
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Scalar::Float(value) => Some(*value),
            Scalar::Int(value) => Some(*value as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::String(value) => Some(value),
            _ => None,
        }
    }
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn is_float_literal(text: &str) -> bool {
    let body = text.strip_prefix(['-', '+']).unwrap_or(text);
    let (mantissa, exponent) = match body.find(['e', 'E']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    let mut parts = mantissa.splitn(2, '.');
    let whole = parts.next().unwrap_or("");
    let fraction = parts.next();

    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    let mantissa_ok = all_digits(whole)
        && fraction.is_none_or(all_digits)
        && (!whole.is_empty() || fraction.is_some_and(|f| !f.is_empty()));

    let exponent_ok = match exponent {
        Some(exp) => {
            let exp = exp.strip_prefix(['-', '+']).unwrap_or(exp);
            !exp.is_empty() && all_digits(exp)
        }
        None => true,
    };

    // Plain integers are handled by is_integer_literal
    mantissa_ok && exponent_ok && (fraction.is_some() || exponent.is_some())
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(value) => write!(f, "{}", value),
            Scalar::Int(value) => write!(f, "{}", value),
            Scalar::Float(value) => write!(f, "{:?}", value),
            Scalar::String(value) => f.write_str(value),
        }
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<i32> for Scalar {
    fn from(value: i32) -> Self {
        Scalar::Int(i64::from(value))
    }
}

impl From<u32> for Scalar {
    fn from(value: u32) -> Self {
        Scalar::Int(i64::from(value))
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::String(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::String(value)
    }
}

/// A value stored under a key: a leaf scalar or a nested section.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ConfigValue {
    Scalar(Scalar),
    Section(ConfigNode),
}

impl ConfigValue {
    pub fn is_section(&self) -> bool {
        matches!(self, ConfigValue::Section(_))
    }
}

impl From<Scalar> for ConfigValue {
    fn from(value: Scalar) -> Self {
        ConfigValue::Scalar(value)
    }
}

impl From<ConfigNode> for ConfigValue {
    fn from(value: ConfigNode) -> Self {
        ConfigValue::Section(value)
    }
}

/// An owned, insertion-ordered mapping of keys to values.
///
/// This is the shape the parser produces and the writer consumes. Keys are
/// unique; inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigNode {
    entries: Vec<(String, ConfigValue)>,
}

impl ConfigNode {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigValue> {
        self.entries
            .iter_mut()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Insert or replace, keeping the original position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) {
        let key = key.into();
        let value = value.into();
        match self.get_mut(&key) {
            Some(slot) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        let idx = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(idx).1)
    }

    /// Section at `key`, created empty if absent.
    ///
    /// A scalar already stored at `key` is replaced by the new section.
    pub fn section_mut(&mut self, key: &str) -> &mut ConfigNode {
        if !matches!(self.get(key), Some(ConfigValue::Section(_))) {
            self.insert(key, ConfigNode::new());
        }
        match self.get_mut(key) {
            Some(ConfigValue::Section(node)) => node,
            _ => unreachable!("section inserted above"),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl IntoIterator for ConfigNode {
    type Item = (String, ConfigValue);
    type IntoIter = std::vec::IntoIter<(String, ConfigValue)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Serialize for ConfigNode {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
