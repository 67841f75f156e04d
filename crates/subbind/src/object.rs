use std::{
    fmt::{self, Write},
    hash::{Hash, Hasher},
};

/// A Python value that flows through subscript binding.
///
/// `Object` owns all of its data, so index components, assigned values, keyword values
/// and parameter defaults can be freely cloned, serialized, or stored between calls.
///
/// # JSON Serialization
///
/// The derived serde impls use an externally tagged format with Python-style aliases
/// (`{"int": 42}`, `{"tuple": [...]}`), which is what `postcard` persistence relies on.
/// [`Object::to_json_value`] and [`Object::from_json_value`] provide the natural mapping:
///
/// - `None` ↔ JSON `null`
/// - `Bool` ↔ JSON `true`/`false`
/// - `Int` ↔ JSON integer
/// - `Float` ↔ JSON float
/// - `String` ↔ JSON string
/// - `List` ↔ JSON array
/// - `Tuple` ↔ `{"$tuple": [...]}`
/// - `Slice` ↔ `{"$slice": [start, stop, step]}`
/// - `Dict` ↔ JSON object (string keys)
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum Object {
    /// Python's `Ellipsis` singleton (`...`).
    #[serde(alias = "ellipsis")]
    Ellipsis,
    /// Python's `None` singleton.
    #[serde(alias = "none", alias = "NoneType")]
    None,
    /// Python boolean (`True` or `False`).
    #[serde(alias = "bool")]
    Bool(bool),
    /// Python integer (64-bit signed).
    #[serde(alias = "int")]
    Int(i64),
    /// Python float (64-bit IEEE 754).
    #[serde(alias = "float")]
    Float(f64),
    /// Python string (UTF-8).
    #[serde(alias = "str")]
    String(String),
    /// Python bytes object.
    #[serde(alias = "bytes")]
    Bytes(Vec<u8>),
    /// Python list (mutable sequence).
    #[serde(alias = "list")]
    List(Vec<Self>),
    /// Python tuple (immutable sequence).
    ///
    /// The empty tuple doubles as the "no index components" sentinel.
    #[serde(alias = "tuple")]
    Tuple(Vec<Self>),
    /// Python dictionary (insertion-ordered mapping).
    #[serde(alias = "dict")]
    Dict(DictPairs),
    /// Python slice, as produced by `a[start:stop:step]` index components.
    #[serde(alias = "slice")]
    Slice {
        start: Box<Self>,
        stop: Box<Self>,
        step: Box<Self>,
    },
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            _ => self.repr_fmt(f),
        }
    }
}

impl Object {
    /// The empty tuple, used as the aggregated index when no positional components are written.
    #[must_use]
    pub fn empty_tuple() -> Self {
        Self::Tuple(Vec::new())
    }

    /// Convenience constructor for string values.
    #[must_use]
    pub fn str(s: impl Into<String>) -> Self {
        Self::String(s.into())
    }

    /// Builds a slice object, filling omitted bounds with `None` like `a[start:stop]` does.
    #[must_use]
    pub fn slice(start: Option<Self>, stop: Option<Self>, step: Option<Self>) -> Self {
        Self::Slice {
            start: Box::new(start.unwrap_or(Self::None)),
            stop: Box::new(stop.unwrap_or(Self::None)),
            step: Box::new(step.unwrap_or(Self::None)),
        }
    }

    /// Builds a dict from an iterable of key/value pairs.
    pub fn dict(dict: impl Into<DictPairs>) -> Self {
        Self::Dict(dict.into())
    }

    /// Returns the Python `repr()` string for this value.
    #[must_use]
    pub fn py_repr(&self) -> String {
        let mut s = String::new();
        // writing into a String cannot fail
        let _ = self.repr_fmt(&mut s);
        s
    }

    /// Converts this value to its natural JSON representation.
    #[must_use]
    pub fn to_json_value(&self) -> serde_json::Value {
        use serde_json::{Value as JV, json};
        match self {
            Self::None => JV::Null,
            Self::Ellipsis => json!({"$ellipsis": true}),
            Self::Bool(b) => JV::Bool(*b),
            Self::Int(i) => json!(i),
            Self::Float(f) => {
                if f.is_nan() || f.is_infinite() {
                    JV::Null
                } else {
                    json!(f)
                }
            }
            Self::String(s) => JV::String(s.clone()),
            Self::Bytes(b) => json!({"$bytes": b}),
            Self::List(items) => JV::Array(items.iter().map(Self::to_json_value).collect()),
            Self::Tuple(items) => json!({"$tuple": items.iter().map(Self::to_json_value).collect::<Vec<_>>()}),
            Self::Dict(pairs) => {
                let map: serde_json::Map<String, JV> = pairs
                    .iter()
                    .map(|(k, v)| {
                        let key = match k {
                            Self::String(s) => s.clone(),
                            other => other.py_repr(),
                        };
                        (key, v.to_json_value())
                    })
                    .collect();
                JV::Object(map)
            }
            Self::Slice { start, stop, step } => {
                json!({"$slice": [start.to_json_value(), stop.to_json_value(), step.to_json_value()]})
            }
        }
    }

    /// Converts a JSON value to an `Object`.
    ///
    /// Objects with a single `$tuple`, `$slice`, `$bytes` or `$ellipsis` key map back to
    /// the corresponding variant; other objects try the tagged serde format first
    /// (`{"int": 42}`) and then fall back to a dict with string keys.
    #[must_use]
    pub fn from_json_value(value: serde_json::Value) -> Self {
        use serde_json::Value as JV;
        match value {
            JV::Null => Self::None,
            JV::Bool(b) => Self::Bool(b),
            JV::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JV::String(s) => Self::String(s),
            JV::Array(arr) => Self::List(arr.into_iter().map(Self::from_json_value).collect()),
            JV::Object(map) => {
                if map.len() == 1
                    && let Some((key, inner)) = map.iter().next()
                {
                    match (key.as_str(), inner) {
                        ("$tuple", JV::Array(items)) => {
                            return Self::Tuple(items.iter().cloned().map(Self::from_json_value).collect());
                        }
                        ("$slice", JV::Array(parts)) if parts.len() == 3 => {
                            let mut parts = parts.iter().cloned().map(Self::from_json_value);
                            return Self::slice(parts.next(), parts.next(), parts.next());
                        }
                        ("$ellipsis", _) => return Self::Ellipsis,
                        ("$bytes", JV::Array(_)) => {
                            if let Ok(bytes) = serde_json::from_value::<Vec<u8>>(inner.clone()) {
                                return Self::Bytes(bytes);
                            }
                        }
                        _ => {}
                    }
                }
                let value = JV::Object(map);
                if let Ok(obj) = serde_json::from_value::<Self>(value.clone()) {
                    return obj;
                }
                let JV::Object(map) = value else {
                    return Self::None;
                };
                map.into_iter()
                    .map(|(k, v)| (Self::String(k), Self::from_json_value(v)))
                    .collect::<DictPairs>()
                    .into()
            }
        }
    }

    fn repr_fmt(&self, f: &mut impl Write) -> fmt::Result {
        match self {
            Self::Ellipsis => f.write_str("Ellipsis"),
            Self::None => f.write_str("None"),
            Self::Bool(true) => f.write_str("True"),
            Self::Bool(false) => f.write_str("False"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => {
                let s = v.to_string();
                f.write_str(&s)?;
                if !s.contains('.') && v.is_finite() {
                    f.write_str(".0")?;
                }
                Ok(())
            }
            Self::String(s) => string_repr_fmt(s, f),
            Self::Bytes(b) => bytes_repr_fmt(b, f),
            Self::List(l) => {
                f.write_char('[')?;
                write_items(l, f)?;
                f.write_char(']')
            }
            Self::Tuple(t) => {
                f.write_char('(')?;
                write_items(t, f)?;
                if t.len() == 1 {
                    f.write_char(',')?;
                }
                f.write_char(')')
            }
            Self::Dict(d) => {
                f.write_char('{')?;
                let mut iter = d.iter();
                if let Some((k, v)) = iter.next() {
                    k.repr_fmt(f)?;
                    f.write_str(": ")?;
                    v.repr_fmt(f)?;
                    for (k, v) in iter {
                        f.write_str(", ")?;
                        k.repr_fmt(f)?;
                        f.write_str(": ")?;
                        v.repr_fmt(f)?;
                    }
                }
                f.write_char('}')
            }
            Self::Slice { start, stop, step } => {
                f.write_str("slice(")?;
                start.repr_fmt(f)?;
                f.write_str(", ")?;
                stop.repr_fmt(f)?;
                f.write_str(", ")?;
                step.repr_fmt(f)?;
                f.write_char(')')
            }
        }
    }

    /// Returns the Python type name for this value (e.g., `"int"`, `"str"`, `"tuple"`).
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::None => "NoneType",
            Self::Ellipsis => "ellipsis",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "str",
            Self::Bytes(_) => "bytes",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Dict(_) => "dict",
            Self::Slice { .. } => "slice",
        }
    }
}

fn write_items(items: &[Object], f: &mut impl Write) -> fmt::Result {
    let mut iter = items.iter();
    if let Some(first) = iter.next() {
        first.repr_fmt(f)?;
        for item in iter {
            f.write_str(", ")?;
            item.repr_fmt(f)?;
        }
    }
    Ok(())
}

/// Writes a CPython-compatible repr of a str.
///
/// Double quotes are only used when the string contains a single quote and no double quote.
pub(crate) fn string_repr_fmt(s: &str, f: &mut impl Write) -> fmt::Result {
    let quote = if s.contains('\'') && !s.contains('"') { '"' } else { '\'' };
    f.write_char(quote)?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '\t' => f.write_str("\\t")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            c if c == quote => {
                f.write_char('\\')?;
                f.write_char(c)?;
            }
            c if u32::from(c) < 0x20 || u32::from(c) == 0x7f => write!(f, "\\x{:02x}", u32::from(c))?,
            c => f.write_char(c)?,
        }
    }
    f.write_char(quote)
}

fn bytes_repr_fmt(bytes: &[u8], f: &mut impl Write) -> fmt::Result {
    let has_single = bytes.contains(&b'\'');
    let has_double = bytes.contains(&b'"');
    let quote = if has_single && !has_double { '"' } else { '\'' };

    f.write_char('b')?;
    f.write_char(quote)?;
    for &byte in bytes {
        match byte {
            b'\\' => f.write_str("\\\\")?,
            b'\t' => f.write_str("\\t")?,
            b'\n' => f.write_str("\\n")?,
            b'\r' => f.write_str("\\r")?,
            b'\'' if quote == '\'' => f.write_str("\\'")?,
            b'"' if quote == '"' => f.write_str("\\\"")?,
            0x20..=0x7e => f.write_char(char::from(byte))?,
            _ => write!(f, "\\x{byte:02x}")?,
        }
    }
    f.write_char(quote)
}

impl Hash for Object {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Ellipsis | Self::None => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::Bytes(b) => b.hash(state),
            Self::List(items) | Self::Tuple(items) => items.hash(state),
            Self::Dict(pairs) => {
                for (k, v) in pairs {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Self::Slice { start, stop, step } => {
                start.hash(state);
                stop.hash(state);
                step.hash(state);
            }
        }
    }
}

impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Ellipsis, Self::Ellipsis) => true,
            (Self::None, Self::None) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            // Use to_bits() for float comparison to be consistent with Hash
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::String(a), Self::String(b)) => a == b,
            (Self::Bytes(a), Self::Bytes(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Tuple(a), Self::Tuple(b)) => a == b,
            (Self::Dict(a), Self::Dict(b)) => a == b,
            (
                Self::Slice {
                    start: a_start,
                    stop: a_stop,
                    step: a_step,
                },
                Self::Slice {
                    start: b_start,
                    stop: b_stop,
                    step: b_step,
                },
            ) => a_start == b_start && a_stop == b_stop && a_step == b_step,
            _ => false,
        }
    }
}

impl Eq for Object {}

impl From<i64> for Object {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Object {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<bool> for Object {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<f64> for Object {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Object {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<String> for Object {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<DictPairs> for Object {
    fn from(pairs: DictPairs) -> Self {
        Self::Dict(pairs)
    }
}

/// Error returned when an `Object` cannot be converted to the requested Rust type.
#[derive(Debug)]
pub struct ConversionError {
    /// The type name that was expected (e.g., "int", "str").
    pub expected: &'static str,
    /// The actual type name of the `Object` (e.g., "list", "NoneType").
    pub actual: &'static str,
}

impl ConversionError {
    #[must_use]
    pub fn new(expected: &'static str, actual: &'static str) -> Self {
        Self { expected, actual }
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, got {}", self.expected, self.actual)
    }
}

impl std::error::Error for ConversionError {}

impl TryFrom<&Object> for i64 {
    type Error = ConversionError;

    fn try_from(value: &Object) -> Result<Self, Self::Error> {
        match value {
            Object::Int(i) => Ok(*i),
            Object::Bool(b) => Ok(Self::from(*b)),
            _ => Err(ConversionError::new("int", value.type_name())),
        }
    }
}

/// Ordered key/value pairs backing `Object::Dict`.
///
/// Kept as a plain vector so keys need not be hashable and insertion order is preserved.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct DictPairs(Vec<(Object, Object)>);

impl From<Vec<(Object, Object)>> for DictPairs {
    fn from(pairs: Vec<(Object, Object)>) -> Self {
        Self(pairs)
    }
}

impl IntoIterator for DictPairs {
    type Item = (Object, Object);
    type IntoIter = std::vec::IntoIter<(Object, Object)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a DictPairs {
    type Item = &'a (Object, Object);
    type IntoIter = std::slice::Iter<'a, (Object, Object)>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl FromIterator<(Object, Object)> for DictPairs {
    fn from_iter<T: IntoIterator<Item = (Object, Object)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl DictPairs {
    fn iter(&self) -> impl Iterator<Item = &(Object, Object)> {
        self.0.iter()
    }
}
