use std::fmt;

use strum::{Display, IntoStaticStr};

use crate::{resource::ResourceError, subscript::SubscriptOp};

/// Result type alias for subscript operations that can fail at runtime.
pub type RunResult<T> = Result<T, RunError>;

/// Python exception types a subscript operation can surface.
///
/// Uses strum derives for automatic `Display` and `Into<&'static str>` implementations.
/// The string representation matches the variant name exactly (e.g., `TypeError` -> "TypeError").
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, serde::Serialize, serde::Deserialize,
)]
pub enum ExcType {
    /// Wrong argument shapes: binding failures and unsupported subscript operations.
    TypeError,
    /// Missing mapping key, the usual failure of a read handler.
    KeyError,
    /// Out-of-range sequence index.
    IndexError,
    ValueError,
    /// Malformed flattened arguments such as a repeated keyword.
    SyntaxError,
    RuntimeError,
}

/// Why keyword-aware argument binding failed.
///
/// These are the only two failure modes of [`Signature::bind`](crate::Signature::bind);
/// both are ordinary values handed back to the caller.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum BindingError {
    /// One or more non-defaulted extra parameters received no keyword.
    ///
    /// Names are in parameter declaration order, not the order keywords were written.
    MissingRequired(Vec<String>),
    /// A keyword matched no parameter eligible for keyword binding.
    UnexpectedKeyword(String),
}

impl BindingError {
    /// Names of the missing parameters, empty for `UnexpectedKeyword`.
    #[must_use]
    pub fn missing_names(&self) -> &[String] {
        match self {
            Self::MissingRequired(names) => names,
            Self::UnexpectedKeyword(_) => &[],
        }
    }
}

impl fmt::Display for BindingError {
    /// Matches CPython's wording, without the leading `{name}()`:
    /// `missing 2 required positional arguments: 'a' and 'b'`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRequired(names) => {
                let count = names.len();
                let plural = if count == 1 { "" } else { "s" };
                write!(
                    f,
                    "missing {count} required positional argument{plural}: {}",
                    format_param_names(names)
                )
            }
            Self::UnexpectedKeyword(name) => write!(f, "got an unexpected keyword argument '{name}'"),
        }
    }
}

impl std::error::Error for BindingError {}

/// An exception with a type and an optional message, raised by handlers or the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SimpleException {
    exc_type: ExcType,
    arg: Option<String>,
}

impl fmt::Display for SimpleException {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let type_str: &'static str = self.exc_type.into();
        match &self.arg {
            Some(arg) => write!(f, "{type_str}: {arg}"),
            None => f.write_str(type_str),
        }
    }
}

impl std::error::Error for SimpleException {}

impl SimpleException {
    #[must_use]
    pub fn new(exc_type: ExcType, arg: Option<String>) -> Self {
        Self { exc_type, arg }
    }

    #[must_use]
    pub fn new_msg(exc_type: ExcType, arg: impl fmt::Display) -> Self {
        Self {
            exc_type,
            arg: Some(arg.to_string()),
        }
    }

    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        self.exc_type
    }

    #[must_use]
    pub fn arg(&self) -> Option<&String> {
        self.arg.as_ref()
    }
}

/// Failure of a dispatched subscript operation.
#[derive(Debug, Clone)]
pub enum RunError {
    /// The handler's signature could not be satisfied by the subscript's arguments.
    Binding {
        /// Qualified handler name used in the message, e.g. `KwGetitem.__getitem__`.
        qualname: String,
        error: BindingError,
    },
    /// Raised by the handler itself or by the dispatcher (unsupported operation).
    Exception(SimpleException),
    /// A configured resource limit was exceeded before binding started.
    Resource(ResourceError),
}

impl RunError {
    /// The Python exception type this error surfaces as.
    #[must_use]
    pub fn exc_type(&self) -> ExcType {
        match self {
            Self::Binding { .. } => ExcType::TypeError,
            Self::Exception(exc) => exc.exc_type(),
            Self::Resource(_) => ExcType::RuntimeError,
        }
    }

    /// The exception message without the leading type name.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Binding { qualname, error } => format!("{qualname}() {error}"),
            Self::Exception(exc) => exc.arg().cloned().unwrap_or_default(),
            Self::Resource(err) => err.to_string(),
        }
    }

    /// Returns the binding error if this failure came from argument binding.
    #[must_use]
    pub fn binding_error(&self) -> Option<&BindingError> {
        match self {
            Self::Binding { error, .. } => Some(error),
            _ => None,
        }
    }
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Binding { .. } => write!(f, "{}: {}", self.exc_type(), self.message()),
            Self::Exception(exc) => write!(f, "{exc}"),
            Self::Resource(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for RunError {}

impl From<SimpleException> for RunError {
    fn from(exc: SimpleException) -> Self {
        Self::Exception(exc)
    }
}

impl From<ResourceError> for RunError {
    fn from(err: ResourceError) -> Self {
        Self::Resource(err)
    }
}

impl ExcType {
    /// Creates a TypeError for a type without the requested subscript handler.
    ///
    /// Matches CPython's wording for each operation:
    /// - `'T' object is not subscriptable`
    /// - `'T' object does not support item assignment`
    /// - `'T' object doesn't support item deletion`
    #[must_use]
    pub(crate) fn type_error_unsupported(type_name: &str, op: SubscriptOp) -> RunError {
        let msg = match op {
            SubscriptOp::GetItem => format!("'{type_name}' object is not subscriptable"),
            SubscriptOp::SetItem => format!("'{type_name}' object does not support item assignment"),
            SubscriptOp::DelItem => format!("'{type_name}' object doesn't support item deletion"),
        };
        SimpleException::new_msg(Self::TypeError, msg).into()
    }

    /// Creates a TypeError for a type whose handler for `op` was declared for another operation.
    #[must_use]
    pub(crate) fn type_error_signature_mismatch(type_name: &str, op: SubscriptOp, declared: SubscriptOp) -> RunError {
        SimpleException::new_msg(
            Self::TypeError,
            format!("{type_name}.{op}() is declared with a {declared}() signature"),
        )
        .into()
    }

    /// Creates a SyntaxError for a keyword written twice in one subscript.
    ///
    /// Matches CPython's format: `keyword argument repeated: {name}`
    #[must_use]
    pub(crate) fn syntax_error_repeated_keyword(name: &str) -> SimpleException {
        SimpleException::new_msg(Self::SyntaxError, format!("keyword argument repeated: {name}"))
    }

    /// Creates a KeyError carrying the repr of the missing key.
    #[must_use]
    pub fn key_error(key: &crate::Object) -> RunError {
        SimpleException::new_msg(Self::KeyError, key.py_repr()).into()
    }

    #[must_use]
    pub fn type_error(msg: impl fmt::Display) -> RunError {
        SimpleException::new_msg(Self::TypeError, msg).into()
    }
}

/// Formats parameter names the way CPython lists them in arity errors:
/// `'a'`, `'a' and 'b'`, `'a', 'b' and 'c'`.
fn format_param_names(names: &[String]) -> String {
    match names {
        [] => String::new(),
        [only] => format!("'{only}'"),
        [rest @ .., last] => {
            let rest: Vec<_> = rest.iter().map(|n| format!("'{n}'")).collect();
            format!("{} and '{last}'", rest.join(", "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_owned()).collect()
    }

    #[test]
    fn format_param_names_joins_with_and() {
        assert_eq!(format_param_names(&[]), "");
        assert_eq!(format_param_names(&names(&["kw1"])), "'kw1'");
        assert_eq!(format_param_names(&names(&["kw1", "kw2"])), "'kw1' and 'kw2'");
        assert_eq!(format_param_names(&names(&["a", "b", "c"])), "'a', 'b' and 'c'");
    }

    #[test]
    fn missing_required_pluralizes() {
        let one = BindingError::MissingRequired(names(&["kw2"]));
        assert_eq!(one.to_string(), "missing 1 required positional argument: 'kw2'");

        let two = BindingError::MissingRequired(names(&["kw1", "kw2"]));
        assert_eq!(two.to_string(), "missing 2 required positional arguments: 'kw1' and 'kw2'");
    }

    #[test]
    fn binding_run_error_renders_like_cpython() {
        let err = RunError::Binding {
            qualname: "KwGetitem.__getitem__".to_owned(),
            error: BindingError::UnexpectedKeyword("kw3".to_owned()),
        };
        assert_eq!(err.exc_type(), ExcType::TypeError);
        assert_eq!(
            err.to_string(),
            "TypeError: KwGetitem.__getitem__() got an unexpected keyword argument 'kw3'"
        );
    }
}
