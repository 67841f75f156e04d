//! Subscript handler signatures and keyword-aware argument binding.
//!
//! A subscript handler is declared like an ordinary Python method, minus `self`:
//!
//! ```text
//! __getitem__(index, kw1, kw2="default")
//! __setitem__(index, value, kw1, kw2="default")
//! __delitem__(index, kw1, kw2="default")
//! ```
//!
//! The index (and, for writes, the value) are always filled positionally. Every
//! parameter after them is an "extra" parameter that can only be satisfied by a keyword
//! written in the subscript, or by its default.

use std::fmt;

use ahash::AHashSet;
use smallvec::SmallVec;

use crate::{
    args::KwargsValues,
    exception::BindingError,
    object::Object,
    subscript::SubscriptOp,
    tracer::BindTracer,
};

/// How a parameter may be supplied.
///
/// Subscript handlers only declare ordinary parameters; the index and value slots are
/// positional by construction even though they are declared positional-or-keyword.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ParamKind {
    #[default]
    PositionalOrKeyword,
}

/// One declared parameter of a subscript handler.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ParameterSpec {
    name: String,
    kind: ParamKind,
    /// Evaluated default value, present iff the parameter is optional.
    default: Option<Object>,
}

impl ParameterSpec {
    /// A parameter without a default.
    #[must_use]
    pub fn required(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::PositionalOrKeyword,
            default: None,
        }
    }

    /// A parameter with an evaluated default value.
    #[must_use]
    pub fn with_default(name: impl Into<String>, default: impl Into<Object>) -> Self {
        Self {
            name: name.into(),
            kind: ParamKind::PositionalOrKeyword,
            default: Some(default.into()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ParamKind {
        self.kind
    }

    #[must_use]
    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    #[must_use]
    pub fn default_value(&self) -> Option<&Object> {
        self.default.as_ref()
    }
}

/// Why a handler's parameter list was rejected at registration time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureError {
    /// The handler declares no parameter to receive the index.
    MissingIndexParam(SubscriptOp),
    /// A `__setitem__` handler declares no parameter to receive the assigned value.
    MissingValueParam,
    /// Two parameters share a name.
    DuplicateParameter(String),
    /// A required parameter follows one with a default.
    NonDefaultAfterDefault(String),
    /// Persisted signature bytes could not be decoded.
    Decode(String),
}

impl fmt::Display for SignatureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingIndexParam(op) => write!(f, "{op}() must accept an index parameter"),
            Self::MissingValueParam => f.write_str("__setitem__() must accept index and value parameters"),
            Self::DuplicateParameter(name) => write!(f, "duplicate argument '{name}' in function definition"),
            Self::NonDefaultAfterDefault(name) => {
                write!(f, "parameter without a default follows parameter with a default: '{name}'")
            }
            Self::Decode(msg) => write!(f, "invalid signature data: {msg}"),
        }
    }
}

impl std::error::Error for SignatureError {}

/// The declared parameters of one subscript handler.
///
/// Built once when the handler is registered and validated there, so binding can assume
/// unique names and trailing defaults.
///
/// # Layout
///
/// ```text
/// [index_param][value_param?][extra_params...]
/// ```
/// `value_param` is only present for [`SubscriptOp::SetItem`].
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "RawSignature")]
pub struct Signature {
    op: SubscriptOp,
    params: Vec<ParameterSpec>,
    /// How simple the signature is, used for a fast path when binding.
    #[serde(skip_serializing)]
    bind_mode: BindMode,
}

/// Serialized form of [`Signature`]; every deserialization goes back through `Signature::new`.
#[derive(serde::Deserialize)]
struct RawSignature {
    op: SubscriptOp,
    params: Vec<ParameterSpec>,
}

impl TryFrom<RawSignature> for Signature {
    type Error = SignatureError;

    fn try_from(raw: RawSignature) -> Result<Self, Self::Error> {
        Self::new(raw.op, raw.params)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BindMode {
    /// No extra parameters: only the index (and value) are bound, so any keyword is unexpected.
    Positional,
    /// At least one extra parameter is looked up by keyword.
    Keywords,
}

impl Signature {
    /// Validates a handler's parameter list for the given operation.
    pub fn new(op: SubscriptOp, params: Vec<ParameterSpec>) -> Result<Self, SignatureError> {
        if params.len() < op.positional_slots() {
            return Err(if params.is_empty() {
                SignatureError::MissingIndexParam(op)
            } else {
                SignatureError::MissingValueParam
            });
        }

        let mut seen = AHashSet::with_capacity(params.len());
        let mut seen_default = false;
        for param in &params {
            if !seen.insert(param.name()) {
                return Err(SignatureError::DuplicateParameter(param.name.clone()));
            }
            if param.has_default() {
                seen_default = true;
            } else if seen_default {
                return Err(SignatureError::NonDefaultAfterDefault(param.name.clone()));
            }
        }

        let bind_mode = if params.len() == op.positional_slots() {
            BindMode::Positional
        } else {
            BindMode::Keywords
        };
        Ok(Self { op, params, bind_mode })
    }

    /// Shorthand for a signature whose parameters are all required.
    pub fn from_names<'a>(op: SubscriptOp, names: impl IntoIterator<Item = &'a str>) -> Result<Self, SignatureError> {
        Self::new(op, names.into_iter().map(ParameterSpec::required).collect())
    }

    #[must_use]
    pub fn op(&self) -> SubscriptOp {
        self.op
    }

    #[must_use]
    pub fn params(&self) -> &[ParameterSpec] {
        &self.params
    }

    /// The parameter receiving the aggregated index.
    #[must_use]
    pub fn index_param(&self) -> &ParameterSpec {
        &self.params[0]
    }

    /// The parameter receiving the assigned value, for `__setitem__` signatures.
    #[must_use]
    pub fn value_param(&self) -> Option<&ParameterSpec> {
        if self.op.takes_value() {
            self.params.get(1)
        } else {
            None
        }
    }

    /// Parameters after the index (and value), satisfied by keyword or default.
    #[must_use]
    pub fn extra_params(&self) -> &[ParameterSpec] {
        &self.params[self.op.positional_slots()..]
    }

    pub fn param_names(&self) -> impl Iterator<Item = &str> + '_ {
        self.params.iter().map(ParameterSpec::name)
    }

    /// Binds the aggregated index, the assigned value and the subscript's keywords to
    /// this signature's parameters.
    ///
    /// 1. Slot 0 takes `aggregated_index`; keywords are never consulted for it.
    /// 2. For `__setitem__`, slot 1 takes `assigned_value` the same way.
    /// 3. Each extra parameter, in declaration order, consumes the keyword with its name,
    ///    or falls back to its default, or is recorded as missing.
    /// 4. Missing parameters are reported first, in declaration order; otherwise the first
    ///    leftover keyword (in the order written) is reported as unexpected.
    ///
    /// Because step 3 looks keywords up by name, the order keywords were written in never
    /// changes the result.
    ///
    /// `assigned_value` is only consulted for `__setitem__` signatures. A `__setitem__`
    /// signature bound without one reports its value parameter as missing.
    pub fn bind(
        &self,
        aggregated_index: Object,
        assigned_value: Option<Object>,
        mut keywords: KwargsValues,
        tracer: &mut impl BindTracer,
    ) -> Result<BoundArguments, BindingError> {
        tracer.on_bind_start(self.op, self.params.len(), keywords.len());

        let mut bound = BoundArguments::with_capacity(self.params.len());
        let mut missing: Vec<String> = Vec::new();

        bound.push(aggregated_index);
        if self.op.takes_value() {
            match assigned_value {
                Some(value) => bound.push(value),
                None => missing.push(self.params[1].name.clone()),
            }
        }

        // Fast path: nothing can be satisfied by keyword
        if self.bind_mode == BindMode::Positional && keywords.is_empty() && missing.is_empty() {
            return Ok(bound);
        }

        for param in self.extra_params() {
            if let Some(value) = keywords.remove(param.name()) {
                tracer.on_keyword_bound(param.name());
                bound.push(value);
            } else if let Some(default) = param.default_value() {
                tracer.on_default_applied(param.name());
                bound.push(default.clone());
            } else {
                missing.push(param.name.clone());
            }
        }

        if !missing.is_empty() {
            let error = BindingError::MissingRequired(missing);
            tracer.on_bind_error(&error);
            return Err(error);
        }

        if let Some(name) = keywords.names().next() {
            let error = BindingError::UnexpectedKeyword(name.to_owned());
            tracer.on_bind_error(&error);
            return Err(error);
        }

        Ok(bound)
    }

    /// Serializes the signature to binary format for caching handler registrations.
    pub fn dump(&self) -> Result<Vec<u8>, postcard::Error> {
        postcard::to_allocvec(self)
    }

    /// Deserializes a signature from `dump()` output.
    ///
    /// Invalid parameter lists are rejected during decoding, like any other malformed input.
    pub fn load(bytes: &[u8]) -> Result<Self, SignatureError> {
        postcard::from_bytes(bytes).map_err(|err| SignatureError::Decode(err.to_string()))
    }
}

/// Arguments ready for a handler call, one per declared parameter in signature order.
///
/// Most subscript handlers take at most four parameters, so the values live inline.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundArguments(SmallVec<[Object; 4]>);

impl BoundArguments {
    fn with_capacity(capacity: usize) -> Self {
        Self(SmallVec::with_capacity(capacity))
    }

    fn push(&mut self, value: Object) {
        self.0.push(value);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[Object] {
        &self.0
    }

    #[must_use]
    pub fn get(&self, position: usize) -> Option<&Object> {
        self.0.get(position)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Object> {
        self.0.iter()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<Object> {
        self.0.into_vec()
    }

    /// Packs the arguments into a tuple, handy for echoing handlers.
    #[must_use]
    pub fn into_tuple(self) -> Object {
        Object::Tuple(self.into_vec())
    }
}

impl IntoIterator for BoundArguments {
    type Item = Object;
    type IntoIter = smallvec::IntoIter<[Object; 4]>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a BoundArguments {
    type Item = &'a Object;
    type IntoIter = std::slice::Iter<'a, Object>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
