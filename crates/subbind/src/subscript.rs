//! Index-read, index-write and index-delete dispatch.
//!
//! All three operations share one pipeline:
//!
//! ```text
//! SubscriptArgs ─▶ resource check ─▶ aggregate_index ─▶ Signature::bind ─▶ handler
//! ```
//!
//! Reads return the handler's result; writes and deletes only propagate errors.

use strum::{Display, IntoStaticStr};

use crate::{
    aggregate::aggregate_index,
    args::SubscriptArgs,
    exception::{ExcType, RunError, RunResult},
    object::Object,
    resource::{NoLimitTracker, ResourceTracker},
    signature::{BoundArguments, ParameterSpec, Signature, SignatureError},
    tracer::{BindTracer, NoopTracer},
};

/// The three subscript operations, displayed as the dunder method implementing them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, IntoStaticStr, serde::Serialize, serde::Deserialize,
)]
pub enum SubscriptOp {
    /// `obj[index, kw=...]`
    #[strum(serialize = "__getitem__")]
    GetItem,
    /// `obj[index, kw=...] = value`
    #[strum(serialize = "__setitem__")]
    SetItem,
    /// `del obj[index, kw=...]`
    #[strum(serialize = "__delitem__")]
    DelItem,
}

impl SubscriptOp {
    /// Whether the operation carries an assigned value into slot 1.
    #[must_use]
    pub fn takes_value(self) -> bool {
        matches!(self, Self::SetItem)
    }

    /// Number of leading parameters filled positionally: index, plus value for writes.
    #[must_use]
    pub fn positional_slots(self) -> usize {
        if self.takes_value() { 2 } else { 1 }
    }
}

/// A type that supports keyword-aware subscript operations.
///
/// Each supported operation is described by a [`Signature`] returned from
/// [`signature`](Self::signature); the dispatcher binds arguments against it and then
/// calls the matching method. Operations a type does not support return `None` from
/// `signature` and fall through to the default methods, which raise the same
/// `TypeError`s CPython does.
pub trait Subscriptable {
    /// Type name used in error messages, e.g. `KwGetitem`.
    fn type_name(&self) -> &str;

    /// The declared signature for `op`, or `None` if the operation is unsupported.
    fn signature(&self, op: SubscriptOp) -> Option<&Signature>;

    fn getitem(&self, _args: BoundArguments) -> RunResult<Object> {
        Err(ExcType::type_error_unsupported(self.type_name(), SubscriptOp::GetItem))
    }

    fn setitem(&mut self, _args: BoundArguments) -> RunResult<()> {
        Err(ExcType::type_error_unsupported(self.type_name(), SubscriptOp::SetItem))
    }

    fn delitem(&mut self, _args: BoundArguments) -> RunResult<()> {
        Err(ExcType::type_error_unsupported(self.type_name(), SubscriptOp::DelItem))
    }
}

type GetFn<'a> = Box<dyn Fn(BoundArguments) -> RunResult<Object> + 'a>;
type MutFn<'a> = Box<dyn FnMut(BoundArguments) -> RunResult<()> + 'a>;

/// A [`Subscriptable`] assembled from closures, one per registered operation.
///
/// Registration validates each parameter list into a [`Signature`], so a malformed
/// handler is rejected before it can ever be dispatched to.
///
/// ```
/// use subbind::{Dispatcher, ItemHandlers, Object, ParameterSpec, SubscriptArgs};
///
/// let handlers = ItemHandlers::new("KwGetitem")
///     .on_getitem(
///         vec![ParameterSpec::required("index"), ParameterSpec::with_default("kw", "dflt")],
///         |args| Ok(args.into_tuple()),
///     )
///     .unwrap();
///
/// let mut dispatcher = Dispatcher::unlimited();
/// let result = dispatcher.get_item(&handlers, SubscriptArgs::positional([1])).unwrap();
/// assert_eq!(result.py_repr(), "(1, 'dflt')");
/// ```
pub struct ItemHandlers<'a> {
    type_name: String,
    getitem: Option<(Signature, GetFn<'a>)>,
    setitem: Option<(Signature, MutFn<'a>)>,
    delitem: Option<(Signature, MutFn<'a>)>,
}

impl<'a> ItemHandlers<'a> {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            getitem: None,
            setitem: None,
            delitem: None,
        }
    }

    /// Registers the index-read handler.
    pub fn on_getitem(
        mut self,
        params: Vec<ParameterSpec>,
        handler: impl Fn(BoundArguments) -> RunResult<Object> + 'a,
    ) -> Result<Self, SignatureError> {
        let signature = Signature::new(SubscriptOp::GetItem, params)?;
        self.getitem = Some((signature, Box::new(handler)));
        Ok(self)
    }

    /// Registers the index-write handler; `params` must start with index and value.
    pub fn on_setitem(
        mut self,
        params: Vec<ParameterSpec>,
        handler: impl FnMut(BoundArguments) -> RunResult<()> + 'a,
    ) -> Result<Self, SignatureError> {
        let signature = Signature::new(SubscriptOp::SetItem, params)?;
        self.setitem = Some((signature, Box::new(handler)));
        Ok(self)
    }

    /// Registers the index-delete handler.
    pub fn on_delitem(
        mut self,
        params: Vec<ParameterSpec>,
        handler: impl FnMut(BoundArguments) -> RunResult<()> + 'a,
    ) -> Result<Self, SignatureError> {
        let signature = Signature::new(SubscriptOp::DelItem, params)?;
        self.delitem = Some((signature, Box::new(handler)));
        Ok(self)
    }
}

impl std::fmt::Debug for ItemHandlers<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemHandlers")
            .field("type_name", &self.type_name)
            .field("getitem", &self.getitem.as_ref().map(|(sig, _)| sig))
            .field("setitem", &self.setitem.as_ref().map(|(sig, _)| sig))
            .field("delitem", &self.delitem.as_ref().map(|(sig, _)| sig))
            .finish()
    }
}

impl Subscriptable for ItemHandlers<'_> {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn signature(&self, op: SubscriptOp) -> Option<&Signature> {
        match op {
            SubscriptOp::GetItem => self.getitem.as_ref().map(|(sig, _)| sig),
            SubscriptOp::SetItem => self.setitem.as_ref().map(|(sig, _)| sig),
            SubscriptOp::DelItem => self.delitem.as_ref().map(|(sig, _)| sig),
        }
    }

    fn getitem(&self, args: BoundArguments) -> RunResult<Object> {
        match &self.getitem {
            Some((_, handler)) => handler(args),
            None => Err(ExcType::type_error_unsupported(&self.type_name, SubscriptOp::GetItem)),
        }
    }

    fn setitem(&mut self, args: BoundArguments) -> RunResult<()> {
        match &mut self.setitem {
            Some((_, handler)) => handler(args),
            None => Err(ExcType::type_error_unsupported(&self.type_name, SubscriptOp::SetItem)),
        }
    }

    fn delitem(&mut self, args: BoundArguments) -> RunResult<()> {
        match &mut self.delitem {
            Some((_, handler)) => handler(args),
            None => Err(ExcType::type_error_unsupported(&self.type_name, SubscriptOp::DelItem)),
        }
    }
}

/// Runs subscript operations against [`Subscriptable`] targets.
///
/// The dispatcher is parameterized over a resource tracker and a tracer, chosen at
/// construction time like the rest of the interpreter:
///
/// ```ignore
/// // Production (zero overhead):
/// let mut dispatcher = Dispatcher::new(NoLimitTracker, NoopTracer);
///
/// // Sandboxed and logged:
/// let mut dispatcher = Dispatcher::new(LimitedTracker::new(limits), StderrTracer::new());
/// ```
///
/// Every call is independent: the dispatcher holds no per-subscript state between calls.
#[derive(Debug)]
pub struct Dispatcher<R: ResourceTracker, T: BindTracer> {
    resources: R,
    tracer: T,
}

impl Dispatcher<NoLimitTracker, NoopTracer> {
    /// A dispatcher with no limits and no tracing.
    #[must_use]
    pub fn unlimited() -> Self {
        Self::new(NoLimitTracker, NoopTracer)
    }
}

impl Default for Dispatcher<NoLimitTracker, NoopTracer> {
    fn default() -> Self {
        Self::unlimited()
    }
}

impl<R: ResourceTracker, T: BindTracer> Dispatcher<R, T> {
    #[must_use]
    pub fn new(resources: R, tracer: T) -> Self {
        Self { resources, tracer }
    }

    #[must_use]
    pub fn tracer(&self) -> &T {
        &self.tracer
    }

    pub fn tracer_mut(&mut self) -> &mut T {
        &mut self.tracer
    }

    #[must_use]
    pub fn resources(&self) -> &R {
        &self.resources
    }

    /// Evaluates `target[args]`.
    pub fn get_item(&mut self, target: &(impl Subscriptable + ?Sized), args: SubscriptArgs) -> RunResult<Object> {
        let op = SubscriptOp::GetItem;
        let bound = self.bind(target, op, args, None)?;
        self.tracer.on_dispatch(op, bound.len());
        target.getitem(bound)
    }

    /// Evaluates `target[args] = value`.
    pub fn set_item(
        &mut self,
        target: &mut (impl Subscriptable + ?Sized),
        args: SubscriptArgs,
        value: Object,
    ) -> RunResult<()> {
        let op = SubscriptOp::SetItem;
        let bound = self.bind(&*target, op, args, Some(value))?;
        self.tracer.on_dispatch(op, bound.len());
        target.setitem(bound)
    }

    /// Evaluates `del target[args]`.
    pub fn del_item(&mut self, target: &mut (impl Subscriptable + ?Sized), args: SubscriptArgs) -> RunResult<()> {
        let op = SubscriptOp::DelItem;
        let bound = self.bind(&*target, op, args, None)?;
        self.tracer.on_dispatch(op, bound.len());
        target.delitem(bound)
    }

    fn bind(
        &mut self,
        target: &(impl Subscriptable + ?Sized),
        op: SubscriptOp,
        args: SubscriptArgs,
        value: Option<Object>,
    ) -> RunResult<BoundArguments> {
        let Some(signature) = target.signature(op) else {
            return Err(ExcType::type_error_unsupported(target.type_name(), op));
        };
        if signature.op() != op {
            return Err(ExcType::type_error_signature_mismatch(target.type_name(), op, signature.op()));
        }

        let (positional, keywords) = args.into_parts();
        self.resources.on_subscript(positional.len(), keywords.len())?;

        self.tracer.on_aggregate(positional.len());
        let index = aggregate_index(positional);

        signature
            .bind(index, value, keywords, &mut self.tracer)
            .map_err(|error| RunError::Binding {
                qualname: format!("{}.{op}", target.type_name()),
                error,
            })
    }
}
