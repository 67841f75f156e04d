#![doc = include_str!("../../../README.md")]
mod aggregate;
mod args;
mod exception;
mod object;
pub mod resource;
mod signature;
mod subscript;
pub mod tracer;

pub use crate::{
    aggregate::aggregate_index,
    args::{KwargsValues, SubscriptArgs},
    exception::{BindingError, ExcType, RunError, RunResult, SimpleException},
    object::{ConversionError, DictPairs, Object},
    resource::{DEFAULT_MAX_KEYWORDS, LimitedTracker, NoLimitTracker, ResourceError, ResourceLimits, ResourceTracker},
    signature::{BoundArguments, ParamKind, ParameterSpec, Signature, SignatureError},
    subscript::{Dispatcher, ItemHandlers, SubscriptOp, Subscriptable},
    tracer::{BindTracer, NoopTracer, RecordingTracer, StderrTracer, TraceEvent},
};
