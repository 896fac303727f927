#![doc = include_str!("../README.md")]

pub mod ast;
pub mod attribute;
pub mod dispatcher;
mod equality;
pub mod error;
mod frame;
mod interpreter;
mod listmap;
mod numeric;
pub mod options;
pub mod program;
mod regexp;
pub mod resolver;
pub mod stdlib;
mod strings;
mod time;
pub mod type_provider;
pub mod unknown;
pub mod value;

pub use crate::{
    ast::{Call, Comprehension, Constant, Entry, Expr, ExprId, ExprKind, IdentKind, SpecialCall},
    attribute::{Attribute, AttributePattern, Qualifier},
    dispatcher::{Dispatcher, Overload},
    error::{ErrorKind, EvalError, EvalResult},
    frame::{EvaluationListener, FunctionResolver, NoopListener},
    options::EvalOptions,
    program::{EvalOutcome, Program},
    resolver::{EmptyVariableResolver, MapVariableResolver, Resolved, VariableResolver},
    stdlib::subset::FunctionFilter,
    type_provider::{EmptyTypeProvider, Message, TypeProvider, WellKnownWrapper},
    unknown::UnknownSet,
    value::{Duration, MapKey, OrderedMap, Timestamp, TypeValue, Value},
};
