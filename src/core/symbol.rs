use crate::{
    common::value::Value,
    vm::trace::{Trace, TraceKind},
};

/// Wraps a name into a symbol.
pub fn sym(args: &[Value]) -> Result<Value, Trace> {
    match args {
        [Value::String(name)] => Ok(Value::Symbol(name.clone())),
        [other] => Err(Trace::error(
            TraceKind::Type,
            &format!("sym expects a string, found {}", other.type_name()),
        )),
        _ => Err(Trace::error(
            TraceKind::Runtime,
            &format!("sym expects 1 argument, found {}", args.len()),
        )),
    }
}

/// Extracts a symbol's name as a string.
pub fn sym_name(args: &[Value]) -> Result<Value, Trace> {
    match args {
        [Value::Symbol(name)] => Ok(Value::String(name.clone())),
        [other] => Err(Trace::error(
            TraceKind::Type,
            &format!("sym-name expects a symbol, found {}", other.type_name()),
        )),
        _ => Err(Trace::error(
            TraceKind::Runtime,
            &format!("sym-name expects 1 argument, found {}", args.len()),
        )),
    }
}

/// Compares two symbols by name. Anything that isn't a pair of symbols
/// compares unequal rather than erroring; dispatch chains in
/// self-hosted code lean on that.
pub fn sym_eq(args: &[Value]) -> Result<Value, Trace> {
    match args {
        [Value::Symbol(a), Value::Symbol(b)] => Ok(super::flag(a == b)),
        [_, _] => Ok(super::flag(false)),
        _ => Err(Trace::error(
            TraceKind::Runtime,
            &format!("sym-eq? expects 2 arguments, found {}", args.len()),
        )),
    }
}
