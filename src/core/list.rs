use crate::{
    common::value::Value,
    vm::trace::{Trace, TraceKind},
};

/// The head of a non-empty list.
pub fn car(args: &[Value]) -> Result<Value, Trace> {
    match args {
        [Value::List(items)] if !items.is_empty() => Ok(items[0].clone()),
        [Value::List(_)] => {
            Err(Trace::error(TraceKind::Runtime, "car of empty list"))
        }
        [other] => Err(Trace::error(
            TraceKind::Type,
            &format!("car expects a list, found {}", other.type_name()),
        )),
        _ => Err(Trace::error(
            TraceKind::Runtime,
            &format!("car expects 1 argument, found {}", args.len()),
        )),
    }
}

/// The tail of a non-empty list, as a new list.
pub fn cdr(args: &[Value]) -> Result<Value, Trace> {
    match args {
        [Value::List(items)] if !items.is_empty() => {
            Ok(Value::List(items[1..].to_vec()))
        }
        [Value::List(_)] => {
            Err(Trace::error(TraceKind::Runtime, "cdr of empty list"))
        }
        [other] => Err(Trace::error(
            TraceKind::Type,
            &format!("cdr expects a list, found {}", other.type_name()),
        )),
        _ => Err(Trace::error(
            TraceKind::Runtime,
            &format!("cdr expects 1 argument, found {}", args.len()),
        )),
    }
}
