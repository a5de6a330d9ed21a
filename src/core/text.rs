use crate::{
    common::value::Value,
    vm::trace::{Trace, TraceKind},
};

pub fn str_cat(args: &[Value]) -> Result<Value, Trace> {
    match args {
        [Value::String(a), Value::String(b)] => {
            Ok(Value::String(format!("{}{}", a, b)))
        }
        [a, b] => Err(Trace::error(
            TraceKind::Type,
            &format!(
                "str-cat expects two strings, found {} and {}",
                a.type_name(),
                b.type_name(),
            ),
        )),
        _ => Err(Trace::error(
            TraceKind::Runtime,
            &format!("str-cat expects 2 arguments, found {}", args.len()),
        )),
    }
}

/// The textual representation of an atom: integers in decimal, symbols
/// as their name, strings unchanged. Lists are refused; self-hosted
/// output must never depend on list formatting.
pub fn to_str(args: &[Value]) -> Result<Value, Trace> {
    match args {
        [Value::List(_)] => Err(Trace::error(
            TraceKind::Runtime,
            "to-str: lists have no canonical text form",
        )),
        [value] => Ok(Value::String(format!("{}", value))),
        _ => Err(Trace::error(
            TraceKind::Runtime,
            &format!("to-str expects 1 argument, found {}", args.len()),
        )),
    }
}

/// JSON-encodes a string, quotes and all. This is how the compiler
/// builds `PUSHSTR` operands, so the encoding here and the decoding in
/// the bytecode loader must agree exactly.
pub fn json_dumps(args: &[Value]) -> Result<Value, Trace> {
    match args {
        [Value::String(s)] => Ok(Value::String(
            serde_json::to_string(s).expect("a string always JSON-encodes"),
        )),
        [other] => Err(Trace::error(
            TraceKind::Type,
            &format!("json-dumps expects a string, found {}", other.type_name()),
        )),
        _ => Err(Trace::error(
            TraceKind::Runtime,
            &format!("json-dumps expects 1 argument, found {}", args.len()),
        )),
    }
}
