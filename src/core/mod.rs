//! The host primitive table: the fixed, closed set of operations TinyLisp
//! code reaches through `CALLPRIM`. It is sized to what self-hosting the
//! compiler needs, and nothing more.
//!
//! The *pure* primitives live here, one module per concern. The stateful
//! four (`read-all`, `parse-sexprs`, `emit`, `gensym`) are handled by the
//! VM directly, which owns the state they touch.

pub mod list;
pub mod logic;
pub mod symbol;
pub mod text;

use crate::{
    common::value::Value,
    vm::trace::{Trace, TraceKind},
};

/// Every primitive name, in the order the surface documentation lists
/// them. The compiler consults this set to decide `CALLPRIM` versus
/// `CALL` lexically, at compile time; redefining one of these names at
/// the language level is undefined.
pub const PRIMITIVES: &[&str] = &[
    "read-all",
    "parse-sexprs",
    "emit",
    "gensym",
    "str-cat",
    "to-str",
    "json-dumps",
    "sym",
    "sym-name",
    "sym-eq?",
    "int?",
    "str?",
    "sym?",
    "pair?",
    "null?",
    "car",
    "cdr",
    "error",
];

pub fn is_primitive(name: &str) -> bool {
    PRIMITIVES.contains(&name)
}

/// `1` or `0`; the language has no boolean type.
pub(crate) fn flag(condition: bool) -> Value {
    Value::Integer(condition as i64)
}

/// Dispatches a pure primitive by name.
/// The stateful primitives never reach this function; anything else
/// unknown here is unknown everywhere.
pub fn dispatch(name: &str, args: &[Value]) -> Result<Value, Trace> {
    match name {
        "str-cat" => text::str_cat(args),
        "to-str" => text::to_str(args),
        "json-dumps" => text::json_dumps(args),
        "sym" => symbol::sym(args),
        "sym-name" => symbol::sym_name(args),
        "sym-eq?" => symbol::sym_eq(args),
        "int?" => logic::is_int(args),
        "str?" => logic::is_str(args),
        "sym?" => logic::is_sym(args),
        "pair?" => logic::is_pair(args),
        "null?" => logic::is_null(args),
        "car" => list::car(args),
        "cdr" => list::cdr(args),
        "error" => logic::raise(args),
        _ => Err(Trace::error(
            TraceKind::Runtime,
            &format!("Unknown primitive: {}", name),
        )),
    }
}
