use super::flag;
use crate::{
    common::value::Value,
    vm::trace::{Trace, TraceKind},
};

fn predicate(
    name: &str,
    args: &[Value],
    pred: impl Fn(&Value) -> bool,
) -> Result<Value, Trace> {
    match args {
        [value] => Ok(flag(pred(value))),
        _ => Err(Trace::error(
            TraceKind::Runtime,
            &format!("{} expects 1 argument, found {}", name, args.len()),
        )),
    }
}

pub fn is_int(args: &[Value]) -> Result<Value, Trace> {
    predicate("int?", args, |v| matches!(v, Value::Integer(_)))
}

pub fn is_str(args: &[Value]) -> Result<Value, Trace> {
    predicate("str?", args, |v| matches!(v, Value::String(_)))
}

pub fn is_sym(args: &[Value]) -> Result<Value, Trace> {
    predicate("sym?", args, |v| matches!(v, Value::Symbol(_)))
}

/// True for non-empty lists only.
pub fn is_pair(args: &[Value]) -> Result<Value, Trace> {
    predicate("pair?", args, |v| {
        matches!(v, Value::List(items) if !items.is_empty())
    })
}

/// True for the empty list only; in particular, not for the integer `0`.
pub fn is_null(args: &[Value]) -> Result<Value, Trace> {
    predicate("null?", args, |v| {
        matches!(v, Value::List(items) if items.is_empty())
    })
}

/// The `error` primitive: aborts execution with the supplied message.
pub fn raise(args: &[Value]) -> Result<Value, Trace> {
    match args {
        [message] => Err(Trace::error(
            TraceKind::Runtime,
            &format!("{}", message),
        )),
        _ => Err(Trace::error(
            TraceKind::Runtime,
            &format!("error expects 1 argument, found {}", args.len()),
        )),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn predicates_discriminate() {
        let int = Value::Integer(0);
        let nil = Value::List(vec![]);
        let pair = Value::List(vec![Value::Integer(1)]);

        assert_eq!(is_int(&[int.clone()]).unwrap(), Value::Integer(1));
        assert_eq!(is_int(&[nil.clone()]).unwrap(), Value::Integer(0));

        // the empty list is not 0, and 0 is not the empty list
        assert_eq!(is_null(&[nil.clone()]).unwrap(), Value::Integer(1));
        assert_eq!(is_null(&[int]).unwrap(), Value::Integer(0));

        assert_eq!(is_pair(&[pair.clone()]).unwrap(), Value::Integer(1));
        assert_eq!(is_pair(&[nil]).unwrap(), Value::Integer(0));

        assert_eq!(
            is_sym(&[Value::Symbol("x".to_string())]).unwrap(),
            Value::Integer(1),
        );
        assert_eq!(
            is_str(&[Value::String("x".to_string())]).unwrap(),
            Value::Integer(1),
        );
    }

    #[test]
    fn raise_carries_the_message() {
        let error =
            raise(&[Value::String("define: bad shape".to_string())])
                .unwrap_err();
        assert_eq!(
            format!("{}", error),
            "Runtime Error: define: bad shape",
        );
    }
}
