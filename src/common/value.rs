use std::fmt::{Display, Formatter, Result};

/// A TinyLisp value. The language is homoiconic, so this enum does double
/// duty: it is both the AST produced by the reader and the runtime value
/// manipulated by the VM.
///
/// Note that the empty list is a value in its own right, distinct from the
/// integer `0`; `null?` is the only way to witness it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// A signed integer. The surface syntax has no unary minus;
    /// `-3` is a single integer token.
    Integer(i64),
    /// A UTF-8 encoded string. Strings and symbols are disjoint types.
    String(String),
    /// A symbol, compared by name.
    Symbol(String),
    /// An ordered, possibly empty, sequence of values.
    List(Vec<Value>),
}

impl Value {
    /// The name used for this value's type in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Integer(_) => "integer",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::List(_) => "list",
        }
    }

    /// The reader form of a value: text that lexes and reads back to an
    /// equal value. Differs from `Display` in that strings are quoted
    /// and escaped.
    pub fn repr(&self) -> String {
        match self {
            Value::Integer(n) => n.to_string(),
            Value::String(s) => {
                serde_json::to_string(s).expect("a string always JSON-encodes")
            }
            Value::Symbol(name) => name.clone(),
            Value::List(items) => {
                let inner = items
                    .iter()
                    .map(Value::repr)
                    .collect::<Vec<String>>()
                    .join(" ");
                format!("({})", inner)
            }
        }
    }
}

impl Display for Value {
    /// The print form of a value, as written by `PRINT`:
    /// integers in decimal, strings unchanged, symbols as their name.
    /// Lists print in reader form, so nested strings stay readable.
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            Value::Integer(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            Value::Symbol(name) => write!(f, "{}", name),
            Value::List(_) => write!(f, "{}", self.repr()),
        }
    }
}
