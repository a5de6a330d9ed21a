use std::fmt;

/// What went wrong at runtime. The taxonomy is small on purpose:
/// everything is fatal, and nothing is catchable from TinyLisp code
/// (the `error` primitive is the only way to raise one deliberately).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TraceKind {
    /// Unknown functions or primitives, arity mismatches, bad bytecode,
    /// explicit `error` calls.
    Runtime,
    /// An operand had the wrong tag for the instruction or primitive.
    Type,
}

impl fmt::Display for TraceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TraceKind::Runtime => write!(f, "Runtime"),
            TraceKind::Type => write!(f, "Type"),
        }
    }
}

/// Represents a runtime error raised by the VM.
/// Bytecode carries no source mapping, so unlike compile-time errors
/// a `Trace` has no spans to show; the kind and message are all there is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trace {
    pub kind: TraceKind,
    pub message: String,
}

impl Trace {
    /// Creates a new runtime error.
    pub fn error(kind: TraceKind, message: &str) -> Trace {
        Trace {
            kind,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} Error: {}", self.kind, self.message)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn rendering() {
        let trace = Trace::error(TraceKind::Type, "car expects a list");
        assert_eq!(format!("{}", trace), "Type Error: car expects a list");

        let trace = Trace::error(TraceKind::Runtime, "Division by zero");
        assert_eq!(format!("{}", trace), "Runtime Error: Division by zero");
    }
}
