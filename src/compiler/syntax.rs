use std::fmt;

use crate::common::span::Span;

/// A note attached to a `Syntax` error:
/// a location in source code, with an optional hint
/// specific to that location.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub span: Span,
    pub hint: Option<String>,
}

impl Note {
    pub fn new(span: Span) -> Note {
        Note { span, hint: None }
    }

    pub fn new_with_hint(hint: &str, span: &Span) -> Note {
        Note {
            span: span.clone(),
            hint: Some(hint.to_string()),
        }
    }
}

/// A static error (lexing, reading, or lowering) found at compile time.
/// Usually one `Note` per error is enough; an error may also carry no
/// notes at all, since the code generator can be fed forms that never
/// came from source text (`parse-sexprs` output inside the VM).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Syntax {
    pub reason: String,
    pub notes: Vec<Note>,
}

impl Syntax {
    /// Creates a new static error with a single note that does not have
    /// a hint.
    pub fn error(reason: &str, span: &Span) -> Syntax {
        Syntax::error_with_note(reason, Note::new(span.clone()))
    }

    /// Creates a new static error with a single note.
    pub fn error_with_note(reason: &str, note: Note) -> Syntax {
        Syntax {
            reason: reason.to_string(),
            notes: vec![note],
        }
    }

    /// Creates a static error without any location information.
    pub fn error_no_note(reason: &str) -> Syntax {
        Syntax {
            reason: reason.to_string(),
            notes: vec![],
        }
    }

    /// Extend a syntax error by adding another note to the error.
    pub fn add_note(mut self, note: Note) -> Self {
        self.notes.push(note);
        self
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for note in self.notes.iter() {
            write!(f, "{}", note.span)?;
            if let Some(ref hint) = note.hint {
                writeln!(f, "note: {}", hint)?;
            }
        }
        write!(f, "Syntax Error: {}", self.reason)
    }
}
