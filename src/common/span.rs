use std::fmt::{Display, Formatter, Result};
use std::rc::Rc;

use crate::common::source::Source;

/// A `Span` refers to a section of a source,
/// much like a `&str`, but with a reference to a `Source` rather than a
/// `String`. A `Span` is meant to be paired with other datastructures,
/// to be used during error reporting.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Span {
    source: Rc<Source>,
    offset: usize,
    length: usize,
}

impl Span {
    /// Create a new `Span` from an offset with a length.
    /// All `Span`s have access to the `Source` from whence they came,
    /// so they can't be misinterpreted or miscombined.
    pub fn new(source: &Rc<Source>, offset: usize, length: usize) -> Span {
        Span {
            source: Rc::clone(source),
            offset,
            length,
        }
    }

    /// A `Span` that points at a specific point in the source.
    pub fn point(source: &Rc<Source>, offset: usize) -> Span {
        Span::new(source, offset, 1)
    }

    /// Creates a new `Span` which spans the space of the previous two.
    /// ```plain
    /// hello this is cool
    /// ^^^^^              | Span a
    ///            ^^      | Span b
    /// ^^^^^^^^^^^^^      | combined
    /// ```
    pub fn combine(a: &Span, b: &Span) -> Span {
        if a.source != b.source {
            panic!("Can't combine two Spans with separate sources")
        }

        let offset = a.offset.min(b.offset);
        let end = (a.offset + a.length).max(b.offset + b.length);

        Span::new(&a.source, offset, end - offset)
    }

    /// Returns the contents of a `Span`.
    /// This indexes into the source file, so if the `Span` is along an
    /// invalid byte boundary, the program will panic.
    pub fn contents(&self) -> String {
        let end = (self.offset + self.length).min(self.source.contents.len());
        self.source.contents[self.offset..end].to_string()
    }

    /// The zero-indexed line and column the span starts on.
    fn line_col(&self) -> (usize, usize) {
        let offset = self.offset.min(self.source.contents.len());
        let before = &self.source.contents[..offset];
        let line = before.matches('\n').count();
        let col = offset - before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        (line, col)
    }

    fn is_multiline(&self) -> bool {
        self.contents().contains('\n')
    }
}

impl Display for Span {
    /// Given a `Span`, `fmt` will print out where the `Span` occurs in its
    /// source. Single-line `Span`s:
    /// ```plain
    /// 12 | x = blatant { error }
    ///    |     ^^^^^^^^^^^^^^^^^
    /// ```
    /// Multi-line `Span`s:
    /// ```plain
    /// 12 > x -> {
    /// 13 >    another { error }
    /// 14 > }
    /// ```
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        let (start_line, start_col) = self.line_col();
        let lines: Vec<&str> = self.source.contents.lines().collect();

        let end_line = start_line + self.contents().matches('\n').count();
        let readable_end = (end_line + 1).to_string();
        let padding = readable_end.len();

        writeln!(
            f,
            "In {}:{}:{}",
            self.source.path.display(),
            start_line + 1,
            start_col + 1,
        )?;
        writeln!(f, "{} |", " ".repeat(padding))?;

        if !self.is_multiline() {
            let line = lines.get(start_line).copied().unwrap_or("");
            writeln!(f, "{} | {}", start_line + 1, line)?;
            writeln!(
                f,
                "{} | {}{}",
                " ".repeat(padding),
                " ".repeat(start_col),
                "^".repeat(self.length.max(1)),
            )
        } else {
            for (index, line) in lines[start_line..=end_line.min(lines.len() - 1)]
                .iter()
                .enumerate()
            {
                let number = (start_line + index + 1).to_string();
                let partial = " ".repeat(padding - number.len());
                writeln!(f, "{}{} > {}", partial, number, line)?;
            }
            writeln!(f, "{} |", " ".repeat(padding))
        }
    }
}

/// A wrapper for spanning types.
/// For example, a token can be wrapped to indicate
/// where it was lexed from (a `Spanned<Token>`).
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Spanned<T> {
    pub item: T,
    pub span: Span,
}

impl<T> Spanned<T> {
    pub fn new(item: T, span: Span) -> Spanned<T> {
        Spanned { item, span }
    }

    /// A destructive alias for `self.item`.
    pub fn into(self) -> T {
        self.item
    }
}
