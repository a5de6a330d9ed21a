//! This module contains the compiler implementation:
//! lexing, reading, and bytecode generation.

pub mod gen;
pub mod lex;
pub mod read;
pub mod syntax;

use std::rc::Rc;

pub use gen::Compiler;
pub use lex::Lexer;
pub use read::Reader;
pub use syntax::Syntax;

use crate::{
    common::{program::Program, source::Source, value::Value},
    construct::token::Tokens,
};

#[inline(always)]
pub fn lex(source: Rc<Source>) -> Result<Tokens, Syntax> {
    Lexer::lex(source)
}

/// Lexes and reads a source into its top-level forms.
/// This is also what backs the `parse-sexprs` primitive.
#[inline(always)]
pub fn read(source: Rc<Source>) -> Result<Vec<Value>, Syntax> {
    let tokens = lex(source)?;
    Reader::read(tokens)
}

/// The whole front half of the pipeline:
/// source text in, loadable bytecode out.
#[inline(always)]
pub fn gen(source: Rc<Source>) -> Result<Program, Syntax> {
    let forms = read(source)?;
    Compiler::compile(&forms)
}
