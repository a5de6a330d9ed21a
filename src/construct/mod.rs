//! Definitions for the syntactic constructs
//! shared by the front-end passes.

pub mod token;

pub use token::{Token, Tokens};
