use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::vm::trace::{Trace, TraceKind};

/// A single bytecode instruction.
///
/// The wire representation is textual, one instruction per line
/// (see `Display` and `Inst::parse`); this enum is the decoded form the
/// compiler emits and the VM dispatches on. Jump and call targets stay
/// symbolic: names are resolved to indices once, when a `Program` is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inst {
    /// Push an integer literal.
    Push(i64),
    /// Push a string literal. On the wire the operand is a JSON string,
    /// so it may contain spaces, quotes, and escapes.
    PushStr(String),
    /// Push the named variable: current frame first, then the globals,
    /// then the integer `0` as a last resort.
    Load(String),
    /// Pop into the named variable in the current frame.
    Store(String),
    /// Pop `b`, pop `a`, push `a + b`.
    Add,
    /// Pop `b`, pop `a`, push `a - b`.
    Sub,
    /// Pop `b`, pop `a`, push `a * b`.
    Mul,
    /// Pop `b`, pop `a`, push `a / b`, rounding toward negative infinity.
    Div,
    /// Pop `b`, pop `a`, push `1` if `a < b`, else `0`.
    Lt,
    /// Pop `b`, pop `a`, push `1` if they are equal, else `0`.
    Eq,
    /// Pop a value and write its print form plus a newline.
    Print,
    /// A jump target. No-op at runtime; consumed by the load pre-pass.
    Label(String),
    /// Jump to a label unconditionally.
    Jmp(String),
    /// Pop a value; jump to the label if it is the integer `0`.
    Jz(String),
    /// Declare a function and its parameter names. No-op at runtime;
    /// the body starts at the next instruction and is only entered by `Call`.
    Defun(String, Vec<String>),
    /// Call a user function with the given argument count.
    Call(String, usize),
    /// Call a host primitive with the given argument count.
    CallPrim(String, usize),
    /// Pop the current frame and resume after the call;
    /// from the global frame, halt the program.
    Ret,
}

impl Inst {
    /// Decodes one line of bytecode text. The caller is expected to have
    /// stripped the line and dropped blanks and `#` comments.
    pub fn parse(line: &str) -> Result<Inst, Trace> {
        // PUSHSTR is the one instruction whose operand may contain spaces:
        // everything after the mnemonic is a single JSON string literal.
        if let Some(rest) = line.strip_prefix("PUSHSTR ") {
            let decoded = serde_json::from_str::<String>(rest).map_err(|_| {
                Trace::error(
                    TraceKind::Runtime,
                    &format!("PUSHSTR operand is not a JSON string: {}", rest),
                )
            })?;
            return Ok(Inst::PushStr(decoded));
        }

        let words: Vec<&str> = line.split_whitespace().collect();
        let inst = match words.as_slice() {
            ["PUSH", n] => Inst::Push(parse_int(n, line)?),
            ["LOAD", x] => Inst::Load(x.to_string()),
            ["STORE", x] => Inst::Store(x.to_string()),
            ["ADD"] => Inst::Add,
            ["SUB"] => Inst::Sub,
            ["MUL"] => Inst::Mul,
            ["DIV"] => Inst::Div,
            ["LT"] => Inst::Lt,
            ["EQ"] => Inst::Eq,
            ["PRINT"] => Inst::Print,
            ["LABEL", name] => Inst::Label(name.to_string()),
            ["JMP", name] => Inst::Jmp(name.to_string()),
            ["JZ", name] => Inst::Jz(name.to_string()),
            ["DEFUN", name, params @ ..] => Inst::Defun(
                name.to_string(),
                params.iter().map(|p| p.to_string()).collect(),
            ),
            ["CALL", name, argc] => {
                Inst::Call(name.to_string(), parse_argc(argc, line)?)
            }
            ["CALLPRIM", name, argc] => {
                Inst::CallPrim(name.to_string(), parse_argc(argc, line)?)
            }
            ["RET"] => Inst::Ret,
            _ => {
                return Err(Trace::error(
                    TraceKind::Runtime,
                    &format!("Unknown instruction: {}", line),
                ))
            }
        };

        Ok(inst)
    }
}

fn parse_int(word: &str, line: &str) -> Result<i64, Trace> {
    word.parse::<i64>().map_err(|_| {
        Trace::error(
            TraceKind::Runtime,
            &format!("Bad integer operand in: {}", line),
        )
    })
}

fn parse_argc(word: &str, line: &str) -> Result<usize, Trace> {
    word.parse::<usize>().map_err(|_| {
        Trace::error(
            TraceKind::Runtime,
            &format!("Bad argument count in: {}", line),
        )
    })
}

impl Display for Inst {
    /// Writes the wire form: mnemonic and operands separated by single
    /// spaces, `PUSHSTR` operands JSON-encoded.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Inst::Push(n) => write!(f, "PUSH {}", n),
            Inst::PushStr(s) => write!(
                f,
                "PUSHSTR {}",
                serde_json::to_string(s).expect("a string always JSON-encodes"),
            ),
            Inst::Load(x) => write!(f, "LOAD {}", x),
            Inst::Store(x) => write!(f, "STORE {}", x),
            Inst::Add => write!(f, "ADD"),
            Inst::Sub => write!(f, "SUB"),
            Inst::Mul => write!(f, "MUL"),
            Inst::Div => write!(f, "DIV"),
            Inst::Lt => write!(f, "LT"),
            Inst::Eq => write!(f, "EQ"),
            Inst::Print => write!(f, "PRINT"),
            Inst::Label(name) => write!(f, "LABEL {}", name),
            Inst::Jmp(name) => write!(f, "JMP {}", name),
            Inst::Jz(name) => write!(f, "JZ {}", name),
            Inst::Defun(name, params) => {
                write!(f, "DEFUN {}", name)?;
                for param in params {
                    write!(f, " {}", param)?;
                }
                Ok(())
            }
            Inst::Call(name, argc) => write!(f, "CALL {} {}", name, argc),
            Inst::CallPrim(name, argc) => write!(f, "CALLPRIM {} {}", name, argc),
            Inst::Ret => write!(f, "RET"),
        }
    }
}
