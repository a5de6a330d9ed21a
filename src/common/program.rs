use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::common::inst::Inst;
use crate::vm::trace::Trace;

/// A function recorded by the load pre-pass: where its body starts,
/// and the parameter names `Call` binds, left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Function {
    pub entry: usize,
    pub params: Vec<String>,
}

/// A loaded bytecode program: the instruction sequence plus the two maps
/// derived from it in a single pre-pass, `labels` (jump targets) and
/// `functions` (call targets). Once built, a `Program` is immutable;
/// the VM only ever reads it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Program {
    insts: Vec<Inst>,
    labels: HashMap<String, usize>,
    functions: HashMap<String, Function>,
}

impl Program {
    /// Builds a program from already-decoded instructions,
    /// resolving labels and function entries.
    pub fn new(insts: Vec<Inst>) -> Program {
        let mut labels = HashMap::new();
        let mut functions = HashMap::new();

        for (index, inst) in insts.iter().enumerate() {
            match inst {
                Inst::Label(name) => {
                    labels.insert(name.clone(), index);
                }
                Inst::Defun(name, params) => {
                    // the body starts just past the DEFUN marker
                    functions.insert(
                        name.clone(),
                        Function {
                            entry: index + 1,
                            params: params.clone(),
                        },
                    );
                }
                _ => (),
            }
        }

        Program {
            insts,
            labels,
            functions,
        }
    }

    /// Decodes bytecode text, one instruction per line.
    /// Blank lines and lines starting with `#` are skipped.
    pub fn parse(text: &str) -> Result<Program, Trace> {
        let mut insts = vec![];

        for raw in text.lines() {
            let line = raw.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            insts.push(Inst::parse(line)?);
        }

        Ok(Program::new(insts))
    }

    pub fn len(&self) -> usize {
        self.insts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.insts.is_empty()
    }

    /// The instruction at `ip`, if `ip` is still inside the program.
    pub fn fetch(&self, ip: usize) -> Option<&Inst> {
        self.insts.get(ip)
    }

    pub fn insts(&self) -> &[Inst] {
        &self.insts
    }

    /// The instruction index of a label.
    pub fn label(&self, name: &str) -> Option<usize> {
        self.labels.get(name).copied()
    }

    /// The entry point and parameters of a function.
    pub fn function(&self, name: &str) -> Option<&Function> {
        self.functions.get(name)
    }
}

impl Display for Program {
    /// Dumps the program in wire form, ready to be loaded again.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for inst in &self.insts {
            writeln!(f, "{}", inst)?;
        }
        Ok(())
    }
}
