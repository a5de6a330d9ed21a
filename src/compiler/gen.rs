use crate::{
    common::{inst::Inst, program::Program, value::Value},
    compiler::syntax::Syntax,
    core,
};

/// The label top-level code is reachable through; the first emitted
/// instruction always jumps here, over the function bodies. The only
/// label allowed to start with `__`.
const START: &str = "__START__";

/// The code generator walks top-level forms and emits a linear,
/// label-oriented instruction sequence. This struct should not be
/// driven manually; use `Compiler::compile` (or `compiler::gen` for
/// the whole pipeline).
///
/// A fresh compiler is used per compilation, so the label counter
/// restarts at zero and compiling the same source twice yields
/// byte-identical bytecode.
pub struct Compiler {
    insts: Vec<Inst>,
    label_id: usize,
}

impl Compiler {
    /// Lowers a program's worth of forms into a loadable `Program`.
    pub fn compile(forms: &[Value]) -> Result<Program, Syntax> {
        let mut compiler = Compiler {
            insts: vec![],
            label_id: 0,
        };
        compiler.program(forms)?;
        Ok(Program::new(compiler.insts))
    }

    /// Returns `<prefix><n>`, unique within this compilation.
    fn gensym(&mut self, prefix: &str) -> String {
        self.label_id += 1;
        format!("{}{}", prefix, self.label_id)
    }

    fn emit(&mut self, inst: Inst) {
        self.insts.push(inst);
    }

    fn program(&mut self, forms: &[Value]) -> Result<(), Syntax> {
        // function bodies are emitted first; jump over them
        self.emit(Inst::Jmp(START.to_string()));

        let (defines, rest): (Vec<&Value>, Vec<&Value>) =
            forms.iter().partition(|form| is_define(form));

        for define in defines {
            self.define(define)?;
        }

        self.emit(Inst::Label(START.to_string()));
        for form in rest {
            self.form(form)?;
        }

        // stop the VM cleanly
        self.emit(Inst::Push(0));
        self.emit(Inst::Ret);
        Ok(())
    }

    /// Lowers `(define (fname p...) body)` to a `DEFUN` prologue,
    /// the body, and a closing `RET`.
    fn define(&mut self, form: &Value) -> Result<(), Syntax> {
        let items = match form {
            Value::List(items) if items.len() == 3 => items,
            _ => {
                return Err(Syntax::error_no_note(
                    "define: expected (define (f args..) body)",
                ))
            }
        };

        let signature = match &items[1] {
            Value::List(signature) if !signature.is_empty() => signature,
            _ => {
                return Err(Syntax::error_no_note(
                    "define: function form only, e.g. (define (f x) body)",
                ))
            }
        };

        let name = symbol_name(
            &signature[0],
            "define: function name must be a symbol",
        )?;
        let params = signature[1..]
            .iter()
            .map(|p| symbol_name(p, "define: parameters must be symbols"))
            .collect::<Result<Vec<String>, Syntax>>()?;

        self.emit(Inst::Defun(name, params));
        self.form(&items[2])?;
        self.emit(Inst::Ret);
        Ok(())
    }

    /// Lowers one form, leaving its value on the operand stack
    /// (except `let`/`set`, which leave nothing).
    fn form(&mut self, form: &Value) -> Result<(), Syntax> {
        let items = match form {
            Value::Integer(n) => {
                self.emit(Inst::Push(*n));
                return Ok(());
            }
            Value::String(s) => {
                self.emit(Inst::PushStr(s.clone()));
                return Ok(());
            }
            Value::Symbol(name) => {
                self.emit(Inst::Load(name.clone()));
                return Ok(());
            }
            Value::List(items) if items.is_empty() => {
                // nil has no runtime constructor; it lowers to 0
                self.emit(Inst::Push(0));
                return Ok(());
            }
            Value::List(items) => items,
        };

        let args = &items[1..];
        match &items[0] {
            Value::Symbol(name) => match name.as_str() {
                "begin" => self.begin(args),
                "if" => self.cond(args),
                "let" | "set" => self.assign(name, args),
                "while" => self.repeat(args),
                "print" => self.print(args),
                "+" | "-" | "*" | "/" | "<" | "==" => self.binop(name, args),
                "define" => Err(Syntax::error_no_note(
                    "define: only allowed at the top level",
                )),
                _ => self.call(name, args),
            },
            other => Err(Syntax::error_no_note(&format!(
                "call: operator must be a symbol, found {}",
                other.type_name(),
            ))),
        }
    }

    /// `(begin e...)`: each expression in order, no result shaping.
    /// An empty `begin` still has to evaluate to something, so it
    /// pushes 0.
    fn begin(&mut self, args: &[Value]) -> Result<(), Syntax> {
        if args.is_empty() {
            self.emit(Inst::Push(0));
            return Ok(());
        }
        for arg in args {
            self.form(arg)?;
        }
        Ok(())
    }

    /// `(if cond then else)`. Labels are allocated before any of the
    /// three parts are walked; their numbering is observable in the
    /// output, so the order here is part of the bytecode contract.
    fn cond(&mut self, args: &[Value]) -> Result<(), Syntax> {
        let (cond, then, other) = match args {
            [cond, then, other] => (cond, then, other),
            _ => {
                return Err(Syntax::error_no_note(
                    "if: expected (if cond then else)",
                ))
            }
        };

        let l_else = self.gensym("ELSE");
        let l_end = self.gensym("END");

        self.form(cond)?;
        self.emit(Inst::Jz(l_else.clone()));
        self.form(then)?;
        self.emit(Inst::Jmp(l_end.clone()));
        self.emit(Inst::Label(l_else));
        self.form(other)?;
        self.emit(Inst::Label(l_end));
        Ok(())
    }

    /// `(let x e)` and `(set x e)` are the same lowering:
    /// evaluate, then store into the current frame.
    fn assign(&mut self, op: &str, args: &[Value]) -> Result<(), Syntax> {
        match args {
            [Value::Symbol(name), expr] => {
                self.form(expr)?;
                self.emit(Inst::Store(name.clone()));
                Ok(())
            }
            _ => Err(Syntax::error_no_note(&format!(
                "{}: expected ({} x expr)",
                op, op,
            ))),
        }
    }

    /// `(while cond body...)`. Same label-allocation caveat as `if`.
    fn repeat(&mut self, args: &[Value]) -> Result<(), Syntax> {
        if args.len() < 2 {
            return Err(Syntax::error_no_note(
                "while: expected (while cond body...)",
            ));
        }

        let top = self.gensym("TOP");
        let end = self.gensym("END");

        self.emit(Inst::Label(top.clone()));
        self.form(&args[0])?;
        self.emit(Inst::Jz(end.clone()));
        for body in &args[1..] {
            self.form(body)?;
        }
        self.emit(Inst::Jmp(top));
        self.emit(Inst::Label(end));
        // the value of a while loop is 0
        self.emit(Inst::Push(0));
        Ok(())
    }

    fn print(&mut self, args: &[Value]) -> Result<(), Syntax> {
        match args {
            [expr] => {
                self.form(expr)?;
                self.emit(Inst::Print);
                self.emit(Inst::Push(0));
                Ok(())
            }
            _ => Err(Syntax::error_no_note("print: expected 1 arg")),
        }
    }

    /// The strictly binary arithmetic and comparison operators.
    fn binop(&mut self, op: &str, args: &[Value]) -> Result<(), Syntax> {
        let (a, b) = match args {
            [a, b] => (a, b),
            _ => {
                return Err(Syntax::error_no_note(&format!(
                    "{}: expected 2 args",
                    op,
                )))
            }
        };

        self.form(a)?;
        self.form(b)?;
        self.emit(match op {
            "+" => Inst::Add,
            "-" => Inst::Sub,
            "*" => Inst::Mul,
            "/" => Inst::Div,
            "<" => Inst::Lt,
            "==" => Inst::Eq,
            _ => unreachable!("binop called with a non-operator"),
        });
        Ok(())
    }

    /// A call form. Whether it is a primitive call is decided here,
    /// lexically: the primitive set is fixed and closed. Unknown names
    /// compile to `CALL` and fail at run time if nothing defines them.
    fn call(&mut self, name: &str, args: &[Value]) -> Result<(), Syntax> {
        for arg in args {
            self.form(arg)?;
        }

        if core::is_primitive(name) {
            self.emit(Inst::CallPrim(name.to_string(), args.len()));
        } else {
            self.emit(Inst::Call(name.to_string(), args.len()));
        }
        Ok(())
    }
}

fn is_define(form: &Value) -> bool {
    match form {
        Value::List(items) => {
            matches!(items.first(), Some(Value::Symbol(name)) if name == "define")
        }
        _ => false,
    }
}

fn symbol_name(value: &Value, reason: &str) -> Result<String, Syntax> {
    match value {
        Value::Symbol(name) => Ok(name.clone()),
        _ => Err(Syntax::error_no_note(reason)),
    }
}
