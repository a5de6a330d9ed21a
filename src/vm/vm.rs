use std::collections::HashMap;
use std::io::{self, Write};

use crate::{
    common::{program::Program, source::Source, value::Value, Inst},
    compiler, core,
    vm::trace::{Trace, TraceKind},
};

/// One call's parameter bindings. The bottommost frame is the global
/// environment; it is created before the first instruction and never
/// popped.
type Frame = HashMap<String, Value>;

/// The bytecode interpreter: an operand stack, a frame stack, a return
/// stack, and an instruction pointer, driven by a plain fetch-execute
/// loop until `RET` fires on the global frame or execution runs off the
/// end of the program.
///
/// `W` is where `PRINT` writes; the CLI passes stdout, tests pass a
/// `Vec<u8>`. The `emit` primitive goes to a separate buffer that the
/// caller flushes after the run, so compiler output and program output
/// never interleave.
pub struct VM<W: Write> {
    program: Program,
    stack: Vec<Value>,
    frames: Vec<Frame>,
    returns: Vec<usize>,
    ip: usize,
    gensym_id: u64,
    input: String,
    emitted: Vec<String>,
    out: W,
}

impl VM<io::Stdout> {
    /// Initialize a VM that prints to stdout.
    pub fn init(program: Program) -> VM<io::Stdout> {
        VM::with_output(program, io::stdout())
    }
}

impl<W: Write> VM<W> {
    /// Initialize a VM with an explicit `PRINT` sink.
    pub fn with_output(program: Program, out: W) -> VM<W> {
        VM {
            program,
            stack: vec![],
            frames: vec![Frame::new()],
            returns: vec![],
            ip: 0,
            gensym_id: 0,
            input: String::new(),
            emitted: vec![],
            out,
        }
    }

    /// Supplies the text that the `read-all` primitive will return.
    pub fn with_input(mut self, input: &str) -> VM<W> {
        self.input = input.to_string();
        self
    }

    /// The emit channel so far, one bytecode line per entry.
    pub fn emitted(&self) -> &[String] {
        &self.emitted
    }

    /// Hands back the `PRINT` sink, consuming the VM.
    pub fn into_output(self) -> W {
        self.out
    }

    /// The core interpreter loop: runs to completion or to the first
    /// runtime error.
    pub fn run(&mut self) -> Result<(), Trace> {
        while self.ip < self.program.len() {
            if !self.step()? {
                break;
            }
        }
        Ok(())
    }

    /// Executes one instruction.
    /// Returns `Ok(false)` when the program has halted cleanly.
    fn step(&mut self) -> Result<bool, Trace> {
        let inst = match self.program.fetch(self.ip) {
            Some(inst) => inst.clone(),
            None => return Ok(false),
        };

        match inst {
            Inst::Push(n) => self.stack.push(Value::Integer(n)),
            Inst::PushStr(s) => self.stack.push(Value::String(s)),
            Inst::Load(name) => {
                let value = self.load(&name);
                self.stack.push(value);
            }
            Inst::Store(name) => {
                let value = self.pop()?;
                self.frame().insert(name, value);
            }

            Inst::Add => self.int_binop("ADD", |a, b| Ok(a.wrapping_add(b)))?,
            Inst::Sub => self.int_binop("SUB", |a, b| Ok(a.wrapping_sub(b)))?,
            Inst::Mul => self.int_binop("MUL", |a, b| Ok(a.wrapping_mul(b)))?,
            Inst::Div => self.int_binop("DIV", |a, b| {
                if b == 0 {
                    Err(Trace::error(TraceKind::Runtime, "Division by zero"))
                } else {
                    Ok(floor_div(a, b))
                }
            })?,
            Inst::Lt => self.int_binop("LT", |a, b| Ok((a < b) as i64))?,
            Inst::Eq => {
                let b = self.pop()?;
                let a = self.pop()?;
                self.stack.push(Value::Integer((a == b) as i64));
            }

            Inst::Print => {
                let value = self.pop()?;
                writeln!(self.out, "{}", value).map_err(|_| {
                    Trace::error(
                        TraceKind::Runtime,
                        "PRINT could not write to the output stream",
                    )
                })?;
            }

            // both were consumed by the load pre-pass
            Inst::Label(_) | Inst::Defun(_, _) => (),

            Inst::Jmp(name) => {
                self.ip = self.label(&name)?;
                return Ok(true);
            }
            Inst::Jz(name) => {
                if self.pop()? == Value::Integer(0) {
                    self.ip = self.label(&name)?;
                    return Ok(true);
                }
            }

            Inst::Call(name, argc) => {
                self.call(&name, argc)?;
                return Ok(true);
            }
            Inst::Ret => {
                if self.frames.len() == 1 {
                    // returning from top level ends the program;
                    // the return value convention leaves the result on
                    // the operand stack, unenforced
                    return Ok(false);
                }
                self.frames.pop();
                self.ip = self
                    .returns
                    .pop()
                    .expect("every non-global frame was pushed with a return ip");
                return Ok(true);
            }

            Inst::CallPrim(name, argc) => {
                let result = self.callprim(&name, argc)?;
                self.stack.push(result);
            }
        }

        self.ip += 1;
        Ok(true)
    }

    fn pop(&mut self) -> Result<Value, Trace> {
        self.stack
            .pop()
            .ok_or_else(|| Trace::error(TraceKind::Runtime, "Operand stack underflow"))
    }

    /// Pops `argc` values, restoring their left-to-right push order.
    fn pop_args(&mut self, argc: usize) -> Result<Vec<Value>, Trace> {
        let mut args = Vec::with_capacity(argc);
        for _ in 0..argc {
            args.push(self.pop()?);
        }
        args.reverse();
        Ok(args)
    }

    fn frame(&mut self) -> &mut Frame {
        self.frames
            .last_mut()
            .expect("the global frame is never popped")
    }

    /// Variable lookup is exactly two levels: the current frame,
    /// then the globals. Unbound names load as `0`, which self-hosted
    /// code depends on; this is not an error here.
    fn load(&self, name: &str) -> Value {
        if let Some(value) =
            self.frames.last().and_then(|frame| frame.get(name))
        {
            return value.clone();
        }
        if let Some(value) = self.frames[0].get(name) {
            return value.clone();
        }
        Value::Integer(0)
    }

    fn label(&self, name: &str) -> Result<usize, Trace> {
        self.program.label(name).ok_or_else(|| {
            Trace::error(
                TraceKind::Runtime,
                &format!("Unknown label: {}", name),
            )
        })
    }

    fn int_binop(
        &mut self,
        op: &str,
        apply: impl Fn(i64, i64) -> Result<i64, Trace>,
    ) -> Result<(), Trace> {
        let b = self.pop()?;
        let a = self.pop()?;
        match (a, b) {
            (Value::Integer(a), Value::Integer(b)) => {
                self.stack.push(Value::Integer(apply(a, b)?));
                Ok(())
            }
            (a, b) => Err(Trace::error(
                TraceKind::Type,
                &format!(
                    "{} expects integers, found {} and {}",
                    op,
                    a.type_name(),
                    b.type_name(),
                ),
            )),
        }
    }

    /// `CALL fname argc`: binds arguments into a fresh frame and jumps
    /// to the function body.
    fn call(&mut self, name: &str, argc: usize) -> Result<(), Trace> {
        let function = self
            .program
            .function(name)
            .ok_or_else(|| {
                Trace::error(
                    TraceKind::Runtime,
                    &format!("CALL unknown function: {}", name),
                )
            })?
            .clone();

        if function.params.len() != argc {
            return Err(Trace::error(
                TraceKind::Runtime,
                &format!(
                    "CALL arity mismatch for {}: expected {} got {}",
                    name,
                    function.params.len(),
                    argc,
                ),
            ));
        }

        let args = self.pop_args(argc)?;
        let mut frame = Frame::new();
        for (param, value) in function.params.iter().zip(args) {
            frame.insert(param.clone(), value);
        }

        self.returns.push(self.ip + 1);
        self.frames.push(frame);
        self.ip = function.entry;
        Ok(())
    }

    /// `CALLPRIM pname argc`: the stateful primitives are handled here,
    /// where their state lives; everything else defers to the shared
    /// table in `core`.
    fn callprim(&mut self, name: &str, argc: usize) -> Result<Value, Trace> {
        let args = self.pop_args(argc)?;

        match name {
            "read-all" => {
                if !args.is_empty() {
                    return Err(Trace::error(
                        TraceKind::Runtime,
                        &format!(
                            "read-all expects 0 arguments, found {}",
                            args.len(),
                        ),
                    ));
                }
                Ok(Value::String(self.input.clone()))
            }
            "parse-sexprs" => match args.as_slice() {
                [Value::String(text)] => {
                    let forms = compiler::read(Source::source(text))
                        .map_err(|e| {
                            Trace::error(
                                TraceKind::Runtime,
                                &format!("parse-sexprs: {}", e.reason),
                            )
                        })?;
                    Ok(Value::List(forms))
                }
                [other] => Err(Trace::error(
                    TraceKind::Type,
                    &format!(
                        "parse-sexprs expects a string, found {}",
                        other.type_name(),
                    ),
                )),
                _ => Err(Trace::error(
                    TraceKind::Runtime,
                    &format!(
                        "parse-sexprs expects 1 argument, found {}",
                        args.len(),
                    ),
                )),
            },
            "emit" => match args.as_slice() {
                [Value::String(line)] => {
                    self.emitted.push(line.clone());
                    Ok(Value::Integer(0))
                }
                [other] => Err(Trace::error(
                    TraceKind::Type,
                    &format!(
                        "emit expects a string, found {}",
                        other.type_name(),
                    ),
                )),
                _ => Err(Trace::error(
                    TraceKind::Runtime,
                    &format!("emit expects 1 argument, found {}", args.len()),
                )),
            },
            "gensym" => match args.as_slice() {
                [Value::String(prefix)] => {
                    self.gensym_id += 1;
                    Ok(Value::String(format!("{}{}", prefix, self.gensym_id)))
                }
                [other] => Err(Trace::error(
                    TraceKind::Type,
                    &format!(
                        "gensym expects a string prefix, found {}",
                        other.type_name(),
                    ),
                )),
                _ => Err(Trace::error(
                    TraceKind::Runtime,
                    &format!(
                        "gensym expects 1 argument, found {}",
                        args.len(),
                    ),
                )),
            },
            _ => core::dispatch(name, &args),
        }
    }
}

/// Rounds toward negative infinity, like the surface language's `/`.
fn floor_div(a: i64, b: i64) -> i64 {
    let quotient = a.wrapping_div(b);
    if a % b != 0 && (a % b < 0) != (b < 0) {
        quotient - 1
    } else {
        quotient
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Compiles and runs a source snippet, returning what `PRINT` wrote.
    fn run_source(source: &str) -> Result<String, Trace> {
        let program = compiler::gen(Source::source(source))
            .unwrap_or_else(|e| panic!("snippet failed to compile: {}", e));
        run_program(program, "")
    }

    fn run_program(program: Program, input: &str) -> Result<String, Trace> {
        let mut vm = VM::with_output(program, Vec::new()).with_input(input);
        vm.run()?;
        Ok(String::from_utf8(vm.into_output()).expect("PRINT writes UTF-8"))
    }

    fn run_text(bytecode: &str) -> Result<String, Trace> {
        run_program(Program::parse(bytecode)?, "")
    }

    #[test]
    fn print_addition() {
        assert_eq!(run_source("(print (+ 1 2))").unwrap(), "3\n");
    }

    #[test]
    fn counting_loop() {
        let source = "
            (let x 10)
            (let y 0)
            (while (< y x)
              (begin (print y) (let y (+ y 1))))";
        assert_eq!(
            run_source(source).unwrap(),
            "0\n1\n2\n3\n4\n5\n6\n7\n8\n9\n",
        );
    }

    #[test]
    fn recursive_factorial() {
        let source = "
            (define (fact n)
              (if (== n 0) 1 (* n (fact (- n 1)))))
            (print (fact 5))";
        assert_eq!(run_source(source).unwrap(), "120\n");
    }

    #[test]
    fn recursive_fibonacci() {
        let source = "
            (define (fib n)
              (if (< n 2) n (+ (fib (- n 1)) (fib (- n 2)))))
            (print (fib 10))";
        assert_eq!(run_source(source).unwrap(), "55\n");
    }

    #[test]
    fn branch_taken() {
        assert_eq!(
            run_source("(if (== 1 1) (print 42) (print 0))").unwrap(),
            "42\n",
        );
    }

    #[test]
    fn empty_begin_is_zero() {
        assert_eq!(run_source("(print (begin))").unwrap(), "0\n");
    }

    #[test]
    fn unbound_load_is_zero() {
        assert_eq!(run_source("(print nowhere)").unwrap(), "0\n");
    }

    #[test]
    fn function_frames_do_not_leak_into_globals() {
        let source = "
            (define (shadow q) (begin (let x 2) x))
            (let x 1)
            (shadow 0)
            (print x)";
        assert_eq!(run_source(source).unwrap(), "1\n");
    }

    #[test]
    fn globals_are_visible_inside_calls() {
        let source = "
            (define (peek) base)
            (let base 7)
            (print (peek))";
        assert_eq!(run_source(source).unwrap(), "7\n");
    }

    #[test]
    fn floor_division() {
        assert_eq!(run_source("(print (/ 7 2))").unwrap(), "3\n");
        assert_eq!(run_source("(print (/ -7 2))").unwrap(), "-4\n");
    }

    #[test]
    fn division_by_zero_aborts() {
        let error = run_source("(print (/ 1 0))").unwrap_err();
        assert_eq!(error.kind, TraceKind::Runtime);
        assert!(error.message.contains("Division by zero"));
    }

    #[test]
    fn arithmetic_is_integer_only() {
        let error = run_source(r#"(print (+ 1 "two"))"#).unwrap_err();
        assert_eq!(error.kind, TraceKind::Type);
    }

    #[test]
    fn car_of_empty_list_aborts() {
        let source = r#"(print (car (cdr (parse-sexprs "x"))))"#;
        let error = run_source(source).unwrap_err();
        assert!(error.message.contains("car of empty list"));
    }

    #[test]
    fn parse_sexprs_hands_back_forms() {
        let source = r#"(print (sym-name (car (parse-sexprs "(hi) 2"))))"#;
        // the first form is the list (hi); car of the form list is it
        let error = run_source(source).unwrap_err();
        assert_eq!(error.kind, TraceKind::Type);

        let source = r#"(print (sym-name (car (car (parse-sexprs "(hi) 2")))))"#;
        assert_eq!(run_source(source).unwrap(), "hi\n");
    }

    #[test]
    fn gensym_counts_up_per_vm() {
        let source = r#"(begin (print (gensym "L")) (print (gensym "G")))"#;
        assert_eq!(run_source(source).unwrap(), "L1\nG2\n");
        // and the counter resets on a fresh VM
        assert_eq!(run_source(source).unwrap(), "L1\nG2\n");
    }

    #[test]
    fn read_all_returns_the_supplied_input() {
        let program =
            compiler::gen(Source::source("(print (read-all))")).unwrap();
        assert_eq!(run_program(program, "hello input").unwrap(), "hello input\n");
    }

    #[test]
    fn emit_is_buffered_apart_from_print() {
        let program = compiler::gen(Source::source(
            r#"(begin (emit "PUSH 1") (print 5) (emit "RET"))"#,
        ))
        .unwrap();
        let mut vm = VM::with_output(program, Vec::new());
        vm.run().unwrap();

        assert_eq!(vm.emitted(), ["PUSH 1".to_string(), "RET".to_string()]);
        let printed = String::from_utf8(vm.into_output()).unwrap();
        assert_eq!(printed, "5\n");
    }

    #[test]
    fn explicit_error_aborts_with_message() {
        let error =
            run_source(r#"(error "define: bad shape")"#).unwrap_err();
        assert_eq!(format!("{}", error), "Runtime Error: define: bad shape");
    }

    #[test]
    fn call_arity_is_checked() {
        let bytecode = "
            JMP __START__
            DEFUN pair a b
            PUSH 0
            RET
            LABEL __START__
            PUSH 1
            CALL pair 1
            RET";
        let error = run_text(bytecode).unwrap_err();
        assert!(error.message.contains("arity mismatch for pair"));
    }

    #[test]
    fn unknown_function_aborts_at_call_time() {
        let error = run_text("CALL missing 0").unwrap_err();
        assert!(error.message.contains("CALL unknown function: missing"));
    }

    #[test]
    fn unknown_label_aborts() {
        let error = run_text("JMP nowhere").unwrap_err();
        assert!(error.message.contains("Unknown label: nowhere"));
    }

    #[test]
    fn unknown_primitive_aborts() {
        let error = run_text("CALLPRIM frobnicate 0").unwrap_err();
        assert!(error.message.contains("Unknown primitive: frobnicate"));
    }

    #[test]
    fn ret_on_the_global_frame_halts() {
        // the trailing PRINT is unreachable
        assert_eq!(run_text("PUSH 0\nRET\nPUSH 9\nPRINT").unwrap(), "");
    }

    #[test]
    fn running_off_the_end_halts() {
        assert_eq!(run_text("PUSH 1").unwrap(), "");
    }

    #[test]
    fn to_str_and_str_cat_compose() {
        let source = r#"(print (str-cat "n = " (to-str (+ 20 22))))"#;
        assert_eq!(run_source(source).unwrap(), "n = 42\n");
    }
}
